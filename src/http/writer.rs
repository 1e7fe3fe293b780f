//! Response encoding and delivery.
//!
//! A response is encoded once into a contiguous buffer (head, blank line,
//! body) and then pushed to the stream, tolerating short writes.

use std::fmt::Write as _;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

/// Encodes the status line and header lines, terminated by the blank line.
fn encode_head(resp: &Response) -> String {
    let mut head = format!(
        "HTTP/1.1 {} {}\r\n",
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );

    for (name, value) in &resp.headers {
        // Writing into a String cannot fail.
        let _ = write!(head, "{name}: {value}\r\n");
    }

    head.push_str("\r\n");
    head
}

/// Full wire form of `resp`.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let head = encode_head(resp);

    let mut out = Vec::with_capacity(head.len() + resp.body.len());
    out.extend_from_slice(head.as_bytes());
    out.extend_from_slice(&resp.body);
    out
}

/// An encoded response and how much of it has reached the peer.
pub struct ResponseWriter {
    encoded: Vec<u8>,
    sent: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            encoded: serialize_response(response),
            sent: 0,
        }
    }

    /// Bytes not yet accepted by the stream.
    pub fn remaining(&self) -> usize {
        self.encoded.len() - self.sent
    }

    /// Writes the unsent tail and flushes. A zero-length write means the
    /// peer stopped reading.
    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.remaining() > 0 {
            match stream.write(&self.encoded[self.sent..]).await? {
                0 => anyhow::bail!("peer closed before {} response bytes were sent", self.remaining()),
                n => self.sent += n,
            }
        }

        stream.flush().await?;
        Ok(())
    }
}
