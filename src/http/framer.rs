//! Request framing over a single bounded read.
//!
//! The framer performs one read of at most `buffer_capacity` bytes, then
//! locates the request line and the header block inside that buffer by
//! offset. The filled region is frozen into a [`Bytes`] and sliced; nothing
//! is ever rewound or re-read. Only the body may need further reads, and
//! bytes already buffered after the header terminator are consumed first.
//!
//! ```text
//!   AwaitingRequestLine ──► AwaitingHeaderBlock ──► AwaitingBody ──► Complete
//!            │                      │          └──────────────────────►│
//!            └──────────────────────┴──────────────► Failed(FramingError)
//! ```

use std::future::Future;
use std::io;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

use crate::config::FramingConfig;
use crate::http::headers::{HeaderIndex, HeaderMatch};
use crate::http::request::{Method, ParsedRequest};
use crate::http::scanner::{CRLF, HEADER_TERMINATOR, find_sequence};

/// Why a request could not be framed.
#[derive(Debug, Error)]
pub enum FramingError {
    #[error("request line malformed or not terminated within the buffer")]
    MalformedRequestLine,

    #[error("header block not terminated within the buffer")]
    UnterminatedHeaders,

    #[error("method not allowed: {0}")]
    UnsupportedMethod(String),

    #[error("path must start with '/': {0:?}")]
    InvalidPath(String),

    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    #[error("declared body of {declared} bytes exceeds limit of {limit}")]
    BodyTooLarge { declared: usize, limit: usize },

    #[error("read timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),
}

/// The tokens of a request line and where its CRLF sits in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    pub path: String,
    pub version: String,
    /// Offset of the request line's CRLF.
    pub end: usize,
}

/// Request line plus headers, waiting for an optional body.
#[derive(Debug)]
struct Head {
    line: RequestLine,
    headers: HeaderIndex,
    /// Offset of the first byte after the header terminator.
    body_start: usize,
}

impl Head {
    fn into_request(self, body: Option<Bytes>) -> ParsedRequest {
        ParsedRequest {
            method: self.line.method,
            path: self.line.path,
            version: self.line.version,
            headers: self.headers,
            body,
        }
    }
}

#[derive(Debug)]
enum FramingState {
    AwaitingRequestLine,
    AwaitingHeaderBlock { line: RequestLine },
    AwaitingBody { head: Head, length: usize },
    Complete(ParsedRequest),
    Failed(FramingError),
}

impl FramingState {
    fn name(&self) -> &'static str {
        match self {
            FramingState::AwaitingRequestLine => "awaiting_request_line",
            FramingState::AwaitingHeaderBlock { .. } => "awaiting_header_block",
            FramingState::AwaitingBody { .. } => "awaiting_body",
            FramingState::Complete(_) => "complete",
            FramingState::Failed(_) => "failed",
        }
    }
}

/// Splits a byte source into request line, headers and body.
#[derive(Debug, Clone)]
pub struct RequestFramer {
    allowed_methods: Vec<Method>,
    buffer_capacity: usize,
    max_body_size: usize,
    read_timeout: Duration,
    header_match: HeaderMatch,
}

impl Default for RequestFramer {
    fn default() -> Self {
        Self::new(&FramingConfig::default())
    }
}

impl RequestFramer {
    pub fn new(cfg: &FramingConfig) -> Self {
        Self {
            allowed_methods: cfg.allowed_methods.clone(),
            buffer_capacity: cfg.buffer_capacity,
            max_body_size: cfg.max_body_size,
            read_timeout: Duration::from_millis(cfg.read_timeout_ms),
            header_match: cfg.header_match,
        }
    }

    /// Frames one request from `source`.
    ///
    /// Exactly one read fills the buffer; further reads happen only when a
    /// declared body extends past it. Every failure is returned as a
    /// [`FramingError`]; the framer never writes to the source.
    pub async fn frame<R>(&self, source: &mut R) -> Result<ParsedRequest, FramingError>
    where
        R: AsyncRead + Unpin,
    {
        let mut raw = Bytes::new();
        let mut state = FramingState::AwaitingRequestLine;

        loop {
            let next = match state {
                FramingState::AwaitingRequestLine => match self.fill(source).await {
                    Ok(buf) => {
                        raw = buf;
                        self.request_line(&raw)
                            .map(|line| FramingState::AwaitingHeaderBlock { line })
                            .unwrap_or_else(FramingState::Failed)
                    }
                    Err(e) => FramingState::Failed(e),
                },

                FramingState::AwaitingHeaderBlock { line } => self
                    .header_block(&raw, line)
                    .unwrap_or_else(FramingState::Failed),

                FramingState::AwaitingBody { head, length } => {
                    match self.body(&raw, head.body_start, length, source).await {
                        Ok(body) => FramingState::Complete(head.into_request(Some(body))),
                        Err(e) => FramingState::Failed(e),
                    }
                }

                FramingState::Complete(request) => return Ok(request),
                FramingState::Failed(e) => return Err(e),
            };

            tracing::trace!(state = next.name(), buffered = raw.len(), "framing transition");
            state = next;
        }
    }

    /// Validates the request line at the start of `buf`.
    ///
    /// Only `buf` is inspected; this is the request-line stage of
    /// [`frame`](Self::frame) on its own.
    pub fn request_line(&self, buf: &[u8]) -> Result<RequestLine, FramingError> {
        let end = find_sequence(buf, CRLF, 0, buf.len()).ok_or(FramingError::MalformedRequestLine)?;

        let text = std::str::from_utf8(&buf[..end]).map_err(|_| FramingError::MalformedRequestLine)?;

        let tokens: Vec<&str> = text.split(' ').collect();
        let [method, path, version] = tokens[..] else {
            return Err(FramingError::MalformedRequestLine);
        };

        let method = Method::from_str(method)
            .filter(|m| self.allowed_methods.contains(m))
            .ok_or_else(|| FramingError::UnsupportedMethod(method.to_string()))?;

        if !path.starts_with('/') {
            return Err(FramingError::InvalidPath(path.to_string()));
        }

        Ok(RequestLine {
            method,
            path: path.to_string(),
            version: version.to_string(),
            end,
        })
    }

    fn header_block(&self, raw: &[u8], line: RequestLine) -> Result<FramingState, FramingError> {
        // Searching from the request line's own CRLF lets a request with no
        // headers ("GET / HTTP/1.1\r\n\r\n") terminate on it.
        let headers_start = line.end + CRLF.len();
        let headers_end = find_sequence(raw, HEADER_TERMINATOR, line.end, raw.len())
            .ok_or(FramingError::UnterminatedHeaders)?;

        let block = if headers_end > line.end {
            String::from_utf8_lossy(&raw[headers_start..headers_end])
        } else {
            "".into()
        };
        let headers = HeaderIndex::from_block(&block, self.header_match);

        let head = Head {
            line,
            headers,
            body_start: headers_end + HEADER_TERMINATOR.len(),
        };

        if matches!(head.line.method, Method::GET | Method::HEAD) {
            return Ok(FramingState::Complete(head.into_request(None)));
        }

        let Some(value) = head.headers.lookup("Content-Length") else {
            return Ok(FramingState::Complete(head.into_request(None)));
        };

        let length: usize = value
            .parse()
            .map_err(|_| FramingError::InvalidContentLength(value.to_string()))?;

        if length > self.max_body_size {
            return Err(FramingError::BodyTooLarge {
                declared: length,
                limit: self.max_body_size,
            });
        }

        Ok(FramingState::AwaitingBody { head, length })
    }

    async fn body<R>(
        &self,
        raw: &Bytes,
        body_start: usize,
        length: usize,
        source: &mut R,
    ) -> Result<Bytes, FramingError>
    where
        R: AsyncRead + Unpin,
    {
        let buffered = raw.len().saturating_sub(body_start).min(length);

        if buffered == length {
            return Ok(raw.slice(body_start..body_start + length));
        }

        let mut body = BytesMut::with_capacity(length);
        body.extend_from_slice(&raw[body_start..body_start + buffered]);
        body.resize(length, 0);

        tracing::trace!(buffered, remaining = length - buffered, "reading rest of body");
        self.deadline(source.read_exact(&mut body[buffered..])).await?;

        Ok(body.freeze())
    }

    async fn fill<R>(&self, source: &mut R) -> Result<Bytes, FramingError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = BytesMut::zeroed(self.buffer_capacity);
        let n = self.deadline(source.read(&mut buf[..])).await?;
        buf.truncate(n);
        Ok(buf.freeze())
    }

    async fn deadline<F, T>(&self, fut: F) -> Result<T, FramingError>
    where
        F: Future<Output = io::Result<T>>,
    {
        match timeout(self.read_timeout, fut).await {
            Ok(res) => res.map_err(FramingError::Io),
            Err(_) => Err(FramingError::Timeout(self.read_timeout)),
        }
    }
}
