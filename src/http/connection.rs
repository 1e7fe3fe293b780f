use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::config::{Config, ServeMode};
use crate::http::framer::{FramingError, RequestFramer};
use crate::http::request::ParsedRequest;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::site::StaticSite;

/// What happens to a request once it has been framed.
#[derive(Debug, Clone)]
pub enum Responder {
    /// Serve whitelisted static files.
    Static(StaticSite),
    /// Reply with an empty `200 OK`.
    Ack,
}

impl Responder {
    pub fn from_config(cfg: &Config) -> Self {
        match cfg.server.mode {
            ServeMode::Static => Responder::Static(StaticSite::new(&cfg.static_files)),
            ServeMode::Ack => Responder::Ack,
        }
    }

    pub async fn respond(&self, req: &ParsedRequest) -> Response {
        match self {
            Responder::Static(site) => site.respond(req).await,
            Responder::Ack => Response::ok(Vec::new()),
        }
    }
}

/// Frames one request per connection and decides the response.
///
/// Shared read-only between all connections.
#[derive(Debug, Clone)]
pub struct ConnectionHandler {
    framer: RequestFramer,
    responder: Responder,
}

impl ConnectionHandler {
    pub fn new(framer: RequestFramer, responder: Responder) -> Self {
        Self { framer, responder }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(RequestFramer::new(&cfg.framing), Responder::from_config(cfg))
    }

    /// Frames a single request from `source`. No retries: the first
    /// framing error ends the attempt.
    pub async fn handle_once<R>(&self, source: &mut R) -> Result<ParsedRequest, FramingError>
    where
        R: AsyncRead + Unpin,
    {
        self.framer.frame(source).await
    }

    pub async fn respond(&self, req: &ParsedRequest) -> Response {
        self.responder.respond(req).await
    }
}

pub struct Connection<S> {
    stream: S,
    handler: Arc<ConnectionHandler>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(ParsedRequest),
    /// bool = failure reply, written best-effort
    Writing(ResponseWriter, bool),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, handler: Arc<ConnectionHandler>) -> Self {
        Self {
            stream,
            handler,
            state: ConnectionState::Reading,
        }
    }

    /// Serves exactly one request, then closes the stream.
    ///
    /// The stream is shut down even when writing the response fails; that
    /// write error is returned afterwards.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut outcome = Ok(());

        loop {
            match &mut self.state {
                ConnectionState::Reading => {
                    self.state = match self.handler.handle_once(&mut self.stream).await {
                        Ok(req) => ConnectionState::Processing(req),
                        Err(e) => {
                            tracing::warn!(error = %e, "rejecting request");
                            let writer = ResponseWriter::new(&Response::bad_request());
                            ConnectionState::Writing(writer, true)
                        }
                    };
                }

                ConnectionState::Processing(req) => {
                    let response = self.handler.respond(req).await;

                    tracing::info!(
                        method = %req.method,
                        path = %req.path,
                        status = response.status.as_u16(),
                        body_len = req.body.as_ref().map_or(0, |b| b.len()),
                        "request served"
                    );

                    let writer = ResponseWriter::new(&response);
                    self.state = ConnectionState::Writing(writer, false);
                }

                ConnectionState::Writing(writer, best_effort) => {
                    let res = writer.write_to_stream(&mut self.stream).await;
                    let best_effort = *best_effort;
                    self.state = ConnectionState::Closed;

                    match res {
                        Err(e) if best_effort => {
                            tracing::debug!(error = %e, "could not deliver 400 response");
                        }
                        other => outcome = other,
                    }
                }

                ConnectionState::Closed => {
                    // Peer may already be gone; nothing left to report.
                    let _ = self.stream.shutdown().await;
                    break;
                }
            }
        }

        outcome
    }
}
