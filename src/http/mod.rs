//! HTTP/1.1 protocol implementation.
//!
//! One request per connection: the request is framed, answered, and the
//! connection is closed (`Connection: close` on every response).
//!
//! # Architecture
//!
//! - **`scanner`**: byte sequence search over a bounded buffer region
//! - **`framer`**: splits a byte source into request line, headers and body
//! - **`headers`**: ordered raw header lines with lookup by name
//! - **`request`**: the framed request and its query string helpers
//! - **`connection`**: drives framing and response for one connection
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: serializes and writes responses to the client
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Frame one request (single bounded read)
//!        └──────┬──────┘
//!               │ Request framed          │ FramingError
//!               ▼                         │
//!        ┌──────────────────┐             │
//!        │   Processing     │             │
//!        └──────┬───────────┘             │
//!               ▼                         ▼
//!        ┌──────────────────────────────────────┐
//!        │  Writing (200/404/500 or 400)        │
//!        └──────┬───────────────────────────────┘
//!               ▼
//!             Closed
//! ```

pub mod connection;
pub mod framer;
pub mod headers;
pub mod mime;
pub mod request;
pub mod response;
pub mod scanner;
pub mod writer;
