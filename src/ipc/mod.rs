//! IPC layer of the backend
//!
//! The backend talks to its host over stdio: raw string exchange is handled
//! by a [`Transport`], `Content-Length` message framing by
//! [`MessageFraming`], and the typed request/response surface by
//! [`BackendServer`], which owns the project registry and dispatches to it.

pub mod framing;
pub mod messages;
pub mod server;
pub mod transport;

pub use framing::{FramingError, MessageFraming};
pub use messages::{ErrorCode, ProjectView, Request, RequestMethod, Response, ResponseResult};
pub use server::{BackendServer, ServerError};
pub use transport::{StdioTransport, Transport};
