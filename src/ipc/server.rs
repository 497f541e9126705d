//! Backend message dispatcher
//!
//! [`BackendServer`] owns the project registry and runs the single
//! sequential request loop of the backend: receive a framed payload, parse
//! it, apply it to the registry, answer. Registry failures become error
//! responses; the loop itself only ends when the host disconnects.

use std::time::Instant;
use tracing::{Level, info, warn};

use crate::ipc::framing::{FramingError, MessageFraming};
use crate::ipc::messages::{
    ErrorCode, ProjectView, Request, RequestMethod, Response, ResponseResult,
};
use crate::ipc::transport::Transport;
use crate::project::{ProjectError, ProjectRegistry};
use crate::{log_ipc_message, log_timing};

/// Error types for the server loop
#[derive(Debug, thiserror::Error)]
pub enum ServerError<E: std::error::Error + Send + Sync + 'static> {
    #[error("Framing error: {0}")]
    Framing(FramingError<E>),

    #[error("Failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The backend server: registry plus framed transport
///
/// All registry operations run on the loop's single logical thread; the
/// registry is owned by value and needs no locking.
pub struct BackendServer<T: Transport> {
    framing: MessageFraming<T>,
    registry: ProjectRegistry,
}

impl<T: Transport> BackendServer<T> {
    /// Create a server over the given transport with an empty registry
    pub fn new(transport: T) -> Self {
        Self {
            framing: MessageFraming::new(transport),
            registry: ProjectRegistry::new(),
        }
    }

    /// The registry owned by this server
    pub fn registry(&self) -> &ProjectRegistry {
        &self.registry
    }

    /// The transport underneath the framing layer
    pub fn transport(&self) -> &T {
        self.framing.transport()
    }

    /// Run the request loop until the host disconnects
    pub async fn run(&mut self) -> Result<(), ServerError<T::Error>> {
        info!("Backend server ready, waiting for requests");

        loop {
            let raw = match self.framing.receive().await {
                Ok(raw) => raw,
                Err(FramingError::Disconnected) => {
                    info!("Host disconnected, shutting down");
                    return Ok(());
                }
                Err(e) => return Err(ServerError::Framing(e)),
            };

            let response = self.handle_message(&raw);
            let serialized = serde_json::to_string(&response)?;

            match self.framing.send(&serialized).await {
                Ok(()) => {}
                Err(FramingError::Disconnected) => {
                    info!("Host disconnected while responding, shutting down");
                    return Ok(());
                }
                Err(e) => return Err(ServerError::Framing(e)),
            }
        }
    }

    /// Parse one payload and produce its response
    ///
    /// Unparseable payloads answer with `invalid_request` under id 0 (no id
    /// could be read) and do not end the session.
    fn handle_message(&mut self, raw: &str) -> Response {
        let start = Instant::now();

        let request: Request = match serde_json::from_str(raw) {
            Ok(request) => request,
            Err(e) => {
                warn!("Failed to parse request: {}", e);
                return Response {
                    id: 0,
                    result: ResponseResult::Error {
                        code: ErrorCode::InvalidRequest,
                        message: e.to_string(),
                        file_paths: Vec::new(),
                    },
                };
            }
        };

        let method = request.method.name();
        log_ipc_message!(Level::INFO, "incoming", method, &request);

        let response = Response {
            id: request.id,
            result: self.dispatch(request.method),
        };

        log_ipc_message!(Level::INFO, "outgoing", method, &response);
        log_timing!(Level::DEBUG, method, start.elapsed());

        response
    }

    /// Apply one request to the registry
    fn dispatch(&mut self, method: RequestMethod) -> ResponseResult {
        match method {
            RequestMethod::RegisterProjects { projects } => {
                self.registry.create_or_update(&projects);
                ResponseResult::Ack
            }
            RequestMethod::UnregisterProjects { file_paths } => {
                match self.registry.remove(&file_paths) {
                    Ok(()) => ResponseResult::Ack,
                    Err(e) => Self::project_error(e),
                }
            }
            RequestMethod::HasProject { file_path } => ResponseResult::Exists {
                exists: self.registry.has_project(&file_path),
            },
            RequestMethod::GetProject { file_path } => {
                match self.registry.project(&file_path) {
                    Ok(project) => ResponseResult::Project {
                        project: ProjectView::from(project),
                    },
                    Err(e) => Self::project_error(e),
                }
            }
            RequestMethod::ListProjects => ResponseResult::Projects {
                projects: self
                    .registry
                    .projects()
                    .iter()
                    .map(ProjectView::from)
                    .collect(),
            },
        }
    }

    /// Translate a registry failure into a protocol error response
    fn project_error(error: ProjectError) -> ResponseResult {
        ResponseResult::Error {
            code: ErrorCode::ProjectDoesNotExist,
            message: error.to_string(),
            file_paths: error.file_paths().to_vec(),
        }
    }
}
