//! Typed wire messages of the backend protocol
//!
//! Requests and responses travel as JSON payloads inside Content-Length
//! frames. Every request carries an id that the matching response echoes
//! back; errors are ordinary responses carrying an [`ErrorCode`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::project::{Project, ProjectContainer};

/// A request from the host frontend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Request id, echoed in the response
    pub id: u64,

    #[serde(flatten)]
    pub method: RequestMethod,
}

/// Operations the host can invoke on the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum RequestMethod {
    /// Register the given projects, updating ones already known
    RegisterProjects { projects: Vec<ProjectContainer> },

    /// Remove the projects identified by the given file paths
    UnregisterProjects { file_paths: Vec<String> },

    /// Ask whether a project with this file path is registered
    HasProject { file_path: String },

    /// Fetch a single project by file path
    GetProject { file_path: String },

    /// Fetch all registered projects
    ListProjects,
}

impl RequestMethod {
    /// Wire name of this method, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterProjects { .. } => "register_projects",
            Self::UnregisterProjects { .. } => "unregister_projects",
            Self::HasProject { .. } => "has_project",
            Self::GetProject { .. } => "get_project",
            Self::ListProjects => "list_projects",
        }
    }
}

/// A response to one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Id of the request this responds to; 0 when no id could be parsed
    pub id: u64,

    #[serde(flatten)]
    pub result: ResponseResult,
}

/// Result payload of a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", content = "value", rename_all = "snake_case")]
pub enum ResponseResult {
    /// The operation completed; nothing to report
    Ack,

    /// Answer to an existence check
    Exists { exists: bool },

    /// A single project
    Project { project: ProjectView },

    /// All registered projects
    Projects { projects: Vec<ProjectView> },

    /// The operation failed
    Error {
        code: ErrorCode,
        message: String,
        /// Project file paths the failure is about, when applicable
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        file_paths: Vec<String>,
    },
}

/// Protocol-level error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// One or more referenced projects are not registered
    ProjectDoesNotExist,

    /// The request payload could not be parsed
    InvalidRequest,
}

/// Serializable projection of a registry entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectView {
    pub file_path: String,
    pub arguments: Vec<String>,
    pub registered_at: DateTime<Utc>,
}

impl From<&Project> for ProjectView {
    fn from(project: &Project) -> Self {
        Self {
            file_path: project.file_path().to_string(),
            arguments: project.arguments().to_vec(),
            registered_at: project.registered_at(),
        }
    }
}
