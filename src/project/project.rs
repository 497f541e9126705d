use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::project::ProjectContainer;

/// A project known to the backend
///
/// Owned exclusively by the registry. The file path is the project's
/// identity and never changes after construction; the argument list is
/// replaced wholesale whenever the frontend re-registers the project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    file_path: String,
    arguments: Vec<String>,
    registered_at: DateTime<Utc>,
}

impl Project {
    /// Path to the project file identifying this project
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// Current tool arguments for this project
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Timestamp of the first registration of this project
    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Replace the argument list with the one from a re-registration
    pub(crate) fn set_arguments(&mut self, arguments: Vec<String>) {
        self.arguments = arguments;
    }
}

impl From<ProjectContainer> for Project {
    fn from(container: ProjectContainer) -> Self {
        Self {
            file_path: container.file_path,
            arguments: container.arguments,
            registered_at: Utc::now(),
        }
    }
}
