use serde::{Deserialize, Serialize};

/// Project description received across the process boundary
///
/// A container carries everything the frontend knows about one project: the
/// project file path used as its identity and the tool arguments that apply
/// to it. Containers are produced by the IPC deserialization layer and are
/// immutable from the registry's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectContainer {
    /// Path to the project file (e.g., a .pro file); unique project identity
    pub file_path: String,

    /// Ordered tool arguments for this project
    #[serde(default)]
    pub arguments: Vec<String>,
}

impl ProjectContainer {
    /// Create a new project container
    pub fn new(file_path: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            file_path: file_path.into(),
            arguments,
        }
    }
}
