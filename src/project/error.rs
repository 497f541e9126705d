use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
    /// One or more requested project file paths had no live registry entry.
    ///
    /// Raised with a single path on lookup, or with the full set of
    /// unmatched paths after a batch removal. Removals that did match have
    /// already been applied when this is raised; there is no rollback.
    #[error("projects do not exist: {}", .file_paths.join(", "))]
    DoesNotExist { file_paths: Vec<String> },
}

impl ProjectError {
    /// Convenience constructor for the single-path lookup case
    pub fn does_not_exist(file_path: impl Into<String>) -> Self {
        Self::DoesNotExist {
            file_paths: vec![file_path.into()],
        }
    }

    /// The offending file paths carried by this error
    pub fn file_paths(&self) -> &[String] {
        match self {
            Self::DoesNotExist { file_paths } => file_paths,
        }
    }
}
