use tracing::debug;

use crate::project::{Project, ProjectContainer, ProjectError};

/// Authoritative in-memory set of projects known to the backend
///
/// Entries are keyed by their project file path; at most one entry per path
/// exists at any time. Lookups and removals are linear scans, which is
/// sufficient at the expected scale of tens to low hundreds of open
/// projects.
///
/// The registry is owned exclusively by the message dispatcher and carries
/// no internal synchronization.
#[derive(Debug, Default)]
pub struct ProjectRegistry {
    projects: Vec<Project>,
}

impl ProjectRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the given projects, updating entries that already exist
    ///
    /// Containers are processed in input order. A container whose file path
    /// is already registered replaces that entry's arguments in place; any
    /// other container inserts a new entry. If the same path appears twice
    /// in one batch, the second occurrence sees the first one's entry and
    /// wins. Never fails.
    pub fn create_or_update(&mut self, containers: &[ProjectContainer]) {
        for container in containers {
            self.create_or_update_project(container);
        }
    }

    /// Remove the projects identified by the given file paths
    ///
    /// A single pass over the live entries removes every project whose file
    /// path matches a still-unconsumed element of the input; each match
    /// consumes exactly one occurrence. Matched entries are removed even
    /// when the call fails: a non-empty remainder after the pass is
    /// reported as one aggregate [`ProjectError::DoesNotExist`] carrying
    /// all unmatched paths, with no rollback of the removals that did
    /// apply.
    ///
    /// Duplicate paths in the input are tolerated. Registry paths are
    /// unique, so only the first occurrence of a duplicate can match; the
    /// surplus occurrences end up in the unmatched remainder.
    pub fn remove(&mut self, file_paths: &[String]) -> Result<(), ProjectError> {
        let mut pending: Vec<String> = file_paths.to_vec();

        self.projects.retain(|project| {
            match pending.iter().position(|path| path == project.file_path()) {
                Some(index) => {
                    pending.remove(index);
                    debug!(file_path = %project.file_path(), "Removed project");
                    false
                }
                None => true,
            }
        });

        if pending.is_empty() {
            Ok(())
        } else {
            Err(ProjectError::DoesNotExist {
                file_paths: pending,
            })
        }
    }

    /// Whether a project with this exact file path is registered
    pub fn has_project(&self, file_path: &str) -> bool {
        self.find_project(file_path).is_some()
    }

    /// Look up a project by file path
    pub fn project(&self, file_path: &str) -> Result<&Project, ProjectError> {
        self.find_project(file_path)
            .ok_or_else(|| ProjectError::does_not_exist(file_path))
    }

    /// All currently registered projects, in registry order
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    fn create_or_update_project(&mut self, container: &ProjectContainer) {
        match self.find_project_mut(&container.file_path) {
            Some(project) => {
                debug!(file_path = %container.file_path, "Updated project arguments");
                project.set_arguments(container.arguments.clone());
            }
            None => {
                debug!(file_path = %container.file_path, "Registered project");
                self.projects.push(Project::from(container.clone()));
            }
        }
    }

    fn find_project(&self, file_path: &str) -> Option<&Project> {
        self.projects
            .iter()
            .find(|project| project.file_path() == file_path)
    }

    fn find_project_mut(&mut self, file_path: &str) -> Option<&mut Project> {
        self.projects
            .iter_mut()
            .find(|project| project.file_path() == file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(file_path: &str, arguments: &[&str]) -> ProjectContainer {
        ProjectContainer::new(
            file_path,
            arguments.iter().map(|argument| argument.to_string()).collect(),
        )
    }

    fn paths(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn create_registers_distinct_projects() {
        let mut registry = ProjectRegistry::new();

        registry.create_or_update(&[
            container("/a/a.pro", &["-j4"]),
            container("/b/b.pro", &[]),
        ]);

        assert!(registry.has_project("/a/a.pro"));
        assert!(registry.has_project("/b/b.pro"));
        assert_eq!(registry.project("/a/a.pro").unwrap().arguments(), ["-j4"]);
        assert!(registry.project("/b/b.pro").unwrap().arguments().is_empty());
        assert_eq!(registry.projects().len(), 2);
    }

    #[test]
    fn update_replaces_arguments_without_duplicating_entry() {
        let mut registry = ProjectRegistry::new();

        registry.create_or_update(&[container("/a/a.pro", &["-j4"])]);
        registry.create_or_update(&[container("/a/a.pro", &["-j8", "-DNDEBUG"])]);

        assert_eq!(registry.projects().len(), 1);
        assert_eq!(
            registry.project("/a/a.pro").unwrap().arguments(),
            ["-j8", "-DNDEBUG"]
        );
    }

    #[test]
    fn update_preserves_registration_timestamp() {
        let mut registry = ProjectRegistry::new();

        registry.create_or_update(&[container("/a/a.pro", &["-j4"])]);
        let registered_at = registry.project("/a/a.pro").unwrap().registered_at();

        registry.create_or_update(&[container("/a/a.pro", &["-j8"])]);

        assert_eq!(
            registry.project("/a/a.pro").unwrap().registered_at(),
            registered_at
        );
    }

    #[test]
    fn duplicate_path_within_one_batch_last_occurrence_wins() {
        let mut registry = ProjectRegistry::new();

        registry.create_or_update(&[
            container("/a/a.pro", &["-j4"]),
            container("/a/a.pro", &["-j8"]),
        ]);

        assert_eq!(registry.projects().len(), 1);
        assert_eq!(registry.project("/a/a.pro").unwrap().arguments(), ["-j8"]);
    }

    #[test]
    fn remove_deletes_all_matching_projects() {
        let mut registry = ProjectRegistry::new();
        registry.create_or_update(&[
            container("/a/a.pro", &[]),
            container("/b/b.pro", &[]),
            container("/c/c.pro", &[]),
        ]);

        registry
            .remove(&paths(&["/a/a.pro", "/c/c.pro"]))
            .unwrap();

        assert!(!registry.has_project("/a/a.pro"));
        assert!(registry.has_project("/b/b.pro"));
        assert!(!registry.has_project("/c/c.pro"));
        assert_eq!(registry.projects().len(), 1);
    }

    #[test]
    fn remove_of_unknown_path_reports_it_and_keeps_matched_removals() {
        let mut registry = ProjectRegistry::new();
        registry.create_or_update(&[
            container("/a/a.pro", &["-j4"]),
            container("/b/b.pro", &[]),
        ]);

        let error = registry
            .remove(&paths(&["/a/a.pro", "/c/c.pro"]))
            .unwrap_err();

        assert_eq!(
            error,
            ProjectError::DoesNotExist {
                file_paths: paths(&["/c/c.pro"]),
            }
        );
        assert!(!registry.has_project("/a/a.pro"));
        assert!(registry.has_project("/b/b.pro"));
    }

    #[test]
    fn remove_reports_all_unmatched_paths_together() {
        let mut registry = ProjectRegistry::new();
        registry.create_or_update(&[container("/a/a.pro", &[])]);

        let error = registry
            .remove(&paths(&["/x/x.pro", "/a/a.pro", "/y/y.pro"]))
            .unwrap_err();

        assert_eq!(
            error.file_paths(),
            paths(&["/x/x.pro", "/y/y.pro"]).as_slice()
        );
        assert!(registry.projects().is_empty());
    }

    #[test]
    fn remove_with_empty_input_is_a_no_op() {
        let mut registry = ProjectRegistry::new();
        registry.create_or_update(&[container("/a/a.pro", &[])]);

        registry.remove(&[]).unwrap();

        assert_eq!(registry.projects().len(), 1);
    }

    #[test]
    fn remove_duplicate_input_path_reports_surplus_occurrence() {
        let mut registry = ProjectRegistry::new();
        registry.create_or_update(&[container("/a/a.pro", &[])]);

        // Registry paths are unique, so only the first occurrence can be
        // consumed; the second is left over and reported.
        let error = registry
            .remove(&paths(&["/a/a.pro", "/a/a.pro"]))
            .unwrap_err();

        assert_eq!(error.file_paths(), paths(&["/a/a.pro"]).as_slice());
        assert!(!registry.has_project("/a/a.pro"));
    }

    #[test]
    fn lookup_on_empty_registry_reports_the_path() {
        let registry = ProjectRegistry::new();

        let error = registry.project("/a/a.pro").unwrap_err();

        assert_eq!(error, ProjectError::does_not_exist("/a/a.pro"));
    }

    #[test]
    fn lookup_of_never_inserted_path_reports_the_path() {
        let mut registry = ProjectRegistry::new();
        registry.create_or_update(&[container("/a/a.pro", &[])]);

        let error = registry.project("/b/b.pro").unwrap_err();

        assert_eq!(error.file_paths(), paths(&["/b/b.pro"]).as_slice());
    }

    #[test]
    fn has_project_is_false_for_unknown_path() {
        let registry = ProjectRegistry::new();

        assert!(!registry.has_project("/a/a.pro"));
    }

    #[test]
    fn error_display_joins_all_paths() {
        let error = ProjectError::DoesNotExist {
            file_paths: paths(&["/a/a.pro", "/c/c.pro"]),
        };

        assert_eq!(
            error.to_string(),
            "projects do not exist: /a/a.pro, /c/c.pro"
        );
    }
}
