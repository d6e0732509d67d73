//! # Project Explorer Filters
//!
//! Display filtering for the project explorer screen: a free-text
//! search over name/location/description plus exact status and type
//! filters. Filters never mutate registry state.

use crate::registry::Project;
use crate::types::{ProjectStatus, ProjectType};
use serde::{Deserialize, Serialize};

// =============================================================================
// PROJECT FILTER
// =============================================================================

/// A combination of explorer filters. Empty filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFilter {
    /// Case-insensitive substring matched against name, location, and
    /// description.
    pub query: Option<String>,
    /// Exact status match.
    pub status: Option<ProjectStatus>,
    /// Exact ecosystem type match.
    pub project_type: Option<ProjectType>,
}

impl ProjectFilter {
    /// Filter matching every project.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to projects containing `query` in name, location, or
    /// description.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Restrict to one status.
    #[must_use]
    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to one ecosystem type.
    #[must_use]
    pub fn with_type(mut self, project_type: ProjectType) -> Self {
        self.project_type = Some(project_type);
        self
    }

    /// Whether a project passes every active filter.
    #[must_use]
    pub fn matches(&self, project: &Project) -> bool {
        if let Some(status) = self.status {
            if project.status != status {
                return false;
            }
        }
        if let Some(project_type) = self.project_type {
            if project.project_type != project_type {
                return false;
            }
        }
        if let Some(query) = &self.query {
            let needle = query.to_lowercase();
            if needle.is_empty() {
                return true;
            }
            return project.name.to_lowercase().contains(&needle)
                || project.location.to_lowercase().contains(&needle)
                || project.description.to_lowercase().contains(&needle);
        }
        true
    }

    /// Apply the filter over a project iterator.
    pub fn apply<'a>(&self, projects: impl Iterator<Item = &'a Project>) -> Vec<&'a Project> {
        projects.filter(|p| self.matches(p)).collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_registry;

    #[test]
    fn empty_filter_matches_all() {
        let registry = demo_registry();
        let filter = ProjectFilter::all();
        assert_eq!(
            filter.apply(registry.projects()).len(),
            registry.projects().count()
        );
    }

    #[test]
    fn query_is_case_insensitive_over_fields() {
        let registry = demo_registry();

        let by_name = ProjectFilter::all().with_query("MANGROVE");
        assert!(!by_name.apply(registry.projects()).is_empty());

        let by_location = ProjectFilter::all().with_query("monterey");
        let hits = by_location.apply(registry.projects());
        assert_eq!(hits.len(), 1);
        assert!(hits[0].location.contains("Monterey"));

        let no_hits = ProjectFilter::all().with_query("peatland bog");
        assert!(no_hits.apply(registry.projects()).is_empty());
    }

    #[test]
    fn status_and_type_filters_compose() {
        let registry = demo_registry();

        let issued = ProjectFilter::all().with_status(ProjectStatus::Issued);
        for project in issued.apply(registry.projects()) {
            assert_eq!(project.status, ProjectStatus::Issued);
        }

        let issued_seagrass = ProjectFilter::all()
            .with_status(ProjectStatus::Issued)
            .with_type(ProjectType::Seagrass);
        for project in issued_seagrass.apply(registry.projects()) {
            assert_eq!(project.project_type, ProjectType::Seagrass);
            assert_eq!(project.status, ProjectStatus::Issued);
        }
    }
}
