pub mod project;
pub mod resource;

pub use project::{find_project, Department, Procedure, Project, ResourceGroup};
pub use resource::{Category, Resource, Resources};

/// Fresh identifier for a newly created entity.
#[must_use]
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
