//! The in-memory project collection and its persistence.
//!
//! Every accepted mutation replaces the collection and writes all of it back
//! under one key. Edits run on a clone of the target project and are
//! committed only when they succeed.

use crate::error::EditError;
use crate::model::{find_project, project::position_by_key, Department, Procedure, Project, ResourceGroup};
use crate::store::{self, KeyValueStore};
use tracing::{info, warn};

pub const DELETE_PROJECT_PROMPT: &str = "Tem certeza que deseja apagar este projeto e todos os seus dados?";
pub const DELETE_DEPARTMENT_PROMPT: &str = "Tem certeza que deseja apagar este departamento?";
pub const DELETE_PROCEDURE_PROMPT: &str = "Apagar este POP?";
pub const DELETE_GROUP_PROMPT: &str =
    "Tem a certeza que quer apagar este grupo? Os POPs que o usam perderão os seus recursos.";

/// Asks the user before a destructive change.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Accepts every prompt (`--yes`).
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Refuses every prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct Decline;

impl Confirm for Decline {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

#[derive(Debug)]
pub struct Workspace<S> {
    store: S,
    key: String,
    projects: Vec<Project>,
    last_save_failed: bool,
}

impl<S: KeyValueStore> Workspace<S> {
    /// Loads the collection stored under `key`, starting empty when nothing
    /// usable is there.
    pub fn open(store: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let projects: Vec<Project> = store::load(&store, &key, Vec::new);
        info!(key = %key, projects = projects.len(), "workspace opened");
        Self {
            store,
            key,
            projects,
            last_save_failed: false,
        }
    }

    #[must_use]
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the most recent write to the store failed. The in-memory state
    /// is still updated in that case.
    #[must_use]
    pub fn last_save_failed(&self) -> bool {
        self.last_save_failed
    }

    pub fn project(&self, key: &str) -> Result<&Project, EditError> {
        find_project(&self.projects, key).ok_or_else(|| EditError::NotFound {
            entity: "project",
            key: key.to_string(),
        })
    }

    /// Appends a new empty project and returns its id.
    pub fn create_project(&mut self, name: &str) -> Result<String, EditError> {
        let name = crate::edit::validate_name("project", name)?;
        let project = Project::new(name);
        let id = project.id.clone();

        let mut projects = self.projects.clone();
        projects.push(project);
        self.commit(projects);
        Ok(id)
    }

    /// Applies `edit` to a copy of the project and commits it on success.
    pub fn edit_project<T, F>(&mut self, key: &str, edit: F) -> Result<T, EditError>
    where
        F: FnOnce(&mut Project) -> Result<T, EditError>,
    {
        let index = self.index_of(key)?;
        let mut draft = self.projects[index].clone();
        let outcome = edit(&mut draft)?;

        let mut projects = self.projects.clone();
        projects[index] = draft;
        self.commit(projects);
        Ok(outcome)
    }

    /// Removes a project after confirmation. `Ok(None)` means the user declined.
    pub fn delete_project(&mut self, key: &str, confirm: &dyn Confirm) -> Result<Option<Project>, EditError> {
        let index = self.index_of(key)?;
        if !confirm.confirm(DELETE_PROJECT_PROMPT) {
            return Ok(None);
        }

        let mut projects = self.projects.clone();
        let removed = projects.remove(index);
        info!(project = %removed.id, "project deleted");
        self.commit(projects);
        Ok(Some(removed))
    }

    pub fn delete_department(
        &mut self,
        project: &str,
        department: &str,
        confirm: &dyn Confirm,
    ) -> Result<Option<Department>, EditError> {
        self.project(project)?.find_department(department).ok_or_else(|| EditError::NotFound {
            entity: "department",
            key: department.to_string(),
        })?;
        if !confirm.confirm(DELETE_DEPARTMENT_PROMPT) {
            return Ok(None);
        }
        self.edit_project(project, |p| p.remove_department(department)).map(Some)
    }

    pub fn delete_procedure(
        &mut self,
        project: &str,
        department: &str,
        procedure: &str,
        confirm: &dyn Confirm,
    ) -> Result<Option<Procedure>, EditError> {
        self.require_department(project, department)?
            .find_procedure(procedure)
            .ok_or_else(|| EditError::NotFound {
                entity: "procedure",
                key: procedure.to_string(),
            })?;
        if !confirm.confirm(DELETE_PROCEDURE_PROMPT) {
            return Ok(None);
        }
        self.edit_project(project, |p| p.department_mut(department)?.remove_procedure(procedure))
            .map(Some)
    }

    /// Removes a group and detaches every procedure that used it. Returns the
    /// group and the number of procedures detached.
    pub fn delete_group(
        &mut self,
        project: &str,
        department: &str,
        group: &str,
        confirm: &dyn Confirm,
    ) -> Result<Option<(ResourceGroup, usize)>, EditError> {
        self.require_department(project, department)?
            .find_group(group)
            .ok_or_else(|| EditError::NotFound {
                entity: "group",
                key: group.to_string(),
            })?;
        if !confirm.confirm(DELETE_GROUP_PROMPT) {
            return Ok(None);
        }
        self.edit_project(project, |p| p.department_mut(department)?.remove_group(group))
            .map(Some)
    }

    fn require_department(&self, project: &str, department: &str) -> Result<&Department, EditError> {
        self.project(project)?
            .find_department(department)
            .ok_or_else(|| EditError::NotFound {
                entity: "department",
                key: department.to_string(),
            })
    }

    fn index_of(&self, key: &str) -> Result<usize, EditError> {
        position_by_key(&self.projects, key, |p| (&p.id, &p.name)).ok_or_else(|| EditError::NotFound {
            entity: "project",
            key: key.to_string(),
        })
    }

    fn commit(&mut self, projects: Vec<Project>) {
        self.projects = projects;
        self.last_save_failed = !store::save(&self.store, &self.key, &self.projects);
        if self.last_save_failed {
            warn!(key = %self.key, "changes kept in memory only");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use crate::store::{MemoryStore, UnavailableStore};
    use pretty_assertions::assert_eq;

    fn workspace() -> Workspace<MemoryStore> {
        Workspace::open(MemoryStore::new(), "meus-projetos")
    }

    #[test]
    fn create_project_persists_whole_collection() {
        let mut ws = workspace();
        ws.create_project("Hotel").unwrap();
        ws.create_project("Clínica").unwrap();

        let raw = ws.store().raw("meus-projetos").unwrap();
        let stored: Vec<Project> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, ws.projects().to_vec());
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn failed_edit_leaves_state_untouched() {
        let mut ws = workspace();
        let id = ws.create_project("Hotel").unwrap();
        let before = ws.projects().to_vec();

        let result = ws.edit_project(&id, |p| {
            let department = p.add_department("Recepção")?;
            let procedure = department.add_procedure("Check-in")?;
            crate::edit::add_resource(&mut procedure.resources, Category::People, "Guia", "abc", None)
        });

        assert!(matches!(result, Err(EditError::InvalidCost { .. })));
        assert_eq!(ws.projects(), before.as_slice());
    }

    #[test]
    fn declined_delete_keeps_project() {
        let mut ws = workspace();
        let id = ws.create_project("Hotel").unwrap();

        assert!(ws.delete_project(&id, &Decline).unwrap().is_none());
        assert_eq!(ws.projects().len(), 1);

        let removed = ws.delete_project("Hotel", &AlwaysConfirm).unwrap();
        assert_eq!(removed.map(|p| p.id), Some(id));
        assert!(ws.projects().is_empty());
    }

    #[test]
    fn confirm_receives_the_prompt() {
        let mut ws = workspace();
        let id = ws.create_project("Hotel").unwrap();
        ws.edit_project(&id, |p| p.add_department("Cozinha").map(|_| ())).unwrap();

        let asked = std::cell::RefCell::new(String::new());
        let recorder = |prompt: &str| {
            asked.replace(prompt.to_string());
            false
        };
        ws.delete_department(&id, "Cozinha", &recorder).unwrap();
        assert_eq!(asked.into_inner(), DELETE_DEPARTMENT_PROMPT);
    }

    #[test]
    fn missing_entity_is_reported_before_asking() {
        let mut ws = workspace();
        let id = ws.create_project("Hotel").unwrap();
        let never = |_: &str| -> bool { panic!("must not ask") };
        assert!(matches!(
            ws.delete_group(&id, "Nenhum", "G", &never),
            Err(EditError::NotFound { entity: "department", .. })
        ));
    }

    #[test]
    fn unavailable_store_keeps_working_in_memory() {
        let mut ws = Workspace::open(UnavailableStore, "meus-projetos");
        assert!(ws.projects().is_empty());
        ws.create_project("Hotel").unwrap();
        assert!(ws.last_save_failed());
        assert_eq!(ws.projects().len(), 1);
    }
}
