use crate::cost::ProjectSummary;
use crate::error::ExportError;
use crate::model::Project;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A project snapshot together with its computed totals.
#[derive(Debug, Serialize)]
pub struct ProjectExport<'a> {
    pub project: &'a Project,
    pub summary: ProjectSummary,
}

impl<'a> ProjectExport<'a> {
    #[must_use]
    pub fn new(project: &'a Project) -> Self {
        Self {
            project,
            summary: ProjectSummary::build(project),
        }
    }
}

pub fn export_json<P: AsRef<Path>>(project: &Project, path: P) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let json = serde_json::to_string_pretty(&ProjectExport::new(project))?;

    let mut file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    file.write_all(json.as_bytes())
        .map_err(|e| ExportError::WriteError {
            message: e.to_string(),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Procedure, Resource};
    use pretty_assertions::assert_eq;

    #[test]
    fn export_carries_snapshot_and_totals() {
        let mut project = Project::new("Hotel");
        let department = project.add_department("Cozinha").unwrap();
        let mut procedure = Procedure::new("Preparar");
        procedure.resources.push(Category::Consumables, Resource::new("Farinha", 12.5));
        department.procedures.push(procedure);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hotel.json");
        export_json(&project, &path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["project"]["name"], "Hotel");
        assert_eq!(value["summary"]["total"], 12.5);
        assert_eq!(value["summary"]["category_totals"]["consumables"], 12.5);
    }
}
