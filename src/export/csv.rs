use crate::cost::group_procedures;
use crate::error::ExportError;
use crate::model::Project;
use std::fs::File;
use std::io;
use std::path::Path;

const HEADER: [&str; 7] = [
    "Departamento",
    "POPs",
    "Modelo",
    "Categoria",
    "Item",
    "Observações",
    "Custo",
];

/// Writes the cost breakdown to `path`: one line per effective resource of
/// every report row.
pub fn export_csv<P: AsRef<Path>>(project: &Project, path: P) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;
    write_csv(project, file)
}

pub fn write_csv<W: io::Write>(project: &Project, out: W) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);

    writer.write_record(HEADER)?;

    for department in &project.departments {
        for row in group_procedures(department) {
            let procedures = row.procedure_names.join(", ");
            let group = row.group.map_or("", |g| g.name.as_str());
            for (category, items) in row.resources.iter() {
                for item in items {
                    let cost = format!("{:.2}", item.cost);
                    writer.write_record([
                        department.name.as_str(),
                        procedures.as_str(),
                        group,
                        category.label(),
                        item.name.as_str(),
                        item.notes.as_deref().unwrap_or(""),
                        cost.as_str(),
                    ])?;
                }
            }
        }
    }

    writer.flush().map_err(|e| ExportError::WriteError {
        message: e.to_string(),
    })?;

    Ok(())
}
