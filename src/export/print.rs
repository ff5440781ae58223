use crate::error::ExportError;
use crate::export::html::{render_report, ReportOptions};
use crate::model::Project;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

/// Renders the report for `project` and writes it to `path`.
pub fn export_report<P: AsRef<Path>>(project: &Project, options: &ReportOptions, path: P) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let html = render_report(project, options);

    let mut file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    file.write_all(html.as_bytes())
        .map_err(|e| ExportError::WriteError {
            message: e.to_string(),
        })?;

    info!(path = %path_ref.display(), bytes = html.len(), "report written");
    Ok(())
}

/// Hands the written report to the platform's default opener, which shows it
/// in a browser where the embedded script triggers printing.
pub fn open_print_view<P: AsRef<Path>>(path: P) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let unavailable = |message: String| {
        warn!(path = %path_ref.display(), %message, "print view unavailable");
        ExportError::PrintViewUnavailable {
            path: path_ref.to_path_buf(),
            message,
        }
    };

    let mut command = opener_command(path_ref);
    let status = command
        .status()
        .map_err(|e| unavailable(format!("failed to start the opener: {e}")))?;
    if !status.success() {
        return Err(unavailable(format!("the opener exited with status {status}")));
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn opener_command(path: &Path) -> Command {
    let mut command = Command::new("open");
    command.arg(path);
    command
}

#[cfg(target_os = "windows")]
fn opener_command(path: &Path) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]).arg(path);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener_command(path: &Path) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(path);
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_report_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relatorio.html");
        export_report(&Project::new("Hotel"), &ReportOptions::default(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
        assert!(written.contains("Relatório - Hotel"));
    }

    #[test]
    fn unwritable_path_is_a_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("relatorio.html");
        let err = export_report(&Project::new("Hotel"), &ReportOptions::default(), &path).unwrap_err();
        assert!(matches!(err, ExportError::FileCreate { .. }));
    }
}
