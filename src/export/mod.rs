pub mod csv;
pub mod html;
pub mod json;
pub mod print;

pub use crate::error::ExportError;
pub use csv::export_csv;
pub use html::{escape_html, format_brl, paginate, render_report, ReportOptions};
pub use json::export_json;
pub use print::{export_report, open_print_view};
