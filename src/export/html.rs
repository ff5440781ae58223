//! Printable department report.
//!
//! Every department gets one or more A4 landscape pages. Procedures that share
//! a resource group collapse into one row, and each page holds at most
//! [`MAX_ROWS_PER_PAGE`] rows. Rows are spread evenly across pages, so seven
//! rows print as 4 + 3 rather than 6 + 1.

use crate::cost::{category_subtotal, group_procedures, rows_total, used_categories, ProcedureRow};
use crate::model::{Category, Department, Project};
use std::fmt::{self, Write};
use tracing::info;

pub const MAX_ROWS_PER_PAGE: usize = 6;

pub const LOGO_SRC: &str = "/logo.png";

const UTILITY_CSS_CDN: &str = "https://cdn.tailwindcss.com";

const PROJECT_ICON_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" class="inline-block mr-3 align-middle"><rect width="20" height="14" x="2" y="7" rx="2" ry="2"></rect><path d="M16 21V5a2 2 0 0 0-2-2h-4a2 2 0 0 0-2 2v16"></path></svg>"#;

const PAGE_STYLES: &str = r"
@page { size: A4 landscape; margin: 0; }
body { font-family: ui-sans-serif, system-ui, sans-serif; -webkit-print-color-adjust: exact; color-adjust: exact; }
.page-container { width: 100vw; height: 100vh; display: flex; align-items: center; justify-content: center; box-sizing: border-box; }
.page-border { position: relative; width: calc(100% - 30mm); height: calc(100% - 30mm); border: 2px solid #d1d5db; border-radius: 12px; display: flex; align-items: center; justify-content: center; box-sizing: border-box; padding: 10px; }
.content-center { width: 100%; height: 100%; border-radius: 8px; padding: 20px; box-sizing: border-box; display: flex; flex-direction: column; justify-content: center; position: relative; }
.table-container { width: 100%; font-size: 12px; max-height: calc(100vh - 200px); }
.project-name-corner { position: absolute; top: 25px; right: 25px; font-size: 22px; font-weight: 700; z-index: 10; display: flex; align-items: center; }
.logo-corner { position: absolute; bottom: 15px; left: 25px; z-index: 10; }
.logo-box { width: 170px; height: 100px; font-size: 1.1rem; font-weight: 600; }
.page-break { page-break-before: always; }
table { border-collapse: collapse; }
th, td { word-wrap: break-word; overflow-wrap: break-word; }
.resource-list { display: flex; flex-direction: column; gap: 4px; }
.resource-item { display: flex; flex-direction: column; padding-bottom: 4px; border-bottom: 1px solid #f3f4f6; }
.resource-item:last-child { border-bottom: none; padding-bottom: 0; }
.resource-name { text-align: left; font-size: 1em; line-height: 1.3; }
.resource-observation { font-size: 0.9em; color: #6b7280; font-style: italic; padding-top: 3px; white-space: pre-wrap; word-wrap: break-word; }
.subtotal-row { margin-top: 6px; padding-top: 6px; border-top: 1px solid #e5e7eb; font-weight: bold; text-align: right; font-size: 0.95em; }
.notes-container { position: absolute; bottom: 15px; right: 25px; z-index: 10; max-width: 45%; font-size: 14px; text-align: right; }
";

/// Shrinks the font of crowded columns. Columns are measured by the total
/// characters of their cells; the first threshold exceeded wins.
const LAYOUT_SCRIPT: &str = r"
function adjustLayoutDynamically() {
    const pages = document.querySelectorAll('.page-container');
    pages.forEach(page => {
        const table = page.querySelector('table');
        if (!table) return;
        const rows = table.querySelectorAll('tbody tr');
        if (rows.length === 0) return;
        const numColumns = rows[0].querySelectorAll('td').length;
        const columnCharCounts = Array(numColumns).fill(0);
        rows.forEach(row => {
            row.querySelectorAll('td').forEach((cell, index) => {
                columnCharCounts[index] += cell.innerText.length;
            });
        });
        const COLUMN_THRESHOLDS = [
            { limit: 500, size: '7px' },
            { limit: 350, size: '8px' },
            { limit: 200, size: '9px' },
            { limit: 100, size: '10px' }
        ];
        columnCharCounts.forEach((totalChars, columnIndex) => {
            for (const threshold of COLUMN_THRESHOLDS) {
                if (totalChars > threshold.limit) {
                    rows.forEach(row => {
                        const cell = row.querySelectorAll('td')[columnIndex];
                        if (cell) {
                            cell.style.fontSize = threshold.size;
                            cell.style.lineHeight = '1.2';
                        }
                    });
                    break;
                }
            }
        });
    });
}
";

/// Tailwind classes and the corner text color for one department.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepartmentColors {
    pub header: &'static str,
    pub table_header: &'static str,
    pub row: &'static str,
    pub border: &'static str,
    pub text: &'static str,
    pub text_color: &'static str,
}

const fn scheme(hue: &'static [&'static str; 5], text_color: &'static str) -> DepartmentColors {
    DepartmentColors {
        header: hue[0],
        table_header: hue[1],
        row: hue[2],
        border: hue[3],
        text: hue[4],
        text_color,
    }
}

pub static PALETTE: [DepartmentColors; 5] = [
    scheme(
        &["bg-purple-600", "bg-purple-500", "bg-purple-50", "border-purple-300", "text-purple-900"],
        "#581c87",
    ),
    scheme(
        &["bg-blue-600", "bg-blue-500", "bg-blue-50", "border-blue-300", "text-blue-900"],
        "#1e3a8a",
    ),
    scheme(
        &["bg-emerald-600", "bg-emerald-500", "bg-emerald-50", "border-emerald-300", "text-emerald-900"],
        "#065f46",
    ),
    scheme(
        &["bg-rose-600", "bg-rose-500", "bg-rose-50", "border-rose-300", "text-rose-900"],
        "#881337",
    ),
    scheme(
        &["bg-amber-600", "bg-amber-500", "bg-amber-50", "border-amber-300", "text-amber-900"],
        "#92400e",
    ),
];

/// Color scheme for the department at `index`, cycling through [`PALETTE`].
#[must_use]
pub fn department_colors(index: usize) -> &'static DepartmentColors {
    &PALETTE[index % PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Print per-cell subtotals and the department total footer.
    pub show_subtotals: bool,
    /// Delay before the print dialog opens.
    pub print_delay_ms: u64,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            show_subtotals: true,
            print_delay_ms: crate::config::DEFAULT_PRINT_DELAY_MS,
        }
    }
}

/// Number of pages for `rows` rows. An empty department still gets one page.
#[must_use]
pub const fn page_count(rows: usize) -> usize {
    if rows == 0 {
        1
    } else {
        rows.div_ceil(MAX_ROWS_PER_PAGE)
    }
}

/// Splits `rows` into [`page_count`] slices of `ceil(len / pages)` rows; only
/// the last slice may be shorter.
#[must_use]
pub fn paginate<T>(rows: &[T]) -> Vec<&[T]> {
    let pages = page_count(rows.len());
    let per_page = rows.len().div_ceil(pages);
    (0..pages)
        .map(|page| {
            let start = (page * per_page).min(rows.len());
            let end = (start + per_page).min(rows.len());
            &rows[start..end]
        })
        .collect()
}

/// Escapes `& < > " ' /` for safe inclusion in HTML text and attributes.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            '/' => escaped.push_str("&#x2F;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Formats an amount as Brazilian reais, e.g. `R$ 1.234,56` (with a
/// non-breaking space after the symbol).
#[must_use]
pub fn format_brl(value: f64) -> String {
    let cents = (value * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    format!("{sign}R$\u{a0}{grouped},{:02}", cents % 100)
}

/// Renders the complete standalone print document for `project`.
#[must_use]
pub fn render_report(project: &Project, options: &ReportOptions) -> String {
    let mut html = String::new();
    // Writing into a String cannot fail.
    let _ = write_document(&mut html, project, options);
    html
}

fn write_document(out: &mut String, project: &Project, options: &ReportOptions) -> fmt::Result {
    let title = escape_html(&project.name);
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"pt-BR\">")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"UTF-8\">")?;
    writeln!(out, "<title>Relatório - {title}</title>")?;
    writeln!(out, "<script src=\"{UTILITY_CSS_CDN}\"></script>")?;
    writeln!(out, "<style>{PAGE_STYLES}</style>")?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;

    let pages = write_pages(out, project, options)?;

    writeln!(out, "<script>{LAYOUT_SCRIPT}")?;
    writeln!(out, "window.onload = () => {{")?;
    writeln!(out, "    try {{")?;
    writeln!(out, "        adjustLayoutDynamically();")?;
    writeln!(out, "    }} catch (e) {{")?;
    writeln!(out, "        console.error(\"Falha ao ajustar layout de impressão:\", e);")?;
    writeln!(out, "    }}")?;
    writeln!(out, "    setTimeout(() => {{ window.print(); }}, {});", options.print_delay_ms)?;
    writeln!(out, "}};")?;
    writeln!(out, "</script>")?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")?;

    info!(
        project = %project.id,
        departments = project.departments.len(),
        pages,
        "report rendered"
    );
    Ok(())
}

/// Writes every department's pages and returns how many were written.
fn write_pages(out: &mut String, project: &Project, options: &ReportOptions) -> Result<usize, fmt::Error> {
    let project_name = escape_html(&project.name);
    let mut written = 0;

    for (dept_index, department) in project.departments.iter().enumerate() {
        let rows = group_procedures(department);
        let table = DepartmentTable {
            department,
            colors: department_colors(dept_index),
            categories: used_categories(&rows),
            total: rows_total(&rows),
        };
        let pages = paginate(&rows);

        for (page_index, page_rows) in pages.iter().enumerate() {
            let page = PageInfo {
                dept_index,
                page_index,
                page_total: pages.len(),
                page_break: written > 0,
            };
            table.write_page(out, &project_name, &page, page_rows, options)?;
            written += 1;
        }
    }
    Ok(written)
}

struct PageInfo {
    dept_index: usize,
    page_index: usize,
    page_total: usize,
    page_break: bool,
}

impl PageInfo {
    const fn is_last(&self) -> bool {
        self.page_index + 1 == self.page_total
    }
}

struct DepartmentTable<'a> {
    department: &'a Department,
    colors: &'static DepartmentColors,
    categories: Vec<Category>,
    total: f64,
}

impl DepartmentTable<'_> {
    fn write_page(
        &self,
        out: &mut String,
        project_name: &str,
        page: &PageInfo,
        rows: &[ProcedureRow<'_>],
        options: &ReportOptions,
    ) -> fmt::Result {
        let colors = self.colors;
        let page_break = if page.page_break { " page-break" } else { "" };

        writeln!(
            out,
            "<div class=\"page-container{page_break}\" data-dept-index=\"{}\" data-page-index=\"{}\">",
            page.dept_index, page.page_index
        )?;
        writeln!(out, "<div class=\"page-border\">")?;
        writeln!(out, "<div class=\"content-center border-4 {}\">", colors.border)?;
        writeln!(
            out,
            "<div class=\"project-name-corner\" style=\"color: {};\">{PROJECT_ICON_SVG}<span>{project_name}</span></div>",
            colors.text_color
        )?;

        writeln!(out, "<div class=\"table-container\">")?;
        self.write_header(out, page)?;
        writeln!(
            out,
            "<div class=\"overflow-hidden border-x-2 border-b-2 {} rounded-b-lg bg-white\">",
            colors.border
        )?;
        writeln!(
            out,
            "<table class=\"w-full table-fixed\" id=\"table-{}-{}\">",
            page.dept_index, page.page_index
        )?;
        self.write_column_headers(out)?;

        writeln!(out, "<tbody>")?;
        for (index, row) in rows.iter().enumerate() {
            self.write_row(out, index, row, options)?;
        }
        writeln!(out, "</tbody>")?;

        if options.show_subtotals && self.total > 0.0 && page.is_last() {
            writeln!(out, "<tfoot>")?;
            writeln!(out, "<tr class=\"{} font-bold text-white\">", colors.table_header)?;
            writeln!(
                out,
                "<td colspan=\"{}\" class=\"p-3 text-right\">TOTAL DO DEPARTAMENTO: {}</td>",
                self.categories.len() + 1,
                format_brl(self.total)
            )?;
            writeln!(out, "</tr>")?;
            writeln!(out, "</tfoot>")?;
        }
        writeln!(out, "</table>")?;
        writeln!(out, "</div>")?;
        writeln!(out, "</div>")?;

        writeln!(
            out,
            "<div class=\"logo-corner\"><div class=\"logo-box flex items-center justify-center\"><img src=\"{LOGO_SRC}\" alt=\"Logo da Empresa\" style=\"max-width: 100%; max-height: 100%; object-fit: contain;\"></div></div>"
        )?;

        if page.is_last() {
            if let Some(notes) = self.department.notes.as_deref().filter(|n| !n.trim().is_empty()) {
                writeln!(out, "<div class=\"notes-container\">")?;
                writeln!(out, "<h3 class=\"font-bold text-gray-700\">Observações:</h3>")?;
                writeln!(
                    out,
                    "<p class=\"text-gray-600 whitespace-pre-wrap\">{}</p>",
                    escape_html(notes)
                )?;
                writeln!(out, "</div>")?;
            }
        }

        writeln!(out, "</div>")?;
        writeln!(out, "</div>")?;
        writeln!(out, "</div>")
    }

    fn write_header(&self, out: &mut String, page: &PageInfo) -> fmt::Result {
        let counter = if page.page_total > 1 {
            format!(" ({}/{})", page.page_index + 1, page.page_total)
        } else {
            String::new()
        };
        writeln!(
            out,
            "<header class=\"{} p-6 rounded-t-lg text-white text-center border-t-2 border-x-2 {}\">",
            self.colors.header, self.colors.border
        )?;
        writeln!(
            out,
            "<h2 class=\"text-2xl font-bold tracking-wider\">{}{counter}</h2>",
            escape_html(&self.department.name)
        )?;
        writeln!(out, "</header>")
    }

    fn write_column_headers(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "<thead>")?;
        write!(out, "<tr class=\"{}\">", self.colors.table_header)?;
        write!(
            out,
            "<th class=\"p-3 font-bold text-white text-left border-r border-white/30 table-header-text\" style=\"width: 20%;\">POP</th>"
        )?;
        let width = 80.0 / self.categories.len().max(1) as f64;
        for category in &self.categories {
            write!(
                out,
                "<th class=\"p-3 font-bold text-white text-center border-r border-white/30 last:border-r-0 table-header-text\" style=\"width: {width}%;\">{}</th>",
                escape_html(category.print_label())
            )?;
        }
        writeln!(out, "</tr>")?;
        writeln!(out, "</thead>")
    }

    fn write_row(&self, out: &mut String, index: usize, row: &ProcedureRow<'_>, options: &ReportOptions) -> fmt::Result {
        let colors = self.colors;
        let background = if index % 2 == 0 { "bg-white" } else { colors.row };
        writeln!(out, "<tr class=\"{background}\">")?;
        write!(
            out,
            "<td class=\"p-3 border-t border-r {} font-semibold {} align-top\">",
            colors.border, colors.text
        )?;
        write!(
            out,
            "<div class=\"font-bold\">{}</div>",
            escape_html(&row.procedure_names.join(", "))
        )?;
        if let Some(group) = row.group {
            write!(
                out,
                "<div class=\"opacity-70 mt-1\" style=\"font-size: 0.9em;\">Modelo: {}</div>",
                escape_html(&group.name)
            )?;
        }
        writeln!(out, "</td>")?;

        for &category in &self.categories {
            write!(
                out,
                "<td class=\"p-2 border-t border-r {} last:border-r-0 align-top\">",
                colors.border
            )?;
            write_cell(out, category, row.resources.get(category), options)?;
            writeln!(out, "</td>")?;
        }
        writeln!(out, "</tr>")
    }
}

fn write_cell(
    out: &mut String,
    category: Category,
    items: &[crate::model::Resource],
    options: &ReportOptions,
) -> fmt::Result {
    if items.is_empty() {
        return write!(out, "<span class=\"text-gray-400 italic\">N/A</span>");
    }

    write!(out, "<div class=\"resource-list\">")?;
    for item in items {
        write!(
            out,
            "<div class=\"resource-item\"><span class=\"resource-name\">{}</span>",
            escape_html(&item.name)
        )?;
        if let Some(notes) = item.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            write!(out, "<div class=\"resource-observation\">{}</div>", escape_html(notes))?;
        }
        write!(out, "</div>")?;
    }
    write!(out, "</div>")?;

    let subtotal = category_subtotal(items);
    if options.show_subtotals && subtotal > 0.0 && !category.is_recurrence() {
        write!(out, "<div class=\"subtotal-row\">Subtotal: {}</div>", format_brl(subtotal))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Procedure, Resource, ResourceGroup};
    use pretty_assertions::assert_eq;

    fn lengths(rows: usize) -> Vec<usize> {
        let data: Vec<usize> = (0..rows).collect();
        paginate(&data).iter().map(|page| page.len()).collect()
    }

    #[test]
    fn pagination_spreads_rows_evenly() {
        assert_eq!(lengths(0), vec![0]);
        assert_eq!(lengths(1), vec![1]);
        assert_eq!(lengths(6), vec![6]);
        assert_eq!(lengths(7), vec![4, 3]);
        assert_eq!(lengths(12), vec![6, 6]);
        assert_eq!(lengths(13), vec![5, 5, 3]);
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#039;s&lt;&#x2F;a&gt;"
        );
        assert_eq!(escape_html(""), "");
    }

    #[test]
    fn formats_reais() {
        assert_eq!(format_brl(0.0), "R$\u{a0}0,00");
        assert_eq!(format_brl(99.9), "R$\u{a0}99,90");
        assert_eq!(format_brl(1234.56), "R$\u{a0}1.234,56");
        assert_eq!(format_brl(1_000_000.0), "R$\u{a0}1.000.000,00");
        assert_eq!(format_brl(-5.5), "-R$\u{a0}5,50");
    }

    #[test]
    fn palette_cycles_after_five_departments() {
        assert_eq!(department_colors(0), department_colors(5));
        assert_eq!(department_colors(1).text_color, "#1e3a8a");
    }

    fn department_with_rows(rows: usize) -> Department {
        let mut department = Department::new("Recepção");
        for i in 0..rows {
            let mut procedure = Procedure::new(format!("POP {i}"));
            procedure
                .resources
                .push(Category::People, Resource::new("Recepcionista", 10.0));
            department.procedures.push(procedure);
        }
        department
    }

    #[test]
    fn footer_and_notes_only_on_last_page() {
        let mut project = Project::new("Hotel");
        let mut department = department_with_rows(7);
        department.notes = Some("Revisar em março".to_string());
        project.departments.push(department);

        let html = render_report(&project, &ReportOptions::default());
        assert_eq!(html.matches("TOTAL DO DEPARTAMENTO").count(), 1);
        assert_eq!(html.matches("Observações:").count(), 1);
        assert!(html.contains("Recepção (1/2)"));
        assert!(html.contains("Recepção (2/2)"));
        assert!(html.contains("TOTAL DO DEPARTAMENTO: R$\u{a0}70,00"));

        let footer = html.find("TOTAL DO DEPARTAMENTO").unwrap();
        let second_page = html.find("data-page-index=\"1\"").unwrap();
        assert!(footer > second_page);
    }

    #[test]
    fn blank_item_notes_are_skipped() {
        let mut department = Department::new("Recepção");
        let mut procedure = Procedure::new("Check-in");
        let mut blank = Resource::new("Recepcionista", 10.0);
        blank.notes = Some("  ".to_string());
        procedure.resources.push(Category::People, blank);
        procedure.resources.push(
            Category::Documents,
            Resource::new("Ficha", 1.0).with_notes(Some("2 vias".to_string())),
        );
        department.procedures.push(procedure);
        let mut project = Project::new("Hotel");
        project.departments.push(department);

        let html = render_report(&project, &ReportOptions::default());
        assert_eq!(html.matches("<div class=\"resource-observation\">").count(), 1);
        assert!(html.contains("<div class=\"resource-observation\">2 vias</div>"));
    }

    #[test]
    fn subtotals_can_be_hidden() {
        let mut project = Project::new("Hotel");
        project.departments.push(department_with_rows(2));
        let options = ReportOptions {
            show_subtotals: false,
            ..ReportOptions::default()
        };

        let html = render_report(&project, &options);
        assert!(!html.contains("Subtotal:"));
        assert!(!html.contains("TOTAL DO DEPARTAMENTO"));
    }

    #[test]
    fn group_rows_show_template_and_empty_cells() {
        let mut department = Department::new("Cozinha");
        let mut group = ResourceGroup::new("Padrão");
        group.resources.push(Category::Equipment, Resource::new("Forno", 50.0));
        let mut grouped = Procedure::new("Assar");
        grouped.group_id = Some(group.id.clone());
        let mut own = Procedure::new("Lavar");
        own.resources.push(Category::People, Resource::new("Auxiliar", 20.0));
        department.resource_groups.push(group);
        department.procedures = vec![grouped, own];

        let mut project = Project::new("Restaurante");
        project.departments.push(department);
        let html = render_report(&project, &ReportOptions::default());

        assert!(html.contains("Modelo: Padrão"));
        assert_eq!(html.matches(">N/A</span>").count(), 2);
        assert!(html.contains(">PESSOAS</th>"));
        assert!(html.contains(">EQUIPAMENTOS</th>"));
        assert!(html.contains("style=\"width: 40%;\""));
    }

    #[test]
    fn recurrence_cells_never_show_subtotals() {
        let mut department = Department::new("Limpeza");
        let mut procedure = Procedure::new("Higienizar");
        procedure
            .resources
            .push(Category::Recurrence, Resource::new("Diariamente", 15.0));
        department.procedures.push(procedure);
        let mut project = Project::new("Hotel");
        project.departments.push(department);

        let html = render_report(&project, &ReportOptions::default());
        assert!(html.contains(">RECORRÊNCIA</th>"));
        assert!(!html.contains("Subtotal:"));
    }

    #[test]
    fn print_delay_is_configurable() {
        let project = Project::new("Hotel");
        let options = ReportOptions {
            print_delay_ms: 1200,
            ..ReportOptions::default()
        };
        let html = render_report(&project, &options);
        assert!(html.contains("setTimeout(() => { window.print(); }, 1200);"));
        assert!(html.contains("<title>Relatório - Hotel</title>"));
    }
}
