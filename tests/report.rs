use pop_planner::cost::{department_total, project_total};
use pop_planner::edit::add_resource;
use pop_planner::export::{render_report, ReportOptions};
use pop_planner::model::{Category, Project};
use pretty_assertions::assert_eq;

/// Group G (people, cost 100) used by procedures A and B.
fn shared_group_project() -> Project {
    let mut project = Project::new("Hotel Central");
    let department = project.add_department("Recepção").unwrap();
    let group = department.add_group("G").unwrap();
    add_resource(&mut group.resources, Category::People, "Recepcionista", "100", None).unwrap();
    department.add_procedure("A").unwrap();
    department.add_procedure("B").unwrap();
    department.assign_group("A", Some("G")).unwrap();
    department.assign_group("B", Some("G")).unwrap();
    project
}

fn project_with_rows(departments: &[usize]) -> Project {
    let mut project = Project::new("Clínica");
    for (d, &rows) in departments.iter().enumerate() {
        let department = project.add_department(&format!("Setor {d}")).unwrap();
        for r in 0..rows {
            let procedure = department.add_procedure(&format!("POP {d}.{r}")).unwrap();
            add_resource(&mut procedure.resources, Category::Documents, "Formulário", "1", None).unwrap();
        }
    }
    project
}

fn rows_per_page(html: &str) -> Vec<usize> {
    html.split("<div class=\"page-container")
        .skip(1)
        .map(|page| {
            let body = page.split("<tbody>").nth(1).unwrap_or("");
            let body = body.split("</tbody>").next().unwrap_or("");
            body.matches("<tr ").count()
        })
        .collect()
}

#[test]
fn shared_group_is_one_row_and_counted_once() {
    let project = shared_group_project();

    assert_eq!(project_total(&project), 100.0);
    assert_eq!(department_total(&project.departments[0]), 200.0);

    let html = render_report(&project, &ReportOptions::default());
    assert_eq!(rows_per_page(&html), vec![1]);
    assert!(html.contains("<div class=\"font-bold\">A, B</div>"));
    assert!(html.contains("Modelo: G"));
    assert!(html.contains("TOTAL DO DEPARTAMENTO: R$\u{a0}100,00"));
}

#[test]
fn pages_split_evenly_with_breaks_between_them() {
    let project = project_with_rows(&[13, 2]);
    let html = render_report(&project, &ReportOptions::default());

    assert_eq!(rows_per_page(&html), vec![5, 5, 3, 2]);
    assert_eq!(html.matches("<div class=\"page-container\" ").count(), 1);
    assert_eq!(html.matches("<div class=\"page-container page-break\"").count(), 3);
    assert!(html.contains("Setor 0 (3/3)"));
    assert!(!html.contains("Setor 1 (1/1)"));
}

#[test]
fn user_text_is_escaped() {
    let mut project = Project::new("Teste & Cia");
    let department = project.add_department("D").unwrap();
    let procedure = department.add_procedure("P").unwrap();
    add_resource(
        &mut procedure.resources,
        Category::Systems,
        "<script>alert(1)</script>",
        "10",
        Some("\"aspas\" e 'apóstrofos'"),
    )
    .unwrap();

    let html = render_report(&project, &ReportOptions::default());
    assert!(!html.contains("<script>alert"));
    assert!(html.contains("&lt;script&gt;alert(1)&lt;&#x2F;script&gt;"));
    assert!(html.contains("&quot;aspas&quot; e &#039;apóstrofos&#039;"));
    assert!(html.contains("<title>Relatório - Teste &amp; Cia</title>"));
}

#[test]
fn empty_department_gets_one_page_with_empty_table() {
    let project = project_with_rows(&[0]);
    let html = render_report(&project, &ReportOptions::default());

    assert_eq!(rows_per_page(&html), vec![0]);
    assert!(html.contains("<tbody>\n</tbody>"));
    assert!(!html.contains("TOTAL DO DEPARTAMENTO"));
    assert!(html.contains(">POP</th></tr>"));
}

#[test]
fn departments_cycle_through_the_palette() {
    let project = project_with_rows(&[1, 1, 1, 1, 1, 1]);
    let html = render_report(&project, &ReportOptions::default());

    assert_eq!(html.matches("color: #581c87;").count(), 2);
    assert_eq!(html.matches("color: #92400e;").count(), 1);
}
