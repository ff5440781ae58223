//! Cost aggregation over project snapshots.
//!
//! Everything here is a pure read. Two totals exist on purpose:
//! [`department_total`] adds every procedure's effective cost (a group used
//! by three procedures counts three times), while [`project_total`] counts
//! each resource id once across the whole project.

use crate::model::{Category, Department, Procedure, Project, Resource, ResourceGroup, Resources};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::warn;

static NO_RESOURCES: Resources = Resources::new();

/// Where a procedure's effective resources come from.
#[derive(Debug, Clone, Copy)]
pub enum ResourceSource<'a> {
    /// No group assigned; the procedure's own items apply.
    Own(&'a Resources),
    /// The assigned group resolved.
    Group(&'a ResourceGroup),
    /// `group_id` names a group the department does not have.
    Dangling { group_id: &'a str },
}

impl<'a> ResourceSource<'a> {
    #[must_use]
    pub fn resources(self) -> &'a Resources {
        match self {
            Self::Own(resources) => resources,
            Self::Group(group) => &group.resources,
            Self::Dangling { .. } => &NO_RESOURCES,
        }
    }

    #[must_use]
    pub fn group(self) -> Option<&'a ResourceGroup> {
        match self {
            Self::Group(group) => Some(group),
            _ => None,
        }
    }
}

/// Resolves `procedure.group_id` against `department`.
#[must_use]
pub fn resource_source<'a>(procedure: &'a Procedure, department: &'a Department) -> ResourceSource<'a> {
    match procedure.group_id.as_deref() {
        None => ResourceSource::Own(&procedure.resources),
        Some(group_id) => match department.group(group_id) {
            Some(group) => ResourceSource::Group(group),
            None => ResourceSource::Dangling { group_id },
        },
    }
}

/// The resources that count for `procedure`. A dangling group reference
/// yields an empty set.
#[must_use]
pub fn effective_resources<'a>(procedure: &'a Procedure, department: &'a Department) -> &'a Resources {
    resource_source(procedure, department).resources()
}

/// Resolves and logs a data-integrity warning when the reference dangles.
fn resolve_logged<'a>(procedure: &'a Procedure, department: &'a Department) -> ResourceSource<'a> {
    let source = resource_source(procedure, department);
    if let ResourceSource::Dangling { group_id } = source {
        warn!(
            department = %department.id,
            procedure = %procedure.id,
            group = %group_id,
            "procedure references a missing resource group; counting no resources"
        );
    }
    source
}

#[must_use]
pub fn category_subtotal(items: &[Resource]) -> f64 {
    items.iter().map(|r| r.cost).sum()
}

#[must_use]
pub fn resources_total(resources: &Resources) -> f64 {
    resources.all().map(|r| r.cost).sum()
}

/// Sum of every procedure's effective cost, without deduplication.
#[must_use]
pub fn department_total(department: &Department) -> f64 {
    department
        .procedures
        .iter()
        .map(|p| resources_total(resolve_logged(p, department).resources()))
        .sum()
}

/// Walks every effective resource of the project once per resource id.
fn unique_resources(project: &Project) -> Vec<(Category, &Resource)> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut unique = Vec::new();
    for department in &project.departments {
        for procedure in &department.procedures {
            let resources = resolve_logged(procedure, department).resources();
            for (category, items) in resources.iter() {
                for resource in items {
                    if seen.insert(resource.id.as_str()) {
                        unique.push((category, resource));
                    }
                }
            }
        }
    }
    unique
}

/// Project-wide cost counting each resource id once, so a group shared by
/// several procedures contributes its cost a single time.
#[must_use]
pub fn project_total(project: &Project) -> f64 {
    unique_resources(project).iter().map(|(_, r)| r.cost).sum()
}

/// Deduplicated project cost broken down by category, in display order.
#[must_use]
pub fn project_category_totals(project: &Project) -> BTreeMap<Category, f64> {
    let mut totals = BTreeMap::new();
    for (category, resource) in unique_resources(project) {
        *totals.entry(category).or_insert(0.0) += resource.cost;
    }
    totals
}

/// Sum of the deduplicated totals of every project.
#[must_use]
pub fn portfolio_total(projects: &[Project]) -> f64 {
    projects.iter().map(project_total).sum()
}

/// Portfolio total divided by the number of projects; zero when there are none.
#[must_use]
pub fn average_project_total(projects: &[Project]) -> f64 {
    if projects.is_empty() {
        return 0.0;
    }
    portfolio_total(projects) / projects.len() as f64
}

/// One display row: every procedure sharing the same resource set.
#[derive(Debug, Clone)]
pub struct ProcedureRow<'a> {
    pub procedure_names: Vec<&'a str>,
    pub group: Option<&'a ResourceGroup>,
    pub resources: &'a Resources,
}

impl ProcedureRow<'_> {
    #[must_use]
    pub fn total(&self) -> f64 {
        resources_total(self.resources)
    }
}

/// Buckets procedures by `group_id` (or a per-procedure key when unset), in
/// first-seen order.
#[must_use]
pub fn group_procedures(department: &Department) -> Vec<ProcedureRow<'_>> {
    let mut rows: Vec<ProcedureRow<'_>> = Vec::new();
    let mut index_by_key: HashMap<&str, usize> = HashMap::new();

    for procedure in &department.procedures {
        let key = procedure.group_id.as_deref().unwrap_or(procedure.id.as_str());
        let index = *index_by_key.entry(key).or_insert_with(|| {
            let source = resolve_logged(procedure, department);
            rows.push(ProcedureRow {
                procedure_names: Vec::new(),
                group: source.group(),
                resources: source.resources(),
            });
            rows.len() - 1
        });
        rows[index].procedure_names.push(procedure.name.as_str());
    }
    rows
}

/// Categories holding at least one item in any row, in display order.
#[must_use]
pub fn used_categories(rows: &[ProcedureRow<'_>]) -> Vec<Category> {
    Category::ALL
        .into_iter()
        .filter(|category| rows.iter().any(|row| !row.resources.get(*category).is_empty()))
        .collect()
}

/// Department spend as shown in reports: one contribution per row.
#[must_use]
pub fn rows_total(rows: &[ProcedureRow<'_>]) -> f64 {
    rows.iter().map(ProcedureRow::total).sum()
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentSummary {
    pub id: String,
    pub name: String,
    pub procedures: usize,
    pub groups: usize,
    pub rows: usize,
    /// Sum over procedures, shared groups counted per procedure.
    pub procedure_total: f64,
    /// Sum over grouped rows, as printed in the report footer.
    pub report_total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub departments: Vec<DepartmentSummary>,
    pub category_totals: BTreeMap<Category, f64>,
    pub total: f64,
}

impl ProjectSummary {
    #[must_use]
    pub fn build(project: &Project) -> Self {
        let departments = project
            .departments
            .iter()
            .map(|department| {
                let rows = group_procedures(department);
                DepartmentSummary {
                    id: department.id.clone(),
                    name: department.name.clone(),
                    procedures: department.procedures.len(),
                    groups: department.resource_groups.len(),
                    rows: rows.len(),
                    procedure_total: department_total(department),
                    report_total: rows_total(&rows),
                }
            })
            .collect();

        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            departments,
            category_totals: project_category_totals(project),
            total: project_total(project),
        }
    }
}
