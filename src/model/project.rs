use super::{new_id, Resources};
use serde::{Deserialize, Serialize};

/// A named, reusable bundle of resources ("Modelo") owned by a department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    pub id: String,
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(default, alias = "recursos")]
    pub resources: Resources,
}

/// An operating procedure (POP).
///
/// When `group_id` names a group of the owning department, that group's
/// resources replace `resources` for every cost computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    pub id: String,
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(default, alias = "grupoRecursosId")]
    pub group_id: Option<String>,
    #[serde(default, alias = "recursos")]
    pub resources: Resources,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: String,
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(default, alias = "pops")]
    pub procedures: Vec<Procedure>,
    #[serde(default, alias = "gruposDeRecursos")]
    pub resource_groups: Vec<ResourceGroup>,
    #[serde(default, alias = "observacao", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(default, alias = "departamentos")]
    pub departments: Vec<Department>,
}

impl ResourceGroup {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            resources: Resources::new(),
        }
    }
}

impl Procedure {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            group_id: None,
            resources: Resources::new(),
        }
    }
}

impl Department {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            procedures: Vec::new(),
            resource_groups: Vec::new(),
            notes: None,
        }
    }

    /// Looks up a group by id only; this is how `group_id` references resolve.
    #[must_use]
    pub fn group(&self, id: &str) -> Option<&ResourceGroup> {
        self.resource_groups.iter().find(|g| g.id == id)
    }

    /// Finds a procedure by id, then by exact name.
    #[must_use]
    pub fn find_procedure(&self, key: &str) -> Option<&Procedure> {
        find_by_key(&self.procedures, key, |p| (&p.id, &p.name))
    }

    /// Finds a group by id, then by exact name.
    #[must_use]
    pub fn find_group(&self, key: &str) -> Option<&ResourceGroup> {
        find_by_key(&self.resource_groups, key, |g| (&g.id, &g.name))
    }

    /// Procedures whose `group_id` points at `group_id`.
    pub fn procedures_using<'a>(&'a self, group_id: &'a str) -> impl Iterator<Item = &'a Procedure> {
        self.procedures
            .iter()
            .filter(move |p| p.group_id.as_deref() == Some(group_id))
    }
}

impl Project {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            departments: Vec::new(),
        }
    }

    /// Finds a department by id, then by exact name.
    #[must_use]
    pub fn find_department(&self, key: &str) -> Option<&Department> {
        find_by_key(&self.departments, key, |d| (&d.id, &d.name))
    }

    #[must_use]
    pub fn total_procedures(&self) -> usize {
        self.departments.iter().map(|d| d.procedures.len()).sum()
    }

    #[must_use]
    pub fn total_groups(&self) -> usize {
        self.departments.iter().map(|d| d.resource_groups.len()).sum()
    }
}

/// Finds a project by id, then by exact name.
#[must_use]
pub fn find_project<'a>(projects: &'a [Project], key: &str) -> Option<&'a Project> {
    find_by_key(projects, key, |p| (&p.id, &p.name))
}

pub(crate) fn find_by_key<'a, T>(
    items: &'a [T],
    key: &str,
    fields: impl Fn(&T) -> (&String, &String),
) -> Option<&'a T> {
    items
        .iter()
        .find(|item| fields(item).0 == key)
        .or_else(|| items.iter().find(|item| fields(item).1 == key))
}

pub(crate) fn position_by_key<T>(
    items: &[T],
    key: &str,
    fields: impl Fn(&T) -> (&String, &String),
) -> Option<usize> {
    items
        .iter()
        .position(|item| fields(item).0 == key)
        .or_else(|| items.iter().position(|item| fields(item).1 == key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_prefer_id_over_name() {
        let mut department = Department::new("Triagem");
        let first = Procedure::new("Acolhimento");
        let mut second = Procedure::new("Outro");
        // A procedure literally named after another one's id.
        second.name.clone_from(&first.id);
        let first_id = first.id.clone();
        department.procedures = vec![second, first];

        let found = department.find_procedure(&first_id).expect("procedure found");
        assert_eq!(found.name, "Acolhimento");
    }

    #[test]
    fn legacy_project_json_loads() {
        let json = r#"{
            "id": "p1",
            "nome": "Plano Operacional",
            "departamentos": [{
                "id": "d1",
                "nome": "Recepção",
                "observacao": "Turno da manhã",
                "pops": [{"id": "pop1", "nome": "Cadastro", "grupoRecursosId": "g1", "recursos": {}}],
                "gruposDeRecursos": [{"id": "g1", "nome": "Equipe", "recursos": {"pessoas": [{"id": "r1", "nome": "Atendente", "custo": 1500}]}}]
            }]
        }"#;
        let project: Project = serde_json::from_str(json).expect("legacy project parses");
        let department = &project.departments[0];
        assert_eq!(department.notes.as_deref(), Some("Turno da manhã"));
        assert_eq!(department.procedures[0].group_id.as_deref(), Some("g1"));
        assert_eq!(department.group("g1").map(|g| g.name.as_str()), Some("Equipe"));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let mut department = Department::new("Recepção");
        department.procedures.push(Procedure::new("Cadastro"));
        let value = serde_json::to_value(&department).expect("serializes");
        assert!(value.get("resourceGroups").is_some());
        assert!(value["procedures"][0].get("groupId").is_some());
        assert!(value.get("notes").is_none());
    }
}
