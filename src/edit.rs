//! Validated editing operations on the project tree.
//!
//! Operations run against a working copy (see
//! [`Workspace::edit_project`](crate::workspace::Workspace::edit_project)); an
//! `Err` discards the copy, so a rejected edit never leaves partial changes.

use crate::error::EditError;
use crate::model::project::position_by_key;
use crate::model::{Category, Department, Procedure, Project, Resource, ResourceGroup, Resources};
use crate::recurrence::{apply_recurrence, clear_recurrence, Recurrence};
use tracing::{debug, info};

/// Trims `raw` and rejects it when nothing is left.
pub fn validate_name(entity: &'static str, raw: &str) -> Result<String, EditError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(EditError::EmptyName { entity });
    }
    Ok(name.to_string())
}

/// Reads a cost typed by a user. Accepts `,` as the decimal separator.
pub fn parse_cost(input: &str) -> Result<f64, EditError> {
    let normalized = input.trim().replace(',', ".");
    let value: f64 = normalized.parse().map_err(|_| EditError::InvalidCost {
        input: input.to_string(),
    })?;
    if !value.is_finite() {
        return Err(EditError::InvalidCost {
            input: input.to_string(),
        });
    }
    if value < 0.0 {
        return Err(EditError::NegativeCost { value });
    }
    Ok(value)
}

fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

fn not_found(entity: &'static str, key: &str) -> EditError {
    EditError::NotFound {
        entity,
        key: key.to_string(),
    }
}

/// Which resource list an edit applies to.
#[derive(Debug, Clone, Copy)]
pub enum ResourceOwner<'a> {
    Procedure(&'a str),
    Group(&'a str),
}

/// Fields of a resource to change; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct ResourceChange<'a> {
    pub name: Option<&'a str>,
    pub cost: Option<&'a str>,
    /// `Some("")` clears the notes.
    pub notes: Option<&'a str>,
}

impl Project {
    pub fn rename(&mut self, name: &str) -> Result<(), EditError> {
        self.name = validate_name("project", name)?;
        Ok(())
    }

    pub fn add_department(&mut self, name: &str) -> Result<&mut Department, EditError> {
        let department = Department::new(validate_name("department", name)?);
        debug!(project = %self.id, department = %department.id, "department added");
        let index = self.departments.len();
        self.departments.push(department);
        Ok(&mut self.departments[index])
    }

    pub fn department_mut(&mut self, key: &str) -> Result<&mut Department, EditError> {
        let index = position_by_key(&self.departments, key, |d| (&d.id, &d.name))
            .ok_or_else(|| not_found("department", key))?;
        Ok(&mut self.departments[index])
    }

    pub fn remove_department(&mut self, key: &str) -> Result<Department, EditError> {
        let index = position_by_key(&self.departments, key, |d| (&d.id, &d.name))
            .ok_or_else(|| not_found("department", key))?;
        let removed = self.departments.remove(index);
        info!(project = %self.id, department = %removed.id, "department deleted");
        Ok(removed)
    }
}

impl Department {
    pub fn rename(&mut self, name: &str) -> Result<(), EditError> {
        self.name = validate_name("department", name)?;
        Ok(())
    }

    /// Sets the free-text notes; blank text clears them.
    pub fn set_notes(&mut self, notes: Option<&str>) {
        self.notes = normalize_notes(notes);
    }

    pub fn add_procedure(&mut self, name: &str) -> Result<&mut Procedure, EditError> {
        let procedure = Procedure::new(validate_name("procedure", name)?);
        debug!(department = %self.id, procedure = %procedure.id, "procedure added");
        let index = self.procedures.len();
        self.procedures.push(procedure);
        Ok(&mut self.procedures[index])
    }

    pub fn procedure_mut(&mut self, key: &str) -> Result<&mut Procedure, EditError> {
        let index = position_by_key(&self.procedures, key, |p| (&p.id, &p.name))
            .ok_or_else(|| not_found("procedure", key))?;
        Ok(&mut self.procedures[index])
    }

    pub fn remove_procedure(&mut self, key: &str) -> Result<Procedure, EditError> {
        let index = position_by_key(&self.procedures, key, |p| (&p.id, &p.name))
            .ok_or_else(|| not_found("procedure", key))?;
        let removed = self.procedures.remove(index);
        info!(department = %self.id, procedure = %removed.id, "procedure deleted");
        Ok(removed)
    }

    pub fn add_group(&mut self, name: &str) -> Result<&mut ResourceGroup, EditError> {
        let group = ResourceGroup::new(validate_name("resource group", name)?);
        debug!(department = %self.id, group = %group.id, "resource group added");
        let index = self.resource_groups.len();
        self.resource_groups.push(group);
        Ok(&mut self.resource_groups[index])
    }

    pub fn group_mut(&mut self, key: &str) -> Result<&mut ResourceGroup, EditError> {
        let index = position_by_key(&self.resource_groups, key, |g| (&g.id, &g.name))
            .ok_or_else(|| not_found("resource group", key))?;
        Ok(&mut self.resource_groups[index])
    }

    /// Deletes a group and clears `group_id` on every procedure that used it.
    /// Returns the group and the number of procedures detached.
    pub fn remove_group(&mut self, key: &str) -> Result<(ResourceGroup, usize), EditError> {
        let index = position_by_key(&self.resource_groups, key, |g| (&g.id, &g.name))
            .ok_or_else(|| not_found("resource group", key))?;
        let removed = self.resource_groups.remove(index);

        let mut detached = 0;
        for procedure in &mut self.procedures {
            if procedure.group_id.as_deref() == Some(removed.id.as_str()) {
                procedure.group_id = None;
                detached += 1;
            }
        }
        info!(
            department = %self.id,
            group = %removed.id,
            detached,
            "resource group deleted"
        );
        Ok((removed, detached))
    }

    /// Binds a procedure to a group, or back to its own resources with `None`.
    pub fn assign_group(&mut self, procedure_key: &str, group_key: Option<&str>) -> Result<(), EditError> {
        let group_id = match group_key {
            Some(key) => Some(
                self.find_group(key)
                    .ok_or_else(|| not_found("resource group", key))?
                    .id
                    .clone(),
            ),
            None => None,
        };
        self.procedure_mut(procedure_key)?.group_id = group_id;
        Ok(())
    }

    pub fn resources_mut(&mut self, owner: ResourceOwner<'_>) -> Result<&mut Resources, EditError> {
        match owner {
            ResourceOwner::Procedure(key) => Ok(&mut self.procedure_mut(key)?.resources),
            ResourceOwner::Group(key) => Ok(&mut self.group_mut(key)?.resources),
        }
    }
}

impl Procedure {
    pub fn rename(&mut self, name: &str) -> Result<(), EditError> {
        self.name = validate_name("procedure", name)?;
        Ok(())
    }
}

impl ResourceGroup {
    pub fn rename(&mut self, name: &str) -> Result<(), EditError> {
        self.name = validate_name("resource group", name)?;
        Ok(())
    }
}

/// Adds a costed item and returns its id. The recurrence slot is managed by
/// [`set_recurrence`] only.
pub fn add_resource(
    resources: &mut Resources,
    category: Category,
    name: &str,
    cost: &str,
    notes: Option<&str>,
) -> Result<String, EditError> {
    if category.is_recurrence() {
        return Err(EditError::InvalidRecurrence {
            message: "recurrence items are created from a recurrence descriptor".to_string(),
        });
    }
    let resource = Resource::new(validate_name("resource", name)?, parse_cost(cost)?)
        .with_notes(normalize_notes(notes));
    let id = resource.id.clone();
    resources.push(category, resource);
    Ok(id)
}

/// Updates an existing item in place, validating every supplied field first.
pub fn edit_resource(resources: &mut Resources, id: &str, change: &ResourceChange<'_>) -> Result<(), EditError> {
    let name = change
        .name
        .map(|n| validate_name("resource", n))
        .transpose()?;
    let cost = change.cost.map(parse_cost).transpose()?;

    let (category, resource) = resources
        .find_mut(id)
        .ok_or_else(|| not_found("resource", id))?;
    if category.is_recurrence() && (name.is_some() || cost.is_some()) {
        return Err(EditError::InvalidRecurrence {
            message: "the recurrence item has no cost or name of its own; set the recurrence instead".to_string(),
        });
    }
    if let Some(name) = name {
        resource.name = name;
    }
    if let Some(cost) = cost {
        resource.cost = cost;
    }
    if let Some(notes) = change.notes {
        resource.notes = normalize_notes(Some(notes));
    }
    Ok(())
}

pub fn delete_resource(resources: &mut Resources, id: &str) -> Result<Resource, EditError> {
    resources
        .remove(id)
        .map(|(_, resource)| resource)
        .ok_or_else(|| not_found("resource", id))
}

/// Stores `recurrence` as the single item of the recurrence slot; `None`
/// empties the slot.
pub fn set_recurrence(resources: &mut Resources, recurrence: Option<&Recurrence>) -> Result<(), EditError> {
    match recurrence {
        Some(recurrence) => apply_recurrence(resources, recurrence),
        None => {
            clear_recurrence(resources);
            Ok(())
        }
    }
}
