use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The fixed set of resource kinds. Declaration order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[serde(alias = "pessoas")]
    People,
    #[serde(alias = "documentos")]
    Documents,
    #[serde(alias = "equipamentos")]
    Equipment,
    #[serde(alias = "sistemas")]
    Systems,
    #[serde(alias = "consumiveis")]
    Consumables,
    #[serde(alias = "locais")]
    Locations,
    /// Holds at most one synthetic, zero-cost item describing the schedule.
    #[serde(alias = "recorrencia")]
    Recurrence,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::People,
        Category::Documents,
        Category::Equipment,
        Category::Systems,
        Category::Consumables,
        Category::Locations,
        Category::Recurrence,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::People => "people",
            Self::Documents => "documents",
            Self::Equipment => "equipment",
            Self::Systems => "systems",
            Self::Consumables => "consumables",
            Self::Locations => "locations",
            Self::Recurrence => "recurrence",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::People => "Pessoas",
            Self::Documents => "Documentos",
            Self::Equipment => "Equipamentos",
            Self::Systems => "Sistemas",
            Self::Consumables => "Consumíveis",
            Self::Locations => "Locais",
            Self::Recurrence => "Recorrência",
        }
    }

    /// Column heading used in printed reports.
    #[must_use]
    pub const fn print_label(self) -> &'static str {
        match self {
            Self::People => "PESSOAS",
            Self::Documents => "DOCUMENTOS",
            Self::Equipment => "EQUIPAMENTOS",
            Self::Systems => "SISTEMAS",
            Self::Consumables => "CONSUMÍVEIS",
            Self::Locations => "LOCAIS",
            Self::Recurrence => "RECORRÊNCIA",
        }
    }

    #[must_use]
    pub const fn is_recurrence(self) -> bool {
        matches!(self, Self::Recurrence)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "people" | "pessoas" => Ok(Self::People),
            "documents" | "documentos" => Ok(Self::Documents),
            "equipment" | "equipamentos" => Ok(Self::Equipment),
            "systems" | "sistemas" => Ok(Self::Systems),
            "consumables" | "consumiveis" | "consumíveis" => Ok(Self::Consumables),
            "locations" | "locais" => Ok(Self::Locations),
            "recurrence" | "recorrencia" | "recorrência" => Ok(Self::Recurrence),
            other => Err(format!(
                "unknown category '{other}' (expected one of: {})",
                Category::ALL.map(Category::key).join(", ")
            )),
        }
    }
}

/// A single costed line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(default, alias = "custo")]
    pub cost: f64,
    #[serde(
        default,
        alias = "observacoes",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
}

impl Resource {
    /// Builds a resource with a fresh id. Callers validate `name` and `cost`.
    #[must_use]
    pub fn new(name: impl Into<String>, cost: f64) -> Self {
        Self {
            id: super::new_id(),
            name: name.into(),
            cost,
            notes: None,
        }
    }

    #[must_use]
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes.filter(|n| !n.trim().is_empty());
        self
    }
}

/// Category → ordered items. A category that is absent reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resources {
    items: BTreeMap<Category, Vec<Resource>>,
}

impl Resources {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, category: Category) -> &[Resource] {
        self.items.get(&category).map_or(&[], Vec::as_slice)
    }

    /// Replaces the items of `category`; an empty list removes the slot.
    pub fn set(&mut self, category: Category, items: Vec<Resource>) {
        if items.is_empty() {
            self.items.remove(&category);
        } else {
            self.items.insert(category, items);
        }
    }

    pub fn push(&mut self, category: Category, resource: Resource) {
        self.items.entry(category).or_default().push(resource);
    }

    /// Removes the item with `id` from whichever category holds it.
    pub fn remove(&mut self, id: &str) -> Option<(Category, Resource)> {
        let (category, index) = self.items.iter().find_map(|(category, items)| {
            items
                .iter()
                .position(|r| r.id == id)
                .map(|index| (*category, index))
        })?;
        let items = self.items.get_mut(&category)?;
        let removed = items.remove(index);
        if items.is_empty() {
            self.items.remove(&category);
        }
        Some((category, removed))
    }

    /// The item with `id` and the category holding it.
    pub fn find_mut(&mut self, id: &str) -> Option<(Category, &mut Resource)> {
        self.items
            .iter_mut()
            .flat_map(|(category, items)| items.iter_mut().map(move |r| (*category, r)))
            .find(|(_, r)| r.id == id)
    }

    /// Non-empty categories in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[Resource])> {
        self.items
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(category, items)| (*category, items.as_slice()))
    }

    /// Every item across all categories.
    pub fn all(&self) -> impl Iterator<Item = &Resource> {
        self.items.values().flatten()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.values().all(Vec::is_empty)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }
}
