use serde::{Deserialize, Serialize};

/// One entry of a reference lookup list. The collaborator that supplies the
/// catalog may attach more fields; only `id` and `name` matter here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
}

impl CatalogEntry {
    pub fn new(id: i64, name: &str) -> Self {
        CatalogEntry {
            id,
            name: name.to_string(),
        }
    }
}

/// The four read-only lookup lists used to resolve free-text names to ids
/// during row expansion. Loaded once before staging begins, never mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceCatalog {
    pub categories: Vec<CatalogEntry>,
    pub people: Vec<CatalogEntry>,
    pub payment_methods: Vec<CatalogEntry>,
    pub apps: Vec<CatalogEntry>,
}

impl ReferenceCatalog {
    pub fn category_id(&self, name: &str) -> Option<i64> {
        resolve(&self.categories, name)
    }

    pub fn person_id(&self, name: &str) -> Option<i64> {
        resolve(&self.people, name)
    }

    pub fn payment_method_id(&self, name: &str) -> Option<i64> {
        resolve(&self.payment_methods, name)
    }

    pub fn app_id(&self, name: &str) -> Option<i64> {
        resolve(&self.apps, name)
    }

    /// The system fallback: the first payment method in the catalog.
    /// `None` only when the catalog is degenerate (no payment methods at all).
    pub fn default_payment_method(&self) -> Option<i64> {
        self.payment_methods.first().map(|e| e.id)
    }

    pub fn app_name(&self, id: i64) -> Option<&str> {
        self.apps
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.name.as_str())
    }
}

/// Case-insensitive exact name match. The first entry with a matching name
/// wins; list order is the collaborator's.
fn resolve(entries: &[CatalogEntry], name: &str) -> Option<i64> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    entries
        .iter()
        .find(|e| e.name.to_lowercase() == needle)
        .map(|e| e.id)
}
