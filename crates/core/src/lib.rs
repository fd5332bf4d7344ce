pub mod catalog;
pub mod expense;

pub use catalog::{CatalogEntry, ReferenceCatalog};
pub use expense::{CommittedExpense, NewExpense, StagedExpense, StagedUpdate, TempId};
