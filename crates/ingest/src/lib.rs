pub mod dates;
pub mod expand;
pub mod mapping;
pub mod table;

pub use dates::normalize;
pub use expand::{expand, ExpandOptions, DEFAULT_CURRENCY};
pub use mapping::{FieldMapping, Role};
pub use table::{ParseError, SourceTable};
