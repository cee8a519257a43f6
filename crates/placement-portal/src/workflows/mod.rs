pub mod catalog;
pub mod common;
pub mod placement;
pub mod student;

pub use catalog::{Company, CompanyCatalog};
pub use common::{Percentage, ValidationError};
