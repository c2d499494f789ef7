//! Utility modules for record loading, export and validation

pub mod csv_source;
pub mod export;
pub mod memory_source;
pub mod validation;

pub use csv_source::*;
pub use export::*;
pub use memory_source::*;
pub use validation::*;
