pub mod id_generation;
pub use id_generation::*;

pub mod attribute_mapping;
pub use attribute_mapping::*;

pub mod entity_mapping;
pub use entity_mapping::*;

pub mod domain_model;
pub use domain_model::*;
