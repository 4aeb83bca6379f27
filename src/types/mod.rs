pub mod value_kind;
pub use value_kind::*;

pub mod conversion_error;
pub use conversion_error::*;

pub mod converter;
pub use converter::*;

pub mod type_configuration;
pub use type_configuration::*;
