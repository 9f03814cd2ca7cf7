pub mod error;
pub mod extract;
pub mod types;

pub use error::ExtractError;
pub use extract::{extract, region_type_code, ExtractedTable};
pub use types::{DataSet, Dimension, DimensionValue, Dimensions, Payload, Series, Structure};
