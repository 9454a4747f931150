pub mod common;
pub mod dataset;
pub mod error;
pub mod guide;
pub mod model;
pub mod point_estimate;
pub mod posterior;
pub mod summary;
pub mod svi;

pub use error::{LentilError, Result};
