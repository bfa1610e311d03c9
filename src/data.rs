//! The feature-group layer the agents fetch data through: a registry of
//! groups that each produce named columns, plus the frame they produce.
pub mod employees;
pub mod frame;
pub mod registry;

pub use frame::DataFrame;
pub use registry::{FeatureGroup, FeatureGroupDoc, FeatureRegistry};
