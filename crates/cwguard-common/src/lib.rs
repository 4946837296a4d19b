pub mod resource;
pub mod types;

pub use resource::{AttributeError, Resource, Tag};
pub use types::{AlarmIdentity, ComparisonOperator, Dimension, TreatMissingData};
