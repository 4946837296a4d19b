//! Default alarm catalog.
//!
//! The catalog maps a resource-type name (`"ec2"`, `"rds"`, ...) to a
//! [`RuleSet`]: the monitoring rules that apply to that type, each described
//! by an [`AlarmSpecification`]. It is loaded once per run from a local JSON
//! document or an S3 object ([`CatalogSource`]) and never mutated afterwards;
//! resolution always works on owned copies of a specification.

pub mod catalog;
pub mod error;
pub mod source;
pub mod spec;

pub use catalog::{Catalog, HookKind, HookReference, RuleSet};
pub use error::CatalogError;
pub use source::{CatalogSource, DEFAULT_CATALOG_FILE};
pub use spec::{AlarmSpecification, ClassificationTemplate, ClassificationValue, MetricSpecifications};
