//! Alarm parameter resolution engine.
//!
//! For one resource and one monitoring rule the engine computes the concrete
//! alarm to provision:
//!
//! 1. [`Resolver`] copies the catalog template, names the alarm, looks up the
//!    most specific operator override and merges it in.
//! 2. [`Dispatcher`] applies the rule's dynamic hooks (creation predicate,
//!    threshold formula, or a core hook that expands the rule into several
//!    alarms), builds [`ResolvedAlarmParameters`] and hands them to an
//!    [`AlarmSink`].
//!
//! Resource-type knowledge lives outside the engine, behind
//! [`ResourceHandler`] and the hook functions it registers in a
//! [`HookRegistry`].

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod hooks;
pub mod params;
pub mod resolver;
pub mod sink;


pub use context::{AccountAlias, RunContext};
pub use dispatcher::{Dispatcher, ResourceReport, RuleFailure, RuleOutcome};
pub use error::{EngineError, Result};
pub use handler::ResourceHandler;
pub use hooks::{AlarmTarget, CoreContext, CoreHook, CreationHook, HookRegistry, ThresholdHook};
pub use params::{Classification, ResolvedAlarmParameters};
pub use resolver::{apply_override, NestedMatchPolicy, OverridePolicy, Resolver};
pub use sink::{AlarmSink, MetricDescriptor, MetricSource, RecordingSink, StaticMetricSource};
