//! AWS side of alarm provisioning.
//!
//! * [`cloudwatch::CloudWatchAlarmSink`] submits resolved alarms with
//!   `PutMetricAlarm`; [`cloudwatch::CloudWatchMetricSource`] lists agent
//!   metrics and their most recent datapoints.
//! * [`handlers`] holds one [`cwguard_engine::ResourceHandler`] per supported
//!   resource type together with the dynamic hooks its catalog rules use.
//! * [`sanitize`] collapses duplicate agent metrics to the most recently
//!   reporting one.

pub mod cloudwatch;
pub mod error;
pub mod handlers;
pub mod sanitize;

#[cfg(test)]
mod tests;

pub use cloudwatch::{CloudWatchAlarmSink, CloudWatchMetricSource};
pub use error::CloudError;
pub use handlers::HandlerRegistry;
