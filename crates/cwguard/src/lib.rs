//! Command-line front end: configuration, resource inventory and the
//! per-resource-type run loop around the alarm resolution engine.

pub mod app;
pub mod config;
pub mod inventory;
pub mod logging;
pub mod runner;
