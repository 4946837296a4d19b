use crate::inventory::Inventory;
use async_trait::async_trait;
use cwguard_catalog::Catalog;
use cwguard_cloud::HandlerRegistry;
use cwguard_engine::{AlarmSink, Dispatcher, ResolvedAlarmParameters, ResourceReport};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Totals of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub resource_types: usize,
    pub resources: usize,
    pub submitted: usize,
    pub suppressed: usize,
    pub skipped: usize,
    pub failed_rules: usize,
    /// Resource types present in the inventory that were not processed
    /// (no handler or no catalog rules).
    pub unhandled_types: Vec<String>,
}

impl RunSummary {
    fn record(&mut self, report: &ResourceReport) {
        self.resources += 1;
        self.submitted += report.submitted();
        self.suppressed += report.suppressed();
        self.skipped += report.skipped();
        self.failed_rules += report.failures.len();
    }

    pub fn is_clean(&self) -> bool {
        self.failed_rules == 0
    }
}

/// Processes every selected resource type of an inventory, at most
/// `max_concurrent` types at a time. Resources of one type are processed
/// in order.
pub struct Runner {
    dispatcher: Arc<Dispatcher>,
    handlers: Arc<HandlerRegistry>,
    catalog: Arc<Catalog>,
    max_concurrent: usize,
}

impl Runner {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        handlers: Arc<HandlerRegistry>,
        catalog: Arc<Catalog>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            dispatcher,
            handlers,
            catalog,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub async fn run(&self, inventory: Inventory, selects: impl Fn(&str) -> bool) -> RunSummary {
        let mut summary = RunSummary::default();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = Vec::new();

        for (kind, resources) in inventory.into_groups() {
            if !selects(&kind) {
                tracing::debug!(kind = %kind, "Resource type not selected");
                continue;
            }
            let Some(handler) = self.handlers.get(&kind) else {
                tracing::warn!(kind = %kind, "No handler for resource type, skipping");
                summary.unhandled_types.push(kind);
                continue;
            };
            if self.catalog.rules_for(&kind).is_none() {
                tracing::warn!(kind = %kind, "No catalog rules for resource type, skipping");
                summary.unhandled_types.push(kind);
                continue;
            }

            summary.resource_types += 1;
            let sem = Arc::clone(&semaphore);
            let dispatcher = Arc::clone(&self.dispatcher);
            let catalog = Arc::clone(&self.catalog);

            tasks.push(tokio::spawn(async move {
                let Ok(_permit) = sem.acquire_owned().await else {
                    return Vec::new();
                };
                let Some(rules) = catalog.rules_for(&kind) else {
                    return Vec::new();
                };
                tracing::info!(
                    kind = %kind,
                    resources = resources.len(),
                    rules = rules.len(),
                    "Processing resource type"
                );

                let mut reports = Vec::with_capacity(resources.len());
                for resource in &resources {
                    reports.push(
                        dispatcher
                            .process_resource(handler.as_ref(), rules, resource)
                            .await,
                    );
                }
                reports
            }));
        }

        for task in tasks {
            match task.await {
                Ok(reports) => reports.iter().for_each(|r| summary.record(r)),
                Err(e) => tracing::error!(error = %e, "Resource type task panicked"),
            }
        }

        tracing::info!(
            resource_types = summary.resource_types,
            resources = summary.resources,
            submitted = summary.submitted,
            suppressed = summary.suppressed,
            skipped = summary.skipped,
            failed_rules = summary.failed_rules,
            "Run finished"
        );
        summary
    }
}

/// Sink used for dry runs: logs each resolved alarm instead of creating it.
#[derive(Debug, Default)]
pub struct DryRunSink;

#[async_trait]
impl AlarmSink for DryRunSink {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn submit(&self, alarm: &ResolvedAlarmParameters) -> cwguard_engine::Result<()> {
        let parameters = serde_json::to_string(alarm)?;
        tracing::info!(
            alarm_name = %alarm.alarm_name,
            parameters = %parameters,
            "Dry run, alarm not created"
        );
        Ok(())
    }
}
