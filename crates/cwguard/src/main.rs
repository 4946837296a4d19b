use anyhow::{Context, Result};
use cwguard::app::{build_gateway, build_resolver, validate_catalog};
use cwguard::config::RunConfig;
use cwguard::inventory::Inventory;
use cwguard::logging;
use cwguard::runner::{DryRunSink, Runner};
use cwguard_catalog::Catalog;
use cwguard_cloud::{CloudWatchAlarmSink, CloudWatchMetricSource, HandlerRegistry};
use cwguard_engine::{AlarmSink, Dispatcher};
use std::sync::Arc;

const DEFAULT_CONFIG: &str = "config/cwguard.toml";

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cwguard [config.toml]                                        Provision alarms for the inventory");
    eprintln!("  cwguard resolve <config.toml> <type> <rule> <id>...          Print the resolved specification of one alarm");
    eprintln!("  cwguard validate-catalog <config.toml>                       Check catalog hook names against the handlers");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("resolve") => {
            if args.len() < 6 {
                print_usage();
                anyhow::bail!("resolve requires <config.toml> <type> <rule> and at least one <id>");
            }
            run_resolve(&args[2], &args[3], &args[4], &args[5..]).await
        }
        Some("validate-catalog") => {
            let config_path = args.get(2).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("validate-catalog requires <config.toml> argument")
            })?;
            run_validate_catalog(config_path).await
        }
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        _ => {
            let config_path = args.get(1).map(|s| s.as_str()).unwrap_or(DEFAULT_CONFIG);
            run(config_path).await
        }
    }
}

async fn setup(config_path: &str) -> Result<(RunConfig, aws_config::SdkConfig)> {
    let config = RunConfig::load(config_path)?;
    logging::init(config.log_format)?;
    let sdk = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()))
        .load()
        .await;
    Ok((config, sdk))
}

async fn load_catalog(config: &RunConfig, sdk: &aws_config::SdkConfig) -> Result<Catalog> {
    let source = config.catalog_source();
    source
        .load(Some(sdk))
        .await
        .with_context(|| format!("Failed to load catalog from {}", source.describe()))
}

async fn run(config_path: &str) -> Result<()> {
    let (config, sdk) = setup(config_path).await?;
    tracing::info!(
        region = %config.region,
        account_id = %config.account_id,
        dry_run = config.dry_run,
        "Starting alarm provisioning"
    );

    let catalog = Arc::new(load_catalog(&config, &sdk).await?);
    let handlers = Arc::new(HandlerRegistry::default());
    for problem in validate_catalog(&catalog, &handlers) {
        tracing::warn!(problem = %problem, "Catalog problem, affected rules will fail");
    }

    let resolver = build_resolver(&config, build_gateway(&config, Some(&sdk))?);
    let sink: Arc<dyn AlarmSink> = if config.dry_run {
        Arc::new(DryRunSink)
    } else {
        Arc::new(CloudWatchAlarmSink::from_sdk_config(&sdk))
    };
    let dispatcher = Arc::new(Dispatcher::new(
        resolver,
        Arc::new(config.run_context()),
        sink,
        Arc::new(CloudWatchMetricSource::from_sdk_config(&sdk)),
    ));

    let mut inventory = Inventory::load(&config.inventory.path)?;
    if let Some(key) = &config.filter_tag_key {
        inventory.retain_tagged(key, config.filter_tag_value.as_deref());
        tracing::info!(tag = %key, resources = inventory.len(), "Inventory filtered by tag");
    }

    let runner = Runner::new(dispatcher, handlers, catalog, config.max_concurrent);
    let summary = runner.run(inventory, |kind| config.selects(kind)).await;
    if !summary.is_clean() {
        tracing::warn!(
            failed_rules = summary.failed_rules,
            "Some rules failed, see errors above"
        );
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
async fn run_resolve(
    config_path: &str,
    resource_type: &str,
    rule_id: &str,
    components: &[String],
) -> Result<()> {
    let (config, sdk) = setup(config_path).await?;
    let catalog = load_catalog(&config, &sdk).await?;
    let rules = catalog
        .rules_for(resource_type)
        .ok_or_else(|| anyhow::anyhow!("Catalog has no rules for resource type '{resource_type}'"))?;

    let resolver = build_resolver(&config, build_gateway(&config, Some(&sdk))?);
    let spec = resolver.resolve(rule_id, rules, components, None).await?;
    println!("{}", serde_json::to_string_pretty(&spec)?);
    Ok(())
}

#[allow(clippy::print_stdout)]
async fn run_validate_catalog(config_path: &str) -> Result<()> {
    let (config, sdk) = setup(config_path).await?;
    let catalog = load_catalog(&config, &sdk).await?;
    let problems = validate_catalog(&catalog, &HandlerRegistry::default());
    for problem in &problems {
        println!("{problem}");
    }
    if !problems.is_empty() {
        anyhow::bail!("{} catalog problem(s) found", problems.len());
    }
    println!(
        "Catalog OK: {} resource types, {} rules",
        catalog.resource_types().count(),
        catalog.rule_count()
    );
    Ok(())
}
