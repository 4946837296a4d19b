use cwguard::inventory::Inventory;
use cwguard::runner::{RunSummary, Runner};
use cwguard_catalog::CatalogSource;
use cwguard_cloud::HandlerRegistry;
use cwguard_engine::{Dispatcher, RecordingSink, Resolver, RunContext, StaticMetricSource};
use cwguard_store::{MemoryOverrideStore, OverrideGateway};
use std::io::Write;
use std::sync::Arc;

const CATALOG: &str = r#"{
    "ec2": {
        "cpu_utilization": {
            "MetricName": "CPUUtilization",
            "Namespace": "AWS/EC2",
            "Statistic": "Average",
            "Period": 300,
            "EvaluationPeriods": 2,
            "ComparisonOperator": "GreaterThanThreshold",
            "MetricSpecifications": {"AlarmName": "CPU-", "Threshold": 90}
        },
        "cpu_credit": {
            "MetricName": "CPUCreditBalance",
            "Namespace": "AWS/EC2",
            "Statistic": "Minimum",
            "Period": 300,
            "EvaluationPeriods": 1,
            "ComparisonOperator": "LessThanThreshold",
            "MetricSpecifications": {
                "AlarmName": "CPUCredit-",
                "Threshold": 20,
                "RegexType": "t[234]\\..*",
                "DynamicCreation": "cpucreditbalance_creation_dynamic"
            }
        }
    },
    "lambda": {
        "errors": {
            "MetricName": "Errors",
            "Namespace": "AWS/Lambda",
            "Statistic": "Sum",
            "Period": 60,
            "EvaluationPeriods": 1,
            "ComparisonOperator": "GreaterThanOrEqualToThreshold",
            "TreatMissingData": "notBreaching",
            "MetricSpecifications": {"AlarmName": "Errors-", "Threshold": 1}
        }
    },
    "rds": {
        "free_storage": {
            "MetricName": "FreeStorageSpace",
            "Namespace": "AWS/RDS",
            "Statistic": "Minimum",
            "Period": 300,
            "EvaluationPeriods": 1,
            "ComparisonOperator": "LessThanThreshold",
            "MetricSpecifications": {
                "AlarmName": "FreeStorage-",
                "Threshold": 10,
                "Types": ["instance"],
                "Engines": ["mysql"],
                "DynamicThreshold": "freestoragespace_threshold_dynamic"
            }
        }
    }
}"#;

const INVENTORY: &str = r#"{
    "ec2": [
        {"InstanceId": "i-1", "InstanceType": "t3.micro", "Tags": [{"Key": "Name", "Value": "web-1"}]},
        {"InstanceId": "i-2", "InstanceType": "m5.large", "Tags": [{"Key": "Name", "Value": "db-proxy"}]}
    ],
    "lambda": [
        {"FunctionName": "resize", "FunctionArn": "arn:aws:lambda:eu-west-1:123456789012:function:resize"}
    ],
    "rds": [
        {"DBInstanceIdentifier": "orders", "Engine": "mysql", "AllocatedStorage": 100}
    ],
    "sqs": [
        {"QueueUrl": "https://sqs.eu-west-1.amazonaws.com/123456789012/jobs"}
    ]
}"#;

const OVERRIDES: &str = r#"{
    "prod-CPU-i-2-": {"Threshold": 75},
    "prod-Errors-": {"EvaluationPeriods": 3},
    "prod-FreeStorage-instance-orders": {"Create": false}
}"#;

fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

async fn run(selects: impl Fn(&str) -> bool) -> (RunSummary, Arc<RecordingSink>) {
    let catalog_file = write_temp(CATALOG);
    let overrides_file = write_temp(OVERRIDES);

    let catalog = CatalogSource::File(catalog_file.path().to_path_buf())
        .load(None)
        .await
        .unwrap();
    let store = MemoryOverrideStore::from_json_file(overrides_file.path()).unwrap();
    let resolver = Resolver::new(OverrideGateway::new(Arc::new(store)), Some("prod".into()));

    let mut context = RunContext::new("eu-west-1", "123456789012");
    context.alarm_prefix = Some("prod".into());
    context.alarm_actions = vec!["arn:aws:sns:eu-west-1:123456789012:ops".into()];

    let sink = Arc::new(RecordingSink::new());
    let dispatcher = Dispatcher::new(
        resolver,
        Arc::new(context),
        sink.clone(),
        Arc::new(StaticMetricSource::new()),
    );

    let runner = Runner::new(
        Arc::new(dispatcher),
        Arc::new(HandlerRegistry::default()),
        Arc::new(catalog),
        2,
    );
    let inventory = Inventory::from_json_str(INVENTORY).unwrap();
    let summary = runner.run(inventory, selects).await;
    (summary, sink)
}

#[tokio::test]
async fn full_run_applies_catalog_overrides_and_hooks() {
    let (summary, sink) = run(|_| true).await;

    assert_eq!(
        summary,
        RunSummary {
            resource_types: 3,
            resources: 4,
            submitted: 4,
            suppressed: 1,
            skipped: 1,
            failed_rules: 0,
            unhandled_types: vec!["sqs".into()],
        }
    );

    let mut names = sink.names();
    names.sort();
    assert_eq!(
        names,
        vec![
            "prod-CPU-i-1",
            "prod-CPU-i-2",
            "prod-CPUCredit-i-1",
            "prod-Errors-resize",
        ]
    );

    let submitted = sink.submitted();
    let find = |name: &str| {
        submitted
            .iter()
            .find(|alarm| alarm.alarm_name == name)
            .cloned()
            .unwrap()
    };
    assert_eq!(find("prod-CPU-i-1").threshold, 90.0);
    assert_eq!(find("prod-CPU-i-2").threshold, 75.0);

    let errors = find("prod-Errors-resize");
    assert_eq!(errors.evaluation_periods, 3);
    assert_eq!(errors.alarm_actions, vec!["arn:aws:sns:eu-west-1:123456789012:ops"]);
    let description: serde_json::Value = serde_json::from_str(&errors.alarm_description).unwrap();
    assert_eq!(description["ci"], "resize");
    assert_eq!(
        description["cloudid"],
        "arn:aws:lambda:eu-west-1:123456789012:function:resize"
    );
}

#[tokio::test]
async fn unselected_resource_types_are_left_alone() {
    let (summary, sink) = run(|kind| kind == "lambda").await;

    assert_eq!(summary.resource_types, 1);
    assert_eq!(summary.resources, 1);
    assert!(summary.unhandled_types.is_empty());
    assert_eq!(sink.names(), vec!["prod-Errors-resize"]);
}
