use crate::handlers::ebs::EbsHandler;
use crate::handlers::ec2::{cpucreditbalance_creation_dynamic, Ec2Handler};
use crate::handlers::efs::burst_credit_balance_creation_dynamic;
use crate::handlers::elb::{load_balancer_dimension, ElbHandler};
use crate::handlers::rds::{
    dbconnections_threshold_dynamic, freestoragespace_threshold_dynamic,
    serverlesscapacity_creation_dynamic, serverlesscapacity_threshold_dynamic, RdsHandler,
};
use crate::handlers::{cluster_name_from_tags, dynamodb::DynamoDbHandler};
use crate::sanitize::sanitize_metrics;
use crate::HandlerRegistry;
use chrono::{Duration, Utc};
use cwguard_catalog::{AlarmSpecification, Catalog, ClassificationValue};
use cwguard_common::{AlarmIdentity, Dimension, Resource};
use cwguard_engine::{
    Dispatcher, MetricDescriptor, RecordingSink, ResourceHandler, Resolver, RunContext,
    StaticMetricSource,
};
use cwguard_store::{MemoryOverrideStore, OverrideGateway};
use serde_json::{json, Value};
use std::sync::Arc;

fn ctx() -> RunContext {
    RunContext::new("eu-west-1", "123456789012")
}

fn spec(metric_specifications: Value, extra: Value) -> AlarmSpecification {
    let mut doc = json!({
        "MetricName": "Metric",
        "Namespace": "AWS/Test",
        "Period": 300,
        "EvaluationPeriods": 1,
        "ComparisonOperator": "GreaterThanThreshold",
        "MetricSpecifications": metric_specifications,
    });
    if let (Some(doc), Value::Object(extra)) = (doc.as_object_mut(), extra) {
        doc.extend(extra);
    }
    serde_json::from_value(doc).unwrap()
}

fn metric(dims: &[(&str, &str)]) -> MetricDescriptor {
    MetricDescriptor {
        namespace: "CWAgent".into(),
        metric_name: "disk_used_percent".into(),
        dimensions: dims.iter().map(|(n, v)| Dimension::new(*n, *v)).collect(),
    }
}

fn instance(tags: Value) -> Resource {
    Resource::new(
        "ec2",
        json!({"InstanceId": "i-1", "InstanceType": "t3.large", "Tags": tags}),
    )
}

#[test]
fn default_registry_covers_every_handler() {
    let registry = HandlerRegistry::default();
    assert_eq!(
        registry.kinds(),
        vec![
            "acm",
            "alb",
            "albtg",
            "directconnect",
            "dynamodb",
            "ebs",
            "ec2",
            "efs",
            "eks",
            "elasticache",
            "fsx",
            "kinesis",
            "lambda",
            "nlb",
            "nlbtg",
            "opensearch",
            "rds",
            "vpn",
        ]
    );
    assert_eq!(registry.get("nlb").unwrap().kind(), "nlb");
    assert!(registry.get("sqs").is_none());
}

#[test]
fn cluster_name_is_read_from_all_tag_forms() {
    let by_value = instance(json!([{"Key": "eks:cluster-name", "Value": "prod"}]));
    let by_lb_value = instance(json!([{"Key": "elbv2.k8s.aws/cluster", "Value": "edge"}]));
    let by_key = instance(json!([{"Key": "kubernetes.io/cluster/staging", "Value": "owned"}]));
    let plain = instance(json!([{"Key": "Name", "Value": "web"}]));

    assert_eq!(cluster_name_from_tags(&by_value).as_deref(), Some("prod"));
    assert_eq!(cluster_name_from_tags(&by_lb_value).as_deref(), Some("edge"));
    assert_eq!(cluster_name_from_tags(&by_key).as_deref(), Some("staging"));
    assert_eq!(cluster_name_from_tags(&plain), None);
}

#[test]
fn ec2_identity_prefers_cluster_then_group_then_name() {
    let handler = Ec2Handler::new();

    let node = instance(json!([
        {"Key": "Name", "Value": "node-1"},
        {"Key": "eks:cluster-name", "Value": "prod"}
    ]));
    assert_eq!(
        handler.identity(&node, &ctx()).unwrap(),
        AlarmIdentity::new("prod", "arn:aws:eks:eu-west-1:123456789012:cluster/prod")
    );

    let mut member = instance(json!([{"Key": "aws:autoscaling:groupName", "Value": "web-asg"}]));
    assert_eq!(
        handler.identity(&member, &ctx()).unwrap(),
        AlarmIdentity::new("web-asg", "web-asg")
    );
    member.attributes["AutoScalingGroupARN"] = json!("arn:aws:autoscaling:eu-west-1:1:web-asg");
    assert_eq!(
        handler.identity(&member, &ctx()).unwrap().cloud_id,
        "arn:aws:autoscaling:eu-west-1:1:web-asg"
    );

    let standalone = instance(json!([{"Key": "Name", "Value": "bastion"}]));
    assert_eq!(
        handler.identity(&standalone, &ctx()).unwrap(),
        AlarmIdentity::new("bastion", "i-1")
    );
}

#[test]
fn ec2_post_process_selects_platform_classification() {
    let handler = Ec2Handler::new();
    let template = spec(
        json!({"AlarmName": "CPU-", "Threshold": 90}),
        json!({"Classification": {
            "EventType": {"ec2": "VM", "eks": "K8S"},
            "MonitorComponent": "CPU"
        }}),
    );

    let node = instance(json!([{"Key": "eks:cluster-name", "Value": "prod"}]));
    let processed = handler.post_process(&node, template.clone());
    let classification = processed.classification.unwrap();
    assert_eq!(
        classification.event_type,
        Some(ClassificationValue::Fixed("K8S".into()))
    );
    assert_eq!(
        classification.monitor_component,
        Some(ClassificationValue::Fixed("CPU".into()))
    );

    let vm = instance(json!([]));
    let processed = handler.post_process(&vm, template);
    assert_eq!(
        processed.classification.unwrap().event_type,
        Some(ClassificationValue::Fixed("VM".into()))
    );
}

#[test]
fn cpu_credit_alarm_only_for_burstable_types() {
    let template = spec(
        json!({"AlarmName": "CPUCredit-", "Threshold": 20, "RegexType": "t[234]\\..*"}),
        json!({}),
    );
    assert!(cpucreditbalance_creation_dynamic(&instance(json!([])), &template).unwrap());

    let m5 = Resource::new("ec2", json!({"InstanceId": "i-2", "InstanceType": "m5.large"}));
    assert!(!cpucreditbalance_creation_dynamic(&m5, &template).unwrap());

    let partial = Resource::new("ec2", json!({"InstanceId": "i-3", "InstanceType": "xt3.large"}));
    assert!(!cpucreditbalance_creation_dynamic(&partial, &template).unwrap());

    let no_regex = spec(json!({"AlarmName": "CPUCredit-"}), json!({}));
    assert!(cpucreditbalance_creation_dynamic(&m5, &no_regex).is_err());
}

#[tokio::test]
async fn sanitize_keeps_most_recent_duplicate() {
    let now = Utc::now();
    let fresh = metric(&[("path", "/data"), ("device", "nvme1n1")]);
    let stale = metric(&[("path", "/data"), ("device", "xvdb")]);
    let silent_a = metric(&[("path", "/old"), ("device", "xvdc")]);
    let silent_b = metric(&[("path", "/old"), ("device", "xvdd")]);
    let root = metric(&[("path", "/"), ("device", "nvme0n1p1")]);

    let source = StaticMetricSource::new()
        .with(stale.clone(), Some(now - Duration::hours(2)))
        .with(fresh.clone(), Some(now - Duration::minutes(5)))
        .with(silent_a.clone(), None)
        .with(silent_b.clone(), None)
        .with(root.clone(), None);

    let kept = sanitize_metrics(
        &source,
        vec![stale, fresh.clone(), silent_a, silent_b, root.clone()],
        "path",
    )
    .await
    .unwrap();
    assert_eq!(kept, vec![fresh, root]);
}

#[tokio::test]
async fn sanitize_leaves_single_metric_untouched() {
    let only = metric(&[("path", "/")]);
    let kept = sanitize_metrics(&StaticMetricSource::new(), vec![only.clone()], "path")
        .await
        .unwrap();
    assert_eq!(kept, vec![only]);
}

const EC2_CATALOG: &str = r#"{
    "ec2": {
        "disk_used_percent": {
            "MetricName": "disk_used_percent",
            "Namespace": "CWAgent",
            "Period": 300,
            "EvaluationPeriods": 2,
            "ComparisonOperator": "GreaterThanThreshold",
            "MetricSpecifications": {
                "AlarmName": "DiskUsed-",
                "Threshold": 80,
                "DynamicCore": "diskusedpercent_core_dynamic"
            }
        },
        "network_share": {
            "MetricName": "disk_used_percent",
            "Namespace": "CWAgent",
            "Period": 300,
            "EvaluationPeriods": 2,
            "ComparisonOperator": "GreaterThanThreshold",
            "MetricSpecifications": {
                "AlarmName": "Share-",
                "Threshold": 90,
                "DynamicCore": "networksharemount_core_dynamic"
            }
        }
    }
}"#;

#[tokio::test]
async fn disk_core_hook_skips_temporary_and_kubelet_mounts() {
    let now = Utc::now();
    let root = metric(&[
        ("InstanceId", "i-1"),
        ("path", "/"),
        ("device", "nvme0n1p1"),
        ("fstype", "xfs"),
    ]);
    let data = metric(&[
        ("InstanceId", "i-1"),
        ("path", "/data"),
        ("device", "nvme1n1"),
        ("fstype", "ext4"),
    ]);
    let data_renamed = metric(&[
        ("InstanceId", "i-1"),
        ("path", "/data"),
        ("device", "xvdb"),
        ("fstype", "ext4"),
    ]);
    let kubelet = metric(&[
        ("InstanceId", "i-1"),
        ("path", "/var/lib/kubelet/pods/x"),
        ("device", "nvme2n1"),
        ("fstype", "xfs"),
    ]);
    let tmp = metric(&[
        ("InstanceId", "i-1"),
        ("path", "/run"),
        ("device", "tmpfs"),
        ("fstype", "tmpfs"),
    ]);
    let share = metric(&[
        ("InstanceId", "i-1"),
        ("path", "/mnt/share"),
        ("device", "fs-1.efs"),
        ("fstype", "nfs4"),
    ]);
    let other_instance = metric(&[("InstanceId", "i-9"), ("path", "/"), ("fstype", "xfs")]);

    let source = StaticMetricSource::new()
        .with(root.clone(), None)
        .with(data.clone(), Some(now - Duration::minutes(1)))
        .with(data_renamed, Some(now - Duration::hours(1)))
        .with(kubelet, None)
        .with(tmp, None)
        .with(share.clone(), None)
        .with(other_instance, None);

    let catalog = Catalog::from_json_str(EC2_CATALOG).unwrap();
    let rules = catalog.rules_for("ec2").unwrap();
    let sink = Arc::new(RecordingSink::new());
    let dispatcher = Dispatcher::new(
        Resolver::new(OverrideGateway::disabled(), Some("prod".into())),
        Arc::new(ctx()),
        sink.clone(),
        Arc::new(source),
    );

    let report = dispatcher
        .process_resource(&Ec2Handler::new(), rules, &instance(json!([])))
        .await;
    assert!(report.failures.is_empty(), "{:?}", report.failures);

    assert_eq!(
        sink.names(),
        vec![
            "prod-DiskUsed-Root-i-1",
            "prod-DiskUsed-nvme1n1-i-1",
            "prod-Share-/mnt/share-i-1",
        ]
    );
    let submitted = sink.submitted();
    assert_eq!(submitted[0].dimensions, root.dimensions);
    assert_eq!(submitted[1].dimensions, data.dimensions);
    assert_eq!(submitted[2].dimensions, share.dimensions);
    assert_eq!(submitted[2].threshold, 90.0);
}

#[test]
fn ebs_alarm_is_keyed_by_attached_instance_then_volume() {
    let handler = EbsHandler::new();
    let volume = Resource::new(
        "ebs",
        json!({
            "VolumeId": "vol-1",
            "VolumeType": "gp2",
            "EC2Name": "web-1",
            "Attachments": [
                {"InstanceId": "i-0", "State": "detaching"},
                {"InstanceId": "i-1", "State": "attached"}
            ]
        }),
    );
    assert_eq!(handler.id_components(&volume).unwrap(), vec!["i-1", "vol-1"]);
    assert_eq!(
        handler.identity(&volume, &ctx()).unwrap(),
        AlarmIdentity::new("web-1", "i-1")
    );

    let burst = handler.hooks().creation("burstbalance_creation_dynamic").unwrap();
    let gp = spec(json!({"AlarmName": "Burst-", "Types": ["gp2", "st1"]}), json!({}));
    let io = spec(json!({"AlarmName": "Burst-", "Types": ["io1"]}), json!({}));
    assert!(burst(&volume, &gp).unwrap());
    assert!(!burst(&volume, &io).unwrap());
}

#[tokio::test]
async fn ebs_override_keyed_by_instance_alone_still_applies() {
    let catalog = Catalog::from_json_str(
        r#"{"ebs": {"burst_balance": {
            "MetricName": "BurstBalance",
            "Namespace": "AWS/EBS",
            "Period": 300,
            "EvaluationPeriods": 3,
            "ComparisonOperator": "LessThanThreshold",
            "MetricSpecifications": {"AlarmName": "BurstBalance-", "Threshold": 20}
        }}}"#,
    )
    .unwrap();
    let rules = catalog.rules_for("ebs").unwrap();
    let store = MemoryOverrideStore::new().with(
        "prod-BurstBalance-i-1-",
        json!({"Threshold": 5}).as_object().cloned().unwrap(),
    );
    let resolver = Resolver::new(OverrideGateway::new(Arc::new(store)), Some("prod".into()));
    let volume = Resource::new(
        "ebs",
        json!({
            "VolumeId": "vol-1",
            "VolumeType": "gp2",
            "Attachments": [{"InstanceId": "i-1", "State": "attached"}]
        }),
    );

    let components = EbsHandler::new().id_components(&volume).unwrap();
    let spec = resolver
        .resolve("burst_balance", rules, &components, None)
        .await
        .unwrap();
    assert_eq!(spec.alarm_name.as_deref(), Some("prod-BurstBalance-i-1-vol-1"));
    assert_eq!(spec.threshold(), Some(5.0));
}

fn database() -> Resource {
    Resource::new(
        "rds",
        json!({
            "DBInstanceIdentifier": "orders",
            "DBInstanceArn": "arn:aws:rds:eu-west-1:1:db:orders",
            "DBInstanceClass": "db.t3.medium",
            "Engine": "mysql",
            "AllocatedStorage": 100,
            "StorageType": "gp2",
            "MemoryInfo": {"SizeInMiB": 8192}
        }),
    )
}

#[test]
fn rds_rules_filter_on_type_engine_and_mode() {
    let handler = RdsHandler::new();
    let db = database();

    let mysql = spec(
        json!({"AlarmName": "CPU-", "Types": ["instance"], "Engines": ["mysql", "mariadb"]}),
        json!({}),
    );
    let postgres = spec(
        json!({"AlarmName": "CPU-", "Types": ["instance"], "Engines": ["postgres"]}),
        json!({}),
    );
    let cluster_only = spec(json!({"AlarmName": "CPU-", "Types": ["cluster"]}), json!({}));
    assert!(handler.applies(&db, &mysql));
    assert!(!handler.applies(&db, &postgres));
    assert!(!handler.applies(&db, &cluster_only));

    let serverless = Resource::new(
        "rds",
        json!({"DBClusterIdentifier": "reports", "Engine": "aurora-mysql", "EngineMode": "serverless"}),
    );
    let provisioned_only = spec(
        json!({"AlarmName": "Lag-", "Types": ["cluster"], "EngineModes": ["provisioned"]}),
        json!({}),
    );
    assert!(!handler.applies(&serverless, &provisioned_only));
    assert_eq!(
        handler.id_components(&serverless).unwrap(),
        vec!["cluster-reports"]
    );
    assert_eq!(
        handler.dimensions(&serverless).unwrap(),
        vec![Dimension::new("DBClusterIdentifier", "reports")]
    );
    assert_eq!(handler.id_components(&db).unwrap(), vec!["instance-orders"]);
}

#[test]
fn rds_threshold_formulas() {
    let db = database();
    let ten_percent = spec(json!({"AlarmName": "Free-", "Threshold": 10}), json!({}));
    assert_eq!(
        freestoragespace_threshold_dynamic(&db, &ten_percent).unwrap(),
        10_737_418_240.0
    );

    let eighty_percent = spec(json!({"AlarmName": "Conn-", "Threshold": 80}), json!({}));
    let connections = dbconnections_threshold_dynamic(&db, &eighty_percent).unwrap();
    assert!((connections - 546.4).abs() < 1e-9);

    let mut unknown_class = database();
    unknown_class.attributes["MemoryInfo"] = Value::Null;
    assert_eq!(
        dbconnections_threshold_dynamic(&unknown_class, &eighty_percent).unwrap(),
        0.0
    );

    let aurora = Resource::new(
        "rds",
        json!({
            "DBClusterIdentifier": "reports",
            "ScalingConfigurationInfo": {"MinCapacity": 2, "MaxCapacity": 16}
        }),
    );
    let two_units = spec(json!({"AlarmName": "Cap-", "Threshold": 2}), json!({}));
    assert!(serverlesscapacity_creation_dynamic(&aurora, &two_units).unwrap());
    assert_eq!(
        serverlesscapacity_threshold_dynamic(&aurora, &two_units).unwrap(),
        14.0
    );

    let fixed = Resource::new(
        "rds",
        json!({"ScalingConfigurationInfo": {"MinCapacity": 4, "MaxCapacity": 4}}),
    );
    assert!(!serverlesscapacity_creation_dynamic(&fixed, &two_units).unwrap());
}

#[test]
fn rds_replica_hooks_need_a_source() {
    let handler = RdsHandler::new();
    let lag = handler.hooks().creation("replicalag_creation_dynamic").unwrap();
    let template = spec(json!({"AlarmName": "Lag-"}), json!({}));
    assert!(!lag(&database(), &template).unwrap());

    let mut replica = database();
    replica.attributes["ReadReplicaSourceDBInstanceIdentifier"] = json!("orders-primary");
    assert!(lag(&replica, &template).unwrap());
}

#[test]
fn load_balancer_dimension_and_type_filter() {
    assert_eq!(
        load_balancer_dimension(
            "arn:aws:elasticloadbalancing:eu-west-1:1:loadbalancer/app/web/50dc6c495c0c9188"
        ),
        "app/web/50dc6c495c0c9188"
    );

    let alb = ElbHandler::application();
    let lb = Resource::new(
        "alb",
        json!({
            "LoadBalancerName": "web",
            "LoadBalancerArn": "arn:aws:elasticloadbalancing:eu-west-1:1:loadbalancer/app/web/50dc",
            "Type": "application",
            "Tags": [{"Key": "elbv2.k8s.aws/cluster", "Value": "prod"}]
        }),
    );
    let network_only = spec(json!({"AlarmName": "Flow-", "Types": ["network"]}), json!({}));
    let any = spec(json!({"AlarmName": "5xx-"}), json!({}));
    assert!(!alb.applies(&lb, &network_only));
    assert!(alb.applies(&lb, &any));
    assert_eq!(alb.identity(&lb, &ctx()).unwrap().ci_name, "prod");
}

#[test]
fn efs_and_dynamodb_attributes() {
    let efs = Resource::new(
        "efs",
        json!({"FileSystemId": "fs-1", "ThroughputMode": "bursting", "SizeInBytes": {"Value": 6144}}),
    );
    let template = spec(json!({"AlarmName": "Burst-"}), json!({}));
    assert!(burst_credit_balance_creation_dynamic(&efs, &template).unwrap());

    let table = Resource::new(
        "dynamodb",
        json!({"TableInfo": {"TableName": "orders", "TableId": "4d3c-11"}}),
    );
    let handler = DynamoDbHandler::new();
    assert_eq!(
        handler.identity(&table, &ctx()).unwrap(),
        AlarmIdentity::new("orders", "4d3c-11")
    );
    assert_eq!(
        handler.dimensions(&table).unwrap(),
        vec![Dimension::new("TableName", "orders")]
    );
}
