use cwguard_common::{AlarmIdentity, Dimension, Resource};
use cwguard_engine::{HookRegistry, ResourceHandler, Result, RunContext};

/// Kinesis data streams (`DescribeStreamSummary`).
#[derive(Default)]
pub struct KinesisHandler {
    hooks: HookRegistry,
}

impl KinesisHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceHandler for KinesisHandler {
    fn kind(&self) -> &str {
        "kinesis"
    }

    fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    fn resource_id(&self, resource: &Resource) -> String {
        resource.str_attr("StreamName").unwrap_or("unknown").to_string()
    }

    fn identity(&self, resource: &Resource, _ctx: &RunContext) -> Result<AlarmIdentity> {
        Ok(AlarmIdentity::new(
            resource.require_str("StreamName")?,
            resource.require_str("StreamARN")?,
        ))
    }

    fn id_components(&self, resource: &Resource) -> Result<Vec<String>> {
        Ok(vec![resource.require_str("StreamName")?.to_string()])
    }

    /// Stream metrics (`GetRecords.IteratorAgeMilliseconds`, ...) are
    /// published per `StreamName`.
    fn dimensions(&self, resource: &Resource) -> Result<Vec<Dimension>> {
        Ok(vec![Dimension::new(
            "StreamName",
            resource.require_str("StreamName")?,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stream_is_keyed_and_measured_by_name() {
        let arn = "arn:aws:kinesis:eu-west-1:123456789012:stream/events";
        let stream = Resource::new("kinesis", json!({"StreamName": "events", "StreamARN": arn}));
        let handler = KinesisHandler::new();

        assert_eq!(handler.id_components(&stream).unwrap(), vec!["events"]);
        assert_eq!(handler.dimensions(&stream).unwrap(), vec![Dimension::new("StreamName", "events")]);
        assert_eq!(
            handler.identity(&stream, &RunContext::new("eu-west-1", "123456789012")).unwrap(),
            AlarmIdentity::new("events", arn)
        );
    }
}
