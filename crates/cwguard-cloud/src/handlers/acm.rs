use cwguard_common::{AlarmIdentity, Dimension, Resource};
use cwguard_engine::{HookRegistry, ResourceHandler, Result, RunContext};

#[derive(Default)]
pub struct AcmHandler {
    hooks: HookRegistry,
}

impl AcmHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceHandler for AcmHandler {
    fn kind(&self) -> &str {
        "acm"
    }

    fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    fn resource_id(&self, resource: &Resource) -> String {
        resource
            .str_attr("CertificateArn")
            .unwrap_or("unknown")
            .to_string()
    }

    fn identity(&self, resource: &Resource, _ctx: &RunContext) -> Result<AlarmIdentity> {
        Ok(AlarmIdentity::new(
            resource.require_str("DomainName")?,
            resource.require_str("CertificateArn")?,
        ))
    }

    fn id_components(&self, resource: &Resource) -> Result<Vec<String>> {
        Ok(vec![resource.require_str("DomainName")?.to_string()])
    }

    fn dimensions(&self, resource: &Resource) -> Result<Vec<Dimension>> {
        Ok(vec![Dimension::new(
            "CertificateArn",
            resource.require_str("CertificateArn")?,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn certificate_is_keyed_by_domain_and_measured_by_arn() {
        let arn = "arn:aws:acm:eu-west-1:123456789012:certificate/0f1e";
        let cert = Resource::new("acm", json!({"DomainName": "shop.example.com", "CertificateArn": arn}));
        let handler = AcmHandler::new();
        let ctx = RunContext::new("eu-west-1", "123456789012");

        assert_eq!(handler.id_components(&cert).unwrap(), vec!["shop.example.com"]);
        assert_eq!(handler.dimensions(&cert).unwrap(), vec![Dimension::new("CertificateArn", arn)]);
        assert_eq!(
            handler.identity(&cert, &ctx).unwrap(),
            AlarmIdentity::new("shop.example.com", arn)
        );
    }
}
