use std::collections::HashMap;

use async_trait::async_trait;

use super::host::normalize_host;
use crate::domain::TenantId;

/// Maps custom hostnames (domains a tenant brought along) to their tenant.
#[async_trait]
pub trait DomainRegistry: Send + Sync {
    async fn lookup(&self, host: &str) -> Result<Option<TenantId>, RegistryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("domain registry unavailable: {0}")]
    Unavailable(String),
}

/// Registry backed by a fixed table, typically loaded from configuration.
#[derive(Debug, Default, Clone)]
pub struct StaticDomainRegistry {
    domains: HashMap<String, TenantId>,
}

impl StaticDomainRegistry {
    pub fn new<I, H>(entries: I) -> Self
    where
        I: IntoIterator<Item = (H, TenantId)>,
        H: AsRef<str>,
    {
        Self {
            domains: entries
                .into_iter()
                .map(|(host, tenant)| (normalize_host(host.as_ref()), tenant))
                .collect(),
        }
    }
}

#[async_trait]
impl DomainRegistry for StaticDomainRegistry {
    async fn lookup(&self, host: &str) -> Result<Option<TenantId>, RegistryError> {
        Ok(self.domains.get(&normalize_host(host)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn looks_up_normalized_hosts() {
        let registry =
            StaticDomainRegistry::new([("Inmobiliaria-Demo.com", TenantId::new("demo"))]);
        assert_eq!(
            registry
                .lookup("inmobiliaria-demo.com:443")
                .await
                .expect("lookup succeeds"),
            Some(TenantId::new("demo"))
        );
        assert_eq!(
            registry.lookup("other.com").await.expect("lookup succeeds"),
            None
        );
    }
}
