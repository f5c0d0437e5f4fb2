use std::collections::HashSet;

use crate::config::TenancyConfig;
use crate::domain::TenantId;

const LOCALHOST: &str = "localhost";
/// Loopback literals a default local bind is browsed through.
const LOOPBACK_HOSTS: [&str; 2] = ["127.0.0.1", "[::1]"];

/// Which part of the platform a hostname addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Cross-tenant public portal.
    Platform,
    /// A tenant-branded site.
    Tenant(TenantId),
    /// The back office.
    AdminApp,
    /// A hostname the platform does not own; the domain registry decides.
    Unresolved(String),
}

/// Maps hostnames to a [`Scope`]. Built once from configuration, read-only afterwards.
#[derive(Debug, Clone)]
pub struct HostResolver {
    admin_label: String,
    admin_hosts: HashSet<String>,
    platform_hosts: HashSet<String>,
    platform_labels: HashSet<String>,
    tenant_suffixes: Vec<String>,
}

impl HostResolver {
    pub fn new(config: &TenancyConfig) -> Self {
        let root = config.root_domain.trim().trim_matches('.').to_ascii_lowercase();
        let admin_label = config.admin_label.trim().to_ascii_lowercase();

        let mut platform_hosts: HashSet<String> = [root.clone(), format!("www.{root}")]
            .into_iter()
            .chain(std::iter::once(LOCALHOST.to_string()))
            .chain(LOOPBACK_HOSTS.iter().map(|host| host.to_string()))
            .collect();
        platform_hosts.extend(
            config
                .extra_platform_hosts
                .iter()
                .map(|host| host.trim().to_ascii_lowercase()),
        );

        let admin_hosts = [format!("{admin_label}.{root}"), format!("{admin_label}.{LOCALHOST}")]
            .into_iter()
            .collect();

        Self {
            platform_labels: ["www".to_string(), admin_label.clone()]
                .into_iter()
                .collect(),
            tenant_suffixes: vec![format!(".{root}"), format!(".{LOCALHOST}")],
            admin_label,
            admin_hosts,
            platform_hosts,
        }
    }

    /// Resolve a raw `Host` value. Ports, a trailing dot and letter case are ignored.
    pub fn resolve(&self, raw_host: &str) -> Scope {
        let host = normalize_host(raw_host);

        if self.admin_hosts.contains(&host) {
            return Scope::AdminApp;
        }
        if self.platform_hosts.contains(&host) {
            return Scope::Platform;
        }

        let first_label = host.split('.').next().unwrap_or_default();
        for suffix in &self.tenant_suffixes {
            if host.len() > suffix.len()
                && host.ends_with(suffix.as_str())
                && !first_label.is_empty()
                && !self.platform_labels.contains(first_label)
            {
                return Scope::Tenant(TenantId::new(first_label));
            }
        }

        if !first_label.is_empty() && first_label == self.admin_label && host.contains('.') {
            return Scope::AdminApp;
        }

        Scope::Unresolved(host)
    }
}

/// Lowercase, strip the port (IPv6 literals keep their brackets) and a trailing dot.
pub fn normalize_host(raw: &str) -> String {
    let raw = raw.trim();
    let without_port = if raw.starts_with('[') {
        match raw.find(']') {
            Some(end) => &raw[..=end],
            None => raw,
        }
    } else {
        raw.split(':').next().unwrap_or(raw)
    };
    without_port.trim_end_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> HostResolver {
        HostResolver::new(&TenancyConfig::new("casora.pe"))
    }

    #[test]
    fn resolves_platform_tenant_and_admin_hosts() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("casora.pe"), Scope::Platform);
        assert_eq!(resolver.resolve("www.casora.pe"), Scope::Platform);
        assert_eq!(resolver.resolve("localhost"), Scope::Platform);
        assert_eq!(
            resolver.resolve("demo.casora.pe"),
            Scope::Tenant(TenantId::new("demo"))
        );
        assert_eq!(resolver.resolve("app.casora.pe"), Scope::AdminApp);
    }

    #[test]
    fn ignores_port_case_and_trailing_dot() {
        let resolver = resolver();
        assert_eq!(
            resolver.resolve("Demo.Casora.PE:443"),
            Scope::Tenant(TenantId::new("demo"))
        );
        assert_eq!(resolver.resolve("localhost:3000"), Scope::Platform);
        assert_eq!(resolver.resolve("casora.pe."), Scope::Platform);
    }

    #[test]
    fn development_subdomains_of_localhost() {
        let resolver = resolver();
        assert_eq!(
            resolver.resolve("acme.localhost:3000"),
            Scope::Tenant(TenantId::new("acme"))
        );
        assert_eq!(resolver.resolve("app.localhost:3000"), Scope::AdminApp);
    }

    #[test]
    fn www_is_never_a_tenant() {
        let resolver = resolver();
        assert_eq!(
            resolver.resolve("www.localhost"),
            Scope::Unresolved("www.localhost".to_string())
        );
    }

    #[test]
    fn admin_label_on_foreign_domain_is_admin_app() {
        assert_eq!(resolver().resolve("app.example.com"), Scope::AdminApp);
    }

    #[test]
    fn foreign_hosts_are_unresolved() {
        let resolver = resolver();
        assert_eq!(
            resolver.resolve("inmobiliaria-demo.com"),
            Scope::Unresolved("inmobiliaria-demo.com".to_string())
        );
        assert_eq!(
            resolver.resolve("notcasora.pe"),
            Scope::Unresolved("notcasora.pe".to_string())
        );
    }

    #[test]
    fn extra_platform_hosts_are_respected() {
        let mut config = TenancyConfig::new("casora.pe");
        config.extra_platform_hosts = vec!["portal.casora.pe".to_string()];
        let resolver = HostResolver::new(&config);
        assert_eq!(resolver.resolve("portal.casora.pe"), Scope::Platform);
    }

    #[test]
    fn loopback_literals_are_platform_hosts() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("127.0.0.1:3000"), Scope::Platform);
        assert_eq!(resolver.resolve("[::1]:3000"), Scope::Platform);
        assert_eq!(
            resolver.resolve("10.0.0.7:3000"),
            Scope::Unresolved("10.0.0.7".to_string())
        );
    }

    #[test]
    fn normalizes_ipv6_literals() {
        assert_eq!(normalize_host("[::1]:8080"), "[::1]");
    }
}
