//! Target identity: the remote endpoint and the credentials used against it.

use std::fmt;
use std::io;
use std::net::{IpAddr, ToSocketAddrs};
use std::sync::Arc;

use thiserror::Error;

/// Looks up the addresses behind a host name.
///
/// The production implementation is [`SystemResolver`]. Tests inject
/// fixed tables instead of touching the platform resolver.
pub trait HostResolver {
    /// Returns every address the host resolves to, in resolver order.
    ///
    /// # Errors
    ///
    /// Returns the resolver's I/O error when the lookup itself fails.
    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolves hosts with the platform resolver.
///
/// Literal IPv4 and IPv6 addresses are returned verbatim without a lookup.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl HostResolver for SystemResolver {
    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        if let Ok(address) = host.parse::<IpAddr>() {
            return Ok(vec![address]);
        }
        let addresses = (host, 0).to_socket_addrs()?;
        Ok(addresses.map(|socket| socket.ip()).collect())
    }
}

/// Raised when a host name yields no usable address.
#[derive(Debug, Error)]
#[error("failed to resolve host `{host}`{}", describe_source(source.as_deref()))]
pub struct ResolutionError {
    host: String,
    #[source]
    source: Option<Arc<io::Error>>,
}

impl ResolutionError {
    /// The host name that failed to resolve.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }
}

fn describe_source(source: Option<&io::Error>) -> String {
    source.map_or_else(
        || String::from(": no addresses returned"),
        |error| format!(": {error}"),
    )
}

/// The remote endpoint a client talks to.
///
/// The host is resolved exactly once, when the identity is built, so every
/// request in a session targets the same address. Equality is by value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TargetIdentity {
    host: IpAddr,
    domain: String,
    user: String,
    password: String,
}

impl TargetIdentity {
    /// Builds an identity for an already resolved address.
    #[must_use]
    pub fn new(
        host: IpAddr,
        domain: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host,
            domain: domain.into(),
            user: user.into(),
            password: password.into(),
        }
    }

    /// Resolves `host` with the platform resolver and builds an identity.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] when the lookup fails or returns no
    /// addresses.
    pub fn resolve(
        host: &str,
        domain: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ResolutionError> {
        Self::resolve_with(&SystemResolver, host, domain, user, password)
    }

    /// Resolves `host` with the supplied resolver and builds an identity.
    ///
    /// The first address returned by the resolver is used.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] when the lookup fails or returns no
    /// addresses.
    pub fn resolve_with<R: HostResolver + ?Sized>(
        resolver: &R,
        host: &str,
        domain: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ResolutionError> {
        let addresses = resolver.resolve(host).map_err(|error| ResolutionError {
            host: host.to_owned(),
            source: Some(Arc::new(error)),
        })?;
        let address = addresses
            .into_iter()
            .next()
            .ok_or_else(|| ResolutionError {
                host: host.to_owned(),
                source: None,
            })?;
        Ok(Self::new(address, domain, user, password))
    }

    /// Resolved address of the remote host.
    #[must_use]
    pub const fn host(&self) -> IpAddr {
        self.host
    }

    /// Authentication domain.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// User name.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for TargetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetIdentity")
            .field("host", &self.host)
            .field("domain", &self.domain)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::net::Ipv4Addr;

    use rstest::{fixture, rstest};

    use super::*;

    struct TableResolver {
        entries: HashMap<&'static str, Vec<IpAddr>>,
    }

    impl HostResolver for TableResolver {
        fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
            self.entries
                .get(host)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "unknown host"))
        }
    }

    #[fixture]
    fn resolver() -> TableResolver {
        let mut entries = HashMap::new();
        entries.insert(
            "winbox",
            vec![
                IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
                IpAddr::V4(Ipv4Addr::new(10, 0, 0, 6)),
            ],
        );
        entries.insert("ghost", Vec::new());
        TableResolver { entries }
    }

    #[rstest]
    fn resolves_to_first_address(resolver: TableResolver) {
        let identity = TargetIdentity::resolve_with(&resolver, "winbox", "CORP", "admin", "pw")
            .expect("resolve");

        assert_eq!(identity.host(), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)));
        assert_eq!(identity.domain(), "CORP");
        assert_eq!(identity.user(), "admin");
        assert_eq!(identity.password(), "pw");
    }

    #[rstest]
    fn empty_lookup_is_a_resolution_error(resolver: TableResolver) {
        let error = TargetIdentity::resolve_with(&resolver, "ghost", "", "admin", "pw")
            .expect_err("no addresses");

        assert_eq!(error.host(), "ghost");
        assert!(error.to_string().contains("no addresses"));
    }

    #[rstest]
    fn failed_lookup_keeps_the_resolver_error(resolver: TableResolver) {
        let error = TargetIdentity::resolve_with(&resolver, "elsewhere", "", "admin", "pw")
            .expect_err("unknown host");

        assert!(std::error::Error::source(&error).is_some());
    }

    #[rstest]
    #[case("192.168.1.20")]
    #[case("::1")]
    fn system_resolver_passes_literal_addresses_through(#[case] literal: &str) {
        let identity =
            TargetIdentity::resolve(literal, "", "admin", "pw").expect("literal resolves");

        assert_eq!(identity.host().to_string(), literal);
    }

    #[rstest]
    fn equality_is_by_value() {
        let host = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5));
        let first = TargetIdentity::new(host, "CORP", "admin", "pw");
        let second = TargetIdentity::new(host, "CORP", "admin", "pw");

        assert_eq!(first, second);
        assert_ne!(first, TargetIdentity::new(host, "CORP", "admin", "other"));
    }

    #[rstest]
    fn debug_output_redacts_password() {
        let identity = TargetIdentity::new(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            "CORP",
            "admin",
            "hunter2",
        );
        let rendered = format!("{identity:?}");

        assert!(!rendered.contains("hunter2"), "password leaked: {rendered}");
        assert!(rendered.contains("<redacted>"));
    }
}
