//! Network interface records reported by `query network`.
//!
//! The agent prints one interface per line as five comma-separated fields:
//! `name, address, netmask, hostname, domain`.

use std::net::IpAddr;

use serde::Serialize;
use thiserror::Error;

use crate::error::ClientError;

/// Number of comma-separated fields in an interface line.
const INTERFACE_FIELDS: usize = 5;

/// One network interface on the remote host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkInterface {
    /// Adapter name.
    pub name: String,
    /// Address as reported by the agent.
    pub ip_address: String,
    /// Netmask as reported: dotted quad or a prefix length.
    pub netmask: String,
    /// Lower-cased hostname, qualified with the domain when there is one.
    pub dns_name: String,
    /// True when this interface is the one the client is talking to.
    pub required: bool,
}

impl NetworkInterface {
    /// Prefix length of the netmask.
    ///
    /// # Errors
    ///
    /// Returns [`NetmaskError`] when the netmask is not understood.
    pub fn cidr(&self) -> Result<u8, NetmaskError> {
        netmask_prefix_len(&self.netmask)
    }

    /// True for IPv6 addresses.
    #[must_use]
    pub fn is_v6(&self) -> bool {
        self.ip_address.contains(':')
    }

    /// True for anything that is not IPv6.
    #[must_use]
    pub fn is_v4(&self) -> bool {
        !self.is_v6()
    }
}

/// A netmask that is neither dotted octets nor a prefix length.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid netmask `{netmask}`")]
pub struct NetmaskError {
    netmask: String,
}

impl NetmaskError {
    /// The rejected netmask text.
    #[must_use]
    pub fn netmask(&self) -> &str {
        &self.netmask
    }
}

/// Counts the set bits of a dotted netmask, or parses a bare prefix length.
///
/// ```
/// use wmiclient::netmask_prefix_len;
///
/// assert_eq!(netmask_prefix_len("255.255.255.0"), Ok(24));
/// assert_eq!(netmask_prefix_len("16"), Ok(16));
/// ```
///
/// # Errors
///
/// Returns [`NetmaskError`] when an octet or the prefix length is not a
/// number in `0..=255`.
pub fn netmask_prefix_len(netmask: &str) -> Result<u8, NetmaskError> {
    let invalid = || NetmaskError {
        netmask: netmask.to_owned(),
    };
    let text = netmask.trim();
    if !text.contains('.') {
        return text.parse().map_err(|_| invalid());
    }
    text.split('.').try_fold(0_u8, |bits, octet| {
        let value: u8 = octet.parse().map_err(|_| invalid())?;
        let ones = u8::try_from(value.count_ones()).map_err(|_| invalid())?;
        bits.checked_add(ones).ok_or_else(invalid)
    })
}

/// Builds interface records from `query network` output.
///
/// `host` is the address the client targets; an interface whose address or
/// DNS name renders the same way is marked as required.
///
/// # Errors
///
/// Returns [`ClientError::MalformedOutput`] for a line that does not have
/// exactly five fields.
pub fn parse_interfaces(
    lines: &[String],
    host: IpAddr,
) -> Result<Vec<NetworkInterface>, ClientError> {
    let target = host.to_string();
    lines
        .iter()
        .map(|line| parse_interface(line, &target))
        .collect()
}

fn parse_interface(line: &str, host: &str) -> Result<NetworkInterface, ClientError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [name, ip_address, netmask, hostname, domain] = fields.as_slice() else {
        return Err(ClientError::MalformedOutput {
            message: format!(
                "expected {INTERFACE_FIELDS} fields in interface line, found {}: {line:?}",
                fields.len()
            ),
        });
    };

    let lowered = hostname.to_lowercase();
    let dns_name = if domain.is_empty() {
        lowered
    } else {
        format!("{lowered}.{domain}")
    };
    let required = *ip_address == host || dns_name == host;

    Ok(NetworkInterface {
        name: (*name).to_owned(),
        ip_address: (*ip_address).to_owned(),
        netmask: (*netmask).to_owned(),
        dns_name,
        required,
    })
}
