// # OPNsense Address Source
//
// This crate provides an AddressSource implementation backed by the
// OPNsense diagnostics API.
//
// ## Behavior
//
// One GET per cycle to `/api/diagnostics/interface/getinterfaceconfig`
// with HTTP Basic authentication (API key/secret) and a bounded timeout.
// The response is a JSON object keyed by interface name; each entry
// carries a `flags` array (membership-tested for "up") and `ipv4`/`ipv6`
// arrays of address objects. Entries with an empty `ipaddr` or with the
// `link-local` flag set are dropped before the snapshot is built.
//
// The source is stateless and single-shot: no caching, no retries, no
// store access. The engine owns retry-by-next-cycle.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use wanwatch_core::error::{Error, FetchError};
use wanwatch_core::traits::{AddressRecord, AddressSet, AddressSource, InterfaceSnapshot, InterfaceStatus};

/// Default timeout for the diagnostics request (5 seconds)
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Endpoint path, relative to the appliance base URL
const INTERFACE_CONFIG_PATH: &str = "/api/diagnostics/interface/getinterfaceconfig";

/// Connection settings for the OPNsense API
#[derive(Clone)]
pub struct OpnsenseConfig {
    /// Base URL of the appliance, e.g. `https://firewall.example.net`
    pub base_url: String,
    /// API key (Basic auth username)
    pub api_key: String,
    /// API secret (Basic auth password)
    pub api_secret: String,
    /// Request timeout
    pub timeout: Duration,
}

impl OpnsenseConfig {
    /// Create a configuration with the default timeout
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// The API secret never appears in Debug output
impl std::fmt::Debug for OpnsenseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpnsenseConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<REDACTED>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// AddressSource backed by the OPNsense diagnostics API
pub struct OpnsenseAddressSource {
    base_url: String,
    api_key: String,
    api_secret: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpnsenseAddressSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpnsenseAddressSource")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<REDACTED>")
            .finish()
    }
}

impl OpnsenseAddressSource {
    /// Create a new source
    ///
    /// Fails only if the HTTP client cannot be built, which is a
    /// configuration problem, not a per-cycle one.
    pub fn new(config: OpnsenseConfig) -> Result<Self, Error> {
        if config.base_url.is_empty() {
            return Err(Error::config("OPNsense base URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url,
            api_key: config.api_key,
            api_secret: config.api_secret,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            INTERFACE_CONFIG_PATH
        )
    }
}

/// One interface entry in the diagnostics payload
#[derive(Debug, Deserialize)]
struct InterfaceConfig {
    flags: Vec<String>,
    ipv4: Vec<AddressEntry>,
    ipv6: Vec<AddressEntry>,
}

/// One address object within an interface entry
#[derive(Debug, Deserialize)]
struct AddressEntry {
    #[serde(default)]
    ipaddr: String,
    #[serde(rename = "link-local", default, deserialize_with = "truthy")]
    link_local: bool,
}

/// Accept the `link-local` flag however the appliance encodes it.
/// IPv4 entries carry a bool, IPv6 entries an integer.
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Bool(b) => Ok(b),
        serde_json::Value::Number(n) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
        serde_json::Value::String(s) => Ok(!(s.is_empty() || s == "0")),
        serde_json::Value::Null => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "unexpected link-local value: {}",
            other
        ))),
    }
}

/// Interpret the diagnostics payload for one interface
fn parse_snapshot(body: &str, interface: &str) -> Result<InterfaceSnapshot, FetchError> {
    let payload: HashMap<String, serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| FetchError::malformed(format!("Response is not a JSON object: {}", e)))?;

    let raw = payload.get(interface).ok_or_else(|| {
        FetchError::malformed(format!("Interface '{}' not present in response", interface))
    })?;

    let config: InterfaceConfig = serde_json::from_value(raw.clone()).map_err(|e| {
        FetchError::malformed(format!(
            "Interface '{}' entry lacks required fields: {}",
            interface, e
        ))
    })?;

    let status = InterfaceStatus::from_flag(config.flags.iter().any(|flag| flag == "up"));

    let records = config
        .ipv4
        .into_iter()
        .chain(config.ipv6)
        .map(|entry| AddressRecord {
            addr: entry.ipaddr,
            link_local: entry.link_local,
        });

    Ok(InterfaceSnapshot {
        status,
        addresses: AddressSet::from_records(records),
    })
}

#[async_trait]
impl AddressSource for OpnsenseAddressSource {
    async fn fetch(&self, interface: &str) -> Result<InterfaceSnapshot, FetchError> {
        let response = self
            .client
            .get(self.endpoint())
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .send()
            .await
            .map_err(|e| FetchError::transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::transport(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::RemoteError {
                status: status.as_u16(),
                body,
            });
        }

        let snapshot = parse_snapshot(&body, interface)?;
        tracing::debug!(
            "Fetched {} address(es) for interface {} ({:?})",
            snapshot.addresses.len(),
            interface,
            snapshot.status
        );
        Ok(snapshot)
    }

    fn source_name(&self) -> &'static str {
        "opnsense"
    }
}
