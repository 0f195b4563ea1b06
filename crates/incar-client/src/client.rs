//! Connection to the in-car HTTP control interface

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ClientError, Result};
use crate::vehicle::Vehicle;

/// Header carrying the VIN on every remote-API request.
pub const VIN_HEADER: &str = "X-SSL-Client-S-CN";

/// VIN sent when the caller does not supply one.
///
/// The remote API accepts requests without a real VIN but logs warnings
/// in the car; pass the actual VIN whenever it is known.
pub const PLACEHOLDER_VIN: &str = "blah";

/// Build a request URL from a base and a path beginning with `/`.
///
/// Plain concatenation: a base of `http://host/remoteapi` plus `/wake_up`
/// targets `http://host/remoteapi/wake_up`. (`Url::join` would drop the
/// base path segment for an absolute path.)
fn request_url(base: &Url, path: &str) -> String {
    format!("{}{}", base.as_str().trim_end_matches('/'), path)
}

/// Shared HTTP plumbing: the two base URLs, the VIN and the reqwest client.
///
/// Cheap to clone; the [`Connection`] and its [`Vehicle`] each hold a copy,
/// so a vehicle can issue requests without owning its connection.
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    http: Client,
    remote_base: Url,
    debug_base: Url,
    vin: String,
}

impl Transport {
    pub(crate) fn new(
        remote_api_url: &str,
        debug_service_url: &str,
        vin: Option<&str>,
    ) -> Result<Self> {
        let remote_base = Url::parse(remote_api_url)?;
        let debug_base = Url::parse(debug_service_url)?;
        let vin = vin.unwrap_or(PLACEHOLDER_VIN).to_string();

        Ok(Self {
            http: Client::new(),
            remote_base,
            debug_base,
            vin,
        })
    }

    pub(crate) fn vin(&self) -> &str {
        &self.vin
    }

    /// Get data from the remote API (a [`Transport::post`] with no data).
    pub(crate) async fn get(&self, command: &str) -> Result<Value> {
        self.post(command, None).await
    }

    /// Request `/<command>` on the remote API with the VIN header attached.
    pub(crate) async fn post(&self, command: &str, data: Option<Value>) -> Result<Value> {
        self.open(&self.remote_base, &format!("/{}", command), true, data)
            .await
    }

    /// Look up a named internal variable on the debug service.
    pub(crate) async fn debug_get_var(&self, name: &str) -> Result<Value> {
        let result = self
            .open(
                &self.debug_base,
                &format!("/get_data_value?valueName={}", name),
                false,
                None,
            )
            .await?;
        result
            .get("value")
            .cloned()
            .ok_or_else(|| ClientError::MissingField("value".to_string()))
    }

    /// Raw request. `data` is form-URL-encoded into the body when present;
    /// the method follows the body (GET without one, POST with one). The
    /// response body is decoded as JSON using the charset the server
    /// declares, UTF-8 by default.
    async fn open(&self, base: &Url, path: &str, auth: bool, data: Option<Value>) -> Result<Value> {
        let url = request_url(base, path);

        let mut request = match data {
            Some(data) => {
                let body = serde_urlencoded::to_string(&data)
                    .map_err(|e| ClientError::Encode(e.to_string()))?;
                self.http
                    .post(&url)
                    .header(
                        reqwest::header::CONTENT_TYPE,
                        "application/x-www-form-urlencoded",
                    )
                    .body(body)
            }
            None => self.http.get(&url),
        };
        if auth {
            request = request.header(VIN_HEADER, self.vin.as_str());
        }

        debug!("Requesting {}", url);
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.text().await {
                Ok(body) if !body.is_empty() => body,
                _ => format!("HTTP {}", status),
            };
            return Err(ClientError::server_error(status.as_u16(), message));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Connection to the in-car HTTP control interface.
///
/// Holds the remote-API and debug-service base URLs and owns the vehicle
/// list (exactly one [`Vehicle`] today). Constructing a connection performs
/// two debug lookups to populate the vehicle's display name and state, so
/// any transport or decode failure surfaces from the constructor itself.
#[derive(Debug, Clone)]
pub struct Connection {
    transport: Transport,
    /// The vehicles reachable through this connection. Exactly one element,
    /// created during construction and never replaced.
    pub vehicles: Vec<Vehicle>,
}

impl Connection {
    /// Connect with the default state derivation (always `"online"`).
    ///
    /// `vin` falls back to [`PLACEHOLDER_VIN`] when `None`.
    pub async fn connect(
        remote_api_url: &str,
        debug_service_url: &str,
        vin: Option<&str>,
    ) -> Result<Self> {
        Self::connect_with_state_hook(remote_api_url, debug_service_url, vin, |_| {
            "online".to_string()
        })
        .await
    }

    /// Connect, deriving the vehicle state from the lock probe.
    ///
    /// Construction always probes the `VAPI_isLocked` debug variable;
    /// `state_hook` receives the decoded probe result and returns the
    /// initial `state` string. The default hook used by
    /// [`Connection::connect`] ignores the probe and reports `"online"`.
    pub async fn connect_with_state_hook(
        remote_api_url: &str,
        debug_service_url: &str,
        vin: Option<&str>,
        state_hook: impl Fn(&Value) -> String,
    ) -> Result<Self> {
        let transport = Transport::new(remote_api_url, debug_service_url, vin)?;

        let mut vehicle = Vehicle::new(transport.clone(), transport.vin().to_string());

        let name = transport.debug_get_var("GUI_vehicleName").await?;
        vehicle.display_name = match name {
            Value::String(name) => name,
            other => other.to_string(),
        };

        let locked = transport.debug_get_var("VAPI_isLocked").await?;
        vehicle.state = state_hook(&locked);

        Ok(Self {
            transport,
            vehicles: vec![vehicle],
        })
    }

    /// The remote-API base URL.
    pub fn remote_base(&self) -> &Url {
        &self.transport.remote_base
    }

    /// The debug-service base URL.
    pub fn debug_base(&self) -> &Url {
        &self.transport.debug_base
    }

    /// The VIN attached to every remote-API request.
    pub fn vin(&self) -> &str {
        self.transport.vin()
    }

    /// Get data from the remote API (a [`Connection::post`] with no data).
    #[instrument(skip(self))]
    pub async fn get(&self, command: &str) -> Result<Value> {
        self.transport.get(command).await
    }

    /// Request `/<command>` on the remote API. `data` is form-URL-encoded
    /// into the body when present; `None` sends no body.
    #[instrument(skip(self, data))]
    pub async fn post(&self, command: &str, data: Option<Value>) -> Result<Value> {
        self.transport.post(command, data).await
    }

    /// Fetch a named internal variable from the debug service and return
    /// the `value` field of its response.
    #[instrument(skip(self))]
    pub async fn debug_get_var(&self, name: &str) -> Result<Value> {
        self.transport.debug_get_var(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url() {
        let transport = Transport::new("not a url", "http://127.0.0.1:1", None);
        assert!(matches!(transport, Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_placeholder_vin() {
        let transport = Transport::new("http://127.0.0.1:1", "http://127.0.0.1:1", None).unwrap();
        assert_eq!(transport.vin(), PLACEHOLDER_VIN);
    }

    #[test]
    fn test_supplied_vin_kept() {
        let transport = Transport::new(
            "http://127.0.0.1:1",
            "http://127.0.0.1:1",
            Some("5YJSA1CE1234567"),
        )
        .unwrap();
        assert_eq!(transport.vin(), "5YJSA1CE1234567");
    }

    #[test]
    fn test_request_url_keeps_base_path() {
        let base = Url::parse("http://192.168.90.100/remoteapi").unwrap();
        assert_eq!(
            request_url(&base, "/wake_up"),
            "http://192.168.90.100/remoteapi/wake_up"
        );
    }

    #[test]
    fn test_request_url_host_only_base() {
        let base = Url::parse("http://192.168.90.100").unwrap();
        assert_eq!(
            request_url(&base, "/wake_up"),
            "http://192.168.90.100/wake_up"
        );
    }
}
