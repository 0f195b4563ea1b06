//! Vehicle record and its named operations

use serde_json::{Map, Value};
use tracing::instrument;

use crate::client::Transport;
use crate::error::{ClientError, Result};

/// One vehicle's attribute set, with operations that delegate all transport
/// to the owning [`Connection`](crate::Connection).
///
/// There are three primary operations: [`wake_up`](Vehicle::wake_up),
/// [`data_request`](Vehicle::data_request) and [`command`](Vehicle::command).
/// `data_request` and `command` take the endpoint or command name as
/// published by the remote API.
#[derive(Debug, Clone)]
pub struct Vehicle {
    transport: Transport,
    /// VIN, mirrored from the connection at construction.
    pub vin: String,
    /// Human-readable name, from the `GUI_vehicleName` debug variable.
    pub display_name: String,
    /// Free-form state string; `"online"` and `"asleep"` are the documented
    /// values.
    pub state: String,
    /// Vehicle identifier used in per-vehicle request paths. Not discovered
    /// automatically; per-vehicle operations fail until a caller sets it.
    pub id: Option<u64>,
    attrs: Map<String, Value>,
}

impl Vehicle {
    pub(crate) fn new(transport: Transport, vin: String) -> Self {
        Self {
            transport,
            vin,
            display_name: String::new(),
            state: String::new(),
            id: None,
            attrs: Map::new(),
        }
    }

    /// Look up a dynamic API field not covered by the explicit fields.
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// Store a dynamic API field.
    pub fn set_attr(&mut self, name: impl Into<String>, value: Value) {
        self.attrs.insert(name.into(), value);
    }

    /// Fetch one telemetry endpoint and return its sub-object.
    #[instrument(skip(self))]
    pub async fn data_request(&self, name: &str) -> Result<Value> {
        let result = self
            .transport
            .get(&format!("vehicle_data?endpoints={}", name))
            .await?;
        result
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::MissingField(name.to_string()))
    }

    /// Wake the vehicle.
    #[instrument(skip(self))]
    pub async fn wake_up(&self) -> Result<Value> {
        self.post("wake_up", None).await
    }

    /// Run a named command for the vehicle.
    #[instrument(skip(self, data))]
    pub async fn command(&self, name: &str, data: Option<Value>) -> Result<Value> {
        self.post(&format!("command/{}", name), data).await
    }

    /// Get data from a per-vehicle path on the remote API.
    #[instrument(skip(self))]
    pub async fn get(&self, command: &str) -> Result<Value> {
        self.transport
            .get(&format!("vehicles/{}/{}", self.require_id()?, command))
            .await
    }

    /// Post data to a per-vehicle path on the remote API.
    #[instrument(skip(self, data))]
    pub async fn post(&self, command: &str, data: Option<Value>) -> Result<Value> {
        self.transport
            .post(&format!("vehicles/{}/{}", self.require_id()?, command), data)
            .await
    }

    fn require_id(&self) -> Result<u64> {
        self.id
            .ok_or_else(|| ClientError::MissingField("id".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_vehicle() -> Vehicle {
        let transport = Transport::new("http://127.0.0.1:1", "http://127.0.0.1:1", None).unwrap();
        Vehicle::new(transport, "5YJSA1CE1234567".to_string())
    }

    #[test]
    fn test_attrs_separate_from_fields() {
        let mut vehicle = test_vehicle();
        assert!(vehicle.attr("color").is_none());

        vehicle.set_attr("color", Value::String("red".into()));
        assert_eq!(vehicle.attr("color"), Some(&Value::String("red".into())));
        assert_eq!(vehicle.vin, "5YJSA1CE1234567");
    }

    #[tokio::test]
    async fn test_per_vehicle_ops_require_id() {
        let vehicle = test_vehicle();

        // Fails before any network traffic: no id has been set.
        let result = vehicle.wake_up().await;
        assert!(matches!(result, Err(ClientError::MissingField(field)) if field == "id"));
    }
}
