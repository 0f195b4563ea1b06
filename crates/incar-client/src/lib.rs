//! incar-client - HTTP client for the in-car remote API
//!
//! A thin typed binding for the vehicle's local HTTP control interface:
//! the remote API (commands and telemetry, authenticated with a VIN header)
//! and the debug service (read-only named internal variables).
//!
//! # Example
//!
//! ```rust,no_run
//! use incar_client::Connection;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut conn = Connection::connect(
//!         "http://192.168.90.100/remoteapi",
//!         "http://192.168.90.100/debugsvc",
//!         Some("5YJSA1CE1234567"),
//!     )
//!     .await?;
//!
//!     // Per-vehicle paths need the vehicle id; the API does not publish it.
//!     conn.vehicles[0].id = Some(1);
//!
//!     conn.vehicles[0].wake_up().await?;
//!     let charge = conn.vehicles[0].data_request("charge_state").await?;
//!     println!("{charge}");
//!     conn.vehicles[0].command("charge_start", Some(json!({}))).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! The `testing` module provides mock services and a server harness:
//!
//! ```rust,ignore
//! use incar_client::testing::{debug_service_router, TestServer};
//!
//! let (router, log) = debug_service_router(values);
//! let server = TestServer::start(router).await?;
//! ```

mod client;
mod error;
pub mod testing;
mod vehicle;

pub use client::{Connection, PLACEHOLDER_VIN, VIN_HEADER};
pub use error::{ClientError, Result};
pub use vehicle::Vehicle;
