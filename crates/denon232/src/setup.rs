//! Setup-time validation of a receiver configuration.
//!
//! Runs once, before a device is built for steady-state use, and is the only
//! place a bad port path is reported as an error. Steady-state code reports
//! the same condition through the availability flag instead.

use std::path::Path;

use tracing::{info, warn};

use denon232_core::error::{Error, Result};
use denon232_core::transport::Connector;
use denon232_transport::{SerialConfig, SerialConnector};

use crate::device::DEFAULT_NAME;

/// Configuration submitted for a new receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupRequest {
    /// Display name; empty means [`DEFAULT_NAME`].
    pub name: String,
    /// Serial device path.
    pub serial_port: String,
    /// Accept the port without opening it (e.g. hardware not yet attached).
    pub skip_test: bool,
}

impl SetupRequest {
    pub fn new(serial_port: &str) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            serial_port: serial_port.to_string(),
            skip_test: false,
        }
    }
}

/// Accepted configuration, ready to persist. The skip flag is not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupEntry {
    pub title: String,
    pub name: String,
    pub serial_port: String,
}

/// Check that `port` exists and can be opened with the receiver's serial
/// settings. The port is closed again before returning.
pub async fn validate_serial_port(port: &str) -> Result<()> {
    if !Path::new(port).exists() {
        return Err(Error::CannotConnect {
            port: port.to_string(),
            reason: "port does not exist".into(),
        });
    }
    validate_connector(&SerialConnector::new(port, SerialConfig::default())).await
}

/// Open and close a channel through `connector`.
pub async fn validate_connector(connector: &dyn Connector) -> Result<()> {
    let port = connector.describe().to_string();
    let mut transport = connector
        .connect()
        .await
        .map_err(|e| Error::CannotConnect {
            port: port.clone(),
            reason: e.to_string(),
        })?;
    if let Err(e) = transport.close().await {
        warn!(port = %port, error = %e, "error closing port after validation");
    }
    Ok(())
}

/// Validate a setup request and produce the entry to persist.
pub async fn validate_setup(request: &SetupRequest) -> Result<SetupEntry> {
    let serial_port = request.serial_port.trim();
    if serial_port.is_empty() {
        return Err(Error::InvalidParameter("serial_port is required".into()));
    }

    if request.skip_test {
        warn!(port = %serial_port, "skipping serial port validation");
    } else {
        validate_serial_port(serial_port).await?;
        info!(port = %serial_port, "serial port validated");
    }

    Ok(entry_for(request, serial_port))
}

fn entry_for(request: &SetupRequest, serial_port: &str) -> SetupEntry {
    let name = match request.name.trim() {
        "" => DEFAULT_NAME,
        name => name,
    };
    SetupEntry {
        title: name.to_string(),
        name: name.to_string(),
        serial_port: serial_port.to_string(),
    }
}
