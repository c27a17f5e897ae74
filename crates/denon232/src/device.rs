//! Denon232 -- the host-facing handle for one configured receiver.
//!
//! A host (home automation bridge, CLI) owns one [`Denon232`] per configured
//! port. It holds the shared [`Receiver`] and a [`ZoneController`] per zone,
//! and passes them explicitly to whatever consumes them.

use std::sync::Arc;

use tracing::{debug, info};

use denon232_core::error::Result;
use denon232_core::transport::Connector;
use denon232_core::ZoneId;

use crate::builder::ReceiverBuilder;
use crate::receiver::Receiver;
use crate::sources::SourceMap;
use crate::zone::ZoneController;
use crate::zones::{ZoneProfile, main_zone, zone2};

/// Display name used when none is configured.
pub const DEFAULT_NAME: &str = "Denon Receiver";

/// Static identity of a device, for host registries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Serial port path.
    pub identifier: String,
    pub name: String,
    pub manufacturer: &'static str,
    pub model: &'static str,
}

/// One receiver and its zones.
#[derive(Debug)]
pub struct Denon232 {
    name: String,
    receiver: Arc<Receiver>,
    main: ZoneController,
    zone2: ZoneController,
}

impl Denon232 {
    /// Wrap an opened receiver with the default zone profiles.
    pub fn new(receiver: Receiver, name: &str) -> Self {
        Self::with_profiles(receiver, name, main_zone(), zone2())
    }

    pub fn with_profiles(
        receiver: Receiver,
        name: &str,
        main: ZoneProfile,
        zone2: ZoneProfile,
    ) -> Self {
        let receiver = Arc::new(receiver);
        Denon232 {
            name: name.to_string(),
            main: ZoneController::new(Arc::clone(&receiver), main),
            zone2: ZoneController::new(Arc::clone(&receiver), zone2),
            receiver,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            identifier: self.receiver.port_path().to_string(),
            name: self.name.clone(),
            manufacturer: "Denon",
            model: "AVR RS-232",
        }
    }

    pub fn receiver(&self) -> &Arc<Receiver> {
        &self.receiver
    }

    pub fn is_available(&self) -> bool {
        self.receiver.is_available()
    }

    pub fn main_zone(&self) -> &ZoneController {
        &self.main
    }

    pub fn zone2(&self) -> &ZoneController {
        &self.zone2
    }

    pub fn zone(&self, zone: ZoneId) -> &ZoneController {
        match zone {
            ZoneId::Main => &self.main,
            ZoneId::Zone2 => &self.zone2,
        }
    }

    pub fn zone_mut(&mut self, zone: ZoneId) -> &mut ZoneController {
        match zone {
            ZoneId::Main => &mut self.main,
            ZoneId::Zone2 => &mut self.zone2,
        }
    }

    /// Refresh both zones concurrently. The receiver serializes the
    /// underlying exchanges.
    pub async fn refresh_all(&mut self) {
        debug!(device = %self.name, "refreshing all zones");
        tokio::join!(self.main.refresh(), self.zone2.refresh());
    }

    /// Close the receiver link.
    pub async fn close(&self) {
        info!(device = %self.name, "closing device");
        self.receiver.close().await;
    }
}

/// Fluent builder for [`Denon232`].
///
/// ```no_run
/// use denon232::Denon232Builder;
///
/// # async fn example() -> denon232_core::Result<()> {
/// let mut device = Denon232Builder::new()
///     .name("Living Room")
///     .serial_port("/dev/ttyUSB0")
///     .build()
///     .await?;
/// device.refresh_all().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Denon232Builder {
    name: String,
    receiver: ReceiverBuilder,
    main_sources: Option<SourceMap>,
    zone2_sources: Option<SourceMap>,
}

impl Default for Denon232Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Denon232Builder {
    pub fn new() -> Self {
        Denon232Builder {
            name: DEFAULT_NAME.to_string(),
            receiver: ReceiverBuilder::new(),
            main_sources: None,
            zone2_sources: None,
        }
    }

    /// Set the display name (default: "Denon Receiver").
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set the serial port path.
    pub fn serial_port(mut self, port: &str) -> Self {
        self.receiver = self.receiver.serial_port(port);
        self
    }

    /// Replace the link configuration wholesale.
    pub fn receiver(mut self, receiver: ReceiverBuilder) -> Self {
        self.receiver = receiver;
        self
    }

    /// Replace the main zone source table.
    pub fn main_sources(mut self, sources: SourceMap) -> Self {
        self.main_sources = Some(sources);
        self
    }

    /// Replace the zone 2 source table.
    pub fn zone2_sources(mut self, sources: SourceMap) -> Self {
        self.zone2_sources = Some(sources);
        self
    }

    fn assemble(self, receiver: Receiver) -> Denon232 {
        let mut main = main_zone();
        if let Some(sources) = self.main_sources {
            main = main.with_sources(sources);
        }
        let mut second = zone2();
        if let Some(sources) = self.zone2_sources {
            second = second.with_sources(sources);
        }
        Denon232::with_profiles(receiver, &self.name, main, second)
    }

    /// Build on a serial port.
    pub async fn build(self) -> Result<Denon232> {
        let receiver = self.receiver.clone().build().await?;
        Ok(self.assemble(receiver))
    }

    /// Build with a caller-provided connector.
    pub async fn build_with_connector(self, connector: Box<dyn Connector>) -> Result<Denon232> {
        let receiver = self.receiver.clone().build_with_connector(connector).await?;
        Ok(self.assemble(receiver))
    }
}
