use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPortType, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::SerialStream;

/// Default line speed.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default per-read blocking bound on an open port.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// How to open a serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Device path (`/dev/ttyUSB0`) or COM name (`COM17`).
    pub port: String,
    /// Line speed in baud. Default: 115200.
    pub baud_rate: u32,
    /// Maximum time a single read blocks. Default: 100 ms.
    pub read_timeout: Duration,
}

impl LinkConfig {
    /// Link settings for `port` with default speed and read timeout.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl SerialStream {
    /// Open the port described by `config` as 8N1 with no flow control.
    pub fn open(config: &LinkConfig) -> Result<Self> {
        let port = serialport::new(config.port.as_str(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| TransportError::Open {
                port: config.port.clone(),
                baud_rate: config.baud_rate,
                source,
            })?;

        info!(port = %config.port, baud = config.baud_rate, "opened serial port");
        Ok(Self::from_port(port, config.port.clone()))
    }
}

/// A serial port discovered on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    /// `usb`, `pci`, `bluetooth` or `unknown`.
    pub kind: &'static str,
    /// USB product/manufacturer string when available.
    pub description: Option<String>,
}

/// List the serial ports present on this host.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(TransportError::Enumerate)?;
    debug!(count = ports.len(), "enumerated serial ports");

    Ok(ports
        .into_iter()
        .map(|info| {
            let (kind, description) = match info.port_type {
                SerialPortType::UsbPort(usb) => (
                    "usb",
                    Some(usb_description(
                        usb.vid,
                        usb.pid,
                        usb.manufacturer.as_deref(),
                        usb.product.as_deref(),
                    )),
                ),
                SerialPortType::PciPort => ("pci", None),
                SerialPortType::BluetoothPort => ("bluetooth", None),
                SerialPortType::Unknown => ("unknown", None),
            };
            PortInfo {
                name: info.port_name,
                kind,
                description,
            }
        })
        .collect())
}

fn usb_description(vid: u16, pid: u16, manufacturer: Option<&str>, product: Option<&str>) -> String {
    let ids = format!("{vid:04x}:{pid:04x}");
    match (manufacturer, product) {
        (Some(m), Some(p)) => format!("{ids} {m} {p}"),
        (Some(s), None) | (None, Some(s)) => format!("{ids} {s}"),
        (None, None) => ids,
    }
}
