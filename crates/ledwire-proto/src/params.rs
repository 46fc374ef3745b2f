//! Serial port parameters.
//!
//! Defaults describe the LED controller board: 9600 8N1, no flow control,
//! text replies, every interface of the device opened.

use crate::errors::{ProtocolError, Result};

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataBits {
    /// 5 bits.
    Five,
    /// 6 bits.
    Six,
    /// 7 bits.
    Seven,
    /// 8 bits.
    #[default]
    Eight,
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StopBits {
    /// One stop bit.
    #[default]
    One,
    /// One and a half stop bits.
    OnePointFive,
    /// Two stop bits.
    Two,
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Parity {
    /// No parity bit.
    #[default]
    None,
    /// Odd parity.
    Odd,
    /// Even parity.
    Even,
    /// Parity bit always 1.
    Mark,
    /// Parity bit always 0.
    Space,
}

/// Flow control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlowControl {
    /// No flow control.
    #[default]
    Off,
    /// RTS/CTS.
    RtsCts,
    /// DSR/DTR.
    DsrDtr,
    /// XON/XOFF.
    XonXoff,
}

/// USB-serial driver family. `Auto` lets the transport probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DriverType {
    /// Probe the device.
    #[default]
    Auto,
    /// CDC-ACM class driver.
    CdcAcm,
    /// Silicon Labs CP210x.
    Cp21xx,
    /// FTDI.
    Ftdi,
    /// Prolific PL2303.
    Prolific,
    /// WCH CH34x.
    Ch34x,
}

/// Which interface of a device to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PortInterface {
    /// Every interface the device exposes.
    #[default]
    All,
    /// A single interface by index.
    Index(u16),
}

impl PortInterface {
    /// Numeric form used by USB-serial libraries; `All` is `-1`.
    pub const fn as_raw(self) -> i32 {
        match self {
            Self::All => -1,
            Self::Index(index) => index as i32,
        }
    }
}

/// How inbound data is surfaced by the transport.
///
/// Only `Utf8` can be framed into lines; `Hex` is raw output for callers that
/// consume chunks themselves and is refused by [`SerialParams::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReturnedDataType {
    /// UTF-8 text.
    #[default]
    Utf8,
    /// Hex-encoded bytes.
    Hex,
}

/// Whether the transport reads on its own thread or on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReadMode {
    /// Data is pushed as notifications.
    #[default]
    Async,
    /// Data is read on demand.
    Sync,
}

/// Complete port configuration handed to the transport on connect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SerialParams {
    /// Line speed in bits per second.
    pub baud_rate: u32,
    /// Data bits.
    pub data_bits: DataBits,
    /// Stop bits.
    pub stop_bits: StopBits,
    /// Parity.
    pub parity: Parity,
    /// Flow control.
    pub flow_control: FlowControl,
    /// Driver family.
    pub driver: DriverType,
    /// Interface selection.
    pub port_interface: PortInterface,
    /// Inbound data representation.
    pub returned_data_type: ReturnedDataType,
    /// Read mode.
    pub mode: ReadMode,
    /// Connect as soon as a device is attached.
    pub auto_connect: bool,
}

impl SerialParams {
    /// Default baud rate of the LED controller.
    pub const DEFAULT_BAUD_RATE: u32 = 9600;

    /// Same parameters with a different baud rate.
    #[must_use]
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Reject parameters no port can be opened with, or whose replies could
    /// never be split into lines.
    pub fn validate(&self) -> Result<()> {
        if self.baud_rate == 0 {
            return Err(ProtocolError::InvalidBaudRate(self.baud_rate));
        }
        if self.returned_data_type != ReturnedDataType::Utf8 {
            return Err(ProtocolError::UnframedDataType(self.returned_data_type));
        }
        Ok(())
    }
}

impl Default for SerialParams {
    fn default() -> Self {
        Self {
            baud_rate: Self::DEFAULT_BAUD_RATE,
            data_bits: DataBits::default(),
            stop_bits: StopBits::default(),
            parity: Parity::default(),
            flow_control: FlowControl::default(),
            driver: DriverType::default(),
            port_interface: PortInterface::default(),
            returned_data_type: ReturnedDataType::default(),
            mode: ReadMode::default(),
            auto_connect: false,
        }
    }
}
