//! Unified error types for the Thermowatch firmware.
//!
//! A single `Error` enum that every subsystem converts into, so boot and
//! the main loop handle failures uniformly.  All variants are `Copy` so they
//! can be carried through the outbound event stream without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The driver behind a device handle reports not-ready.
    DeviceNotReady(&'static str),
    /// A raw bus transfer failed outside any more specific step.
    Bus(BusError),
    /// GPIO or sensor attribute configuration failed.
    Config(ConfigError),
    /// The identity EEPROM could not be read or decoded.
    SerialDecode(SerialDecodeError),
    /// A sampling cycle failed.
    Sample(SampleError),
    /// The hardware watchdog could not be armed.
    Watchdog(WatchdogError),
    /// Registry construction or lookup failed.
    Registry(RegistryError),
    /// A steady-state operation was attempted before boot reached `Ready`.
    NotBooted,
    /// The boot sequence is one-shot and has already run.
    AlreadyBooted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceNotReady(name) => write!(f, "{name}: device not ready"),
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::SerialDecode(e) => write!(f, "serial: {e}"),
            Self::Sample(e) => write!(f, "sample: {e}"),
            Self::Watchdog(e) => write!(f, "watchdog: {e}"),
            Self::Registry(e) => write!(f, "registry: {e}"),
            Self::NotBooted => write!(f, "controller not booted"),
            Self::AlreadyBooted => write!(f, "boot sequence already ran"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Target did not acknowledge its address or a data byte.
    Nack,
    /// Lost arbitration on a multi-master bus.
    ArbitrationLoss,
    /// Electrical / protocol level bus fault.
    Bus,
    /// The driver holds no sample to hand out (no fetch yet).
    NoData,
    /// Anything else; carries the raw driver return code when known.
    Other(i32),
}

impl BusError {
    /// Classify an `embedded-hal` I2C error.
    pub fn from_i2c<E: embedded_hal::i2c::Error>(err: &E) -> Self {
        use embedded_hal::i2c::ErrorKind;
        match err.kind() {
            ErrorKind::NoAcknowledge(_) => Self::Nack,
            ErrorKind::ArbitrationLoss => Self::ArbitrationLoss,
            ErrorKind::Bus => Self::Bus,
            _ => Self::Other(-1),
        }
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nack => write!(f, "no acknowledge"),
            Self::ArbitrationLoss => write!(f, "arbitration lost"),
            Self::Bus => write!(f, "bus fault"),
            Self::NoData => write!(f, "no sample data"),
            Self::Other(rc) => write!(f, "driver error (rc={rc})"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

/// Raw GPIO driver failure (ESP-IDF `esp_err_t` on target).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioError(pub i32);

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO driver error (rc={})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Alert pin could not be switched to input.
    PinDirection(GpioError),
    /// Falling-edge interrupt could not be configured on the alert pin.
    PinInterrupt(GpioError),
    /// Alert callback could not be attached to the pin.
    CallbackRegistration(GpioError),
    /// Reading the sensor configuration attribute failed.
    AttributeRead(BusError),
    /// Writing the sensor configuration attribute failed.
    AttributeWrite(BusError),
    /// Static configuration values are unusable.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinDirection(e) => write!(f, "alert pin direction: {e}"),
            Self::PinInterrupt(e) => write!(f, "alert pin interrupt: {e}"),
            Self::CallbackRegistration(e) => write!(f, "alert callback: {e}"),
            Self::AttributeRead(e) => write!(f, "attribute read: {e}"),
            Self::AttributeWrite(e) => write!(f, "attribute write: {e}"),
            Self::Invalid(msg) => write!(f, "invalid: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Serial-number decode errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialDecodeError {
    /// The EEPROM block read failed.
    ReadFailed(BusError),
    /// Source block or destination buffer is too short.
    BufferTooSmall { needed: usize, got: usize },
    /// Decoded text is not valid UTF-8.
    InvalidText,
}

impl fmt::Display for SerialDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed(e) => write!(f, "EEPROM read failed: {e}"),
            Self::BufferTooSmall { needed, got } => {
                write!(f, "buffer too small (need {needed}, got {got})")
            }
            Self::InvalidText => write!(f, "decoded serial is not valid text"),
        }
    }
}

impl From<SerialDecodeError> for Error {
    fn from(e: SerialDecodeError) -> Self {
        Self::SerialDecode(e)
    }
}

// ---------------------------------------------------------------------------
// Sampling errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleError {
    /// Endpoint never completed configuration.
    NotConfigured,
    /// Phase 1: the sample fetch failed.
    FetchFailed(BusError),
    /// Phase 2: reading the ambient-temperature channel failed.
    ReadFailed(BusError),
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "endpoint not configured"),
            Self::FetchFailed(e) => write!(f, "fetch failed: {e}"),
            Self::ReadFailed(e) => write!(f, "channel read failed: {e}"),
        }
    }
}

impl From<SampleError> for Error {
    fn from(e: SampleError) -> Self {
        Self::Sample(e)
    }
}

// ---------------------------------------------------------------------------
// Watchdog errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogError {
    /// No liveness channel could be allocated.
    ChannelAllocation(i32),
    /// The watchdog refused to start.
    Start(i32),
}

impl fmt::Display for WatchdogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelAllocation(rc) => write!(f, "channel allocation failed (rc={rc})"),
            Self::Start(rc) => write!(f, "start failed (rc={rc})"),
        }
    }
}

impl From<WatchdogError> for Error {
    fn from(e: WatchdogError) -> Self {
        Self::Watchdog(e)
    }
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// No endpoint owns the requested event bit.
    NotFound,
    /// More endpoints than event bits.
    Full,
    /// The alert event set was built for a different all-sensors mask.
    MaskMismatch { registry: u32, events: u32 },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "no endpoint owns that event bit"),
            Self::Full => write!(f, "registry full"),
            Self::MaskMismatch { registry, events } => write!(
                f,
                "event mask mismatch (registry=0x{registry:08x}, events=0x{events:08x})"
            ),
        }
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
