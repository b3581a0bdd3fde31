//! Device identity, limits and buffer sizes.

/// Largest checksummed frame accepted from the host.
pub const COMMAND_CAPACITY: usize = 32;

/// Largest reply payload.
pub const RESPONSE_DATA_CAPACITY: usize = 40;

/// Largest rendered reply frame.
pub const RESPONSE_FRAME_CAPACITY: usize = RESPONSE_DATA_CAPACITY + 8;

/// Largest streaming payload kept.
pub const STREAM_PAYLOAD_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub device_family: u8,
    pub device_id: u8,
    /// major, minor, subminor, build
    pub firmware_version: [u8; 4],
    pub device_name: &'static str,
    pub max_baud: u32,
    /// Analog input reference in microvolts.
    pub ai_reference_uv: u32,
    pub ai_resolution: u8,
    /// Channels of the sequenced analog input, numbered from 1.
    pub ai_channels: u8,
    pub qe_resolution: u8,
    /// PWM period in counts, full duty maps onto it.
    pub pwm_period: u32,
    /// Digital channels as `port * 10 + pin`.
    pub digital_channels: &'static [u8],
    /// Ticks to wait for the host to configure the debug link.
    pub enumeration_ticks: u32,
    /// Ticks a reply may take to leave.
    pub reply_ticks: u32,
    /// Ticks of silence before a partial streaming transfer is dropped.
    pub stall_ticks: u32,
}

const DIGITAL_CHANNELS: [u8; 40] = [
    20, 21, 22, 23, 24, 25, 26, 27, //
    40, 41, 42, 43, 44, 45, 46, 47, //
    50, 51, 52, 53, 54, 55, 56, 57, //
    60, 61, 62, 63, 64, 65, 66, 67, //
    120, 121, 122, 123, 124, 125, 126, 127,
];

impl EngineConfig {
    pub const DEFAULT: Self = Self {
        device_family: 0xff,
        device_id: 0x00,
        firmware_version: [0, 0, 0, 0],
        device_name: "RPiSoC",
        max_baud: 9600,
        ai_reference_uv: 5_000_000,
        ai_resolution: 12,
        ai_channels: 10,
        qe_resolution: 16,
        pwm_period: 60_000,
        digital_channels: &DIGITAL_CHANNELS,
        enumeration_ticks: 1000,
        reply_ticks: 100,
        stall_ticks: 100,
    };
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
