use std::fmt;

/// 1 Kbps, in bits per second.
pub const KBPS: u32 = 1024;

/// Bit-rate mode requested for the audio track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioBitrateMode {
    /// Constant bit rate.
    #[default]
    Constant,
    /// Variable bit rate.
    Variable,
}

impl AudioBitrateMode {
    /// Lowercase name, as used in configuration files.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Variable => "variable",
        }
    }
}

impl fmt::Display for AudioBitrateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Codec and bit-rate settings handed to the driver.
///
/// These are pass-through values: the engine never inspects the payload, so
/// a driver is free to ignore what it cannot honour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentOptions {
    /// Container and codec string.
    pub mime_type: String,
    /// Target total bit rate.
    pub bits_per_second: u32,
    /// Audio bit-rate mode.
    pub audio_bitrate_mode: AudioBitrateMode,
}

impl Default for ContentOptions {
    fn default() -> Self {
        Self {
            mime_type: r#"video/webm; codecs="av01.2.19H.12.0.000.09.16.09.1, opus""#.to_string(),
            bits_per_second: 1500 * KBPS,
            audio_bitrate_mode: AudioBitrateMode::Constant,
        }
    }
}
