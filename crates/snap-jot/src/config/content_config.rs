use snap_jot_core::{AudioBitrateMode, ContentOptions};

use serde::{Deserialize, Serialize};

/// Audio bit-rate mode as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitrateModeKind {
    /// Constant bit rate.
    #[default]
    Constant,
    /// Variable bit rate.
    Variable,
}

impl From<BitrateModeKind> for AudioBitrateMode {
    fn from(kind: BitrateModeKind) -> Self {
        match kind {
            BitrateModeKind::Constant => AudioBitrateMode::Constant,
            BitrateModeKind::Variable => AudioBitrateMode::Variable,
        }
    }
}

/// Codec settings passed through to the capture driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Container and codec string.
    pub mime_type: String,
    /// Target total bit rate in bits per second.
    pub bits_per_second: u32,
    /// Audio bit-rate mode.
    #[serde(default)]
    pub audio_bitrate_mode: BitrateModeKind,
}

impl Default for ContentConfig {
    fn default() -> Self {
        let options = ContentOptions::default();
        Self {
            mime_type: options.mime_type,
            bits_per_second: options.bits_per_second,
            audio_bitrate_mode: BitrateModeKind::Constant,
        }
    }
}

impl From<&ContentConfig> for ContentOptions {
    fn from(config: &ContentConfig) -> Self {
        ContentOptions {
            mime_type: config.mime_type.clone(),
            bits_per_second: config.bits_per_second,
            audio_bitrate_mode: config.audio_bitrate_mode.into(),
        }
    }
}
