use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::SessionError;

/// Immutable parameters of one capture session. Every derived buffer is
/// sized from these once, at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub sample_rate: u32,
    pub frames_per_block: usize,
    pub channels: usize,
    pub bands: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            frames_per_block: default_frames_per_block(),
            channels: default_channels(),
            bands: default_bands(),
        }
    }
}

impl SessionConfig {
    /// Interleaved samples in one block
    pub fn block_len(&self) -> usize {
        self.frames_per_block * self.channels
    }

    /// Same session with the channel count the device actually granted
    pub fn with_channels(self, channels: usize) -> Self {
        Self { channels, ..self }
    }

    /// Seconds of audio covered by one block
    pub fn block_duration_secs(&self) -> f32 {
        self.frames_per_block as f32 / self.sample_rate as f32
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.sample_rate == 0 {
            return Err(SessionError::InvalidConfig("sample rate must be > 0".into()));
        }
        if self.frames_per_block < 4 || self.frames_per_block % 2 != 0 {
            return Err(SessionError::InvalidConfig(format!(
                "frames per block must be an even number >= 4, got {}",
                self.frames_per_block
            )));
        }
        if !(1..=2).contains(&self.channels) {
            return Err(SessionError::InvalidConfig(format!(
                "only mono or stereo capture is supported, got {} channels",
                self.channels
            )));
        }
        if self.bands == 0 {
            return Err(SessionError::InvalidConfig("band count must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_frames_per_block")]
    pub frames_per_block: usize,
    #[serde(default = "default_channels")]
    pub channels: usize,
    #[serde(default = "default_bands")]
    pub bands: usize,
}

#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            frames_per_block: default_frames_per_block(),
            channels: default_channels(),
            bands: default_bands(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { fps: default_fps() }
    }
}

impl From<&AudioConfig> for SessionConfig {
    fn from(audio: &AudioConfig) -> Self {
        Self {
            sample_rate: audio.sample_rate,
            frames_per_block: audio.frames_per_block,
            channels: audio.channels,
            bands: audio.bands,
        }
    }
}

pub fn default_sample_rate() -> u32 { 44100 }
pub fn default_frames_per_block() -> usize { 1024 }
pub fn default_channels() -> usize { 2 }
pub fn default_bands() -> usize { 64 }
pub fn default_fps() -> u32 { 30 }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// `bandscope.toml` in the working directory, then the per-user config dir
pub fn find_config() -> Option<PathBuf> {
    let local = PathBuf::from("bandscope.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("bandscope").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("bandscope").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
