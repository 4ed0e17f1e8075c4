use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Deserialize, Clone)]
pub struct ConsumerConfig {
    /// How long a client-initiated cancel waits for the server's
    /// confirmation before giving up (non-fatally).
    #[serde(default = "default_cancellation_timeout_ms")]
    pub cancellation_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BufferConfig {
    /// Outstanding items a delivery buffer can hold; clamped to at least 2
    /// so one delivery plus the end-of-stream marker always fit.
    #[serde(default = "default_buffer_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub consumer: ConsumerConfig,
    #[serde(default)]
    pub buffer: BufferConfig,
}

fn default_cancellation_timeout_ms() -> u64 {
    1000
}

fn default_buffer_capacity() -> usize {
    2
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            cancellation_timeout_ms: default_cancellation_timeout_ms(),
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: default_buffer_capacity(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            consumer: ConsumerConfig::default(),
            buffer: BufferConfig::default(),
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, anyhow::Error> {
    let raw: String = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&raw)?;
    Ok(config)
}
