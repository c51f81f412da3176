//! Simulated request latency.

use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

/// How long each store operation waits before running.
///
/// Mirrors the timing of a remote API so screens exercise their loading
/// states. Use `Latency::None` in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Latency {
    None,
    Fixed(Duration),
    /// `base` plus a uniformly random extra in `[0, spread)`.
    Jitter { base: Duration, spread: Duration },
}

impl Default for Latency {
    fn default() -> Self {
        Latency::Jitter {
            base: Duration::from_millis(300),
            spread: Duration::from_millis(200),
        }
    }
}

impl Latency {
    pub fn none() -> Self {
        Latency::None
    }

    /// Sample the delay for one operation.
    pub fn sample(&self) -> Duration {
        match *self {
            Latency::None => Duration::ZERO,
            Latency::Fixed(delay) => delay,
            Latency::Jitter { base, spread } => {
                let spread_micros = spread.as_micros() as u64;
                if spread_micros == 0 {
                    return base;
                }
                let extra = rand::rng().random_range(0..spread_micros);
                base + Duration::from_micros(extra)
            }
        }
    }

    /// Sleep for one sampled delay.
    pub async fn wait(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// `[latency]` config section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LatencyConfig {
    #[serde(default = "default_mode")]
    pub mode: LatencyMode,

    #[serde(default = "default_base_ms")]
    pub base_ms: u64,

    #[serde(default = "default_spread_ms")]
    pub spread_ms: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LatencyMode {
    None,
    Fixed,
    Jitter,
}

fn default_mode() -> LatencyMode {
    LatencyMode::Jitter
}

fn default_base_ms() -> u64 {
    300
}

fn default_spread_ms() -> u64 {
    200
}

impl Default for LatencyConfig {
    fn default() -> Self {
        LatencyConfig {
            mode: default_mode(),
            base_ms: default_base_ms(),
            spread_ms: default_spread_ms(),
        }
    }
}

impl From<&LatencyConfig> for Latency {
    fn from(config: &LatencyConfig) -> Self {
        match config.mode {
            LatencyMode::None => Latency::None,
            LatencyMode::Fixed => Latency::Fixed(Duration::from_millis(config.base_ms)),
            LatencyMode::Jitter => Latency::Jitter {
                base: Duration::from_millis(config.base_ms),
                spread: Duration::from_millis(config.spread_ms),
            },
        }
    }
}
