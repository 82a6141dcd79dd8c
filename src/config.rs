//! Configuration Module
//!
//! Engine settings (`CacheConfig`) and host settings (`Config`), the latter
//! loaded from environment variables.

use std::env;
use std::time::Duration;

/// Default tick interval (100 ms)
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Smallest accepted tick interval
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

// == Shutdown Mode ==
/// What `end()` does while TTLs are still counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownMode {
    /// Enter the ending state and close once the last TTL drains
    #[default]
    Drain,
    /// Behave exactly like `stop()`
    Immediate,
}

// == Start Mode ==
/// When `start()` is allowed to open the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartMode {
    /// Open right away
    #[default]
    Immediate,
    /// Wait until the event loop reports itself running
    WhenLoopRunning,
}

// == Cache Config ==
/// Engine settings.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tick_cache::config::{CacheConfig, ShutdownMode};
///
/// let config = CacheConfig::default()
///     .with_tick_interval(Duration::from_millis(50))
///     .with_shutdown(ShutdownMode::Immediate);
/// assert_eq!(config.tick_interval, Duration::from_millis(50));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Period of the TTL countdown; also the expiry resolution
    pub tick_interval: Duration,
    /// Graceful drain or immediate stop on `end()`
    pub shutdown: ShutdownMode,
    /// Whether `start()` waits for the event loop
    pub start: StartMode,
    /// Whether JSON object values may be stored
    pub accept_objects: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            shutdown: ShutdownMode::Drain,
            start: StartMode::Immediate,
            accept_objects: true,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tick interval, clamped to `MIN_TICK_INTERVAL`.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval.max(MIN_TICK_INTERVAL);
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownMode) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn with_start(mut self, start: StartMode) -> Self {
        self.start = start;
        self
    }

    pub fn with_accept_objects(mut self, accept: bool) -> Self {
        self.accept_objects = accept;
        self
    }

    /// Re-applies the bounds the builders enforce, for configs built as
    /// struct literals or mutated field by field.
    pub fn normalized(mut self) -> Self {
        self.tick_interval = self.tick_interval.max(MIN_TICK_INTERVAL);
        self
    }
}

/// Host configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Engine settings
    pub cache: CacheConfig,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TICK_INTERVAL_MS` - Tick interval in milliseconds (default: 100)
    /// - `CACHE_SHUTDOWN` - `drain` or `immediate` (default: drain)
    /// - `CACHE_DEFERRED_START` - Wait for the loop before opening (default: false)
    /// - `CACHE_ACCEPT_OBJECTS` - Allow JSON object values (default: true)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let tick_interval = env::var("CACHE_TICK_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TICK_INTERVAL);

        let shutdown = match env::var("CACHE_SHUTDOWN").ok().as_deref() {
            Some("immediate") => ShutdownMode::Immediate,
            _ => ShutdownMode::Drain,
        };

        let start = if parse_flag("CACHE_DEFERRED_START").unwrap_or(false) {
            StartMode::WhenLoopRunning
        } else {
            StartMode::Immediate
        };

        Self {
            cache: CacheConfig::default()
                .with_tick_interval(tick_interval)
                .with_shutdown(shutdown)
                .with_start(start)
                .with_accept_objects(parse_flag("CACHE_ACCEPT_OBJECTS").unwrap_or(true)),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            server_port: 3000,
        }
    }
}

fn parse_flag(name: &str) -> Option<bool> {
    match env::var(name).ok()?.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
