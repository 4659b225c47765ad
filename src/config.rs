//! Source configuration, parsed from the host framework's string option map.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::ConfigError;

/// Option key for the aggregation mode requested from upstream.
pub const OPTION_PER_MODE: &str = "per_mode";
/// Alternate spelling of [`OPTION_PER_MODE`] accepted for compatibility.
pub const OPTION_PER_MODE_ALT: &str = "perMode";
/// Option key for the polling interval (Go-style duration string).
pub const OPTION_POLLING_PERIOD: &str = "pollingPeriod";

/// Default polling interval when `pollingPeriod` is not supplied.
pub const DEFAULT_POLLING_PERIOD: Duration = Duration::from_secs(5 * 60);
/// Default aggregation mode when `per_mode` is not supplied.
pub const DEFAULT_PER_MODE: &str = "PerGame";

/// Immutable connector configuration. Built once at configure time and owned
/// exclusively by the source afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Aggregation mode requested from upstream (e.g. `PerGame`, `Totals`).
    pub per_mode: String,
    /// Minimum wall-clock spacing between consecutive fetches.
    pub polling_period: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            per_mode: DEFAULT_PER_MODE.to_string(),
            polling_period: DEFAULT_POLLING_PERIOD,
        }
    }
}

impl SourceConfig {
    /// Parse the host-supplied option map, applying defaults for absent keys.
    ///
    /// Unrecognized keys are rejected so that typos surface at startup
    /// instead of silently polling with defaults.
    pub fn from_options(options: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = SourceConfig::default();
        for (key, value) in options {
            match key.as_str() {
                OPTION_PER_MODE | OPTION_PER_MODE_ALT => {
                    config.per_mode = value.clone();
                }
                OPTION_POLLING_PERIOD => {
                    config.polling_period = parse_duration(value)?;
                }
                other => return Err(ConfigError::UnknownOption(other.to_string())),
            }
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.per_mode.is_empty() {
            return Err(ConfigError::EmptyPerMode);
        }
        // One millisecond is the smallest tick the limiter will schedule.
        if self.polling_period < Duration::from_millis(1) {
            return Err(ConfigError::NonPositivePeriod(self.polling_period));
        }
        Ok(())
    }
}

/// Parse a Go-style duration string (`30s`, `5m`, `1h30m`, `250ms`, `1.5h`).
///
/// This is the wire format the hosting framework hands over for duration
/// options, so the grammar matches what its config layer accepts.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let invalid = |detail: &str| ConfigError::InvalidDuration {
        value: s.to_string(),
        detail: detail.to_string(),
    };

    if s.is_empty() {
        return Err(invalid("empty string"));
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_end == 0 {
            return Err(invalid("expected a number"));
        }
        let (num, after) = rest.split_at(num_end);
        let value: f64 = num.parse().map_err(|_| invalid("invalid number"))?;

        let unit_end = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, next) = after.split_at(unit_end);
        let unit_secs = match unit {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            "" => return Err(invalid("missing unit (try 30s, 5m, 1h)")),
            _ => return Err(invalid("unknown unit")),
        };

        // Guard the Duration range: the host hands this string over verbatim,
        // so an absurd value must come back as a ConfigError, not a panic.
        let term = Duration::try_from_secs_f64(value * unit_secs)
            .map_err(|_| invalid("duration out of range"))?;
        total = total
            .checked_add(term)
            .ok_or_else(|| invalid("duration out of range"))?;
        rest = next;
    }

    Ok(total)
}
