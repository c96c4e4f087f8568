use serde::Deserialize;

use crate::error::ReconError;
use crate::report::Severity;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReconConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub currency: CurrencyConfig,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    #[serde(default)]
    pub severity: SeverityBands,
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// Currency of every amount in the snapshot.
///
/// `minor_digits` scales decimal inputs into integer minor units: with
/// `minor_digits = 2`, `"12.50"` becomes `1250`. Thresholds below are in
/// the same minor units.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyConfig {
    #[serde(default = "default_currency_code")]
    pub code: String,
    #[serde(default)]
    pub minor_digits: u32,
}

fn default_currency_code() -> String {
    "XAF".into()
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            code: default_currency_code(),
            minor_digits: 0,
        }
    }
}

/// Largest supported `minor_digits`.
pub const MAX_MINOR_DIGITS: u32 = 4;

// ---------------------------------------------------------------------------
// Tolerance + severity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ToleranceConfig {
    /// Discrepancies at or below this value never produce an irregularity.
    #[serde(default = "default_discrepancy")]
    pub discrepancy: i64,
}

fn default_discrepancy() -> i64 {
    1000
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            discrepancy: default_discrepancy(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeverityBands {
    #[serde(default = "default_medium_above")]
    pub medium_above: i64,
    #[serde(default = "default_high_above")]
    pub high_above: i64,
}

fn default_medium_above() -> i64 {
    5000
}

fn default_high_above() -> i64 {
    10000
}

impl Default for SeverityBands {
    fn default() -> Self {
        Self {
            medium_above: default_medium_above(),
            high_above: default_high_above(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.currency.code.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "currency.code must not be empty".into(),
            ));
        }

        if self.currency.minor_digits > MAX_MINOR_DIGITS {
            return Err(ReconError::ConfigValidation(format!(
                "currency.minor_digits must be at most {MAX_MINOR_DIGITS}, got {}",
                self.currency.minor_digits
            )));
        }

        let tolerance = self.tolerance.discrepancy;
        if tolerance < 0 {
            return Err(ReconError::ConfigValidation(format!(
                "tolerance.discrepancy must be non-negative, got {tolerance}"
            )));
        }

        let bands = &self.severity;
        if bands.medium_above < tolerance {
            return Err(ReconError::ConfigValidation(format!(
                "severity.medium_above ({}) must not be below tolerance.discrepancy ({tolerance})",
                bands.medium_above
            )));
        }
        if bands.high_above < bands.medium_above {
            return Err(ReconError::ConfigValidation(format!(
                "severity.high_above ({}) must not be below severity.medium_above ({})",
                bands.high_above, bands.medium_above
            )));
        }

        Ok(())
    }

    /// Classify a discrepancy magnitude. `None` means within tolerance.
    pub fn severity_for(&self, discrepancy: i64) -> Option<Severity> {
        crate::classify::classify_severity(discrepancy, &self.tolerance, &self.severity)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
