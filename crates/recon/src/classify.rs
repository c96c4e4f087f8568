//! Severity classification shared by both reconciliation checks.
//!
//! Severity depends only on the discrepancy magnitude, never on which check
//! produced it. Every comparison is strict: a discrepancy equal to a
//! threshold stays in the lower tier.

use crate::config::{SeverityBands, ToleranceConfig};
use crate::report::Severity;

/// Classify a discrepancy. Returns `None` when it is within tolerance.
pub fn classify_severity(
    discrepancy: i64,
    tolerance: &ToleranceConfig,
    bands: &SeverityBands,
) -> Option<Severity> {
    if discrepancy > bands.high_above {
        Some(Severity::High)
    } else if discrepancy > bands.medium_above {
        Some(Severity::Medium)
    } else if discrepancy > tolerance.discrepancy {
        Some(Severity::Low)
    } else {
        None
    }
}
