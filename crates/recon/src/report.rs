//! Derived report records. Plain data, serialized for the presentation layer.
//!
//! Every amount is in integer minor units of the configured currency.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::model::{DemandStatus, Id};

// ---------------------------------------------------------------------------
// Irregularities
// ---------------------------------------------------------------------------

/// Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!(
                "unknown severity \"{other}\" (expected low, medium or high)"
            )),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IrregularityKind {
    /// Opening amount differs from the predecessor session's closing amount.
    SessionGap,
    /// Declared closing amount differs from opening + payments - expenses.
    OpeningClosing,
}

impl std::fmt::Display for IrregularityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionGap => write!(f, "session_gap"),
            Self::OpeningClosing => write!(f, "opening_closing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionIrregularity {
    pub kind: IrregularityKind,
    pub severity: Severity,
    pub session_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_session_id: Option<Id>,
    pub cashier_id: Id,
    pub register_id: Id,
    pub expected_amount: i64,
    pub declared_amount: i64,
    pub discrepancy: i64,
    pub detected_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Financial summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub total_revenue: i64,
    pub total_expenses: i64,
    pub net_balance: i64,
    /// Unpaid installments not yet due.
    pub pending_payments: i64,
    /// Sum of `amount_due` over the overdue-payment list.
    pub overdue_amount: i64,
    /// Sum of opening amounts of open sessions. A custody snapshot of what
    /// cashiers declared when opening, not a count of the tills.
    pub cash_in_hand: i64,
    pub active_sessions: usize,
    pub payment_count: usize,
    pub expense_count: usize,
}

// ---------------------------------------------------------------------------
// Delinquency
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverdueStudentPayment {
    pub student_id: Id,
    pub student_name: String,
    pub registration_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<Id>,
    pub pricing_id: Id,
    pub installment_id: Id,
    pub installment_label: String,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
    pub amount_due: i64,
    pub last_payment_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Demands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandStatusBreakdown {
    pub status: DemandStatus,
    pub count: usize,
    pub amount: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DemandAnalysis {
    pub total_count: usize,
    pub total_amount: i64,
    pub pending_amount: i64,
    pub by_status: Vec<DemandStatusBreakdown>,
    /// Percentage of decided demands that were approved or validated.
    pub approval_rate: f64,
    pub average_processing_hours: f64,
}

// ---------------------------------------------------------------------------
// Cashiers + payment methods + months
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashierPerformance {
    pub cashier_id: Id,
    pub cashier_name: String,
    pub total_payments: i64,
    pub total_expenses: i64,
    pub transaction_count: usize,
    pub average_transaction: i64,
    pub session_count: usize,
    pub last_session_opened_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentMethodStats {
    pub method_id: Id,
    pub method_name: String,
    pub total_amount: i64,
    pub transaction_count: usize,
    /// Share of total revenue, 0-100.
    pub percentage: f64,
    pub average_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyFinancialData {
    /// `YYYY-MM`
    pub month: String,
    pub revenue: i64,
    pub expenses: i64,
    pub net: i64,
    pub payment_count: usize,
    pub expense_count: usize,
}

// ---------------------------------------------------------------------------
// Data quality
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQualityIssue {
    UnparseableAmount,
    UnparseableTimestamp,
    UnknownStatus,
    MissingReference,
    DroppedRecord,
}

/// Something in the snapshot that the engine had to coerce or skip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQualityWarning {
    pub entity: &'static str,
    pub record_id: Id,
    pub field: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub issue: DataQualityIssue,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_name: Option<String>,
    pub currency: String,
    pub engine_version: String,
    pub as_of: DateTime<Utc>,
    pub tolerance: i64,
}

/// Everything one dashboard refresh shows, derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reports {
    pub meta: ReportMeta,
    pub summary: FinancialSummary,
    pub irregularities: Vec<SessionIrregularity>,
    pub overdue_payments: Vec<OverdueStudentPayment>,
    pub demand_analysis: DemandAnalysis,
    pub payment_methods: Vec<PaymentMethodStats>,
    pub monthly: Vec<MonthlyFinancialData>,
    pub cashiers: Vec<CashierPerformance>,
    pub data_quality: Vec<DataQualityWarning>,
}

impl Reports {
    /// Highest severity among the irregularities, if any.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.irregularities.iter().map(|i| i.severity).max()
    }
}
