use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Normalized entity id.
pub type Id = String;

// ---------------------------------------------------------------------------
// Cash movements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub id: Id,
    pub amount: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub student_id: Option<Id>,
    pub cashier_id: Option<Id>,
    pub register_id: Option<Id>,
    pub installment_id: Option<Id>,
    pub allocations: Vec<MethodAllocation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodAllocation {
    pub method_id: Id,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: Id,
    pub amount: i64,
    pub expense_date: Option<DateTime<Utc>>,
    pub register_id: Option<Id>,
    pub expense_type_id: Option<Id>,
}

// ---------------------------------------------------------------------------
// Cash register sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Open,
    Closed,
}

/// One cashier's custody period on one register.
///
/// A session always has a cashier, a register and an opening date; records
/// missing any of them are dropped during normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct CashSession {
    pub id: Id,
    pub cashier_id: Id,
    pub register_id: Id,
    pub opening_date: DateTime<Utc>,
    pub opening_amount: i64,
    pub closing_date: Option<DateTime<Utc>>,
    /// `None` when no closing amount was recorded.
    pub closing_amount: Option<i64>,
    pub status: SessionStatus,
}

impl CashSession {
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    /// Closing amount of a closed session, if one was recorded.
    pub fn recorded_closing(&self) -> Option<i64> {
        match self.status {
            SessionStatus::Closed => self.closing_amount,
            SessionStatus::Open => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Disbursement demands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandStatus {
    Pending,
    Approved,
    Rejected,
    Validated,
}

impl DemandStatus {
    pub const ALL: [DemandStatus; 4] = [
        DemandStatus::Pending,
        DemandStatus::Approved,
        DemandStatus::Rejected,
        DemandStatus::Validated,
    ];
}

impl FromStr for DemandStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "validated" => Ok(Self::Validated),
            other => Err(format!(
                "unknown demand status \"{other}\" (expected pending, approved, rejected or validated)"
            )),
        }
    }
}

impl std::fmt::Display for DemandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Validated => write!(f, "validated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Demand {
    pub id: Id,
    pub amount: i64,
    pub applicant_id: Option<Id>,
    pub status: DemandStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Enrollment + fees
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub id: Id,
    pub student_id: Option<Id>,
    pub academic_year_id: Option<Id>,
    pub class_id: Option<Id>,
    pub level_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub id: Id,
    pub name: String,
    pub assignment_type_id: Option<Id>,
}

/// Fee plan for one (academic year, level, assignment type).
#[derive(Debug, Clone, PartialEq)]
pub struct Pricing {
    pub id: Id,
    pub label: String,
    pub academic_year_id: Option<Id>,
    pub level_id: Option<Id>,
    pub assignment_type_id: Option<Id>,
    pub installments: Vec<Installment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallmentStatus {
    Paid,
    Unpaid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Installment {
    pub id: Id,
    pub label: String,
    pub amount_due: i64,
    pub due_date: Option<NaiveDate>,
    pub status: InstallmentStatus,
}

impl Installment {
    pub fn is_paid(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcademicYear {
    pub id: Id,
    pub label: String,
    pub is_current: bool,
}

// ---------------------------------------------------------------------------
// Directories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentMethod {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cashier {
    pub id: Id,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Normalized, strongly-typed snapshot. Immutable for one derivation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    pub payments: Vec<Payment>,
    pub expenses: Vec<Expense>,
    pub sessions: Vec<CashSession>,
    pub demands: Vec<Demand>,
    pub registrations: Vec<Registration>,
    pub pricings: Vec<Pricing>,
    pub payment_methods: Vec<PaymentMethod>,
    pub cashiers: Vec<Cashier>,
    pub students: Vec<Student>,
    pub academic_years: Vec<AcademicYear>,
}

impl Ledger {
    /// Id of the academic year flagged as current, if any.
    pub fn current_academic_year(&self) -> Option<&str> {
        self.academic_years
            .iter()
            .find(|y| y.is_current)
            .map(|y| y.id.as_str())
    }
}
