//! Raw input records as delivered by the data layer.
//!
//! Every field is optional and loosely typed: ids may be numbers or strings,
//! amounts may be numbers, strings or null, dates are free-form strings.
//! Nothing in here is interpreted; see [`crate::normalize`] for that.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::amount::RawAmount;
use crate::error::ReconError;

/// Identifier as delivered: numeric or textual. Any other JSON shape is kept
/// as-is and rendered as its JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(i64),
    Other(Value),
}

impl RawId {
    pub fn to_id(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Other(v) => v.to_string(),
        }
    }
}

impl From<&str> for RawId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One frozen view of every collection a dashboard refresh fetches.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    #[serde(deserialize_with = "records")]
    pub payments: Vec<PaymentRecord>,
    #[serde(deserialize_with = "records")]
    pub expenses: Vec<ExpenseRecord>,
    #[serde(deserialize_with = "records")]
    pub sessions: Vec<SessionRecord>,
    #[serde(deserialize_with = "records")]
    pub demands: Vec<DemandRecord>,
    #[serde(deserialize_with = "records")]
    pub registrations: Vec<RegistrationRecord>,
    #[serde(deserialize_with = "records")]
    pub pricings: Vec<PricingRecord>,
    #[serde(deserialize_with = "records")]
    pub payment_methods: Vec<PaymentMethodRecord>,
    #[serde(deserialize_with = "records")]
    pub users: Vec<UserRecord>,
    #[serde(deserialize_with = "records")]
    pub students: Vec<StudentRecord>,
    #[serde(deserialize_with = "records")]
    pub academic_years: Vec<AcademicYearRecord>,
}

impl Snapshot {
    pub fn from_json(input: &str) -> Result<Self, ReconError> {
        serde_json::from_str(input).map_err(|e| ReconError::SnapshotParse(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Cash movements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentRecord {
    pub id: Option<RawId>,
    pub amount: Option<RawAmount>,
    #[serde(deserialize_with = "text")]
    pub created_at: Option<String>,
    pub student_id: Option<RawId>,
    pub cashier_id: Option<RawId>,
    #[serde(alias = "cash_register_id")]
    pub register_id: Option<RawId>,
    pub installment_id: Option<RawId>,
    #[serde(alias = "payment_methods", deserialize_with = "records")]
    pub methods: Vec<AllocationRecord>,
}

/// The share of a payment settled through one payment method.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AllocationRecord {
    #[serde(alias = "payment_method_id")]
    pub method_id: Option<RawId>,
    pub amount: Option<RawAmount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExpenseRecord {
    pub id: Option<RawId>,
    pub amount: Option<RawAmount>,
    #[serde(deserialize_with = "text")]
    pub expense_date: Option<String>,
    #[serde(alias = "cash_register_id")]
    pub register_id: Option<RawId>,
    pub expense_type_id: Option<RawId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionRecord {
    pub id: Option<RawId>,
    #[serde(alias = "user_id")]
    pub cashier_id: Option<RawId>,
    #[serde(alias = "cash_register_id")]
    pub register_id: Option<RawId>,
    #[serde(deserialize_with = "text")]
    pub opening_date: Option<String>,
    pub opening_amount: Option<RawAmount>,
    #[serde(deserialize_with = "text")]
    pub closing_date: Option<String>,
    pub closing_amount: Option<RawAmount>,
    #[serde(deserialize_with = "text")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DemandRecord {
    pub id: Option<RawId>,
    pub amount: Option<RawAmount>,
    pub applicant_id: Option<RawId>,
    #[serde(deserialize_with = "text")]
    pub status: Option<String>,
    #[serde(deserialize_with = "text")]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "text")]
    pub updated_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Enrollment + fees
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationRecord {
    pub id: Option<RawId>,
    pub student_id: Option<RawId>,
    pub academic_year_id: Option<RawId>,
    #[serde(alias = "classe")]
    pub class: Option<ClassRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassRecord {
    pub id: Option<RawId>,
    pub level_id: Option<RawId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StudentRecord {
    pub id: Option<RawId>,
    #[serde(deserialize_with = "text")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "text")]
    pub last_name: Option<String>,
    pub assignment_type_id: Option<RawId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PricingRecord {
    pub id: Option<RawId>,
    #[serde(deserialize_with = "text")]
    pub label: Option<String>,
    pub academic_year_id: Option<RawId>,
    pub level_id: Option<RawId>,
    pub assignment_type_id: Option<RawId>,
    #[serde(deserialize_with = "records")]
    pub installments: Vec<InstallmentRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InstallmentRecord {
    pub id: Option<RawId>,
    #[serde(deserialize_with = "text")]
    pub label: Option<String>,
    pub amount_due: Option<RawAmount>,
    #[serde(deserialize_with = "text")]
    pub due_date: Option<String>,
    #[serde(deserialize_with = "text")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AcademicYearRecord {
    pub id: Option<RawId>,
    #[serde(deserialize_with = "text")]
    pub label: Option<String>,
    #[serde(deserialize_with = "flag")]
    pub is_current: bool,
}

// ---------------------------------------------------------------------------
// Directories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentMethodRecord {
    pub id: Option<RawId>,
    #[serde(deserialize_with = "text")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserRecord {
    pub id: Option<RawId>,
    #[serde(deserialize_with = "text")]
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Lenient field readers
// ---------------------------------------------------------------------------
//
// `#[serde(default)]` only covers absent keys. The data layer also sends
// explicit nulls, 0/1 flags and numbers where text is expected; none of
// those may reject the whole snapshot.

/// A collection that may be null or contain null entries. Null entries are dropped.
fn records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Option::<Vec<Option<T>>>::deserialize(deserializer)?;
    Ok(items.unwrap_or_default().into_iter().flatten().collect())
}

/// A boolean flag sent as `true`, `1`, `"1"` or `"true"`. Null and anything else is `false`.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true"),
        _ => false,
    })
}

/// Free text. Numbers and booleans keep their JSON spelling so the
/// normalizer can report them; null is absent.
fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}
