//! Boundary conversion from the loosely-typed [`Snapshot`] to the [`Ledger`].
//!
//! All null handling happens here. Missing amounts count as zero and are
//! logged at debug level; unparseable amounts and timestamps are coerced the
//! same way but also reported as [`DataQualityWarning`]s so a real closing
//! amount silently read as zero does not go unnoticed.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::debug;

use crate::amount::{ParsedAmount, RawAmount};
use crate::config::CurrencyConfig;
use crate::model::{
    AcademicYear, CashSession, Cashier, Demand, DemandStatus, Expense, Installment,
    InstallmentStatus, Ledger, MethodAllocation, Payment, PaymentMethod, Pricing, Registration,
    SessionStatus, Student,
};
use crate::report::{DataQualityIssue, DataQualityWarning};
use crate::snapshot::{
    DemandRecord, InstallmentRecord, PaymentRecord, PricingRecord, RawId, SessionRecord, Snapshot,
};

/// Normalized ledger plus everything that had to be coerced or skipped.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub ledger: Ledger,
    pub warnings: Vec<DataQualityWarning>,
}

pub fn normalize(snapshot: &Snapshot, currency: &CurrencyConfig) -> Normalized {
    let mut n = Normalizer {
        minor_digits: currency.minor_digits,
        warnings: Vec::new(),
    };

    let payments = snapshot
        .payments
        .iter()
        .enumerate()
        .map(|(i, r)| n.payment(i, r))
        .collect();

    let expenses = snapshot
        .expenses
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let id = record_id(r.id.as_ref(), "expenses", i);
            Expense {
                amount: n.amount_or_zero(r.amount.as_ref(), "expense", &id, "amount"),
                expense_date: n.timestamp(r.expense_date.as_deref(), "expense", &id, "expense_date"),
                register_id: opt_id(r.register_id.as_ref()),
                expense_type_id: opt_id(r.expense_type_id.as_ref()),
                id,
            }
        })
        .collect();

    let sessions = snapshot
        .sessions
        .iter()
        .enumerate()
        .filter_map(|(i, r)| n.session(i, r))
        .collect();

    let demands = snapshot
        .demands
        .iter()
        .enumerate()
        .map(|(i, r)| n.demand(i, r))
        .collect();

    let registrations = snapshot
        .registrations
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let class = r.class.as_ref();
            Registration {
                id: record_id(r.id.as_ref(), "registrations", i),
                student_id: opt_id(r.student_id.as_ref()),
                academic_year_id: opt_id(r.academic_year_id.as_ref()),
                class_id: class.and_then(|c| opt_id(c.id.as_ref())),
                level_id: class.and_then(|c| opt_id(c.level_id.as_ref())),
            }
        })
        .collect();

    let pricings = snapshot
        .pricings
        .iter()
        .enumerate()
        .map(|(i, r)| n.pricing(i, r))
        .collect();

    let payment_methods = snapshot
        .payment_methods
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let id = record_id(r.id.as_ref(), "payment_methods", i);
            PaymentMethod {
                name: r.name.clone().unwrap_or_else(|| id.clone()),
                id,
            }
        })
        .collect();

    let cashiers = snapshot
        .users
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let id = record_id(r.id.as_ref(), "users", i);
            Cashier {
                name: r.name.clone().unwrap_or_else(|| id.clone()),
                id,
            }
        })
        .collect();

    let students = snapshot
        .students
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let id = record_id(r.id.as_ref(), "students", i);
            let name = [r.first_name.as_deref(), r.last_name.as_deref()]
                .into_iter()
                .flatten()
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            Student {
                name: if name.is_empty() { id.clone() } else { name },
                assignment_type_id: opt_id(r.assignment_type_id.as_ref()),
                id,
            }
        })
        .collect();

    let academic_years = snapshot
        .academic_years
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let id = record_id(r.id.as_ref(), "academic_years", i);
            AcademicYear {
                label: r.label.clone().unwrap_or_else(|| id.clone()),
                is_current: r.is_current,
                id,
            }
        })
        .collect();

    Normalized {
        ledger: Ledger {
            payments,
            expenses,
            sessions,
            demands,
            registrations,
            pricings,
            payment_methods,
            cashiers,
            students,
            academic_years,
        },
        warnings: n.warnings,
    }
}

struct Normalizer {
    minor_digits: u32,
    warnings: Vec<DataQualityWarning>,
}

impl Normalizer {
    fn warn(
        &mut self,
        entity: &'static str,
        record_id: &str,
        field: &'static str,
        value: Option<String>,
        issue: DataQualityIssue,
    ) {
        self.warnings.push(DataQualityWarning {
            entity,
            record_id: record_id.to_string(),
            field,
            value,
            issue,
        });
    }

    fn amount(
        &mut self,
        raw: Option<&RawAmount>,
        entity: &'static str,
        record_id: &str,
        field: &'static str,
    ) -> ParsedAmount {
        let parsed = ParsedAmount::from_raw(raw, self.minor_digits);
        match &parsed {
            ParsedAmount::Value(_) => {}
            ParsedAmount::Missing => {
                debug!("{entity} {record_id}: {field} missing, counted as zero");
            }
            ParsedAmount::Unparseable(text) => {
                debug!("{entity} {record_id}: {field} {text:?} is not a number, counted as zero");
                self.warn(
                    entity,
                    record_id,
                    field,
                    Some(text.clone()),
                    DataQualityIssue::UnparseableAmount,
                );
            }
        }
        parsed
    }

    fn amount_or_zero(
        &mut self,
        raw: Option<&RawAmount>,
        entity: &'static str,
        record_id: &str,
        field: &'static str,
    ) -> i64 {
        self.amount(raw, entity, record_id, field).or_zero()
    }

    fn timestamp(
        &mut self,
        raw: Option<&str>,
        entity: &'static str,
        record_id: &str,
        field: &'static str,
    ) -> Option<DateTime<Utc>> {
        let text = raw.map(str::trim).filter(|t| !t.is_empty())?;
        let parsed = parse_timestamp(text);
        if parsed.is_none() {
            debug!("{entity} {record_id}: {field} {text:?} is not a timestamp, ignored");
            self.warn(
                entity,
                record_id,
                field,
                Some(text.to_string()),
                DataQualityIssue::UnparseableTimestamp,
            );
        }
        parsed
    }

    fn date(
        &mut self,
        raw: Option<&str>,
        entity: &'static str,
        record_id: &str,
        field: &'static str,
    ) -> Option<NaiveDate> {
        let text = raw.map(str::trim).filter(|t| !t.is_empty())?;
        let parsed = parse_date(text);
        if parsed.is_none() {
            debug!("{entity} {record_id}: {field} {text:?} is not a date, ignored");
            self.warn(
                entity,
                record_id,
                field,
                Some(text.to_string()),
                DataQualityIssue::UnparseableTimestamp,
            );
        }
        parsed
    }

    fn payment(&mut self, index: usize, r: &PaymentRecord) -> Payment {
        let id = record_id(r.id.as_ref(), "payments", index);

        let mut allocations = Vec::with_capacity(r.methods.len());
        for a in &r.methods {
            let Some(method_id) = opt_id(a.method_id.as_ref()) else {
                debug!("payment {id}: allocation without method id skipped");
                self.warn("payment", &id, "methods.method_id", None, DataQualityIssue::MissingReference);
                continue;
            };
            allocations.push(MethodAllocation {
                method_id,
                amount: self.amount_or_zero(a.amount.as_ref(), "payment", &id, "methods.amount"),
            });
        }

        Payment {
            amount: self.amount_or_zero(r.amount.as_ref(), "payment", &id, "amount"),
            created_at: self.timestamp(r.created_at.as_deref(), "payment", &id, "created_at"),
            student_id: opt_id(r.student_id.as_ref()),
            cashier_id: opt_id(r.cashier_id.as_ref()),
            register_id: opt_id(r.register_id.as_ref()),
            installment_id: opt_id(r.installment_id.as_ref()),
            allocations,
            id,
        }
    }

    fn session(&mut self, index: usize, r: &SessionRecord) -> Option<CashSession> {
        let id = record_id(r.id.as_ref(), "sessions", index);

        let opening_date = self.timestamp(r.opening_date.as_deref(), "session", &id, "opening_date");
        let closing_date = self.timestamp(r.closing_date.as_deref(), "session", &id, "closing_date");

        let Some(cashier_id) = opt_id(r.cashier_id.as_ref()) else {
            debug!("session {id}: no cashier_id, dropped");
            self.warn("session", &id, "cashier_id", None, DataQualityIssue::DroppedRecord);
            return None;
        };
        let Some(register_id) = opt_id(r.register_id.as_ref()) else {
            debug!("session {id}: no register_id, dropped");
            self.warn("session", &id, "register_id", None, DataQualityIssue::DroppedRecord);
            return None;
        };
        let Some(opening_date) = opening_date else {
            debug!("session {id}: no usable opening_date, dropped");
            self.warn("session", &id, "opening_date", None, DataQualityIssue::DroppedRecord);
            return None;
        };

        let status = match r.status.as_deref().map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "open" => SessionStatus::Open,
            Some(s) if s == "closed" => SessionStatus::Closed,
            other => {
                if let Some(unknown) = other.filter(|s| !s.is_empty()) {
                    self.warn("session", &id, "status", Some(unknown), DataQualityIssue::UnknownStatus);
                }
                if closing_date.is_some() {
                    SessionStatus::Closed
                } else {
                    SessionStatus::Open
                }
            }
        };

        let closing_amount =
            match self.amount(r.closing_amount.as_ref(), "session", &id, "closing_amount") {
                ParsedAmount::Missing => None,
                parsed => Some(parsed.or_zero()),
            };

        Some(CashSession {
            opening_amount: self.amount_or_zero(r.opening_amount.as_ref(), "session", &id, "opening_amount"),
            id,
            cashier_id,
            register_id,
            opening_date,
            closing_date,
            closing_amount,
            status,
        })
    }

    fn demand(&mut self, index: usize, r: &DemandRecord) -> Demand {
        let id = record_id(r.id.as_ref(), "demands", index);
        let status = match r.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => DemandStatus::Pending,
            Some(text) => text.parse().unwrap_or_else(|_| {
                self.warn("demand", &id, "status", Some(text.to_string()), DataQualityIssue::UnknownStatus);
                DemandStatus::Pending
            }),
        };
        Demand {
            amount: self.amount_or_zero(r.amount.as_ref(), "demand", &id, "amount"),
            applicant_id: opt_id(r.applicant_id.as_ref()),
            status,
            created_at: self.timestamp(r.created_at.as_deref(), "demand", &id, "created_at"),
            updated_at: self.timestamp(r.updated_at.as_deref(), "demand", &id, "updated_at"),
            id,
        }
    }

    fn pricing(&mut self, index: usize, r: &PricingRecord) -> Pricing {
        let id = record_id(r.id.as_ref(), "pricings", index);
        let installments = r
            .installments
            .iter()
            .enumerate()
            .map(|(i, inst)| self.installment(&id, i, inst))
            .collect();
        Pricing {
            label: r.label.clone().unwrap_or_else(|| id.clone()),
            academic_year_id: opt_id(r.academic_year_id.as_ref()),
            level_id: opt_id(r.level_id.as_ref()),
            assignment_type_id: opt_id(r.assignment_type_id.as_ref()),
            installments,
            id,
        }
    }

    fn installment(&mut self, pricing_id: &str, index: usize, r: &InstallmentRecord) -> Installment {
        let id = r
            .id
            .as_ref()
            .map(RawId::to_id)
            .unwrap_or_else(|| format!("{pricing_id}/installments[{index}]"));
        let status = match r.status.as_deref().map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "paid" => InstallmentStatus::Paid,
            Some(s) if s == "unpaid" || s.is_empty() => InstallmentStatus::Unpaid,
            None => InstallmentStatus::Unpaid,
            Some(unknown) => {
                self.warn("installment", &id, "status", Some(unknown), DataQualityIssue::UnknownStatus);
                InstallmentStatus::Unpaid
            }
        };
        Installment {
            label: r.label.clone().unwrap_or_else(|| id.clone()),
            amount_due: self.amount_or_zero(r.amount_due.as_ref(), "installment", &id, "amount_due"),
            due_date: self.date(r.due_date.as_deref(), "installment", &id, "due_date"),
            status,
            id,
        }
    }
}

fn record_id(id: Option<&RawId>, collection: &str, index: usize) -> String {
    id.map(RawId::to_id)
        .unwrap_or_else(|| format!("{collection}[{index}]"))
}

fn opt_id(id: Option<&RawId>) -> Option<String> {
    id.map(RawId::to_id).filter(|s| !s.trim().is_empty())
}

/// Parse RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]`, `YYYY-MM-DDTHH:MM:SS[.f]`
/// (both read as UTC) or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse a calendar date; timestamps are truncated to their UTC date.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(text).map(|ts| ts.date_naive()))
}
