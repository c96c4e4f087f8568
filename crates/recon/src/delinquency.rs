//! Overdue installment detection.
//!
//! Registration -> student -> pricing (matched on academic year, level and
//! assignment type) -> unpaid installments -> no payment for the
//! (student, installment) pair. Pricings, paid pairs and latest payment dates
//! are indexed up front so the scan is linear in the number of installments
//! visited.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use log::debug;

use crate::model::{Ledger, Pricing, Student};
use crate::report::OverdueStudentPayment;

type PricingKey<'a> = (&'a str, &'a str, &'a str);

/// Academic year the scan is restricted to: the explicit override, else the
/// year flagged current, else none (every registration).
pub fn resolve_academic_year<'a>(ledger: &'a Ledger, requested: Option<&'a str>) -> Option<&'a str> {
    requested.or_else(|| ledger.current_academic_year())
}

/// Pricings belonging to `academic_year`, or all of them when unscoped.
pub fn pricings_in_scope<'a>(
    ledger: &'a Ledger,
    academic_year: Option<&'a str>,
) -> impl Iterator<Item = &'a Pricing> + 'a {
    ledger.pricings.iter().filter(move |p| match academic_year {
        None => true,
        Some(year) => p.academic_year_id.as_deref() == Some(year),
    })
}

/// Every unpaid, past-due installment with no payment recorded against it,
/// most overdue first. Equal `days_overdue` keep encounter order.
///
/// Payment matching uses the whole ledger, not the filtered view: a payment
/// outside the dashboard window still settles its installment.
pub fn scan_overdue(
    ledger: &Ledger,
    academic_year: Option<&str>,
    as_of: DateTime<Utc>,
) -> Vec<OverdueStudentPayment> {
    let today = as_of.date_naive();

    let students: HashMap<&str, &Student> =
        ledger.students.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut pricings: HashMap<PricingKey<'_>, Vec<&Pricing>> = HashMap::new();
    for pricing in pricings_in_scope(ledger, academic_year) {
        if let (Some(year), Some(level), Some(assignment)) = (
            pricing.academic_year_id.as_deref(),
            pricing.level_id.as_deref(),
            pricing.assignment_type_id.as_deref(),
        ) {
            pricings.entry((year, level, assignment)).or_default().push(pricing);
        }
    }

    let mut paid: HashSet<(&str, &str)> = HashSet::new();
    let mut last_payment: HashMap<&str, DateTime<Utc>> = HashMap::new();
    for payment in &ledger.payments {
        let Some(student) = payment.student_id.as_deref() else {
            continue;
        };
        if let Some(installment) = payment.installment_id.as_deref() {
            paid.insert((student, installment));
        }
        if let Some(at) = payment.created_at {
            last_payment
                .entry(student)
                .and_modify(|latest| *latest = (*latest).max(at))
                .or_insert(at);
        }
    }

    let mut overdue = Vec::new();
    for registration in &ledger.registrations {
        if let Some(year) = academic_year {
            if registration.academic_year_id.as_deref() != Some(year) {
                continue;
            }
        }
        let Some(student) = registration
            .student_id
            .as_deref()
            .and_then(|id| students.get(id))
        else {
            debug!("registration {}: student not found, skipped", registration.id);
            continue;
        };
        let (Some(year), Some(level), Some(assignment)) = (
            registration.academic_year_id.as_deref(),
            registration.level_id.as_deref(),
            student.assignment_type_id.as_deref(),
        ) else {
            debug!("registration {}: incomplete pricing key, skipped", registration.id);
            continue;
        };
        let Some(matching) = pricings.get(&(year, level, assignment)) else {
            debug!("registration {}: no pricing for {year}/{level}/{assignment}", registration.id);
            continue;
        };

        for pricing in matching {
            for installment in pricing.installments.iter().filter(|i| !i.is_paid()) {
                let Some(due_date) = installment.due_date else {
                    debug!(
                        "registration {}: installment {} has no due date, skipped",
                        registration.id, installment.id
                    );
                    continue;
                };
                let days_overdue = (today - due_date).num_days();
                if days_overdue <= 0 || paid.contains(&(student.id.as_str(), installment.id.as_str())) {
                    continue;
                }
                overdue.push(OverdueStudentPayment {
                    student_id: student.id.clone(),
                    student_name: student.name.clone(),
                    registration_id: registration.id.clone(),
                    class_id: registration.class_id.clone(),
                    pricing_id: pricing.id.clone(),
                    installment_id: installment.id.clone(),
                    installment_label: installment.label.clone(),
                    due_date,
                    days_overdue,
                    amount_due: installment.amount_due,
                    last_payment_at: last_payment.get(student.id.as_str()).copied(),
                });
            }
        }
    }

    overdue.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue));
    overdue
}
