use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use bursar_recon::report::{DataQualityIssue, IrregularityKind};
use bursar_recon::{
    derive, derive_json, DateRange, DeriveRequest, ReconConfig, Reports, Severity, Snapshot,
};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

fn config() -> ReconConfig {
    ReconConfig::from_toml(&read_fixture("school.recon.toml")).unwrap()
}

fn snapshot() -> Snapshot {
    Snapshot::from_json(&read_fixture("school.snapshot.json")).unwrap()
}

fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 20, 10, 0, 0).unwrap()
}

fn derive_with(request: &DeriveRequest) -> Reports {
    derive(&config(), &snapshot(), request)
}

fn derive_all() -> Reports {
    derive_with(&DeriveRequest::new(as_of()))
}

// -------------------------------------------------------------------------
// Reconciliation
// -------------------------------------------------------------------------

#[test]
fn gap_and_balance_irregularities_in_chain_order() {
    let reports = derive_all();

    let found: Vec<_> = reports
        .irregularities
        .iter()
        .map(|i| (i.session_id.as_str(), i.kind, i.discrepancy, i.severity))
        .collect();
    assert_eq!(
        found,
        [
            ("s2", IrregularityKind::SessionGap, 12_000, Severity::High),
            ("s3", IrregularityKind::OpeningClosing, 1001, Severity::Low),
        ]
    );

    let gap = &reports.irregularities[0];
    assert_eq!(gap.previous_session_id.as_deref(), Some("s1"));
    assert_eq!(gap.expected_amount, 50_000);
    assert_eq!(gap.declared_amount, 62_000);

    let balance = &reports.irregularities[1];
    assert_eq!(balance.expected_amount, 13_000);
    assert_eq!(balance.declared_amount, 11_999);
    assert_eq!(reports.worst_severity(), Some(Severity::High));
}

#[test]
fn tighter_tolerance_surfaces_more() {
    let config = ReconConfig::from_toml(
        r#"
[tolerance]
discrepancy = 0
[severity]
medium_above = 0
high_above = 0
"#,
    )
    .unwrap();
    let reports = derive(&config, &snapshot(), &DeriveRequest::new(as_of()));
    assert_eq!(reports.irregularities.len(), 2);
    assert!(reports.irregularities.iter().all(|i| i.severity == Severity::High));
}

// -------------------------------------------------------------------------
// Summary + delinquency
// -------------------------------------------------------------------------

#[test]
fn financial_summary() {
    let summary = derive_all().summary;
    assert_eq!(summary.total_revenue, 65_000);
    assert_eq!(summary.total_expenses, 5000);
    assert_eq!(summary.net_balance, 60_000);
    assert_eq!(summary.pending_payments, 35_000);
    assert_eq!(summary.overdue_amount, 75_000);
    assert_eq!(summary.cash_in_hand, 11_999);
    assert_eq!(summary.active_sessions, 1);
    assert_eq!(summary.payment_count, 5);
    assert_eq!(summary.expense_count, 3);
}

#[test]
fn overdue_list_most_overdue_first() {
    let reports = derive_all();
    let rows: Vec<_> = reports
        .overdue_payments
        .iter()
        .map(|o| (o.student_id.as_str(), o.installment_id.as_str(), o.days_overdue))
        .collect();
    assert_eq!(
        rows,
        [("11", "i1", 69), ("10", "i2", 10), ("11", "i2", 10), ("12", "i5", 1)]
    );

    let aminata = &reports.overdue_payments[1];
    assert_eq!(aminata.student_name, "Aminata Diallo");
    assert_eq!(aminata.amount_due, 20_000);
    assert_eq!(aminata.class_id.as_deref(), Some("6A"));
    assert_eq!(
        aminata.last_payment_at,
        Some(Utc.with_ymd_and_hms(2026, 3, 4, 10, 0, 0).unwrap())
    );
}

#[test]
fn overdue_consistency() {
    let reports = derive_all();
    let snapshot = snapshot();
    let today = as_of().date_naive();

    for o in &reports.overdue_payments {
        assert!(o.due_date < today);
        let settled = snapshot.payments.iter().any(|p| {
            p.student_id.as_ref().map(|s| s.to_id()).as_deref() == Some(o.student_id.as_str())
                && p.installment_id.as_ref().map(|i| i.to_id()).as_deref()
                    == Some(o.installment_id.as_str())
        });
        assert!(!settled, "{} / {} has a payment", o.student_id, o.installment_id);
    }
    assert_eq!(
        reports.summary.overdue_amount,
        reports.overdue_payments.iter().map(|o| o.amount_due).sum::<i64>()
    );
}

#[test]
fn overdue_ignores_date_filter_on_payments() {
    // p1 settles student 10 / i1 even when it falls outside the window.
    let mut request = DeriveRequest::new(as_of());
    request.filters.date_range = DateRange {
        start: NaiveDate::from_ymd_opt(2026, 3, 4),
        end: None,
    };
    let reports = derive_with(&request);
    assert!(!reports
        .overdue_payments
        .iter()
        .any(|o| o.student_id == "10" && o.installment_id == "i1"));
    assert_eq!(reports.overdue_payments.len(), 4);
}

#[test]
fn previous_academic_year_scope() {
    let mut request = DeriveRequest::new(as_of());
    request.filters.academic_year_id = Some("y2024".into());
    let reports = derive_with(&request);
    assert_eq!(reports.overdue_payments.len(), 1);
    assert_eq!(reports.overdue_payments[0].installment_id, "i9");
    assert_eq!(reports.summary.pending_payments, 0);
}

// -------------------------------------------------------------------------
// Analyzers
// -------------------------------------------------------------------------

#[test]
fn payment_methods_use_allocations() {
    let reports = derive_all();
    let methods: Vec<_> = reports
        .payment_methods
        .iter()
        .map(|m| (m.method_name.as_str(), m.total_amount, m.transaction_count))
        .collect();
    assert_eq!(
        methods,
        [("Mobile Money", 34_000, 2), ("Cash", 31_000, 3), ("Bank transfer", 0, 0)]
    );
    let cash = &reports.payment_methods[1];
    assert!((cash.percentage - 31_000.0 * 100.0 / 65_000.0).abs() < 1e-9);
    assert_eq!(cash.average_amount, 10_333);
}

#[test]
fn cashier_performance() {
    let reports = derive_all();
    let awa = &reports.cashiers[0];
    assert_eq!(awa.cashier_name, "Awa Mbarga");
    assert_eq!(awa.total_payments, 60_000);
    assert_eq!(awa.total_expenses, 3000);
    assert_eq!(awa.transaction_count, 4);
    assert_eq!(awa.average_transaction, 15_750);
    assert_eq!(awa.session_count, 2);

    let koffi = &reports.cashiers[1];
    assert_eq!(koffi.total_payments, 5000);
    // e3 has no amount but sits on register 2
    assert_eq!(koffi.total_expenses, 2000);
    assert_eq!(koffi.transaction_count, 4);
    assert_eq!(koffi.average_transaction, 1750);
    assert_eq!(
        koffi.last_session_opened_at,
        Some(Utc.with_ymd_and_hms(2026, 3, 5, 8, 0, 0).unwrap())
    );

    let irene = &reports.cashiers[2];
    assert_eq!(irene.session_count, 0);
    assert_eq!(irene.transaction_count, 0);
}

#[test]
fn demand_analysis() {
    let demands = derive_all().demand_analysis;
    assert_eq!(demands.total_count, 4);
    assert_eq!(demands.total_amount, 90_000);
    assert_eq!(demands.pending_amount, 25_000);
    assert!((demands.approval_rate - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(demands.average_processing_hours, 11.0);
}

#[test]
fn monthly_breakdown() {
    let monthly = derive_all().monthly;
    assert_eq!(monthly.len(), 1);
    assert_eq!(monthly[0].month, "2026-03");
    assert_eq!(monthly[0].revenue, 65_000);
    assert_eq!(monthly[0].expenses, 5000);
    assert_eq!(monthly[0].net, 60_000);
    assert_eq!(monthly[0].payment_count, 5);
    assert_eq!(monthly[0].expense_count, 2);
}

// -------------------------------------------------------------------------
// Filters
// -------------------------------------------------------------------------

#[test]
fn cashier_filter() {
    let mut request = DeriveRequest::new(as_of());
    request.filters.cashier_id = Some("2".into());
    let reports = derive_with(&request);

    assert_eq!(reports.summary.total_revenue, 5000);
    assert_eq!(reports.summary.payment_count, 2);
    // expenses carry no cashier
    assert_eq!(reports.summary.expense_count, 3);
    assert_eq!(reports.irregularities.len(), 1);
    assert_eq!(reports.irregularities[0].session_id, "s3");
    assert_eq!(reports.cashiers.len(), 1);
    assert_eq!(reports.cashiers[0].cashier_id, "2");
}

#[test]
fn single_day_window() {
    let day = NaiveDate::from_ymd_opt(2026, 3, 4);
    let mut request = DeriveRequest::new(as_of());
    request.filters.date_range = DateRange { start: day, end: day };
    let reports = derive_with(&request);

    assert_eq!(reports.summary.total_revenue, 5000);
    assert_eq!(reports.summary.total_expenses, 2000);
    assert_eq!(reports.summary.active_sessions, 0);
    assert_eq!(reports.irregularities.len(), 1);
    assert_eq!(reports.irregularities[0].kind, IrregularityKind::OpeningClosing);
    assert_eq!(reports.demand_analysis.total_count, 1);
}

#[test]
fn filters_do_not_hide_movements_inside_a_checked_session() {
    // Night shift on register 1 crosses midnight; the payment lands on the 5th
    // and was taken by a relief cashier.
    let night = r#"{
        "users": [{"id": 1, "name": "Awa"}, {"id": 4, "name": "Relief"}],
        "sessions": [
            {"id": "n1", "user_id": 1, "cash_register_id": 1, "status": "closed",
             "opening_date": "2026-03-04 20:00:00", "opening_amount": "0",
             "closing_date": "2026-03-05 02:00:00", "closing_amount": "5000"}
        ],
        "payments": [
            {"id": "p1", "amount": "5000", "created_at": "2026-03-05 01:00:00",
             "cashier_id": 4, "cash_register_id": 1}
        ]
    }"#;
    let day = NaiveDate::from_ymd_opt(2026, 3, 4);

    let mut window = DeriveRequest::new(as_of());
    window.filters.date_range = DateRange { start: day, end: day };
    let reports = derive_json(&config(), night, &window).unwrap();
    assert_eq!(reports.summary.payment_count, 0);
    assert!(reports.irregularities.is_empty(), "{:?}", reports.irregularities);

    let mut cashier = DeriveRequest::new(as_of());
    cashier.filters.cashier_id = Some("1".into());
    let reports = derive_json(&config(), night, &cashier).unwrap();
    assert_eq!(reports.summary.total_revenue, 0);
    assert!(reports.irregularities.is_empty(), "{:?}", reports.irregularities);
}

#[test]
fn severity_filter() {
    let mut request = DeriveRequest::new(as_of());
    request.filters.severity = Some(Severity::Low);
    let reports = derive_with(&request);
    assert_eq!(reports.irregularities.len(), 1);
    assert_eq!(reports.irregularities[0].session_id, "s3");
}

// -------------------------------------------------------------------------
// Data quality + properties
// -------------------------------------------------------------------------

#[test]
fn data_quality_warnings() {
    let reports = derive_all();
    let issues: Vec<_> = reports
        .data_quality
        .iter()
        .map(|w| (w.entity, w.record_id.as_str(), w.field, w.issue))
        .collect();
    assert_eq!(
        issues,
        [
            ("payment", "p6", "amount", DataQualityIssue::UnparseableAmount),
            ("session", "s5", "register_id", DataQualityIssue::DroppedRecord),
        ]
    );
}

#[test]
fn conservation() {
    for cashier in [None, Some("1"), Some("2")] {
        let mut request = DeriveRequest::new(as_of());
        request.filters.cashier_id = cashier.map(String::from);
        let summary = derive_with(&request).summary;
        assert_eq!(summary.net_balance, summary.total_revenue - summary.total_expenses);
    }
}

#[test]
fn idempotent_serialization() {
    let json = read_fixture("school.snapshot.json");
    let request = DeriveRequest::new(as_of());
    let first = serde_json::to_string_pretty(&derive_json(&config(), &json, &request).unwrap()).unwrap();
    let second = serde_json::to_string_pretty(&derive_json(&config(), &json, &request).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn report_json_contract() {
    let value = serde_json::to_value(derive_all()).unwrap();
    assert_eq!(value["meta"]["config_name"], "Main campus");
    assert_eq!(value["meta"]["currency"], "XAF");
    assert_eq!(value["meta"]["tolerance"], 1000);
    assert_eq!(value["irregularities"][0]["kind"], "session_gap");
    assert_eq!(value["irregularities"][0]["severity"], "high");
    assert_eq!(value["demand_analysis"]["by_status"][3]["status"], "validated");
    assert_eq!(value["data_quality"][0]["issue"], "unparseable_amount");
    assert_eq!(value["overdue_payments"][0]["due_date"], "2026-01-10");
}
