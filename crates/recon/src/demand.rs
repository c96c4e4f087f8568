//! Disbursement demand analysis.

use crate::amount::total;
use crate::model::{Demand, DemandStatus};
use crate::report::{DemandAnalysis, DemandStatusBreakdown};

pub fn analyze_demands(demands: &[&Demand]) -> DemandAnalysis {
    let by_status: Vec<DemandStatusBreakdown> = DemandStatus::ALL
        .iter()
        .map(|&status| {
            let matching: Vec<_> = demands.iter().filter(|d| d.status == status).collect();
            DemandStatusBreakdown {
                status,
                count: matching.len(),
                amount: total(matching.iter().map(|d| d.amount)),
            }
        })
        .collect();

    let count_of = |status: DemandStatus| {
        by_status
            .iter()
            .find(|b| b.status == status)
            .map_or(0, |b| b.count)
    };
    let approved = count_of(DemandStatus::Approved) + count_of(DemandStatus::Validated);
    let decided = approved + count_of(DemandStatus::Rejected);
    let approval_rate = if decided == 0 {
        0.0
    } else {
        approved as f64 * 100.0 / decided as f64
    };

    // Seconds from creation to last update, for decided demands only.
    let durations: Vec<i64> = demands
        .iter()
        .filter(|d| d.status != DemandStatus::Pending)
        .filter_map(|d| Some((d.updated_at? - d.created_at?).num_seconds()))
        .collect();
    let average_processing_hours = if durations.is_empty() {
        0.0
    } else {
        durations.iter().sum::<i64>() as f64 / durations.len() as f64 / 3600.0
    };

    DemandAnalysis {
        total_count: demands.len(),
        total_amount: total(demands.iter().map(|d| d.amount)),
        pending_amount: by_status
            .iter()
            .find(|b| b.status == DemandStatus::Pending)
            .map_or(0, |b| b.amount),
        by_status,
        approval_rate,
        average_processing_hours,
    }
}
