use std::collections::HashSet;

use super::model::{DistributionMode, Money, ReportRow, ReportTotals};

/// Reduce rows to freight and service totals.
///
/// Service is always summed per row. Under [`DistributionMode::PerOrder`] every row of an
/// order repeats the order's freight, so freight is taken once per distinct order (from the
/// first row seen). Under [`DistributionMode::Proportional`] rows hold disjoint slices and
/// freight is summed directly.
pub fn aggregate<'a, I>(rows: I, mode: DistributionMode) -> ReportTotals
where
    I: IntoIterator<Item = &'a ReportRow>,
{
    let mut service = Money::ZERO;
    let mut freight = Money::ZERO;
    let mut seen_orders: HashSet<u64> = HashSet::new();

    for row in rows {
        service += row.service;
        match mode {
            DistributionMode::PerOrder => {
                if seen_orders.insert(row.order_id) {
                    freight += row.freight;
                }
            }
            DistributionMode::Proportional => freight += row.freight,
        }
    }

    ReportTotals { freight, service }
}
