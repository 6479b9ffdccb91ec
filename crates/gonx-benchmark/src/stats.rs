//! Aggregation of repeated run durations.

use gonx_models::RunStats;

/// Aggregates successful run durations in seconds.
///
/// Returns `None` when there are no successful runs: there is nothing to
/// take a minimum of.
pub fn aggregate(durations: &[f64], failed_runs: usize) -> Option<RunStats> {
    let first = *durations.first()?;
    let (min, max, sum) = durations
        .iter()
        .fold((first, first, 0.0), |(min, max, sum), &d| {
            (min.min(d), max.max(d), sum + d)
        });

    Some(RunStats {
        min,
        max,
        average: sum / durations.len() as f64,
        total_runs: durations.len(),
        failed_runs,
    })
}
