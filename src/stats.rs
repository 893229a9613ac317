/// Summary of a utilization series using nearest-rank percentiles.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuStats {
    pub median: f64,
    pub p95: f64,
    pub p99: f64,
}

impl CpuStats {
    /// Computes median, p95 and p99 without interpolating between ranks.
    ///
    /// The median of an even-length series is the upper of the two middle
    /// values. An empty series yields all zeros.
    pub fn compute(series: &[f64]) -> Self {
        if series.is_empty() {
            return Self::default();
        }

        let mut sorted = series.to_vec();
        sorted.sort_by(f64::total_cmp);

        Self {
            median: sorted[sorted.len() / 2],
            p95: nearest_rank(&sorted, 0.95),
            p99: nearest_rank(&sorted, 0.99),
        }
    }
}

fn nearest_rank(sorted: &[f64], quantile: f64) -> f64 {
    let rank = (sorted.len() as f64 * quantile).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}
