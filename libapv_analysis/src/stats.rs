use serde::Serialize;

use super::histogram::Histogram;

/// Summary statistics of one histogram
#[derive(Debug, Clone, Serialize)]
pub struct SummaryStats {
    pub entries: u64,
    pub mean: f64,
    pub std_dev: f64,
    pub mean_error: f64,
}

impl From<&Histogram> for SummaryStats {
    fn from(hist: &Histogram) -> Self {
        Self {
            entries: hist.stats_entries(),
            mean: hist.mean(),
            std_dev: hist.std_dev(),
            mean_error: hist.mean_error(),
        }
    }
}

/// One row of the per-plane efficiency table.
///
/// `counts` is the number of trigger events in which the plane fired at all,
/// `n_trigger` the total number of trigger events. Efficiencies are percentages.
#[derive(Debug, Clone, Serialize)]
pub struct EfficiencyRow {
    pub plane_id: u32,
    pub label: String,
    pub counts: u64,
    pub count_error: f64,
    pub efficiency: f64,
    pub efficiency_error: f64,
}

impl EfficiencyRow {
    /// Compute one efficiency row with binomial error propagation
    pub fn compute(plane_id: u32, label: &str, counts: u64, n_trigger: u64) -> Self {
        let (efficiency, efficiency_error) = if n_trigger > 0 {
            let n = n_trigger as f64;
            let p = counts as f64 / n;
            (p * 100.0, (p * (1.0 - p)).sqrt() / n.sqrt() * 100.0)
        } else {
            (0.0, 0.0)
        };
        Self {
            plane_id,
            label: String::from(label),
            counts,
            count_error: (counts as f64).sqrt(),
            efficiency,
            efficiency_error,
        }
    }
}
