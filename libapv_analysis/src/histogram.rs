use super::error::HistogramError;

/// A fixed-range 1D histogram with uniform binning.
///
/// Values outside the range land in the underflow/overflow counters rather
/// than the bin contents. Running statistics (sum and sum of squares) are
/// accumulated only for in-range fills, so the mean and standard deviation
/// describe the data inside the histogram range.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// Histogram name, used as the dataset name in reports.
    pub name: String,
    /// Human-readable title.
    pub title: String,
    n_bins: usize,
    x_min: f64,
    x_max: f64,
    bin_content: Vec<f64>,
    underflow: f64,
    overflow: f64,
    entries: u64,
    stats_entries: u64,
    sum: f64,
    sum_sq: f64,
}

impl Histogram {
    /// Create an empty histogram with `n_bins` uniform bins on `[x_min, x_max)`
    pub fn new(
        name: &str,
        title: &str,
        n_bins: usize,
        x_min: f64,
        x_max: f64,
    ) -> Result<Self, HistogramError> {
        if n_bins == 0 {
            return Err(HistogramError::InvalidBinCount);
        }
        if !(x_min < x_max) {
            return Err(HistogramError::InvalidRange(x_min, x_max));
        }
        Ok(Self {
            name: String::from(name),
            title: String::from(title),
            n_bins,
            x_min,
            x_max,
            bin_content: vec![0.0; n_bins],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
            stats_entries: 0,
            sum: 0.0,
            sum_sq: 0.0,
        })
    }

    /// Fill the histogram with a single value (unit weight)
    pub fn fill(&mut self, x: f64) {
        self.entries += 1;
        match self.bin_index(x) {
            Some(bin) => {
                self.bin_content[bin] += 1.0;
                self.stats_entries += 1;
                self.sum += x;
                self.sum_sq += x * x;
            }
            None => {
                if x < self.x_min {
                    self.underflow += 1.0;
                } else {
                    self.overflow += 1.0;
                }
            }
        }
    }

    /// The bin index a value would fall into, None if out of range
    pub fn bin_index(&self, x: f64) -> Option<usize> {
        if x < self.x_min || x >= self.x_max || x.is_nan() {
            return None;
        }
        let frac = (x - self.x_min) / (self.x_max - self.x_min);
        let bin = (frac * self.n_bins as f64) as usize;
        // Guard the upper edge against float rounding
        Some(bin.min(self.n_bins - 1))
    }

    /// Mean of in-range fills
    pub fn mean(&self) -> f64 {
        if self.stats_entries == 0 {
            return 0.0;
        }
        self.sum / self.stats_entries as f64
    }

    /// Population standard deviation of in-range fills
    pub fn std_dev(&self) -> f64 {
        if self.stats_entries == 0 {
            return 0.0;
        }
        let n = self.stats_entries as f64;
        let mean = self.sum / n;
        let variance = (self.sum_sq / n - mean * mean).max(0.0);
        variance.sqrt()
    }

    /// Error on the mean: stddev / sqrt(N)
    pub fn mean_error(&self) -> f64 {
        if self.stats_entries == 0 {
            return 0.0;
        }
        self.std_dev() / (self.stats_entries as f64).sqrt()
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    pub fn bin_content(&self) -> &[f64] {
        &self.bin_content
    }

    pub fn underflow(&self) -> f64 {
        self.underflow
    }

    pub fn overflow(&self) -> f64 {
        self.overflow
    }

    /// Total number of fill calls, including out-of-range values
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Number of fills that landed inside the histogram range
    pub fn stats_entries(&self) -> u64 {
        self.stats_entries
    }

    /// Bin edges, length n_bins + 1
    pub fn bin_edges(&self) -> Vec<f64> {
        let width = (self.x_max - self.x_min) / self.n_bins as f64;
        (0..=self.n_bins)
            .map(|i| self.x_min + width * i as f64)
            .collect()
    }
}
