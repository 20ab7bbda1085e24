use hdf5::types::VarLenUnicode;
use hdf5::File;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::accumulator::{PlaneAccumulator, RunAccumulator};
use super::error::ReportError;
use super::histogram::Histogram;
use super::stats::{EfficiencyRow, SummaryStats};

const HISTOGRAMS_NAME: &str = "histograms";
const HITS_NAME: &str = "hits";
const CLUSTER_SIZE_NAME: &str = "cluster_size";
const MAX_CHARGE_NAME: &str = "max_charge";
const SUMMED_CHARGE_NAME: &str = "summed_charge";

/// This is the version of the report format
const FORMAT_VERSION: &str = "1.0";

/// Summary statistics for one plane, as written to the YAML sidecar
#[derive(Debug, Clone, Serialize)]
pub struct PlaneSummary {
    pub plane_id: u32,
    pub label: String,
    pub presence: u64,
    pub hits: SummaryStats,
    pub cluster_size: SummaryStats,
    pub max_charge: SummaryStats,
    pub summed_charge: SummaryStats,
}

impl From<&PlaneAccumulator> for PlaneSummary {
    fn from(plane: &PlaneAccumulator) -> Self {
        Self {
            plane_id: plane.info.id,
            label: plane.info.label.clone(),
            presence: plane.presence,
            hits: SummaryStats::from(&plane.hits),
            cluster_size: SummaryStats::from(&plane.cluster_size),
            max_charge: SummaryStats::from(&plane.max_charge),
            summed_charge: SummaryStats::from(&plane.summed_charge),
        }
    }
}

/// One hit-pattern row: which tracked planes were present and how often
#[derive(Debug, Clone, Serialize)]
pub struct PatternCount {
    pub planes: Vec<u32>,
    pub count: u64,
}

/// The full per-run summary written to the YAML sidecar
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub trigger_id: u32,
    pub n_events: u64,
    pub n_triggered: u64,
    pub efficiency: Vec<EfficiencyRow>,
    pub planes: Vec<PlaneSummary>,
    pub patterns: Vec<PatternCount>,
}

impl From<&RunAccumulator> for RunSummary {
    fn from(acc: &RunAccumulator) -> Self {
        Self {
            trigger_id: acc.trigger_id(),
            n_events: acc.n_events,
            n_triggered: acc.n_triggered,
            efficiency: acc.efficiency_table(),
            planes: acc.planes().map(PlaneSummary::from).collect(),
            patterns: acc
                .patterns
                .iter()
                .map(|(planes, &count)| PatternCount {
                    planes: planes.clone(),
                    count,
                })
                .collect(),
        }
    }
}

/// A simple struct which wraps around the hdf5-rust library.
///
/// Opens an HDF5 file for writing the accumulated histograms of a run, and
/// writes the summary statistics to a YAML sidecar next to it.
#[derive(Debug)]
pub struct ReportWriter {
    #[allow(dead_code)]
    file_handle: File, //Keep the file alive until the writer is closed
    summary_file_path: PathBuf,
    histograms_group: hdf5::Group,
}

impl ReportWriter {
    /// Create the writer, opening a file at path and creating the histogram group
    pub fn new(path: &Path) -> Result<Self, ReportError> {
        let file_handle = File::create(path)?;
        let stem = path.parent().unwrap();
        let report_stem = path.file_stem().unwrap();
        let summary_file_path = stem.join(format!("{}.yml", report_stem.to_string_lossy()));

        let version = format!("{}:{}", env!("CARGO_PKG_NAME"), FORMAT_VERSION);
        let histograms_group = file_handle.create_group(HISTOGRAMS_NAME)?;
        histograms_group
            .new_attr::<VarLenUnicode>()
            .create("version")?
            .write_scalar(&VarLenUnicode::from_str(&version).unwrap())?;
        histograms_group.new_attr::<u32>().create("trigger_id")?;
        histograms_group.new_attr::<u64>().create("n_events")?;
        histograms_group.new_attr::<u64>().create("n_triggered")?;

        Ok(Self {
            file_handle,
            summary_file_path,
            histograms_group,
        })
    }

    /// Write the accumulated histograms of a run
    pub fn write_histograms(&mut self, acc: &RunAccumulator) -> Result<(), ReportError> {
        self.histograms_group
            .attr("trigger_id")?
            .write_scalar(&acc.trigger_id())?;
        self.histograms_group
            .attr("n_events")?
            .write_scalar(&acc.n_events)?;
        self.histograms_group
            .attr("n_triggered")?
            .write_scalar(&acc.n_triggered)?;

        for plane in acc.planes() {
            let plane_group = self
                .histograms_group
                .create_group(&format!("plane_{}", plane.info.label))?;
            plane_group
                .new_attr::<u32>()
                .create("apv_id")?
                .write_scalar(&plane.info.id)?;
            plane_group
                .new_attr::<u64>()
                .create("presence")?
                .write_scalar(&plane.presence)?;
            Self::write_histogram(&plane_group, HITS_NAME, &plane.hits)?;
            Self::write_histogram(&plane_group, CLUSTER_SIZE_NAME, &plane.cluster_size)?;
            Self::write_histogram(&plane_group, MAX_CHARGE_NAME, &plane.max_charge)?;
            Self::write_histogram(&plane_group, SUMMED_CHARGE_NAME, &plane.summed_charge)?;
        }
        Ok(())
    }

    /// Write one histogram as a dataset of bin contents plus binning attributes
    fn write_histogram(
        group: &hdf5::Group,
        name: &str,
        hist: &Histogram,
    ) -> Result<(), ReportError> {
        let dset = group
            .new_dataset_builder()
            .with_data(hist.bin_content())
            .create(name)?;
        dset.new_attr::<VarLenUnicode>()
            .create("title")?
            .write_scalar(&VarLenUnicode::from_str(&hist.title).unwrap_or_default())?;
        dset.new_attr::<u64>()
            .create("n_bins")?
            .write_scalar(&(hist.n_bins() as u64))?;
        dset.new_attr::<f64>()
            .create("x_min")?
            .write_scalar(&hist.x_min())?;
        dset.new_attr::<f64>()
            .create("x_max")?
            .write_scalar(&hist.x_max())?;
        dset.new_attr::<u64>()
            .create("entries")?
            .write_scalar(&hist.entries())?;
        dset.new_attr::<f64>()
            .create("underflow")?
            .write_scalar(&hist.underflow())?;
        dset.new_attr::<f64>()
            .create("overflow")?
            .write_scalar(&hist.overflow())?;
        Ok(())
    }

    /// Write the summary statistics and efficiency table in a separate yaml file
    pub fn write_summary(&self, acc: &RunAccumulator) -> Result<(), ReportError> {
        let summary = RunSummary::from(acc);
        let mut summary_file = std::fs::File::create(&self.summary_file_path)?;
        summary_file.write_all(serde_yaml::to_string(&summary)?.as_bytes())?;
        Ok(())
    }

    /// Consume the writer, logging where the reports landed
    pub fn close(self) -> Result<(), ReportError> {
        log::info!(
            "Histogram report written; summary written to {}",
            self.summary_file_path.display()
        );
        Ok(())
    }
}

/// Print the per-plane efficiency table to the log, one row per plane
pub fn log_efficiency_table(acc: &RunAccumulator) {
    log::info!(
        "Efficiency relative to {} trigger events (plane id {}):",
        acc.n_triggered,
        acc.trigger_id()
    );
    for row in acc.efficiency_table() {
        log::info!(
            "Plane {}\tCounts {}\tErr Counts {:.2}\tEfficiency {:.2}%\tError Eff {:.2}%",
            row.label,
            row.counts,
            row.count_error,
            row.efficiency,
            row.efficiency_error
        );
    }
}

/// Print the hit-pattern table to the log, most common pattern first
pub fn log_pattern_table(acc: &RunAccumulator) {
    let mut sorted: BTreeMap<u64, Vec<&Vec<u32>>> = BTreeMap::new();
    for (pattern, &count) in acc.patterns.iter() {
        sorted.entry(count).or_default().push(pattern);
    }
    log::info!("Hit patterns ({} distinct):", acc.patterns.len());
    for (count, patterns) in sorted.iter().rev() {
        for pattern in patterns {
            log::info!("planes {:?} -> {} events", pattern, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Binning;
    use crate::event::Event;
    use crate::plane_map::PlaneMap;
    use ndarray::array;

    #[test]
    fn test_write_report() {
        let map = PlaneMap::new(None).unwrap();
        let mut acc = RunAccumulator::new(map, 13, &Binning::default()).unwrap();
        acc.process_event(&Event::new(
            0,
            vec![13, 8],
            array![[100_i16, 250], [40, 700]],
        ));

        let report_path = std::env::temp_dir().join("apv_analysis_report_test.h5");
        let summary_path = std::env::temp_dir().join("apv_analysis_report_test.yml");

        let mut writer = ReportWriter::new(&report_path).unwrap();
        writer.write_histograms(&acc).unwrap();
        writer.write_summary(&acc).unwrap();
        writer.close().unwrap();

        // Read back a slice of what was written
        let file = hdf5::File::open(&report_path).unwrap();
        let group = file.group("histograms").unwrap();
        assert_eq!(
            group
                .attr("n_triggered")
                .unwrap()
                .read_scalar::<u64>()
                .unwrap(),
            1
        );
        let plane_7 = group.group("plane_7").unwrap();
        assert_eq!(
            plane_7.attr("apv_id").unwrap().read_scalar::<u32>().unwrap(),
            13
        );
        let hits = plane_7.dataset("hits").unwrap();
        assert_eq!(
            hits.attr("entries").unwrap().read_scalar::<u64>().unwrap(),
            1
        );
        let cluster_size = plane_7.dataset("cluster_size").unwrap();
        assert_eq!(
            cluster_size
                .attr("entries")
                .unwrap()
                .read_scalar::<u64>()
                .unwrap(),
            1
        );

        let yaml_str = std::fs::read_to_string(&summary_path).unwrap();
        assert!(yaml_str.contains("n_triggered: 1"));

        std::fs::remove_file(&report_path).ok();
        std::fs::remove_file(&summary_path).ok();
    }
}
