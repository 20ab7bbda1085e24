use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::ConfigError;

/// Histogram binning controls. The defaults match the ranges used by the
/// original readout commissioning analysis (ADC full scale ~2000 counts).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Binning {
    pub multiplicity_bins: usize,
    pub multiplicity_max: f64,
    pub charge_bins: usize,
    pub charge_max: f64,
    pub summed_charge_bins: usize,
    pub summed_charge_max: f64,
}

impl Default for Binning {
    fn default() -> Self {
        Self {
            multiplicity_bins: 150,
            multiplicity_max: 150.0,
            charge_bins: 200,
            charge_max: 2000.0,
            summed_charge_bins: 200,
            summed_charge_max: 4000.0,
        }
    }
}

/// One point of a high-voltage scan: a run number and the HV level (in Volts)
/// the detector stack was held at during that run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HvPoint {
    pub run_number: i32,
    pub voltage: f64,
}

/// Structure representing the application configuration. Contains pathing and run information
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data_path: PathBuf,
    pub report_path: PathBuf,
    pub plane_map_path: Option<PathBuf>,
    pub trigger_id: u32,
    pub first_run_number: i32,
    pub last_run_number: i32,
    pub n_workers: i32,
    #[serde(default)]
    pub binning: Binning,
    #[serde(default)]
    pub hv_levels: Vec<HvPoint>,
}

impl Default for Config {
    /// Generate a new Config object. All fields will be empty/invalid
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("None"),
            report_path: PathBuf::from("None"),
            plane_map_path: None,
            trigger_id: 13,
            first_run_number: 0,
            last_run_number: 0,
            n_workers: 1,
            binning: Binning::default(),
            hv_levels: Vec::new(),
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Check if a specific run exists by evaluating the existance of its event file
    pub fn does_run_exist(&self, run_number: i32) -> bool {
        self.get_run_file_name(run_number).exists()
    }

    /// Get the path to the event file for a run
    pub fn get_run_file_name(&self, run_number: i32) -> PathBuf {
        self.data_path
            .join(format!("{}.h5", self.get_run_str(run_number)))
    }

    /// Get the path to the histogram report file for a run
    pub fn get_report_file_name(&self, run_number: i32) -> Result<PathBuf, ConfigError> {
        if self.report_path.exists() {
            Ok(self
                .report_path
                .join(format!("{}_report.h5", self.get_run_str(run_number))))
        } else {
            Err(ConfigError::BadFilePath(self.report_path.clone()))
        }
    }

    /// Get the path to the high-voltage scan report file
    pub fn get_scan_file_name(&self) -> Result<PathBuf, ConfigError> {
        if self.report_path.exists() {
            Ok(self.report_path.join("hv_scan.yml"))
        } else {
            Err(ConfigError::BadFilePath(self.report_path.clone()))
        }
    }

    /// Look up the high-voltage level associated with a run, if any
    pub fn hv_level_for_run(&self, run_number: i32) -> Option<f64> {
        self.hv_levels
            .iter()
            .find(|point| point.run_number == run_number)
            .map(|point| point.voltage)
    }

    /// Construct the run string using the DAQ file naming format
    fn get_run_str(&self, run_number: i32) -> String {
        format!("run_{run_number:0>4}")
    }

    pub fn is_n_workers_valid(&self) -> bool {
        self.n_workers >= 1
    }

    pub fn has_hv_levels(&self) -> bool {
        !self.hv_levels.is_empty()
    }
}
