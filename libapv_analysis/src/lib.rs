//! # apv_analysis
//!
//! apv_analysis is the offline analysis for an APV25-based detector plane
//! readout, written in Rust. It takes event files produced by the DAQ in the
//! HDF5 format, filters events on a trigger plane, and accumulates per-plane
//! histograms (hit multiplicity, maximum charge per firing, event-level sum
//! of maximum charges) together with a per-plane efficiency table and a
//! hit-pattern table. Multi-run high-voltage scans reduce each run to its
//! per-plane means for plotting elsewhere.
//!
//! ## Building & Install
//!
//! Before building, HDF5 must be installed. Typically this will be installed
//! using a package manager (homebrew, apt, etc), and the Rust libraries will
//! auto detect the location of the HDF install. If a custom install location
//! is used, write the following snippet into the file `.cargo/config.toml`:
//!
//! ```toml
//! [env]
//! HDF5_DIR="/path/to/my/hdf5/install/"
//!
//! [build]
//! rustflags="-C link-args=-Wl,-rpath,/path/to/my/hdf5/install/lib"
//! ```
//!
//! To build and install the CLI use `cargo install --path ./apv_analysis_cli`
//! from the top level repository.
//!
//! ## Configuration
//!
//! The YAML format of a configuration file is as follows:
//!
//! ```yml
//! data_path: None
//! report_path: None
//! plane_map_path: null
//! trigger_id: 13
//! first_run_number: 0
//! last_run_number: 0
//! n_workers: 1
//! binning:
//!   multiplicity_bins: 150
//!   multiplicity_max: 150.0
//!   charge_bins: 200
//!   charge_max: 2000.0
//!   summed_charge_bins: 200
//!   summed_charge_max: 4000.0
//! hv_levels: []
//! ```
//!
//! Note that if the `plane_map_path` field is set to `null`, the bundled
//! default map will be used. If `hv_levels` is non-empty, a high-voltage scan
//! over the listed runs is performed after the per-run reports.
//!
//! ### Plane Map Format
//!
//! The plane map is a CSV file with *no* whitespaces. The columns are as
//! follows:
//!
//! ```csv
//! apv_id,plane
//! ```
//!
//! `apv_id` is the raw identifier the front end writes to disk, `plane` the
//! label of the physical plane it instruments. Only ids listed in the map are
//! tracked by the accumulators.
//!
//! ## Data Format
//!
//! The expected event file layout is:
//!
//! ```text
//! run_0001.h5
//! events - min_event, max_event, version
//! |---- event_#
//! |    |---- plane_ids (1D u32)
//! |    |---- samples   (2D i16, row i = samples for firing i)
//! ```
//!
//! ## Output
//!
//! apv_analysis will output per run: a histogram report file
//! (`run_####_report.h5`), a YAML summary sidecar with the efficiency table,
//! summary statistics and hit patterns (`run_####_report.yml`), and the
//! efficiency table in the log. The report layout is:
//!
//! ```text
//! run_0001_report.h5
//! histograms - trigger_id, n_events, n_triggered, version
//! |---- plane_#  - apv_id, presence
//! |    |---- hits(dset)          - n_bins, x_min, x_max, entries, underflow, overflow
//! |    |---- cluster_size(dset)  - (same attributes)
//! |    |---- max_charge(dset)    - (same attributes)
//! |    |---- summed_charge(dset) - (same attributes)
//! ```
//!
//! If a high-voltage scan is configured, the scan table is written to
//! `hv_scan.yml` in the report directory.
pub mod accumulator;
pub mod config;
pub mod error;
pub mod event;
pub mod event_file;
pub mod histogram;
pub mod hv_scan;
pub mod plane_map;
pub mod process;
pub mod report;
pub mod stats;
pub mod worker_status;
