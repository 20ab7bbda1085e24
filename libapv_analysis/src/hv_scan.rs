use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::mpsc::Sender;

use super::accumulator::RunAccumulator;
use super::config::Config;
use super::error::HvScanError;
use super::event_file::EventFile;
use super::plane_map::PlaneMap;
use super::worker_status::{BarColor, WorkerStatus};

/// Per-plane entry of one scan point: mean cluster size (hit multiplicity
/// over events where the plane fired) and mean summed max charge, each with
/// its error on the mean.
#[derive(Debug, Clone, Serialize)]
pub struct PlaneScanEntry {
    pub cluster_size: f64,
    pub cluster_size_error: f64,
    pub summed_charge: f64,
    pub summed_charge_error: f64,
}

/// One point of the high-voltage scan: the aggregates of a single run
#[derive(Debug, Clone, Serialize)]
pub struct ScanPoint {
    pub run_number: i32,
    pub voltage: f64,
    pub n_triggered: u64,
    pub planes: BTreeMap<String, PlaneScanEntry>,
}

impl ScanPoint {
    fn new(run_number: i32, voltage: f64, acc: &RunAccumulator) -> Self {
        let mut planes = BTreeMap::new();
        for plane in acc.planes() {
            planes.insert(
                plane.info.label.clone(),
                PlaneScanEntry {
                    cluster_size: plane.cluster_size.mean(),
                    cluster_size_error: plane.cluster_size.mean_error(),
                    summed_charge: plane.summed_charge.mean(),
                    summed_charge_error: plane.summed_charge.mean_error(),
                },
            );
        }
        Self {
            run_number,
            voltage,
            n_triggered: acc.n_triggered,
            planes,
        }
    }
}

/// Accumulate one run of the scan without writing per-run reports
fn accumulate_run(config: &Config, run_number: i32) -> Result<RunAccumulator, HvScanError> {
    let map = PlaneMap::new(config.plane_map_path.as_deref())?;
    let mut acc = RunAccumulator::new(map, config.trigger_id, &config.binning)?;
    let mut event_file = EventFile::new(&config.get_run_file_name(run_number))?;
    while let Some(event) = event_file.get_next_event()? {
        acc.process_event(&event);
    }
    Ok(acc)
}

/// Write the scan table as YAML
fn write_scan_report(
    path: &std::path::Path,
    scan: &[ScanPoint],
) -> Result<(), super::error::ReportError> {
    let mut scan_file = std::fs::File::create(path)?;
    scan_file.write_all(serde_yaml::to_string(scan)?.as_bytes())?;
    Ok(())
}

/// Run the high-voltage scan over all configured (run, HV) points.
///
/// Each run is re-read and accumulated from scratch, then reduced to its
/// per-plane means. Runs whose event file is missing or unreadable are
/// skipped with a log message. The scan table is written as YAML to the
/// configured report directory.
pub fn run_hv_scan(
    config: &Config,
    tx: &Sender<WorkerStatus>,
    worker_id: &usize,
) -> Result<(), HvScanError> {
    if !config.has_hv_levels() {
        return Err(HvScanError::NoScanPoints);
    }

    let n_points = config.hv_levels.len();
    let mut scan: Vec<ScanPoint> = Vec::with_capacity(n_points);

    tx.send(WorkerStatus::new(0.0, 0, *worker_id, BarColor::MAGENTA))?;
    for (idx, point) in config.hv_levels.iter().enumerate() {
        if !config.does_run_exist(point.run_number) {
            log::warn!(
                "Run {} of the HV scan has no event file, skipping...",
                point.run_number
            );
            continue;
        }
        log::info!(
            "Scanning run {} at {} V...",
            point.run_number,
            point.voltage
        );
        match accumulate_run(config, point.run_number) {
            Ok(acc) => scan.push(ScanPoint::new(point.run_number, point.voltage, &acc)),
            Err(e) => log::error!(
                "Run {} of the HV scan could not be read: {}. Skipping...",
                point.run_number,
                e
            ),
        }
        tx.send(WorkerStatus::new(
            (idx + 1) as f32 / n_points as f32,
            point.run_number,
            *worker_id,
            BarColor::MAGENTA,
        ))?;
    }

    let scan_path = config.get_scan_file_name()?;
    write_scan_report(&scan_path, &scan)?;
    log::info!(
        "HV scan with {} points written to {}",
        scan.len(),
        scan_path.display()
    );
    tx.send(WorkerStatus::new(1.0, 0, *worker_id, BarColor::GREEN))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Binning;
    use crate::event::Event;
    use ndarray::array;

    #[test]
    fn test_scan_point_reduction() {
        let map = PlaneMap::new(None).unwrap();
        let mut acc = RunAccumulator::new(map, 13, &Binning::default()).unwrap();
        acc.process_event(&Event::new(
            0,
            vec![13, 13, 8],
            array![[100_i16, 250], [40, 310], [10, 20]],
        ));
        acc.process_event(&Event::new(1, vec![13], array![[90_i16, 200]]));

        let point = ScanPoint::new(6578, 500.0, &acc);
        assert_eq!(point.n_triggered, 2);
        let trigger_plane = &point.planes["7"];
        // Multiplicities 2 and 1
        assert!((trigger_plane.cluster_size - 1.5).abs() < 1e-12);
        // Summed max charges 560 and 200
        assert!((trigger_plane.summed_charge - 380.0).abs() < 1e-12);
        // Plane 8 only fired in the first event, so the quiet second event
        // must not drag its cluster size down to 0.5
        assert!((point.planes["2"].cluster_size - 1.0).abs() < 1e-12);
        // Planes that never fired sit at zero
        assert_eq!(point.planes["3"].cluster_size, 0.0);
    }

    #[test]
    fn test_scan_skips_unreadable_runs() {
        use crate::config::HvPoint;
        use std::sync::mpsc::channel;

        let dir = std::env::temp_dir().join("apv_analysis_hv_scan_test");
        std::fs::create_dir_all(&dir).unwrap();

        let mut config = Config::default();
        config.data_path = dir.clone();
        config.report_path = dir.clone();
        config.hv_levels = vec![
            HvPoint {
                run_number: 1,
                voltage: 480.0,
            },
            HvPoint {
                run_number: 2,
                voltage: 500.0,
            },
        ];

        write_run_file(&config.get_run_file_name(1));
        // Run 2 exists on disk but has no events group
        hdf5::File::create(config.get_run_file_name(2)).unwrap();

        let (tx, _rx) = channel();
        run_hv_scan(&config, &tx, &0).unwrap();

        let scan_text = std::fs::read_to_string(config.get_scan_file_name().unwrap()).unwrap();
        assert!(scan_text.contains("run_number: 1"));
        assert!(!scan_text.contains("run_number: 2"));

        std::fs::remove_dir_all(&dir).ok();
    }

    fn write_run_file(path: &std::path::Path) {
        let file = hdf5::File::create(path).unwrap();
        let events = file.create_group("events").unwrap();
        events
            .new_attr::<u64>()
            .create("min_event")
            .unwrap()
            .write_scalar(&0_u64)
            .unwrap();
        events
            .new_attr::<u64>()
            .create("max_event")
            .unwrap()
            .write_scalar(&0_u64)
            .unwrap();
        let event_0 = events.create_group("event_0").unwrap();
        event_0
            .new_dataset_builder()
            .with_data(&[13_u32, 8])
            .create("plane_ids")
            .unwrap();
        event_0
            .new_dataset_builder()
            .with_data(&array![[100_i16, 250], [40, 700]])
            .create("samples")
            .unwrap();
    }
}
