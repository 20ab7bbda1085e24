use std::sync::mpsc::Sender;

use super::accumulator::RunAccumulator;
use super::config::Config;
use super::error::ProcessorError;
use super::event_file::EventFile;
use super::plane_map::PlaneMap;
use super::report::{log_efficiency_table, log_pattern_table, ReportWriter};
use super::worker_status::{BarColor, WorkerStatus};

/// The main loop of apv_analysis.
///
/// Opens the event file of one run, folds every event through the trigger
/// gate into the per-plane accumulators, and writes the histogram report,
/// the YAML summary, and the logged efficiency table.
pub fn process_run(
    config: &Config,
    run_number: i32,
    tx: &Sender<WorkerStatus>,
    worker_id: &usize,
) -> Result<(), ProcessorError> {
    let map = PlaneMap::new(config.plane_map_path.as_deref())?;
    let mut acc = RunAccumulator::new(map, config.trigger_id, &config.binning)?;

    let run_path = config.get_run_file_name(run_number);
    let mut event_file = EventFile::new(&run_path)?;
    log::info!(
        "Run {} event file size: {}",
        run_number,
        human_bytes::human_bytes(event_file.get_size_bytes()? as f64)
    );

    let n_events = event_file.n_events();
    let flush_frac: f32 = 0.01;
    let flush_val = (n_events as f64 * flush_frac as f64) as u64;
    let mut count: u64 = 0;
    let mut progress: f32 = 0.0;

    tx.send(WorkerStatus::new(
        0.0,
        run_number,
        *worker_id,
        BarColor::CYAN,
    ))?;
    while let Some(event) = event_file.get_next_event()? {
        acc.process_event(&event);
        count += 1;
        if count > flush_val {
            count = 0;
            progress += flush_frac;
            tx.send(WorkerStatus::new(
                progress,
                run_number,
                *worker_id,
                BarColor::CYAN,
            ))?;
        }
    }

    log::info!(
        "Run {}: {} events read, {} passed the trigger gate (plane id {}).",
        run_number,
        acc.n_events,
        acc.n_triggered,
        config.trigger_id
    );

    let report_path = config.get_report_file_name(run_number)?;
    let mut writer = ReportWriter::new(&report_path)?;
    writer.write_histograms(&acc)?;
    writer.write_summary(&acc)?;
    writer.close()?;

    log_efficiency_table(&acc);
    log_pattern_table(&acc);

    tx.send(WorkerStatus::new(
        1.0,
        run_number,
        *worker_id,
        BarColor::GREEN,
    ))?;
    Ok(())
}

/// Process a subset of runs.
///
/// A run that fails is logged and skipped so the rest of the batch still
/// completes; there are no retries.
pub fn process_subset(
    config: Config,
    tx: Sender<WorkerStatus>,
    worker_id: usize,
    subset: Vec<i32>,
) -> Result<(), ProcessorError> {
    for run in subset {
        if !config.does_run_exist(run) {
            log::info!("Run {} does not exist, skipping...", run);
            continue;
        }
        log::info!("Processing run {}...", run);
        match process_run(&config, run, &tx, &worker_id) {
            Ok(_) => log::info!("Finished processing run {}.", run),
            Err(e) => {
                log::error!("Run {} failed: {e}", run);
                log::error!("Skipping run {}.", run);
                tx.send(WorkerStatus::new(1.0, run, worker_id, BarColor::RED))?;
            }
        }
    }
    Ok(())
}

/// Divide a run range in to a set of subranges (per thread/worker)
pub fn create_subsets(config: &Config) -> Vec<Vec<i32>> {
    let mut subsets: Vec<Vec<i32>> = vec![Vec::new(); config.n_workers as usize];
    let n_subsets = subsets.len();

    for (idx, run) in (config.first_run_number..(config.last_run_number + 1)).enumerate() {
        subsets[idx % n_subsets].push(run)
    }

    subsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::sync::mpsc::channel;

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

    #[test]
    fn test_process_run_reports_completion() {
        let dir = std::env::temp_dir().join("apv_analysis_process_run_test");
        std::fs::create_dir_all(&dir).unwrap();

        let mut config = Config::default();
        config.data_path = dir.clone();
        config.report_path = dir.clone();
        write_run_file(&config.get_run_file_name(1));

        let (tx, rx) = channel();
        process_run(&config, 1, &tx, &0).unwrap();

        let statuses: Vec<WorkerStatus> = rx.try_iter().collect();
        let last = statuses.last().unwrap();
        assert!((last.progress - 1.0).abs() < f32::EPSILON);
        assert_eq!(last.color, BarColor::GREEN);
        assert!(config.get_report_file_name(1).unwrap().exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_create_subsets() {
        let mut config = Config::default();
        config.first_run_number = 1;
        config.last_run_number = 7;
        config.n_workers = 3;
        let subsets = create_subsets(&config);
        assert_eq!(subsets.len(), 3);
        assert_eq!(subsets[0], vec![1, 4, 7]);
        assert_eq!(subsets[1], vec![2, 5]);
        assert_eq!(subsets[2], vec![3, 6]);
    }

    #[test]
    fn test_create_subsets_more_workers_than_runs() {
        let mut config = Config::default();
        config.first_run_number = 10;
        config.last_run_number = 11;
        config.n_workers = 4;
        let subsets = create_subsets(&config);
        assert_eq!(subsets.len(), 4);
        assert_eq!(subsets[0], vec![10]);
        assert_eq!(subsets[1], vec![11]);
        assert!(subsets[2].is_empty());
        assert!(subsets[3].is_empty());
    }
}
