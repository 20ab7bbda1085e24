use clap::{Arg, Command};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::JoinHandle;

use libapv_analysis::config::Config;
use libapv_analysis::error::ProcessorError;
use libapv_analysis::hv_scan::run_hv_scan;
use libapv_analysis::process::{create_subsets, process_subset};
use libapv_analysis::worker_status::{BarColor, WorkerStatus};

fn make_template_config(path: &Path) {
    let config = Config::default();
    let yaml_str = serde_yaml::to_string(&config).unwrap();
    let mut file = File::create(path).expect("Could create template config file!");
    file.write_all(yaml_str.as_bytes())
        .expect("Failed to write yaml data to file!");
}

/// Pick a bar style matching the color a worker asked for
fn bar_style(color: &BarColor) -> ProgressStyle {
    let template = match color {
        BarColor::CYAN => "{msg} [{bar:40.cyan}] {percent}%",
        BarColor::MAGENTA => "{msg} [{bar:40.magenta}] {percent}%",
        BarColor::RED => "{msg} [{bar:40.red}] {percent}%",
        BarColor::GREEN => "{msg} [{bar:40.green}] {percent}%",
    };
    ProgressStyle::with_template(template).expect("Bad progress bar template!")
}

/// Drive a set of worker threads to completion, routing their status
/// messages onto the progress bars
fn watch_workers(
    workers: Vec<JoinHandle<Result<(), ProcessorError>>>,
    rx: &mpsc::Receiver<WorkerStatus>,
    bars: &[ProgressBar],
) {
    let mut workers = workers;
    loop {
        // Drain pending status messages
        loop {
            match rx.try_recv() {
                Ok(status) => {
                    if let Some(bar) = bars.get(status.worker_id) {
                        bar.set_style(bar_style(&status.color));
                        bar.set_message(format!(
                            "Worker {} run {}",
                            status.worker_id, status.run_number
                        ));
                        bar.set_position((status.progress * 100.0) as u64);
                    }
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => break,
            }
        }

        if workers.iter().all(|worker| worker.is_finished()) {
            for worker in workers.drain(..) {
                match worker.join() {
                    Ok(Ok(_)) => log::info!("Worker complete"),
                    Ok(Err(e)) => log::error!("Processor error: {e}"),
                    Err(_) => log::error!("An error occured joining one of the workers!"),
                }
            }
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    for bar in bars {
        bar.finish();
    }
}

fn main() {
    // Create a cli
    let matches = Command::new("apv_analysis_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .help("Path to the file"),
        )
        .get_matches();

    // Initialize feedback
    let logger = simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    LogWrapper::new(pb_manager.clone(), logger)
        .try_init()
        .expect("Could not create logging/progress!");

    // Parse the cli
    let config_path = PathBuf::from(matches.get_one::<String>("path").expect("We require args"));

    if let Some(("new", _)) = matches.subcommand() {
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );

        make_template_config(&config_path);
        log::info!("Done.");
        return;
    }

    // Load our config
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    log::info!("Config successfully loaded.");
    log::info!("Data Path: {}", config.data_path.to_string_lossy());
    log::info!("Report Path: {}", config.report_path.to_string_lossy());
    let map_render_text: String = match &config.plane_map_path {
        Some(p) => p.to_string_lossy().to_string(),
        None => String::from("Default"),
    };
    log::info!("Plane Map: {map_render_text}");
    log::info!("Trigger Plane Id: {}", config.trigger_id);
    log::info!(
        "First Run: {} Last Run: {}",
        config.first_run_number,
        config.last_run_number
    );
    log::info!("Number of Workers: {}", config.n_workers);

    if !config.is_n_workers_valid() {
        log::error!("Number of workers must be at least 1!");
        return;
    }

    // Spin up the workers over the run range
    let (tx, rx) = mpsc::channel::<WorkerStatus>();
    let subsets = create_subsets(&config);
    let mut workers: Vec<JoinHandle<Result<(), ProcessorError>>> = vec![];
    let mut bars: Vec<ProgressBar> = vec![];
    for (idx, subset) in subsets.into_iter().enumerate() {
        // Dont make empty workers
        if subset.is_empty() {
            continue;
        }
        let conf = config.clone();
        let worker_tx = tx.clone();
        let bar = pb_manager.add(ProgressBar::new(100));
        bar.set_style(bar_style(&BarColor::CYAN));
        bar.set_message(format!("Worker {idx}"));
        bars.push(bar);
        workers.push(std::thread::spawn(move || {
            process_subset(conf, worker_tx, idx, subset)
        }));
    }

    watch_workers(workers, &rx, &bars);

    // High-voltage scan, if one was configured
    if config.has_hv_levels() {
        log::info!("Running HV scan over {} points...", config.hv_levels.len());
        let conf = config.clone();
        let scan_tx = tx.clone();
        let bar = pb_manager.add(ProgressBar::new(100));
        bar.set_style(bar_style(&BarColor::MAGENTA));
        bar.set_message("HV scan");
        let scan_worker = std::thread::spawn(move || match run_hv_scan(&conf, &scan_tx, &0) {
            Ok(_) => Ok(()),
            Err(e) => Err(ProcessorError::ScanError(e)),
        });
        watch_workers(vec![scan_worker], &rx, std::slice::from_ref(&bar));
    }

    log::info!("Done.");
}
