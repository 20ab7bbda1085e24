/// Which color the progress bar of a worker should take. Doubles as a
/// phase indicator: CYAN while accumulating a run, MAGENTA during the HV
/// scan, RED after a failed run, GREEN once a run is complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BarColor {
    #[default]
    CYAN,
    MAGENTA,
    RED,
    GREEN,
}

/// A progress message sent from a worker to the UI/CLI
#[derive(Debug, Clone, Default)]
pub struct WorkerStatus {
    pub progress: f32,
    pub run_number: i32,
    pub worker_id: usize,
    pub color: BarColor,
}

impl WorkerStatus {
    pub fn new(progress: f32, run_number: i32, worker_id: usize, color: BarColor) -> Self {
        Self {
            progress,
            run_number,
            worker_id,
            color,
        }
    }
}
