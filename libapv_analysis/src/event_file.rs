use std::path::{Path, PathBuf};

use super::error::EventFileError;
use super::event::Event;

const EVENTS_NAME: &str = "events";
const PLANE_IDS_NAME: &str = "plane_ids";
const SAMPLES_NAME: &str = "samples";

/// A run's event file, opened for reading.
///
/// The expected HDF5 layout is the one produced by the readout DAQ:
///
/// ```text
/// run_0001.h5
/// events - min_event, max_event, version
/// |---- event_#
/// |    |---- plane_ids (1D u32)
/// |    |---- samples   (2D i16, row i = samples for firing i)
/// ```
///
/// Events are streamed one at a time with [`EventFile::get_next_event`].
#[derive(Debug)]
pub struct EventFile {
    #[allow(dead_code)]
    file_handle: hdf5::File, //Keep the file alive as long as we read from it
    events_group: hdf5::Group,
    path: PathBuf,
    max_event: u64,
    n_events: u64,
    next_event: u64,
    is_ended: bool,
}

impl EventFile {
    /// Open an event file and locate the events group
    pub fn new(path: &Path) -> Result<Self, EventFileError> {
        if !path.exists() {
            return Err(EventFileError::BadFilePath(path.to_path_buf()));
        }
        let file_handle = hdf5::File::open(path)?;
        let events_group = file_handle
            .group(EVENTS_NAME)
            .map_err(|_| EventFileError::MissingData(String::from(EVENTS_NAME)))?;

        let min_event = events_group
            .attr("min_event")
            .map_err(|_| EventFileError::MissingData(String::from("events/min_event")))?
            .read_scalar::<u64>()?;
        let max_event = events_group
            .attr("max_event")
            .map_err(|_| EventFileError::MissingData(String::from("events/max_event")))?
            .read_scalar::<u64>()?;

        // An empty events group is a valid (if useless) run
        let is_ended = events_group.len() == 0;
        let n_events = if is_ended || max_event < min_event {
            0
        } else {
            max_event - min_event + 1
        };

        Ok(Self {
            file_handle,
            events_group,
            path: path.to_path_buf(),
            max_event,
            n_events,
            next_event: min_event,
            is_ended,
        })
    }

    /// Get the next event in the file.
    ///
    /// Returns a `Result<Option<Event>>`. The Option is None if the file has
    /// no more events.
    pub fn get_next_event(&mut self) -> Result<Option<Event>, EventFileError> {
        if self.is_ended {
            return Ok(None);
        }

        let event_id = self.next_event;
        let event_name = format!("event_{event_id}");
        let event_group = self
            .events_group
            .group(&event_name)
            .map_err(|_| EventFileError::MissingData(event_name.clone()))?;

        let plane_ids = event_group
            .dataset(PLANE_IDS_NAME)
            .map_err(|_| EventFileError::MissingData(format!("{event_name}/{PLANE_IDS_NAME}")))?
            .read_1d::<u32>()?
            .to_vec();
        let samples = event_group
            .dataset(SAMPLES_NAME)
            .map_err(|_| EventFileError::MissingData(format!("{event_name}/{SAMPLES_NAME}")))?
            .read_2d::<i16>()?;

        if plane_ids.len() != samples.nrows() {
            return Err(EventFileError::MismatchedLengths(
                event_id,
                plane_ids.len(),
                samples.nrows(),
            ));
        }

        if self.next_event >= self.max_event {
            self.is_ended = true;
        } else {
            self.next_event += 1;
        }

        Ok(Some(Event::new(event_id, plane_ids, samples)))
    }

    /// Number of events the file claims to hold
    pub fn n_events(&self) -> u64 {
        self.n_events
    }

    /// Size of the file on disk
    pub fn get_size_bytes(&self) -> Result<u64, EventFileError> {
        Ok(self.path.metadata()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn write_test_file(path: &Path) {
        let file = hdf5::File::create(path).unwrap();
        let events = file.create_group(EVENTS_NAME).unwrap();
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
            .write_scalar(&1_u64)
            .unwrap();

        let event_0 = events.create_group("event_0").unwrap();
        event_0
            .new_dataset_builder()
            .with_data(&[13_u32, 8])
            .create(PLANE_IDS_NAME)
            .unwrap();
        event_0
            .new_dataset_builder()
            .with_data(&array![[100_i16, 250], [40, 700]])
            .create(SAMPLES_NAME)
            .unwrap();

        let event_1 = events.create_group("event_1").unwrap();
        event_1
            .new_dataset_builder()
            .with_data(&[9_u32])
            .create(PLANE_IDS_NAME)
            .unwrap();
        event_1
            .new_dataset_builder()
            .with_data(&array![[55_i16, 60]])
            .create(SAMPLES_NAME)
            .unwrap();
    }

    #[test]
    fn test_missing_file() {
        let result = EventFile::new(Path::new("/definitely/not/run_0000.h5"));
        assert!(matches!(result, Err(EventFileError::BadFilePath(_))));
    }

    #[test]
    fn test_read_events() {
        let path = std::env::temp_dir().join("apv_analysis_event_file_test.h5");
        write_test_file(&path);

        let mut event_file = EventFile::new(&path).unwrap();
        assert_eq!(event_file.n_events(), 2);

        let first = event_file.get_next_event().unwrap().unwrap();
        assert_eq!(first.event_id, 0);
        assert_eq!(first.plane_ids, vec![13, 8]);
        assert_eq!(first.firing_max(0), Some(250));
        assert_eq!(first.firing_max(1), Some(700));

        let second = event_file.get_next_event().unwrap().unwrap();
        assert_eq!(second.event_id, 1);
        assert_eq!(second.plane_ids, vec![9]);

        assert!(event_file.get_next_event().unwrap().is_none());

        std::fs::remove_file(&path).ok();
    }
}
