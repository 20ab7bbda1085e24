// Maps raw APV front-end identifiers to physical plane labels:
// apv_id -> PlaneInfo(apv_id, plane label)
// The raw ids are what the DAQ writes to disk; the labels are the plane
// numbers painted on the detector stack, and they are what shows up in
// report names and tables. The map also fixes which ids are tracked at all:
// anything not listed is ignored by every accumulator.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use fxhash::FxHashMap;

use super::error::PlaneMapError;

const ENTRIES_PER_LINE: usize = 2; //Number of elements in a single row in the CSV file

/// Load the default map for windows
#[cfg(target_family = "windows")]
fn load_default_map() -> String {
    String::from(include_str!("data\\default_plane_map.csv"))
}

/// Load the default map for macos and linux
#[cfg(target_family = "unix")]
fn load_default_map() -> String {
    String::from(include_str!("data/default_plane_map.csv"))
}

/// A single tracked detector plane: the raw id used by the readout and the
/// label of the physical plane it instruments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneInfo {
    pub id: u32,
    pub label: String,
}

/// PlaneMap contains the mapping of raw APV identifiers to detector plane labels.
///
/// This can change from experiment to experiment, so PlaneMap reads in a CSV file where
/// each row contains 2 elements: the raw id and the plane label. If no file is given,
/// a default map bundled with the library is used.
#[derive(Debug, Clone, Default)]
pub struct PlaneMap {
    map: FxHashMap<u32, PlaneInfo>,
    ids: Vec<u32>,
}

impl PlaneMap {
    /// Create a new PlaneMap
    /// If the path is None, we load the default that is bundled with the library
    pub fn new(path: Option<&Path>) -> Result<Self, PlaneMapError> {
        let mut contents = String::new();
        if let Some(p) = path {
            let mut file = File::open(p)?;
            file.read_to_string(&mut contents)?;
        } else {
            contents = load_default_map();
        }

        let mut pm = PlaneMap::default();

        let mut lines = contents.lines();
        lines.next(); // Skip the header
        for line in lines {
            let entries: Vec<&str> = line.split_terminator(",").collect();
            if entries.len() != ENTRIES_PER_LINE {
                return Err(PlaneMapError::BadFileFormat);
            }

            let id: u32 = entries[0].trim().parse()?;
            let label = String::from(entries[1].trim());
            let info = PlaneInfo { id, label };
            if pm.map.insert(id, info).is_some() {
                return Err(PlaneMapError::DuplicateID(id));
            }
            pm.ids.push(id);
        }
        pm.ids.sort_unstable();

        Ok(pm)
    }

    /// Get the PlaneInfo for a raw id.
    ///
    /// If returns None the id is not tracked by this map
    pub fn get(&self, id: u32) -> Option<&PlaneInfo> {
        self.map.get(&id)
    }

    /// Check whether a raw id is tracked
    pub fn contains(&self, id: u32) -> bool {
        self.map.contains_key(&id)
    }

    /// The tracked raw ids, in ascending order
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
