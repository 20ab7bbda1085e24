use fxhash::FxHashMap;
use ndarray::Array2;

use super::plane_map::PlaneMap;

/// A single readout event.
///
/// `plane_ids` has one entry per firing (a plane can fire more than once per
/// event). `samples` is aligned by row with `plane_ids`: row `i` holds the raw
/// ADC samples recorded for firing `i`.
#[derive(Debug, Clone, Default)]
pub struct Event {
    pub event_id: u64,
    pub plane_ids: Vec<u32>,
    pub samples: Array2<i16>,
}

impl Event {
    pub fn new(event_id: u64, plane_ids: Vec<u32>, samples: Array2<i16>) -> Self {
        Self {
            event_id,
            plane_ids,
            samples,
        }
    }

    /// Number of firings in this event
    pub fn n_firings(&self) -> usize {
        self.plane_ids.len()
    }

    /// Did the given plane fire at least once in this event?
    pub fn has_plane(&self, id: u32) -> bool {
        self.plane_ids.contains(&id)
    }

    /// How many times the given plane fired in this event
    pub fn multiplicity(&self, id: u32) -> usize {
        self.plane_ids.iter().filter(|&&fired| fired == id).count()
    }

    /// The maximum charge sample of firing `row`, None if there are no samples
    pub fn firing_max(&self, row: usize) -> Option<i16> {
        self.samples.row(row).iter().copied().max()
    }

    /// The per-firing maximum charges of all tracked planes: (id, max) pairs
    pub fn max_charges(&self, map: &PlaneMap) -> Vec<(u32, i16)> {
        let mut maxima = Vec::new();
        for (row, &id) in self.plane_ids.iter().enumerate() {
            if !map.contains(id) {
                continue;
            }
            if let Some(max) = self.firing_max(row) {
                maxima.push((id, max));
            }
        }
        maxima
    }

    /// The event-level sum of per-firing maximum charges, per tracked plane.
    ///
    /// Only planes that fired at least once appear in the result.
    pub fn summed_max_charges(&self, map: &PlaneMap) -> FxHashMap<u32, f64> {
        let mut sums = FxHashMap::default();
        for (id, max) in self.max_charges(map) {
            *sums.entry(id).or_insert(0.0) += max as f64;
        }
        sums
    }

    /// The distinct tracked planes present in this event, in ascending order
    pub fn present_planes(&self, map: &PlaneMap) -> Vec<u32> {
        let mut present: Vec<u32> = map
            .ids()
            .iter()
            .copied()
            .filter(|&id| self.has_plane(id))
            .collect();
        present.sort_unstable();
        present
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn test_event() -> Event {
        // Three firings: plane 13 twice, plane 8 once. Plane 99 is untracked.
        let plane_ids = vec![13, 8, 13, 99];
        let samples = array![
            [100_i16, 250, 90],
            [40, 700, 12],
            [300, 310, 305],
            [999, 999, 999]
        ];
        Event::new(0, plane_ids, samples)
    }

    #[test]
    fn test_multiplicity() {
        let event = test_event();
        assert!(event.has_plane(13));
        assert!(!event.has_plane(12));
        assert_eq!(event.multiplicity(13), 2);
        assert_eq!(event.multiplicity(8), 1);
        assert_eq!(event.multiplicity(12), 0);
    }

    #[test]
    fn test_max_charges() {
        let map = PlaneMap::new(None).unwrap();
        let event = test_event();
        let maxima = event.max_charges(&map);
        assert_eq!(maxima, vec![(13, 250), (8, 700), (13, 310)]);
    }

    #[test]
    fn test_summed_max_charges() {
        let map = PlaneMap::new(None).unwrap();
        let event = test_event();
        let sums = event.summed_max_charges(&map);
        assert_eq!(sums.len(), 2);
        assert_eq!(sums[&13], 560.0);
        assert_eq!(sums[&8], 700.0);
    }

    #[test]
    fn test_present_planes() {
        let map = PlaneMap::new(None).unwrap();
        let event = test_event();
        assert_eq!(event.present_planes(&map), vec![8, 13]);
    }

    #[test]
    fn test_empty_samples() {
        let event = Event::new(0, vec![13], Array2::<i16>::zeros((1, 0)));
        assert_eq!(event.firing_max(0), None);
        let map = PlaneMap::new(None).unwrap();
        assert!(event.max_charges(&map).is_empty());
    }
}
