use std::collections::BTreeMap;

use super::config::Binning;
use super::error::HistogramError;
use super::event::Event;
use super::histogram::Histogram;
use super::plane_map::{PlaneInfo, PlaneMap};
use super::stats::EfficiencyRow;

/// Largest multiplicity counted as a cluster; bigger bursts are discharge
/// noise and are kept out of the cluster-size statistics
const MAX_CLUSTER_HITS: usize = 10;

/// The running aggregates for one tracked detector plane.
#[derive(Debug, Clone)]
pub struct PlaneAccumulator {
    pub info: PlaneInfo,
    /// Number of trigger events in which this plane fired at all
    pub presence: u64,
    /// Per-event hit multiplicity, zeros included
    pub hits: Histogram,
    /// Per-event hit multiplicity of events where the plane fired,
    /// capped at [`MAX_CLUSTER_HITS`]
    pub cluster_size: Histogram,
    /// Maximum charge sample per firing
    pub max_charge: Histogram,
    /// Event-level sum of per-firing maximum charges
    pub summed_charge: Histogram,
}

impl PlaneAccumulator {
    fn new(info: PlaneInfo, binning: &Binning) -> Result<Self, HistogramError> {
        let label = info.label.as_str();
        let hits = Histogram::new(
            &format!("hCounts_{label}"),
            &format!("Hits of Detector in plane {label} per Event"),
            binning.multiplicity_bins,
            0.0,
            binning.multiplicity_max,
        )?;
        let cluster_size = Histogram::new(
            &format!("hClusterSize_{label}"),
            &format!("Cluster Size of Detector in plane {label}"),
            binning.multiplicity_bins,
            0.0,
            binning.multiplicity_max,
        )?;
        let max_charge = Histogram::new(
            &format!("hMaxQ_{label}"),
            &format!("Maximum Charge of Detector {label}"),
            binning.charge_bins,
            0.0,
            binning.charge_max,
        )?;
        let summed_charge = Histogram::new(
            &format!("hSumMaxCharge_{label}"),
            &format!("Sum of Maximum Charges for Detector {label}"),
            binning.summed_charge_bins,
            0.0,
            binning.summed_charge_max,
        )?;
        Ok(Self {
            info,
            presence: 0,
            hits,
            cluster_size,
            max_charge,
            summed_charge,
        })
    }
}

/// RunAccumulator takes Events and folds them into per-plane aggregates.
///
/// Events are gated on the trigger plane: an event in which the trigger plane
/// did not fire contributes to nothing except the raw event count. For kept
/// events every tracked plane gets its multiplicity filled (zeros included),
/// every tracked firing fills the max-charge histogram, and planes that fired
/// fill the summed-charge histogram. Kept events are also grouped by the set
/// of tracked planes present (the hit pattern).
#[derive(Debug)]
pub struct RunAccumulator {
    map: PlaneMap,
    trigger_id: u32,
    /// All events seen, before the trigger gate
    pub n_events: u64,
    /// Events in which the trigger plane fired
    pub n_triggered: u64,
    planes: BTreeMap<u32, PlaneAccumulator>,
    /// Kept events grouped by the set of tracked planes present
    pub patterns: BTreeMap<Vec<u32>, u64>,
}

impl RunAccumulator {
    /// Create an accumulator for all planes tracked by the map
    pub fn new(map: PlaneMap, trigger_id: u32, binning: &Binning) -> Result<Self, HistogramError> {
        let mut planes = BTreeMap::new();
        for &id in map.ids() {
            if let Some(info) = map.get(id) {
                planes.insert(id, PlaneAccumulator::new(info.clone(), binning)?);
            }
        }
        Ok(Self {
            map,
            trigger_id,
            n_events: 0,
            n_triggered: 0,
            planes,
            patterns: BTreeMap::new(),
        })
    }

    /// Fold one event into the aggregates.
    ///
    /// Returns true if the event passed the trigger gate.
    pub fn process_event(&mut self, event: &Event) -> bool {
        self.n_events += 1;
        if !event.has_plane(self.trigger_id) {
            return false;
        }
        self.n_triggered += 1;

        for (&id, plane) in self.planes.iter_mut() {
            let mult = event.multiplicity(id);
            plane.hits.fill(mult as f64);
            if mult > 0 && mult <= MAX_CLUSTER_HITS {
                plane.cluster_size.fill(mult as f64);
            }
        }

        for (id, max) in event.max_charges(&self.map) {
            if let Some(plane) = self.planes.get_mut(&id) {
                plane.max_charge.fill(max as f64);
            }
        }

        for (id, sum) in event.summed_max_charges(&self.map) {
            if let Some(plane) = self.planes.get_mut(&id) {
                plane.summed_charge.fill(sum);
            }
        }

        let present = event.present_planes(&self.map);
        for &id in present.iter() {
            if let Some(plane) = self.planes.get_mut(&id) {
                plane.presence += 1;
            }
        }
        *self.patterns.entry(present).or_insert(0) += 1;

        true
    }

    /// The per-plane aggregates, in ascending plane id order
    pub fn planes(&self) -> impl Iterator<Item = &PlaneAccumulator> {
        self.planes.values()
    }

    pub fn plane(&self, id: u32) -> Option<&PlaneAccumulator> {
        self.planes.get(&id)
    }

    pub fn trigger_id(&self) -> u32 {
        self.trigger_id
    }

    /// The per-plane efficiency table relative to the trigger-event count
    pub fn efficiency_table(&self) -> Vec<EfficiencyRow> {
        self.planes
            .values()
            .map(|plane| {
                EfficiencyRow::compute(
                    plane.info.id,
                    &plane.info.label,
                    plane.presence,
                    self.n_triggered,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn accumulator() -> RunAccumulator {
        let map = PlaneMap::new(None).unwrap();
        RunAccumulator::new(map, 13, &Binning::default()).unwrap()
    }

    #[test]
    fn test_trigger_gate() {
        let mut acc = accumulator();
        // No plane 13, must be rejected
        let rejected = Event::new(0, vec![8, 9], array![[100_i16, 10], [50, 60]]);
        assert!(!acc.process_event(&rejected));
        assert_eq!(acc.n_events, 1);
        assert_eq!(acc.n_triggered, 0);
        assert_eq!(acc.plane(8).unwrap().hits.entries(), 0);

        let kept = Event::new(1, vec![13, 8], array![[100_i16, 10], [50, 60]]);
        assert!(acc.process_event(&kept));
        assert_eq!(acc.n_events, 2);
        assert_eq!(acc.n_triggered, 1);
    }

    #[test]
    fn test_multiplicity_fills_all_planes() {
        let mut acc = accumulator();
        let event = Event::new(0, vec![13, 13, 8], array![[5_i16], [6], [7]]);
        acc.process_event(&event);
        // Every tracked plane gets a multiplicity fill, zeros included
        for plane in acc.planes() {
            assert_eq!(plane.hits.entries(), 1);
        }
        assert!((acc.plane(13).unwrap().hits.mean() - 2.0).abs() < 1e-12);
        assert!((acc.plane(9).unwrap().hits.mean() - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_charge_histograms() {
        let mut acc = accumulator();
        let event = Event::new(
            0,
            vec![13, 13, 10],
            array![[100_i16, 250, 90], [300, 310, 305], [40, 700, 12]],
        );
        acc.process_event(&event);
        let trigger = acc.plane(13).unwrap();
        // Two firings, two max-charge fills
        assert_eq!(trigger.max_charge.entries(), 2);
        assert!((trigger.max_charge.mean() - 280.0).abs() < 1e-12);
        // One summed-charge fill of 250 + 310
        assert_eq!(trigger.summed_charge.entries(), 1);
        assert!((trigger.summed_charge.mean() - 560.0).abs() < 1e-12);
        // Plane 9 never fired: no charge fills
        assert_eq!(acc.plane(9).unwrap().max_charge.entries(), 0);
        assert_eq!(acc.plane(9).unwrap().summed_charge.entries(), 0);
    }

    #[test]
    fn test_cluster_size_excludes_quiet_events() {
        let mut acc = accumulator();
        // Plane 8 fires in one of two kept events
        acc.process_event(&Event::new(0, vec![13, 8], array![[10_i16], [20]]));
        acc.process_event(&Event::new(1, vec![13], array![[10_i16]]));
        let plane = acc.plane(8).unwrap();
        // The zero-inclusive multiplicity dilutes to 0.5
        assert_eq!(plane.hits.entries(), 2);
        assert!((plane.hits.mean() - 0.5).abs() < 1e-12);
        // Cluster size only counts the event where the plane fired
        assert_eq!(plane.cluster_size.entries(), 1);
        assert!((plane.cluster_size.mean() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cluster_size_excludes_bursts() {
        let mut acc = accumulator();
        // 12 firings of plane 8 in one event, over the burst cutoff
        let mut ids = vec![13];
        ids.extend(std::iter::repeat(8).take(12));
        let samples = ndarray::Array2::<i16>::ones((13, 2));
        acc.process_event(&Event::new(0, ids, samples));
        let plane = acc.plane(8).unwrap();
        assert_eq!(plane.hits.entries(), 1);
        assert!((plane.hits.mean() - 12.0).abs() < 1e-12);
        assert_eq!(plane.cluster_size.entries(), 0);
    }

    #[test]
    fn test_presence_and_patterns() {
        let mut acc = accumulator();
        let samples = array![[10_i16], [20]];
        acc.process_event(&Event::new(0, vec![13, 8], samples.clone()));
        acc.process_event(&Event::new(1, vec![13, 8], samples.clone()));
        acc.process_event(&Event::new(2, vec![13, 9], samples.clone()));
        assert_eq!(acc.plane(13).unwrap().presence, 3);
        assert_eq!(acc.plane(8).unwrap().presence, 2);
        assert_eq!(acc.plane(9).unwrap().presence, 1);
        assert_eq!(acc.patterns[&vec![8, 13]], 2);
        assert_eq!(acc.patterns[&vec![9, 13]], 1);
    }

    #[test]
    fn test_efficiency_table() {
        let mut acc = accumulator();
        let samples = array![[10_i16], [20]];
        for n in 0..4 {
            acc.process_event(&Event::new(n, vec![13, 8], samples.clone()));
        }
        acc.process_event(&Event::new(4, vec![13, 9], samples.clone()));
        let table = acc.efficiency_table();
        assert_eq!(table.len(), 6);
        let row_8 = table.iter().find(|row| row.plane_id == 8).unwrap();
        assert!((row_8.efficiency - 80.0).abs() < 1e-12);
        let row_13 = table.iter().find(|row| row.plane_id == 13).unwrap();
        assert!((row_13.efficiency - 100.0).abs() < 1e-12);
    }
}
