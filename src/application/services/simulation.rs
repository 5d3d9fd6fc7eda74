//! Stock depletion simulation
//!
//! Repeatedly draws a code from the ingestion pool, sells one unit of the
//! matching record and removes records whose stock reaches zero, until the
//! tree is empty.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::{info, instrument, warn};

use crate::application::services::ExportService;
use crate::application::EventLog;
use crate::domain::{AvlTree, Code};
use crate::infrastructure::traits::FileSystem;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationOptions {
    /// Pause before every cycle
    pub step_delay: Duration,
    /// Stop after this many cycles even if the tree is not empty
    pub max_cycles: Option<u64>,
    /// Write `step_<cycle>.dot` here after every removal
    pub snapshot_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationReport {
    pub cycles: u64,
    /// Units sold
    pub sales: u64,
    /// Draws that hit an already removed code
    pub out_of_stock: u64,
    pub removals: u64,
    /// True iff the run ended with an empty tree
    pub completed: bool,
}

pub struct SimulationService {
    export: ExportService,
    options: SimulationOptions,
}

impl SimulationService {
    pub fn new(fs: Arc<dyn FileSystem>, options: SimulationOptions) -> Self {
        Self {
            export: ExportService::new(fs),
            options,
        }
    }

    pub fn options(&self) -> &SimulationOptions {
        &self.options
    }

    /// Run until `tree` is empty, the draw pool is empty, or the cycle cap
    /// is reached.
    #[instrument(level = "debug", skip_all, fields(pool = codes.len()))]
    pub fn run<R: Rng>(
        &self,
        tree: &mut AvlTree,
        codes: &[Code],
        rng: &mut R,
        log: &mut EventLog,
    ) -> SimulationReport {
        let mut report = SimulationReport::default();
        log.record("");
        log.record("=== Starting automatic consumption simulation ===");

        while !tree.is_empty() {
            if codes.is_empty() {
                warn!("draw pool is empty but tree still holds {} records", tree.count());
                break;
            }
            if self
                .options
                .max_cycles
                .is_some_and(|max| report.cycles >= max)
            {
                log.record(format!("Cycle limit reached after {} cycles.", report.cycles));
                break;
            }
            if !self.options.step_delay.is_zero() {
                thread::sleep(self.options.step_delay);
            }

            report.cycles += 1;
            let cycle = report.cycles;
            let code = codes[rng.gen_range(0..codes.len())];
            log.record("");
            log.record(format!("[Cycle {cycle}] Drawn code: {code}"));

            let Some(record) = tree.search_mut(code) else {
                report.out_of_stock += 1;
                log.record(format!("Alert: item {code} is out of stock."));
                continue;
            };

            record.reduce_stock(1);
            report.sales += 1;
            if !record.is_depleted() {
                log.record(format!(
                    "Sale: {}. Remaining stock: {}",
                    record.name(),
                    record.stock()
                ));
                continue;
            }

            let name = record.name().to_string();
            log.record(format!("Stock depleted! Removing item {code} ({name})."));
            tree.remove(code);
            report.removals += 1;
            self.snapshot(tree, cycle, log);
            log.record(format!("Item removed. Records in tree: {}", tree.count()));
        }

        report.completed = tree.is_empty();
        log.record("");
        log.record("============================================================");
        if report.completed {
            log.record("Simulation finished: AVL tree is empty. Every item was consumed.");
        } else {
            log.record(format!(
                "Simulation stopped with {} records left in the tree.",
                tree.count()
            ));
        }
        info!(?report, "simulation finished");
        report
    }

    fn snapshot(&self, tree: &AvlTree, cycle: u64, log: &mut EventLog) {
        let Some(dir) = self.options.snapshot_dir.as_ref() else {
            return;
        };
        let path = dir.join(format!("step_{cycle}.dot"));
        if let Err(e) = self.export.write_dot(tree, &path) {
            warn!("snapshot failed: {e}");
            log.record(format!("Snapshot not written ({e})"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Record;
    use crate::infrastructure::traits::RealFileSystem;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn service(options: SimulationOptions) -> SimulationService {
        SimulationService::new(Arc::new(RealFileSystem), options)
    }

    fn stocked(items: &[(Code, u32)]) -> AvlTree {
        items
            .iter()
            .map(|&(code, stock)| Record::new(code, format!("item {code}"), stock, 10.0))
            .collect()
    }

    #[test]
    fn given_stocked_tree_when_running_then_empties_tree() {
        let mut tree = stocked(&[(1, 2), (2, 1), (3, 3)]);
        let mut rng = StdRng::seed_from_u64(7);
        let mut log = EventLog::memory();

        let report = service(SimulationOptions::default()).run(&mut tree, &[1, 2, 3], &mut rng, &mut log);

        assert!(report.completed);
        assert!(tree.is_empty());
        assert_eq!(report.sales, 6);
        assert_eq!(report.removals, 3);
        assert_eq!(report.cycles, report.sales + report.out_of_stock);
        assert!(log.lines().iter().any(|l| l.contains("AVL tree is empty")));
    }

    #[test]
    fn given_same_seed_when_running_twice_then_reports_match() {
        let run = || {
            let mut tree = stocked(&[(10, 3), (20, 2), (30, 4), (40, 1)]);
            let mut rng = StdRng::seed_from_u64(42);
            let mut log = EventLog::memory();
            let report = service(SimulationOptions::default()).run(
                &mut tree,
                &[10, 20, 30, 40],
                &mut rng,
                &mut log,
            );
            (report, log.lines().to_vec())
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn given_empty_pool_when_running_then_stops_without_cycles() {
        let mut tree = stocked(&[(1, 1)]);
        let mut rng = StdRng::seed_from_u64(1);

        let report = service(SimulationOptions::default()).run(&mut tree, &[], &mut rng, &mut EventLog::silent());

        assert_eq!(report.cycles, 0);
        assert!(!report.completed);
        assert_eq!(tree.count(), 1);
    }

    #[test]
    fn given_cycle_cap_when_running_then_stops_at_cap() {
        let mut tree = stocked(&[(1, 100)]);
        let mut rng = StdRng::seed_from_u64(3);
        let options = SimulationOptions {
            max_cycles: Some(5),
            ..SimulationOptions::default()
        };

        let report = service(options).run(&mut tree, &[1], &mut rng, &mut EventLog::silent());

        assert_eq!(report.cycles, 5);
        assert!(!report.completed);
        assert_eq!(tree.search(1).map(Record::stock), Some(95));
    }

    #[test]
    fn given_pool_with_absent_code_when_drawn_then_counts_out_of_stock() {
        let mut tree = stocked(&[(1, 5)]);
        let mut rng = StdRng::seed_from_u64(11);
        let options = SimulationOptions {
            max_cycles: Some(40),
            ..SimulationOptions::default()
        };
        let mut log = EventLog::memory();

        let report = service(options).run(&mut tree, &[1, 99], &mut rng, &mut log);

        assert!(report.completed);
        assert_eq!(report.sales, 5);
        assert_eq!(report.cycles, report.sales + report.out_of_stock);
        if report.out_of_stock > 0 {
            assert!(log.lines().iter().any(|l| l.contains("item 99 is out of stock")));
        }
    }

    #[test]
    fn given_snapshot_dir_when_removing_then_writes_one_file_per_removal() {
        let dir = TempDir::new().unwrap();
        let mut tree = stocked(&[(1, 1), (2, 1), (3, 1)]);
        let mut rng = StdRng::seed_from_u64(5);
        let options = SimulationOptions {
            snapshot_dir: Some(dir.path().join("steps")),
            ..SimulationOptions::default()
        };

        let report = service(options).run(&mut tree, &[1, 2, 3], &mut rng, &mut EventLog::silent());

        let written = std::fs::read_dir(dir.path().join("steps")).unwrap().count();
        assert_eq!(written as u64, report.removals);
        assert_eq!(report.removals, 3);
    }

    #[test]
    fn given_unwritable_snapshot_dir_when_removing_then_run_still_completes() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let mut tree = stocked(&[(1, 1), (2, 1)]);
        let mut rng = StdRng::seed_from_u64(9);
        let options = SimulationOptions {
            snapshot_dir: Some(blocker.join("steps")),
            ..SimulationOptions::default()
        };
        let mut log = EventLog::memory();

        let report = service(options).run(&mut tree, &[1, 2], &mut rng, &mut log);

        assert!(report.completed);
        assert!(log.lines().iter().any(|l| l.starts_with("Snapshot not written")));
    }
}
