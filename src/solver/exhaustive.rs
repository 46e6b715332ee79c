//! Exhaustive full-chain search over every combination of per-group
//! candidates
//!
//! Combinations are enumerated lazily by mixed-radix index: groups in name
//! order, candidates in catalog order, the last group varying fastest. Each
//! worker claims indices from a shared counter and evaluates them on its own
//! copy-on-write clone of the seeded state.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use log::{debug, info, warn};

use super::{Solver, WorkingState};
use crate::models::PlanetId;
use crate::report::{OutpostPlan, SearchReport};

/// Shared flag a caller sets to stop a running search early.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Snapshot handed to the progress callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchProgress {
    pub evaluated: u64,
    pub total: u64,
    pub histogram: BTreeMap<usize, u64>,
    pub min_count: Option<usize>,
}

pub type ProgressFn<'f> = dyn Fn(&SearchProgress) + Sync + 'f;

/// Identity of a plan: selected planet names with their partner bookkeeping.
type PlanKey = Vec<(String, BTreeSet<String>, BTreeSet<String>)>;

fn plan_key(plan: &OutpostPlan) -> PlanKey {
    let mut key: PlanKey = plan
        .outposts
        .iter()
        .map(|o| {
            (
                o.planet.clone(),
                o.candidacy.resource_group_partial.clone(),
                o.candidacy.partner_planets.clone(),
            )
        })
        .collect();
    key.sort();
    key
}

#[derive(Default)]
struct Collector {
    min_count: Option<usize>,
    best: BTreeMap<PlanKey, OutpostPlan>,
    histogram: BTreeMap<usize, u64>,
    evaluated: u64,
}

impl Collector {
    /// Fold one result in. Ties on the key resolve to the smaller plan so the
    /// outcome does not depend on evaluation order.
    fn record(&mut self, plan: OutpostPlan) {
        let count = plan.len();
        self.evaluated += 1;
        *self.histogram.entry(count).or_default() += 1;

        match self.min_count {
            Some(min) if count > min => return,
            Some(min) if count < min => self.best.clear(),
            _ => {}
        }
        self.min_count = Some(count);

        let key = plan_key(&plan);
        match self.best.get(&key) {
            Some(kept) if (&kept.outposts, &kept.halts) <= (&plan.outposts, &plan.halts) => {}
            _ => {
                self.best.insert(key, plan);
            }
        }
    }

    fn snapshot(&self, total: u64) -> SearchProgress {
        SearchProgress {
            evaluated: self.evaluated,
            total,
            histogram: self.histogram.clone(),
            min_count: self.min_count,
        }
    }
}

/// Candidate index for each group, last group varying fastest.
fn decode(mut index: u64, radices: &[u64]) -> Vec<usize> {
    let mut digits = vec![0; radices.len()];
    for (digit, &radix) in digits.iter_mut().zip(radices).rev() {
        *digit = (index % radix) as usize;
        index /= radix;
    }
    digits
}

impl Solver<'_> {
    /// Full-chain planets per group still missing from the seed, outside
    /// committed systems and not yet selected. Returns the searchable groups
    /// and the names of groups with no candidate.
    pub fn chain_candidates(&self, seed: &WorkingState) -> (Vec<(String, Vec<PlanetId>)>, Vec<String>) {
        let captured = self.captured_groups(seed);
        let mut groups = Vec::new();
        let mut skipped = Vec::new();

        for group in self.taxonomy.inorganic_groups.keys() {
            if captured.contains(group) {
                debug!("Group {} already held by the seed selection", group);
                continue;
            }
            let candidates: Vec<PlanetId> = self
                .catalog
                .planet_ids()
                .filter(|&id| {
                    !seed.selection.contains(id)
                        && !seed.processed_systems.contains(&self.catalog.planet(id).system)
                        && seed.annotations.get(id).full_resource_chain.contains(group)
                })
                .collect();
            if candidates.is_empty() {
                warn!("Group {} has no candidate outside committed systems", group);
                skipped.push(group.clone());
            } else {
                groups.push((group.clone(), candidates));
            }
        }
        (groups, skipped)
    }

    /// Add one combination to a clone of the seed and run the rest of the
    /// pipeline on it.
    pub fn evaluate(&self, seed: &WorkingState, combination: &[PlanetId]) -> OutpostPlan {
        let mut state = seed.clone();
        for &id in combination {
            if state.selection.push(id) {
                self.absorb(&mut state, id);
                state.processed_systems.insert(self.catalog.planet(id).system);
            }
        }
        self.complete(state)
    }

    /// Evaluate every combination of per-group candidates and keep the
    /// distinct plans with the fewest outposts.
    pub fn search(&self, cancel: &CancelToken, progress: Option<&ProgressFn<'_>>) -> SearchReport {
        let seed = self.capture_unique();
        let (groups, skipped_groups) = self.chain_candidates(&seed);
        let seeded_groups: Vec<String> = self.captured_groups(&seed).into_iter().collect();

        let radices: Vec<u64> = groups.iter().map(|(_, c)| c.len() as u64).collect();
        let total = radices
            .iter()
            .try_fold(1u64, |acc, &r| acc.checked_mul(r))
            .unwrap_or_else(|| {
                warn!("Combination count overflows; capping at {}", u64::MAX);
                u64::MAX
            });
        let limit = self
            .config
            .max_combinations
            .map_or(total, |budget| budget.min(total));
        let workers = self
            .config
            .worker_count()
            .clamp(1, usize::try_from(limit.max(1)).unwrap_or(usize::MAX));
        info!(
            "Exhaustive search: {} groups, {} combinations, {} workers",
            groups.len(),
            total,
            workers
        );

        let next = AtomicU64::new(0);
        let stop = AtomicBool::new(false);
        let collector = Mutex::new(Collector::default());
        let interval = self.config.progress_interval.max(1);

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    loop {
                        if stop.load(Ordering::SeqCst) || cancel.is_cancelled() {
                            break;
                        }
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        if index >= limit {
                            break;
                        }
                        let combination: Vec<PlanetId> = decode(index, &radices)
                            .into_iter()
                            .zip(&groups)
                            .map(|(digit, (_, candidates))| candidates[digit])
                            .collect();
                        let plan = self.evaluate(&seed, &combination);
                        let count = plan.len();

                        let snapshot = {
                            let mut collected =
                                collector.lock().unwrap_or_else(PoisonError::into_inner);
                            collected.record(plan);
                            (collected.evaluated % interval == 0)
                                .then(|| collected.snapshot(total))
                        };
                        if self.config.target_count.is_some_and(|target| count <= target) {
                            debug!("Combination {} reached target with {} outposts", index, count);
                            stop.store(true, Ordering::SeqCst);
                        }
                        if let (Some(callback), Some(snapshot)) = (progress, snapshot) {
                            callback(&snapshot);
                        }
                    }
                });
            }
        });

        let collected = collector.into_inner().unwrap_or_else(PoisonError::into_inner);
        let report = SearchReport {
            min_count: collected.min_count,
            best: collected.best.into_values().collect(),
            histogram: collected.histogram,
            evaluated: collected.evaluated,
            total,
            cancelled: collected.evaluated < total,
            groups: groups.into_iter().map(|(name, _)| name).collect(),
            seeded_groups,
            skipped_groups,
        };
        info!(
            "Exhaustive search done: {} evaluated, minimum {:?}, {} distinct plans",
            report.evaluated,
            report.min_count,
            report.best.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::config::SolverConfig;
    use crate::scoring::FlatScorer;
    use crate::testutil::*;

    fn fixture() -> (crate::models::Catalog, crate::taxonomy::Taxonomy) {
        let catalog = catalog(vec![
            ("S1", vec![planet("Anvil", &["Iron", "Nickel", "Lithium", "Cobalt"])]),
            ("S2", vec![planet("Bloom", &["Iron", "Nickel"]).with_flora(&["Fiber"])]),
            ("S3", vec![planet("Cairn", &["Lithium", "Cobalt"])]),
        ]);
        let taxonomy = taxonomy(
            &common(&["Iron", "Nickel", "Lithium", "Cobalt"]),
            &common(&["Fiber"]),
            &[("Alloy", &["Iron", "Nickel"]), ("Battery", &["Lithium", "Cobalt"])],
        );
        (catalog, taxonomy)
    }

    #[test]
    fn decode_is_mixed_radix_last_fastest() {
        assert_eq!(decode(0, &[2, 3]), vec![0, 0]);
        assert_eq!(decode(1, &[2, 3]), vec![0, 1]);
        assert_eq!(decode(3, &[2, 3]), vec![1, 0]);
        assert_eq!(decode(5, &[2, 3]), vec![1, 2]);
        assert!(decode(0, &[]).is_empty());
    }

    #[test]
    fn keeps_every_distinct_minimum() {
        let (catalog, taxonomy) = fixture();
        let config = SolverConfig {
            threads: 1,
            ..Default::default()
        };
        let solver = Solver::new(&catalog, &taxonomy, &FlatScorer, &config);

        let report = solver.search(&CancelToken::new(), None);
        assert_eq!(report.total, 4);
        assert_eq!(report.evaluated, 4);
        assert!(!report.cancelled);
        assert_eq!(report.groups, vec!["Alloy", "Battery"]);
        assert!(report.seeded_groups.is_empty());
        assert_eq!(report.min_count, Some(2));
        assert_eq!(report.histogram, BTreeMap::from([(2, 3), (3, 1)]));

        let mut plans: Vec<Vec<&str>> = report
            .best
            .iter()
            .map(|plan| {
                let mut names = plan.planet_names();
                names.sort();
                names
            })
            .collect();
        plans.sort();
        assert_eq!(plans, vec![vec!["Anvil", "Bloom"], vec!["Bloom", "Cairn"]]);
        assert!(report.best.iter().all(|plan| plan.is_success()));
    }

    #[test]
    fn iterative_never_beats_exhaustive() {
        let (catalog, taxonomy) = fixture();
        let config = SolverConfig::default();
        let solver = Solver::new(&catalog, &taxonomy, &FlatScorer, &config);

        let iterative = solver.solve();
        let report = solver.search(&CancelToken::new(), None);
        assert!(iterative.len() >= report.min_count.unwrap());
    }

    #[test]
    fn worker_count_does_not_change_the_result() {
        let (catalog, taxonomy) = fixture();
        let single = SolverConfig {
            threads: 1,
            ..Default::default()
        };
        let many = SolverConfig {
            threads: 4,
            ..Default::default()
        };
        let a = Solver::new(&catalog, &taxonomy, &FlatScorer, &single)
            .search(&CancelToken::new(), None);
        let b = Solver::new(&catalog, &taxonomy, &FlatScorer, &many)
            .search(&CancelToken::new(), None);

        assert_eq!(a.min_count, b.min_count);
        assert_eq!(a.histogram, b.histogram);
        assert_eq!(a.best, b.best);
    }

    #[test]
    fn target_count_stops_early() {
        let (catalog, taxonomy) = fixture();
        let config = SolverConfig {
            threads: 1,
            target_count: Some(2),
            ..Default::default()
        };
        let solver = Solver::new(&catalog, &taxonomy, &FlatScorer, &config);

        let report = solver.search(&CancelToken::new(), None);
        assert_eq!(report.evaluated, 1);
        assert!(report.cancelled);
        assert_eq!(report.min_count, Some(2));
    }

    #[test]
    fn cancelled_token_evaluates_nothing() {
        let (catalog, taxonomy) = fixture();
        let config = SolverConfig::default();
        let solver = Solver::new(&catalog, &taxonomy, &FlatScorer, &config);

        let cancel = CancelToken::new();
        cancel.cancel();
        let report = solver.search(&cancel, None);
        assert_eq!(report.evaluated, 0);
        assert_eq!(report.min_count, None);
        assert!(report.cancelled);
    }

    #[test]
    fn budget_and_progress_snapshots() {
        let (catalog, taxonomy) = fixture();
        let config = SolverConfig {
            threads: 1,
            max_combinations: Some(3),
            progress_interval: 1,
            ..Default::default()
        };
        let solver = Solver::new(&catalog, &taxonomy, &FlatScorer, &config);

        let calls = AtomicUsize::new(0);
        let on_progress = |snapshot: &SearchProgress| {
            assert_eq!(snapshot.total, 4);
            calls.fetch_add(1, Ordering::SeqCst);
        };
        let callback: &ProgressFn<'_> = &on_progress;
        let report = solver.search(&CancelToken::new(), Some(callback));
        assert_eq!(report.evaluated, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(report.cancelled);
    }

    #[test]
    fn groups_without_candidates_are_skipped() {
        let catalog = catalog(vec![("S1", vec![planet("Anvil", &["Iron", "Nickel"])])]);
        let taxonomy = taxonomy(
            &common(&["Iron", "Nickel", "Lithium", "Cobalt"]),
            &[],
            &[("Alloy", &["Iron", "Nickel"]), ("Battery", &["Lithium", "Cobalt"])],
        );
        let config = SolverConfig::default();
        let solver = Solver::new(&catalog, &taxonomy, &FlatScorer, &config);

        let report = solver.search(&CancelToken::new(), None);
        assert_eq!(report.skipped_groups, vec!["Battery"]);
        assert_eq!(report.total, 1);
        assert_eq!(report.min_count, Some(1));
        assert!(!report.best[0].is_success());
    }

    #[test]
    fn groups_held_by_the_seed_are_reported_not_searched() {
        let catalog = catalog(vec![
            ("S1", vec![planet("Vault", &["Z", "Iron", "Nickel"])]),
            ("S2", vec![planet("Bloom", &["Iron", "Nickel"])]),
            ("S3", vec![planet("Cairn", &["Lithium", "Cobalt"])]),
        ]);
        let mut inorganic = common(&["Iron", "Nickel", "Lithium", "Cobalt"]);
        inorganic.push(("Z", crate::models::Rarity::Unique));
        let taxonomy = taxonomy(
            &inorganic,
            &[],
            &[("Alloy", &["Iron", "Nickel"]), ("Battery", &["Lithium", "Cobalt"])],
        );
        let config = SolverConfig::default();
        let solver = Solver::new(&catalog, &taxonomy, &FlatScorer, &config);

        let report = solver.search(&CancelToken::new(), None);
        assert_eq!(report.seeded_groups, vec!["Alloy"]);
        assert_eq!(report.groups, vec!["Battery"]);
        assert_eq!(report.total, 1);
        assert_eq!(report.histogram, BTreeMap::from([(2, 1)]));
        assert!(report.to_string().contains("Held by seed: Alloy"));
    }
}
