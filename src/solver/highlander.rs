//! Highlander elimination: there can be only one holder per unique resource
//! and per full chain

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};

use super::{Solver, WorkingState};
use crate::models::PlanetId;
use crate::scoring::best_of;

impl Solver<'_> {
    /// Deduplicate the selection.
    ///
    /// Each unique resource keeps one holder, preferring planets that also
    /// carry a full chain, then the best overall score; the winner's chains
    /// become locked. Remaining full-chain planets compete per identical
    /// chain list and the best scorer against every organic survives.
    /// Planets with neither role are left alone.
    pub fn apply_highlander(&self, state: &mut WorkingState) {
        let selected: Vec<PlanetId> = state.selection.iter().collect();
        let none = BTreeSet::new();

        let mut holders: BTreeMap<&str, Vec<PlanetId>> = BTreeMap::new();
        for &id in &selected {
            for resource in &state.annotations.get(id).unique {
                holders.entry(resource.as_str()).or_default().push(id);
            }
        }

        let mut keep: BTreeSet<PlanetId> = BTreeSet::new();
        let mut locked: BTreeSet<&[String]> = BTreeSet::new();

        for (resource, planets) in &holders {
            let winner = if let [only] = planets.as_slice() {
                Some(*only)
            } else {
                let with_chain: Vec<PlanetId> = planets
                    .iter()
                    .copied()
                    .filter(|&id| state.annotations.get(id).has_full_chain())
                    .collect();
                let pool = if with_chain.is_empty() { planets } else { &with_chain };
                best_of(self.catalog, self.oracle, pool, &none, &none)
            };
            let Some(winner) = winner else { continue };

            debug!(
                "Unique {} kept on {} ({} holders)",
                resource,
                self.catalog.planet(winner).name,
                planets.len()
            );
            keep.insert(winner);
            let chain = &state.annotations.get(winner).full_resource_chain;
            if !chain.is_empty() {
                locked.insert(chain.as_slice());
            }
        }

        let mut by_chain: BTreeMap<&[String], Vec<PlanetId>> = BTreeMap::new();
        for &id in &selected {
            if keep.contains(&id) {
                continue;
            }
            let candidacy = state.annotations.get(id);
            let chain = candidacy.full_resource_chain.as_slice();
            if chain.is_empty() {
                if !candidacy.is_unique_holder() {
                    keep.insert(id);
                }
                continue;
            }
            if locked.contains(chain) {
                continue;
            }
            by_chain.entry(chain).or_default().push(id);
        }

        let all_organics: BTreeSet<String> = self.taxonomy.organic.keys().cloned().collect();
        for (chain, candidates) in &by_chain {
            if let Some(winner) = best_of(self.catalog, self.oracle, candidates, &none, &all_organics)
            {
                debug!(
                    "Chain {:?} kept on {} out of {}",
                    chain,
                    self.catalog.planet(winner).name,
                    candidates.len()
                );
                keep.insert(winner);
            }
        }

        let before = state.selection.len();
        state.selection.retain(|id| keep.contains(&id));
        state.captured = self.recompute_captured(state);
        info!(
            "Highlander elimination: {} -> {} planets",
            before,
            state.selection.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SolverConfig;
    use crate::models::Rarity;
    use crate::scoring::RarityScorer;
    use crate::solver::Solver;
    use crate::testutil::*;

    fn names(catalog: &crate::models::Catalog, state: &crate::solver::WorkingState) -> Vec<String> {
        state
            .selection
            .iter()
            .map(|id| catalog.planet(id).name.clone())
            .collect()
    }

    #[test]
    fn duplicate_chain_keeps_best_scorer() {
        let catalog = catalog(vec![
            ("One", vec![planet("Plain", &["B1", "B2"])]),
            ("Two", vec![planet("Lush", &["B1", "B2"]).with_flora(&["Orchid"])]),
        ]);
        let taxonomy = taxonomy(
            &common(&["B1", "B2"]),
            &[("Orchid", Rarity::Exotic)],
            &[("Beta", &["B1", "B2"])],
        );
        let config = SolverConfig::default();
        let scorer = RarityScorer::new(&taxonomy);
        let solver = Solver::new(&catalog, &taxonomy, &scorer, &config);

        let mut state = solver.capture_unique();
        for id in catalog.planet_ids() {
            state.selection.push(id);
        }
        state.captured = solver.recompute_captured(&state);

        solver.apply_highlander(&mut state);
        assert_eq!(names(&catalog, &state), vec!["Lush"]);
        assert!(state.captured.organic.contains("Orchid"));
    }

    #[test]
    fn shared_unique_prefers_full_chain_holder_and_locks_chain() {
        let catalog = catalog(vec![
            ("One", vec![planet("Bare", &["X", "A", "R1", "R2"])]),
            ("Two", vec![planet("Chained", &["X", "A", "B"])]),
            ("Three", vec![planet("Rival", &["A", "B"])]),
        ]);
        let taxonomy = taxonomy(
            &[
                ("A", Rarity::Common),
                ("B", Rarity::Common),
                ("R1", Rarity::Exotic),
                ("R2", Rarity::Exotic),
                ("X", Rarity::Unique),
            ],
            &[],
            &[("Alpha", &["A", "B"])],
        );
        let config = SolverConfig::default();
        let scorer = RarityScorer::new(&taxonomy);
        let solver = Solver::new(&catalog, &taxonomy, &scorer, &config);

        let mut state = solver.capture_unique();
        state.selection.push(catalog.planet_id("Rival").unwrap());
        assert_eq!(state.selection.len(), 3);

        solver.apply_highlander(&mut state);
        assert_eq!(names(&catalog, &state), vec!["Chained"]);
        assert!(!state.captured.inorganic.contains("R1"));
    }

    #[test]
    fn planets_without_role_survive() {
        let catalog = catalog(vec![("One", vec![planet("Idle", &["A"])])]);
        let taxonomy = taxonomy(&common(&["A", "B"]), &[], &[("Alpha", &["A", "B"])]);
        let config = SolverConfig::default();
        let scorer = RarityScorer::new(&taxonomy);
        let solver = Solver::new(&catalog, &taxonomy, &scorer, &config);

        let mut state = solver.capture_unique();
        state.selection.push(catalog.planet_id("Idle").unwrap());
        solver.apply_highlander(&mut state);
        assert_eq!(state.selection.len(), 1);
    }
}
