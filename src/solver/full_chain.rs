//! Iterative full-chain coverage

use std::collections::BTreeSet;

use log::{debug, info, warn};

use super::{Halt, Solver, WorkingState};
use crate::models::{PlanetId, SystemId};
use crate::scoring::best_of;

impl Solver<'_> {
    /// Groups some selected planet holds as a full chain.
    pub(crate) fn captured_groups(&self, state: &WorkingState) -> BTreeSet<String> {
        state
            .selection
            .iter()
            .flat_map(|id| state.annotations.get(id).full_resource_chain.iter().cloned())
            .collect()
    }

    /// Full chains from `missing` offered by any planet of the system.
    fn offered_groups<'s>(
        &self,
        state: &'s WorkingState,
        system: SystemId,
        missing: &BTreeSet<String>,
    ) -> BTreeSet<&'s str> {
        self.catalog
            .system(system)
            .planets
            .iter()
            .flat_map(|&id| state.annotations.get(id).full_resource_chain.iter())
            .filter(|group| missing.contains(*group))
            .map(String::as_str)
            .collect()
    }

    /// Repeatedly commit the unprocessed system offering the most missing
    /// groups, adding all of its full-chain planets.
    ///
    /// Among the best systems, the planet the oracle rates highest against
    /// the uncaptured organics decides; the first maximum in catalog order
    /// wins ties.
    pub fn cover_full_chains(&self, state: &mut WorkingState) {
        let mut captured_groups = self.captured_groups(state);

        loop {
            let missing: BTreeSet<String> = self
                .taxonomy
                .inorganic_groups
                .keys()
                .filter(|group| !captured_groups.contains(*group))
                .cloned()
                .collect();
            if missing.is_empty() {
                break;
            }

            let mut best_score = 0;
            let mut top_systems: Vec<SystemId> = Vec::new();
            for system in self.catalog.system_ids() {
                if state.processed_systems.contains(&system) {
                    continue;
                }
                let score = self.offered_groups(state, system, &missing).len();
                if score == 0 || score < best_score {
                    continue;
                }
                if score > best_score {
                    best_score = score;
                    top_systems.clear();
                }
                top_systems.push(system);
            }

            if top_systems.is_empty() {
                // Missing groups derive from the selection alone, so a fresh
                // recomputation cannot reopen the search.
                state.captured = self.recompute_captured(state);
                warn!("No system offers a full chain for {:?}", missing);
                state.halts.push(Halt::UnreachableGroups {
                    groups: missing.into_iter().collect(),
                });
                break;
            }

            let candidates: Vec<PlanetId> = top_systems
                .iter()
                .flat_map(|&system| self.catalog.system(system).planets.iter().copied())
                .filter(|&id| {
                    state
                        .annotations
                        .get(id)
                        .full_resource_chain
                        .iter()
                        .any(|group| missing.contains(group))
                })
                .collect();
            let uncaptured_organics = self.taxonomy.uncaptured(&state.captured).organic;
            let Some(best) = best_of(
                self.catalog,
                self.oracle,
                &candidates,
                &BTreeSet::new(),
                &uncaptured_organics,
            ) else {
                break;
            };

            let system_id = self.catalog.planet(best).system;
            let system = self.catalog.system(system_id);
            state.processed_systems.insert(system_id);
            debug!(
                "Committing system {} via {} ({} missing groups offered)",
                system.name,
                self.catalog.planet(best).name,
                best_score
            );

            for &id in &system.planets {
                let chains = state.annotations.get(id).full_resource_chain.clone();
                if chains.is_empty() {
                    continue;
                }
                if state.selection.push(id) {
                    self.absorb(state, id);
                }
                for group in chains {
                    if let Some(members) = self.taxonomy.group(&group) {
                        state.captured.inorganic.extend(members.iter().cloned());
                    }
                    captured_groups.insert(group);
                }
            }
        }

        info!(
            "Full-chain coverage: {} planets, {} systems processed",
            state.selection.len(),
            state.processed_systems.len()
        );
    }
}
