//! Outpost selection solver
//!
//! Turns a catalog of planets into a small set of outposts that together
//! capture every required resource. The pipeline runs in phases:
//!
//! 1. [`unique`]: planets holding globally unique resources seed the
//!    selection, pulling in full-chain planets of their systems.
//! 2. [`full_chain`]: one full-chain planet per still-missing resource group,
//!    picked greedily system by system.
//! 3. [`highlander`]: one holder per unique resource and per chain.
//! 4. [`organics`] then [`redundancy`], repeated until organics are covered.
//! 5. [`finalize`]: special resource flags and the coverage report.
//!
//! [`exhaustive`] replaces phase 2 with a search over every combination of
//! per-group candidates. [`biome`] is a separate, coarser cover that picks
//! individual biomes instead of reasoning about chains.

pub mod biome;
pub mod exhaustive;
pub mod finalize;
pub mod full_chain;
pub mod highlander;
pub mod organics;
pub mod redundancy;
pub mod state;
pub mod unique;

use log::{info, warn};

use crate::config::SolverConfig;
use crate::models::{Catalog, CapturedResources, PlanetId, ResourceKind, ResourceSets};
use crate::report::OutpostPlan;
use crate::scoring::ScoringOracle;
use crate::taxonomy::Taxonomy;

pub use exhaustive::{CancelToken, ProgressFn, SearchProgress};
pub use state::{Annotations, Candidacy, Halt, Selection, WorkingState};

/// Read-only context shared by every stage and every exhaustive branch.
pub struct Solver<'a> {
    catalog: &'a Catalog,
    taxonomy: &'a Taxonomy,
    oracle: &'a dyn ScoringOracle,
    config: &'a SolverConfig,
    base: Annotations,
}

impl<'a> Solver<'a> {
    pub fn new(
        catalog: &'a Catalog,
        taxonomy: &'a Taxonomy,
        oracle: &'a dyn ScoringOracle,
        config: &'a SolverConfig,
    ) -> Self {
        let base = precompute(catalog, taxonomy);
        Self {
            catalog,
            taxonomy,
            oracle,
            config,
            base,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        self.taxonomy
    }

    pub fn config(&self) -> &SolverConfig {
        self.config
    }

    /// Planet-local annotations (uniques and full chains) before any stage runs.
    pub fn base_annotations(&self) -> &Annotations {
        &self.base
    }

    /// Run the iterative pipeline.
    pub fn solve(&self) -> OutpostPlan {
        let mut state = self.capture_unique();
        self.cover_full_chains(&mut state);
        self.complete(state)
    }

    /// Highlander elimination, the organic loop and finalization.
    pub(crate) fn complete(&self, mut state: WorkingState) -> OutpostPlan {
        self.apply_highlander(&mut state);
        self.settle_organics(&mut state);
        self.finalize(&mut state)
    }

    /// Alternate organic cover and redundancy elimination until every
    /// required organic is captured, no candidate can help, or the round
    /// limit is reached.
    pub fn settle_organics(&self, state: &mut WorkingState) {
        let mut rounds = 0;
        loop {
            let remaining = self.taxonomy.uncaptured(&state.captured).organic;
            if remaining.is_empty() {
                break;
            }
            if rounds >= self.config.max_organic_rounds {
                warn!(
                    "Organic cover stopped after {} rounds with {} organics uncaptured",
                    rounds,
                    remaining.len()
                );
                state.halts.push(Halt::RoundLimit { rounds });
                break;
            }
            rounds += 1;

            let missing = self.cover_organics(state, remaining);
            self.eliminate_redundant(state);
            state.captured = self.recompute_captured(state);

            if let Some(missing) = missing {
                state.halts.push(Halt::OrganicsUnavailable {
                    resources: missing.into_iter().collect(),
                });
                break;
            }
        }
        info!(
            "Organic cover finished after {} round(s): {} planets selected",
            rounds,
            state.selection.len()
        );
    }

    /// Resources a selected planet guarantees: its inventory, its unique
    /// resources and the organics it was chosen for.
    pub(crate) fn contribution(&self, state: &WorkingState, id: PlanetId) -> ResourceSets {
        let planet = self.catalog.planet(id);
        let candidacy = state.annotations.get(id);
        let mut sets = ResourceSets::default();

        sets.inorganic.extend(planet.resources.inorganic.iter().cloned());
        sets.organic.extend(planet.resources.organic.iter().cloned());
        sets.organic.extend(candidacy.other.iter().cloned());
        for resource in &candidacy.unique {
            if self.taxonomy.organic.contains_key(resource) {
                sets.organic.insert(resource.clone());
            } else {
                sets.inorganic.insert(resource.clone());
            }
        }
        sets
    }

    pub(crate) fn absorb(&self, state: &mut WorkingState, id: PlanetId) {
        let sets = self.contribution(state, id);
        for kind in ResourceKind::ALL {
            state.captured.get_mut(kind).extend(sets.get(kind).iter().cloned());
        }
    }

    /// Captured resources rebuilt from scratch out of the current selection.
    pub fn recompute_captured(&self, state: &WorkingState) -> CapturedResources {
        let mut captured = CapturedResources::default();
        for id in state.selection.iter() {
            let sets = self.contribution(state, id);
            captured.inorganic.extend(sets.inorganic);
            captured.organic.extend(sets.organic);
        }
        captured
    }
}

/// Uniques (minus gatherable-only) and full chains for every planet.
fn precompute(catalog: &Catalog, taxonomy: &Taxonomy) -> Annotations {
    let unique = taxonomy.unique();
    let records = catalog
        .planets()
        .iter()
        .map(|planet| {
            let mut found: Vec<String> = planet
                .resources
                .inorganic
                .iter()
                .filter(|r| unique.inorganic.contains(*r))
                .cloned()
                .collect();
            found.extend(
                planet
                    .all_organics()
                    .into_iter()
                    .filter(|r| unique.organic.contains(*r))
                    .map(str::to_string),
            );
            found.retain(|r| !taxonomy.is_gatherable_only(r));
            found.sort();
            found.dedup();

            Candidacy {
                unique: found,
                full_resource_chain: taxonomy.full_chains(planet),
                ..Default::default()
            }
        })
        .collect();
    Annotations::new(records)
}
