//! Greedy cover of the remaining organic resources

use std::collections::BTreeSet;

use log::{debug, warn};

use super::{Solver, WorkingState};
use crate::models::{Planet, PlanetId};

impl Solver<'_> {
    /// Organics from `wanted` the planet can farm: domesticable flora, and
    /// domesticable fauna recognized by the fauna group.
    pub fn capturable_organics(&self, planet: &Planet, wanted: &BTreeSet<String>) -> BTreeSet<String> {
        let fauna_group = self.taxonomy.fauna_group();
        let flora = planet
            .flora
            .domesticable
            .keys()
            .filter(|r| wanted.contains(*r));
        let fauna = planet
            .fauna
            .domesticable
            .keys()
            .filter(|r| fauna_group.contains(*r) && wanted.contains(*r));
        flora.chain(fauna).cloned().collect()
    }

    /// Add planets until `remaining` is covered.
    ///
    /// Every contributing candidate is eligible; the one touching the most
    /// distinct inorganic groups wins, first encountered on ties. Returns the
    /// organics no candidate could supply, if any.
    pub fn cover_organics(
        &self,
        state: &mut WorkingState,
        remaining: BTreeSet<String>,
    ) -> Option<BTreeSet<String>> {
        let mut remaining: BTreeSet<String> = remaining
            .into_iter()
            .filter(|r| !state.captured.organic.contains(r))
            .collect();
        let mut candidates: Vec<PlanetId> = self
            .catalog
            .planet_ids()
            .filter(|&id| !state.selection.contains(id))
            .collect();

        while !remaining.is_empty() {
            // (candidate index, planet, organics it adds, groups it touches)
            let mut best: Option<(usize, PlanetId, BTreeSet<String>, usize)> = None;

            for (index, &id) in candidates.iter().enumerate() {
                let planet = self.catalog.planet(id);
                let capturable = self.capturable_organics(planet, &remaining);
                if capturable.is_empty() {
                    continue;
                }
                let touched = self.taxonomy.touched_group_count(planet);
                if best.as_ref().is_none_or(|(_, _, _, top)| touched > *top) {
                    best = Some((index, id, capturable, touched));
                }
            }

            let Some((index, id, captured, _)) = best else {
                warn!("No planet can supply organics {:?}", remaining);
                return Some(remaining);
            };

            let planet = self.catalog.planet(id);
            debug!("{} added for organics {:?}", planet.name, captured);
            state.selection.push(id);
            let candidacy = state.annotations.get_mut(id);
            candidacy.other = captured.iter().cloned().collect();
            candidacy.potential_groups = self.taxonomy.partial_groups(planet);

            for resource in &captured {
                remaining.remove(resource);
            }
            state.captured.organic.extend(captured);
            candidates.remove(index);
        }

        None
    }
}
