//! Redundancy elimination: retire full-chain planets whose chains other
//! selected planets can reassemble from partial holdings

use std::collections::BTreeSet;

use log::{debug, info};

use super::{Solver, WorkingState};
use crate::models::PlanetId;

/// Smallest combination of holdings whose union covers `target`.
///
/// Sizes are tried from 1 up to `max_size`; within a size the first
/// combination in lexicographic order wins. Returns indices into `holdings`.
pub fn find_cover(
    holdings: &[&BTreeSet<String>],
    target: &BTreeSet<String>,
    max_size: usize,
) -> Option<Vec<usize>> {
    fn extend(
        holdings: &[&BTreeSet<String>],
        target: &BTreeSet<String>,
        size: usize,
        start: usize,
        chosen: &mut Vec<usize>,
    ) -> bool {
        if chosen.len() == size {
            return target.iter().all(|member| {
                chosen.iter().any(|&i| holdings[i].contains(member))
            });
        }
        let needed = size - chosen.len();
        for i in start..=holdings.len().saturating_sub(needed) {
            chosen.push(i);
            if extend(holdings, target, size, i + 1, chosen) {
                return true;
            }
            chosen.pop();
        }
        false
    }

    let mut chosen = Vec::new();
    for size in 1..=max_size.min(holdings.len()) {
        if extend(holdings, target, size, 0, &mut chosen) {
            return Some(chosen);
        }
        chosen.clear();
    }
    None
}

impl Solver<'_> {
    /// Remove full-chain planets whose every chain can be rebuilt from other
    /// selected planets' partial holdings.
    ///
    /// A partner serves one chain only, and partners from earlier passes
    /// stay committed. Unique holders, planets chosen for organics and
    /// planets already serving as partners are never retired. Returns how
    /// many planets were removed.
    pub fn eliminate_redundant(&self, state: &mut WorkingState) -> usize {
        let selected: Vec<PlanetId> = state.selection.iter().collect();
        let max_size = self.config.max_partner_combination;

        let mut assigned: BTreeSet<PlanetId> = selected
            .iter()
            .copied()
            .filter(|&id| !state.annotations.get(id).resource_group_partial.is_empty())
            .collect();
        let mut removed: BTreeSet<PlanetId> = BTreeSet::new();

        for &planet in &selected {
            let candidacy = state.annotations.get(planet);
            if !candidacy.has_full_chain()
                || candidacy.is_unique_holder()
                || candidacy.supplies_organics()
                || assigned.contains(&planet)
            {
                continue;
            }
            let chains = candidacy.full_resource_chain.clone();

            let mut claimed: BTreeSet<PlanetId> = BTreeSet::new();
            let mut plan: Vec<(String, Vec<PlanetId>)> = Vec::new();
            for chain in &chains {
                let Some(members) = self.taxonomy.group(chain) else {
                    break;
                };
                let pool: Vec<(PlanetId, &BTreeSet<String>)> = selected
                    .iter()
                    .copied()
                    .filter(|&id| {
                        id != planet
                            && !assigned.contains(&id)
                            && !removed.contains(&id)
                            && !claimed.contains(&id)
                    })
                    .filter_map(|id| {
                        state
                            .annotations
                            .get(id)
                            .potential_groups
                            .get(chain)
                            .map(|held| (id, held))
                    })
                    .collect();
                let holdings: Vec<&BTreeSet<String>> = pool.iter().map(|(_, held)| *held).collect();

                let Some(combo) = find_cover(&holdings, members, max_size) else {
                    break;
                };
                let partners: Vec<PlanetId> = combo.into_iter().map(|i| pool[i].0).collect();
                claimed.extend(partners.iter().copied());
                plan.push((chain.clone(), partners));
            }
            if plan.len() != chains.len() {
                continue;
            }

            debug!(
                "{} retired; chains rebuilt from {:?}",
                self.catalog.planet(planet).name,
                plan
            );
            removed.insert(planet);
            for (chain, partners) in plan {
                let names: BTreeSet<String> = partners
                    .iter()
                    .map(|&id| self.catalog.planet(id).name.clone())
                    .collect();
                for &id in &partners {
                    let own = &self.catalog.planet(id).name;
                    let candidacy = state.annotations.get_mut(id);
                    candidacy
                        .resource_group_partial
                        .insert(format!("{chain} (partial)"));
                    candidacy
                        .partner_planets
                        .extend(names.iter().filter(|name| *name != own).cloned());
                    assigned.insert(id);
                }
            }
        }

        if !removed.is_empty() {
            state.selection.retain(|id| !removed.contains(&id));
            info!("Redundancy elimination retired {} planet(s)", removed.len());
        }
        removed.len()
    }
}
