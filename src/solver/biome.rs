//! Biome-level cover: organics by planet, then inorganics by the biomes of
//! the chosen planets, falling back to biomes anywhere in the catalog

use std::collections::BTreeSet;

use log::{debug, info, warn};

use super::Solver;
use crate::models::{CapturedResources, PlanetId, ResourceKind, ResourceSets};
use crate::report::{BiomePlan, BiomeSite};

/// Greedy set cover. Each round takes the first entry of `available`
/// covering the most still-uncovered resources, until nothing more can be
/// covered. Returns the chosen indices in pick order and what stayed
/// uncovered.
pub fn greedy_cover(
    required: &BTreeSet<String>,
    available: &[&BTreeSet<String>],
) -> (Vec<usize>, BTreeSet<String>) {
    let mut uncovered = required.clone();
    let mut chosen = Vec::new();

    while !uncovered.is_empty() {
        let mut best: Option<(usize, usize)> = None;
        for (index, offered) in available.iter().enumerate() {
            let gain = offered.intersection(&uncovered).count();
            if gain > 0 && best.is_none_or(|(_, top)| gain > top) {
                best = Some((index, gain));
            }
        }
        let Some((index, _)) = best else {
            break;
        };
        uncovered.retain(|r| !available[index].contains(r));
        chosen.push(index);
    }

    (chosen, uncovered)
}

struct Site {
    planet: PlanetId,
    name: BiomeSite,
    inorganic: BTreeSet<String>,
}

impl Solver<'_> {
    /// Resources the biome cover must reach: everything except
    /// gatherable-only and unique resources.
    pub fn biome_targets(&self) -> ResourceSets {
        let unique = self.taxonomy.unique();
        let mut targets = self.taxonomy.uncaptured(&CapturedResources::default());
        for kind in ResourceKind::ALL {
            let excluded = unique.get(kind);
            targets.get_mut(kind).retain(|r| !excluded.contains(r));
        }
        targets
    }

    /// Listed biomes first, then any biome that only appears in the
    /// resource map.
    fn biome_sites(&self, id: PlanetId) -> Vec<Site> {
        let planet = self.catalog.planet(id);
        let mut names: Vec<&String> = planet.biomes.iter().collect();
        names.extend(
            planet
                .biome_resources
                .keys()
                .filter(|biome| !planet.biomes.contains(*biome)),
        );
        names
            .into_iter()
            .map(|biome| Site {
                planet: id,
                name: BiomeSite {
                    planet: planet.name.clone(),
                    biome: biome.clone(),
                },
                inorganic: planet
                    .biome_resources
                    .get(biome)
                    .map(|resources| resources.inorganic.iter().cloned().collect())
                    .unwrap_or_default(),
            })
            .collect()
    }

    /// Cover organics with whole planets, then inorganics with biomes.
    ///
    /// Biomes of planets already chosen for organics are tried first. Only
    /// what they cannot supply is looked for on other planets, whose
    /// planets then join the selection. Unreachable resources are reported
    /// as missing.
    pub fn cover_biomes(&self) -> BiomePlan {
        let targets = self.biome_targets();
        let planets: Vec<PlanetId> = self.catalog.planet_ids().collect();

        let organics: Vec<BTreeSet<String>> = planets
            .iter()
            .map(|&id| self.catalog.planet(id).resources.organic.iter().cloned().collect())
            .collect();
        let holdings: Vec<&BTreeSet<String>> = organics.iter().collect();
        let (picked, _) = greedy_cover(&targets.organic, &holdings);
        let mut selected: Vec<PlanetId> = picked.into_iter().map(|i| planets[i]).collect();
        debug!("{} planet(s) chosen for organics", selected.len());

        let sites: Vec<Site> = planets.iter().flat_map(|&id| self.biome_sites(id)).collect();
        let local: Vec<usize> = (0..sites.len())
            .filter(|&i| selected.contains(&sites[i].planet))
            .collect();
        let holdings: Vec<&BTreeSet<String>> = local.iter().map(|&i| &sites[i].inorganic).collect();
        let (picked, missing) = greedy_cover(&targets.inorganic, &holdings);
        let mut chosen: Vec<usize> = picked.into_iter().map(|i| local[i]).collect();

        if !missing.is_empty() {
            debug!(
                "Chosen planets' biomes lack {:?}; searching every biome",
                missing
            );
            let holdings: Vec<&BTreeSet<String>> = sites.iter().map(|s| &s.inorganic).collect();
            let (picked, _) = greedy_cover(&missing, &holdings);
            for index in picked {
                let planet = sites[index].planet;
                if !selected.contains(&planet) {
                    debug!("{} added for biome {}", self.catalog.planet(planet).name, sites[index].name);
                    selected.push(planet);
                }
                chosen.push(index);
            }
        }

        let mut covered = ResourceSets::default();
        for &id in &selected {
            covered
                .organic
                .extend(self.catalog.planet(id).resources.organic.iter().cloned());
        }
        for &index in &chosen {
            covered.inorganic.extend(sites[index].inorganic.iter().cloned());
        }
        let mut missing = ResourceSets::default();
        for kind in ResourceKind::ALL {
            let covered = covered.get(kind);
            *missing.get_mut(kind) = targets
                .get(kind)
                .iter()
                .filter(|r| !covered.contains(*r))
                .cloned()
                .collect();
        }
        if !missing.is_empty() {
            warn!(
                "Biome cover leaves {} organic and {} inorganic resources missing",
                missing.organic.len(),
                missing.inorganic.len()
            );
        }

        let plan = BiomePlan::new(
            selected
                .iter()
                .map(|&id| self.catalog.planet(id).name.clone())
                .collect(),
            chosen.iter().map(|&i| sites[i].name.clone()).collect(),
            covered,
            missing,
            self.config.location_cap,
        );
        info!(
            "Biome cover: {} planets, {} biomes",
            plan.planets.len(),
            plan.biomes.len()
        );
        plan
    }
}
