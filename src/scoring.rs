//! Planet desirability scoring, used by the solver only to break ties

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Catalog, Planet, PlanetId, ResourceKind};
use crate::taxonomy::Taxonomy;

/// Planet name to score.
pub type Scores = BTreeMap<String, f64>;

/// Weight of a domesticable resource outside the recognized farmable groups.
const OFF_GROUP_RELEVANCE: f64 = 0.25;

/// Scores candidate planets against desired resource subsets.
///
/// Implementations must be pure: the same inputs always give the same scores.
/// Planets missing from the returned map are treated as scoring lowest.
pub trait ScoringOracle: Sync {
    fn score(
        &self,
        planets: &[&Planet],
        desired_inorganic: &BTreeSet<String>,
        desired_organic: &BTreeSet<String>,
    ) -> Scores;
}

/// Scores planets by the rarity of the desired resources they hold.
///
/// With both desired sets empty every resource on the planet counts, giving
/// an overall score.
#[derive(Debug, Clone, Copy)]
pub struct RarityScorer<'a> {
    taxonomy: &'a Taxonomy,
}

impl<'a> RarityScorer<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self { taxonomy }
    }

    fn score_planet(
        &self,
        planet: &Planet,
        desired_inorganic: &BTreeSet<String>,
        desired_organic: &BTreeSet<String>,
    ) -> f64 {
        let overall = desired_inorganic.is_empty() && desired_organic.is_empty();

        let inorganic: f64 = planet
            .resources
            .inorganic
            .iter()
            .filter(|r| overall || desired_inorganic.contains(*r))
            .map(|r| self.taxonomy.rarity_of(ResourceKind::Inorganic, r).weight())
            .sum();

        let relevance = |resources: &BTreeMap<String, String>, group: &BTreeSet<String>| -> f64 {
            resources
                .keys()
                .map(|r| if group.contains(r) { 1.0 } else { OFF_GROUP_RELEVANCE })
                .sum()
        };
        let flora_relevance = relevance(&planet.flora.domesticable, self.taxonomy.flora_group());
        let fauna_relevance = relevance(&planet.fauna.domesticable, self.taxonomy.fauna_group());
        let total_relevance = flora_relevance + fauna_relevance;

        let organic = if total_relevance > 0.0 {
            let rarity_sum = |resources: &BTreeMap<String, String>| -> f64 {
                resources
                    .keys()
                    .filter(|r| overall || desired_organic.contains(*r))
                    .map(|r| self.taxonomy.rarity_of(ResourceKind::Organic, r).weight())
                    .sum()
            };
            rarity_sum(&planet.flora.domesticable) * flora_relevance / total_relevance
                + rarity_sum(&planet.fauna.domesticable) * fauna_relevance / total_relevance
        } else {
            0.0
        };

        inorganic + organic
    }
}

impl ScoringOracle for RarityScorer<'_> {
    fn score(
        &self,
        planets: &[&Planet],
        desired_inorganic: &BTreeSet<String>,
        desired_organic: &BTreeSet<String>,
    ) -> Scores {
        planets
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    self.score_planet(p, desired_inorganic, desired_organic),
                )
            })
            .collect()
    }
}

/// An oracle with no opinion; ties fall back to catalog order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatScorer;

impl ScoringOracle for FlatScorer {
    fn score(&self, _: &[&Planet], _: &BTreeSet<String>, _: &BTreeSet<String>) -> Scores {
        Scores::new()
    }
}

/// Highest-scoring candidate; the first encountered wins ties.
pub fn best_of(
    catalog: &Catalog,
    oracle: &dyn ScoringOracle,
    candidates: &[PlanetId],
    desired_inorganic: &BTreeSet<String>,
    desired_organic: &BTreeSet<String>,
) -> Option<PlanetId> {
    let planets: Vec<&Planet> = candidates.iter().map(|&id| catalog.planet(id)).collect();
    let scores = oracle.score(&planets, desired_inorganic, desired_organic);

    let mut best: Option<(PlanetId, f64)> = None;
    for &id in candidates {
        let score = scores
            .get(&catalog.planet(id).name)
            .copied()
            .filter(|s| !s.is_nan())
            .unwrap_or(f64::NEG_INFINITY);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((id, score)),
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rarity, SystemRecord};

    fn setup() -> (Catalog, Taxonomy) {
        let mut taxonomy = Taxonomy::default();
        taxonomy.inorganic.insert("Iron".into(), Rarity::Common);
        taxonomy.inorganic.insert("Ionic".into(), Rarity::Exotic);
        taxonomy.organic.insert("Fiber".into(), Rarity::Common);
        taxonomy.organic.insert("Venom".into(), Rarity::Rare);
        taxonomy
            .organic_groups
            .insert("fauna".into(), ["Venom".to_string()].into_iter().collect());

        let mut plain = Planet::new("Plain");
        plain.resources.inorganic = vec!["Iron".into()];
        let mut exotic = Planet::new("Exotic");
        exotic.resources.inorganic = vec!["Iron".into(), "Ionic".into()];
        let mut zoo = Planet::new("Zoo");
        zoo.fauna.domesticable.insert("Venom".into(), "Ashta".into());

        let catalog = Catalog::from_records(vec![SystemRecord {
            name: "Sys".into(),
            planets: vec![plain, exotic, zoo],
        }])
        .unwrap();
        (catalog, taxonomy)
    }

    #[test]
    fn overall_score_prefers_rarer_holdings() {
        let (catalog, taxonomy) = setup();
        let scorer = RarityScorer::new(&taxonomy);
        let ids: Vec<_> = catalog.planet_ids().collect();
        let best = best_of(&catalog, &scorer, &ids, &BTreeSet::new(), &BTreeSet::new());
        assert_eq!(best, catalog.planet_id("Exotic"));
    }

    #[test]
    fn desired_organics_steer_the_score() {
        let (catalog, taxonomy) = setup();
        let scorer = RarityScorer::new(&taxonomy);
        let ids: Vec<_> = catalog.planet_ids().collect();
        let desired: BTreeSet<String> = ["Venom".to_string()].into_iter().collect();
        let best = best_of(&catalog, &scorer, &ids, &BTreeSet::new(), &desired);
        assert_eq!(best, catalog.planet_id("Zoo"));
    }

    #[test]
    fn flat_scorer_falls_back_to_first_candidate() {
        let (catalog, _) = setup();
        let ids: Vec<_> = catalog.planet_ids().rev().collect();
        let best = best_of(&catalog, &FlatScorer, &ids, &BTreeSet::new(), &BTreeSet::new());
        assert_eq!(best, catalog.planet_id("Zoo"));
        assert_eq!(best_of(&catalog, &FlatScorer, &[], &BTreeSet::new(), &BTreeSet::new()), None);
    }
}
