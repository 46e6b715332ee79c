//! Small hand-built catalogs for unit tests

use crate::models::{BiomeResources, Catalog, Planet, Rarity, SystemRecord};
use crate::taxonomy::{FAUNA_GROUP, FLORA_GROUP, Taxonomy};

pub fn planet(name: &str, inorganic: &[&str]) -> Planet {
    let mut planet = Planet::new(name);
    planet.resources.inorganic = inorganic.iter().map(|s| s.to_string()).collect();
    planet
}

pub trait PlanetExt {
    fn with_flora(self, resources: &[&str]) -> Self;
    fn with_fauna(self, resources: &[&str]) -> Self;
    fn with_gatherable_flora(self, resources: &[&str]) -> Self;
    fn with_biome(self, biome: &str, inorganic: &[&str]) -> Self;
}

impl PlanetExt for Planet {
    fn with_flora(mut self, resources: &[&str]) -> Self {
        for r in resources {
            self.flora.domesticable.insert(r.to_string(), format!("{r} plant"));
            self.resources.organic.push(r.to_string());
        }
        self
    }

    fn with_fauna(mut self, resources: &[&str]) -> Self {
        for r in resources {
            self.fauna.domesticable.insert(r.to_string(), format!("{r} beast"));
            self.resources.organic.push(r.to_string());
        }
        self
    }

    fn with_gatherable_flora(mut self, resources: &[&str]) -> Self {
        for r in resources {
            self.flora.gatherable.insert(r.to_string(), format!("{r} weed"));
        }
        self
    }

    fn with_biome(mut self, biome: &str, inorganic: &[&str]) -> Self {
        self.biomes.push(biome.to_string());
        self.biome_resources.insert(
            biome.to_string(),
            BiomeResources {
                inorganic: inorganic.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }
}

pub fn catalog(systems: Vec<(&str, Vec<Planet>)>) -> Catalog {
    Catalog::from_records(
        systems
            .into_iter()
            .map(|(name, planets)| SystemRecord {
                name: name.to_string(),
                planets,
            })
            .collect(),
    )
    .expect("test catalog")
}

/// Every organic is recognized in both the flora and fauna groups.
pub fn taxonomy(
    inorganic: &[(&str, Rarity)],
    organic: &[(&str, Rarity)],
    groups: &[(&str, &[&str])],
) -> Taxonomy {
    let mut taxonomy = Taxonomy::default();
    for (name, rarity) in inorganic {
        taxonomy.inorganic.insert(name.to_string(), *rarity);
    }
    for (name, rarity) in organic {
        taxonomy.organic.insert(name.to_string(), *rarity);
    }
    for (group, members) in groups {
        taxonomy.inorganic_groups.insert(
            group.to_string(),
            members.iter().map(|s| s.to_string()).collect(),
        );
    }
    let organics: std::collections::BTreeSet<String> =
        organic.iter().map(|(name, _)| name.to_string()).collect();
    taxonomy
        .organic_groups
        .insert(FLORA_GROUP.to_string(), organics.clone());
    taxonomy
        .organic_groups
        .insert(FAUNA_GROUP.to_string(), organics);
    taxonomy
}

pub fn common(names: &[&'static str]) -> Vec<(&'static str, Rarity)> {
    names.iter().map(|n| (*n, Rarity::Common)).collect()
}
