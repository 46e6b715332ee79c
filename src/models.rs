//! Data models for star systems, planets and their resource inventories

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// The two resource families, which follow different coverage rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Inorganic,
    Organic,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Inorganic, ResourceKind::Organic];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Inorganic => "inorganic",
            ResourceKind::Organic => "organic",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "inorganic" => Ok(ResourceKind::Inorganic),
            "organic" => Ok(ResourceKind::Organic),
            _ => Err(Error::MissingData(format!("unknown resource kind '{raw}'"))),
        }
    }
}

/// Rarity tier of a resource. `Unique` marks a globally unique resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Exotic,
    Unique,
}

impl Rarity {
    /// Scoring weight of the tier.
    pub fn weight(self) -> f64 {
        match self {
            Rarity::Common => 1.0,
            Rarity::Uncommon => 2.0,
            Rarity::Rare => 4.0,
            Rarity::Exotic => 8.0,
            Rarity::Unique => 16.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Exotic => "Exotic",
            Rarity::Unique => "Unique",
        }
    }
}

impl FromStr for Rarity {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim() {
            "Common" => Ok(Rarity::Common),
            "Uncommon" => Ok(Rarity::Uncommon),
            "Rare" => Ok(Rarity::Rare),
            "Exotic" => Ok(Rarity::Exotic),
            "Unique" => Ok(Rarity::Unique),
            other => Err(Error::UnknownRarity(other.to_string())),
        }
    }
}

/// A pair of resource sets, one per family.
///
/// Used for captured and uncaptured resources as well as the gatherable-only
/// and unique lists of the taxonomy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSets {
    #[serde(default)]
    pub inorganic: BTreeSet<String>,
    #[serde(default)]
    pub organic: BTreeSet<String>,
}

/// Resources guaranteed by the current selection.
pub type CapturedResources = ResourceSets;

impl ResourceSets {
    pub fn get(&self, kind: ResourceKind) -> &BTreeSet<String> {
        match kind {
            ResourceKind::Inorganic => &self.inorganic,
            ResourceKind::Organic => &self.organic,
        }
    }

    pub fn get_mut(&mut self, kind: ResourceKind) -> &mut BTreeSet<String> {
        match kind {
            ResourceKind::Inorganic => &mut self.inorganic,
            ResourceKind::Organic => &mut self.organic,
        }
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.inorganic.contains(resource) || self.organic.contains(resource)
    }

    pub fn is_empty(&self) -> bool {
        self.inorganic.is_empty() && self.organic.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inorganic.len() + self.organic.len()
    }

    pub fn is_superset(&self, other: &ResourceSets) -> bool {
        self.inorganic.is_superset(&other.inorganic) && self.organic.is_superset(&other.organic)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SystemId(pub usize);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanetId(pub usize);

/// Flora or fauna of a planet, keyed by the resource they yield.
/// Values are the organism names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lifeforms {
    #[serde(default, deserialize_with = "null_as_default")]
    pub domesticable: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gatherable: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanetResources {
    #[serde(default, deserialize_with = "null_as_default")]
    pub inorganic: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub organic: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiomeResources {
    #[serde(default, deserialize_with = "null_as_default")]
    pub inorganic: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub name: String,
    /// Owning system, assigned when the catalog is built.
    #[serde(skip)]
    pub system: SystemId,
    #[serde(default)]
    pub resources: PlanetResources,
    #[serde(default, deserialize_with = "null_as_default")]
    pub flora: Lifeforms,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fauna: Lifeforms,
    #[serde(default, deserialize_with = "null_as_default")]
    pub biomes: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub biome_resources: BTreeMap<String, BiomeResources>,
}

impl Planet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn has_inorganic(&self, resource: &str) -> bool {
        self.resources.inorganic.iter().any(|r| r == resource)
    }

    pub fn inorganic_set(&self) -> BTreeSet<&str> {
        self.resources.inorganic.iter().map(String::as_str).collect()
    }

    /// Every organic resource name the planet offers, including those only
    /// reachable through its flora and fauna.
    pub fn all_organics(&self) -> BTreeSet<&str> {
        self.resources
            .organic
            .iter()
            .chain(self.flora.domesticable.keys())
            .chain(self.flora.gatherable.keys())
            .chain(self.fauna.domesticable.keys())
            .chain(self.fauna.gatherable.keys())
            .map(String::as_str)
            .collect()
    }
}

/// Shape of a system in the catalog files: planets nested in their system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemRecord {
    pub name: String,
    #[serde(default)]
    pub planets: Vec<Planet>,
}

#[derive(Debug, Clone)]
pub struct System {
    pub name: String,
    pub planets: Vec<PlanetId>,
}

/// Immutable catalog of systems and planets.
///
/// Planets live in one arena indexed by [`PlanetId`]; a name index replaces
/// rescans over systems and planets.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    systems: Vec<System>,
    planets: Vec<Planet>,
    by_name: HashMap<String, PlanetId>,
}

impl Catalog {
    /// Build the catalog, rejecting duplicate system or planet names.
    pub fn from_records(records: Vec<SystemRecord>) -> Result<Self> {
        let mut catalog = Catalog::default();
        let mut system_names = BTreeSet::new();

        for record in records {
            if !system_names.insert(record.name.clone()) {
                return Err(Error::DuplicateSystem(record.name));
            }
            let system_id = SystemId(catalog.systems.len());
            let mut members = Vec::with_capacity(record.planets.len());

            for mut planet in record.planets {
                let planet_id = PlanetId(catalog.planets.len());
                if catalog.by_name.contains_key(&planet.name) {
                    return Err(Error::DuplicatePlanet(planet.name));
                }
                planet.system = system_id;
                catalog.by_name.insert(planet.name.clone(), planet_id);
                catalog.planets.push(planet);
                members.push(planet_id);
            }

            catalog.systems.push(System {
                name: record.name,
                planets: members,
            });
        }

        Ok(catalog)
    }

    pub fn planet(&self, id: PlanetId) -> &Planet {
        &self.planets[id.0]
    }

    pub fn system(&self, id: SystemId) -> &System {
        &self.systems[id.0]
    }

    pub fn system_of(&self, id: PlanetId) -> &System {
        self.system(self.planet(id).system)
    }

    pub fn planet_id(&self, name: &str) -> Option<PlanetId> {
        self.by_name.get(name).copied()
    }

    pub fn lookup(&self, name: &str) -> Result<PlanetId> {
        self.planet_id(name)
            .ok_or_else(|| Error::UnknownPlanet(name.to_string()))
    }

    pub fn planet_ids(&self) -> impl DoubleEndedIterator<Item = PlanetId> + '_ {
        (0..self.planets.len()).map(PlanetId)
    }

    pub fn system_ids(&self) -> impl Iterator<Item = SystemId> + '_ {
        (0..self.systems.len()).map(SystemId)
    }

    pub fn systems(&self) -> &[System] {
        &self.systems
    }

    pub fn planets(&self) -> &[Planet] {
        &self.planets
    }

    pub fn planet_count(&self) -> usize {
        self.planets.len()
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Rebuild the nested record shape, e.g. for export.
    pub fn to_records(&self) -> Vec<SystemRecord> {
        self.systems
            .iter()
            .map(|system| SystemRecord {
                name: system.name.clone(),
                planets: system
                    .planets
                    .iter()
                    .map(|&id| self.planet(id).clone())
                    .collect(),
            })
            .collect()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planet(name: &str, inorganic: &[&str]) -> Planet {
        let mut planet = Planet::new(name);
        planet.resources.inorganic = inorganic.iter().map(|s| s.to_string()).collect();
        planet
    }

    #[test]
    fn catalog_indexes_planets_by_name() {
        let catalog = Catalog::from_records(vec![
            SystemRecord {
                name: "Sol".into(),
                planets: vec![planet("Earth", &["Water"]), planet("Mars", &["Iron"])],
            },
            SystemRecord {
                name: "Alpha".into(),
                planets: vec![planet("Jemison", &["Water", "Iron"])],
            },
        ])
        .unwrap();

        assert_eq!(catalog.planet_count(), 3);
        assert_eq!(catalog.system_count(), 2);

        let jemison = catalog.planet_id("Jemison").unwrap();
        assert_eq!(catalog.system_of(jemison).name, "Alpha");
        assert!(catalog.planet(jemison).has_inorganic("Iron"));
        assert!(catalog.planet_id("Pluto").is_none());
    }

    #[test]
    fn duplicate_planet_names_are_rejected() {
        let result = Catalog::from_records(vec![
            SystemRecord {
                name: "Sol".into(),
                planets: vec![planet("Earth", &[])],
            },
            SystemRecord {
                name: "Alpha".into(),
                planets: vec![planet("Earth", &[])],
            },
        ]);
        assert!(matches!(result, Err(Error::DuplicatePlanet(name)) if name == "Earth"));
    }

    #[test]
    fn planet_json_tolerates_null_fields() {
        let json = r#"{
            "name": "Bessel III-b",
            "resources": {"inorganic": ["Water", "Helium-3"], "organic": null},
            "flora": {"domesticable": {"Fiber": "Fern"}, "gatherable": null},
            "biomes": null
        }"#;
        let planet: Planet = serde_json::from_str(json).unwrap();
        assert_eq!(planet.resources.inorganic.len(), 2);
        assert!(planet.resources.organic.is_empty());
        assert!(planet.biomes.is_empty());
        assert!(planet.all_organics().contains("Fiber"));
    }

    #[test]
    fn rarity_parses_and_weights() {
        assert_eq!("Exotic".parse::<Rarity>().unwrap().weight(), 8.0);
        assert!(matches!("Legendary".parse::<Rarity>(), Err(Error::UnknownRarity(_))));
    }
}
