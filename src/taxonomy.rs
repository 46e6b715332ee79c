//! Static resource definitions: rarities, resource groups ("chains") and
//! gatherable-only resources

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::models::{CapturedResources, Planet, Rarity, ResourceKind, ResourceSets};

static EMPTY: BTreeSet<String> = BTreeSet::new();

/// Empty groups are never held.
fn holds_all(members: &BTreeSet<String>, held: &BTreeSet<&str>) -> bool {
    !members.is_empty() && members.iter().all(|m| held.contains(m.as_str()))
}

/// Organic group holding the farmable flora resources.
pub const FLORA_GROUP: &str = "flora";
/// Organic group holding the farmable fauna resources.
pub const FAUNA_GROUP: &str = "fauna";

#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    pub inorganic: BTreeMap<String, Rarity>,
    pub organic: BTreeMap<String, Rarity>,
    pub inorganic_groups: BTreeMap<String, BTreeSet<String>>,
    pub organic_groups: BTreeMap<String, BTreeSet<String>>,
    pub gatherable_only: ResourceSets,
}

impl Taxonomy {
    pub fn rarities(&self, kind: ResourceKind) -> &BTreeMap<String, Rarity> {
        match kind {
            ResourceKind::Inorganic => &self.inorganic,
            ResourceKind::Organic => &self.organic,
        }
    }

    /// Rarity of a resource; unknown resources count as common.
    pub fn rarity_of(&self, kind: ResourceKind, resource: &str) -> Rarity {
        self.rarities(kind)
            .get(resource)
            .copied()
            .unwrap_or(Rarity::Common)
    }

    pub fn universe(&self, kind: ResourceKind) -> impl Iterator<Item = &String> + '_ {
        self.rarities(kind).keys()
    }

    /// Globally unique resources per family.
    pub fn unique(&self) -> ResourceSets {
        let pick = |map: &BTreeMap<String, Rarity>| {
            map.iter()
                .filter(|(_, rarity)| **rarity == Rarity::Unique)
                .map(|(name, _)| name.clone())
                .collect()
        };
        ResourceSets {
            inorganic: pick(&self.inorganic),
            organic: pick(&self.organic),
        }
    }

    /// Gatherable-only resources are checked against both families.
    pub fn is_gatherable_only(&self, resource: &str) -> bool {
        self.gatherable_only.contains(resource)
    }

    pub fn group(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.inorganic_groups.get(name)
    }

    pub fn flora_group(&self) -> &BTreeSet<String> {
        self.organic_groups.get(FLORA_GROUP).unwrap_or(&EMPTY)
    }

    pub fn fauna_group(&self) -> &BTreeSet<String> {
        self.organic_groups.get(FAUNA_GROUP).unwrap_or(&EMPTY)
    }

    /// A group is fully present iff every member is in the planet's
    /// inorganic list.
    pub fn has_full_chain(&self, planet: &Planet, group: &str) -> bool {
        self.inorganic_groups
            .get(group)
            .is_some_and(|members| holds_all(members, &planet.inorganic_set()))
    }

    /// Names of every group fully present on the planet, in name order.
    pub fn full_chains(&self, planet: &Planet) -> Vec<String> {
        let held = planet.inorganic_set();
        self.inorganic_groups
            .iter()
            .filter(|(_, members)| holds_all(members, &held))
            .map(|(group, _)| group.clone())
            .collect()
    }

    /// Partial (or full) holdings of every group the planet touches.
    pub fn partial_groups(&self, planet: &Planet) -> BTreeMap<String, BTreeSet<String>> {
        let held = planet.inorganic_set();
        self.inorganic_groups
            .iter()
            .filter_map(|(group, members)| {
                let present: BTreeSet<String> = members
                    .iter()
                    .filter(|m| held.contains(m.as_str()))
                    .cloned()
                    .collect();
                (!present.is_empty()).then(|| (group.clone(), present))
            })
            .collect()
    }

    /// Number of distinct groups the planet holds at least one member of.
    pub fn touched_group_count(&self, planet: &Planet) -> usize {
        let held = planet.inorganic_set();
        self.inorganic_groups
            .values()
            .filter(|members| members.iter().any(|m| held.contains(m.as_str())))
            .count()
    }

    /// Resources of the universe neither captured nor gatherable-only.
    pub fn uncaptured(&self, captured: &CapturedResources) -> ResourceSets {
        let mut uncaptured = ResourceSets::default();
        for kind in ResourceKind::ALL {
            let captured = captured.get(kind);
            let gatherable = self.gatherable_only.get(kind);
            *uncaptured.get_mut(kind) = self
                .universe(kind)
                .filter(|r| !captured.contains(*r) && !gatherable.contains(*r))
                .cloned()
                .collect();
        }
        uncaptured
    }

    /// Drop unique inorganics from every group; groups left empty vanish.
    pub fn strip_unique_from_groups(&mut self) {
        let unique = self.unique().inorganic;
        self.inorganic_groups.retain(|_, members| {
            members.retain(|m| !unique.contains(m));
            !members.is_empty()
        });
    }

    /// Every group member must be a known resource of its family.
    pub fn validate(&self) -> Result<()> {
        let check = |groups: &BTreeMap<String, BTreeSet<String>>, known: &BTreeMap<String, Rarity>| {
            for (group, members) in groups {
                if let Some(missing) = members.iter().find(|m| !known.contains_key(*m)) {
                    return Err(Error::UndefinedResource {
                        group: group.clone(),
                        resource: missing.clone(),
                    });
                }
            }
            Ok(())
        };
        check(&self.inorganic_groups, &self.inorganic)?;
        check(&self.organic_groups, &self.organic)
    }
}
