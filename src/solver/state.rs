//! Working state of one solver run: selection, captured resources and the
//! per-planet annotations the stages accumulate

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;

use crate::models::{CapturedResources, PlanetId, SystemId};

/// Why a planet is in the selection, accumulated across stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Candidacy {
    /// Unique resources present, excluding gatherable-only ones.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unique: Vec<String>,
    /// Groups whose every member is on the planet.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub full_resource_chain: Vec<String>,
    /// Partial group holdings used to reconstruct chains. Internal only.
    #[serde(skip)]
    pub potential_groups: BTreeMap<String, BTreeSet<String>>,
    /// Organics captured by the organic cover stage.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub other: Vec<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub resource_group_partial: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub partner_planets: BTreeSet<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub has_helium: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub has_water: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Candidacy {
    pub fn has_full_chain(&self) -> bool {
        !self.full_resource_chain.is_empty()
    }

    pub fn is_unique_holder(&self) -> bool {
        !self.unique.is_empty()
    }

    pub fn supplies_organics(&self) -> bool {
        !self.other.is_empty()
    }
}

/// Copy-on-write annotation records, one per catalog planet.
///
/// Cloning shares every record; a record is copied only when a stage
/// mutates it.
#[derive(Debug, Clone, Default)]
pub struct Annotations(Vec<Arc<Candidacy>>);

impl Annotations {
    pub fn new(records: Vec<Candidacy>) -> Self {
        Self(records.into_iter().map(Arc::new).collect())
    }

    pub fn get(&self, id: PlanetId) -> &Candidacy {
        &self.0[id.0]
    }

    pub fn get_mut(&mut self, id: PlanetId) -> &mut Candidacy {
        Arc::make_mut(&mut self.0[id.0])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Remove internal-only keys from every record.
    pub fn strip_internal(&mut self) {
        for record in &mut self.0 {
            if !record.potential_groups.is_empty() {
                Arc::make_mut(record).potential_groups.clear();
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlanetId, &Candidacy)> + '_ {
        self.0
            .iter()
            .enumerate()
            .map(|(i, record)| (PlanetId(i), record.as_ref()))
    }
}

/// Ordered, duplicate-free collection of chosen planets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    order: Vec<PlanetId>,
    members: BTreeSet<PlanetId>,
}

impl Selection {
    /// Append a planet; returns false if it was already selected.
    pub fn push(&mut self, id: PlanetId) -> bool {
        if self.members.insert(id) {
            self.order.push(id);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: PlanetId) -> bool {
        self.members.contains(&id)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(PlanetId) -> bool) {
        self.order.retain(|&id| keep(id));
        self.members = self.order.iter().copied().collect();
    }

    pub fn iter(&self) -> impl Iterator<Item = PlanetId> + '_ {
        self.order.iter().copied()
    }

    pub fn as_slice(&self) -> &[PlanetId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// A stage that stopped before reaching full coverage.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "halt", rename_all = "snake_case")]
pub enum Halt {
    /// No unprocessed system offers a full chain for these groups.
    UnreachableGroups { groups: Vec<String> },
    /// No candidate planet can supply these organics.
    OrganicsUnavailable { resources: Vec<String> },
    /// The organic cover loop hit its round limit.
    RoundLimit { rounds: usize },
}

#[derive(Debug, Clone)]
pub struct WorkingState {
    pub selection: Selection,
    pub processed_systems: BTreeSet<SystemId>,
    pub captured: CapturedResources,
    pub annotations: Annotations,
    pub halts: Vec<Halt>,
}

impl WorkingState {
    pub fn new(annotations: Annotations) -> Self {
        Self {
            selection: Selection::default(),
            processed_systems: BTreeSet::new(),
            captured: CapturedResources::default(),
            annotations,
            halts: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_rejects_duplicates_and_keeps_order() {
        let mut selection = Selection::default();
        assert!(selection.push(PlanetId(3)));
        assert!(selection.push(PlanetId(1)));
        assert!(!selection.push(PlanetId(3)));
        assert_eq!(selection.as_slice(), &[PlanetId(3), PlanetId(1)]);

        selection.retain(|id| id != PlanetId(3));
        assert!(!selection.contains(PlanetId(3)));
        assert!(selection.push(PlanetId(3)));
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn annotation_clones_copy_on_write() {
        let base = Annotations::new(vec![Candidacy::default(), Candidacy::default()]);
        let mut branch = base.clone();
        branch.get_mut(PlanetId(1)).other.push("Fiber".into());

        assert!(base.get(PlanetId(1)).other.is_empty());
        assert_eq!(branch.get(PlanetId(1)).other, vec!["Fiber".to_string()]);
    }

    #[test]
    fn strip_internal_clears_potential_groups_only() {
        let mut record = Candidacy::default();
        record.potential_groups.insert("Alloy".into(), BTreeSet::new());
        record.has_water = true;
        let mut annotations = Annotations::new(vec![record]);

        annotations.strip_internal();
        let record = annotations.get(PlanetId(0));
        assert!(record.potential_groups.is_empty());
        assert!(record.has_water);
    }
}
