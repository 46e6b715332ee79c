//! Unique-resource capture: the stage that seeds the selection

use log::{debug, info};

use super::{Solver, WorkingState};

impl Solver<'_> {
    /// Select every planet holding a qualifying unique resource, then every
    /// full-chain planet in the systems those planets commit us to.
    pub fn capture_unique(&self) -> WorkingState {
        let mut state = WorkingState::new(self.base.clone());

        for system_id in self.catalog.system_ids() {
            let system = self.catalog.system(system_id);
            let mut committed = false;

            for &id in &system.planets {
                if !state.annotations.get(id).is_unique_holder() {
                    continue;
                }
                committed = true;
                state.selection.push(id);

                let planet = self.catalog.planet(id);
                state.annotations.get_mut(id).potential_groups =
                    self.taxonomy.partial_groups(planet);
                self.absorb(&mut state, id);
                debug!(
                    "{} holds unique {:?}",
                    planet.name,
                    state.annotations.get(id).unique
                );
            }

            if !committed {
                continue;
            }
            state.processed_systems.insert(system_id);

            for &id in &system.planets {
                if state.annotations.get(id).has_full_chain() && state.selection.push(id) {
                    self.absorb(&mut state, id);
                    for group in &state.annotations.get(id).full_resource_chain {
                        if let Some(members) = self.taxonomy.group(group) {
                            state.captured.inorganic.extend(members.iter().cloned());
                        }
                    }
                    debug!(
                        "{} pulled in for its full chain in committed system {}",
                        self.catalog.planet(id).name,
                        system.name
                    );
                }
            }
        }

        info!(
            "Unique capture: {} planets across {} systems",
            state.selection.len(),
            state.processed_systems.len()
        );
        state
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SolverConfig;
    use crate::models::Rarity;
    use crate::scoring::RarityScorer;
    use crate::solver::Solver;
    use crate::testutil::*;

    #[test]
    fn unique_holder_commits_its_system() {
        let catalog = catalog(vec![
            (
                "Home",
                vec![
                    planet("Vault", &["X", "A"]),
                    planet("Forge", &["A", "B"]),
                    planet("Rock", &["B"]),
                ],
            ),
            ("Away", vec![planet("Mine", &["A", "B"])]),
        ]);
        let taxonomy = taxonomy(
            &[("A", Rarity::Common), ("B", Rarity::Common), ("X", Rarity::Unique)],
            &[],
            &[("Alpha", &["A", "B"])],
        );
        let config = SolverConfig::default();
        let scorer = RarityScorer::new(&taxonomy);
        let solver = Solver::new(&catalog, &taxonomy, &scorer, &config);

        let state = solver.capture_unique();
        let names: Vec<_> = state
            .selection
            .iter()
            .map(|id| catalog.planet(id).name.as_str())
            .collect();
        assert_eq!(names, vec!["Vault", "Forge"]);
        assert_eq!(state.processed_systems.len(), 1);

        let vault = catalog.planet_id("Vault").unwrap();
        assert_eq!(state.annotations.get(vault).potential_groups["Alpha"].len(), 1);
        for resource in ["X", "A", "B"] {
            assert!(state.captured.inorganic.contains(resource));
        }
    }

    #[test]
    fn gatherable_only_uniques_do_not_seed() {
        let catalog = catalog(vec![(
            "Home",
            vec![planet("Meadow", &[]).with_gatherable_flora(&["Sap"])],
        )]);
        let mut taxonomy = taxonomy(&[], &[("Sap", Rarity::Unique)], &[]);
        taxonomy.gatherable_only.organic.insert("Sap".into());
        let config = SolverConfig::default();
        let scorer = RarityScorer::new(&taxonomy);
        let solver = Solver::new(&catalog, &taxonomy, &scorer, &config);

        let state = solver.capture_unique();
        assert!(state.selection.is_empty());
        assert!(state.processed_systems.is_empty());
    }

    #[test]
    fn unique_organics_from_gatherable_flora_are_captured() {
        let catalog = catalog(vec![(
            "Home",
            vec![planet("Meadow", &[]).with_gatherable_flora(&["Sap"])],
        )]);
        let taxonomy = taxonomy(&[], &[("Sap", Rarity::Unique)], &[]);
        let config = SolverConfig::default();
        let scorer = RarityScorer::new(&taxonomy);
        let solver = Solver::new(&catalog, &taxonomy, &scorer, &config);

        let state = solver.capture_unique();
        assert_eq!(state.selection.len(), 1);
        assert!(state.captured.organic.contains("Sap"));
        assert_eq!(solver.recompute_captured(&state), state.captured);
    }
}
