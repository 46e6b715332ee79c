//! Finalization: special-resource flags, the last recomputation and the
//! coverage report

use log::info;

use super::{Solver, WorkingState};
use crate::report::{OutpostPlan, SelectedOutpost};

impl Solver<'_> {
    /// Flag helium and water holders, rebuild captured resources, strip
    /// internal annotations and produce the report.
    ///
    /// Running this twice on the same state yields the same captured and
    /// uncaptured sets.
    pub fn finalize(&self, state: &mut WorkingState) -> OutpostPlan {
        let helium = self.config.helium_resource.as_str();
        let water = self.config.water_resource.as_str();

        let selected: Vec<_> = state.selection.iter().collect();
        for &id in &selected {
            let planet = self.catalog.planet(id);
            let holds = |resource: &str| {
                planet.has_inorganic(resource)
                    || planet.resources.organic.iter().any(|r| r == resource)
            };
            let (has_helium, has_water) = (holds(helium), holds(water));
            if !has_helium && !has_water {
                continue;
            }
            let candidacy = state.annotations.get_mut(id);
            candidacy.has_helium |= has_helium;
            candidacy.has_water |= has_water;
            for (flag, resource) in [(has_helium, helium), (has_water, water)] {
                if !flag {
                    continue;
                }
                if self.taxonomy.organic.contains_key(resource) {
                    state.captured.organic.insert(resource.to_string());
                } else {
                    state.captured.inorganic.insert(resource.to_string());
                }
            }
        }

        state.captured = self.recompute_captured(state);
        let uncaptured = self.taxonomy.uncaptured(&state.captured);
        state.annotations.strip_internal();

        let outposts = selected
            .into_iter()
            .map(|id| SelectedOutpost {
                planet: self.catalog.planet(id).name.clone(),
                system: self.catalog.system_of(id).name.clone(),
                candidacy: state.annotations.get(id).clone(),
            })
            .collect();

        let plan = OutpostPlan::new(
            outposts,
            state.captured.clone(),
            uncaptured,
            self.config.location_cap,
            state.halts.clone(),
        );
        info!(
            "Final selection: {} outposts (cap {}), {} resources uncaptured",
            plan.len(),
            plan.location_cap,
            plan.uncaptured.len()
        );
        plan
    }
}
