//! Solver results as handed to callers

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::models::{CapturedResources, ResourceSets};
use crate::solver::{Candidacy, Halt};

/// One chosen planet with the reasons it was chosen.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SelectedOutpost {
    pub planet: String,
    pub system: String,
    pub candidacy: Candidacy,
}

impl SelectedOutpost {
    /// Human-readable reasons, in the order the stages assign them.
    pub fn reasons(&self) -> Vec<String> {
        let c = &self.candidacy;
        let mut reasons = Vec::new();
        if !c.unique.is_empty() {
            reasons.push(format!("unique: {}", c.unique.join(", ")));
        }
        if !c.full_resource_chain.is_empty() {
            reasons.push(format!("full chain: {}", c.full_resource_chain.join(", ")));
        }
        if !c.other.is_empty() {
            reasons.push(format!("organics: {}", c.other.join(", ")));
        }
        for partial in &c.resource_group_partial {
            let partners: Vec<&str> = c.partner_planets.iter().map(String::as_str).collect();
            reasons.push(format!("{} with {}", partial, partners.join(", ")));
        }
        if c.has_helium {
            reasons.push("helium".to_string());
        }
        if c.has_water {
            reasons.push("water".to_string());
        }
        reasons
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutpostPlan {
    pub outposts: Vec<SelectedOutpost>,
    pub captured: CapturedResources,
    pub uncaptured: ResourceSets,
    pub location_cap: usize,
    pub within_cap: bool,
    pub halts: Vec<Halt>,
}

impl OutpostPlan {
    pub fn new(
        outposts: Vec<SelectedOutpost>,
        captured: CapturedResources,
        uncaptured: ResourceSets,
        location_cap: usize,
        halts: Vec<Halt>,
    ) -> Self {
        let within_cap = outposts.len() <= location_cap;
        Self {
            outposts,
            captured,
            uncaptured,
            location_cap,
            within_cap,
            halts,
        }
    }

    pub fn len(&self) -> usize {
        self.outposts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outposts.is_empty()
    }

    /// Within the cap, nothing uncaptured and no stage halted.
    pub fn is_success(&self) -> bool {
        self.within_cap && self.uncaptured.is_empty() && self.halts.is_empty()
    }

    pub fn planet_names(&self) -> Vec<&str> {
        self.outposts.iter().map(|o| o.planet.as_str()).collect()
    }
}

impl fmt::Display for OutpostPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Outpost Plan ===")?;
        for outpost in &self.outposts {
            writeln!(f, "{} ({})", outpost.planet, outpost.system)?;
            for reason in outpost.reasons() {
                writeln!(f, "  - {}", reason)?;
            }
        }
        writeln!(f)?;

        if !self.is_success() {
            writeln!(f, "FAILURE")?;
        }
        writeln!(
            f,
            "Outposts: {} / {}{}",
            self.len(),
            self.location_cap,
            if self.within_cap { "" } else { " (over cap)" }
        )?;
        if !self.uncaptured.inorganic.is_empty() {
            let list: Vec<&str> = self.uncaptured.inorganic.iter().map(String::as_str).collect();
            writeln!(f, "Uncaptured inorganic: {}", list.join(", "))?;
        }
        if !self.uncaptured.organic.is_empty() {
            let list: Vec<&str> = self.uncaptured.organic.iter().map(String::as_str).collect();
            writeln!(f, "Uncaptured organic: {}", list.join(", "))?;
        }
        for halt in &self.halts {
            match halt {
                Halt::UnreachableGroups { groups } => {
                    writeln!(f, "No system offers: {}", groups.join(", "))?
                }
                Halt::OrganicsUnavailable { resources } => {
                    writeln!(f, "No planet supplies: {}", resources.join(", "))?
                }
                Halt::RoundLimit { rounds } => {
                    writeln!(f, "Organic cover stopped after {} rounds", rounds)?
                }
            }
        }
        Ok(())
    }
}

/// A biome on a planet, printed as `planet - biome`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct BiomeSite {
    pub planet: String,
    pub biome: String,
}

impl fmt::Display for BiomeSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.planet, self.biome)
    }
}

/// Result of the biome-level cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BiomePlan {
    /// Planets in the order they were chosen.
    pub planets: Vec<String>,
    pub biomes: Vec<BiomeSite>,
    pub covered: ResourceSets,
    pub missing: ResourceSets,
    pub location_cap: usize,
    pub within_cap: bool,
}

impl BiomePlan {
    pub fn new(
        planets: Vec<String>,
        biomes: Vec<BiomeSite>,
        covered: ResourceSets,
        missing: ResourceSets,
        location_cap: usize,
    ) -> Self {
        let within_cap = planets.len() <= location_cap;
        Self {
            planets,
            biomes,
            covered,
            missing,
            location_cap,
            within_cap,
        }
    }

    pub fn is_success(&self) -> bool {
        self.within_cap && self.missing.is_empty()
    }
}

impl fmt::Display for BiomePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Biome Plan ===")?;
        writeln!(f, "Selected planets:")?;
        for planet in &self.planets {
            writeln!(f, "  {}", planet)?;
        }
        writeln!(f, "Selected biomes:")?;
        for site in &self.biomes {
            writeln!(f, "  {}", site)?;
        }
        writeln!(f)?;

        if !self.is_success() {
            writeln!(f, "FAILURE")?;
        }
        writeln!(f, "Planets: {} / {}", self.planets.len(), self.location_cap)?;
        for (label, missing) in [
            ("Organics missing", &self.missing.organic),
            ("Inorganics missing", &self.missing.inorganic),
        ] {
            if !missing.is_empty() {
                let list: Vec<&str> = missing.iter().map(String::as_str).collect();
                writeln!(f, "{}: {}", label, list.join(", "))?;
            }
        }
        Ok(())
    }
}

/// Outcome of an exhaustive search.
///
/// Groups the unique-capture seed already holds as a full chain are not
/// enumerated: they appear in `seeded_groups`, not in `groups`, and add no
/// factor to `total` or the histogram. Counts are therefore smaller than a
/// search that forces one candidate for every inorganic group.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    /// Fewest outposts any evaluated combination produced.
    pub min_count: Option<usize>,
    /// Distinct plans reaching `min_count`, sorted by planet names.
    pub best: Vec<OutpostPlan>,
    /// Final outpost count -> number of combinations producing it.
    pub histogram: BTreeMap<usize, u64>,
    pub evaluated: u64,
    pub total: u64,
    pub cancelled: bool,
    /// Groups searched over, in enumeration order.
    pub groups: Vec<String>,
    /// Groups held by the seed selection and left out of the search.
    pub seeded_groups: Vec<String>,
    /// Groups with no eligible candidate outside committed systems.
    pub skipped_groups: Vec<String>,
}

impl fmt::Display for SearchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Exhaustive Search ===")?;
        writeln!(
            f,
            "Evaluated {} of {} combinations over {} groups{}",
            self.evaluated,
            self.total,
            self.groups.len(),
            if self.cancelled { " (stopped early)" } else { "" }
        )?;
        if !self.seeded_groups.is_empty() {
            writeln!(f, "Held by seed: {}", self.seeded_groups.join(", "))?;
        }
        if !self.skipped_groups.is_empty() {
            writeln!(f, "Skipped groups: {}", self.skipped_groups.join(", "))?;
        }
        writeln!(f, "Outpost count distribution:")?;
        for (count, hits) in &self.histogram {
            writeln!(f, "  {:>3}: {}", count, hits)?;
        }
        match self.min_count {
            Some(min) => writeln!(f, "Minimum: {} ({} distinct plans)", min, self.best.len())?,
            None => writeln!(f, "No combination evaluated")?,
        }
        for (i, plan) in self.best.iter().enumerate() {
            writeln!(f)?;
            writeln!(f, "--- Plan {} ---", i + 1)?;
            write!(f, "{}", plan)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outpost(name: &str, candidacy: Candidacy) -> SelectedOutpost {
        SelectedOutpost {
            planet: name.to_string(),
            system: "Sys".to_string(),
            candidacy,
        }
    }

    #[test]
    fn reasons_list_every_role() {
        let candidacy = Candidacy {
            unique: vec!["X".into()],
            other: vec!["Fiber".into()],
            resource_group_partial: ["Gamma (partial)".to_string()].into(),
            partner_planets: ["R".to_string()].into(),
            has_water: true,
            ..Default::default()
        };
        let reasons = outpost("Q", candidacy).reasons();
        assert_eq!(
            reasons,
            vec!["unique: X", "organics: Fiber", "Gamma (partial) with R", "water"]
        );
    }

    #[test]
    fn failure_is_printed_when_uncaptured() {
        let mut uncaptured = ResourceSets::default();
        uncaptured.organic.insert("Resin".into());
        let plan = OutpostPlan::new(
            vec![outpost("P", Candidacy::default())],
            CapturedResources::default(),
            uncaptured,
            24,
            Vec::new(),
        );
        assert!(plan.within_cap);
        assert!(!plan.is_success());

        let text = plan.to_string();
        assert!(text.contains("FAILURE"));
        assert!(text.contains("Uncaptured organic: Resin"));
        assert!(text.contains("Outposts: 1 / 24"));
    }

    #[test]
    fn biome_plan_lists_sites_and_missing() {
        let mut missing = ResourceSets::default();
        missing.inorganic.insert("Gold".into());
        let site = BiomeSite {
            planet: "Farm".into(),
            biome: "Ridge".into(),
        };
        let plan = BiomePlan::new(
            vec!["Farm".into()],
            vec![site],
            ResourceSets::default(),
            missing,
            24,
        );
        let text = plan.to_string();
        assert!(text.contains("  Farm - Ridge"));
        assert!(text.contains("Inorganics missing: Gold"));
        assert!(text.contains("FAILURE"));
    }

    #[test]
    fn plan_serializes_without_internal_keys() {
        let mut candidacy = Candidacy {
            full_resource_chain: vec!["Alpha".into()],
            ..Default::default()
        };
        candidacy.potential_groups.insert("Alpha".into(), Default::default());
        let plan = OutpostPlan::new(
            vec![outpost("P", candidacy)],
            CapturedResources::default(),
            ResourceSets::default(),
            24,
            Vec::new(),
        );
        let json = serde_json::to_value(&plan).unwrap();
        let record = &json["outposts"][0]["candidacy"];
        assert_eq!(record["full_resource_chain"][0], "Alpha");
        assert!(record.get("potential_groups").is_none());
        assert!(record.get("has_water").is_none());
    }
}
