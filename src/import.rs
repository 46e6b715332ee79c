//! Data directory import
//!
//! Walks a data directory for the resource tables, the group definitions and
//! a systems file, builds the taxonomy and catalog in memory, checks them and
//! writes them to the database.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use regex::Regex;
use rusqlite::Connection;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::db;
use crate::error::{Error, Result};
use crate::models::{Catalog, Rarity, ResourceKind, ResourceSets, SystemRecord};
use crate::taxonomy::Taxonomy;

/// Systems files in order of preference.
pub const SYSTEM_FILES: [&str; 4] = [
    "scored_systems_data.json",
    "final_systems_data.json",
    "raw_systems_data.json",
    "systems.json",
];

/// Files found under a data directory.
#[derive(Debug, Default, Clone)]
pub struct DataFiles {
    pub inorganic: Option<PathBuf>,
    pub organic: Option<PathBuf>,
    pub inorganic_groups: Option<PathBuf>,
    pub organic_groups: Option<PathBuf>,
    pub gatherable_only: Option<PathBuf>,
    pub systems: Option<PathBuf>,
}

/// Locate the known data files anywhere under `dir`.
///
/// Entries are visited in file-name order so the first match is stable.
pub fn find_data_files(dir: &Path) -> Result<DataFiles> {
    let mut files = DataFiles::default();
    let mut systems: BTreeMap<usize, PathBuf> = BTreeMap::new();

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let slot = match filename {
            "inorganic.csv" => &mut files.inorganic,
            "organic.csv" => &mut files.organic,
            "inorganic_groups.json" => &mut files.inorganic_groups,
            "organic_groups.json" => &mut files.organic_groups,
            "gatherable_only.json" => &mut files.gatherable_only,
            _ => {
                if let Some(rank) = SYSTEM_FILES.iter().position(|f| *f == filename) {
                    systems.entry(rank).or_insert_with(|| path.to_path_buf());
                }
                continue;
            }
        };
        if slot.is_none() {
            *slot = Some(path.to_path_buf());
        }
    }

    files.systems = systems.into_values().next();
    Ok(files)
}

/// One row of a resource table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRow {
    pub name: String,
    pub short_name: Option<String>,
    pub rarity: Rarity,
}

/// Split a CSV line into fields. Quoted fields may contain commas and
/// doubled quotes.
fn split_fields(field_re: &Regex, line: &str) -> Vec<String> {
    // Every field is matched with its leading separator.
    let line = format!(",{line}");
    field_re
        .captures_iter(&line)
        .map(|cap| match cap.get(1) {
            Some(quoted) => quoted.as_str().replace("\"\"", "\""),
            None => cap.get(2).map_or("", |m| m.as_str()).trim().to_string(),
        })
        .collect()
}

/// Parse a resource table with `Resource`, `Short name` and `Rarity` columns.
///
/// Returns the rows and the number of rows skipped for a missing name or
/// rarity.
pub fn parse_resource_csv(content: &str) -> Result<(Vec<ResourceRow>, usize)> {
    let field_re = Regex::new(r#","(?:"((?:[^"]|"")*)"|([^,"]*))"#)?;
    let mut lines = content
        .trim_start_matches('\u{feff}')
        .lines()
        .filter(|line| !line.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| Error::MissingData("empty resource table".to_string()))?;
    let columns = split_fields(&field_re, header);
    let column = |name: &str| columns.iter().position(|c| c.eq_ignore_ascii_case(name));
    let name_col = column("Resource")
        .ok_or_else(|| Error::MissingData("resource table has no 'Resource' column".to_string()))?;
    let rarity_col = column("Rarity")
        .ok_or_else(|| Error::MissingData("resource table has no 'Rarity' column".to_string()))?;
    let short_col = column("Short name");

    let mut rows = Vec::new();
    let mut skipped = 0;
    for line in lines {
        let fields = split_fields(&field_re, line);
        let field = |i: usize| fields.get(i).map(String::as_str).unwrap_or("");
        let (name, rarity) = (field(name_col), field(rarity_col));
        if name.is_empty() || rarity.is_empty() {
            debug!("Skipping resource row {:?}", line);
            skipped += 1;
            continue;
        }
        let short_name = short_col.map(field).filter(|s| !s.is_empty());
        rows.push(ResourceRow {
            name: name.to_string(),
            short_name: short_name.map(str::to_string),
            rarity: rarity.parse()?,
        });
    }
    Ok((rows, skipped))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GroupEntry {
    Members(Vec<String>),
    /// A `Main` list shared by every named sub-list.
    Nested(BTreeMap<String, Vec<String>>),
}

/// Parse a group file into flat groups.
///
/// A nested entry yields one group per sub-key, named after the sub-key,
/// with `Main` prepended to its members.
pub fn parse_groups(content: &str) -> Result<BTreeMap<String, BTreeSet<String>>> {
    let raw: BTreeMap<String, GroupEntry> = serde_json::from_str(content)?;
    let mut groups = BTreeMap::new();

    for (name, entry) in raw {
        match entry {
            GroupEntry::Members(members) => {
                if !members.is_empty() {
                    groups.insert(name, members.into_iter().collect());
                }
            }
            GroupEntry::Nested(mut subs) => {
                let main = subs.remove("Main").unwrap_or_default();
                for (sub, members) in subs {
                    let combined: BTreeSet<String> =
                        main.iter().cloned().chain(members).collect();
                    if !combined.is_empty() {
                        groups.insert(sub, combined);
                    }
                }
            }
        }
    }
    Ok(groups)
}

/// Parse the gatherable-only file: `inorganic` and `organic` lists.
pub fn parse_gatherable_only(content: &str) -> Result<ResourceSets> {
    let mut sets = ResourceSets::default();
    for (key, members) in parse_groups(content)? {
        match key.parse::<ResourceKind>() {
            Ok(kind) => sets.get_mut(kind).extend(members),
            Err(_) => warn!("Ignoring gatherable-only entry '{}'", key),
        }
    }
    Ok(sets)
}

/// Parse a systems file: a list of systems with nested planets.
pub fn parse_systems(content: &str) -> Result<Vec<SystemRecord>> {
    Ok(serde_json::from_str(content)?)
}

fn read(path: &Path) -> Result<String> {
    debug!("Reading {}", path.display());
    Ok(fs::read_to_string(path)?)
}

/// Import statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub resources: usize,
    pub skipped_rows: usize,
    pub groups: usize,
    pub gatherable_only: usize,
    pub systems: usize,
    pub planets: usize,
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Imported {} resources ({} rows skipped), {} groups, {} gatherable-only, {} systems with {} planets",
            self.resources,
            self.skipped_rows,
            self.groups,
            self.gatherable_only,
            self.systems,
            self.planets
        )
    }
}

/// Import everything found under `dir` into the database.
///
/// The taxonomy is validated and the catalog checked for duplicate names
/// before anything is written.
pub fn import_dir(conn: &Connection, dir: &Path) -> Result<ImportStats> {
    let files = find_data_files(dir)?;
    let mut stats = ImportStats::default();
    let mut taxonomy = Taxonomy::default();
    let mut short_names: Vec<(ResourceKind, String, Option<String>)> = Vec::new();

    for (kind, path) in [
        (ResourceKind::Inorganic, &files.inorganic),
        (ResourceKind::Organic, &files.organic),
    ] {
        let Some(path) = path else {
            warn!("No {} resource table under {}", kind, dir.display());
            continue;
        };
        let (rows, skipped) = parse_resource_csv(&read(path)?)?;
        stats.skipped_rows += skipped;
        for row in rows {
            let rarities = match kind {
                ResourceKind::Inorganic => &mut taxonomy.inorganic,
                ResourceKind::Organic => &mut taxonomy.organic,
            };
            rarities.insert(row.name.clone(), row.rarity);
            short_names.push((kind, row.name, row.short_name));
        }
    }

    if let Some(path) = &files.inorganic_groups {
        taxonomy.inorganic_groups = parse_groups(&read(path)?)?;
    }
    if let Some(path) = &files.organic_groups {
        taxonomy.organic_groups = parse_groups(&read(path)?)?;
    }
    if let Some(path) = &files.gatherable_only {
        taxonomy.gatherable_only = parse_gatherable_only(&read(path)?)?;
    }
    taxonomy.strip_unique_from_groups();
    taxonomy.validate()?;

    let catalog = match &files.systems {
        Some(path) => {
            info!("Loading systems from {}", path.display());
            Catalog::from_records(parse_systems(&read(path)?)?)?
        }
        None => {
            warn!("No systems file under {}", dir.display());
            Catalog::default()
        }
    };

    for (kind, name, short_name) in &short_names {
        let rarity = taxonomy.rarity_of(*kind, name);
        db::upsert_resource(conn, *kind, name, short_name.as_deref(), rarity)?;
        stats.resources += 1;
    }
    for (kind, groups) in [
        (ResourceKind::Inorganic, &taxonomy.inorganic_groups),
        (ResourceKind::Organic, &taxonomy.organic_groups),
    ] {
        for (name, members) in groups {
            db::upsert_group(conn, kind, name, members)?;
            stats.groups += 1;
        }
    }
    for kind in ResourceKind::ALL {
        for resource in taxonomy.gatherable_only.get(kind) {
            db::insert_gatherable_only(conn, kind, resource)?;
            stats.gatherable_only += 1;
        }
    }
    for record in catalog.to_records() {
        stats.planets += record.planets.len();
        db::upsert_system(conn, &record)?;
        stats.systems += 1;
    }

    info!("{}", stats);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_fields_handle_quotes_and_blanks() {
        let re = Regex::new(r#","(?:"((?:[^"]|"")*)"|([^,"]*))"#).unwrap();
        assert_eq!(split_fields(&re, "a, b ,,c"), vec!["a", "b", "", "c"]);
        assert_eq!(
            split_fields(&re, r#""Iron, pure","say ""hi""",x"#),
            vec!["Iron, pure", r#"say "hi""#, "x"]
        );
        assert_eq!(split_fields(&re, ",lead"), vec!["", "lead"]);
    }

    #[test]
    fn resource_table_uses_header_columns() {
        let content = "\u{feff}Short name,Resource,Rarity\nFe,Iron,Common\n,Helium-3,Uncommon\nXx,,Rare\n\nAu,Gold,\n";
        let (rows, skipped) = parse_resource_csv(content).unwrap();
        assert_eq!(skipped, 2);
        assert_eq!(
            rows,
            vec![
                ResourceRow {
                    name: "Iron".into(),
                    short_name: Some("Fe".into()),
                    rarity: Rarity::Common
                },
                ResourceRow {
                    name: "Helium-3".into(),
                    short_name: None,
                    rarity: Rarity::Uncommon
                },
            ]
        );
    }

    #[test]
    fn resource_table_rejects_unknown_rarity() {
        let content = "Resource,Short name,Rarity\nIron,Fe,Legendary\n";
        assert!(matches!(
            parse_resource_csv(content),
            Err(Error::UnknownRarity(r)) if r == "Legendary"
        ));
    }

    #[test]
    fn nested_groups_flatten_with_main() {
        let content = r#"{
            "Alloy": ["Iron", "Nickel"],
            "Batteries": {"Main": ["Lithium"], "Cell": ["Cobalt"], "Pack": ["Nickel"]},
            "Empty": []
        }"#;
        let groups = parse_groups(content).unwrap();
        let names: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Alloy", "Cell", "Pack"]);
        assert_eq!(
            groups["Pack"],
            ["Lithium", "Nickel"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn gatherable_only_splits_by_family() {
        let sets =
            parse_gatherable_only(r#"{"inorganic": ["Water"], "organic": ["Fiber"], "misc": ["X"]}"#)
                .unwrap();
        assert!(sets.inorganic.contains("Water"));
        assert!(sets.organic.contains("Fiber"));
        assert_eq!(sets.len(), 2);
    }

    #[test]
    fn systems_tolerate_null_collections() {
        let content = r#"[{"name": "Sol", "planets": [
            {"name": "Luna", "resources": {"inorganic": ["Iron"], "organic": null},
             "flora": null, "fauna": {"domesticable": {"Venom": "Ashta"}, "gatherable": null}}
        ]}]"#;
        let systems = parse_systems(content).unwrap();
        let luna = &systems[0].planets[0];
        assert_eq!(luna.resources.inorganic, vec!["Iron".to_string()]);
        assert!(luna.resources.organic.is_empty());
        assert!(luna.flora.domesticable.is_empty());
        assert_eq!(luna.fauna.domesticable["Venom"], "Ashta");
    }
}
