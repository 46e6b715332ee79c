//! Database schema and operations

use std::collections::BTreeSet;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;
use crate::models::{
    BiomeResources, Catalog, Lifeforms, Planet, Rarity, ResourceKind, SystemRecord,
};
use crate::taxonomy::Taxonomy;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Catalog: systems and their planets, in import order
        CREATE TABLE IF NOT EXISTS systems (
            name TEXT PRIMARY KEY,
            position INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS planets (
            name TEXT PRIMARY KEY,
            system_name TEXT NOT NULL,
            position INTEGER NOT NULL
        );

        -- Planet-level resource lists
        CREATE TABLE IF NOT EXISTS planet_resources (
            planet_name TEXT NOT NULL,
            kind TEXT NOT NULL,
            resource TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (planet_name, kind, resource)
        );

        -- Flora and fauna, keyed by the resource they yield
        CREATE TABLE IF NOT EXISTS lifeforms (
            planet_name TEXT NOT NULL,
            family TEXT NOT NULL,
            domesticable INTEGER NOT NULL,
            resource TEXT NOT NULL,
            organism TEXT NOT NULL,
            PRIMARY KEY (planet_name, family, domesticable, resource)
        );

        CREATE TABLE IF NOT EXISTS biomes (
            planet_name TEXT NOT NULL,
            biome TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (planet_name, biome)
        );

        CREATE TABLE IF NOT EXISTS biome_resources (
            planet_name TEXT NOT NULL,
            biome TEXT NOT NULL,
            resource TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (planet_name, biome, resource)
        );

        -- Taxonomy
        CREATE TABLE IF NOT EXISTS resources (
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            short_name TEXT,
            rarity TEXT NOT NULL,
            PRIMARY KEY (name, kind)
        );

        CREATE TABLE IF NOT EXISTS resource_groups (
            group_name TEXT NOT NULL,
            kind TEXT NOT NULL,
            member TEXT NOT NULL,
            PRIMARY KEY (group_name, kind, member)
        );

        CREATE TABLE IF NOT EXISTS gatherable_only (
            kind TEXT NOT NULL,
            resource TEXT NOT NULL,
            PRIMARY KEY (kind, resource)
        );

        CREATE INDEX IF NOT EXISTS idx_planets_system ON planets(system_name);
        CREATE INDEX IF NOT EXISTS idx_planet_resources_resource ON planet_resources(resource);
        "#,
    )?;
    Ok(())
}

/// Clear all imported data (for re-import)
pub fn clear_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM biome_resources;
        DELETE FROM biomes;
        DELETE FROM lifeforms;
        DELETE FROM planet_resources;
        DELETE FROM planets;
        DELETE FROM systems;
        DELETE FROM gatherable_only;
        DELETE FROM resource_groups;
        DELETE FROM resources;
        "#,
    )?;
    Ok(())
}

/// Insert or replace a system with all of its planets.
///
/// A re-imported system keeps its original position.
pub fn upsert_system(conn: &Connection, system: &SystemRecord) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    let existing: Option<i64> = tx
        .query_row(
            "SELECT position FROM systems WHERE name = ?1",
            [&system.name],
            |row| row.get(0),
        )
        .optional()?;
    let position = match existing {
        Some(position) => position,
        None => tx.query_row("SELECT COUNT(*) FROM systems", [], |row| row.get(0))?,
    };
    tx.execute(
        "INSERT OR REPLACE INTO systems (name, position) VALUES (?1, ?2)",
        params![system.name, position],
    )?;

    let stale: Vec<String> = {
        let mut stmt = tx.prepare("SELECT name FROM planets WHERE system_name = ?1")?;
        let rows = stmt.query_map([&system.name], |row| row.get(0))?;
        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        names
    };
    for name in &stale {
        delete_planet(&tx, name)?;
    }

    for (index, planet) in system.planets.iter().enumerate() {
        delete_planet(&tx, &planet.name)?;
        insert_planet(&tx, &system.name, index, planet)?;
    }

    tx.commit()?;
    Ok(())
}

fn delete_planet(conn: &Connection, name: &str) -> Result<()> {
    for table in ["biome_resources", "biomes", "lifeforms", "planet_resources"] {
        conn.execute(&format!("DELETE FROM {table} WHERE planet_name = ?1"), [name])?;
    }
    conn.execute("DELETE FROM planets WHERE name = ?1", [name])?;
    Ok(())
}

fn insert_planet(conn: &Connection, system: &str, position: usize, planet: &Planet) -> Result<()> {
    conn.execute(
        "INSERT INTO planets (name, system_name, position) VALUES (?1, ?2, ?3)",
        params![planet.name, system, position as i64],
    )?;

    let lists = [
        (ResourceKind::Inorganic, &planet.resources.inorganic),
        (ResourceKind::Organic, &planet.resources.organic),
    ];
    for (kind, resources) in lists {
        for (i, resource) in resources.iter().enumerate() {
            conn.execute(
                "INSERT OR IGNORE INTO planet_resources (planet_name, kind, resource, position)
                 VALUES (?1, ?2, ?3, ?4)",
                params![planet.name, kind.as_str(), resource, i as i64],
            )?;
        }
    }

    let lifeforms = [
        ("flora", true, &planet.flora.domesticable),
        ("flora", false, &planet.flora.gatherable),
        ("fauna", true, &planet.fauna.domesticable),
        ("fauna", false, &planet.fauna.gatherable),
    ];
    for (family, domesticable, entries) in lifeforms {
        for (resource, organism) in entries {
            conn.execute(
                "INSERT OR REPLACE INTO lifeforms (planet_name, family, domesticable, resource, organism)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![planet.name, family, domesticable, resource, organism],
            )?;
        }
    }

    for (i, biome) in planet.biomes.iter().enumerate() {
        conn.execute(
            "INSERT OR IGNORE INTO biomes (planet_name, biome, position) VALUES (?1, ?2, ?3)",
            params![planet.name, biome, i as i64],
        )?;
    }
    for (biome, resources) in &planet.biome_resources {
        for (i, resource) in resources.inorganic.iter().enumerate() {
            conn.execute(
                "INSERT OR IGNORE INTO biome_resources (planet_name, biome, resource, position)
                 VALUES (?1, ?2, ?3, ?4)",
                params![planet.name, biome, resource, i as i64],
            )?;
        }
    }
    Ok(())
}

/// Insert or replace a resource definition
pub fn upsert_resource(
    conn: &Connection,
    kind: ResourceKind,
    name: &str,
    short_name: Option<&str>,
    rarity: Rarity,
) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO resources (name, kind, short_name, rarity) VALUES (?1, ?2, ?3, ?4)",
        params![name, kind.as_str(), short_name, rarity.as_str()],
    )?;
    Ok(())
}

/// Replace the members of a resource group
pub fn upsert_group(
    conn: &Connection,
    kind: ResourceKind,
    name: &str,
    members: &BTreeSet<String>,
) -> Result<()> {
    conn.execute(
        "DELETE FROM resource_groups WHERE group_name = ?1 AND kind = ?2",
        params![name, kind.as_str()],
    )?;
    for member in members {
        conn.execute(
            "INSERT INTO resource_groups (group_name, kind, member) VALUES (?1, ?2, ?3)",
            params![name, kind.as_str(), member],
        )?;
    }
    Ok(())
}

pub fn insert_gatherable_only(conn: &Connection, kind: ResourceKind, resource: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO gatherable_only (kind, resource) VALUES (?1, ?2)",
        params![kind.as_str(), resource],
    )?;
    Ok(())
}

/// Load every system and planet, in import order
pub fn load_catalog(conn: &Connection) -> Result<Catalog> {
    let mut stmt = conn.prepare("SELECT name FROM systems ORDER BY position, name")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut records = Vec::new();
    for row in rows {
        let name = row?;
        let planets = load_system_planets(conn, &name)?;
        records.push(SystemRecord { name, planets });
    }
    Catalog::from_records(records)
}

fn load_system_planets(conn: &Connection, system: &str) -> Result<Vec<Planet>> {
    let mut stmt =
        conn.prepare("SELECT name FROM planets WHERE system_name = ?1 ORDER BY position, name")?;
    let rows = stmt.query_map([system], |row| row.get::<_, String>(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(load_planet(conn, &row?)?);
    }
    Ok(results)
}

/// Load a single planet by name
pub fn load_planet(conn: &Connection, name: &str) -> Result<Planet> {
    let mut planet = Planet::new(name);

    let mut stmt = conn.prepare(
        "SELECT kind, resource FROM planet_resources WHERE planet_name = ?1 ORDER BY kind, position",
    )?;
    let rows = stmt.query_map([name], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (kind, resource) = row?;
        match kind.parse::<ResourceKind>()? {
            ResourceKind::Inorganic => planet.resources.inorganic.push(resource),
            ResourceKind::Organic => planet.resources.organic.push(resource),
        }
    }

    let mut stmt = conn.prepare(
        "SELECT family, domesticable, resource, organism FROM lifeforms WHERE planet_name = ?1",
    )?;
    let rows = stmt.query_map([name], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, bool>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;
    for row in rows {
        let (family, domesticable, resource, organism) = row?;
        let lifeforms: &mut Lifeforms = if family == "flora" {
            &mut planet.flora
        } else {
            &mut planet.fauna
        };
        let entries = if domesticable {
            &mut lifeforms.domesticable
        } else {
            &mut lifeforms.gatherable
        };
        entries.insert(resource, organism);
    }

    let mut stmt =
        conn.prepare("SELECT biome FROM biomes WHERE planet_name = ?1 ORDER BY position")?;
    let rows = stmt.query_map([name], |row| row.get::<_, String>(0))?;
    for row in rows {
        planet.biomes.push(row?);
    }

    let mut stmt = conn.prepare(
        "SELECT biome, resource FROM biome_resources WHERE planet_name = ?1 ORDER BY biome, position",
    )?;
    let rows = stmt.query_map([name], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (biome, resource) = row?;
        planet
            .biome_resources
            .entry(biome)
            .or_insert_with(BiomeResources::default)
            .inorganic
            .push(resource);
    }

    Ok(planet)
}

/// Load the resource taxonomy and check it for undefined group members
pub fn load_taxonomy(conn: &Connection) -> Result<Taxonomy> {
    let mut taxonomy = Taxonomy::default();

    let mut stmt = conn.prepare("SELECT name, kind, rarity FROM resources")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;
    for row in rows {
        let (name, kind, rarity) = row?;
        let rarity: Rarity = rarity.parse()?;
        match kind.parse::<ResourceKind>()? {
            ResourceKind::Inorganic => taxonomy.inorganic.insert(name, rarity),
            ResourceKind::Organic => taxonomy.organic.insert(name, rarity),
        };
    }

    let mut stmt = conn.prepare("SELECT group_name, kind, member FROM resource_groups")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;
    for row in rows {
        let (group, kind, member) = row?;
        let groups = match kind.parse::<ResourceKind>()? {
            ResourceKind::Inorganic => &mut taxonomy.inorganic_groups,
            ResourceKind::Organic => &mut taxonomy.organic_groups,
        };
        groups.entry(group).or_default().insert(member);
    }

    let mut stmt = conn.prepare("SELECT kind, resource FROM gatherable_only")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (kind, resource) = row?;
        taxonomy
            .gatherable_only
            .get_mut(kind.parse()?)
            .insert(resource);
    }

    taxonomy.validate()?;
    Ok(taxonomy)
}

/// Per-system summary for listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemSummary {
    pub name: String,
    pub planet_count: usize,
}

/// List all systems in the database
pub fn list_systems(conn: &Connection) -> Result<Vec<SystemSummary>> {
    let mut stmt = conn.prepare(
        "SELECT s.name, COUNT(p.name)
         FROM systems s
         LEFT JOIN planets p ON p.system_name = s.name
         GROUP BY s.name
         ORDER BY s.position, s.name",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(SystemSummary {
            name: row.get(0)?,
            planet_count: row.get::<_, i64>(1)? as usize,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}
