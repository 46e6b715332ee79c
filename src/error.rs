//! Library error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("duplicate planet name '{0}'")]
    DuplicatePlanet(String),
    #[error("duplicate system name '{0}'")]
    DuplicateSystem(String),
    #[error("resource group '{group}' references undefined resource '{resource}'")]
    UndefinedResource { group: String, resource: String },
    #[error("unknown planet '{0}'")]
    UnknownPlanet(String),
    #[error("unknown rarity '{0}'")]
    UnknownRarity(String),
    #[error("missing data: {0}")]
    MissingData(String),
}
