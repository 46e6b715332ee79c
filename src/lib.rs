//! Outpost planner
//!
//! Picks a small set of outpost planets that together capture every required
//! resource of a star-system catalog. The catalog and the resource taxonomy
//! are imported from a data directory into SQLite, then handed to the
//! [`solver::Solver`], which runs either the greedy pipeline or an exhaustive
//! search over full-chain assignments.

pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod report;
pub mod scoring;
pub mod solver;
pub mod taxonomy;

#[cfg(test)]
mod testutil;

pub use error::{Error, Result};
