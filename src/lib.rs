//! sonargate library root.
//!
//! Audio quality analysis and delivery orchestration for music production
//! catalogs: analyzers, a subgenre-weighted classification + decision rule
//! engine, a parameter-conflict detector, a priority job-queue engine, and a
//! delivery orchestrator, all driven from the CLI in [`cli`].

/// Crate version, as reported by `sonargate --version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;

/// Specialized `Result` alias used throughout the crate.
pub type Result<T> = error::SonarGateResult<T>;
