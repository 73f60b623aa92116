//! # deptrust
//!
//! A concurrent dependency trust scanner. Given a project directory,
//! `deptrust` enumerates third-party packages declared across manifests for
//! eleven package managers, enriches each with upstream registry metadata and
//! known vulnerability advisories, and runs a policy engine over the result
//! to assign a per-package trust verdict.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deptrust::{config::Config, orchestrator::ScanOrchestrator};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), deptrust::DeptrustError> {
//! let config = Config::load(None)?;
//! let cache_dir = deptrust::cache::resolve_cache_dir()?;
//! let orchestrator = ScanOrchestrator::new(config, &cache_dir)?;
//! let report = orchestrator.scan(&PathBuf::from("."), None).await?;
//! println!("found {} dependencies", report.findings.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The pipeline, leaves first:
//!
//! - [`models`] - the shared data model (`Dependency`, `Severity`,
//!   `Advisory`, `TrustSignal`, `PackageFinding`, `Report`).
//! - [`error`] - one `thiserror` enum per pipeline concern, composed into
//!   [`error::DeptrustError`].
//! - [`config`] - immutable, environment-driven configuration.
//! - [`cache`] - the metadata resolver's on-disk cache tier.
//! - [`utils`] - retry, chunking, date parsing, and the dependency graph.
//! - [`scanners`] - one manifest parser per ecosystem plus the manager
//!   registry.
//! - [`advisory`] - the OSV/GitHub advisory aggregator.
//! - [`metadata`] - the per-ecosystem release metadata resolver.
//! - [`policy`] - the trust signal derivation and scoring engine.
//! - [`orchestrator`] - drives a scan end to end and assembles a `Report`.
//! - [`sbom`] - renders a `Report` as a CycloneDX SBOM.
//! - [`cli`] - argument parsing and output rendering.

pub mod advisory;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod metadata;
pub mod models;
pub mod orchestrator;
pub mod policy;
pub mod scanners;
pub mod sbom;
pub mod utils;

pub use error::DeptrustError;
