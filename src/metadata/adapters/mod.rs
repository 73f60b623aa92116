//! Per-ecosystem registry adapters. Each module exposes a single `fetch`
//! function sharing a common signature, dispatched from a closed table in
//! [`crate::metadata::MetadataResolver`] keyed by ecosystem.

pub mod crates_io;
pub mod go;
pub mod maven;
pub mod npm;
pub mod nuget;
pub mod packagist;
pub mod pypi;
pub mod rubygems;
