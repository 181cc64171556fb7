//! Shared scaffolding for the orchestrator binaries.

pub mod common;
