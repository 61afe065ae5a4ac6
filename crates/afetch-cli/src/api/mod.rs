//! AlphaFold database client
//!
//! HTTP access to the EMBL-EBI file server and the version probe.

pub mod client;
pub mod endpoints;

pub use client::{AlphaFoldClient, AttemptOutcome, ProbeAttempt, ProbeHit, VersionProbe};
