//! tickexec runner: scenario replay over the execution core.
//!
//! This crate builds on `tickexec-core` to provide:
//! - TOML scenario loading, validation and fingerprinting
//! - Scripted condition and formula collaborators driven per tick
//! - An in-memory replay venue for Live and Forward-testing sessions
//! - A tick-by-tick runner producing a serializable report

pub mod config;
pub mod runner;
pub mod scripted;
pub mod venue;

pub use config::{
    ConfigError, Fingerprint, ReplayVenueConfig, ScenarioConfig, ScenarioMeta, StagePhase,
    TickScript,
};
pub use runner::{
    run_scenario, run_scenario_file, OrderSummary, RunError, ScenarioReport, TickError,
    TickSnapshot, SCHEMA_VERSION,
};
pub use scripted::{AnnouncementLog, ScriptedConditions, ScriptedFormulas};
pub use venue::ReplayVenue;
