//! Configuration and behavior-library data model, plus a thin YAML loader.
//!
//! `spec.md` §1 explicitly keeps configuration file loading out of the
//! emulator's core scope; some other collaborator is expected to hand the
//! core already-parsed session and behavior bundles. This crate defines the
//! shapes those bundles take (mirroring `original_source/ConfigLoader.py`)
//! and provides a minimal `serde_yaml` loader so the rest of the workspace
//! is runnable and testable without a production config-management system.

/// Configuration and behavior data shapes.
pub mod model;

/// `serde_yaml`-backed loader over `model`'s shapes.
pub mod loader;

pub use model::{
    Behavior, BehaviorLibrary, ConfigBundle, ConnectionConfig, EngineConfig, ExecutionConfig,
    RuleConfig, ScenarioStep, ScheduleConfig, SessionBundle, SessionEntry, SessionMeta,
    SessionProfile,
};
pub use loader::{load_bundle, load_behaviors, load_engine_config, load_session_profile};
