//! Scenario engine (C4) and symbol-pattern rule matcher (C5) for the
//! FixEm FIX 4.2 emulator.

/// Behavior interpreter: `send`/`delay`/`wait_for`/`end` steps (C4).
pub mod engine;
/// First-match-wins glob rule matcher (C5).
pub mod rules;

pub use engine::{ScenarioEngine, ScenarioExec, SendAction};
pub use rules::RuleMatcher;
