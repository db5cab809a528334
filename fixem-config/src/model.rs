//! Data shapes handed to the core by the configuration-loading collaborator
//! `spec.md` §1 keeps out of scope: `engine.yaml`, `behaviors.yaml`, and
//! per-session profile files (e.g. `equities.yaml`), mirroring
//! `original_source/ConfigLoader.py`'s `loadEngineConfig`/`loadBehaviors`/
//! `loadSessionProfile` return shapes.

use serde::Deserialize;
use std::collections::HashMap;

/// One entry in `engine.yaml`'s `engine.sessions` list.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionEntry {
    /// Session name, used as the key in a `ConfigBundle`.
    pub name: String,
    /// Session profile file, relative to the config directory.
    pub file: String,
    /// Disabled sessions are parsed but never started.
    #[serde(default)]
    pub enabled: bool,
}

/// `engine.yaml`'s top-level `engine` block.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Every session the engine knows about, enabled or not.
    pub sessions: Vec<SessionEntry>,
}

/// A session profile's `connection` block: where the emulator listens and
/// which CompIDs it identifies itself with on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Interface to bind, e.g. `"0.0.0.0"`.
    pub host: String,
    /// TCP port to listen on.
    pub port: u16,
    /// Tag 49 this session sends on outbound messages.
    pub sender_comp_id: String,
    /// Tag 56 this session sends on outbound messages.
    pub target_comp_id: String,
    /// Tag 108, seconds, advertised on Logon.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval: u32,
}

fn default_heartbeat_interval() -> u32 {
    30
}

/// One `(match, behavior)` rule as declared in a session profile's
/// `execution.rules` list, before compilation into a `glob::Pattern`.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    /// Shell-glob symbol pattern.
    #[serde(rename = "match")]
    pub pattern: String,
    /// Name of the behavior to run when `pattern` matches.
    pub behavior: String,
}

/// A session profile's `execution` block.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Behavior to run when no rule matches the order's symbol.
    pub default_behavior: String,
    /// First-match-wins symbol rules, in declaration order.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// Optional `session.schedule` block; the calendar scheduler itself is an
/// external collaborator (`spec.md` §1); this workspace only carries the
/// shape through so a profile round-trips.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ScheduleConfig {
    /// Free-form schedule fields (`start`, `days`, …) the scheduler
    /// collaborator interprets; not consumed by the core.
    #[serde(flatten)]
    pub fields: HashMap<String, serde_yaml::Value>,
}

/// A session profile's `session` block: display metadata plus schedule.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionMeta {
    /// Human-readable profile name (defaults to the engine-level session
    /// name if omitted, per `ConfigLoader.loadAll`).
    pub name: Option<String>,
    /// `"initiator"` or `"acceptor"`; this emulator is always an acceptor,
    /// but the field is carried through from the original shape.
    #[serde(default)]
    pub role: Option<String>,
    /// Optional schedule block.
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// One full session profile file (e.g. `equities.yaml`): `session`,
/// `connection`, and `execution` top-level blocks.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionProfile {
    /// `session:` block.
    pub session: SessionMeta,
    /// `connection:` block.
    pub connection: ConnectionConfig,
    /// `execution:` block.
    pub execution: ExecutionConfig,
}

/// One step of a behavior's scripted scenario (`spec.md` §3). Deserialized
/// untagged so the four single-key YAML shapes (`{send: ...}`, `{delay:
/// ...}`, `{wait_for: ...}`, `{end: true}`) each match their own variant;
/// anything else falls through to `Unknown` and is rejected at scenario
/// execution time rather than at config-load time, per `spec.md` §4.4's
/// "any unknown key" rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScenarioStep {
    /// `send: <action>`.
    Send {
        /// One of `new`, `partial`, `fill`/`full_fill`, `cancel`, `reject`,
        /// `replace_ack`.
        send: String,
    },
    /// `delay: <milliseconds>`.
    Delay {
        /// Non-negative milliseconds to sleep.
        delay: u64,
    },
    /// `wait_for: <eventName>`.
    WaitFor {
        /// Name of the inbound event this step names (currently a stub).
        wait_for: String,
    },
    /// `end: true`.
    End {
        /// Always `true` in practice; the key's presence is what matters.
        end: bool,
    },
    /// Anything that doesn't match the four recognized shapes.
    Unknown(serde_yaml::Value),
}

/// A named, ordered scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct Behavior {
    /// The step sequence `ScenarioEngine::run_behavior` executes in order.
    #[serde(default)]
    pub scenario: Vec<ScenarioStep>,
}

/// `behaviors.yaml`'s top-level `behaviors` block: name → `Behavior`.
pub type BehaviorLibrary = HashMap<String, Behavior>;

/// One enabled session, fully resolved: its connection parameters and
/// execution rules, plus the shared behavior library it draws from.
#[derive(Debug, Clone)]
pub struct SessionBundle {
    /// Display name from `session.name`, falling back to the engine-level
    /// session name.
    pub profile_name: String,
    /// `connection:` block.
    pub connection: ConnectionConfig,
    /// `execution:` block.
    pub execution: ExecutionConfig,
}

/// The full startup bundle: engine sessions list, behavior library, and
/// one resolved `SessionBundle` per *enabled* session, mirroring
/// `ConfigLoader.loadAll`'s return shape.
#[derive(Debug, Clone)]
pub struct ConfigBundle {
    /// Parsed `engine.yaml`.
    pub engine: EngineConfig,
    /// Parsed `behaviors.yaml`.
    pub behaviors: BehaviorLibrary,
    /// Enabled sessions, keyed by their engine-level `name`.
    pub sessions: HashMap<String, SessionBundle>,
}
