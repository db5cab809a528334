//! Thin YAML loader over the shapes in `model`, mirroring
//! `original_source/ConfigLoader.py`. `spec.md` §1 names full configuration
//! loading as an external collaborator; this loader is the convenience
//! `SPEC_FULL.md` §6 calls for, sufficient for the demo binary and
//! integration tests, not a hardened config-management layer (no includes,
//! no environment overlays, no hot reload).

use std::path::{Path, PathBuf};

use fixem_core::{FixemError, Result};

use crate::model::{BehaviorLibrary, ConfigBundle, EngineConfig, SessionBundle, SessionProfile};

/// Read and parse `<dir>/engine.yaml`.
pub fn load_engine_config(dir: &Path) -> Result<EngineConfig> {
    let path = dir.join("engine.yaml");
    let text = read_to_string(&path)?;
    let value: serde_yaml::Value = serde_yaml::from_str(&text)
        .map_err(|e| FixemError::Configuration(format!("{}: {e}", path.display())))?;
    let engine = value
        .get("engine")
        .ok_or_else(|| {
            FixemError::Configuration(format!(
                "{}: missing required 'engine' block",
                path.display()
            ))
        })?
        .clone();
    if engine.get("sessions").is_none() {
        return Err(FixemError::Configuration(format!(
            "{}: missing required 'engine.sessions' block",
            path.display()
        )));
    }
    serde_yaml::from_value(engine)
        .map_err(|e| FixemError::Configuration(format!("{}: {e}", path.display())))
}

/// Read and parse `<dir>/behaviors.yaml`.
pub fn load_behaviors(dir: &Path) -> Result<BehaviorLibrary> {
    let path = dir.join("behaviors.yaml");
    let text = read_to_string(&path)?;
    let value: serde_yaml::Value = serde_yaml::from_str(&text)
        .map_err(|e| FixemError::Configuration(format!("{}: {e}", path.display())))?;
    let behaviors = value.get("behaviors").ok_or_else(|| {
        FixemError::Configuration(format!(
            "{}: missing required top-level 'behaviors' block",
            path.display()
        ))
    })?;
    serde_yaml::from_value(behaviors.clone())
        .map_err(|e| FixemError::Configuration(format!("{}: {e}", path.display())))
}

/// Read and parse a single session profile file, e.g. `equities.yaml`.
pub fn load_session_profile(dir: &Path, file_name: &str) -> Result<SessionProfile> {
    let path = dir.join(file_name);
    if !path.exists() {
        return Err(FixemError::Configuration(format!(
            "session config '{file_name}' not found"
        )));
    }
    let text = read_to_string(&path)?;
    serde_yaml::from_str(&text)
        .map_err(|e| FixemError::Configuration(format!("{}: {e}", path.display())))
}

/// Build the full startup bundle: `engine.yaml` + `behaviors.yaml` + one
/// `SessionBundle` per enabled session, mirroring `ConfigLoader.loadAll`.
/// Disabled sessions are skipped, per `spec.md` §6.
pub fn load_bundle(dir: &Path) -> Result<ConfigBundle> {
    let engine = load_engine_config(dir)?;
    let behaviors = load_behaviors(dir)?;

    let mut sessions = std::collections::HashMap::new();
    for entry in &engine.sessions {
        if !entry.enabled {
            tracing::info!(session = %entry.name, "skipping disabled session");
            continue;
        }
        let profile = load_session_profile(dir, &entry.file)?;
        for rule in &profile.execution.rules {
            if !behaviors.contains_key(&rule.behavior) {
                return Err(FixemError::Configuration(format!(
                    "{}: rule references unknown behavior '{}'",
                    entry.file, rule.behavior
                )));
            }
        }
        if !behaviors.contains_key(&profile.execution.default_behavior) {
            return Err(FixemError::Configuration(format!(
                "{}: default_behavior '{}' not found in behaviors.yaml",
                entry.file, profile.execution.default_behavior
            )));
        }

        let profile_name = profile
            .session
            .name
            .clone()
            .unwrap_or_else(|| entry.name.clone());

        sessions.insert(
            entry.name.clone(),
            SessionBundle {
                profile_name,
                connection: profile.connection,
                execution: profile.execution,
            },
        );
    }

    Ok(ConfigBundle {
        engine,
        behaviors,
        sessions,
    })
}

fn read_to_string(path: &PathBuf) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        FixemError::Configuration(format!("failed to read {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn load_bundle_skips_disabled_sessions() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(
            tmp.path(),
            "engine.yaml",
            "engine:\n  sessions:\n    - name: equities\n      file: equities.yaml\n      enabled: true\n    - name: futures\n      file: futures.yaml\n      enabled: false\n",
        );
        write_file(
            tmp.path(),
            "behaviors.yaml",
            "behaviors:\n  partial_then_fill:\n    scenario:\n      - send: partial\n      - delay: 50\n      - send: fill\n      - end: true\n",
        );
        write_file(
            tmp.path(),
            "equities.yaml",
            "session:\n  name: Equities\nconnection:\n  host: 0.0.0.0\n  port: 9000\n  senderCompId: FIXEM\n  targetCompId: CLIENT\n  heartbeatInterval: 30\nexecution:\n  default_behavior: partial_then_fill\n  rules:\n    - match: \"AAPL*\"\n      behavior: partial_then_fill\n",
        );

        let bundle = load_bundle(tmp.path()).unwrap();
        assert_eq!(bundle.sessions.len(), 1);
        assert!(bundle.sessions.contains_key("equities"));
        assert!(!bundle.sessions.contains_key("futures"));
        assert_eq!(bundle.sessions["equities"].connection.port, 9000);
    }

    #[test]
    fn load_bundle_rejects_unknown_behavior_reference() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(
            tmp.path(),
            "engine.yaml",
            "engine:\n  sessions:\n    - name: equities\n      file: equities.yaml\n      enabled: true\n",
        );
        write_file(tmp.path(), "behaviors.yaml", "behaviors: {}\n");
        write_file(
            tmp.path(),
            "equities.yaml",
            "session:\n  name: Equities\nconnection:\n  host: 0.0.0.0\n  port: 9000\n  senderCompId: FIXEM\n  targetCompId: CLIENT\nexecution:\n  default_behavior: missing_behavior\n  rules: []\n",
        );

        let err = load_bundle(tmp.path()).unwrap_err();
        assert!(matches!(err, FixemError::Configuration(_)));
    }
}
