//! Offline certification validator (C8): replays a captured FIX log line by
//! line against the required/optional/conditional tag tables in
//! `fixem_wire::schema`, producing one verdict per line.
//!
//! Grounded on `original_source/cert/validator.py`'s `CertificationValidator`
//! (`LoadLog`/`ParseMessages`/`ValidateMessages`/`CheckFields`), kept as
//! three free functions rather than a class carrying mutable accumulator
//! state across method calls.

use std::fs;
use std::path::Path;

use fixem_core::Result;
use fixem_wire::codec::tags;
use fixem_wire::schema;
use fixem_wire::FixMessage;

/// One line's validation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// `"Line N"` for a structurally parseable message, or a fixed label
    /// for a line that couldn't even be attributed a MsgType.
    pub label: String,
    /// Human-readable result, without any emoji decoration (that's a
    /// presentation concern left to the CLI front-end).
    pub message: String,
    /// True if this line passed validation (or had no schema to check it
    /// against); false for any missing/unexpected/conditional violation.
    pub ok: bool,
}

/// Read `path`, returning its non-blank, trimmed lines. Each line is
/// expected to hold one raw FIX message (SOH- or pipe-delimited).
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn load_log(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Parse every line into a `FixMessage`, separating out lines that carry no
/// MsgType (tag 35) at all; those are reported as skipped rather than run
/// through `validate_message`.
#[must_use]
pub fn parse_messages(lines: &[String]) -> (Vec<FixMessage>, Vec<Verdict>) {
    let mut parsed = Vec::new();
    let mut skipped = Vec::new();
    for line in lines {
        let msg = fixem_wire::parse(line.as_bytes());
        if msg.has(tags::MSG_TYPE) {
            parsed.push(msg);
        } else {
            skipped.push(Verdict {
                label: "skipped".to_string(),
                message: "message skipped: missing tag 35 (MsgType)".to_string(),
                ok: false,
            });
        }
    }
    (parsed, skipped)
}

/// Run every parsed message through `validate_message`, numbering lines
/// sequentially over the parsed set (matching the original tool: a skipped
/// line does not consume a line number).
#[must_use]
pub fn validate_messages(parsed: &[FixMessage]) -> Vec<Verdict> {
    parsed
        .iter()
        .enumerate()
        .map(|(idx, msg)| validate_message(&format!("Line {}", idx + 1), msg))
        .collect()
}

/// Load, parse, and validate a log file in one call, returning every
/// verdict in encounter order (skips first, then numbered validations).
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn validate_log(path: &Path) -> Result<Vec<Verdict>> {
    let lines = load_log(path)?;
    let (parsed, mut verdicts) = parse_messages(&lines);
    verdicts.extend(validate_messages(&parsed));
    Ok(verdicts)
}

/// Validate one message's tags against its MsgType's schema.
#[must_use]
pub fn validate_message(label: &str, msg: &FixMessage) -> Verdict {
    let Some(msg_type) = msg.msg_type() else {
        return Verdict {
            label: label.to_string(),
            message: "message has no MsgType".to_string(),
            ok: false,
        };
    };

    let Some(schema) = schema::for_msg_type(msg_type) else {
        return Verdict {
            label: label.to_string(),
            message: format!("unknown MsgType {msg_type}, skipped structural validation"),
            ok: true,
        };
    };

    let present = msg.tags();
    let missing = schema.missing_required(&present);
    let unexpected = schema.unexpected(&present);
    let broken = schema.broken_conditionals(&present);

    let mut errors = Vec::new();
    if !missing.is_empty() {
        errors.push(format!(
            "missing required tag(s): {}",
            join_tags(&missing)
        ));
    }
    if !unexpected.is_empty() {
        errors.push(format!(
            "unexpected tag(s): {}",
            join_tags(&unexpected)
        ));
    }
    for (a, b) in &broken {
        errors.push(format!("{a}/{b} must both be present"));
    }

    if errors.is_empty() {
        Verdict {
            label: label.to_string(),
            message: format!("Valid {}", schema.name),
            ok: true,
        }
    } else {
        Verdict {
            label: label.to_string(),
            message: format!("{} {}", schema.name, errors.join("; ")),
            ok: false,
        }
    }
}

fn join_tags(tags: &[u32]) -> String {
    tags.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
