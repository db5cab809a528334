//! Offline certification validator (C8) for captured FIX 4.2 logs: checks
//! every line's tags against the required/optional/conditional schema
//! tables in `fixem_wire::schema`.

/// Log loading, message parsing, and per-message tag-table validation.
pub mod validator;

pub use validator::{
    load_log, parse_messages, validate_log, validate_message, validate_messages, Verdict,
};
