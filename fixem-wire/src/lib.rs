//! FIX 4.2 wire codec and certification schema tables.
//!
//! Mirrors `alpaca-fix::codec`'s module shape (parse/build
//! around an ordered field list) while correcting its checksum/body-length
//! accounting to operate on raw bytes, and adding the schema tables the
//! certification validator and session handler both consult.

/// Parse, build, and checksum (C1).
pub mod codec;
/// Required/optional/conditional tag tables per MsgType (C2).
pub mod schema;

pub use codec::{build, checksum, fix_timestamp, parse, FixMessage};
pub use schema::Schema;
