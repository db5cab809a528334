//! FIX 4.2 wire framing: parse, build, and checksum.
//!
//! Parsing never fails: an unparseable frame yields an empty/partial
//! message plus a `tracing::warn!`. Building has no error conditions: any
//! caller-supplied field list can be serialized.

/// SOH (`0x01`), the FIX field separator.
pub const SOH: u8 = 0x01;
const EQUALS: u8 = b'=';
const PIPE: u8 = b'|';

/// BeginString literal this emulator speaks.
pub const BEGIN_STRING: &str = "FIX.4.2";

/// Pre-defined FIX tags the core cares about.
pub mod tags {
    /// BeginString.
    pub const BEGIN_STRING: u32 = 8;
    /// BodyLength.
    pub const BODY_LENGTH: u32 = 9;
    /// MsgType.
    pub const MSG_TYPE: u32 = 35;
    /// SenderCompID.
    pub const SENDER_COMP_ID: u32 = 49;
    /// TargetCompID.
    pub const TARGET_COMP_ID: u32 = 56;
    /// MsgSeqNum.
    pub const MSG_SEQ_NUM: u32 = 34;
    /// SendingTime.
    pub const SENDING_TIME: u32 = 52;
    /// TransactTime.
    pub const TRANSACT_TIME: u32 = 60;
    /// HandlInst (required on NewOrderSingle for certification).
    pub const HANDL_INST: u32 = 21;
    /// CheckSum.
    pub const CHECKSUM: u32 = 10;
    /// ClOrdID.
    pub const CL_ORD_ID: u32 = 11;
    /// OrderID.
    pub const ORDER_ID: u32 = 37;
    /// OrigClOrdID.
    pub const ORIG_CL_ORD_ID: u32 = 41;
    /// ExecID.
    pub const EXEC_ID: u32 = 17;
    /// ExecType.
    pub const EXEC_TYPE: u32 = 150;
    /// OrdStatus.
    pub const ORD_STATUS: u32 = 39;
    /// Symbol.
    pub const SYMBOL: u32 = 55;
    /// Side.
    pub const SIDE: u32 = 54;
    /// OrdType.
    pub const ORD_TYPE: u32 = 40;
    /// OrderQty.
    pub const ORDER_QTY: u32 = 38;
    /// Price.
    pub const PRICE: u32 = 44;
    /// LastShares/LastQty.
    pub const LAST_QTY: u32 = 32;
    /// LastPx.
    pub const LAST_PX: u32 = 31;
    /// CumQty.
    pub const CUM_QTY: u32 = 14;
    /// LeavesQty.
    pub const LEAVES_QTY: u32 = 151;
    /// Text.
    pub const TEXT: u32 = 58;
    /// HeartBtInt.
    pub const HEART_BT_INT: u32 = 108;
    /// EncryptMethod.
    pub const ENCRYPT_METHOD: u32 = 98;
    /// RefSeqNum (Session Reject).
    pub const REF_SEQ_NUM: u32 = 45;
    /// RefTagID (Session Reject, 371).
    pub const REF_TAG_ID: u32 = 371;
    /// SessionRejectReason (373).
    pub const SESSION_REJECT_REASON: u32 = 373;
}

/// FIX MsgType (tag 35) values this emulator handles.
pub mod msg_types {
    /// Heartbeat.
    pub const HEARTBEAT: &str = "0";
    /// Session reject.
    pub const SESSION_REJECT: &str = "3";
    /// Logout.
    pub const LOGOUT: &str = "5";
    /// Execution report.
    pub const EXECUTION_REPORT: &str = "8";
    /// Logon.
    pub const LOGON: &str = "A";
    /// New order single.
    pub const NEW_ORDER_SINGLE: &str = "D";
    /// Order cancel request.
    pub const ORDER_CANCEL_REQUEST: &str = "F";
    /// Order cancel/replace request.
    pub const ORDER_CANCEL_REPLACE_REQUEST: &str = "G";
}

/// A parsed FIX message: an ordered list of `(tag, value)` pairs plus the
/// original raw bytes, for logging.
#[derive(Debug, Clone, Default)]
pub struct FixMessage {
    fields: Vec<(u32, String)>,
    raw: Vec<u8>,
}

impl FixMessage {
    /// An empty message with no raw backing bytes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The original bytes this message was parsed from, if any.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Get a field's value by tag (first occurrence wins).
    #[must_use]
    pub fn get(&self, tag: u32) -> Option<&str> {
        self.fields
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, v)| v.as_str())
    }

    /// True if `tag` is present.
    #[must_use]
    pub fn has(&self, tag: u32) -> bool {
        self.fields.iter().any(|(t, _)| *t == tag)
    }

    /// The message type (tag 35), if present.
    #[must_use]
    pub fn msg_type(&self) -> Option<&str> {
        self.get(tags::MSG_TYPE)
    }

    /// Append a field, preserving insertion order.
    pub fn push(&mut self, tag: u32, value: impl Into<String>) {
        self.fields.push((tag, value.into()));
    }

    /// All fields in the order they were parsed or pushed.
    #[must_use]
    pub fn fields(&self) -> &[(u32, String)] {
        &self.fields
    }

    /// All tags present in this message, in encounter order. Duplicate tags
    /// (malformed input) are not deduplicated, since the certification validator
    /// needs to see every tag to report "unexpected tag(s)" accurately.
    #[must_use]
    pub fn tags(&self) -> Vec<u32> {
        self.fields.iter().map(|(t, _)| *t).collect()
    }
}

/// Parse raw bytes into a `FixMessage`.
///
/// Splits on SOH; if no SOH byte is present, falls back to `|` (the
/// log-capture alternate separator used when a captured line has already
/// had its SOH bytes rendered as pipes). Each non-empty segment splits on
/// the first `=`; segments without `=` are silently dropped. This never
/// fails: malformed input degrades to a smaller field set, with a warning.
#[must_use]
pub fn parse(data: &[u8]) -> FixMessage {
    let delimiter = if data.contains(&SOH) { SOH } else { PIPE };

    let mut msg = FixMessage {
        fields: Vec::new(),
        raw: data.to_vec(),
    };

    let mut dropped = 0usize;
    for segment in data.split(|&b| b == delimiter) {
        if segment.is_empty() {
            continue;
        }
        match segment.iter().position(|&b| b == EQUALS) {
            Some(eq_pos) => {
                let tag_bytes = &segment[..eq_pos];
                let value_bytes = &segment[eq_pos + 1..];
                match std::str::from_utf8(tag_bytes).ok().and_then(|s| s.parse::<u32>().ok()) {
                    Some(tag) => {
                        let value = String::from_utf8_lossy(value_bytes).into_owned();
                        msg.fields.push((tag, value));
                    }
                    None => dropped += 1,
                }
            }
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::warn!(dropped, "dropped unparseable field(s) while parsing FIX message");
    }

    msg
}

/// Format a timestamp in FIX 4.2's `UTCTimestamp` shape
/// (`YYYYMMDD-HH:MM:SS.mmm`), used for tags 52 (`SendingTime`) and 60
/// (`TransactTime`).
#[must_use]
pub fn fix_timestamp(now: chrono::DateTime<chrono::Utc>) -> String {
    now.format("%Y%m%d-%H:%M:%S%.3f").to_string()
}

/// Checksum: sum of every byte in `data` mod 256.
#[must_use]
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u32, |acc, &b| acc + u32::from(b)) as u8
}

/// Build a wire frame from caller-supplied fields (which must not include
/// tags 8, 9, or 10, those are computed here). Field order in the output
/// is exactly the caller's order, with `8`/`9` prepended and `10` appended.
#[must_use]
pub fn build(fields: &[(u32, String)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (tag, value) in fields {
        body.extend_from_slice(tag.to_string().as_bytes());
        body.push(EQUALS);
        body.extend_from_slice(value.as_bytes());
        body.push(SOH);
    }

    let mut header = Vec::new();
    header.extend_from_slice(format!("{}={}", tags::BEGIN_STRING, BEGIN_STRING).as_bytes());
    header.push(SOH);
    header.extend_from_slice(format!("{}={}", tags::BODY_LENGTH, body.len()).as_bytes());
    header.push(SOH);

    let mut without_checksum = header;
    without_checksum.extend_from_slice(&body);

    let sum = checksum(&without_checksum);

    let mut frame = without_checksum;
    frame.extend_from_slice(format!("{}={:03}", tags::CHECKSUM, sum).as_bytes());
    frame.push(SOH);
    frame
}
