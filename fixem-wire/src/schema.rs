//! Certification schema tables (C2): required/optional/conditional tag
//! sets per MsgType, used by `fixem-cert::validator` and by the session
//! handler's inbound validation ladders.

/// A `(tagA, tagB)` pair where presence of one requires presence of the
/// other (a violation is exactly one side present, the XOR case).
pub type ConditionalPair = (u32, u32);

/// The required/optional/conditional/custom-allowed tag sets for one
/// MsgType.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Human-readable message name, e.g. `"Logon"`.
    pub name: &'static str,
    /// Tags that must be present.
    pub required: &'static [u32],
    /// Tags that may be present.
    pub optional: &'static [u32],
    /// `(tagA, tagB)` pairs: exactly one present is a violation.
    pub conditional: &'static [ConditionalPair],
    /// Tags allowed at runtime beyond `required`/`optional` (extensible
    /// custom fields).
    pub custom_allowed: &'static [u32],
}

impl Schema {
    /// True if `tag` is in `required ∪ optional ∪ custom_allowed`.
    #[must_use]
    pub fn allows(&self, tag: u32) -> bool {
        self.required.contains(&tag)
            || self.optional.contains(&tag)
            || self.custom_allowed.contains(&tag)
    }

    /// Every required tag absent from `present`, in table order.
    #[must_use]
    pub fn missing_required(&self, present: &[u32]) -> Vec<u32> {
        self.required
            .iter()
            .copied()
            .filter(|t| !present.contains(t))
            .collect()
    }

    /// Every tag in `present` that is not in `allows`, in encounter order,
    /// without duplicates.
    #[must_use]
    pub fn unexpected(&self, present: &[u32]) -> Vec<u32> {
        let mut seen = Vec::new();
        for &tag in present {
            if !self.allows(tag) && !seen.contains(&tag) {
                seen.push(tag);
            }
        }
        seen
    }

    /// Conditional pairs where exactly one side is present in `present`.
    #[must_use]
    pub fn broken_conditionals(&self, present: &[u32]) -> Vec<ConditionalPair> {
        self.conditional
            .iter()
            .copied()
            .filter(|(a, b)| present.contains(a) != present.contains(b))
            .collect()
    }
}

/// Logon (`A`).
pub const LOGON: Schema = Schema {
    name: "Logon",
    required: &[8, 9, 35, 49, 56, 34, 52, 98, 108, 10],
    optional: &[95, 96, 141, 553, 554, 1137],
    conditional: &[(95, 96)],
    custom_allowed: &[],
};

/// Logout (`5`).
pub const LOGOUT: Schema = Schema {
    name: "Logout",
    required: &[8, 9, 35, 49, 56, 34, 52, 10],
    optional: &[58],
    conditional: &[],
    custom_allowed: &[],
};

/// NewOrderSingle (`D`).
pub const NEW_ORDER_SINGLE: Schema = Schema {
    name: "NewOrderSingle",
    required: &[8, 9, 35, 49, 56, 34, 52, 11, 21, 55, 54, 38, 40, 60, 10],
    optional: &[59, 47, 58, 18, 44, 15, 100, 207, 848, 849, 99, 110, 111],
    conditional: &[(48, 22), (95, 96)],
    custom_allowed: &[44, 9140],
};

/// ExecutionReport (`8`).
pub const EXECUTION_REPORT: Schema = Schema {
    name: "ExecutionReport",
    required: &[8, 9, 35, 49, 56, 34, 52, 11, 17, 150, 39, 55, 54, 38, 40, 44, 14, 6, 10],
    optional: &[32, 31, 29, 37, 198, 75, 105, 60, 151, 100, 207, 848, 849, 15],
    conditional: &[(48, 22), (95, 96)],
    custom_allowed: &[20],
};

/// Look up the schema for a MsgType (tag 35 value), if one is known.
#[must_use]
pub fn for_msg_type(msg_type: &str) -> Option<&'static Schema> {
    match msg_type {
        "A" => Some(&LOGON),
        "5" => Some(&LOGOUT),
        "D" => Some(&NEW_ORDER_SINGLE),
        "8" => Some(&EXECUTION_REPORT),
        _ => None,
    }
}
