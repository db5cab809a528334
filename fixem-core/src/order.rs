//! Order record types and the lifecycle enums used by the wire codec,
//! scenario engine, and session handler.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Order side (Tag 54).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    /// Buy (`1`).
    Buy,
    /// Sell (`2`).
    Sell,
}

impl OrderSide {
    /// FIX wire value for this side.
    #[must_use]
    pub fn as_fix_str(self) -> &'static str {
        match self {
            Self::Buy => "1",
            Self::Sell => "2",
        }
    }

    /// Parse a side from its FIX wire value.
    #[must_use]
    pub fn from_fix_str(s: &str) -> Option<Self> {
        match s {
            "1" => Some(Self::Buy),
            "2" => Some(Self::Sell),
            _ => None,
        }
    }
}

/// Order type (Tag 40).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdType {
    /// Market (`1`).
    Market,
    /// Limit (`2`).
    Limit,
}

impl OrdType {
    /// FIX wire value for this order type.
    #[must_use]
    pub fn as_fix_str(self) -> &'static str {
        match self {
            Self::Market => "1",
            Self::Limit => "2",
        }
    }

    /// Parse an order type from its FIX wire value.
    #[must_use]
    pub fn from_fix_str(s: &str) -> Option<Self> {
        match s {
            "1" => Some(Self::Market),
            "2" => Some(Self::Limit),
            _ => None,
        }
    }
}

/// Order status (Tag 39).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdStatus {
    /// New (`0`).
    New,
    /// Partially filled (`1`).
    PartiallyFilled,
    /// Filled (`2`).
    Filled,
    /// Canceled (`4`).
    Canceled,
    /// Replaced (`5`).
    Replaced,
    /// Rejected (`8`).
    Rejected,
}

impl OrdStatus {
    /// FIX wire value for this status.
    #[must_use]
    pub fn as_fix_str(self) -> &'static str {
        match self {
            Self::New => "0",
            Self::PartiallyFilled => "1",
            Self::Filled => "2",
            Self::Canceled => "4",
            Self::Replaced => "5",
            Self::Rejected => "8",
        }
    }
}

/// Execution type (Tag 150), matching `OrdStatus`'s wire encoding for every
/// action this emulator generates (`spec.md` §4.4's transition table never
/// needs ExecType and OrdStatus to diverge).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecType {
    /// New (`0`).
    New,
    /// Partial fill (`1`).
    PartialFill,
    /// Fill (`2`).
    Fill,
    /// Canceled (`4`).
    Canceled,
    /// Replaced (`5`).
    Replaced,
    /// Rejected (`8`).
    Rejected,
}

impl ExecType {
    /// FIX wire value for this execution type.
    #[must_use]
    pub fn as_fix_str(self) -> &'static str {
        match self {
            Self::New => "0",
            Self::PartialFill => "1",
            Self::Fill => "2",
            Self::Canceled => "4",
            Self::Replaced => "5",
            Self::Rejected => "8",
        }
    }
}

/// One order's full state, keyed in the `OrderStore` by `current_cl_ord_id`.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    /// Emulator-assigned order ID, stable for the life of the order.
    pub order_id: String,
    /// The ClOrdID this order was first accepted under.
    pub original_cl_ord_id: String,
    /// The ClOrdID currently keying this order in the store.
    pub current_cl_ord_id: String,
    /// The ClOrdID immediately prior to `current_cl_ord_id`.
    pub last_cl_ord_id: String,
    /// Every ClOrdID this order has ever borne, in order.
    pub history: Vec<String>,
    /// Instrument symbol (Tag 55).
    pub symbol: String,
    /// Side (Tag 54).
    pub side: OrderSide,
    /// Original order quantity (Tag 38 as first accepted).
    pub orig_qty: Decimal,
    /// Limit price (Tag 44); meaningless for market orders.
    pub price: Decimal,
    /// Order type (Tag 40).
    pub ord_type: OrdType,
    /// Cumulative filled quantity (Tag 14).
    pub cum_qty: Decimal,
    /// Remaining quantity (Tag 151).
    pub leaves_qty: Decimal,
    /// Current order status.
    pub status: OrdStatus,
    /// Wall-clock creation time.
    pub created_at: DateTime<Utc>,
    /// Opaque handle back to the owning session, used only to route
    /// scenario-driven execution reports, never consulted by the scenario
    /// engine itself (see `fixem-scenario::engine::Emit`).
    pub client_handle: u64,
}

impl OrderRecord {
    /// Build a fresh `New` order from an accepted `NewOrderSingle`.
    #[must_use]
    pub fn new(
        order_id: String,
        cl_ord_id: String,
        symbol: String,
        side: OrderSide,
        orig_qty: Decimal,
        price: Decimal,
        ord_type: OrdType,
        client_handle: u64,
    ) -> Self {
        Self {
            order_id,
            original_cl_ord_id: cl_ord_id.clone(),
            current_cl_ord_id: cl_ord_id.clone(),
            last_cl_ord_id: cl_ord_id.clone(),
            history: vec![cl_ord_id],
            symbol,
            side,
            orig_qty,
            price,
            ord_type,
            cum_qty: Decimal::ZERO,
            leaves_qty: orig_qty,
            status: OrdStatus::New,
            created_at: Utc::now(),
            client_handle,
        }
    }

    /// Rekey this order onto a new ClOrdID, appending to `history`.
    pub fn rekey(&mut self, new_cl_ord_id: String) {
        self.last_cl_ord_id = self.current_cl_ord_id.clone();
        self.current_cl_ord_id = new_cl_ord_id.clone();
        self.history.push(new_cl_ord_id);
    }
}
