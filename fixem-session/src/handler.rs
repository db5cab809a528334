//! Per-connection session handler (C6): the message loop, session-layer
//! handshake, and application-layer order lifecycle, grounded on
//! `alpaca-fix::session::FixSession` (sequence-number ownership) and
//! `alpaca-fix::transport::FixTransport` (blocking stream framing),
//! generalized from the teacher's dial-out client into this spec's
//! accept-side emulator.

use std::io::{Read, Write};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use rust_decimal::Decimal;

use fixem_config::BehaviorLibrary;
use fixem_core::{
    ExecType, FixemError, OrdStatus, OrdType, OrderRecord, OrderSide, OrderStore, Result,
};
use fixem_scenario::{RuleMatcher, ScenarioEngine, ScenarioExec};
use fixem_wire::codec::{msg_types, tags};
use fixem_wire::{fix_timestamp, FixMessage};

use crate::framing::extract_frame;
use crate::state::{OutboundSeq, SessionIdentity};

const READ_CHUNK: usize = 4096;
/// Refuse to keep buffering an unterminated frame past this many bytes.
/// A test-tool safety valve against a misbehaving client wedging a thread
/// forever, not a protocol requirement.
const MAX_BUFFERED_BYTES: usize = 1 << 20;

/// One accepted connection's full session + order-lifecycle state machine.
pub struct SessionHandler<S> {
    stream: S,
    identity: SessionIdentity,
    outbound_seq: OutboundSeq,
    read_buf: Vec<u8>,
    store: Arc<OrderStore>,
    rule_matcher: Arc<RuleMatcher>,
    behaviors: Arc<BehaviorLibrary>,
    /// Opaque identifier stamped onto orders this session accepts; never
    /// consulted by the scenario engine, used only for logging (`spec.md`
    /// §3's `clientHandle`, §9's redesign note replacing the `server`
    /// back-reference).
    client_handle: u64,
    /// Set once an inbound Logout has been processed; `serve` exits its
    /// loop immediately afterward.
    logged_out: bool,
}

impl<S> SessionHandler<S>
where
    S: Read + Write,
{
    /// Build a handler for one freshly accepted stream.
    pub fn new(
        stream: S,
        identity: SessionIdentity,
        store: Arc<OrderStore>,
        rule_matcher: Arc<RuleMatcher>,
        behaviors: Arc<BehaviorLibrary>,
        client_handle: u64,
    ) -> Self {
        Self {
            stream,
            identity,
            outbound_seq: OutboundSeq::new(),
            read_buf: Vec::with_capacity(READ_CHUNK),
            store,
            rule_matcher,
            behaviors,
            client_handle,
            logged_out: false,
        }
    }

    /// Drain the connection: read-parse-dispatch until EOF or Logout.
    /// Transport errors close the session and are logged, never
    /// propagated past this call (`spec.md` §7 item 4).
    pub fn serve(&mut self) {
        loop {
            match self.read_frame() {
                Ok(Some(frame)) => {
                    let msg = fixem_wire::parse(&frame);
                    if let Err(e) = self.dispatch(&msg) {
                        tracing::warn!(error = %e, "error handling inbound message");
                    }
                }
                Ok(None) => {
                    tracing::info!(client_handle = self.client_handle, "connection closed");
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "transport error, closing session");
                    return;
                }
            }
            if self.logged_out {
                return;
            }
        }
    }

    fn read_frame(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(frame) = extract_frame(&mut self.read_buf) {
                return Ok(Some(frame));
            }
            if self.read_buf.len() > MAX_BUFFERED_BYTES {
                return Err(FixemError::InvalidValue {
                    tag: 0,
                    reason: "unterminated frame exceeded buffer limit".to_string(),
                });
            }
            let mut chunk = [0u8; READ_CHUNK];
            let n = self.stream.read(&mut chunk)?;
            if n == 0 {
                return Ok(None);
            }
            self.read_buf.extend_from_slice(&chunk[..n]);
        }
    }

    fn dispatch(&mut self, msg: &FixMessage) -> Result<()> {
        match msg.msg_type() {
            Some(msg_types::LOGON) => self.handle_logon(msg),
            Some(msg_types::HEARTBEAT) => self.handle_heartbeat(),
            Some(msg_types::LOGOUT) => self.handle_logout(),
            Some(msg_types::NEW_ORDER_SINGLE) => self.handle_new_order_single(msg),
            Some(msg_types::ORDER_CANCEL_REQUEST) => self.handle_cancel_request(msg),
            Some(msg_types::ORDER_CANCEL_REPLACE_REQUEST) => self.handle_cancel_replace(msg),
            other => {
                tracing::warn!(msg_type = ?other, "unsupported MsgType, no response sent");
                Ok(())
            }
        }
    }

    // ---- session layer ----------------------------------------------

    fn handle_logon(&mut self, _msg: &FixMessage) -> Result<()> {
        let fields = vec![
            (tags::ENCRYPT_METHOD, "0".to_string()),
            (
                tags::HEART_BT_INT,
                self.identity.heartbeat_interval.to_string(),
            ),
        ];
        self.send(msg_types::LOGON, fields)
    }

    fn handle_heartbeat(&mut self) -> Result<()> {
        self.send(msg_types::HEARTBEAT, Vec::new())
    }

    fn handle_logout(&mut self) -> Result<()> {
        self.send(msg_types::LOGOUT, Vec::new())?;
        self.logged_out = true;
        Ok(())
    }

    // ---- application layer: NewOrderSingle ---------------------------

    fn handle_new_order_single(&mut self, msg: &FixMessage) -> Result<()> {
        for tag in [tags::CL_ORD_ID, tags::SIDE, tags::ORDER_QTY, tags::SYMBOL, tags::ORD_TYPE] {
            if !msg.has(tag) {
                return self.session_reject(tag, 1, &format!("missing required tag {tag}"));
            }
        }

        let cl_ord_id = msg
            .get(tags::CL_ORD_ID)
            .ok_or_else(|| FixemError::MissingTag { tag: tags::CL_ORD_ID })?
            .to_string();
        let symbol = msg
            .get(tags::SYMBOL)
            .ok_or_else(|| FixemError::MissingTag { tag: tags::SYMBOL })?
            .to_string();

        // `spec.md` §4.6's validation ladder checks tag 54's *presence*
        // only (step 1); it does not enumerate an invalid-value check for
        // Side, so an unparseable value degrades to Buy rather than
        // rejecting, the order is still accepted and tracked.
        let side = msg
            .get(tags::SIDE)
            .and_then(OrderSide::from_fix_str)
            .unwrap_or(OrderSide::Buy);

        let qty: Decimal = match msg.get(tags::ORDER_QTY).and_then(|v| v.parse().ok()) {
            Some(q) if q > Decimal::ZERO => q,
            _ => return self.session_reject(tags::ORDER_QTY, 5, "OrderQty must be a positive number"),
        };

        let ord_type = match msg.get(tags::ORD_TYPE).and_then(OrdType::from_fix_str) {
            Some(t) => t,
            None => return self.session_reject(tags::ORD_TYPE, 2, "unsupported OrdType"),
        };

        let price = if ord_type == OrdType::Limit {
            match msg.get(tags::PRICE).and_then(|v| v.parse::<Decimal>().ok()) {
                Some(p) if p > Decimal::ZERO => p,
                _ => return self.session_reject(tags::PRICE, 5, "Price must be a positive number for a Limit order"),
            }
        } else {
            Decimal::ZERO
        };

        if self.store.contains(&cl_ord_id) {
            return self.send_business_reject(&cl_ord_id, None, &format!("Duplicate ClOrdID {cl_ord_id}"));
        }

        let order_id = format!("OR{}", epoch_millis());
        let exec_id = format!("EX{}", epoch_millis());
        let mut order = OrderRecord::new(
            order_id,
            cl_ord_id.clone(),
            symbol.clone(),
            side,
            qty,
            price,
            ord_type,
            self.client_handle,
        );

        self.store.insert_if_absent(&cl_ord_id, order.clone())?;

        self.send_exec_report(&order, ExecType::New, OrdStatus::New, Decimal::ZERO, exec_id)?;

        let behavior_name = self.rule_matcher.resolve(&symbol).to_string();
        let behaviors = Arc::clone(&self.behaviors);
        let engine = ScenarioEngine::new(&behaviors);
        let outcome = {
            let stream = &mut self.stream;
            let outbound_seq = &mut self.outbound_seq;
            let identity = &self.identity;
            engine.run_behavior(&mut order, &behavior_name, |o, exec| {
                send_scenario_exec(stream, identity, outbound_seq, o, exec)
            })
        };
        if let Err(e) = outcome {
            tracing::warn!(error = %e, behavior = behavior_name, "scenario aborted");
        }
        let _ = self.store.mutate(&order.current_cl_ord_id, |stored| {
            *stored = order.clone();
        });

        Ok(())
    }

    // ---- application layer: OrderCancelRequest -----------------------

    fn handle_cancel_request(&mut self, msg: &FixMessage) -> Result<()> {
        for tag in [tags::CL_ORD_ID, tags::ORIG_CL_ORD_ID, tags::SYMBOL, tags::SIDE] {
            if !msg.has(tag) {
                return self.session_reject(tag, 1, &format!("missing required tag {tag}"));
            }
        }

        let cl_ord_id = msg
            .get(tags::CL_ORD_ID)
            .ok_or_else(|| FixemError::MissingTag { tag: tags::CL_ORD_ID })?
            .to_string();
        let orig_cl_ord_id = msg
            .get(tags::ORIG_CL_ORD_ID)
            .ok_or_else(|| FixemError::MissingTag { tag: tags::ORIG_CL_ORD_ID })?
            .to_string();

        if self.store.contains(&cl_ord_id) {
            return self.send_business_reject(&cl_ord_id, None, &format!("Duplicate ClOrdID {cl_ord_id}"));
        }
        let Some(existing) = self.store.lookup(&orig_cl_ord_id) else {
            return self.send_business_reject(&cl_ord_id, None, &format!("Unknown order {orig_cl_ord_id}"));
        };
        if existing.status == OrdStatus::Canceled {
            return self.send_business_reject(&cl_ord_id, Some(&existing.order_id), &format!("Order {orig_cl_ord_id} already canceled"));
        }

        let mut order = self.store.rekey(&orig_cl_ord_id, &cl_ord_id)?;
        order.status = OrdStatus::Canceled;
        self.store.mutate(&cl_ord_id, |stored| *stored = order.clone())?;

        let exec_id = format!("EX{}", epoch_millis());
        self.send_exec_report(&order, ExecType::Canceled, OrdStatus::Canceled, Decimal::ZERO, exec_id)
    }

    // ---- application layer: OrderCancelReplaceRequest ----------------

    fn handle_cancel_replace(&mut self, msg: &FixMessage) -> Result<()> {
        for tag in [
            tags::CL_ORD_ID,
            tags::ORIG_CL_ORD_ID,
            tags::SYMBOL,
            tags::SIDE,
            tags::ORDER_QTY,
            tags::ORD_TYPE,
        ] {
            if !msg.has(tag) {
                return self.session_reject(tag, 1, &format!("missing required tag {tag}"));
            }
        }

        let cl_ord_id = msg
            .get(tags::CL_ORD_ID)
            .ok_or_else(|| FixemError::MissingTag { tag: tags::CL_ORD_ID })?
            .to_string();
        let orig_cl_ord_id = msg
            .get(tags::ORIG_CL_ORD_ID)
            .ok_or_else(|| FixemError::MissingTag { tag: tags::ORIG_CL_ORD_ID })?
            .to_string();

        if self.store.contains(&cl_ord_id) {
            return self.send_business_reject(&cl_ord_id, None, &format!("Duplicate ClOrdID {cl_ord_id}"));
        }
        if !self.store.contains(&orig_cl_ord_id) {
            return self.send_business_reject(&cl_ord_id, None, &format!("Unknown order {orig_cl_ord_id}"));
        }

        let qty: Decimal = match msg.get(tags::ORDER_QTY).and_then(|v| v.parse().ok()) {
            Some(q) if q > Decimal::ZERO => q,
            _ => return self.session_reject(tags::ORDER_QTY, 5, "OrderQty must be a positive number"),
        };
        let ord_type = match msg.get(tags::ORD_TYPE).and_then(OrdType::from_fix_str) {
            Some(t) => t,
            None => return self.session_reject(tags::ORD_TYPE, 2, "unsupported OrdType"),
        };
        let price = if ord_type == OrdType::Limit {
            match msg.get(tags::PRICE).and_then(|v| v.parse::<Decimal>().ok()) {
                Some(p) if p > Decimal::ZERO => p,
                _ => return self.session_reject(tags::PRICE, 5, "Price must be a positive number for a Limit order"),
            }
        } else {
            Decimal::ZERO
        };
        let side = msg
            .get(tags::SIDE)
            .and_then(OrderSide::from_fix_str)
            .unwrap_or(OrderSide::Buy);
        let symbol = msg
            .get(tags::SYMBOL)
            .ok_or_else(|| FixemError::MissingTag { tag: tags::SYMBOL })?
            .to_string();

        let mut order = self.store.rekey(&orig_cl_ord_id, &cl_ord_id)?;
        order.symbol = symbol.clone();
        order.side = side;
        order.orig_qty = qty;
        order.price = price;
        order.ord_type = ord_type;
        order.leaves_qty = qty - order.cum_qty;
        order.status = OrdStatus::Replaced;
        self.store.mutate(&cl_ord_id, |stored| *stored = order.clone())?;

        let exec_id = format!("EX{}", epoch_millis());
        self.send_exec_report(&order, ExecType::Replaced, OrdStatus::Replaced, Decimal::ZERO, exec_id)?;

        let behavior_name = self.rule_matcher.resolve(&symbol).to_string();
        let behaviors = Arc::clone(&self.behaviors);
        let engine = ScenarioEngine::new(&behaviors);
        let outcome = {
            let stream = &mut self.stream;
            let outbound_seq = &mut self.outbound_seq;
            let identity = &self.identity;
            engine.run_behavior(&mut order, &behavior_name, |o, exec| {
                send_scenario_exec(stream, identity, outbound_seq, o, exec)
            })
        };
        if let Err(e) = outcome {
            tracing::warn!(error = %e, behavior = behavior_name, "scenario aborted");
        }
        let _ = self.store.mutate(&order.current_cl_ord_id, |stored| {
            *stored = order.clone();
        });
        Ok(())
    }

    // ---- wire helpers -------------------------------------------------

    fn send(&mut self, msg_type: &str, extra: Vec<(u32, String)>) -> Result<()> {
        send_message(&mut self.stream, &self.identity, &mut self.outbound_seq, msg_type, extra)
    }

    fn session_reject(&mut self, ref_tag: u32, reason_code: u32, text: &str) -> Result<()> {
        let fields = vec![
            (tags::REF_TAG_ID, ref_tag.to_string()),
            (tags::SESSION_REJECT_REASON, reason_code.to_string()),
            (tags::TEXT, text.to_string()),
        ];
        self.send(msg_types::SESSION_REJECT, fields)
    }

    fn send_business_reject(&mut self, cl_ord_id: &str, order_id: Option<&str>, text: &str) -> Result<()> {
        let exec_id = format!("EX{}", epoch_millis());
        let fields = vec![
            (tags::EXEC_TYPE, ExecType::Rejected.as_fix_str().to_string()),
            (tags::ORD_STATUS, OrdStatus::Rejected.as_fix_str().to_string()),
            (tags::ORDER_ID, order_id.unwrap_or("NONE").to_string()),
            (tags::EXEC_ID, exec_id),
            (tags::CL_ORD_ID, cl_ord_id.to_string()),
            (tags::TEXT, text.to_string()),
        ];
        self.send(msg_types::EXECUTION_REPORT, fields)
    }

    fn send_exec_report(
        &mut self,
        order: &OrderRecord,
        exec_type: ExecType,
        ord_status: OrdStatus,
        last_qty: Decimal,
        exec_id: String,
    ) -> Result<()> {
        let fields = exec_report_fields(order, exec_type, ord_status, last_qty, exec_id);
        self.send(msg_types::EXECUTION_REPORT, fields)
    }
}

/// Test-only accessor so integration tests in `tests/` can assert on
/// logout without exposing the field publicly on the struct.
impl<S> SessionHandler<S> {
    /// True once this session has processed an inbound Logout.
    pub fn is_logged_out(&self) -> bool {
        self.logged_out
    }
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_millis()
}

fn exec_report_fields(
    order: &OrderRecord,
    exec_type: ExecType,
    ord_status: OrdStatus,
    last_qty: Decimal,
    exec_id: String,
) -> Vec<(u32, String)> {
    vec![
        (tags::EXEC_TYPE, exec_type.as_fix_str().to_string()),
        (tags::ORD_STATUS, ord_status.as_fix_str().to_string()),
        (tags::ORDER_ID, order.order_id.clone()),
        (tags::EXEC_ID, exec_id),
        (tags::CL_ORD_ID, order.current_cl_ord_id.clone()),
        (tags::SYMBOL, order.symbol.clone()),
        (tags::SIDE, order.side.as_fix_str().to_string()),
        (tags::ORDER_QTY, order.orig_qty.to_string()),
        (tags::PRICE, order.price.to_string()),
        (tags::TRANSACT_TIME, fix_timestamp(Utc::now())),
        (tags::LAST_QTY, last_qty.to_string()),
        (tags::LAST_PX, order.price.to_string()),
        (tags::CUM_QTY, order.cum_qty.to_string()),
        (tags::LEAVES_QTY, order.leaves_qty.to_string()),
    ]
}

/// Free function so the scenario engine's `emit` closure can borrow the
/// stream/seq/identity independently of `self`, without re-entering
/// `SessionHandler` methods while `order` is already borrowed mutably by
/// `run_behavior`.
fn send_scenario_exec<S: Write>(
    stream: &mut S,
    identity: &SessionIdentity,
    outbound_seq: &mut OutboundSeq,
    order: &OrderRecord,
    exec: &ScenarioExec,
) -> Result<()> {
    let exec_id = format!("EX{}", epoch_millis());
    let fields = exec_report_fields(order, exec.exec_type, exec.ord_status, exec.last_qty, exec_id);
    send_message(stream, identity, outbound_seq, msg_types::EXECUTION_REPORT, fields)
}

fn send_message<S: Write>(
    stream: &mut S,
    identity: &SessionIdentity,
    outbound_seq: &mut OutboundSeq,
    msg_type: &str,
    extra: Vec<(u32, String)>,
) -> Result<()> {
    let seq = outbound_seq.take();
    let mut fields = vec![
        (tags::MSG_TYPE, msg_type.to_string()),
        (tags::MSG_SEQ_NUM, seq.to_string()),
        (tags::SENDER_COMP_ID, identity.sender_comp_id.clone()),
        (tags::TARGET_COMP_ID, identity.target_comp_id.clone()),
        (tags::SENDING_TIME, fix_timestamp(Utc::now())),
    ];
    fields.extend(extra);
    let frame = fixem_wire::build(&fields);
    stream.write_all(&frame)?;
    stream.flush()?;
    Ok(())
}
