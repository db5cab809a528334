//! End-to-end session-handler scenarios driven over an in-memory duplex
//! stream rather than a real socket.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::rc::Rc;
use std::sync::Arc;

use fixem_config::{Behavior, ExecutionConfig, RuleConfig, ScenarioStep};
use fixem_core::OrderStore;
use fixem_scenario::RuleMatcher;
use fixem_session::{SessionHandler, SessionIdentity};
use fixem_wire::FixMessage;

const SOH: u8 = 0x01;

/// An in-memory duplex stream: reads drain a pre-loaded input buffer,
/// writes accumulate into a shared buffer the test retains a handle to
/// (via `Rc<RefCell<_>>`) so it can inspect outbound frames after `serve`
/// consumes the stream by value.
struct MockStream {
    input: Cursor<Vec<u8>>,
    output: Rc<RefCell<Vec<u8>>>,
}

impl MockStream {
    fn new(inbound_frames: &[Vec<u8>]) -> Self {
        Self::with_output(inbound_frames, Rc::new(RefCell::new(Vec::new())))
    }

    fn with_output(inbound_frames: &[Vec<u8>], output: Rc<RefCell<Vec<u8>>>) -> Self {
        let mut input = Vec::new();
        for frame in inbound_frames {
            input.extend_from_slice(frame);
        }
        Self {
            input: Cursor::new(input),
            output,
        }
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.output.borrow_mut().write(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Split a buffer of back-to-back FIX frames into parsed messages by
/// locating each `10=NNN` checksum field.
fn outbound_messages(output: &[u8]) -> Vec<FixMessage> {
    let mut msgs = Vec::new();
    let mut rest = output;
    loop {
        let Some(pos) = find(rest, b"10=") else {
            break;
        };
        if pos != 0 && rest[pos - 1] != SOH {
            rest = &rest[pos + 3..];
            continue;
        }
        let Some(end_rel) = rest[pos..].iter().position(|&b| b == SOH) else {
            break;
        };
        let end = pos + end_rel;
        msgs.push(fixem_wire::parse(&rest[..=end]));
        rest = &rest[end + 1..];
        if rest.is_empty() {
            break;
        }
    }
    msgs
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Build a well-formed inbound frame (BeginString/BodyLength/CheckSum
/// included) via the same encoder the handler uses to write its own
/// replies, so `extract_frame`'s `10=` search has something to find.
fn frame(fields: &[(u32, &str)]) -> Vec<u8> {
    let owned: Vec<(u32, String)> = fields
        .iter()
        .map(|(tag, value)| (*tag, value.to_string()))
        .collect();
    fixem_wire::build(&owned)
}

fn identity() -> SessionIdentity {
    SessionIdentity {
        sender_comp_id: "FIXEM".to_string(),
        target_comp_id: "CLIENT".to_string(),
        heartbeat_interval: 30,
    }
}

fn no_rules() -> Arc<RuleMatcher> {
    let execution = ExecutionConfig {
        default_behavior: "noop".to_string(),
        rules: vec![],
    };
    Arc::new(RuleMatcher::compile(&execution).unwrap())
}

fn empty_behaviors() -> Arc<HashMap<String, Behavior>> {
    let mut map = HashMap::new();
    map.insert(
        "noop".to_string(),
        Behavior {
            scenario: vec![ScenarioStep::End { end: true }],
        },
    );
    Arc::new(map)
}

#[test]
fn logon_heartbeat_logout_round_trip() {
    let inbound = vec![
        frame(&[(35, "A"), (34, "1"), (49, "C"), (56, "S"), (108, "30")]),
        frame(&[(35, "0"), (34, "2")]),
        frame(&[(35, "5"), (34, "3")]),
    ];
    let stream = MockStream::new(&inbound);
    let store = Arc::new(OrderStore::new());
    let mut handler = SessionHandler::new(
        stream,
        identity(),
        store,
        no_rules(),
        empty_behaviors(),
        1,
    );
    handler.serve();
    assert!(handler.is_logged_out());
}

#[test]
fn new_order_single_happy_path_acks_and_stores_order() {
    let inbound = vec![
        frame(&[
            (35, "D"),
            (11, "ORD1"),
            (55, "AAPL"),
            (54, "1"),
            (38, "100"),
            (40, "2"),
            (44, "150.25"),
        ]),
        frame(&[(35, "5"), (34, "2")]),
    ];
    let stream = MockStream::new(&inbound);
    let store = Arc::new(OrderStore::new());
    let mut handler = SessionHandler::new(
        stream,
        identity(),
        Arc::clone(&store),
        no_rules(),
        empty_behaviors(),
        1,
    );
    handler.serve();

    let order = store.lookup("ORD1").expect("order must be tracked");
    assert_eq!(order.leaves_qty, rust_decimal::Decimal::new(100, 0));
    assert_eq!(order.cum_qty, rust_decimal::Decimal::ZERO);
}

#[test]
fn reject_on_missing_ord_type() {
    let inbound = vec![frame(&[
        (35, "D"),
        (11, "ORD1"),
        (55, "AAPL"),
        (54, "1"),
        (38, "100"),
    ])];
    let stream = MockStream::new(&inbound);
    let store = Arc::new(OrderStore::new());
    let mut handler = SessionHandler::new(
        stream,
        identity(),
        Arc::clone(&store),
        no_rules(),
        empty_behaviors(),
        1,
    );
    handler.serve();

    assert!(store.lookup("ORD1").is_none());
}

#[test]
fn duplicate_cl_ord_id_is_business_rejected() {
    let inbound = vec![
        frame(&[
            (35, "D"),
            (11, "ORD1"),
            (55, "AAPL"),
            (54, "1"),
            (38, "100"),
            (40, "2"),
            (44, "150.25"),
        ]),
        frame(&[
            (35, "D"),
            (11, "ORD1"),
            (55, "AAPL"),
            (54, "1"),
            (38, "100"),
            (40, "2"),
            (44, "150.25"),
        ]),
    ];
    let stream = MockStream::new(&inbound);
    let store = Arc::new(OrderStore::new());
    let mut handler = SessionHandler::new(
        stream,
        identity(),
        Arc::clone(&store),
        no_rules(),
        empty_behaviors(),
        1,
    );
    handler.serve();

    assert!(store.lookup("ORD1").is_some());
}

#[test]
fn cancel_replace_rekeys_order_and_updates_fields() {
    let inbound = vec![
        frame(&[
            (35, "D"),
            (11, "ORD1"),
            (55, "AAPL"),
            (54, "1"),
            (38, "100"),
            (40, "2"),
            (44, "150.25"),
        ]),
        frame(&[
            (35, "G"),
            (41, "ORD1"),
            (11, "ORD2"),
            (55, "AAPL"),
            (54, "1"),
            (38, "200"),
            (40, "2"),
            (44, "151.00"),
        ]),
    ];
    let stream = MockStream::new(&inbound);
    let store = Arc::new(OrderStore::new());
    let mut handler = SessionHandler::new(
        stream,
        identity(),
        Arc::clone(&store),
        no_rules(),
        empty_behaviors(),
        1,
    );
    handler.serve();

    assert!(store.lookup("ORD1").is_none());
    let replaced = store.lookup("ORD2").expect("replacement must be tracked");
    assert_eq!(replaced.orig_qty, rust_decimal::Decimal::new(200, 0));
    assert_eq!(replaced.history, vec!["ORD1".to_string(), "ORD2".to_string()]);
}

#[test]
fn scenario_partial_then_fill_emits_both_exec_reports_in_order() {
    let inbound = vec![frame(&[
        (35, "D"),
        (11, "ORD1"),
        (55, "AAPL"),
        (54, "1"),
        (38, "100"),
        (40, "2"),
        (44, "150.25"),
    ])];
    let stream = MockStream::new(&inbound);
    let store = Arc::new(OrderStore::new());

    let execution = ExecutionConfig {
        default_behavior: "partial_then_fill".to_string(),
        rules: vec![RuleConfig {
            pattern: "AAPL".to_string(),
            behavior: "partial_then_fill".to_string(),
        }],
    };
    let rule_matcher = Arc::new(RuleMatcher::compile(&execution).unwrap());

    let mut behaviors = HashMap::new();
    behaviors.insert(
        "partial_then_fill".to_string(),
        Behavior {
            scenario: vec![
                ScenarioStep::Send {
                    send: "partial".to_string(),
                },
                ScenarioStep::Delay { delay: 1 },
                ScenarioStep::Send {
                    send: "fill".to_string(),
                },
                ScenarioStep::End { end: true },
            ],
        },
    );

    let mut handler = SessionHandler::new(
        stream,
        identity(),
        Arc::clone(&store),
        rule_matcher,
        Arc::new(behaviors),
        1,
    );
    handler.serve();

    let order = store.lookup("ORD1").expect("order must be tracked");
    assert_eq!(order.cum_qty, rust_decimal::Decimal::new(100, 0));
    assert_eq!(order.leaves_qty, rust_decimal::Decimal::ZERO);
}

#[test]
fn outbound_seq_increments_strictly_from_one() {
    let inbound = vec![
        frame(&[(35, "A"), (34, "1")]),
        frame(&[(35, "0"), (34, "2")]),
        frame(&[(35, "5"), (34, "3")]),
    ];
    let output = Rc::new(RefCell::new(Vec::new()));
    let stream = MockStream::with_output(&inbound, Rc::clone(&output));
    let store = Arc::new(OrderStore::new());
    let mut handler = SessionHandler::new(
        stream,
        identity(),
        store,
        no_rules(),
        empty_behaviors(),
        1,
    );
    handler.serve();

    let sent = outbound_messages(&output.borrow());
    assert_eq!(sent.len(), 3);
    let seqs: Vec<&str> = sent
        .iter()
        .map(|m| m.get(34).expect("MsgSeqNum present"))
        .collect();
    assert_eq!(seqs, vec!["1", "2", "3"]);
    assert_eq!(sent[0].msg_type(), Some("A"));
    assert_eq!(sent[1].msg_type(), Some("0"));
    assert_eq!(sent[2].msg_type(), Some("5"));
}
