//! Scenario engine (C4): interprets a behavior's step sequence against an
//! order, synchronously on the calling session-handler thread, grounded
//! on `original_source/ScenarioEngine.py::runBehavior`/`executeStep`, with
//! the `orderObj["server"]` back-reference replaced by an `emit` callback
//! the caller supplies at call time.

use std::str::FromStr;
use std::thread;
use std::time::Duration;

use fixem_config::{Behavior, BehaviorLibrary, ScenarioStep};
use fixem_core::{ExecType, FixemError, OrdStatus, OrderRecord, Result};
use rust_decimal::Decimal;

/// One of the six `send` actions a scenario step may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendAction {
    /// Acknowledgment only; no `ExecutionReport` is emitted for this step
    /// (the NewOrderSingle ack was already sent before the scenario ran).
    New,
    /// 25%-of-leaves partial fill.
    Partial,
    /// Fills all remaining leaves.
    Fill,
    /// Synthetic cancel from the exchange side.
    Cancel,
    /// Synthetic reject from the exchange side.
    Reject,
    /// Acknowledges a replace.
    ReplaceAck,
}

impl FromStr for SendAction {
    type Err = FixemError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "new" => Ok(Self::New),
            "partial" => Ok(Self::Partial),
            "fill" | "full_fill" => Ok(Self::Fill),
            "cancel" => Ok(Self::Cancel),
            "reject" => Ok(Self::Reject),
            "replace_ack" => Ok(Self::ReplaceAck),
            other => Err(FixemError::Scenario(format!(
                "unsupported send action '{other}'"
            ))),
        }
    }
}

/// The transient, per-execution-report fields one transition produces.
/// `OrderRecord`'s `cum_qty`/`leaves_qty`/`status` are mutated in place by
/// `run_behavior`; this struct carries the values
/// that only ever appear on the wire (`LastQty`, `ExecType`) alongside the
/// post-transition `OrdStatus` for convenience.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioExec {
    /// Tag 150.
    pub exec_type: ExecType,
    /// Tag 39, post-transition.
    pub ord_status: OrdStatus,
    /// Tag 32.
    pub last_qty: Decimal,
}

/// Executes behaviors from a shared library against individual orders.
pub struct ScenarioEngine<'a> {
    behaviors: &'a BehaviorLibrary,
}

impl<'a> ScenarioEngine<'a> {
    /// Borrow a behavior library (typically the session's shared, loaded
    /// `behaviors.yaml`).
    #[must_use]
    pub fn new(behaviors: &'a BehaviorLibrary) -> Self {
        Self { behaviors }
    }

    /// Run `behavior_name`'s step sequence against `order`, calling `emit`
    /// once per `send` step that produces an `ExecutionReport` (i.e. every
    /// action but `new`). `delay` steps block this thread; `wait_for` is
    /// currently a no-op stub; `end` terminates early; any other step shape
    /// aborts the run with `FixemError::Scenario` without emitting a report
    /// for that step.
    pub fn run_behavior(
        &self,
        order: &mut OrderRecord,
        behavior_name: &str,
        mut emit: impl FnMut(&OrderRecord, &ScenarioExec) -> Result<()>,
    ) -> Result<()> {
        let behavior: &Behavior = self.behaviors.get(behavior_name).ok_or_else(|| {
            FixemError::Scenario(format!("behavior '{behavior_name}' not found"))
        })?;

        tracing::info!(
            behavior = behavior_name,
            cl_ord_id = %order.current_cl_ord_id,
            "starting scenario behavior"
        );

        for (idx, step) in behavior.scenario.iter().enumerate() {
            let step_no = idx + 1;
            match step {
                ScenarioStep::Send { send } => {
                    tracing::info!(step_no, action = %send, "scenario step: send");
                    let action = SendAction::from_str(send)?;
                    if let Some(exec) = apply_transition(order, action) {
                        emit(order, &exec)?;
                    }
                }
                ScenarioStep::Delay { delay } => {
                    tracing::info!(step_no, ms = delay, "scenario step: delay");
                    thread::sleep(Duration::from_millis(*delay));
                }
                ScenarioStep::WaitFor { wait_for } => {
                    // TODO: block on a per-order Condvar signaled by the
                    // session handler when a matching inbound message
                    // arrives (e.g. `cancel_received`).
                    tracing::info!(step_no, event = %wait_for, "scenario step: wait_for (stub, returning immediately)");
                }
                ScenarioStep::End { .. } => {
                    tracing::info!(step_no, "scenario step: end");
                    break;
                }
                ScenarioStep::Unknown(value) => {
                    return Err(FixemError::Scenario(format!(
                        "unsupported scenario step at position {step_no}: {value:?}"
                    )));
                }
            }
        }

        tracing::info!(
            behavior = behavior_name,
            cl_ord_id = %order.current_cl_ord_id,
            "completed scenario behavior"
        );
        Ok(())
    }
}

/// Apply one `send` action's transition to `order` in place, returning the
/// `ExecutionReport`-only fields to emit, or `None` for `new` (which emits
/// nothing (the acceptance ack already covered it).
fn apply_transition(order: &mut OrderRecord, action: SendAction) -> Option<ScenarioExec> {
    match action {
        SendAction::New => None,
        SendAction::Partial => {
            let last_qty = order.leaves_qty * Decimal::new(25, 2);
            order.cum_qty += last_qty;
            order.leaves_qty -= last_qty;
            order.status = if order.leaves_qty > Decimal::ZERO {
                OrdStatus::PartiallyFilled
            } else {
                OrdStatus::Filled
            };
            Some(ScenarioExec {
                exec_type: ExecType::PartialFill,
                ord_status: order.status,
                last_qty,
            })
        }
        SendAction::Fill => {
            let last_qty = if order.leaves_qty > Decimal::ZERO {
                order.leaves_qty
            } else {
                order.orig_qty
            };
            order.cum_qty = order.orig_qty;
            order.leaves_qty = Decimal::ZERO;
            order.status = OrdStatus::Filled;
            Some(ScenarioExec {
                exec_type: ExecType::Fill,
                ord_status: OrdStatus::Filled,
                last_qty,
            })
        }
        SendAction::Cancel => {
            order.status = OrdStatus::Canceled;
            Some(ScenarioExec {
                exec_type: ExecType::Canceled,
                ord_status: OrdStatus::Canceled,
                last_qty: Decimal::ZERO,
            })
        }
        SendAction::Reject => {
            order.status = OrdStatus::Rejected;
            Some(ScenarioExec {
                exec_type: ExecType::Rejected,
                ord_status: OrdStatus::Rejected,
                last_qty: Decimal::ZERO,
            })
        }
        SendAction::ReplaceAck => {
            order.status = OrdStatus::Replaced;
            Some(ScenarioExec {
                exec_type: ExecType::Replaced,
                ord_status: OrdStatus::Replaced,
                last_qty: Decimal::ZERO,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixem_config::ScenarioStep as Step;
    use fixem_core::{OrdType, OrderSide};
    use std::collections::HashMap;

    fn order(orig_qty: i64) -> OrderRecord {
        OrderRecord::new(
            "OR1".into(),
            "ORD1".into(),
            "AAPL".into(),
            OrderSide::Buy,
            Decimal::new(orig_qty, 0),
            Decimal::new(15025, 2),
            OrdType::Limit,
            1,
        )
    }

    fn library(steps: Vec<Step>) -> BehaviorLibrary {
        let mut map = HashMap::new();
        map.insert("b".to_string(), Behavior { scenario: steps });
        map
    }

    #[test]
    fn partial_then_fill_matches_spec_example() {
        let steps = vec![
            Step::Send {
                send: "partial".to_string(),
            },
            Step::Delay { delay: 1 },
            Step::Send {
                send: "fill".to_string(),
            },
            Step::End { end: true },
        ];
        let behaviors = library(steps);
        let engine = ScenarioEngine::new(&behaviors);
        let mut order = order(100);

        let mut execs = Vec::new();
        engine
            .run_behavior(&mut order, "b", |_order, exec| {
                execs.push(*exec);
                Ok(())
            })
            .unwrap();

        assert_eq!(execs.len(), 2);
        assert_eq!(execs[0].last_qty, Decimal::new(25, 0));
        assert_eq!(execs[0].ord_status, OrdStatus::PartiallyFilled);
        assert_eq!(execs[1].last_qty, Decimal::new(75, 0));
        assert_eq!(execs[1].ord_status, OrdStatus::Filled);

        assert_eq!(order.cum_qty, Decimal::new(100, 0));
        assert_eq!(order.leaves_qty, Decimal::ZERO);
        assert_eq!(order.status, OrdStatus::Filled);
    }

    #[test]
    fn new_action_emits_nothing() {
        let steps = vec![Step::Send {
            send: "new".to_string(),
        }];
        let behaviors = library(steps);
        let engine = ScenarioEngine::new(&behaviors);
        let mut order = order(100);

        let mut calls = 0;
        engine
            .run_behavior(&mut order, "b", |_order, _exec| {
                calls += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(calls, 0);
    }

    #[test]
    fn end_step_skips_remaining_steps() {
        let steps = vec![
            Step::End { end: true },
            Step::Send {
                send: "fill".to_string(),
            },
        ];
        let behaviors = library(steps);
        let engine = ScenarioEngine::new(&behaviors);
        let mut order = order(100);

        let mut calls = 0;
        engine
            .run_behavior(&mut order, "b", |_order, _exec| {
                calls += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(calls, 0);
    }

    #[test]
    fn unknown_step_fails_behavior_without_emitting() {
        let steps = vec![Step::Unknown(serde_yaml::Value::Null)];
        let behaviors = library(steps);
        let engine = ScenarioEngine::new(&behaviors);
        let mut order = order(100);

        let mut calls = 0;
        let err = engine
            .run_behavior(&mut order, "b", |_order, _exec| {
                calls += 1;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, FixemError::Scenario(_)));
        assert_eq!(calls, 0);
    }

    #[test]
    fn wait_for_is_a_no_op_stub() {
        let steps = vec![
            Step::WaitFor {
                wait_for: "cancel_received".to_string(),
            },
            Step::Send {
                send: "fill".to_string(),
            },
        ];
        let behaviors = library(steps);
        let engine = ScenarioEngine::new(&behaviors);
        let mut order = order(100);

        let mut calls = 0;
        engine
            .run_behavior(&mut order, "b", |_order, _exec| {
                calls += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(calls, 1);
    }

    #[test]
    fn unknown_behavior_name_fails() {
        let behaviors = library(vec![]);
        let engine = ScenarioEngine::new(&behaviors);
        let mut order = order(100);
        let err = engine
            .run_behavior(&mut order, "nope", |_, _| Ok(()))
            .unwrap_err();
        assert!(matches!(err, FixemError::Scenario(_)));
    }
}
