// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Interrupt relay scenarios

use crate::interrupt::IrqFlags;
use crate::object::{EventKind, SubmitInfo};
use crate::sched::Deadline;
use crate::testing::{ControllerCall, Harness};

#[test]
fn test_one_interrupt_completes_every_wait() {
    let harness = Harness::new();
    let hel = harness.hel();
    let hub = hel.create_event_hub();
    let line = hel.access_irq(4).unwrap();
    let other_line = hel.access_irq(4).unwrap();
    let unrelated = hel.access_irq(5).unwrap();

    let first = hel.submit_wait_for_irq(line, hub, SubmitInfo::NONE).unwrap();
    let second = hel.submit_wait_for_irq(line, hub, SubmitInfo::NONE).unwrap();
    let third = hel
        .submit_wait_for_irq(other_line, hub, SubmitInfo::NONE)
        .unwrap();
    hel.submit_wait_for_irq(unrelated, hub, SubmitInfo::NONE)
        .unwrap();

    harness.kernel.on_irq(4).unwrap();

    let events = hel.wait_for_events(hub, 8, Deadline::poll()).unwrap();
    let mut ids: Vec<i64> = events.iter().map(|e| e.async_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![first, second, third]);
    assert!(events
        .iter()
        .all(|e| e.kind == EventKind::Irq && e.sequence == 1));
    assert_eq!(harness.controller_log.calls(), vec![ControllerCall::Eoi(4)]);

    // Waits are one-shot
    harness.kernel.on_irq(4).unwrap();
    assert!(hel
        .wait_for_events(hub, 8, Deadline::poll())
        .unwrap()
        .is_empty());
}

#[test]
fn test_manual_acknowledge_holds_back_next_interrupt() {
    let harness = Harness::new();
    let hel = harness.hel();
    let hub = hel.create_event_hub();
    let line = hel.access_irq(6).unwrap();
    hel.setup_irq(line, IrqFlags::MANUAL_ACKNOWLEDGE.bits())
        .unwrap();

    hel.submit_wait_for_irq(line, hub, SubmitInfo::NONE).unwrap();
    harness.kernel.on_irq(6).unwrap();
    let events = hel.wait_for_events(hub, 8, Deadline::poll()).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].sequence, 1);

    // Raised again before the driver acknowledged
    let second = hel.submit_wait_for_irq(line, hub, SubmitInfo::NONE).unwrap();
    harness.kernel.on_irq(6).unwrap();
    assert!(hel
        .wait_for_events(hub, 8, Deadline::poll())
        .unwrap()
        .is_empty());
    assert!(harness.kernel.irqs().relay(6).unwrap().is_masked());

    // The acknowledge releases the latched interrupt
    hel.acknowledge_irq(line).unwrap();
    let events = hel.wait_for_events(hub, 8, Deadline::poll()).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].async_id, second);
    assert_eq!(events[0].sequence, 2);
    assert!(harness.kernel.irqs().relay(6).unwrap().is_masked());

    hel.acknowledge_irq(line).unwrap();
    assert!(!harness.kernel.irqs().relay(6).unwrap().is_masked());

    assert_eq!(
        harness.controller_log.calls(),
        vec![
            ControllerCall::Disable(6),
            ControllerCall::Eoi(6),
            ControllerCall::Eoi(6),
            ControllerCall::Enable(6),
        ]
    );
}

#[test]
fn test_interrupt_after_hub_closed_is_dropped() {
    let harness = Harness::new();
    let hel = harness.hel();
    let hub = hel.create_event_hub();
    let line = hel.access_irq(7).unwrap();
    hel.submit_wait_for_irq(line, hub, SubmitInfo::NONE).unwrap();

    hel.close_descriptor(hub).unwrap();
    harness.kernel.on_irq(7).unwrap();

    // Delivered and counted even though nobody can see the completion
    assert_eq!(harness.kernel.irqs().relay(7).unwrap().sequence(), 1);
    let line_object = hel.universe().get(line).unwrap().as_irq().unwrap().clone();
    assert_eq!(line_object.pending_waits(), 0);
}
