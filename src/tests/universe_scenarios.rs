// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Capability space scenarios

use std::collections::BTreeSet;

use crate::error::HelError;
use crate::object::{Descriptor, DescriptorKind, EventHub, EventKind, Handle, MsgFlags, SubmitInfo};
use crate::sched::Deadline;
use crate::syscall::Hel;
use crate::testing::Harness;

const REQUEST: u32 = MsgFlags::REQUEST.bits();

#[test]
fn test_handles_stay_unique_across_attach_and_detach() {
    let harness = Harness::new();
    let universe = &harness.universe;
    let mut live = BTreeSet::new();
    let mut detached = Vec::new();

    for round in 0..64 {
        let handle = universe.attach(Descriptor::EventHub(EventHub::new()));
        assert!(live.insert(handle), "handle {} handed out twice", handle);

        if round % 3 == 0 {
            let victim = *live.iter().next().unwrap();
            live.remove(&victim);
            universe.detach(victim).unwrap();
            detached.push(victim);
        }
    }

    for handle in detached {
        assert_eq!(universe.get(handle).err(), Some(HelError::NoDescriptor));
    }
    for handle in live {
        let descriptor = universe.get(handle).unwrap();
        assert!(descriptor.as_event_hub().is_ok());
        assert_eq!(descriptor.as_endpoint().err(), Some(HelError::BadDescriptor));
    }
}

#[test]
fn test_parent_hands_descriptor_to_child() {
    let harness = Harness::new();
    let parent = harness.hel();
    let parent_hub = parent.create_event_hub();
    let child_space = parent.create_universe();
    let shared = parent.create_directory();

    let child_thread = parent
        .create_thread(child_space, Handle::NULL, Handle::NULL, 0x4000, 0x8000, 0)
        .unwrap();
    let child_thread = parent
        .universe()
        .get(child_thread)
        .unwrap()
        .as_thread()
        .unwrap()
        .clone();
    let child = Hel::new(&harness.kernel, child_thread);
    let child_hub = child.create_event_hub();

    // The child listens on its own universe channel
    let recv = child
        .submit_recv_descriptor(Handle::THIS_UNIVERSE, child_hub, 0, 0, REQUEST, SubmitInfo::NONE)
        .unwrap();
    // The parent reaches the other end through the universe descriptor
    parent
        .submit_send_descriptor(child_space, parent_hub, shared, 1, 0, REQUEST, SubmitInfo::NONE)
        .unwrap();

    let events = child.wait_for_events(child_hub, 8, Deadline::poll()).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].async_id, recv);
    assert_eq!(events[0].kind, EventKind::RecvDescriptor);
    assert_eq!(events[0].msg_request, 1);
    assert_eq!(
        child.descriptor_info(events[0].handle),
        Ok(DescriptorKind::Directory)
    );

    let sent = parent.wait_for_events(parent_hub, 8, Deadline::poll()).unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, EventKind::SendDescriptor);
    assert_eq!(sent[0].result(), Ok(()));
}

#[test]
fn test_this_universe_is_not_a_table_entry() {
    let harness = Harness::new();
    let hel = harness.hel();

    assert_eq!(
        hel.descriptor_info(Handle::THIS_UNIVERSE),
        Err(HelError::NoDescriptor)
    );
    assert_eq!(hel.descriptor_info(Handle::NULL), Err(HelError::NoDescriptor));
    assert_eq!(
        hel.close_descriptor(Handle::THIS_UNIVERSE),
        Err(HelError::NoDescriptor)
    );
}

#[test]
fn test_objects_live_while_any_space_holds_them() {
    let harness = Harness::new();
    let hel = harness.hel();
    let child = hel.create_universe();
    let (a, b) = hel.create_full_pipe();
    let hub = hel.create_event_hub();

    let moved = hel.transfer_descriptor(a, child).unwrap();
    hel.close_descriptor(a).unwrap();

    // The child's copy keeps the endpoint open
    hel.submit_recv_string(b, hub, 8, 0, 0, REQUEST, SubmitInfo::NONE)
        .unwrap();
    assert!(hel
        .wait_for_events(hub, 8, Deadline::poll())
        .unwrap()
        .is_empty());

    let child_space = hel.universe().get(child).unwrap().as_universe().unwrap().clone();
    drop(child_space.detach(moved).unwrap());

    let events = hel.wait_for_events(hub, 8, Deadline::poll()).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].error, Some(HelError::ClosedRemotely));
}
