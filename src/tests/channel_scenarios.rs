// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Message passing scenarios

use crate::error::HelError;
use crate::object::{EventKind, MsgFlags, SubmitInfo};
use crate::sched::Deadline;
use crate::testing::Harness;

const REQUEST: u32 = MsgFlags::REQUEST.bits();

#[test]
fn test_ping_reaches_filtered_receive() {
    let harness = Harness::new();
    let hel = harness.hel();
    let (a, b) = hel.create_full_pipe();
    let recv_hub = hel.create_event_hub();
    let send_hub = hel.create_event_hub();

    let recv = hel
        .submit_recv_string(a, recv_hub, 64, 1, 0, REQUEST, SubmitInfo::NONE)
        .unwrap();
    hel.submit_send_string(b, send_hub, b"ping", 1, 0, REQUEST, SubmitInfo::NONE)
        .unwrap();

    let events = hel.wait_for_events(recv_hub, 8, Deadline::Never).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::RecvString);
    assert_eq!(events[0].async_id, recv);
    assert_eq!(events[0].result(), Ok(()));
    assert_eq!(events[0].payload, b"ping".to_vec());
    assert_eq!(events[0].length, 4);

    let sent = hel.wait_for_events(send_hub, 8, Deadline::Never).unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, EventKind::SendString);
}

#[test]
fn test_receives_match_sends_in_order() {
    let harness = Harness::new();
    let hel = harness.hel();
    let hub = hel.create_event_hub();
    let (a, b) = hel.create_full_pipe();

    let first = hel
        .submit_recv_string(a, hub, 8, 0, 0, REQUEST, SubmitInfo::NONE)
        .unwrap();
    let second = hel
        .submit_recv_string(a, hub, 8, 0, 0, REQUEST, SubmitInfo::NONE)
        .unwrap();
    hel.submit_send_string(b, hub, b"a", 1, 0, REQUEST, SubmitInfo::NONE)
        .unwrap();
    hel.submit_send_string(b, hub, b"b", 1, 0, REQUEST, SubmitInfo::NONE)
        .unwrap();

    let events = hel.wait_for_events(hub, 8, Deadline::poll()).unwrap();
    let received: Vec<(i64, Vec<u8>)> = events
        .into_iter()
        .filter(|e| e.kind == EventKind::RecvString)
        .map(|e| (e.async_id, e.payload))
        .collect();
    assert_eq!(
        received,
        vec![(first, b"a".to_vec()), (second, b"b".to_vec())]
    );
}

#[test]
fn test_request_and_sequence_filters() {
    let harness = Harness::new();
    let hel = harness.hel();
    let hub = hel.create_event_hub();
    let (a, b) = hel.create_full_pipe();
    let response = MsgFlags::RESPONSE.bits();

    // Queued sends are searched in order for the first acceptable one
    hel.submit_send_string(b, hub, b"req", 7, 0, REQUEST, SubmitInfo::NONE)
        .unwrap();
    hel.submit_send_string(b, hub, b"resp-1", 7, 1, response, SubmitInfo::NONE)
        .unwrap();
    hel.submit_send_string(b, hub, b"resp-2", 7, 2, response, SubmitInfo::NONE)
        .unwrap();

    let recv = hel
        .submit_recv_string(a, hub, 16, 7, 2, response, SubmitInfo::NONE)
        .unwrap();
    let events = hel.wait_for_events(hub, 8, Deadline::poll()).unwrap();
    let received = events.iter().find(|e| e.async_id == recv).unwrap();
    assert_eq!(received.payload, b"resp-2".to_vec());
    assert_eq!(received.msg_sequence, 2);

    let endpoint = hel.universe().get(a).unwrap().as_endpoint().unwrap().clone();
    assert_eq!(endpoint.read_channel().pending_sends(), 2);
}

#[test]
fn test_close_fails_pending_receives() {
    let harness = Harness::new();
    let hel = harness.hel();
    let hub = hel.create_event_hub();
    let (a, b) = hel.create_full_pipe();

    for _ in 0..3 {
        hel.submit_recv_string(a, hub, 8, 0, 0, REQUEST, SubmitInfo::NONE)
            .unwrap();
    }
    let endpoint = hel.universe().get(a).unwrap().as_endpoint().unwrap().clone();
    endpoint.close();

    let events = hel.wait_for_events(hub, 8, Deadline::poll()).unwrap();
    assert_eq!(events.len(), 3);
    assert!(events
        .iter()
        .all(|e| e.kind == EventKind::RecvString && e.error == Some(HelError::ClosedLocally)));

    // Later submissions on the closed side never reach the queue
    assert_eq!(
        hel.submit_recv_string(a, hub, 8, 0, 0, REQUEST, SubmitInfo::NONE),
        Err(HelError::ClosedLocally)
    );
    assert_eq!(
        hel.submit_send_string(a, hub, b"x", 1, 0, REQUEST, SubmitInfo::NONE),
        Err(HelError::ClosedLocally)
    );
    assert_eq!(endpoint.read_channel().pending_recvs(), 0);

    // The peer learns about it through its completions
    hel.submit_send_string(b, hub, b"late", 1, 0, REQUEST, SubmitInfo::NONE)
        .unwrap();
    let events = hel.wait_for_events(hub, 8, Deadline::poll()).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].error, Some(HelError::ClosedRemotely));
}

#[test]
fn test_dropping_last_handle_closes_endpoint() {
    let harness = Harness::new();
    let hel = harness.hel();
    let hub = hel.create_event_hub();
    let (a, b) = hel.create_full_pipe();

    hel.submit_recv_string(b, hub, 8, 0, 0, REQUEST, SubmitInfo::NONE)
        .unwrap();
    hel.close_descriptor(a).unwrap();

    let events = hel.wait_for_events(hub, 8, Deadline::poll()).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].error, Some(HelError::ClosedRemotely));
}

#[test]
fn test_buffer_too_small_is_not_redelivered() {
    let harness = Harness::new();
    let hel = harness.hel();
    let hub = hel.create_event_hub();
    let (a, b) = hel.create_full_pipe();

    let small = hel
        .submit_recv_string(a, hub, 4, 0, 0, REQUEST, SubmitInfo::NONE)
        .unwrap();
    let send = hel
        .submit_send_string(b, hub, b"12345678", 1, 0, REQUEST, SubmitInfo::NONE)
        .unwrap();

    let events = hel.wait_for_events(hub, 8, Deadline::poll()).unwrap();
    let failed = events.iter().find(|e| e.async_id == small).unwrap();
    assert_eq!(failed.error, Some(HelError::BufferTooSmall));
    assert!(failed.payload.is_empty());
    let sent = events.iter().find(|e| e.async_id == send).unwrap();
    assert_eq!(sent.result(), Ok(()));

    // The consumed message is gone for good
    hel.submit_recv_string(a, hub, 64, 0, 0, REQUEST, SubmitInfo::NONE)
        .unwrap();
    assert!(hel
        .wait_for_events(hub, 8, Deadline::poll())
        .unwrap()
        .is_empty());
    let endpoint = hel.universe().get(a).unwrap().as_endpoint().unwrap().clone();
    assert_eq!(endpoint.read_channel().pending_recvs(), 1);
}
