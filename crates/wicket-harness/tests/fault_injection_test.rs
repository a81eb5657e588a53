//! Fault injection tests.
//!
//! Every fatal condition must self-heal: the session returns to its start
//! state, closes the transport, and the next steps begin a fresh listen
//! cycle. Nothing ever surfaces to the scheduler.

use wicket_core::{LoginPhase, Session, SessionState};
use wicket_harness::{RecordingDelay, ScriptedTransport, SendScript, test_config, test_session};

type TestSession = Session<ScriptedTransport, RecordingDelay>;

fn drive_to_collect_user(session: &mut TestSession, transport: &ScriptedTransport) {
    transport.connect_peer();
    session.enable();
    for _ in 0..5 {
        session.step();
    }
    assert_eq!(session.state(), SessionState::Connected(LoginPhase::CollectUser));
}

fn log_in(session: &mut TestSession, transport: &ScriptedTransport) {
    drive_to_collect_user(session, transport);
    transport.push_datagram(b"guest\r");
    session.step();
    session.step();
    session.step();
    transport.push_datagram(b"wicket\r");
    session.step();
    session.step();
    session.step();
    assert_eq!(session.state(), SessionState::LoggedIn);
}

#[test]
fn exhausted_send_budget_forces_a_reset() {
    let (mut session, transport, _delay) = test_session(test_config());
    transport.connect_peer();
    session.enable();
    session.step();
    session.step();

    // budget is 25 retries: 25 blocked attempts keep trying, the 26th fails
    transport.block_sends(26);
    for _ in 0..25 {
        session.step();
        assert_eq!(session.state(), SessionState::Connected(LoginPhase::Welcome));
    }
    session.step();
    assert_eq!(session.state(), SessionState::Start);
    assert_eq!(transport.closes(), 1);
}

#[test]
fn a_fatal_send_error_resets_immediately() {
    let (mut session, transport, _delay) = test_session(test_config());
    transport.connect_peer();
    session.enable();
    session.step();
    session.step();

    transport.script_send(SendScript::Fail);
    session.step();
    assert_eq!(session.state(), SessionState::Start);
    assert_eq!(transport.closes(), 1);
}

#[test]
fn a_fatal_receive_error_resets_immediately() {
    let (mut session, transport, _delay) = test_session(test_config());
    drive_to_collect_user(&mut session, &transport);

    transport.fail_next_recv();
    session.step();
    assert_eq!(session.state(), SessionState::Start);
    assert_eq!(transport.closes(), 1);
}

#[test]
fn an_empty_datagram_counts_as_idle() {
    let (mut session, transport, _delay) = test_session(test_config());
    log_in(&mut session, &transport);

    // nothing to admit, nothing fatal: the session stays logged in
    transport.push_datagram(b"");
    session.step();
    assert_eq!(session.state(), SessionState::LoggedIn);
    assert_eq!(transport.closes(), 0);
}

#[test]
fn idle_ticks_without_data_force_a_reset() {
    let (mut session, transport, _delay) = test_session(test_config());
    drive_to_collect_user(&mut session, &transport);

    // 500 ms budget over 10 ms cycles: 50 ticks
    for _ in 0..60 {
        session.step();
        if transport.closes() == 1 {
            break;
        }
    }
    assert_eq!(transport.closes(), 1);
    assert!(!session.is_active());
}

#[test]
fn received_data_holds_the_idle_timeout_off() {
    let (mut session, transport, _delay) = test_session(test_config());
    log_in(&mut session, &transport);

    // 120 ticks would blow the 50-tick budget twice over, but regular
    // datagrams keep resetting the counter
    for tick in 0..120 {
        if tick % 40 == 0 {
            transport.push_datagram(b"k");
        }
        session.step();
    }
    assert_eq!(transport.closes(), 0);
    assert!(session.is_active());
}

#[test]
fn the_session_recovers_after_a_reset() {
    let (mut session, transport, _delay) = test_session(test_config());
    log_in(&mut session, &transport);

    // kill the session with a fatal receive error
    transport.fail_next_recv();
    session.step();
    assert_eq!(session.state(), SessionState::Start);

    // a new client can log in on the recycled socket
    session.step();
    assert_eq!(session.state(), SessionState::Connected(LoginPhase::Welcome));
    transport.connect_peer();
    for _ in 0..3 {
        session.step();
    }
    transport.push_datagram(b"guest\r");
    session.step();
    session.step();
    session.step();
    transport.push_datagram(b"wicket\r");
    session.step();
    session.step();
    session.step();
    assert_eq!(session.state(), SessionState::LoggedIn);
    assert_eq!(transport.opens(), 2);
}

#[test]
fn disable_tears_down_an_active_session() {
    let (mut session, transport, _delay) = test_session(test_config());
    log_in(&mut session, &transport);
    assert!(session.rx_any());

    session.disable();
    assert_eq!(session.state(), SessionState::Disabled);
    assert!(!session.is_enabled());
    assert!(!session.is_active());
    assert!(!session.rx_any());
    assert_eq!(transport.closes(), 1);

    // steps stay parked until re-enabled
    for _ in 0..5 {
        session.step();
        assert_eq!(session.state(), SessionState::Disabled);
    }
    session.enable();
    session.step();
    assert_eq!(session.state(), SessionState::Start);
}

#[test]
fn bind_failures_are_retried_from_start() {
    let (mut session, transport, _delay) = test_session(test_config());
    transport.fail_next_open();
    session.enable();

    session.step();
    session.step();
    assert_eq!(session.state(), SessionState::Start);
    assert_eq!(transport.opens(), 0);

    session.step();
    assert_eq!(session.state(), SessionState::Connected(LoginPhase::Welcome));
    assert_eq!(transport.opens(), 1);
}
