// ABOUTME: Tests for the customer chat session state machine
// ABOUTME: Open sequence ordering, failure fallbacks, routing and close

mod common;

use common::message;
use deskchat_core::events::{ClientEvent, OutgoingMessage, ServerEvent, TransportEvent};
use deskchat_core::model::{Conversation, CreateConversation};
use deskchat_core::session::{CustomerSession, SessionEffect, SessionEvent, SessionPhase};

fn transport(event: TransportEvent) -> SessionEvent {
    SessionEvent::Transport(event)
}

fn live_session() -> CustomerSession {
    let mut session = CustomerSession::open("65f0c2a9", "user42", "admin");
    session.handle(transport(TransportEvent::Connected));
    session.handle(SessionEvent::ConversationReady {
        generation: 1,
        conversation: Conversation::new("order_65f0c2a9"),
    });
    session.handle(SessionEvent::HistoryLoaded {
        generation: 1,
        messages: vec![],
    });
    assert_eq!(session.phase(), SessionPhase::Live);
    session
}

#[test]
fn test_open_sequence_is_create_then_history_then_join() {
    let mut session = CustomerSession::open("65f0c2a9", "user42", "admin");
    assert_eq!(session.conversation_id(), "order_65f0c2a9");
    assert_eq!(session.phase(), SessionPhase::Connecting);

    let effects = session.handle(transport(TransportEvent::Connected));
    assert_eq!(
        effects,
        vec![SessionEffect::EnsureConversation {
            request: CreateConversation {
                conversation_id: "order_65f0c2a9".to_string(),
                user_id: Some("user42".to_string()),
                admin_id: Some("admin".to_string()),
            },
            generation: 1,
        }]
    );
    assert_eq!(session.phase(), SessionPhase::EnsuringConversation);

    let effects = session.handle(SessionEvent::ConversationReady {
        generation: 1,
        conversation: Conversation::new("order_65f0c2a9"),
    });
    assert_eq!(
        effects,
        vec![SessionEffect::FetchHistory {
            conversation_id: "order_65f0c2a9".to_string(),
            generation: 1,
        }]
    );
    assert_eq!(session.phase(), SessionPhase::LoadingHistory);

    let effects = session.handle(SessionEvent::HistoryLoaded {
        generation: 1,
        messages: vec![
            message("m1", "order_65f0c2a9", "user42", "where is my key?"),
            message("m1", "order_65f0c2a9", "user42", "where is my key?"),
        ],
    });
    assert_eq!(
        effects,
        vec![SessionEffect::Emit(ClientEvent::JoinConversation(
            "order_65f0c2a9".to_string()
        ))]
    );
    assert_eq!(session.phase(), SessionPhase::Live);
    assert_eq!(session.messages().len(), 1);
}

#[test]
fn test_create_failure_still_loads_history() {
    let mut session = CustomerSession::open("o1", "user42", "admin");
    session.handle(transport(TransportEvent::Connected));

    let effects = session.handle(SessionEvent::ConversationFailed {
        generation: 1,
        error: "503".to_string(),
    });

    assert!(matches!(effects.as_slice(), [SessionEffect::FetchHistory { .. }]));
}

#[test]
fn test_history_failure_still_joins() {
    let mut session = CustomerSession::open("o1", "user42", "admin");
    session.handle(transport(TransportEvent::Connected));
    session.handle(SessionEvent::ConversationReady {
        generation: 1,
        conversation: Conversation::new("order_o1"),
    });

    let effects = session.handle(SessionEvent::HistoryFailed {
        generation: 1,
        error: "timeout".to_string(),
    });

    assert_eq!(
        effects,
        vec![SessionEffect::Emit(ClientEvent::JoinConversation("order_o1".to_string()))]
    );
    assert_eq!(session.phase(), SessionPhase::Live);
    assert!(session.messages().is_empty());
}

#[test]
fn test_messages_for_other_conversations_are_ignored() {
    let mut session = live_session();

    session.handle(transport(TransportEvent::Server(ServerEvent::ReceiveMessage(
        message("m1", "order_other", "user9", "not mine"),
    ))));
    session.handle(transport(TransportEvent::Server(ServerEvent::ReceiveMessage(
        message("m2", "order_65f0c2a9", "admin", "hello from support"),
    ))));
    session.handle(transport(TransportEvent::Server(ServerEvent::ReceiveMessage(
        message("m2", "order_65f0c2a9", "admin", "hello from support"),
    ))));

    let ids: Vec<_> = session.messages().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["m2"]);
}

#[test]
fn test_send_uses_customer_identity() {
    let mut session = live_session();

    let effects = session.handle(SessionEvent::Send("hi".to_string()));

    assert_eq!(
        effects,
        vec![SessionEffect::Emit(ClientEvent::SendMessage(OutgoingMessage {
            conversation_id: "order_65f0c2a9".to_string(),
            sender_id: "user42".to_string(),
            text: "hi".to_string(),
            attachment_url: None,
        }))]
    );
    // No optimistic echo
    assert!(session.messages().is_empty());
}

#[test]
fn test_send_rejected_when_blank_or_offline() {
    let mut session = live_session();
    assert!(session.handle(SessionEvent::Send("  ".to_string())).is_empty());

    session.handle(transport(TransportEvent::Disconnected {
        reason: "transport closed".to_string(),
    }));
    assert_eq!(session.phase(), SessionPhase::Connecting);
    assert!(session.handle(SessionEvent::Send("hi".to_string())).is_empty());
}

#[test]
fn test_reconnect_reruns_open_sequence_and_ignores_old_results() {
    let mut session = live_session();
    session.handle(transport(TransportEvent::Disconnected {
        reason: "transport closed".to_string(),
    }));

    let effects = session.handle(transport(TransportEvent::Connected));
    assert!(matches!(
        effects.as_slice(),
        [SessionEffect::EnsureConversation { generation: 2, .. }]
    ));

    // Result from the first connect arrives late
    let effects = session.handle(SessionEvent::HistoryLoaded {
        generation: 1,
        messages: vec![message("m1", "order_65f0c2a9", "user42", "late")],
    });
    assert!(effects.is_empty());
    assert_eq!(session.phase(), SessionPhase::EnsuringConversation);
}

#[test]
fn test_close_clears_state_and_disconnects() {
    let mut session = live_session();
    session.handle(transport(TransportEvent::Server(ServerEvent::ReceiveMessage(
        message("m1", "order_65f0c2a9", "admin", "hello"),
    ))));
    session.handle(SessionEvent::Draft("typing".to_string()));

    let effects = session.handle(SessionEvent::Close);

    assert_eq!(effects, vec![SessionEffect::Disconnect]);
    assert_eq!(session.phase(), SessionPhase::Closed);
    assert!(session.messages().is_empty());
    assert_eq!(session.draft(), "");

    // Everything after close is inert
    assert!(session.handle(transport(TransportEvent::Connected)).is_empty());
    assert!(session.handle(SessionEvent::Send("hi".to_string())).is_empty());
    session.handle(transport(TransportEvent::Server(ServerEvent::ReceiveMessage(
        message("m2", "order_65f0c2a9", "admin", "late"),
    ))));
    assert!(session.messages().is_empty());
}

#[test]
fn test_submit_clears_draft_after_send() {
    let mut session = live_session();
    session.handle(SessionEvent::Draft("my key doesn't work".to_string()));

    let effects = session.handle(SessionEvent::Submit);

    assert_eq!(effects.len(), 1);
    assert_eq!(session.draft(), "");
}

#[test]
fn test_resync_reloads_history_without_rejoining() {
    let mut session = live_session();
    session.handle(transport(TransportEvent::Server(ServerEvent::ReceiveMessage(
        message("m1", "order_65f0c2a9", "admin", "hello"),
    ))));

    let effects = session.handle(SessionEvent::Resync);
    assert_eq!(
        effects,
        vec![SessionEffect::FetchHistory {
            conversation_id: "order_65f0c2a9".to_string(),
            generation: 2,
        }]
    );

    let effects = session.handle(SessionEvent::HistoryLoaded {
        generation: 2,
        messages: vec![
            message("m1", "order_65f0c2a9", "admin", "hello"),
            message("m2", "order_65f0c2a9", "admin", "are you there?"),
        ],
    });
    assert!(effects.is_empty());
    assert_eq!(session.phase(), SessionPhase::Live);
    assert_eq!(session.messages().len(), 2);
}

#[test]
fn test_resync_before_history_is_requested_does_nothing() {
    let mut session = CustomerSession::open("65f0c2a9", "user42", "admin");
    session.handle(transport(TransportEvent::Connected));

    assert!(session.handle(SessionEvent::Resync).is_empty());
    assert_eq!(session.phase(), SessionPhase::EnsuringConversation);
}
