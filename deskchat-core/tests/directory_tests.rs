// ABOUTME: Tests for the admin conversation directory
// ABOUTME: Covers push ordering, unread bookkeeping and snapshot replacement

mod common;

use common::{conversation, message};
use deskchat_core::directory::ConversationDirectory;

#[test]
fn test_pushed_conversation_is_prepended_once() {
    let mut directory = ConversationDirectory::new();
    directory.replace_all(vec![conversation("c1", 0), conversation("c2", 0)]);

    assert!(directory.upsert_from_push(conversation("c3", 0)));
    assert!(!directory.upsert_from_push(conversation("c3", 7)));

    let ids: Vec<_> = directory.conversations().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c3", "c1", "c2"]);
    // First-seen entry wins
    assert_eq!(directory.get("c3").unwrap().unread_count, 0);
}

#[test]
fn test_push_for_known_conversation_keeps_rest_entry() {
    let mut directory = ConversationDirectory::new();
    directory.replace_all(vec![conversation("c1", 4)]);

    assert!(!directory.upsert_from_push(conversation("c1", 0)));
    assert_eq!(directory.len(), 1);
    assert_eq!(directory.get("c1").unwrap().unread_count, 4);
}

#[test]
fn test_customer_message_to_unselected_conversation_counts_unread() {
    let mut directory = ConversationDirectory::new();
    directory.replace_all(vec![conversation("c1", 0)]);

    let msg = message("m1", "c1", "user42", "hello?");
    assert!(directory.apply_message(&msg, None, "admin"));

    let entry = directory.get("c1").unwrap();
    assert_eq!(entry.unread_count, 1);
    assert_eq!(entry.last_message.as_deref(), Some("hello?"));
    assert_eq!(entry.last_message_time, Some(msg.created_at));
}

#[test]
fn test_selected_conversation_does_not_count_unread() {
    let mut directory = ConversationDirectory::new();
    directory.replace_all(vec![conversation("c1", 0)]);

    directory.apply_message(&message("m1", "c1", "user42", "hi"), Some("c1"), "admin");

    let entry = directory.get("c1").unwrap();
    assert_eq!(entry.unread_count, 0);
    assert_eq!(entry.last_message.as_deref(), Some("hi"));
}

#[test]
fn test_admin_echo_does_not_count_unread() {
    let mut directory = ConversationDirectory::new();
    directory.replace_all(vec![conversation("c1", 2)]);

    directory.apply_message(&message("m1", "c1", "admin", "on it"), Some("c9"), "admin");

    let entry = directory.get("c1").unwrap();
    assert_eq!(entry.unread_count, 2);
    assert_eq!(entry.last_message.as_deref(), Some("on it"));
}

#[test]
fn test_message_for_unknown_conversation_is_ignored() {
    let mut directory = ConversationDirectory::new();
    directory.replace_all(vec![conversation("c1", 0)]);

    assert!(!directory.apply_message(&message("m1", "c9", "user42", "hi"), None, "admin"));
    assert_eq!(directory.len(), 1);
    assert_eq!(directory.total_unread(), 0);
}

#[test]
fn test_mark_read_and_total_unread() {
    let mut directory = ConversationDirectory::new();
    directory.replace_all(vec![conversation("c1", 3), conversation("c2", 2)]);
    assert_eq!(directory.total_unread(), 5);

    directory.mark_read("c1");
    directory.mark_read("missing");

    assert_eq!(directory.get("c1").unwrap().unread_count, 0);
    assert_eq!(directory.total_unread(), 2);
}

#[test]
fn test_replace_all_discards_pushed_entries() {
    let mut directory = ConversationDirectory::new();
    directory.upsert_from_push(conversation("pushed", 0));

    directory.replace_all(vec![conversation("c1", 1)]);

    assert!(!directory.contains("pushed"));
    assert!(directory.contains("c1"));
}
