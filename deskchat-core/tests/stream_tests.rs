// ABOUTME: Tests for per-conversation message streams
// ABOUTME: Arrival order, first-write-wins de-duplication and history bootstrap

mod common;

use common::message;
use deskchat_core::stream::MessageStream;

fn ids(stream: &MessageStream) -> Vec<&str> {
    stream.messages().iter().map(|m| m.id.as_str()).collect()
}

#[test]
fn test_bootstrap_drops_repeated_ids_keeping_first() {
    let mut stream = MessageStream::new("c1");

    let dropped = stream.bootstrap(vec![
        message("m1", "c1", "user42", "first"),
        message("m2", "c1", "admin", "reply"),
        message("m1", "c1", "user42", "first again"),
    ]);

    assert_eq!(dropped, 1);
    assert_eq!(ids(&stream), vec!["m1", "m2"]);
    assert_eq!(stream.messages()[0].text, "first");
}

#[test]
fn test_append_ignores_known_id() {
    let mut stream = MessageStream::new("c1");
    stream.bootstrap(vec![message("m1", "c1", "user42", "hi")]);

    assert!(!stream.append(message("m1", "c1", "user42", "edited")));
    assert!(stream.append(message("m2", "c1", "admin", "hello")));

    assert_eq!(ids(&stream), vec!["m1", "m2"]);
    assert_eq!(stream.messages()[0].text, "hi");
}

#[test]
fn test_arrival_order_is_kept_regardless_of_timestamps() {
    let mut stream = MessageStream::new("c1");
    let mut late = message("m1", "c1", "user42", "sent later");
    late.created_at = late.created_at + chrono::Duration::minutes(5);
    let early = message("m2", "c1", "user42", "sent earlier");

    stream.append(late);
    stream.append(early);

    assert_eq!(ids(&stream), vec!["m1", "m2"]);
}

#[test]
fn test_live_messages_survive_bootstrap() {
    let mut stream = MessageStream::new("c1");
    // Pushed while history was loading
    stream.append(message("m3", "c1", "user42", "live"));
    stream.append(message("m2", "c1", "user42", "also in history"));

    stream.bootstrap(vec![
        message("m1", "c1", "user42", "old"),
        message("m2", "c1", "user42", "also in history"),
    ]);

    assert_eq!(ids(&stream), vec!["m1", "m2", "m3"]);
    assert_eq!(stream.last().unwrap().text, "live");
}

#[test]
fn test_clear_forgets_ids() {
    let mut stream = MessageStream::new("c1");
    stream.append(message("m1", "c1", "user42", "hi"));
    stream.clear();

    assert!(stream.is_empty());
    assert!(!stream.contains("m1"));
    assert!(stream.append(message("m1", "c1", "user42", "hi")));
    assert_eq!(stream.len(), 1);
}
