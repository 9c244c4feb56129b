//! End-to-end watch-loop scenarios, driven through `Watcher::tick` with
//! in-memory collaborators: a scripted status source and a recording sink.
//! No network, no sleeps.

use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

use vigil::api::validate::ApiContract;
use vigil::api::{FetchError, StatusSource};
use vigil::notify::{MessageSink, NotifyError};
use vigil::watcher::Watcher;

/// Hands out queued responses in order and records the `from_date` of every
/// fetch.
struct ScriptedSource {
    responses: RefCell<Vec<Result<serde_json::Value, FetchError>>>,
    calls: Rc<RefCell<Vec<i64>>>,
}

impl ScriptedSource {
    fn new(responses: Vec<Result<serde_json::Value, FetchError>>) -> (Self, Rc<RefCell<Vec<i64>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut responses = responses;
        responses.reverse();
        (
            Self {
                responses: RefCell::new(responses),
                calls: Rc::clone(&calls),
            },
            calls,
        )
    }
}

impl StatusSource for ScriptedSource {
    fn fetch(&self, from_date: i64) -> Result<serde_json::Value, FetchError> {
        self.calls.borrow_mut().push(from_date);
        self.responses
            .borrow_mut()
            .pop()
            .expect("scripted source ran out of responses")
    }
}

/// Records every delivery attempt; can be told to fail them all.
struct RecordingSink {
    sent: Rc<RefCell<Vec<String>>>,
    fail_all: bool,
}

impl RecordingSink {
    fn new() -> (Self, Rc<RefCell<Vec<String>>>) {
        let sent = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                sent: Rc::clone(&sent),
                fail_all: false,
            },
            sent,
        )
    }

    fn failing() -> (Self, Rc<RefCell<Vec<String>>>) {
        let (mut sink, sent) = Self::new();
        sink.fail_all = true;
        (sink, sent)
    }
}

impl MessageSink for RecordingSink {
    fn send(&self, text: &str) -> Result<(), NotifyError> {
        self.sent.borrow_mut().push(text.to_string());
        if self.fail_all {
            return Err(NotifyError::Rejected("chat not found".to_string()));
        }
        Ok(())
    }
}

#[test]
fn test_status_change_is_notified_and_cursor_advances() {
    let (source, _) = ScriptedSource::new(vec![Ok(json!({
        "homeworks": [{ "homework_name": "hw1", "status": "approved" }],
        "current_date": 1000
    }))]);
    let (sink, sent) = RecordingSink::new();
    let mut watcher = Watcher::new(source, sink, ApiContract::V2, 0);

    watcher.tick();

    assert_eq!(
        *sent.borrow(),
        vec![
            "Изменился статус проверки работы \"hw1\". \
             Работа проверена: ревьюеру всё понравилось. Ура!"
                .to_string()
        ]
    );
    assert_eq!(watcher.state().cursor, 1000);
}

#[test]
fn test_empty_window_sends_nothing_but_advances_cursor() {
    let (source, _) = ScriptedSource::new(vec![Ok(json!({
        "homeworks": [],
        "current_date": 1050
    }))]);
    let (sink, sent) = RecordingSink::new();
    let mut watcher = Watcher::new(source, sink, ApiContract::V2, 0);

    watcher.tick();

    assert!(sent.borrow().is_empty());
    assert_eq!(watcher.state().cursor, 1050);
}

#[test]
fn test_http_failure_is_reported_once_and_cursor_unchanged() {
    let (source, _) = ScriptedSource::new(vec![
        Err(FetchError::UnexpectedStatus(500)),
        Err(FetchError::UnexpectedStatus(500)),
    ]);
    let (sink, sent) = RecordingSink::new();
    let mut watcher = Watcher::new(source, sink, ApiContract::V2, 900);

    watcher.tick();
    watcher.tick();

    let sent = sent.borrow();
    assert_eq!(sent.len(), 1, "identical failure must be deduplicated");
    assert!(sent[0].contains("500"), "unexpected report: {}", sent[0]);
    assert_eq!(watcher.state().cursor, 900);
}

#[test]
fn test_malformed_response_is_reported_once() {
    // Valid JSON, but a list instead of a mapping.
    let (source, _) = ScriptedSource::new(vec![Ok(json!([])), Ok(json!([]))]);
    let (sink, sent) = RecordingSink::new();
    let mut watcher = Watcher::new(source, sink, ApiContract::V2, 0);

    watcher.tick();
    watcher.tick();

    let sent = sent.borrow();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("Сбой в работе программы: "));
}

#[test]
fn test_new_message_after_duplicate_is_delivered_again() {
    let reviewing = json!({
        "homeworks": [{ "homework_name": "hw1", "status": "reviewing" }],
        "current_date": 1000
    });
    let approved = json!({
        "homeworks": [{ "homework_name": "hw1", "status": "approved" }],
        "current_date": 1100
    });
    let (source, _) = ScriptedSource::new(vec![
        Ok(reviewing.clone()),
        Ok(reviewing),
        Ok(approved),
    ]);
    let (sink, sent) = RecordingSink::new();
    let mut watcher = Watcher::new(source, sink, ApiContract::V2, 0);

    watcher.tick();
    watcher.tick();
    watcher.tick();

    let sent = sent.borrow();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].contains("Работа взята на проверку ревьюером."));
    assert!(sent[1].contains("ревьюеру всё понравилось"));
    assert_eq!(watcher.state().cursor, 1100);
}

#[test]
fn test_recovery_after_failure_is_notified() {
    let (source, _) = ScriptedSource::new(vec![
        Err(FetchError::UnexpectedStatus(502)),
        Ok(json!({
            "homeworks": [{ "homework_name": "hw1", "status": "rejected" }],
            "current_date": 2000
        })),
    ]);
    let (sink, sent) = RecordingSink::new();
    let mut watcher = Watcher::new(source, sink, ApiContract::V2, 0);

    watcher.tick();
    watcher.tick();

    let sent = sent.borrow();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].contains("502"));
    assert!(sent[1].contains("у ревьюера есть замечания"));
}

#[test]
fn test_next_fetch_uses_the_advanced_cursor() {
    let (source, calls) = ScriptedSource::new(vec![
        Ok(json!({ "homeworks": [], "current_date": 1000 })),
        Ok(json!({ "homeworks": [], "current_date": 1100 })),
    ]);
    let (sink, _) = RecordingSink::new();
    let mut watcher = Watcher::new(source, sink, ApiContract::V2, 400);

    watcher.tick();
    watcher.tick();

    assert_eq!(*calls.borrow(), vec![400, 1000]);
}

#[test]
fn test_legacy_contract_keeps_querying_from_the_initial_cursor() {
    let (source, calls) = ScriptedSource::new(vec![
        Ok(json!({ "homeworks": [] })),
        Ok(json!({ "homeworks": [] })),
    ]);
    let (sink, _) = RecordingSink::new();
    let mut watcher = Watcher::new(source, sink, ApiContract::V1, 400);

    watcher.tick();
    watcher.tick();

    assert_eq!(*calls.borrow(), vec![400, 400]);
    assert_eq!(watcher.state().cursor, 400);
}

#[test]
fn test_delivery_failure_does_not_stop_the_loop_or_corrupt_dedup() {
    let reviewing = json!({
        "homeworks": [{ "homework_name": "hw1", "status": "reviewing" }],
        "current_date": 1000
    });
    let (source, _) = ScriptedSource::new(vec![Ok(reviewing.clone()), Ok(reviewing)]);
    let (sink, sent) = RecordingSink::failing();
    let mut watcher = Watcher::new(source, sink, ApiContract::V2, 0);

    watcher.tick();
    watcher.tick();

    // The attempt was made once; the failed delivery still updates the
    // last-message state, so the duplicate is not retried.
    assert_eq!(sent.borrow().len(), 1);
    assert_eq!(watcher.state().cursor, 1000);
}

#[test]
fn test_unknown_status_is_reported_and_cursor_stays() {
    let (source, _) = ScriptedSource::new(vec![Ok(json!({
        "homeworks": [{ "homework_name": "hw1", "status": "resubmitted" }],
        "current_date": 3000
    }))]);
    let (sink, sent) = RecordingSink::new();
    let mut watcher = Watcher::new(source, sink, ApiContract::V2, 250);

    watcher.tick();

    let sent = sent.borrow();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("resubmitted"));
    // Translation failed before the cursor-advance step.
    assert_eq!(watcher.state().cursor, 250);
}
