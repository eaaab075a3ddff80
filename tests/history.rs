//! Tests for the audit log.

use chrono::Duration;
use pressroom::{
    audit::{self, Actor, TransitionRecord},
    db::types::WorkflowState::*,
    workflow::{ErrorKind, TransitionRequest},
};

mod common;

use self::common::*;

#[test]
fn history_is_newest_first() {
    let fx = Fixture::new();
    let item = fx.draft(&fx.moderated, None);

    fx.request(&item, AUTHOR, author(), InReview).unwrap();
    fx.clock.advance(Duration::minutes(5));
    fx.request(&item, EDITOR, editor(), Draft).unwrap();
    fx.clock.advance(Duration::minutes(5));
    fx.request(&item, AUTHOR, author(), InReview).unwrap();

    let history = fx.engine.history(item.id).unwrap();
    let steps = history.iter()
        .map(|r| (r.from, r.to, r.actor))
        .collect::<Vec<_>>();

    assert_eq!(steps, vec![
        (Draft, InReview, Actor::User(AUTHOR)),
        (InReview, Draft, Actor::User(EDITOR)),
        (Draft, InReview, Actor::User(AUTHOR)),
    ]);

    for pair in history.windows(2) {
        assert!(pair[0].timestamp > pair[1].timestamp);
    }
}

#[test]
fn same_timestamp_keeps_log_order() {
    let fx = Fixture::new();
    let item = fx.draft(&fx.unmoderated, None);

    fx.request(&item, AUTHOR, author(), Published).unwrap();
    fx.request(&item, AUTHOR, author(), Inactive).unwrap();

    let history = fx.engine.history(item.id).unwrap();
    assert_eq!(history[0].to, Inactive);
    assert_eq!(history[1].to, Published);
    assert!(history[0].id > history[1].id);
}

#[test]
fn rejections_and_noops_are_not_recorded() {
    let fx = Fixture::new();
    let item = fx.draft(&fx.moderated, None);

    fx.request(&item, AUTHOR, author(), Draft).unwrap();
    fx.request(&item, AUTHOR, author(), Published).unwrap_err();
    fx.request(&item, EDITOR, editor(), ReadyToPublish).unwrap_err();

    assert!(fx.engine.history(item.id).unwrap().is_empty());
}

#[test]
fn reasons_are_recorded() {
    let fx = Fixture::new();
    let item = fx.draft(&fx.moderated, None);
    fx.request(&item, AUTHOR, author(), InReview).unwrap();

    fx.engine.request_transition(TransitionRequest {
        content: item.id,
        actor: EDITOR,
        capabilities: editor(),
        target: Draft,
        reason: Some("Falta la fuente".into()),
    }).unwrap();

    let history = fx.engine.history(item.id).unwrap();
    assert_eq!(history[0].reason.as_ref().map(String::as_str), Some("Falta la fuente"));
    assert_eq!(history[1].reason, None);
}

#[test]
fn history_replays_to_current_state() {
    let fx = Fixture::new();
    let item = fx.publish(&fx.draft(&fx.moderated, None));
    fx.request(&item, MANAGER, manager(), Inactive).unwrap();

    let history: Vec<TransitionRecord> = fx.engine.history(item.id).unwrap();
    assert_eq!(audit::replay(&history).unwrap(), fx.state(&item));
}

#[test]
fn history_of_unknown_content() {
    let fx = Fixture::new();
    assert_eq!(fx.engine.history(17).unwrap_err().kind(), ErrorKind::NotFound);
}
