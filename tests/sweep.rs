//! Tests for expiring published content.

use chrono::Duration;
use pressroom::{
    audit::{self, Actor},
    db::types::WorkflowState::*,
};

mod common;

use self::common::*;

#[test]
fn sweep_expires_exactly_the_expired_items() {
    let fx = Fixture::new();
    let now = epoch() + Duration::days(10);

    let expired = fx.publish(&fx.draft(&fx.moderated, Some(now - Duration::seconds(1))));
    let at_now = fx.publish(&fx.draft(&fx.moderated, Some(now)));
    let later = fx.publish(&fx.draft(&fx.moderated, Some(now + Duration::days(1))));
    let forever = fx.publish(&fx.draft(&fx.moderated, None));
    let draft = fx.draft(&fx.moderated, Some(now - Duration::days(1)));

    assert_eq!(fx.engine.sweep_expired(now).unwrap(), 1);

    assert_eq!(fx.state(&expired), Inactive);
    assert_eq!(fx.state(&at_now), Published);
    assert_eq!(fx.state(&later), Published);
    assert_eq!(fx.state(&forever), Published);
    assert_eq!(fx.state(&draft), Draft);
}

#[test]
fn sweep_records_system_actor() {
    let fx = Fixture::new();
    let item = fx.publish(&fx.draft(&fx.moderated, Some(epoch() + Duration::hours(1))));
    let now = epoch() + Duration::hours(2);

    fx.engine.sweep_expired(now).unwrap();

    let history = fx.engine.history(item.id).unwrap();
    assert_eq!(history[0].actor, Actor::System);
    assert_eq!(history[0].from, Published);
    assert_eq!(history[0].to, Inactive);
    assert_eq!(history[0].timestamp, now);

    let event = fx.events.events().pop().unwrap();
    assert_eq!(event.actor, Actor::System);
    assert_eq!(event.author, AUTHOR);
}

#[test]
fn second_sweep_does_nothing() {
    let fx = Fixture::new();
    fx.publish(&fx.draft(&fx.moderated, Some(epoch() + Duration::hours(1))));
    let now = epoch() + Duration::hours(2);

    assert_eq!(fx.engine.sweep_expired(now).unwrap(), 1);
    assert_eq!(fx.engine.sweep_expired(now).unwrap(), 0);
}

#[test]
fn swept_content_cannot_be_republished() {
    let fx = Fixture::new();
    let item = fx.publish(&fx.draft(&fx.moderated, Some(epoch() + Duration::hours(1))));
    fx.clock.advance(Duration::hours(2));
    fx.engine.sweep_expired(fx.engine.now()).unwrap();

    let err = fx.request(&item, AUTHOR, author(), Published).unwrap_err();
    assert_eq!(err.kind(), pressroom::workflow::ErrorKind::ContentExpired);
}

#[test]
fn late_sweep_is_recorded_after_newer_transitions() {
    let fx = Fixture::new();
    let sweep_started = epoch();
    let item = fx.draft(&fx.moderated, Some(sweep_started - Duration::hours(1)));

    // Already expired, but publication from ready_to_publish has no expiry
    // gate, so it commits after the sweep's `now`.
    fx.clock.advance(Duration::minutes(30));
    fx.publish(&item);

    assert_eq!(fx.engine.sweep_expired(sweep_started).unwrap(), 1);

    let history = fx.engine.history(item.id).unwrap();
    assert_eq!(history[0].actor, Actor::System);
    assert_eq!(history[0].to, Inactive);
    assert_eq!(history[0].timestamp, epoch() + Duration::minutes(30));
    assert_eq!(history[1].to, Published);
    assert_eq!(audit::replay(&history).unwrap(), Inactive);
}
