//! Tests for concurrent transitions of the same content.

use pressroom::{
    db::types::WorkflowState::{self, *},
    store::{Applied, Store},
    workflow::ErrorKind,
};
use std::{
    sync::{Arc, Barrier, mpsc},
    thread,
    time::Duration,
};

mod common;

use self::common::*;

#[test]
fn conflicting_transitions_commit_once() {
    const THREADS: usize = 8;

    let fx = Fixture::new();
    let item = fx.draft(&fx.moderated, None);
    fx.request(&item, AUTHOR, author(), InReview).unwrap();

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles = (0..THREADS)
        .map(|inx| {
            let engine = fx.engine.clone();
            let barrier = barrier.clone();
            let target = if inx % 2 == 0 { Draft } else { ReadyToPublish };
            let id = item.id;

            thread::spawn(move || {
                barrier.wait();
                let result = engine.request_transition(pressroom::workflow::TransitionRequest {
                    content: id,
                    actor: EDITOR,
                    capabilities: editor(),
                    target,
                    reason: None,
                });
                (target, result.map(|done| done.record.is_some()))
            })
        })
        .collect::<Vec<_>>();

    let results = handles.into_iter()
        .map(|handle| handle.join().unwrap())
        .collect::<Vec<_>>();

    let state = fx.state(&item);
    let committed = results.iter()
        .filter(|(_, result)| result.as_ref().map_or(false, |&recorded| recorded))
        .collect::<Vec<_>>();

    assert_eq!(committed.len(), 1);
    assert_eq!(committed[0].0, state);

    // Exactly one record past the submission.
    assert_eq!(fx.engine.history(item.id).unwrap().len(), 2);

    for (target, result) in &results {
        match result {
            Ok(_) => assert_eq!(*target, state),
            Err(err) => assert_eq!(err.kind(), ErrorKind::InvalidTransition),
        }
    }
}

#[test]
fn lock_timeout_reports_contention() {
    let fx = Fixture::with_lock_timeout(Duration::from_millis(50));
    let item = fx.draft(&fx.moderated, None);

    let (locked_tx, locked_rx) = mpsc::channel();
    let store = fx.store.clone();
    let id = item.id;

    let holder = thread::spawn(move || {
        store.transition(id, Duration::from_secs(1), &mut |_| {
            locked_tx.send(()).unwrap();
            thread::sleep(Duration::from_millis(500));
            Ok(None)
        }).map(|applied| match applied {
            Applied::Unchanged(_) => true,
            _ => false,
        })
    });

    locked_rx.recv().unwrap();

    let err = fx.request(&item, AUTHOR, author(), InReview).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Contended);
    assert_eq!(err.to_string(), "El contenido está siendo modificado. Inténtalo de nuevo.");

    assert!(holder.join().unwrap().unwrap());

    // Nothing was changed, so the request can simply be retried.
    assert_eq!(fx.state(&item), WorkflowState::Draft);
    assert_eq!(fx.request(&item, AUTHOR, author(), InReview).unwrap().state, InReview);
}

#[test]
fn different_items_do_not_contend() {
    let fx = Fixture::with_lock_timeout(Duration::from_millis(50));
    let first = fx.draft(&fx.moderated, None);
    let second = fx.draft(&fx.moderated, None);

    let (locked_tx, locked_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let store = fx.store.clone();
    let id = first.id;

    let holder = thread::spawn(move || {
        store.transition(id, Duration::from_secs(1), &mut |_| {
            locked_tx.send(()).unwrap();
            release_rx.recv().unwrap();
            Ok(None)
        }).is_ok()
    });

    locked_rx.recv().unwrap();
    assert_eq!(fx.request(&second, AUTHOR, author(), InReview).unwrap().state, InReview);
    release_tx.send(()).unwrap();

    assert!(holder.join().unwrap());
}

#[test]
fn stuck_transition_does_not_wedge_sweep() {
    let fx = Fixture::with_lock_timeout(Duration::from_millis(50));
    let stuck = fx.publish(&fx.draft(&fx.moderated, Some(epoch() + chrono::Duration::hours(1))));
    let free = fx.publish(&fx.draft(&fx.moderated, Some(epoch() + chrono::Duration::hours(1))));
    let now = epoch() + chrono::Duration::hours(2);

    let (locked_tx, locked_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let store = fx.store.clone();
    let id = stuck.id;

    let holder = thread::spawn(move || {
        store.transition(id, Duration::from_secs(1), &mut |_| {
            locked_tx.send(()).unwrap();
            release_rx.recv().unwrap();
            Ok(None)
        }).is_ok()
    });

    locked_rx.recv().unwrap();

    // Reads see the committed item while its transition lock is held.
    assert_eq!(fx.engine.list(Some(Published)).unwrap().len(), 2);
    assert_eq!(fx.state(&stuck), Published);

    // The locked item is skipped, the other one still expires.
    assert_eq!(fx.engine.sweep_expired(now).unwrap(), 1);
    assert_eq!(fx.state(&free), Inactive);
    assert_eq!(fx.state(&stuck), Published);

    release_tx.send(()).unwrap();
    assert!(holder.join().unwrap());

    assert_eq!(fx.engine.sweep_expired(now).unwrap(), 1);
    assert_eq!(fx.state(&stuck), Inactive);
}
