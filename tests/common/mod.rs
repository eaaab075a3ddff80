//! Workflow fixture shared by integration tests.
//!
//! By default everything runs against an in-memory store, with time
//! controlled by the test and events captured instead of delivered. See
//! [`db`] for running the same fixture on PostgreSQL.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use pressroom::{
    db::types::WorkflowState,
    events::{Notifier, StateChanged},
    models::{Category, ContentItem, NewCategory, NewContent},
    permissions::Capabilities,
    store::{MemoryStore, Store},
    workflow::{Clock, TransitionEngine, TransitionError, TransitionRequest, Transitioned},
};
use std::sync::Arc;

pub mod db;

pub const AUTHOR: i32 = 1;
pub const EDITOR: i32 = 2;
pub const PUBLISHER: i32 = 3;
pub const MANAGER: i32 = 4;
pub const OTHER_AUTHOR: i32 = 5;

pub fn author() -> Capabilities {
    Capabilities::CREATE_CONTENT
}

pub fn editor() -> Capabilities {
    Capabilities::EDIT_CONTENT
}

pub fn publisher() -> Capabilities {
    Capabilities::PUBLISH_CONTENT
}

pub fn manager() -> Capabilities {
    Capabilities::EDIT_IS_ACTIVE
}

/// Moment at which every fixture starts.
pub fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2019, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap()
}

/// Clock which only moves when told to.
pub struct ManualClock(Mutex<NaiveDateTime>);

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.0.lock()
    }
}

/// Notifier remembering every event it was given.
#[derive(Default)]
pub struct RecordingNotifier(Mutex<Vec<StateChanged>>);

impl RecordingNotifier {
    pub fn events(&self) -> Vec<StateChanged> {
        self.0.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn state_changed(&self, event: StateChanged) {
        self.0.lock().push(event);
    }
}

pub struct Fixture<S = MemoryStore> {
    pub store: Arc<S>,
    pub engine: Arc<TransitionEngine>,
    pub clock: Arc<ManualClock>,
    pub events: Arc<RecordingNotifier>,
    pub moderated: Category,
    pub unmoderated: Category,
}

impl Fixture {
    pub fn new() -> Fixture {
        Fixture::with_lock_timeout(std::time::Duration::from_secs(2))
    }

    pub fn with_lock_timeout(timeout: std::time::Duration) -> Fixture {
        Fixture::with_store(Arc::new(MemoryStore::new()), timeout)
    }
}

impl<S: Store + 'static> Fixture<S> {
    /// Build a fixture over an empty store.
    pub fn with_store(store: Arc<S>, timeout: std::time::Duration) -> Fixture<S> {
        let clock = Arc::new(ManualClock(Mutex::new(epoch())));
        let events = Arc::new(RecordingNotifier::default());
        let engine = TransitionEngine::new(store.clone(), events.clone(), timeout)
            .with_clock(clock.clone());

        let moderated = engine.create_category(&NewCategory {
            name: "Noticias".into(),
            is_moderated: true,
        }).unwrap();
        let unmoderated = engine.create_category(&NewCategory {
            name: "Blog".into(),
            is_moderated: false,
        }).unwrap();

        Fixture {
            store,
            engine: Arc::new(engine),
            clock,
            events,
            moderated,
            unmoderated,
        }
    }

    /// Create a draft written by [`AUTHOR`].
    pub fn draft(&self, category: &Category, expires_at: Option<NaiveDateTime>)
    -> ContentItem {
        self.engine.create_content(NewContent {
            author: AUTHOR,
            category: category.id,
            title: "Nueva nota".into(),
            summary: String::new(),
            body: "<p>Contenido</p>".into(),
            expires_at,
        }, false).unwrap()
    }

    pub fn request(
        &self,
        content: &ContentItem,
        actor: i32,
        capabilities: Capabilities,
        target: WorkflowState,
    ) -> Result<Transitioned, TransitionError> {
        self.engine.request_transition(TransitionRequest {
            content: content.id,
            actor,
            capabilities,
            target,
            reason: None,
        })
    }

    /// Move content through the moderated path up to `published`.
    pub fn publish(&self, content: &ContentItem) -> ContentItem {
        self.request(content, AUTHOR, author(), WorkflowState::InReview).unwrap();
        self.request(content, EDITOR, editor(), WorkflowState::ReadyToPublish).unwrap();
        self.request(content, PUBLISHER, publisher(), WorkflowState::Published).unwrap();
        self.engine.content(content.id).unwrap()
    }

    pub fn state(&self, content: &ContentItem) -> WorkflowState {
        self.engine.content(content.id).unwrap().state
    }
}
