use chrono::{NaiveDateTime, Utc};
use log::{debug, info, warn};
use std::{sync::Arc, time::Duration};

use crate::{
    audit::{Actor, TransitionRecord},
    db::types::WorkflowState,
    events::{Notifier, StateChanged},
    models::{Category, ContentItem, NewCategory, NewContent},
    permissions::Capabilities,
    store::{Applied, Change, Decide, Snapshot, Store, StoreError},
};
use super::{
    Denial,
    TransitionError,
    TransitionRequest,
    Transitioned,
    graph,
    rules::{self, Context},
};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock, in UTC.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// The only component allowed to change content's workflow state.
pub struct TransitionEngine {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    lock_timeout: Duration,
}

impl TransitionEngine {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>, lock_timeout: Duration)
    -> TransitionEngine {
        TransitionEngine {
            store,
            notifier,
            clock: Arc::new(SystemClock),
            lock_timeout,
        }
    }

    /// Use a different source of time.
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> TransitionEngine {
        TransitionEngine { clock, ..self }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Move a content item to another state on behalf of a user.
    ///
    /// Requesting the state content is already in succeeds without recording
    /// anything. [`Capabilities::SYSTEM`] is never honoured here; it is
    /// reserved for [`TransitionEngine::sweep_expired()`].
    pub fn request_transition(&self, request: TransitionRequest)
    -> Result<Transitioned, TransitionError> {
        let TransitionRequest { content, actor, capabilities, target, reason } = request;
        let actor = Actor::User(actor);
        let capabilities = capabilities & Capabilities::grantable();
        let clock = &self.clock;

        self.run(content, &mut |snapshot| decide(
            snapshot, actor, capabilities, target, reason.clone(), clock.now()))
    }

    /// Move every published content whose expiration date is before `now`
    /// to [`WorkflowState::Inactive`].
    ///
    /// Returns number of items actually moved. Failures of individual items
    /// are logged and skipped.
    ///
    /// `now` only decides what is expired. Records are stamped no earlier
    /// than the clock's time read under the item's lock, so that they never
    /// sort before a transition committed while the sweep was running.
    pub fn sweep_expired(&self, now: NaiveDateTime) -> Result<usize, StoreError> {
        let expired = self.store.expired(now)?;
        let clock = &self.clock;
        let mut count = 0;

        for id in expired {
            let result = self.run(id, &mut |snapshot| {
                // Content could have changed since it was found.
                let item = &snapshot.item;
                let still_expired = item.state == WorkflowState::Published
                    && item.expires_at.map_or(false, |expires| expires < now);

                if !still_expired {
                    return Ok(None);
                }

                decide(snapshot, Actor::System, Capabilities::SYSTEM,
                    WorkflowState::Inactive, None, now.max(clock.now()))
            });

            match result {
                Ok(Transitioned { record: Some(_), .. }) => count += 1,
                Ok(_) => debug!("Content {} no longer needs expiring", id),
                Err(err) => warn!("Could not expire content {}: {}", id, err),
            }
        }

        if count > 0 {
            info!("Expired {} content items", count);
        }

        Ok(count)
    }

    /// List states a user could move a content item to.
    pub fn available_transitions(
        &self,
        content: i32,
        actor: i32,
        capabilities: Capabilities,
    ) -> Result<Vec<WorkflowState>, TransitionError> {
        let Snapshot { item, category } = self.store.content(content)?;
        let now = self.clock.now();
        let capabilities = capabilities & Capabilities::grantable();

        Ok(graph::targets(item.state)
            .filter(|&to| rules::evaluate(&Context {
                item: &item,
                category: &category,
                actor: Actor::User(actor),
                capabilities,
                from: item.state,
                to,
                now,
            }).is_ok())
            .collect())
    }

    /// Get transition history of a content item, newest first.
    pub fn history(&self, content: i32)
    -> Result<Vec<TransitionRecord>, TransitionError> {
        self.store.history(content).map_err(Into::into)
    }

    pub fn content(&self, content: i32) -> Result<ContentItem, TransitionError> {
        Ok(self.store.content(content)?.item)
    }

    pub fn list(&self, state: Option<WorkflowState>)
    -> Result<Vec<ContentItem>, StoreError> {
        self.store.list_content(state)
    }

    /// Create a new content item.
    ///
    /// If `submit` is set the item is immediately sent for review on behalf
    /// of its author.
    pub fn create_content(&self, new: NewContent, submit: bool)
    -> Result<ContentItem, TransitionError> {
        let item = self.store.create_content(&new, self.clock.now())?;
        info!("Created content {} by {}", item.id, item.author);

        if !submit {
            return Ok(item);
        }

        self.request_transition(TransitionRequest {
            content: item.id,
            actor: item.author,
            capabilities: Capabilities::CREATE_CONTENT,
            target: WorkflowState::InReview,
            reason: None,
        })?;

        self.content(item.id)
    }

    pub fn create_category(&self, new: &NewCategory) -> Result<Category, StoreError> {
        self.store.create_category(new)
    }

    pub fn categories(&self) -> Result<Vec<Category>, StoreError> {
        self.store.categories()
    }

    fn run(&self, content: i32, decide: &mut Decide)
    -> Result<Transitioned, TransitionError> {
        match self.store.transition(content, self.lock_timeout, decide)? {
            Applied::Unchanged(snapshot) => Ok(Transitioned {
                content,
                state: snapshot.item.state,
                record: None,
            }),
            Applied::Denied(snapshot, denial) => {
                debug!("Refused to move content {} from {}: {:?}",
                    content, snapshot.item.state, denial);
                Err(denial.into())
            }
            Applied::Committed { before, item, record } => {
                info!("Content {} moved from {} to {} by {:?}",
                    content, record.from, record.to, record.actor);

                self.notifier.state_changed(StateChanged {
                    content,
                    from: record.from,
                    to: record.to,
                    author: before.item.author,
                    actor: record.actor,
                    timestamp: record.timestamp,
                });

                Ok(Transitioned {
                    content,
                    state: item.state,
                    record: Some(record),
                })
            }
        }
    }
}

/// Decide what to do with a content item, given its current state.
fn decide(
    snapshot: &Snapshot,
    actor: Actor,
    capabilities: Capabilities,
    to: WorkflowState,
    reason: Option<String>,
    now: NaiveDateTime,
) -> Result<Option<Change>, Denial> {
    let from = snapshot.item.state;

    if from == to {
        return Ok(None);
    }

    rules::evaluate(&Context {
        item: &snapshot.item,
        category: &snapshot.category,
        actor,
        capabilities,
        from,
        to,
        now,
    })?;

    Ok(Some(Change {
        to,
        published_at: if to == WorkflowState::Published { Some(now) } else { None },
        actor,
        timestamp: now,
        reason,
    }))
}
