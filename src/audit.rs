//! Permanent record of workflow transitions.
//!
//! Every committed transition appends exactly one [`TransitionRecord`] to
//! the log, in the same database transaction that changes the content's
//! state. Records are never updated or deleted. No-op transitions are never
//! recorded.

use chrono::NaiveDateTime;
use failure::Fail;
use serde::Serialize;
use std::cmp::Ordering;

use crate::db::{models as db, types::WorkflowState};

/// Entity responsible for an action.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Actor {
    /// System. This actor is used for actions carried automatically by the
    /// system, such as expiring content.
    System,
    /// A user.
    User(i32),
}

impl Actor {
    pub(crate) fn as_db(self) -> Option<i32> {
        match self {
            Actor::System => None,
            Actor::User(id) => Some(id),
        }
    }

    pub(crate) fn from_db(id: Option<i32>) -> Actor {
        id.map_or(Actor::System, Actor::User)
    }

    /// ID of the acting user, if this is a user.
    pub fn user(self) -> Option<i32> {
        self.as_db()
    }
}

impl From<i32> for Actor {
    fn from(id: i32) -> Self {
        Actor::User(id)
    }
}

/// A single entry in the audit log.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TransitionRecord {
    pub id: i64,
    pub content: i32,
    /// Who caused this transition, `null` for the system.
    pub actor: Actor,
    pub from: WorkflowState,
    pub to: WorkflowState,
    pub timestamp: NaiveDateTime,
    pub reason: Option<String>,
}

impl TransitionRecord {
    pub(crate) fn from_db(data: db::Transition) -> TransitionRecord {
        TransitionRecord {
            id: data.id,
            content: data.content,
            actor: Actor::from_db(data.actor),
            from: data.from_state,
            to: data.to_state,
            timestamp: data.timestamp,
            reason: data.reason,
        }
    }

    /// Ordering used for display: newest first. Records sharing a timestamp
    /// are ordered by their position in the log.
    pub fn newest_first(a: &TransitionRecord, b: &TransitionRecord) -> Ordering {
        b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id))
    }
}

/// Replay a content item's history and return the state it leads to.
///
/// Records may be given in any order; they are replayed oldest first,
/// starting from [`WorkflowState::Draft`]. Each record must begin in the
/// state the previous one ended in.
pub fn replay<'a, I>(records: I) -> Result<WorkflowState, BrokenHistory>
where
    I: IntoIterator<Item = &'a TransitionRecord>,
{
    let mut records = records.into_iter().collect::<Vec<_>>();
    records.sort_by(|a, b| TransitionRecord::newest_first(b, a));

    records.into_iter().try_fold(WorkflowState::Draft, |state, record| {
        if record.from == state && record.to != state {
            Ok(record.to)
        } else {
            Err(BrokenHistory { record: record.id, expected: state })
        }
    })
}

#[derive(Debug, Fail)]
#[fail(display = "transition {} does not start in state {}", record, expected)]
pub struct BrokenHistory {
    pub record: i64,
    pub expected: WorkflowState,
}
