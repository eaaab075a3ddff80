//! Events emitted by the workflow.
//!
//! The engine only announces what happened; delivering notifications to
//! people is the job of whoever listens.

use actix::{Message, SystemService};
use chrono::NaiveDateTime;
use log::{error, info};
use serde::Serialize;

use crate::{audit::Actor, db::types::WorkflowState};

mod service;

pub use self::service::{EventManager, RegisterListener, UnregisterListener};

/// A content item changed its state.
///
/// Emitted exactly once for every committed transition, after the change
/// was committed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct StateChanged {
    pub content: i32,
    pub from: WorkflowState,
    pub to: WorkflowState,
    /// Author of the content.
    pub author: i32,
    pub actor: Actor,
    pub timestamp: NaiveDateTime,
}

impl Message for StateChanged {
    type Result = ();
}

/// Recipient of workflow events.
///
/// Implementations must not block; they are called on the thread which
/// performed the transition.
pub trait Notifier: Send + Sync {
    fn state_changed(&self, event: StateChanged);
}

/// Notifier forwarding events to the [`EventManager`] service.
///
/// This requires a running actix system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ActorNotifier;

impl Notifier for ActorNotifier {
    fn state_changed(&self, event: StateChanged) {
        if let Err(err) = EventManager::from_registry().try_send(event) {
            error!("Could not dispatch state change notification: {}", err);
        }
    }
}

/// Notifier which only logs events.
///
/// Used by command line tools, which run without an actix system.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn state_changed(&self, event: StateChanged) {
        info!("Content {} changed state from {} to {}",
            event.content, event.from, event.to);
    }
}
