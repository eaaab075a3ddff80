//! Actix actor distributing workflow events to listeners.

use actix::{
    Actor,
    Context,
    Handler,
    Message,
    MessageResult,
    Recipient,
    Supervised,
    SystemService,
    prelude::SendError,
};
use log::debug;
use std::collections::HashMap;

use super::StateChanged;

/// Register a new listener for state changes.
///
/// Result of this message is an ID, which can later be used to unregister
/// the listener.
pub struct RegisterListener {
    /// Only deliver changes of content written by this author. If `None`
    /// all changes are delivered.
    pub author: Option<i32>,
    pub addr: Recipient<StateChanged>,
}

impl Message for RegisterListener {
    type Result = usize;
}

/// Unregister a listener.
pub struct UnregisterListener {
    pub id: usize,
}

impl Message for UnregisterListener {
    type Result = ();
}

struct Listener {
    author: Option<i32>,
    addr: Recipient<StateChanged>,
}

/// Actix actor forwarding state changes to listeners.
#[derive(Default)]
pub struct EventManager {
    listeners: HashMap<usize, Listener>,
    next_id: usize,
}

impl Actor for EventManager {
    type Context = Context<Self>;
}

impl Supervised for EventManager {
}

impl SystemService for EventManager {
}

impl Handler<StateChanged> for EventManager {
    type Result = ();

    fn handle(&mut self, msg: StateChanged, _: &mut Self::Context) {
        debug!("Delivering state change of content {} to {} listeners",
            msg.content, self.listeners.len());

        self.listeners.retain(|id, listener| {
            if listener.author.map_or(false, |author| author != msg.author) {
                return true;
            }

            match listener.addr.do_send(msg.clone()) {
                Err(SendError::Closed(_)) => {
                    debug!("Dropping closed listener {}", id);
                    false
                }
                _ => true,
            }
        });
    }
}

impl Handler<RegisterListener> for EventManager {
    type Result = MessageResult<RegisterListener>;

    fn handle(&mut self, msg: RegisterListener, _: &mut Self::Context)
    -> Self::Result {
        let RegisterListener { author, addr } = msg;
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.insert(id, Listener { author, addr });
        MessageResult(id)
    }
}

impl Handler<UnregisterListener> for EventManager {
    type Result = ();

    fn handle(&mut self, msg: UnregisterListener, _: &mut Self::Context) {
        self.listeners.remove(&msg.id);
    }
}
