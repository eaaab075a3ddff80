//! Periodic expiry of published content.

use actix::{Actor, Addr, Arbiter, AsyncContext, Context, Handler, Message};
use chrono::NaiveDateTime;
use log::error;
use std::{sync::Arc, time::Duration};

use crate::store::StoreError;
use super::TransitionEngine;

/// Expire content as of `now`.
///
/// The sweeper sends this to itself on every tick; it can also be sent
/// to force a sweep.
pub struct Sweep {
    pub now: NaiveDateTime,
}

impl Message for Sweep {
    type Result = Result<usize, StoreError>;
}

/// Actix actor expiring content on a fixed interval.
pub struct ExpirySweeper {
    engine: Arc<TransitionEngine>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(engine: Arc<TransitionEngine>, interval: Duration) -> ExpirySweeper {
        ExpirySweeper { engine, interval }
    }

    /// Start a sweeper in its own arbiter, as sweeps block on the database.
    pub fn start(engine: Arc<TransitionEngine>, interval: Duration)
    -> Addr<ExpirySweeper> {
        Arbiter::start(move |_| ExpirySweeper::new(engine, interval))
    }

    fn on_interval(&mut self, _: &mut Context<Self>) {
        let now = self.engine.now();

        if let Err(err) = self.engine.sweep_expired(now) {
            error!("Error expiring content: {}", err);
        }
    }
}

impl Actor for ExpirySweeper {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        ctx.run_interval(self.interval, Self::on_interval);
    }
}

impl Handler<Sweep> for ExpirySweeper {
    type Result = Result<usize, StoreError>;

    fn handle(&mut self, msg: Sweep, _: &mut Self::Context) -> Self::Result {
        self.engine.sweep_expired(msg.now)
    }
}
