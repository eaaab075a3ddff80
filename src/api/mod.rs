use actix::System;
use actix_web::{
    App,
    middleware::Logger,
    server,
};
use sentry_actix::SentryMiddleware;
use std::sync::Arc;

use super::{
    Result,
    config::Config,
    db,
    events::ActorNotifier,
    store::PgStore,
    workflow::{ExpirySweeper, TransitionEngine},
};

pub use self::error::{ApiError, Error};

pub(self) use self::error::RouteExt;

pub mod categories;
pub mod content;
pub mod error;

/// Start an API server.
pub fn start(cfg: &Config) -> Result<()> {
    let system = System::new("pressroom");
    let state = configure(cfg.clone())?;

    ExpirySweeper::start(state.engine.clone(), cfg.workflow.sweep_interval());

    let server = server::new({
        let state = state.clone();
        move || new_app(state.clone())
    });

    let server = if let Some(fd) = listenfd::ListenFd::from_env().take_tcp_listener(0)? {
        server.listen(fd)
    } else {
        server.bind(cfg.server.address)?
    };

    server
        .server_hostname(cfg.server.domain.clone())
        .start();

    system.run();

    Ok(())
}

#[derive(Clone)]
pub struct State {
    /// Current configuration.
    pub config: Config,
    /// The workflow.
    pub engine: Arc<TransitionEngine>,
}

pub fn configure(cfg: Config) -> Result<State> {
    let pool = db::pool(&cfg)?;
    let engine = TransitionEngine::new(
        Arc::new(PgStore::new(pool)),
        Arc::new(ActorNotifier),
        cfg.workflow.lock_timeout(),
    );

    Ok(State {
        config: cfg,
        engine: Arc::new(engine),
    })
}

pub fn new_app(state: State) -> App<State> {
    App::with_state(state)
        .middleware(SentryMiddleware::new())
        .middleware(Logger::default())
        .prefix("/api/v1")
        .configure(categories::routes)
        .configure(content::routes)
}
