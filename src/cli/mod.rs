use failure::Error;
use sentry::protocol::Event;
use std::{env, mem, sync::Arc};
use structopt::StructOpt;

use crate::{
    Result,
    config::Config,
    db,
    events::LogNotifier,
    store::PgStore,
    workflow::TransitionEngine,
};

mod category;
mod content;
mod server;
mod sweep;
mod util;

#[derive(StructOpt)]
#[structopt(name = "pressroom")]
struct Opts {
    /// Path to the configuration file
    #[structopt(short = "c", long = "config", default_value = "config.toml")]
    config: String,
    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
enum Command {
    /// Start the server
    #[structopt(name = "start")]
    Start,
    /// Expire published content
    #[structopt(name = "sweep")]
    Sweep(sweep::Opts),
    /// Manage categories
    #[structopt(name = "category")]
    Category(category::Opts),
    /// Manage content
    #[structopt(name = "content")]
    Content(content::Opts),
}

pub fn main() -> Result<()> {
    let opts = Opts::from_args();
    let config = crate::config::load(&opts.config)?;

    setup_sentry(&config)?;
    setup_logging(&config.logging)?;

    // Run validation after sentry and logging setup so that they can catch bugs
    // in validation.
    config.validate()?;

    match opts.command {
        Command::Start => server::start(&config),
        Command::Sweep(opts) => sweep::main(&config, opts),
        Command::Category(opts) => category::main(&config, opts),
        Command::Content(opts) => content::main(&config, opts),
    }
}

/// Construct a workflow engine for use outside of the server.
///
/// There is no actix system running in command line tools, so state changes
/// are only logged.
fn engine(config: &Config) -> Result<TransitionEngine, Error> {
    let pool = db::pool(config)?;

    Ok(TransitionEngine::new(
        Arc::new(PgStore::new(pool)),
        Arc::new(LogNotifier),
        config.workflow.lock_timeout(),
    ))
}

fn setup_sentry(config: &Config) -> Result<()> {
    if let Some(ref sentry) = config.sentry {
        env::set_var("RUST_BACKTRACE", "1");
        mem::forget(sentry::init((sentry.dsn.as_str(), sentry::ClientOptions {
            debug: cfg!(debug_assertions),
            release: Some(env!("CARGO_PKG_VERSION").into()),
            server_name: Some(config.server.domain.clone().into()),
            before_send: Some(Arc::new(Box::new(before_send_event_to_sentry))),
            .. Default::default()
        })));
        sentry::integrations::panic::register_panic_handler();
    }

    Ok(())
}

fn setup_logging(config: &crate::config::Logging) -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(config.level);

    if let Some(level) = config.network {
        builder.filter_module("actix_web", level);
    }

    for (module, level) in &config.filters {
        builder.filter_module(&module, *level);
    }

    builder.try_init()?;
    Ok(())
}

fn before_send_event_to_sentry(mut ev: Event<'static>) -> Option<Event<'static>> {
    if let Some(ref mut request) = ev.request {
        request.headers.remove("x-forwarded-for");
    }
    Some(ev)
}
