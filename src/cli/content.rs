use chrono::NaiveDateTime;
use itertools::Itertools;
use structopt::StructOpt;

use crate::{
    Result,
    audit,
    config::Config,
    db::types::WorkflowState,
    models::NewContent,
    permissions::Capabilities,
    workflow::TransitionRequest,
};
use super::util::Table;

#[derive(StructOpt)]
pub struct Opts {
    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
pub enum Command {
    /// List content
    #[structopt(name = "list")]
    List(ListOpts),
    /// Show details of a content item
    #[structopt(name = "show")]
    Show(ShowOpts),
    /// Add a new content item
    #[structopt(name = "add")]
    Add(AddOpts),
    /// Show transition history of a content item
    #[structopt(name = "history")]
    History(HistoryOpts),
    /// Move a content item to another state
    #[structopt(name = "move")]
    Move(MoveOpts),
}

pub fn main(cfg: &Config, opts: Opts) -> Result<()> {
    match opts.command {
        Command::List(opts) => list(cfg, opts),
        Command::Show(opts) => show(cfg, opts),
        Command::Add(opts) => add(cfg, opts),
        Command::History(opts) => history(cfg, opts),
        Command::Move(opts) => move_content(cfg, opts),
    }
}

#[derive(StructOpt)]
pub struct ListOpts {
    /// Only list content in this state
    #[structopt(long = "state")]
    state: Option<WorkflowState>,
}

fn list(cfg: &Config, opts: ListOpts) -> Result<()> {
    let items = super::engine(cfg)?.list(opts.state)?;

    let mut table = Table::new(&["ID", "Title", "State", "Author", "Expires"]);

    for item in &items {
        table.row(vec![
            item.id.to_string(),
            item.title.clone(),
            item.state.label().to_string(),
            item.author.to_string(),
            item.expires_at.map_or_else(String::new, |at| at.to_string()),
        ]);
    }

    table.print();

    Ok(())
}

#[derive(StructOpt)]
pub struct ShowOpts {
    id: i32,
    /// Also list states this user could move the content to
    #[structopt(long = "actor")]
    actor: Option<i32>,
    /// Comma-separated capabilities of the actor
    #[structopt(long = "capabilities", default_value = "")]
    capabilities: Capabilities,
}

fn show(cfg: &Config, opts: ShowOpts) -> Result<()> {
    let engine = super::engine(cfg)?;
    let item = engine.content(opts.id)?;

    println!("Title:     {}", item.title);
    println!("Author:    {}", item.author);
    println!("Category:  {}", item.category);
    println!("State:     {} ({})", item.state.label(), item.state);
    println!("Active:    {}", item.is_active);
    println!("Created:   {}", item.created_at);

    if let Some(published) = item.published_at {
        println!("Published: {}", published);
    }

    if let Some(expires) = item.expires_at {
        println!("Expires:   {}", expires);
    }

    if let Some(actor) = opts.actor {
        let targets = engine.available_transitions(item.id, actor, opts.capabilities)?;
        println!("Can move to: {}", targets.iter().map(|s| s.label()).join(", "));
    }

    Ok(())
}

#[derive(StructOpt)]
pub struct AddOpts {
    /// Content's title
    title: String,
    /// ID of the author
    #[structopt(long = "author")]
    author: i32,
    /// ID of the category
    #[structopt(long = "category")]
    category: i32,
    #[structopt(long = "summary", default_value = "")]
    summary: String,
    #[structopt(long = "body", default_value = "")]
    body: String,
    /// Expiration date (UTC, e.g. 2019-03-01T12:00:00)
    #[structopt(long = "expires")]
    expires: Option<NaiveDateTime>,
    /// Send for review immediately
    #[structopt(long = "submit")]
    submit: bool,
}

fn add(cfg: &Config, opts: AddOpts) -> Result<()> {
    let item = super::engine(cfg)?.create_content(NewContent {
        author: opts.author,
        category: opts.category,
        title: opts.title,
        summary: opts.summary,
        body: opts.body,
        expires_at: opts.expires,
    }, opts.submit)?;

    println!("Created content {} in state {}", item.id, item.state.label());

    Ok(())
}

#[derive(StructOpt)]
pub struct HistoryOpts {
    id: i32,
    /// Check that the history leads to the current state
    #[structopt(long = "verify")]
    verify: bool,
}

fn history(cfg: &Config, opts: HistoryOpts) -> Result<()> {
    let engine = super::engine(cfg)?;
    let records = engine.history(opts.id)?;

    let mut table = Table::new(&["Date", "Actor", "From", "To", "Reason"]);

    for record in &records {
        table.row(vec![
            record.timestamp.to_string(),
            record.actor.user().map_or_else(|| "system".to_string(), |id| id.to_string()),
            record.from.label().to_string(),
            record.to.label().to_string(),
            record.reason.clone().unwrap_or_default(),
        ]);
    }

    table.print();

    if opts.verify {
        let current = engine.content(opts.id)?.state;
        let replayed = audit::replay(&records)?;

        if replayed == current {
            println!("History is consistent");
        } else {
            failure::bail!("History leads to {} but content is in {}", replayed, current);
        }
    }

    Ok(())
}

#[derive(StructOpt)]
pub struct MoveOpts {
    id: i32,
    /// Target state
    state: WorkflowState,
    /// ID of the acting user
    #[structopt(long = "actor")]
    actor: i32,
    /// Comma-separated capabilities of the acting user
    #[structopt(long = "capabilities", default_value = "")]
    capabilities: Capabilities,
    /// Reason for this change
    #[structopt(long = "reason")]
    reason: Option<String>,
}

fn move_content(cfg: &Config, opts: MoveOpts) -> Result<()> {
    let done = super::engine(cfg)?.request_transition(TransitionRequest {
        content: opts.id,
        actor: opts.actor,
        capabilities: opts.capabilities,
        target: opts.state,
        reason: opts.reason,
    })?;

    match done.record {
        Some(_) => println!("Content {} is now {}", done.content, done.state.label()),
        None => println!("Content {} was already {}", done.content, done.state.label()),
    }

    Ok(())
}
