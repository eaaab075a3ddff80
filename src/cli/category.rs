use structopt::StructOpt;

use crate::{Result, config::Config, models::NewCategory};
use super::util::Table;

#[derive(StructOpt)]
pub struct Opts {
    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
pub enum Command {
    /// List categories
    #[structopt(name = "list")]
    List,
    /// Add a category
    #[structopt(name = "add")]
    Add(AddOpts),
}

pub fn main(cfg: &Config, opts: Opts) -> Result<()> {
    match opts.command {
        Command::List => list(cfg),
        Command::Add(opts) => add(cfg, opts),
    }
}

fn list(cfg: &Config) -> Result<()> {
    let categories = super::engine(cfg)?.categories()?;

    let mut table = Table::new(&["ID", "Name", "Moderated"]);

    for category in &categories {
        table.row(vec![
            category.id.to_string(),
            category.name.clone(),
            if category.is_moderated { "yes" } else { "no" }.to_string(),
        ]);
    }

    table.print();

    Ok(())
}

#[derive(StructOpt)]
pub struct AddOpts {
    /// Category's name
    name: String,
    /// Allow authors to publish drafts without review
    #[structopt(long = "unmoderated")]
    unmoderated: bool,
}

fn add(cfg: &Config, opts: AddOpts) -> Result<()> {
    let category = super::engine(cfg)?.create_category(&NewCategory {
        name: opts.name,
        is_moderated: !opts.unmoderated,
    })?;

    println!("Created category {}", category.id);

    Ok(())
}
