use chrono::NaiveDateTime;
use structopt::StructOpt;

use crate::{Result, config::Config};

#[derive(StructOpt)]
pub struct Opts {
    /// Expire content as of this moment (UTC, e.g. 2019-03-01T12:00:00)
    /// instead of now
    #[structopt(long = "now")]
    now: Option<NaiveDateTime>,
}

pub fn main(cfg: &Config, opts: Opts) -> Result<()> {
    let engine = super::engine(cfg)?;
    let now = opts.now.unwrap_or_else(|| engine.now());
    let count = engine.sweep_expired(now)?;

    println!("Expired {} content items", count);

    Ok(())
}
