//! Server administration.

use crate::{Result, api, config::Config};

pub fn start(config: &Config) -> Result<()> {
    api::start(config)?;

    Ok(())
}
