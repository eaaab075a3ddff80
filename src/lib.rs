#[macro_use] extern crate bitflags;
#[macro_use] extern crate diesel;

#[cfg(not(debug_assertions))]
#[macro_use]
extern crate diesel_migrations;

pub use pressroom_macros::ApiError;
pub use self::api::error::ApiError;
pub use self::cli::main;

pub mod api;
pub mod audit;
pub mod cli;
pub mod config;
pub mod db;
pub mod events;
pub mod models;
pub mod permissions;
pub mod store;
pub mod workflow;

pub type Result<T, E=failure::Error> = std::result::Result<T, E>;
