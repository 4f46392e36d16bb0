//! Database schema, migrations, and sea-query builders.

pub mod chat;
pub mod credits;
pub mod migrations;
pub mod referrals;
pub mod songs;
pub mod tables;
pub mod usage;
pub mod users;

pub use tables::*;

/// A built statement: SQL text plus bind values.
pub type Built = (String, sea_query::Values);
