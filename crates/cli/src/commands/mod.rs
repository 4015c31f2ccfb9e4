//! CLI subcommands

pub mod quantity;
pub mod validate;
