//! Subcommand implementations

pub mod gen_id;
pub mod register;
