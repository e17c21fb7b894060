//! One-shot maintenance subcommands.

pub mod bootstrap;
pub mod reset_counters;
