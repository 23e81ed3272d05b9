//! CLI subcommand implementations for the Katsini binary.

pub mod doctor;
pub mod lookup;
pub mod serve;
