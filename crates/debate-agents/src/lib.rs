//! Runner for multi-agent debates: HTTP inference providers, task sources,
//! team files and result output around `debate-core`.

pub mod config;
pub mod dataset;
pub mod output;
pub mod providers;
pub mod runner;
pub mod team_file;
