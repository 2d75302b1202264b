mod bootstrap;
mod cli;
mod gameplay;
mod level;
mod loop_runner;
mod report;
mod script;

pub(crate) use bootstrap::{build_app, Startup};
pub(crate) use cli::usage_text;
pub(crate) use loop_runner::run;
