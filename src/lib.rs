pub mod calc;
pub mod cli;
pub mod data;
pub mod dedupe;
pub mod definition;
pub mod dictionary;
pub mod dictionary_cmd;
pub mod filter;
pub mod io_utils;
pub mod merge;
pub mod name;
pub mod pipeline;
pub mod profile;
pub mod record;
pub mod recordset;
pub mod rules;
pub mod sequence;
pub mod sort_cmd;
pub mod source;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("record_managed", log::LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Merge(args) => merge::execute(&args),
        Commands::Dedupe(args) => dedupe::execute(&args),
        Commands::Sort(args) => sort_cmd::execute(&args),
        Commands::Profile(args) => profile::execute(&args),
        Commands::Dictionary(args) => dictionary_cmd::execute(&args),
    }
}
