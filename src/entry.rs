use std::ffi::OsString;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::app::run_bench;
use crate::args::BenchArgs;
use crate::config::{apply_config, load_config, resolve_templates};
use crate::error::AppResult;

pub(crate) fn run() -> AppResult<()> {
    let (mut args, matches) = parse_args()?;

    let config = load_config(args.config.as_deref())?;
    if let Some(config) = config.as_ref() {
        apply_config(&mut args, &matches, config)?;
    }
    resolve_templates(&mut args, config.as_ref());

    crate::logger::init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(run_bench(args));
    if let Err(err) = result.as_ref() {
        tracing::error!("{}", err);
    }
    result
}

fn parse_args() -> AppResult<(BenchArgs, ArgMatches)> {
    let cmd = BenchArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();
    let matches = cmd.get_matches_from(raw_args);
    let args = BenchArgs::from_arg_matches(&matches)?;
    Ok((args, matches))
}
