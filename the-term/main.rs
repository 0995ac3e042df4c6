//! Scripted terminal host for the autocomplete engine.
//!
//! Reads a script (see [`script`]) from a file or stdin, replays it against
//! a single editable paragraph and prints what a screen reader and a popup
//! would show.

mod cli;
mod host;
mod logging;
mod script;

use std::io::{
  Read,
  Write,
};

use clap::Parser;
use eyre::{
  Result,
  WrapErr,
};
use the_lib::autocomplete::Autocomplete;

use crate::{
  cli::Cli,
  host::{
    Host,
    key_pipeline,
  },
  script::parse_script,
};

fn main() -> Result<()> {
  let cli = Cli::parse();

  the_loader::initialize_log_file(cli.log_file.clone());
  logging::setup_logging(&the_loader::log_file(), cli.verbosity)
    .wrap_err("failed to set up logging")?;

  let config = the_loader::config::load_config(cli.config_file.as_deref())?;
  if cli.dump_config {
    print!("{}", config.to_toml()?);
    return Ok(());
  }

  let source = match &cli.script {
    Some(path) => std::fs::read_to_string(path)
      .wrap_err_with(|| format!("failed to read {}", path.display()))?,
    None => {
      let mut source = String::new();
      std::io::stdin().read_to_string(&mut source)?;
      source
    },
  };
  let commands = parse_script(&source)?;

  let runtime = tokio::runtime::Builder::new_current_thread()
    .enable_time()
    .build()?;
  runtime.block_on(async {
    let engine = Autocomplete::new(config.registry(), config.autocomplete.clone());
    let mut host = Host::new(engine);
    let mut keys = key_pipeline();
    let mut stdout = std::io::stdout().lock();
    for command in commands {
      log::debug!("running {command:?}");
      host.run(&mut keys, command).await?;
      for line in host.take_transcript() {
        writeln!(stdout, "{line}")?;
      }
    }
    Ok::<_, eyre::Report>(())
  })
}
