use std::path::PathBuf;

use clap::{
  ArgAction,
  Parser,
};

#[derive(Parser, Debug)]
#[command(
  name = "the-autocomplete",
  about = "Drive the autocomplete engine from a key script",
  long_about = None
)]
pub struct Cli {
  /// Increase logging verbosity (repeat for more detail)
  #[arg(short = 'v', action = ArgAction::Count)]
  pub verbosity: u8,

  /// Save logs to a specific file
  #[arg(long = "log", value_name = "FILE")]
  pub log_file: Option<PathBuf>,

  /// Load configuration from a specific file
  #[arg(short = 'c', long = "config", value_name = "FILE")]
  pub config_file: Option<PathBuf>,

  /// Print the merged configuration and exit
  #[arg(long = "dump-config")]
  pub dump_config: bool,

  /// Script to run; read from stdin when omitted
  #[arg(value_name = "SCRIPT")]
  pub script: Option<PathBuf>,
}
