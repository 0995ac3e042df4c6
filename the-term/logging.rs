use std::path::Path;

use eyre::Result;

/// Route `log` records (and `tracing` events through its `log` bridge) to
/// `file`. `verbosity` counts `-v` flags.
pub fn setup_logging(file: &Path, verbosity: u8) -> Result<()> {
  let level = match verbosity {
    0 => log::LevelFilter::Warn,
    1 => log::LevelFilter::Info,
    2 => log::LevelFilter::Debug,
    _ => log::LevelFilter::Trace,
  };

  fern::Dispatch::new()
    .format(|out, message, record| {
      out.finish(format_args!(
        "{} {} [{}] {}",
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
        record.target(),
        record.level(),
        message
      ))
    })
    .level(level)
    .chain(fern::log_file(file)?)
    .apply()?;

  Ok(())
}
