use anyhow::Result;
use log::LevelFilter;
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Logger, Root},
    encode::pattern::PatternEncoder,
};
use std::path::Path;

/// Line layout of the log file.
pub const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {m}{n}";

/// Routes all log records to `log_file`, creating its directory if needed.
/// Encoder chatter under `ffmpeg_log` is only kept at debug verbosity.
pub fn setup_file_logging(log_file: &Path, log_level: LevelFilter) -> Result<()> {
    if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(log_file)?;

    let ffmpeg_level = if log_level >= LevelFilter::Debug {
        log_level
    } else {
        LevelFilter::Warn
    };

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .logger(Logger::builder().build("ffmpeg_log", ffmpeg_level))
        .build(Root::builder().appender("file").build(log_level))?;

    log4rs::init_config(config)?;
    Ok(())
}
