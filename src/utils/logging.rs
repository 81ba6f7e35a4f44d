use env_logger::Builder;
use log::{LevelFilter, Record};
use std::io::{self, Write};
use std::str::FromStr;

/// Environment variable holding module-level overrides (RUST_LOG syntax)
pub const LOG_ENV: &str = "SHARKVIEW_LOG";

/// Initialize the logger with custom formatting
pub fn init_logger(level: LevelFilter) {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| write_record(buf, record))
        .filter(None, level);

    if let Ok(directives) = std::env::var(LOG_ENV) {
        builder.parse_filters(&directives);
    }

    builder.init();
}

/// `2024-05-01 12:00:00 [INFO] - message`
fn write_record<W: Write>(out: &mut W, record: &Record) -> io::Result<()> {
    writeln!(
        out,
        "{} [{}] - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        record.level(),
        record.args()
    )
}

/// Get log level from string, falling back to `Info` for unknown names
pub fn get_log_level(level: &str) -> LevelFilter {
    LevelFilter::from_str(level.trim()).unwrap_or(LevelFilter::Info)
}
