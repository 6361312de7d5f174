use log::{Level, LevelFilter, Log, Metadata, Record};

/// Minimal stdout logger: level, target category, then the message, with the
/// source location appended for warnings and errors.
pub struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if record.level() <= Level::Warn {
            let location = match (record.file(), record.line()) {
                (Some(file), Some(line)) => format!(" ({}:{})", file, line),
                (Some(file), None) => format!(" ({})", file),
                (None, _) => String::new(),
            };
            println!(
                "[{:<5}][{}] {}{}",
                record.level(),
                record.target(),
                record.args(),
                location
            );
        } else {
            println!("[{:<5}][{}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    static LOGGER: SimpleLogger = SimpleLogger;
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}
