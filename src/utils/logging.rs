use chrono::Local;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::Path,
};

pub trait Logger: Send + Sync {
    fn log(&mut self, message: &str);
    fn debug_log(&mut self, message: &str);
}

fn stamp(level: &str, message: &str) -> String {
    format!(
        "[{}] {} | {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        level,
        message
    )
}

/// Timestamped stderr logger; debug lines only when verbosity asks for them.
pub struct ConsoleLogger {
    debug: bool,
}

impl ConsoleLogger {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }
}

impl Logger for ConsoleLogger {
    fn log(&mut self, message: &str) {
        eprintln!("{}", stamp("INFO", message));
    }

    fn debug_log(&mut self, message: &str) {
        if self.debug {
            eprintln!("{}", stamp("DEBUG", message));
        }
    }
}

#[derive(Debug)]
pub struct FileLogger {
    log_file: String,
    debug: bool,
}

impl FileLogger {
    pub fn new(log_file: &str, debug: bool) -> std::io::Result<Self> {
        // Create log directory if it doesn't exist
        if let Some(parent) = Path::new(log_file).parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(FileLogger {
            log_file: log_file.to_string(),
            debug,
        })
    }

    fn write_to_file(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;

        writeln!(file, "{}", line)
    }
}

impl Logger for FileLogger {
    fn log(&mut self, message: &str) {
        if let Err(e) = self.write_to_file(&stamp("INFO", message)) {
            eprintln!("Failed to write to log file: {}", e);
        }
    }

    fn debug_log(&mut self, message: &str) {
        if self.debug {
            if let Err(e) = self.write_to_file(&stamp("DEBUG", message)) {
                eprintln!("Failed to write debug log: {}", e);
            }
        }
    }
}

// MultiLogger allows logging to multiple destinations
pub struct MultiLogger {
    loggers: Vec<Box<dyn Logger>>,
}

impl MultiLogger {
    pub fn new(loggers: Vec<Box<dyn Logger>>) -> Self {
        Self { loggers }
    }
}

impl Logger for MultiLogger {
    fn log(&mut self, message: &str) {
        for logger in &mut self.loggers {
            logger.log(message);
        }
    }

    fn debug_log(&mut self, message: &str) {
        for logger in &mut self.loggers {
            logger.debug_log(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_logger_appends_info_lines_and_gates_debug() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("run.log");
        let path = path.to_str().unwrap();

        let mut logger = FileLogger::new(path, false).unwrap();
        logger.log("first");
        logger.debug_log("hidden");
        logger.log("second");

        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("INFO | first"));
        assert!(contents.contains("INFO | second"));
        assert!(!contents.contains("hidden"));
    }

    #[test]
    fn file_logger_emits_debug_when_enabled() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logs").join("run.log");
        let path = path.to_str().unwrap();

        let mut logger = FileLogger::new(path, true).unwrap();
        logger.debug_log("visible");

        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("DEBUG | visible"));
    }

    #[test]
    fn multi_logger_fans_out_to_every_destination() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.log");
        let b = tmp.path().join("b.log");

        let mut logger = MultiLogger::new(vec![
            Box::new(FileLogger::new(a.to_str().unwrap(), false).unwrap()),
            Box::new(FileLogger::new(b.to_str().unwrap(), false).unwrap()),
        ]);
        logger.log("shared line");

        assert!(fs::read_to_string(&a).unwrap().contains("shared line"));
        assert!(fs::read_to_string(&b).unwrap().contains("shared line"));
    }
}
