use log::{Metadata, Record};
use std::fs::File;
use std::io::{Error as IoError, Write};
use std::os::windows::fs::OpenOptionsExt;
use std::path::Path;
use std::sync::Mutex;
use windows::Win32::Foundation::SYSTEMTIME;
use windows::Win32::Storage::FileSystem::FILE_SHARE_READ;

#[cfg(not(test))]
use crate::winapi::get_local_time;

/// `log::Log` backend writing into one file per application run.
///
/// Records logged before `init` are kept in memory and written out once the file is open.
pub struct FileLogger {
    sink: Mutex<Sink>,
}

enum Sink {
    Buffer(Vec<u8>),
    File(File),
    Discard,
}

const MAX_LOG_FILES: usize = 5;
const LOG_FILENAME_STEM: &str = "ScreenSaverTray";

fn log_filename_prefix(time: &SYSTEMTIME) -> String {
    format!(
        "{}{:04}{:02}{:02}_",
        LOG_FILENAME_STEM, time.wYear, time.wMonth, time.wDay
    )
}

/// Matches `ScreenSaverTray????????_???.log`.
fn is_log_filename(name: &str) -> bool {
    let Some(rest) = name.strip_prefix(LOG_FILENAME_STEM) else {
        return false;
    };
    let Some(rest) = rest.strip_suffix(".log") else {
        return false;
    };
    let bytes = rest.as_bytes();
    bytes.len() == 12 && bytes[..8].iter().all(u8::is_ascii_digit) && bytes[8] == b'_'
}

fn next_counter(existing_logs: &[String], prefix: &str) -> u32 {
    // newest first, so the first same-day file carries the latest counter
    for log in existing_logs {
        let Some(suffix) = log.strip_prefix(prefix) else {
            continue;
        };
        match suffix[..3].parse::<u32>() {
            Ok(999) => {
                warn!("Log filename counter overflow, resetting to zero");
                return 0;
            }
            Ok(i) => return i + 1,
            Err(_) => debug!("Unexpected log filename counter suffix: {}, skipping", suffix),
        }
    }
    0
}

impl FileLogger {
    fn new_log_file(dir: &Path) -> Result<File, IoError> {
        let mut existing_logs = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let name = entry?.file_name();
            if let Some(name) = name.to_str().filter(|n| is_log_filename(n)) {
                existing_logs.push(name.to_owned());
            }
        }
        existing_logs.sort_unstable_by(|a, b| b.cmp(a));

        let mut deleted = 0;
        for log in existing_logs.iter().skip(MAX_LOG_FILES - 1) {
            match std::fs::remove_file(dir.join(log)) {
                Ok(()) => deleted += 1,
                Err(err) => warn!("Failed to delete log file {}: {}", log, err),
            }
        }
        if deleted > 0 {
            info!("Deleted {} old log files", deleted);
        }

        let prefix = log_filename_prefix(&get_local_time());
        let counter = next_counter(&existing_logs, &prefix);
        File::options()
            .create_new(true)
            .write(true)
            .share_mode(FILE_SHARE_READ.0)
            .open(dir.join(format!("{}{:03}.log", prefix, counter)))
    }

    pub fn new() -> Self {
        FileLogger {
            sink: Mutex::new(Sink::Buffer(Vec::new())),
        }
    }

    /// Opens a new log file in `dir` and flushes buffered records into it.
    ///
    /// On failure buffered records are dropped and later ones are discarded.
    pub fn init(&self, dir: &Path) -> Result<(), IoError> {
        let file = std::fs::create_dir_all(dir).and_then(|()| Self::new_log_file(dir));
        let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        let buffer = match std::mem::replace(&mut *sink, Sink::Discard) {
            Sink::Buffer(buffer) => buffer,
            _ => Vec::new(),
        };
        let mut file = file?;
        file.write_all(&buffer)?;
        *sink = Sink::File(file);
        Ok(())
    }
}

impl log::Log for FileLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let time = get_local_time();
        let line = format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}[{}][{}] {}\n",
            time.wYear,
            time.wMonth,
            time.wDay,
            time.wHour,
            time.wMinute,
            time.wSecond,
            time.wMilliseconds,
            record.level(),
            record.target(),
            record.args()
        );
        let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        match &mut *sink {
            Sink::Buffer(buffer) => buffer.extend_from_slice(line.as_bytes()),
            Sink::File(file) => {
                _ = file.write_all(line.as_bytes());
            }
            Sink::Discard => {}
        }
    }

    fn flush(&self) {
        let sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        if let Sink::File(file) = &*sink {
            // logging from here would deadlock on `sink`
            _ = file.sync_data();
        }
    }
}

#[cfg(test)]
fn get_local_time() -> SYSTEMTIME {
    SYSTEMTIME {
        wYear: 2026,
        wMonth: 3,
        wDayOfWeek: 0,
        wDay: 14,
        wHour: 8,
        wMinute: 5,
        wSecond: 9,
        wMilliseconds: 42,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn prepare_dir(files: &[&str]) -> PathBuf {
        static ID: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "ScreenSaverTray-UnitTests-{}-{}",
            std::process::id(),
            ID.fetch_add(1, Ordering::SeqCst)
        ));
        _ = std::fs::remove_dir_all(&path);
        std::fs::create_dir(&path).expect("Failed to create dir");
        for file in files {
            std::fs::write(path.join(file), "Hello, tests!").expect("Failed to create test file");
        }
        path
    }

    fn record(logger: &FileLogger, s: &str) {
        logger.log(
            &Record::builder()
                .level(Level::Info)
                .target("tests")
                .args(format_args!("Hello, {}!", s))
                .build(),
        );
    }

    fn assert_file(path: &Path, contents: &str) {
        let actual = std::fs::read_to_string(path).expect("Failed to read file");
        assert_eq!(actual, contents);
    }

    #[test]
    fn filename_pattern() {
        assert!(is_log_filename("ScreenSaverTray20260314_000.log"));
        assert!(is_log_filename("ScreenSaverTray20260314_xyz.log"));
        assert!(!is_log_filename("ScreenSaverTray2026031_000.log"));
        assert!(!is_log_filename("ScreenSaverTray20260314_000.txt"));
        assert!(!is_log_filename("Other20260314_000.log"));
    }

    #[test]
    fn clean_start_flushes_buffer() {
        // Arrange
        let path = prepare_dir(&[]);
        let logger = FileLogger::new();
        record(&logger, "before init");

        // Act
        logger.init(&path).expect("Failed to initialize logger");
        record(&logger, "after init");

        // Assert
        assert_file(
            &path.join("ScreenSaverTray20260314_000.log"),
            "2026-03-14T08:05:09.042[INFO][tests] Hello, before init!\n\
             2026-03-14T08:05:09.042[INFO][tests] Hello, after init!\n",
        );
    }

    #[test]
    fn continues_same_day_counter() {
        let path = prepare_dir(&[
            "ScreenSaverTray20260313_517.log",
            "ScreenSaverTray20260314_041.log",
            "ScreenSaverTray20260314_xyz.log",
        ]);
        let logger = FileLogger::new();

        logger.init(&path).expect("Failed to initialize logger");
        record(&logger, "counter");

        assert_file(
            &path.join("ScreenSaverTray20260314_042.log"),
            "2026-03-14T08:05:09.042[INFO][tests] Hello, counter!\n",
        );
    }

    #[test]
    fn counter_overflow() {
        let path = prepare_dir(&["ScreenSaverTray20260314_999.log"]);
        let logger = FileLogger::new();

        logger.init(&path).expect("Failed to initialize logger");

        assert!(path.join("ScreenSaverTray20260314_000.log").exists());
    }

    #[test]
    fn deletes_old_files() {
        // Arrange
        let path = prepare_dir(&[
            "ScreenSaverTray20260312_000.log",
            "ScreenSaverTray20260313_000.log",
            "ScreenSaverTray20260313_001.log",
            "ScreenSaverTray20260314_000.log",
            "ScreenSaverTray20260314_001.log",
            "ScreenSaverTray20260314_002.log",
            "unrelated.txt",
        ]);
        let logger = FileLogger::new();

        // Act
        logger.init(&path).expect("Failed to initialize logger");

        // Assert
        assert!(!path.join("ScreenSaverTray20260312_000.log").exists());
        assert!(!path.join("ScreenSaverTray20260313_000.log").exists());
        assert!(path.join("ScreenSaverTray20260313_001.log").exists());
        assert!(path.join("ScreenSaverTray20260314_003.log").exists());
        assert!(path.join("unrelated.txt").exists());
    }

    #[test]
    fn creates_missing_dir() {
        let path = prepare_dir(&[]).join("nested");
        let logger = FileLogger::new();

        logger.init(&path).expect("Failed to initialize logger");

        assert!(path.join("ScreenSaverTray20260314_000.log").exists());
    }

    #[test]
    fn discards_after_failed_init() {
        // Arrange: a regular file where the directory should be
        let path = prepare_dir(&["ScreenSaverTray.blocker"]).join("ScreenSaverTray.blocker");
        let logger = FileLogger::new();
        record(&logger, "lost");

        // Act
        let result = logger.init(&path);
        record(&logger, "also lost");

        // Assert
        assert!(result.is_err());
        assert!(matches!(*logger.sink.lock().unwrap(), Sink::Discard));
    }
}
