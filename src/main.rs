#![windows_subsystem = "windows"]
#![cfg_attr(not(windows), allow(dead_code))]

#[macro_use]
extern crate log;

mod host;
#[cfg(windows)]
mod icons;
#[cfg(windows)]
mod logging;
mod main_window;
#[cfg(windows)]
mod menu;
mod poll;
mod threshold;
#[cfg(windows)]
mod winapi;

#[cfg(windows)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use log::LevelFilter;
    use logging::FileLogger;
    use main_window::MainWindow;
    use std::panic;
    use winapi::{show_error_message_box, windows_message_loop};

    let logger: &'static FileLogger = Box::leak(Box::new(FileLogger::new()));
    log::set_logger(logger)?;
    log::set_max_level(if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    panic::set_hook(Box::new(|panic_info| {
        error!("{}", panic_info);
        log::logger().flush();
        show_error_message_box(panic_info.to_string().as_str());
    }));
    info!("ScreenSaver Tray {} starting", env!("CARGO_PKG_VERSION"));
    let log_dir = std::env::temp_dir().join("ScreenSaverTray");
    // Without a log file the logger discards records, the app itself keeps working
    if let Err(err) = logger.init(&log_dir) {
        if cfg!(debug_assertions) {
            show_error_message_box(&format!(
                "Failed to create a log file in {}: {}",
                log_dir.display(),
                err
            ));
        }
    }

    let window = MainWindow::new().inspect_err(|err| error!("Failed to start: {}", err))?;
    windows_message_loop()?;
    drop(window);
    info!("Exiting");
    log::logger().flush();
    Ok(())
}

#[cfg(not(windows))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    Err("ScreenSaver Tray only runs on Windows".into())
}
