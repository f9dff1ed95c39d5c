use std::fs;
use std::sync::Once;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling, rolling::Rotation};
use tracing_subscriber::{
    fmt::{self, time::UtcTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::infrastructure::config::LoggingConfig;

static INIT: Once = Once::new();

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub service_name: String,
    pub enable_console: bool,
    pub enable_file: bool,
    pub log_directory: String,
    pub enable_colors: bool,
    pub enable_thread_ids: bool,
    pub enable_file_line: bool,
    pub enable_module_path: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            service_name: "wallet_service".to_string(),
            enable_console: true,
            enable_file: false,
            log_directory: "logs".to_string(),
            enable_colors: true,
            enable_thread_ids: true,
            enable_file_line: false,
            enable_module_path: true,
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            level: config.level.clone(),
            enable_file: config.enable_file,
            log_directory: config.log_directory.clone(),
            ..Self::default()
        }
    }
}

impl LogConfig {
    pub fn level(&self) -> Level {
        match self.level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Default directive when `RUST_LOG` is not set: the configured level for
    /// this crate and the web server, `warn` for everything else.
    pub fn default_directive(&self) -> String {
        let level = self.level().to_string().to_lowercase();
        format!("warn,{}={level},actix_web={level},actix_server={level}", self.service_name)
    }
}

pub struct Logger;

impl Logger {
    /// Install the global subscriber. Only the first call has any effect.
    ///
    /// The returned guard flushes the file appender and must be kept alive
    /// for as long as the process logs.
    pub fn init(config: &LogConfig) -> Option<WorkerGuard> {
        let mut guard = None;

        INIT.call_once(|| {
            let env_filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

            let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

            if config.enable_console {
                let console_layer = fmt::layer()
                    .with_timer(UtcTime::rfc_3339())
                    .with_thread_ids(config.enable_thread_ids)
                    .with_file(config.enable_file_line)
                    .with_line_number(config.enable_file_line)
                    .with_target(config.enable_module_path)
                    .with_ansi(config.enable_colors)
                    .with_writer(std::io::stdout);
                layers.push(Box::new(console_layer));
            }

            if config.enable_file {
                if let Err(e) = fs::create_dir_all(&config.log_directory) {
                    eprintln!("Failed to create log directory: {e}");
                } else {
                    let file_appender = rolling::RollingFileAppender::new(
                        Rotation::DAILY,
                        &config.log_directory,
                        format!("{}.log", config.service_name),
                    );
                    let (non_blocking_file_appender, file_guard) = non_blocking(file_appender);
                    let file_layer = fmt::layer()
                        .with_timer(UtcTime::rfc_3339())
                        .with_thread_ids(config.enable_thread_ids)
                        .with_target(config.enable_module_path)
                        .with_ansi(false)
                        .with_writer(non_blocking_file_appender);
                    layers.push(Box::new(file_layer));
                    guard = Some(file_guard);
                }
            }

            let subscriber = Registry::default().with(layers).with(env_filter);

            if let Err(e) = subscriber.try_init() {
                eprintln!("Failed to install tracing subscriber: {e}");
            }
        });

        guard
    }
}
