// src/logging/runtime_logger.rs

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc::{self, Sender, Receiver};
use tokio::time::{self, Duration};
use tokio::task;
use tracing_appender::rolling;
use tracing_appender::rolling::RollingFileAppender;
use serde_json::json;
use chrono::{FixedOffset, Utc};
use tracing::{error, info};
use tracing_subscriber::fmt::MakeWriter;

use crate::logging::auction_log::AuctionLog;

/// 日志保留时长（小时）
const RETENTION_HOURS: u64 = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [LogLevel::Trace, LogLevel::Debug, LogLevel::Info, LogLevel::Warn, LogLevel::Error];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单条日志消息
pub struct LogEntry {
    pub level: LogLevel,
    pub content: String,
}

/// 运行日志管理器（RuntimeLogger）
/// 将运行时日志与竞价日志按日志级别分流到不同的日志文件中。
pub struct RuntimeLogger {
    sender: Sender<LogEntry>,
}

impl RuntimeLogger {
    /// 创建一个新的 RuntimeLogger
    ///
    /// - `log_dir`: 日志文件存放目录
    /// - `file_prefix`: 文件前缀，例如 "runtime"（最终文件名形如 runtime_info.json 等）
    /// - `buffer_size`: mpsc 通道缓冲区大小
    /// - `batch_size`: 每个日志级别批量写入的日志条数
    /// - `flush_interval`: 定时刷新日志的时间间隔（毫秒）
    pub fn new(
        log_dir: &str,
        file_prefix: &str,
        buffer_size: usize,
        batch_size: usize,
        flush_interval: u64,
    ) -> Arc<Self> {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let mut log_files = HashMap::new();
        for level in LogLevel::ALL {
            let file_name = format!("{}_{}.json", file_prefix, level.as_str().to_lowercase());
            log_files.insert(level, Arc::new(rolling::hourly(log_dir, &file_name)));
        }
        tokio::spawn(Self::background_log_writer(log_files, receiver, batch_size, flush_interval));
        // 定期清理过期日志文件
        {
            let log_dir = log_dir.to_string();
            tokio::spawn(async move {
                let cleanup_interval = Duration::from_secs(3600); // 每小时扫描一次
                loop {
                    Self::cleanup_old_logs(&log_dir, RETENTION_HOURS).await;
                    tokio::time::sleep(cleanup_interval).await;
                }
            });
        }
        Arc::new(Self { sender })
    }

    /// 东八区时间戳，与运行日志文件名的切分时区保持一致
    fn timestamp() -> String {
        let now = Utc::now();
        match FixedOffset::east_opt(8 * 3600) {
            Some(tz) => now.with_timezone(&tz).to_rfc3339(),
            None => now.to_rfc3339(),
        }
    }

    /// 记录运行日志
    pub async fn log(&self, level: LogLevel, message: &str) {
        let content = json!({
            "timestamp": Self::timestamp(),
            "level": level.as_str(),
            "message": message
        })
        .to_string();

        self.send(LogEntry { level, content }).await;
    }

    /// 记录一次竞价的结构化日志，有交易所出价时记为 INFO，否则记为 WARN
    pub async fn log_auction(&self, auction_log: &AuctionLog) {
        let level = if auction_log.bid_count > 0 { LogLevel::Info } else { LogLevel::Warn };
        match serde_json::to_string(auction_log) {
            Ok(content) => self.send(LogEntry { level, content }).await,
            Err(e) => error!(request_id = %auction_log.request_id, "Failed to serialize auction log: {}", e),
        }
    }

    async fn send(&self, entry: LogEntry) {
        if let Err(e) = self.sender.send(entry).await {
            eprintln!("Failed to send runtime log message: {}", e);
        }
    }

    /// 后台日志写入任务
    async fn background_log_writer(
        log_files: HashMap<LogLevel, Arc<RollingFileAppender>>,
        mut receiver: Receiver<LogEntry>,
        batch_size: usize,
        flush_interval: u64,
    ) {
        // 每个日志级别独立的缓冲区
        let mut buffers: HashMap<LogLevel, Vec<String>> = HashMap::new();
        let mut interval = time::interval(Duration::from_millis(flush_interval));
        loop {
            tokio::select! {
                entry = receiver.recv() => {
                    let Some(entry) = entry else {
                        // 发送端全部关闭，落盘剩余内容后退出
                        Self::flush_all(&log_files, &mut buffers).await;
                        break;
                    };
                    let buffer = buffers.entry(entry.level).or_default();
                    buffer.push(entry.content);
                    if buffer.len() >= batch_size {
                        if let Some(appender) = log_files.get(&entry.level) {
                            Self::write_logs_to_disk(appender.clone(), std::mem::take(buffer)).await;
                        }
                    }
                },
                _ = interval.tick() => {
                    Self::flush_all(&log_files, &mut buffers).await;
                }
            }
        }
    }

    async fn flush_all(
        log_files: &HashMap<LogLevel, Arc<RollingFileAppender>>,
        buffers: &mut HashMap<LogLevel, Vec<String>>,
    ) {
        for (level, buffer) in buffers.iter_mut() {
            if buffer.is_empty() {
                continue;
            }
            if let Some(appender) = log_files.get(level) {
                Self::write_logs_to_disk(appender.clone(), std::mem::take(buffer)).await;
            }
        }
    }

    async fn write_logs_to_disk(file: Arc<RollingFileAppender>, buffer: Vec<String>) {
        let content = buffer.join("\n") + "\n";
        let result = task::spawn_blocking(move || {
            let mut writer = file.make_writer();
            writer.write_all(content.as_bytes())
        })
        .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => eprintln!("Failed to write runtime logs: {}", e),
            Err(e) => eprintln!("Runtime log writer task failed: {}", e),
        }
    }

    async fn cleanup_old_logs(log_dir: &str, retention_hours: u64) {
        use std::time::{SystemTime, Duration as StdDuration};
        let retention_duration = StdDuration::from_secs(retention_hours * 3600);
        let now = SystemTime::now();
        match tokio::fs::read_dir(log_dir).await {
            Ok(mut dir) => {
                while let Ok(Some(entry)) = dir.next_entry().await {
                    let path = entry.path();
                    if let Ok(metadata) = entry.metadata().await {
                        if let Ok(modified) = metadata.modified() {
                            if now.duration_since(modified).unwrap_or_default() > retention_duration {
                                if let Err(e) = tokio::fs::remove_file(&path).await {
                                    eprintln!("Failed to delete old log file {:?}: {}", path, e);
                                } else {
                                    info!("Deleted old log file: {:?}", path);
                                }
                            }
                        }
                    }
                }
            },
            Err(e) => {
                eprintln!("Failed to read log directory {}: {}", log_dir, e);
            }
        }
    }

    /// 等待后台任务把缓冲区刷到磁盘
    pub async fn shutdown(&self) {
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
