// src/main.rs

use axum::{Router, routing::post, serve};
use clap::Parser;
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use jwplayer_xandr_adapter::api::handlers::handle_openrtb_request;
use jwplayer_xandr_adapter::api::AppState;
use jwplayer_xandr_adapter::bidding::exchange_client::ExchangeClient;
use jwplayer_xandr_adapter::bidding::JwPlayerAdapter;
use jwplayer_xandr_adapter::config::AdapterConfig;
use jwplayer_xandr_adapter::logging::runtime_logger::{LogLevel, RuntimeLogger};
use jwplayer_xandr_adapter::mock_exchange;

#[derive(Parser, Debug)]
#[command(author = "whiteCcinn", version = "1.0", about = "JW Player -> Xandr OpenRTB bidder adapter")]
struct CliArgs {
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
    #[arg(long, default_value = "logs")]
    log_dir: String,
    /// Xandr 竞价地址
    #[arg(long, default_value = "http://127.0.0.1:9001/openrtb2")]
    endpoint: String,
    /// 适配器 extra info JSON，例如 {"targeting_endpoint": "...", "targeting_timeout_ms": 100}
    #[arg(long, default_value = "")]
    extra_info: String,
    /// 本地 mock 交易所端口，0 表示不启动
    #[arg(long, default_value_t = 9001)]
    mock_port: u16,
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // 初始化全局 tracing 日志
    let log_file = rolling::hourly(&args.log_dir, "adapter_log.json");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);
    let subscriber = Registry::default()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().json().with_writer(non_blocking));
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Unable to set global tracing subscriber: {}", e);
        return;
    }
    info!("Adapter harness starting on port {}", args.port);

    // 运行日志 + 竞价日志
    let runtime_logger = RuntimeLogger::new(&args.log_dir, "runtime", 1000, 100, 1000);
    runtime_logger.log(LogLevel::Info, "Adapter harness is starting...").await;

    if args.mock_port != 0 {
        let mock_port = args.mock_port;
        tokio::spawn(async move {
            if let Err(e) = mock_exchange::start_mock_exchange_server(mock_port).await {
                error!("Mock exchange stopped: {}", e);
            }
        });
    }

    let config = AdapterConfig::new(&args.endpoint, &args.extra_info);
    let adapter = match JwPlayerAdapter::builder(&config) {
        Ok(adapter) => adapter,
        Err(e) => {
            error!("Failed to build adapter: {}", e);
            runtime_logger.log(LogLevel::Error, &format!("Failed to build adapter: {}", e)).await;
            runtime_logger.shutdown().await;
            return;
        }
    };

    let state = Arc::new(AppState {
        bidder: Arc::new(adapter),
        exchange: ExchangeClient::new(reqwest::Client::new()),
        runtime_logger: runtime_logger.clone(),
    });

    let app = Router::new()
        .route("/openrtb", post(handle_openrtb_request))
        .with_state(state);
    let addr = format!("0.0.0.0:{}", args.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            runtime_logger.log(LogLevel::Error, &format!("Failed to bind {}: {}", addr, e)).await;
            runtime_logger.shutdown().await;
            return;
        }
    };
    runtime_logger.log(LogLevel::Info, &format!("Adapter harness running at http://{}", addr)).await;

    tokio::select! {
        result = serve(listener, app).into_future() => {
            if let Err(e) = result {
                error!("Harness server error: {}", e);
            }
        }
        _ = signal::ctrl_c() => {
            runtime_logger.log(LogLevel::Info, "Shutting down gracefully...").await;
        }
    }

    runtime_logger.log(LogLevel::Info, "Adapter harness shut down.").await;
    runtime_logger.shutdown().await;
}
