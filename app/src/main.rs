//! Stagehand daemon: line-oriented transport over stdin/stdout.
//!
//! One JSON result per request line. Two framing prefixes belong to this
//! transport layer, not the core: `EXECUTE:` runs a previously returned
//! plan, `CACHE_CHECK:` peeks at the response cache.

use stagehand_app::{bootstrap, config::AppConfig};
use stagehand_core::Plan;
use stagehand_runtime::AgentService;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "stagehand.yaml".to_string());

    let config = match AppConfig::load(&config_path) {
        Ok(config) => {
            info!("loaded config from {}", config_path);
            config
        }
        Err(e) => {
            info!("{} ({}), using defaults", e, config_path);
            AppConfig::default()
        }
    };

    let service = bootstrap::build_service(&config);
    info!("stagehand ready");

    run_transport(service).await
}

async fn run_transport(service: AgentService) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut lines = stdin.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        let result = handle_line(&service, line).await;
        let mut out = result.to_string();
        out.push('\n');
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }

    Ok(())
}

async fn handle_line(service: &AgentService, line: &str) -> serde_json::Value {
    if let Some(payload) = line.strip_prefix("EXECUTE:") {
        return match serde_json::from_str::<Plan>(payload) {
            Ok(plan) => {
                let report = service.execute_plan(&plan).await;
                serde_json::to_value(&report)
                    .unwrap_or_else(|e| json!({"success": false, "error": e.to_string()}))
            }
            Err(e) => {
                warn!("EXECUTE payload was not a plan: {}", e);
                json!({"success": false, "error": format!("invalid plan: {}", e)})
            }
        };
    }

    if let Some(query) = line.strip_prefix("CACHE_CHECK:") {
        return match service.pipeline().cached(query) {
            Some(value) => json!({"cached": true, "response": value}),
            None => json!({"cached": false}),
        };
    }

    if line == "RESET" {
        service.reset();
        return json!({"success": true});
    }

    service.process_request(line).await
}
