use std::time::Duration;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use fallback_supervisor::config::Config;
use fallback_supervisor::supervisor::Supervisor;

use crate::common::*;
mod common;

async fn wait_for_health(port: u16) -> Result<Value> {
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..100 {
        if let Ok(res) = reqwest::get(&url).await {
            assert_eq!(StatusCode::OK, res.status());
            return Ok(res.json::<Value>().await?);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    anyhow::bail!("degraded server never came up on port {}", port)
}

#[tokio::test]
async fn it_degrades_when_the_application_fails() -> Result<()> {
    let port = free_port();
    let config = Config {
        host: "127.0.0.1".to_owned(),
        port: port.to_string(),
        app_command: Some("echo 'crawler import failed' >&2; exit 1".to_owned()),
        cleanup_command: Some(
            r#"printf '{"status":"success","timestamp":"T","retention_hours_applied":%s}' "$RETENTION_HOURS""#
                .to_owned(),
        ),
        prepare_commands: "true; false".to_owned(),
        ..Config::default()
    };

    let supervisor = tokio::spawn(Supervisor::new(&config).run());

    let health = wait_for_health(port).await?;
    assert_eq!(health["status"], "degraded");
    assert_eq!(
        health["error"],
        "primary application exited with exit status: 1"
    );

    let res = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{}/api/cleanup", port))
        .body(r#"{"retention_hours": 6}"#)
        .send()
        .await?;
    assert_eq!(StatusCode::OK, res.status());
    let result = res.json::<Value>().await?;
    assert_eq!(result["retention_hours_applied"], 6);

    assert!(!supervisor.is_finished());
    supervisor.abort();

    Ok(())
}

#[tokio::test]
async fn it_reports_an_unconfigured_application() -> Result<()> {
    let port = free_port();
    let config = Config {
        host: "127.0.0.1".to_owned(),
        port: port.to_string(),
        ..Config::default()
    };

    let supervisor = tokio::spawn(Supervisor::new(&config).run());

    let health = wait_for_health(port).await?;
    assert_eq!(health["error"], "no primary application configured");

    // Without a cleanup command every attempt raises, and is recorded as such.
    let res = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{}/api/cleanup", port))
        .send()
        .await?;
    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());
    let result = res.json::<Value>().await?;
    assert_eq!(
        result["message"],
        "Cleanup failed in fallback mode: cleanup operation unavailable"
    );

    supervisor.abort();

    Ok(())
}
