//! `ginlong-monitor` binary.
//!
//! Listens for inverter frames and republishes them on MQTT, or decodes a
//! captured frame with the `parse` subcommand.

mod cli;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use ginlong_monitor::{
    inspect::FrameReport,
    publish::{MqttConfig, MqttPublisher, drive_event_loop},
    server::{BackoffConfig, InverterServer, ServerConfig},
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ParseArgs, ServeArgs};

const MQTT_KEEP_ALIVE: Duration = Duration::from_secs(30);
const MQTT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Command::Parse(args)) => parse(&args),
        None => serve(cli.serve).await,
    }
}

fn parse(args: &ParseArgs) -> Result<()> {
    let wire = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let report = FrameReport::new(&wire)
        .with_context(|| format!("{} does not hold a frame", args.file.display()))?;
    print!("{report}");
    Ok(())
}

async fn serve(args: ServeArgs) -> Result<()> {
    let mqtt = mqtt_config(&args)?;
    let server_config = server_config(&args);
    info!(
        listen = %server_config.listen_addr,
        read_timeout = ?server_config.read_timeout,
        broker_host = %mqtt.host,
        broker_port = mqtt.port,
        client_id = %mqtt.client_id,
        topic = %mqtt.topic,
        "starting inverter monitor"
    );

    install_metrics_exporter(args.metrics_listen)?;

    let (publisher, event_loop) = MqttPublisher::new(&mqtt);
    let shutdown = CancellationToken::new();
    let mqtt_task = tokio::spawn(drive_event_loop(event_loop, shutdown.clone(), MQTT_RETRY_DELAY));

    let server = InverterServer::from_config(server_config, Arc::new(publisher))
        .context("failed to start inverter listener")?;
    let result = server.run().await;

    shutdown.cancel();
    if let Err(e) = mqtt_task.await {
        warn!(error = %e, "mqtt event loop task failed");
    }
    result.context("inverter listener failed")
}

fn mqtt_config(args: &ServeArgs) -> Result<MqttConfig> {
    let username = args
        .mqtt_username
        .clone()
        .context("an MQTT user name is required (--mqtt-username or MQTT_USERNAME)")?;
    let password = args
        .mqtt_password
        .clone()
        .context("an MQTT password is required (--mqtt-password or MQTT_PASSWORD)")?;
    let topic = args
        .mqtt_topic
        .clone()
        .unwrap_or_else(|| MqttConfig::default_topic(&args.mqtt_client_id));
    Ok(MqttConfig {
        host: ginlong_monitor::publish::strip_scheme(&args.mqtt_server_address).to_owned(),
        port: args.mqtt_server_port,
        client_id: args.mqtt_client_id.clone(),
        username,
        password,
        topic,
        keep_alive: MQTT_KEEP_ALIVE,
    })
}

fn server_config(args: &ServeArgs) -> ServerConfig {
    ServerConfig {
        listen_addr: SocketAddr::new(args.listen_host, args.listen_port),
        read_timeout: (args.read_timeout_secs > 0)
            .then(|| Duration::from_secs(args.read_timeout_secs)),
        backoff: BackoffConfig::default(),
    }
}

#[cfg(feature = "metrics")]
fn install_metrics_exporter(addr: Option<SocketAddr>) -> Result<()> {
    let Some(addr) = addr else { return Ok(()) };
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("failed to install Prometheus exporter")?;
    info!(%addr, "serving metrics");
    Ok(())
}

#[cfg(not(feature = "metrics"))]
#[expect(clippy::unnecessary_wraps, reason = "mirrors the metrics-enabled signature")]
fn install_metrics_exporter(addr: Option<SocketAddr>) -> Result<()> {
    if addr.is_some() {
        warn!("metrics listen address ignored: built without the metrics feature");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn args(extra: &[&str]) -> ServeArgs {
        let base = [
            "ginlong-monitor",
            "--mqtt-client-id",
            "roof",
            "--mqtt-server-address",
            "tcp://10.0.0.5",
        ];
        Cli::parse_from(base.iter().chain(extra).copied()).serve
    }

    #[test]
    fn mqtt_config_requires_credentials() {
        let err = mqtt_config(&args(&["--mqtt-password", "pw"])).expect_err("missing user");
        assert!(err.to_string().contains("user name"));
        let err = mqtt_config(&args(&["--mqtt-username", "u"])).expect_err("missing password");
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn mqtt_config_defaults_topic_and_strips_scheme() {
        let config = mqtt_config(&args(&["--mqtt-username", "u", "--mqtt-password", "pw"]))
            .expect("config");
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.client_id, "roof");
        assert_eq!(config.topic, "sensor/inverter/roof/status");
        assert_eq!(config.keep_alive, MQTT_KEEP_ALIVE);
        assert!(!format!("{config:?}").contains("pw\""));
    }

    #[test]
    fn zero_read_timeout_disables_deadline() {
        assert_eq!(
            server_config(&args(&[])).read_timeout,
            Some(Duration::from_secs(30))
        );
        let config = server_config(&args(&["--read-timeout-secs", "0", "--listen-port", "7000"]));
        assert_eq!(config.read_timeout, None);
        assert_eq!(config.listen_addr.port(), 7000);
    }
}
