//! Command line interface for the `ginlong-monitor` binary.
//!
//! Every serve option falls back to an environment variable so the binary
//! can run unattended in a container. This file is also compiled by the
//! build script to render the man page, so it depends only on `clap` and
//! the standard library.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use clap::{Args, Parser, Subcommand};

/// Command line arguments for the `ginlong-monitor` binary.
#[derive(Debug, Parser)]
#[command(
    name = "ginlong-monitor",
    version,
    about = "Receive Ginlong inverter frames over TCP and republish them on MQTT"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Options for the listener, used when no subcommand is given.
    #[command(flatten)]
    pub serve: ServeArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode a captured frame from a file and print its fields.
    Parse(ParseArgs),
}

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// File holding one raw 103-byte frame.
    #[arg(short, long)]
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address the inverter listener binds to.
    #[arg(long, env = "INVERTER_LISTENHOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub listen_host: IpAddr,

    /// TCP port the inverter connects to.
    #[arg(long, env = "INVERTER_LISTENPORT", default_value_t = 9999)]
    pub listen_port: u16,

    /// Seconds to wait for a connected inverter to send its frame; 0 waits forever.
    #[arg(long, env = "INVERTER_READ_TIMEOUT", default_value_t = 30)]
    pub read_timeout_secs: u64,

    /// MQTT client identifier.
    #[arg(long, env = "MQTT_CLIENTID", default_value = "ginlong-inverter-monitor")]
    pub mqtt_client_id: String,

    /// MQTT broker host; a `tcp://` or `mqtt://` prefix is accepted.
    #[arg(long, env = "MQTT_SERVERADDRESS", default_value = "tcp://127.0.0.1")]
    pub mqtt_server_address: String,

    /// MQTT broker port.
    #[arg(long, env = "MQTT_SERVERPORT", default_value_t = 1883)]
    pub mqtt_server_port: u16,

    /// Topic records are published on. Defaults to `sensor/inverter/<client id>/status`.
    #[arg(long, env = "MQTT_INVERTER_TOPIC")]
    pub mqtt_topic: Option<String>,

    /// MQTT user name. Required when serving.
    #[arg(long, env = "MQTT_USERNAME")]
    pub mqtt_username: Option<String>,

    /// MQTT password. Required when serving.
    #[arg(long, env = "MQTT_PASSWORD", hide_env_values = true)]
    pub mqtt_password: Option<String>,

    /// Address for the Prometheus scrape endpoint; disabled when unset.
    #[arg(long, env = "INVERTER_METRICS_LISTEN")]
    pub metrics_listen: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn parses_serve_options() {
        let cli = Cli::parse_from([
            "ginlong-monitor",
            "--listen-port",
            "7000",
            "--mqtt-username",
            "solar",
            "--mqtt-password",
            "secret",
            "--mqtt-topic",
            "home/inverter",
        ]);
        assert!(cli.command.is_none());
        assert_eq!(cli.serve.listen_port, 7000);
        assert_eq!(cli.serve.mqtt_username.as_deref(), Some("solar"));
        assert_eq!(cli.serve.mqtt_password.as_deref(), Some("secret"));
        assert_eq!(cli.serve.mqtt_topic.as_deref(), Some("home/inverter"));
    }

    #[test]
    fn parses_parse_subcommand() {
        let cli = Cli::parse_from(["ginlong-monitor", "parse", "--file", "capture.bin"]);
        match cli.command {
            Some(Command::Parse(args)) => assert_eq!(args.file.to_str(), Some("capture.bin")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_port() {
        let result = Cli::try_parse_from(["ginlong-monitor", "--listen-port", "70000"]);
        assert!(result.is_err());
    }
}
