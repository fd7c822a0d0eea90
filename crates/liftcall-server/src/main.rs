//! liftcall station binary.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: console on :8080, radio on :9100, broker 192.168.4.10:1883
//! liftcall-station
//!
//! # Point the radio at a panel and shorten the retry budget
//! liftcall-station --panel 192.168.4.20:9101 --max-retries 3
//! ```

use std::time::Duration;

use clap::Parser;
use liftcall_app::RuntimeConfig;
use liftcall_core::{BridgeConfig, CallConfig, GatewayConfig};
use liftcall_server::{DEFAULT_BROKER_HOST, MqttConfig, Station, StationConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// liftcall elevator-call station
#[derive(Parser, Debug)]
#[command(name = "liftcall-station")]
#[command(about = "Robot elevator-call coordinator")]
#[command(version)]
struct Args {
    /// Console listen address
    #[arg(long, default_value = "0.0.0.0:8080")]
    console: String,

    /// Local radio address
    #[arg(long, default_value = "0.0.0.0:9100")]
    radio: String,

    /// Call panel radio address
    #[arg(long, default_value = "127.0.0.1:9101")]
    panel: String,

    /// MQTT broker host
    #[arg(long, default_value = DEFAULT_BROKER_HOST)]
    mqtt_host: String,

    /// MQTT broker port
    #[arg(long, default_value_t = 1883)]
    mqtt_port: u16,

    /// MQTT client identifier
    #[arg(long, default_value = "robot_esp32")]
    client_id: String,

    /// Highest selectable floor
    #[arg(long, default_value_t = 7)]
    max_floor: u8,

    /// Retries after the first transmission
    #[arg(long, default_value_t = 5)]
    max_retries: u32,

    /// Listen window per attempt, in milliseconds
    #[arg(long, default_value_t = 1000)]
    listen_ms: u64,

    /// Delay between attempts, in milliseconds
    #[arg(long, default_value_t = 2000)]
    retry_delay_ms: u64,

    /// Coordination loop interval, in milliseconds
    #[arg(long, default_value_t = 1000)]
    tick_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> StationConfig {
        let mqtt = MqttConfig {
            host: self.mqtt_host,
            port: self.mqtt_port,
            client_id: self.client_id,
            ..MqttConfig::default()
        };

        let runtime = RuntimeConfig {
            call: CallConfig {
                max_retries: self.max_retries,
                listen_window: Duration::from_millis(self.listen_ms),
                retry_delay: Duration::from_millis(self.retry_delay_ms),
            },
            bridge: BridgeConfig { client_id: mqtt.client_id.clone(), ..BridgeConfig::default() },
            gateway: GatewayConfig { max_floor: self.max_floor },
            tick_interval: Duration::from_millis(self.tick_ms),
        };

        StationConfig {
            console_bind: self.console,
            radio_bind: self.radio,
            panel_address: self.panel,
            mqtt,
            runtime,
            ..StationConfig::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("liftcall station starting");

    let config = args.into_config();
    tracing::info!(
        broker = %format!("{}:{}", config.mqtt.host, config.mqtt.port),
        panel = %config.panel_address,
        "Configuration loaded"
    );

    let station = Station::bind(config).await?;
    tracing::info!("Console listening on {}", station.console_addr());

    tokio::select! {
        () = station.run() => {},
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Shutting down");
        },
    }

    Ok(())
}
