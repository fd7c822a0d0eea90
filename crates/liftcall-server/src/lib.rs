//! liftcall production station.
//!
//! Wraps the generic [`liftcall_app::Runtime`] with real I/O: a UDP socket
//! standing in for the point-to-point radio, a TCP listener serving the
//! operator console, an MQTT client for the companion device, and the system
//! clock.
//!
//! # Components
//!
//! - [`Station`]: bound station ready to run
//! - [`StationDriver`]: console, status channel and display I/O
//! - [`UdpRadio`]: radio link to the call panel
//! - [`MqttChannel`]: background MQTT session
//! - [`SystemEnv`]: production environment (real time)

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod console;
mod driver;
mod error;
mod mqtt;
mod radio;
mod system_env;

use std::{net::SocketAddr, time::Duration};

pub use console::{DEFAULT_REQUEST_TIMEOUT, HttpConsole};
pub use driver::{DISPLAY_TARGET, StationDriver};
pub use error::StationError;
use liftcall_app::{Runtime, RuntimeConfig};
pub use mqtt::{DEFAULT_BROKER_HOST, MqttChannel, MqttConfig};
pub use radio::UdpRadio;
pub use system_env::SystemEnv;

/// Station configuration.
#[derive(Debug, Clone)]
pub struct StationConfig {
    /// Console listen address (e.g., "0.0.0.0:8080")
    pub console_bind: String,
    /// Local radio port
    pub radio_bind: String,
    /// Call panel radio address
    pub panel_address: String,
    /// Deadline for reading a console request head
    pub request_timeout: Duration,
    /// Status channel broker settings
    pub mqtt: MqttConfig,
    /// Coordination loop settings
    pub runtime: RuntimeConfig,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            console_bind: "0.0.0.0:8080".to_string(),
            radio_bind: "0.0.0.0:9100".to_string(),
            panel_address: "127.0.0.1:9101".to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            mqtt: MqttConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

/// Production liftcall station.
pub struct Station {
    runtime: Runtime<StationDriver, UdpRadio, SystemEnv>,
    console_addr: SocketAddr,
    radio_addr: SocketAddr,
}

impl Station {
    /// Bind the console and radio sockets and start the status channel task.
    ///
    /// Must be called inside a tokio runtime.
    pub async fn bind(config: StationConfig) -> Result<Self, StationError> {
        let env = SystemEnv::new();

        let console = HttpConsole::bind(&config.console_bind, config.request_timeout).await?;
        let radio = UdpRadio::bind(&config.radio_bind, &config.panel_address).await?;
        let console_addr = console.local_addr()?;
        let radio_addr = radio.local_addr()?;

        let channel = MqttChannel::start(&config.mqtt);

        let mut runtime_config = config.runtime;
        runtime_config.bridge.client_id = config.mqtt.client_id.clone();

        let driver = StationDriver::new(console, channel);
        let runtime = Runtime::new(driver, radio, env, runtime_config);

        Ok(Self { runtime, console_addr, radio_addr })
    }

    /// Address the console is listening on.
    pub fn console_addr(&self) -> SocketAddr {
        self.console_addr
    }

    /// Address the radio is bound to.
    pub fn radio_addr(&self) -> SocketAddr {
        self.radio_addr
    }

    /// Run the coordination loop. Never returns.
    pub async fn run(mut self) {
        tracing::info!(
            console = %self.console_addr,
            radio = %self.radio_addr,
            "Station running"
        );
        self.runtime.run().await;
    }
}
