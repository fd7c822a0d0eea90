//! MQTT status channel client.
//!
//! The rumqttc event loop runs in a background task on the same runtime.
//! It stays parked until the coordination loop asks for a connection, then
//! pumps the session and forwards inbound messages through an unbounded
//! channel. The coordination loop never waits on the broker except inside an
//! explicit connection attempt.

use std::time::Duration;

use liftcall_core::ChannelEvent;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::{mpsc, oneshot};

use crate::StationError;

/// Default broker address on the robot's network.
pub const DEFAULT_BROKER_HOST: &str = "192.168.4.10";

/// Default broker port.
pub const DEFAULT_BROKER_PORT: u16 = 1883;

/// Keep-alive interval negotiated with the broker.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Time allowed for one connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Capacity of the client request queue.
const REQUEST_CAPACITY: usize = 16;

/// Broker connection settings
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker host
    pub host: String,
    /// Broker port
    pub port: u16,
    /// Client identifier
    pub client_id: String,
    /// Keep-alive interval
    pub keep_alive: Duration,
    /// Deadline for one connection attempt
    pub connect_timeout: Duration,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BROKER_HOST.to_string(),
            port: DEFAULT_BROKER_PORT,
            client_id: liftcall_core::bridge::DEFAULT_CLIENT_ID.to_string(),
            keep_alive: DEFAULT_KEEP_ALIVE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

type ConnectReply = oneshot::Sender<Result<(), String>>;

/// Handle to the background MQTT session.
pub struct MqttChannel {
    client: AsyncClient,
    connect_requests: mpsc::UnboundedSender<ConnectReply>,
    events: mpsc::UnboundedReceiver<ChannelEvent>,
    connect_timeout: Duration,
}

impl MqttChannel {
    /// Spawn the event loop task. No connection is made until
    /// [`connect`](Self::connect) is called.
    pub fn start(config: &MqttConfig) -> Self {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(config.keep_alive);

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let (connect_requests, connect_rx) = mpsc::unbounded_channel();
        let (event_tx, events) = mpsc::unbounded_channel();

        tokio::spawn(drive(eventloop, connect_rx, event_tx));

        Self { client, connect_requests, events, connect_timeout: config.connect_timeout }
    }

    /// Attempt a connection, waiting at most the connect timeout.
    ///
    /// Succeeds immediately if the session is already up.
    pub async fn connect(&mut self) -> Result<(), StationError> {
        let (reply, result) = oneshot::channel();
        self.connect_requests
            .send(reply)
            .map_err(|_| StationError::Channel("event loop stopped".to_string()))?;

        match tokio::time::timeout(self.connect_timeout, result).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(reason))) => Err(StationError::Channel(reason)),
            Ok(Err(_)) => Err(StationError::Channel("event loop stopped".to_string())),
            Err(_) => Err(StationError::Channel("connection attempt timed out".to_string())),
        }
    }

    /// Queue a QoS 1 subscription without waiting.
    pub fn subscribe(&self, topic: &str) -> Result<(), StationError> {
        self.client.try_subscribe(topic, QoS::AtLeastOnce)?;
        Ok(())
    }

    /// Queue a QoS 0 publish without waiting.
    pub fn publish(&self, topic: &str, payload: &str) -> Result<(), StationError> {
        self.client.try_publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())?;
        Ok(())
    }

    /// Next forwarded event, without waiting.
    pub fn poll(&mut self) -> Option<ChannelEvent> {
        self.events.try_recv().ok()
    }
}

/// Event loop task: wait for a connection request, attempt it, and pump the
/// session until it drops.
async fn drive(
    mut eventloop: EventLoop,
    mut connect_rx: mpsc::UnboundedReceiver<ConnectReply>,
    events: mpsc::UnboundedSender<ChannelEvent>,
) {
    while let Some(reply) = connect_rx.recv().await {
        let result = await_connack(&mut eventloop).await;
        let connected = result.is_ok();
        if reply.send(result).is_err() {
            tracing::debug!("Connection attempt finished after its deadline");
        }

        if connected {
            pump(&mut eventloop, &mut connect_rx, &events).await;
        }
    }
}

async fn await_connack(eventloop: &mut EventLoop) -> Result<(), String> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => return Ok(()),
            Ok(_) => {},
            Err(e) => return Err(e.to_string()),
        }
    }
}

async fn pump(
    eventloop: &mut EventLoop,
    connect_rx: &mut mpsc::UnboundedReceiver<ConnectReply>,
    events: &mpsc::UnboundedSender<ChannelEvent>,
) {
    loop {
        tokio::select! {
            polled = eventloop.poll() => match polled {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let event = ChannelEvent::Message {
                        topic: publish.topic,
                        payload: publish.payload.to_vec(),
                    };
                    if events.send(event).is_err() {
                        return;
                    }
                },
                Ok(_) => {},
                Err(e) => {
                    let _ = events.send(ChannelEvent::Disconnected { reason: e.to_string() });
                    return;
                },
            },
            request = connect_rx.recv() => match request {
                // Already connected
                Some(reply) => {
                    let _ = reply.send(Ok(()));
                },
                None => return,
            },
        }
    }
}
