//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::frame::{DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH};
use crate::protocol::DEFAULT_STREAM_TOPIC;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Delay between broadcast tick starts
    pub tick_interval: Duration,

    /// Well-known topic gating the periodic broadcast
    pub broadcast_topic: String,

    /// Origins accepted during the websocket handshake (empty = any origin)
    pub allowed_origins: Vec<String>,

    /// Broadcast frame width in pixels
    pub frame_width: u32,

    /// Broadcast frame height in pixels
    pub frame_height: u32,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".parse().unwrap(),
            max_connections: 0, // Unlimited
            tick_interval: Duration::from_secs(1),
            broadcast_topic: DEFAULT_STREAM_TOPIC.to_string(),
            allowed_origins: Vec::new(), // Any
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
            tcp_nodelay: true, // Important for low latency
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the broadcast tick interval
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the well-known broadcast topic
    pub fn broadcast_topic(mut self, topic: impl Into<String>) -> Self {
        self.broadcast_topic = topic.into();
        self
    }

    /// Add an origin to the handshake allow-list
    ///
    /// With no origins added, any origin is accepted.
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origins.push(origin.into());
        self
    }

    /// Set broadcast frame dimensions
    pub fn frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_width = width;
        self.frame_height = height;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 5000);
        assert_eq!(config.max_connections, 0);
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.broadcast_topic, "stream_frames");
        assert!(config.allowed_origins.is_empty());
        assert_eq!(config.frame_width, 400);
        assert_eq!(config.frame_height, 300);
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:5001".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr.port(), 5001);
    }

    #[test]
    fn test_builder_bind() {
        let addr: SocketAddr = "0.0.0.0:8080".parse().unwrap();
        let config = ServerConfig::default().bind(addr);

        assert_eq!(config.bind_addr, addr);
    }

    #[test]
    fn test_builder_max_connections() {
        let config = ServerConfig::default().max_connections(100);

        assert_eq!(config.max_connections, 100);
    }

    #[test]
    fn test_builder_tick_interval() {
        let config = ServerConfig::default().tick_interval(Duration::from_millis(250));

        assert_eq!(config.tick_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_builder_broadcast_topic() {
        let config = ServerConfig::default().broadcast_topic("weather");

        assert_eq!(config.broadcast_topic, "weather");
    }

    #[test]
    fn test_builder_allow_origin_accumulates() {
        let config = ServerConfig::default()
            .allow_origin("http://localhost:3000")
            .allow_origin("https://app.example.com");

        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:3000", "https://app.example.com"]
        );
    }

    #[test]
    fn test_builder_frame_size() {
        let config = ServerConfig::default().frame_size(640, 480);

        assert_eq!(config.frame_width, 640);
        assert_eq!(config.frame_height, 480);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .max_connections(50)
            .tick_interval(Duration::from_secs(2))
            .broadcast_topic("frames")
            .allow_origin("http://localhost:3000")
            .frame_size(320, 240);

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.tick_interval, Duration::from_secs(2));
        assert_eq!(config.broadcast_topic, "frames");
        assert_eq!(config.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.frame_width, 320);
        assert_eq!(config.frame_height, 240);
    }
}
