//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the relay server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `8080`; `0` for auto-assign).
    pub port: u16,
    /// Public base URL used for the WebSocket origin check. When unset,
    /// any origin is accepted.
    pub public_url: Option<String>,
    /// Id of the room every new connection starts in.
    pub default_room: String,
    /// Max inbound WebSocket message size in bytes.
    pub max_message_size: usize,
    /// Seconds a peer may go without a pong before it is considered dead.
    /// Pings are sent at 90% of this window.
    pub pong_timeout_secs: u64,
    /// Capacity of each connection's outbound mailbox. A member whose
    /// mailbox is full is evicted from its room.
    pub mailbox_capacity: usize,
    /// Directory to serve static assets from, if any.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            public_url: None,
            default_room: "default".into(),
            max_message_size: 10 * 1024,
            pong_timeout_secs: 60,
            mailbox_capacity: 256,
            static_dir: None,
        }
    }
}

impl ServerConfig {
    /// The pong-timeout window as a [`Duration`].
    pub fn pong_timeout(&self) -> Duration {
        Duration::from_secs(self.pong_timeout_secs)
    }

    /// Interval between server pings. Must stay strictly inside the
    /// peer's pong window; convention is 90% of it.
    pub fn ping_interval(&self) -> Duration {
        self.pong_timeout() * 9 / 10
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_host_and_port() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn default_room_id() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.default_room, "default");
    }

    #[test]
    fn default_limits() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.max_message_size, 10 * 1024);
        assert_eq!(cfg.mailbox_capacity, 256);
        assert_eq!(cfg.pong_timeout_secs, 60);
    }

    #[test]
    fn no_public_url_by_default() {
        let cfg = ServerConfig::default();
        assert!(cfg.public_url.is_none());
        assert!(cfg.static_dir.is_none());
    }

    #[test]
    fn ping_interval_is_ninety_percent_of_pong_timeout() {
        let cfg = ServerConfig { pong_timeout_secs: 60, ..ServerConfig::default() };
        assert_eq!(cfg.ping_interval(), Duration::from_secs(54));
        assert!(cfg.ping_interval() < cfg.pong_timeout());
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = ServerConfig {
            host: "0.0.0.0".into(),
            port: 9000,
            public_url: Some("https://chat.example.com".into()),
            static_dir: Some(PathBuf::from("/srv/assets")),
            ..ServerConfig::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.port, cfg.port);
        assert_eq!(back.public_url, cfg.public_url);
        assert_eq!(back.static_dir, cfg.static_dir);
    }

    #[test]
    fn deserialize_from_json_string() {
        let json = r#"{
            "host": "10.0.0.1",
            "port": 3000,
            "public_url": null,
            "default_room": "lobby",
            "max_message_size": 512,
            "pong_timeout_secs": 30,
            "mailbox_capacity": 8,
            "static_dir": null
        }"#;
        let cfg: ServerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.default_room, "lobby");
        assert_eq!(cfg.mailbox_capacity, 8);
        assert_eq!(cfg.ping_interval(), Duration::from_secs(27));
    }
}
