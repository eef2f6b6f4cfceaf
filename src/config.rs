use std::env;

/// TLS listen settings. The key must be unencrypted PEM.
#[derive(Clone, Debug, PartialEq)]
pub struct TlsConfig {
    pub cert_path: String,
    pub key_path: String,
}

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// Per-attempt upstream fetch timeout in seconds.
    pub fetch_timeout_secs: u64,
    /// When set, the listener terminates TLS itself.
    pub tls: Option<TlsConfig>,
}

impl Config {
    /// Load configuration from environment variables, with defaults suited
    /// to local development.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()?;

        let fetch_timeout_secs = env::var("FETCH_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        let tls_enabled: bool = env::var("TLS_ENABLED")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        let tls = if tls_enabled {
            let cert_path =
                env::var("TLS_CERT_PATH").map_err(|_| "TLS_CERT_PATH is required when TLS_ENABLED")?;
            let key_path =
                env::var("TLS_KEY_PATH").map_err(|_| "TLS_KEY_PATH is required when TLS_ENABLED")?;
            Some(TlsConfig {
                cert_path,
                key_path,
            })
        } else {
            None
        };

        Ok(Config {
            port,
            fetch_timeout_secs,
            tls,
        })
    }
}

/// Stream name used when the `stream` query parameter is absent.
pub const DEFAULT_STREAM: &str = "default";

/// Fixed registry of named sample streams.
const STREAM_REGISTRY: &[(&str, &str)] = &[
    (
        "default",
        "https://test-streams.mux.dev/x36xhzz/x36xhzz.m3u8",
    ),
    (
        "sintel",
        "https://bitdash-a.akamaihd.net/content/sintel/hls/playlist.m3u8",
    ),
    (
        "tears-of-steel",
        "https://demo.unified-streaming.com/k8s/features/stable/video/tears-of-steel/tears-of-steel.ism/.m3u8",
    ),
];

/// Look up a registered stream name.
pub fn registry_url(name: &str) -> Option<&'static str> {
    STREAM_REGISTRY
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, url)| *url)
}
