use chat::ChatConfig;
use extract::default_document_paths;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds. Generation runs the full model once per
    /// new token on CPU, so this is generous.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Sessions unused for this long are dropped
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,

    /// How often idle sessions are looked for
    #[serde(default = "default_session_sweep_secs")]
    pub session_sweep_secs: u64,

    /// PDFs whose text becomes the QA context
    #[serde(default = "default_document_paths")]
    pub documents: Vec<PathBuf>,

    /// Router and model settings
    #[serde(default)]
    pub chat: ChatConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            session_idle_secs: default_session_idle_secs(),
            session_sweep_secs: default_session_sweep_secs(),
            documents: default_document_paths(),
            chat: ChatConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional `pdfchat-server.{yaml,toml,json}`
    /// file, then `PDFCHAT_SERVER__*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("pdfchat-server").required(false))
            .add_source(config::Environment::with_prefix("PDFCHAT_SERVER").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.session_sweep_secs == 0 {
            anyhow::bail!("session_sweep_secs must be greater than 0");
        }
        self.chat.validate()?;
        Ok(())
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    pub fn session_sweep(&self) -> Duration {
        Duration::from_secs(self.session_sweep_secs)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_session_idle_secs() -> u64 {
    3600
}

fn default_session_sweep_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
