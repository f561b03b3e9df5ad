//! Transport layer selection for the MCP server.
//!
//! Supports two transport mechanisms:
//! - http: streamable HTTP at `/mcp` (default, requires the `http` feature)
//! - stdio: standard input/output, for clients that spawn the server
//!
//! The HTTP transport is optional and requires the `http` feature flag.

use crate::constants::{DEFAULT_HOST, DEFAULT_PORT};
use crate::error::ServerError;

/// Transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Transport type to use.
    pub transport_type: TransportType,

    /// HTTP server configuration (only used for HTTP transport).
    pub http: HttpConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            transport_type: TransportType::default(),
            http: HttpConfig::default(),
        }
    }
}

impl TransportConfig {
    /// Create configuration from environment variables.
    ///
    /// - `MCP_TRANSPORT`: `http` or `stdio`
    /// - `MCP_HOST`, `PORT`, `MCP_HTTP_TRACING`: see [`HttpConfig::from_env`]
    pub fn from_env() -> Result<Self, ServerError> {
        let transport_type = match std::env::var("MCP_TRANSPORT") {
            Ok(value) if !value.trim().is_empty() => value
                .parse()
                .map_err(|e: ParseTransportTypeError| ServerError::config(e.to_string()))?,
            _ => TransportType::default(),
        };

        Ok(Self {
            transport_type,
            http: HttpConfig::from_env(),
        })
    }
}

/// Available transport types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportType {
    /// Standard input/output transport.
    Stdio,

    /// Streamable HTTP transport.
    #[cfg(feature = "http")]
    Http,
}

impl Default for TransportType {
    #[cfg(feature = "http")]
    fn default() -> Self {
        TransportType::Http
    }

    #[cfg(not(feature = "http"))]
    fn default() -> Self {
        TransportType::Stdio
    }
}

/// Error returned when parsing a transport type fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTransportTypeError(String);

impl std::fmt::Display for ParseTransportTypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid transport type: '{}'", self.0)
    }
}

impl std::error::Error for ParseTransportTypeError {}

impl std::str::FromStr for TransportType {
    type Err = ParseTransportTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdio" | "standard" | "io" => Ok(TransportType::Stdio),
            #[cfg(feature = "http")]
            "http" | "streamable-http" | "web" => Ok(TransportType::Http),
            _ => Err(ParseTransportTypeError(s.to_string())),
        }
    }
}

impl std::fmt::Display for TransportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportType::Stdio => write!(f, "stdio"),
            #[cfg(feature = "http")]
            TransportType::Http => write!(f, "http"),
        }
    }
}

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Host to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Enable request tracing via tower-http TraceLayer.
    pub enable_tracing: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            enable_tracing: true,
        }
    }
}

impl HttpConfig {
    /// Create configuration from environment variables.
    ///
    /// Unparsable values fall back to their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("MCP_HOST") {
            if !host.trim().is_empty() {
                config.host = host;
            }
        }

        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.trim().parse() {
                config.port = p;
            }
        }

        if let Ok(tracing) = std::env::var("MCP_HTTP_TRACING") {
            config.enable_tracing = tracing.to_lowercase() == "true" || tracing == "1";
        }

        config
    }

    /// Socket address string to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// HTTP server implementation using rmcp's streamable HTTP service
/// (only available with `http` feature).
#[cfg(feature = "http")]
pub mod http_server {
    use super::*;
    use crate::constants::MCP_HTTP_PATH;
    use crate::shutdown::ShutdownSignal;
    use crate::SqliteMcpServer;
    use axum::Router;
    use rmcp::transport::streamable_http_server::{
        session::local::LocalSessionManager, StreamableHttpService,
    };
    use tower_http::trace::TraceLayer;
    use tracing::info;

    /// Build the axum application serving MCP at `/mcp`.
    pub fn router(mcp_server: SqliteMcpServer, config: &HttpConfig) -> Router {
        let service = StreamableHttpService::new(
            move || Ok(mcp_server.clone()),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        let app = Router::new().nest_service(MCP_HTTP_PATH, service);

        if config.enable_tracing {
            app.layer(TraceLayer::new_for_http())
        } else {
            app
        }
    }

    /// Serve HTTP until `shutdown` fires.
    pub async fn start_http_server(
        mcp_server: SqliteMcpServer,
        config: HttpConfig,
        mut shutdown: ShutdownSignal,
    ) -> std::io::Result<()> {
        let app = router(mcp_server, &config);

        let addr = config.bind_address();
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!("HTTP server listening on http://{}", addr);
        info!("MCP endpoint: http://{}{}", addr, MCP_HTTP_PATH);
        if config.enable_tracing {
            info!("Request tracing enabled");
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                info!("HTTP server received shutdown signal");
            })
            .await
    }
}
