use axum::http::{header, HeaderMap};
use nimbus_core::{Config, PlaybackResolver, SanitizedConfig, StreamPipeline};

/// Shared application state
pub struct AppState {
    config: Config,
    pipeline: StreamPipeline,
    playback: PlaybackResolver,
}

impl AppState {
    pub fn new(config: Config, pipeline: StreamPipeline, playback: PlaybackResolver) -> Self {
        Self {
            config,
            pipeline,
            playback,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn pipeline(&self) -> &StreamPipeline {
        &self.pipeline
    }

    pub fn playback(&self) -> &PlaybackResolver {
        &self.playback
    }

    /// Base URL clients reach this server at.
    ///
    /// Uses the configured public URL, else the request's Host header
    /// (honouring `X-Forwarded-Proto`).
    pub fn public_base(&self, headers: &HeaderMap) -> String {
        if let Some(url) = &self.config.server.public_url {
            return url.trim_end_matches('/').to_string();
        }

        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| format!("127.0.0.1:{}", self.config.server.port));
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http");

        format!("{}://{}", scheme, host)
    }
}
