//! Server and research configuration parsed from environment variables.
//!
//! `.env` is loaded by `main` before this runs, so both sources feed the same
//! lookups. LLM provider settings live in [`crate::llm::config`].

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
pub const DEFAULT_PORT: u16 = 7860;
pub const DEFAULT_SEARCH_COUNT: usize = 5;
pub const DEFAULT_SEARCH_CONCURRENCY: usize = 5;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_REPORT_MAX_TOKENS: u32 = 8192;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Knobs for the LLM-backed research pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResearchConfig {
    /// Number of searches the planner is asked for.
    pub search_count: usize,
    /// Upper bound on searches summarized at the same time.
    pub search_concurrency: usize,
    /// Token cap for planning and search calls.
    pub max_tokens: u32,
    /// Token cap for the report writer.
    pub report_max_tokens: u32,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            search_count: DEFAULT_SEARCH_COUNT,
            search_concurrency: DEFAULT_SEARCH_CONCURRENCY,
            max_tokens: DEFAULT_MAX_TOKENS,
            report_max_tokens: DEFAULT_REPORT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Open the UI in the default browser once the listener is bound.
    pub open_browser: bool,
    pub research: ResearchConfig,
}

impl AppConfig {
    /// Read `HOST`, `PORT`, `OPEN_BROWSER` and the `RESEARCH_*` knobs.
    ///
    /// Unset variables fall back to defaults; set-but-malformed server
    /// variables are rejected so a typo never binds an unexpected address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an unparsable `HOST`, `PORT` or
    /// `OPEN_BROWSER`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_strict("HOST", DEFAULT_HOST, |s| s.parse::<IpAddr>())?;
        let port = env_strict("PORT", DEFAULT_PORT, |s| s.parse::<u16>())?;
        let open_browser = env_strict("OPEN_BROWSER", true, parse_bool)?;

        let research = ResearchConfig {
            search_count: env_parse("RESEARCH_SEARCH_COUNT", DEFAULT_SEARCH_COUNT).max(1),
            search_concurrency: env_parse("RESEARCH_SEARCH_CONCURRENCY", DEFAULT_SEARCH_CONCURRENCY).max(1),
            max_tokens: env_parse("RESEARCH_MAX_TOKENS", DEFAULT_MAX_TOKENS),
            report_max_tokens: env_parse("RESEARCH_REPORT_MAX_TOKENS", DEFAULT_REPORT_MAX_TOKENS),
        };

        Ok(Self { host, port, open_browser, research })
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// URL a local browser should open.
    #[must_use]
    pub fn browser_url(&self) -> String {
        let host = if self.host.is_unspecified() { IpAddr::V4(Ipv4Addr::LOCALHOST) } else { self.host };
        format!("http://{}/", SocketAddr::new(host, self.port))
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_strict<T, E>(key: &'static str, default: T, parse: impl Fn(&str) -> Result<T, E>) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            parse(raw.trim()).map_err(|_| ConfigError::Invalid { key, value: raw })
        }
        _ => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Result<bool, ()> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(()),
    }
}


#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
