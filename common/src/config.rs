use std::time::Duration;

mod default {
    pub const USER_AGENT: &str = concat!("ircc-importer/", env!("CARGO_PKG_VERSION"));
}

/// Settings of the outbound HTTP client
#[derive(clap::Args, Debug, Clone)]
#[command(next_help_heading = "HTTP client")]
#[group(id = "http-client")]
pub struct HttpClientConfig {
    /// Timeout of a single request (e.g. `30s`). Requests wait indefinitely if unset.
    #[arg(id = "http-timeout", long, env = "HTTP_TIMEOUT")]
    pub timeout: Option<humantime::Duration>,

    /// The user agent sent with every request
    #[arg(
        id = "http-user-agent",
        long,
        env = "HTTP_USER_AGENT",
        default_value = default::USER_AGENT
    )]
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: default::USER_AGENT.into(),
        }
    }
}

impl HttpClientConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Into::into)
    }

    /// Build a client from this configuration.
    pub fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder().user_agent(&self.user_agent);

        if let Some(timeout) = self.timeout() {
            builder = builder.timeout(timeout);
        }

        builder.build()
    }
}
