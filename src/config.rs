use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Clone, Debug)]
pub struct Config {
    /// `development` drops the `Secure` flag from the session cookie
    #[clap(env, long, default_value = "production")]
    pub environment: String,

    #[clap(env, long, default_value = "127.0.0.1:3000")]
    pub listen_addr: SocketAddr,

    /// Comma separated list of origins allowed by CORS
    #[clap(env, long, default_value = "http://localhost:3000")]
    pub origin_urls: String,

    /// Endpoint of the base reservation service
    #[clap(env = "OVO_BASE_SERVICE", long)]
    pub base_service: String,

    /// Endpoint that exchanges access codes for tokens
    #[clap(env = "OVO_TOKEN_SERVICE", long)]
    pub token_service: String,

    /// Where users get an access code from
    #[clap(env, long)]
    pub reservation_channel: String,

    #[clap(env, long)]
    pub cookie_secret: String,

    #[clap(env, long, default_value_t = 60 * 30)]
    pub session_max_age_secs: i64,

    /// JSON file mapping continent names to their bases
    #[clap(env, long, default_value = "data/census.json")]
    pub census_path: PathBuf,
}

impl Config {
    pub fn secure_cookies(&self) -> bool {
        self.environment != "development"
    }

    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.origin_urls
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
    }
}
