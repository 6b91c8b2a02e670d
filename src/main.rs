use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use dotenv::dotenv;

use ovo_reservation_server::config::Config;
use ovo_reservation_server::controller::{self, AppState};
use ovo_reservation_server::repositories::base_service_repo::BaseServiceRepo;
use ovo_reservation_server::repositories::census_repo::CensusRepo;
use ovo_reservation_server::repositories::session_repo::SessionRepo;
use ovo_reservation_server::repositories::token_service_repo::TokenServiceRepo;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::parse();
    let client = reqwest::Client::new();

    let sessions = Arc::new(SessionRepo::new(
        &config.cookie_secret,
        config.session_max_age_secs,
        config.secure_cookies(),
    ));
    sessions.clone().spawn_sweeper(Duration::from_secs(60));

    let app_state = AppState {
        base_service: Arc::new(BaseServiceRepo::new(client.clone(), &config.base_service)?),
        token_service: Arc::new(TokenServiceRepo::new(client, &config.token_service)?),
        census: Arc::new(CensusRepo::load(&config.census_path).await?),
        sessions,
        config: Arc::new(config.clone()),
    };

    controller::serve(app_state, &config).await
}
