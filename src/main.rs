use anyhow::{Context, Result};
use rand::prelude::*;
use ring::{digest, hmac};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warp::Filter;

use lesson_quiz::{
    assist::{Assistant, OpenAiClient},
    config::Settings,
    routes, Catalogue, LearningController,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lesson_quiz=info,warp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;

    let secret_key = settings.secret_key.unwrap_or_else(|| {
        let mut secret_key = [0u8; digest::SHA256_OUTPUT_LEN];
        rand::rngs::OsRng.fill(&mut secret_key);

        warn!("No secret key was specified, generated a new secret key.");
        warn!("Rerun with SECRET_KEY={}", hex::encode(secret_key));

        secret_key
    });
    let secret_key = hmac::Key::new(hmac::HMAC_SHA256, secret_key.as_ref());

    let catalogue = fs::read_to_string(&settings.lessons_path)
        .await
        .with_context(|| format!("Failed to read lessons from {:?}", settings.lessons_path))?;
    let catalogue = Catalogue::from_toml(&catalogue)
        .with_context(|| format!("Invalid lesson catalogue {:?}", settings.lessons_path))?;
    info!(lessons = catalogue.lessons.len(), "loaded lesson catalogue");

    let controller = LearningController::new(secret_key, catalogue);

    if settings.assist.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set, /ai requests will fail");
    }
    let client = OpenAiClient::new(
        settings.assist.api_key.clone(),
        &settings.assist.base_url,
        &settings.assist.model,
    );
    let assistant = Assistant::new(Arc::new(client), settings.assist.system_prompt.clone());

    let cors = warp::cors()
        .allow_origin(settings.cors_origin.as_str())
        .allow_methods(vec!["GET", "POST"])
        .allow_headers(vec!["Authorization", "Content-Type"]);

    let server = routes::routes(controller, assistant)
        .with(cors)
        .with(warp::trace::request());

    info!("> App on port: {}", settings.bind_addr.port());
    warp::serve(server).run(settings.bind_addr).await;

    Ok(())
}
