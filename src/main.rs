//! SkillSync - A mentor-matching backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skillsync::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxAuthTokenRepository, SqlxMessageRepository, SqlxRatingRepository,
            SqlxSessionRepository, SqlxSkillRepository, SqlxUserRepository,
        },
    },
    services::{
        MentorService, MessageService, RatingService, SessionService, SkillService, UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skillsync=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting SkillSync service...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let token_repo = SqlxAuthTokenRepository::boxed(pool.clone());
    let skill_repo = SqlxSkillRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let rating_repo = SqlxRatingRepository::boxed(pool.clone());
    let message_repo = SqlxMessageRepository::boxed(pool.clone());

    // Initialize services
    let user_service = Arc::new(UserService::with_token_expiration(
        user_repo.clone(),
        token_repo,
        skill_repo.clone(),
        config.auth.token_expiration_days,
    ));
    let skill_service = Arc::new(SkillService::new(skill_repo));
    let mentor_service = Arc::new(MentorService::new(user_repo.clone()));
    let session_service = Arc::new(SessionService::with_utc_offset(
        session_repo.clone(),
        user_repo,
        config.server.utc_offset_hours,
    ));
    let rating_service = Arc::new(RatingService::new(rating_repo, session_repo.clone()));
    let message_service = Arc::new(MessageService::new(message_repo, session_repo));

    // Demo mode: seed the skill catalog and two demo accounts
    #[cfg(feature = "demo")]
    {
        skillsync::demo::seed(&user_service, &skill_service).await?;
        tracing::info!("Demo mode: seed data ensured");
    }

    // Build application state
    let state = AppState {
        config: Arc::new(config.clone()),
        user_service,
        skill_service,
        mentor_service,
        session_service,
        rating_service,
        message_service,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
