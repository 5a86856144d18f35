use booking_earnings::{
    api, config::Config, db::init_db, BookingCalculationService, CurrencyConverter,
    EarningsEngine, HttpRateSource, RateSource, Repository, StaticRateSource,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));
    let engine = EarningsEngine::new(config.platform_rates, config.promotion);
    let service = Arc::new(BookingCalculationService::new(repo.clone(), engine));

    let rate_source: Arc<dyn RateSource> = match &config.currency_api_url {
        Some(url) => Arc::new(HttpRateSource::new(url.clone())),
        None => {
            tracing::info!("CURRENCY_API_URL not set, reporting converts 1:1");
            Arc::new(StaticRateSource::new())
        }
    };
    let converter = CurrencyConverter::new(rate_source);

    tracing::info!(
        promo_start = config.promotion.start.as_ms(),
        promo_end = config.promotion.end.as_ms(),
        "Earnings engine configured"
    );

    let app = api::create_router(api::AppState::new(repo, service, converter));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
