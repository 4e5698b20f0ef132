use std::sync::Arc;

use homefind_bot::config::{Config, SESSION_IDLE_TIMEOUT, SESSION_SWEEP_INTERVAL};
use homefind_bot::delivery::DeliveryGuard;
use homefind_bot::dispatch::Dispatcher;
use homefind_bot::health;
use homefind_bot::listings::repo::{ListingRepository, SupabaseRepository};
use homefind_bot::outbound::Outbound;
use homefind_bot::session::{self, SessionStore};
use homefind_bot::telegram::TelegramChannel;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  required: TELEGRAM_BOT_TOKEN, SUPABASE_URL, SUPABASE_KEY");
        std::process::exit(1);
    });

    eprintln!("🏡 Homefind Bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Store: {}", config.supabase_url);
    eprintln!("   Health: http://0.0.0.0:{}/health", config.port);

    // ── Store + sessions ─────────────────────────────────────────────
    let repo: Arc<dyn ListingRepository> = Arc::new(SupabaseRepository::new(
        config.supabase_url.clone(),
        config.supabase_key.clone(),
    ));

    let sessions = SessionStore::new(SESSION_IDLE_TIMEOUT);
    let _sweep_handle = session::spawn_sweep_task(Arc::clone(&sessions), SESSION_SWEEP_INTERVAL);

    // ── Telegram channel ─────────────────────────────────────────────
    let telegram = TelegramChannel::new(config.telegram_token.clone());
    telegram.health_check().await.unwrap_or_else(|e| {
        eprintln!("Error: Telegram token check failed: {e}");
        std::process::exit(1);
    });
    let updates = telegram.start();

    // All outbound sends go through the delivery guard.
    let out: Arc<dyn Outbound> = Arc::new(DeliveryGuard::new(Arc::new(telegram)));

    // ── Health endpoint ──────────────────────────────────────────────
    let _health_handle = health::spawn(config.port);

    // ── Dispatch loop ────────────────────────────────────────────────
    let dispatcher = Dispatcher::new(sessions, repo, out);
    dispatcher.run(updates).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
