use anyhow::Result;
use databench_loader::{run, Config, Variant};
use std::env;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        EnvFilter::new("").add_directive(log_level.parse().unwrap_or(Level::INFO.into()))
    });
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) load config ──────────────────────────────────────────────
    let config = Config::load()?;
    info!(
        catalog = %config.catalog.path.display(),
        source = %config.source.root,
        sample_db = %config.targets.sample.display(),
        all_db = %config.targets.all.display(),
        authenticated = config.source.token.is_some(),
        "configured"
    );

    // ─── 3) load every dataset into both databases ───────────────────
    let summary = run(&config).await?;
    for variant in Variant::ALL {
        info!(variant = %variant, "{}", summary.get(variant));
    }
    if summary.failed() > 0 {
        warn!(failed = summary.failed(), "some datasets failed to load");
    }

    let elapsed = summary.finished - summary.started;
    info!(elapsed_secs = elapsed.num_seconds(), "all done");
    Ok(())
}
