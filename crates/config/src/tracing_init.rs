use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber with env-based filtering.
///
/// `RUST_LOG` wins, then `LOG_LEVEL`, then `default_level`. Per-statement sqlx
/// logging is capped at `warn` unless `RUST_LOG` asks for it explicitly.
/// A second call is a no-op.
pub fn init_tracing(default_level: &str) {
    let filter = build_filter(default_level);
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}

fn build_filter(default_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env("RUST_LOG") {
        return filter;
    }

    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    match "sqlx::query=warn".parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}
