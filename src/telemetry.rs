use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,hyper=warn,axum::rejection=trace";

/// Installs the compact fmt subscriber, honouring `RUST_LOG`.
pub fn init_tracing() {
    install(tracing_subscriber::fmt::layer().with_target(false).compact());
}

/// Same as [`init_tracing`] but on stderr, for binaries whose stdout is
/// their output.
pub fn init_tracing_stderr() {
    install(
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .compact()
            .with_writer(std::io::stderr),
    );
}

fn install<L>(fmt_layer: L)
where
    L: tracing_subscriber::Layer<tracing_subscriber::Registry> + Send + Sync + 'static,
{
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();
}
