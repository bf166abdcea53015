use log::info;
use tracing_subscriber::EnvFilter;

/// Send log records to stderr. The level is taken from `RUST_LOG` and
/// defaults to `info`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn starting(name: &str) {
    info!("{} starting", name);
}
