use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// Installs the global subscriber. Output goes to stderr so stdout stays
// clean for JSON and report paths.
pub fn init_logger(verbose: bool) {
    let default_filter = if verbose {
        "career_spy=debug,info"
    } else {
        "career_spy=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}
