mod cli;
mod router;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use vitest_lens::output;

/// Environment variable that overrides `RUST_LOG` for this tool.
const LOG_ENV: &str = "VITEST_LENS_LOG";

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = cli::parse();
    init_tracing(cli.verbose);

    let json = cli.json;
    let code = match router::dispatch(cli) {
        Ok(code) => code,
        Err(err) => output::format_error(&err, json),
    };
    std::process::exit(code);
}
