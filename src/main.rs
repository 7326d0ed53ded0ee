use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use docker_registry::cli::{self, Cli};
use docker_registry::ui::output;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr. `RUST_LOG` applies unless `--debug` asks for everything
/// this crate emits.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("docker_registry=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
