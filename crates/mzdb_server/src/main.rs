use std::env;
use std::io;
use std::process::ExitCode;

use tracing::error;

mod app;

fn main() -> ExitCode {
    app::init_tracing();
    let args = env::args().skip(1).collect::<Vec<_>>();
    let config = match app::ServerConfig::from_env_and_args(&args) {
        Ok(app::ConfigOutcome::Run(config)) => config,
        Ok(app::ConfigOutcome::PrintUsage) => {
            println!("{}", app::usage_text());
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{message}\n\n{}", app::usage_text());
            return ExitCode::from(2);
        }
    };

    let server = match app::build_server(&config) {
        Ok(server) => server,
        Err(err) => {
            error!(error = %err, "startup_failed");
            eprintln!("{err}");
            return ExitCode::from(1);
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    match app::run_request_loop(&server, stdin.lock(), stdout.lock()) {
        Ok(summary) => {
            tracing::info!(
                handled = summary.handled,
                failed = summary.failed,
                "request_loop_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "request_loop_io_failed");
            ExitCode::from(1)
        }
    }
}
