use clap::CommandFactory;
use clap::Parser;
use clap_complete::generate;
use tracing::debug;

use uia_bridge::commands::Cli;
use uia_bridge::commands::Commands;
use uia_bridge::handlers;
use uia_bridge::ClientError;
use uia_bridge_common::init_tracing;
use uia_bridge_daemon::DaemonError;
use uia_bridge_protocol::ErrorCategory;

fn main() {
    let cli = Cli::parse();
    let telemetry = init_tracing(&cli.log_level);
    debug!(sink = ?telemetry.sink(), "logging initialised");

    if let Err(e) = run(cli) {
        if let Some(client_error) = e.downcast_ref::<ClientError>() {
            eprintln!("Error: {}", client_error);
            if let Some(suggestion) = client_error.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            if client_error.is_retryable() {
                eprintln!("(This error may be transient - retry may succeed)");
            }
            std::process::exit(exit_code_for_category(client_error.category()));
        } else if let Some(daemon_error) = e.downcast_ref::<DaemonError>() {
            debug!(context = %daemon_error.context(), "bridge failed");
            eprintln!("Error: {}", daemon_error);
            eprintln!("Suggestion: {}", daemon_error.suggestion());
            if daemon_error.is_retryable() {
                eprintln!("(This error may be transient - retry may succeed)");
            }
            std::process::exit(exit_code_for_category(daemon_error.category()));
        } else {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn exit_code_for_category(category: ErrorCategory) -> i32 {
    match category {
        ErrorCategory::InvalidInput => 64, // EX_USAGE
        ErrorCategory::NotFound => 69,     // EX_UNAVAILABLE
        ErrorCategory::Internal => 74,     // EX_IOERR
    }
}

fn run(cli: Cli) -> handlers::HandlerResult {
    match cli.command {
        Commands::Serve {
            bind,
            port,
            fixture,
        } => handlers::handle_serve(bind, port, fixture),
        Commands::Send {
            request,
            host,
            port,
            timeout,
        } => handlers::handle_send(&request, host, port, timeout),
        Commands::Env { json } => handlers::handle_env(json),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "uia-bridge", &mut std::io::stdout());
            Ok(())
        }
    }
}
