//! `fixem`: FIX 4.2 session emulator and certification validator CLI.
//!
//! Thin pass-through to `fixem-server` (`--mode emulate`) and `fixem-cert`
//! (`--mode certify`); documented for boundary compatibility rather than as
//! a feature-rich CLI.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

/// FIX 4.2 session emulator and certification validator.
#[derive(Parser, Debug)]
#[command(name = "fixem", version, about)]
struct Cli {
    /// Which mode to run in.
    #[arg(long, value_enum)]
    mode: Mode,
    /// Directory holding `engine.yaml`, `behaviors.yaml`, and session
    /// profiles. Required with `--mode emulate`.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Path to a captured FIX log. Required with `--mode certify`.
    #[arg(long)]
    log: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Mode {
    /// Run the session emulator, binding one acceptor per enabled session.
    Emulate,
    /// Validate a captured log against the certification schema tables.
    Certify,
}

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    let cli = Cli::parse();

    match cli.mode {
        Mode::Emulate => {
            let Some(config_dir) = cli.config else {
                eprintln!("--config is required with --mode emulate");
                return ExitCode::from(1);
            };
            run_emulate(&config_dir)
        }
        Mode::Certify => {
            let Some(log_path) = cli.log else {
                eprintln!("--log is required with --mode certify");
                return ExitCode::from(1);
            };
            run_certify(&log_path)
        }
    }
}

/// Load the config bundle, bind one `FixAcceptor` per enabled session, and
/// block forever serving connections. Every acceptor runs on its own
/// thread; this function only returns if every thread unexpectedly exits.
fn run_emulate(config_dir: &std::path::Path) -> ExitCode {
    let bundle = match fixem_config::load_bundle(config_dir) {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            return ExitCode::from(2);
        }
    };

    if bundle.sessions.is_empty() {
        tracing::warn!("no enabled sessions in configuration, nothing to serve");
        return ExitCode::from(2);
    }

    let behaviors = Arc::new(bundle.behaviors);
    let mut handles = Vec::new();

    for (name, session) in bundle.sessions {
        let behaviors = Arc::clone(&behaviors);
        let acceptor = match fixem_server::FixAcceptor::bind(&session, behaviors) {
            Ok(a) => a,
            Err(e) => {
                tracing::error!(session = %name, error = %e, "failed to bind session");
                return ExitCode::from(2);
            }
        };
        handles.push(std::thread::spawn(move || acceptor.serve()));
    }

    for handle in handles {
        let _ = handle.join();
    }
    ExitCode::from(0)
}

/// Load, parse, and validate a captured log, printing one emoji-decorated
/// line per verdict to stdout.
fn run_certify(log_path: &std::path::Path) -> ExitCode {
    let verdicts = match fixem_cert::validate_log(log_path) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = %e, "failed to validate log");
            return ExitCode::from(2);
        }
    };

    for verdict in &verdicts {
        let emoji = if verdict.ok { "\u{2705}" } else { "\u{274c}" };
        println!("{emoji} {}: {}", verdict.label, verdict.message);
    }

    ExitCode::from(0)
}
