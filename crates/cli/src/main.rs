use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rtsp_test_server::mount::{register_catalog, stream_url};
use rtsp_test_server::{CATALOG, Config, Lifecycle, Result, ServerError, config, lifecycle};

mod server;
mod signals;

use server::RtspServer;
use signals::ServeLoop;

#[derive(Parser)]
#[command(
    name = "rtsp-test-server",
    about = "RTSP server publishing synthetic H.264 and VP8 test streams"
)]
struct Args {
    /// Extra directory searched for rtsp-test-server.conf, after the
    /// platform directories. May be repeated.
    #[arg(long = "config-dir", value_name = "DIR")]
    config_dirs: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .with_ansi(std::io::stdout().is_terminal())
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    lifecycle::mark_logger_ready();

    let lifecycle = Lifecycle::process();
    if let Err(e) = lifecycle.install_crash_handlers() {
        tracing::warn!(error = %e, "crash reporting unavailable");
    }

    tracing::info!("=== RTSP Test Server starting ===");

    let mut dirs = config::config_dirs();
    dirs.extend(args.config_dirs);
    let config = config::resolve_from(&dirs);

    match serve(config, lifecycle) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn serve(config: Config, lifecycle: Lifecycle) -> Result<()> {
    disable_vaapi();
    gst::init().map_err(|e| ServerError::Init(e.to_string()))?;

    let mut server = RtspServer::new(config.port)?;
    let registrations = register_catalog(CATALOG, &mut server);

    let main_loop = ServeLoop::new();
    let source = server.attach()?;
    signals::watch_termination(lifecycle, &main_loop);

    tracing::info!("Server started successfully on port {}", config.port);
    tracing::info!("Available streams:");
    for registration in &registrations {
        tracing::info!(
            "  {} ({})",
            stream_url(config.port, registration),
            registration.codec.label()
        );
    }

    lifecycle.run(&main_loop);
    source.remove();
    Ok(())
}

/// Only software encoders are used; keep libva from probing GPU drivers.
fn disable_vaapi() {
    if std::env::var_os("LIBVA_DRIVER_NAME").is_none() {
        // SAFETY: runs before gst::init, while the process is single-threaded.
        unsafe { std::env::set_var("LIBVA_DRIVER_NAME", "null") };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_dirs_keep_command_line_order() {
        let args = Args::parse_from([
            "rtsp-test-server",
            "--config-dir",
            "/opt/a",
            "--config-dir",
            "/opt/b",
        ]);
        assert_eq!(
            args.config_dirs,
            [PathBuf::from("/opt/a"), PathBuf::from("/opt/b")]
        );
    }

    #[test]
    fn no_arguments() {
        let args = Args::parse_from(["rtsp-test-server"]);
        assert!(args.config_dirs.is_empty());
    }
}
