//! The escher binary: wire the real X backend to the manager and run it.
use escher::{x11rb::X11Conn, Config, WindowManager};
use nix::sys::signal::{signal, SigHandler, Signal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

extern "C" fn on_terminate(_: i32) {
    // Signal driven shutdown is the clean exit path
    std::process::exit(0);
}

fn main() -> escher::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Children (autostart, keybinding exec) are never waited on: ignoring
    // SIGCHLD stops them lingering as zombies.
    unsafe {
        if let Err(e) = signal(Signal::SIGCHLD, SigHandler::SigIgn) {
            warn!(%e, "unable to ignore SIGCHLD");
        }
        for sig in [Signal::SIGTERM, Signal::SIGINT] {
            if let Err(e) = signal(sig, SigHandler::Handler(on_terminate)) {
                warn!(?sig, %e, "unable to install shutdown handler");
            }
        }
    }

    let config = Config::load();
    let conn = X11Conn::new()?;
    let mut wm = WindowManager::new(conn, config)?;

    info!("starting escher");
    wm.run()
}
