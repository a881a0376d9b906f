//! Termination signals delivered through the GLib main loop.
//!
//! GLib turns SIGINT/SIGTERM into ordinary main-context sources, so the
//! shutdown log and the loop quit run outside interrupt context.

use gst::glib;

use rtsp_test_server::{EventLoop, Lifecycle, SignalClass};

/// The GLib main loop that drives the RTSP server.
#[derive(Clone)]
pub struct ServeLoop(glib::MainLoop);

impl ServeLoop {
    pub fn new() -> Self {
        Self(glib::MainLoop::new(None, false))
    }
}

impl EventLoop for ServeLoop {
    fn run(&self) {
        self.0.run();
    }

    fn quit(&self) {
        self.0.quit();
    }
}

/// Route SIGINT and SIGTERM to [`Lifecycle::request_shutdown`] on `main_loop`.
pub fn watch_termination(lifecycle: Lifecycle, main_loop: &ServeLoop) {
    for &sig in SignalClass::Termination.signals() {
        let main_loop = main_loop.clone();
        glib::unix_signal_add_local(sig as i32, move || {
            lifecycle.request_shutdown(sig, &main_loop);
            glib::ControlFlow::Continue
        });
    }
}
