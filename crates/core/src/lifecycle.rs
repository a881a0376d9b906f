//! Process lifecycle and signal handling.
//!
//! ```text
//! Starting -> Running -> ShuttingDown -> Exited
//!                  \
//!                   -> Crashed   (crash-class signal, never returns)
//! ```
//!
//! Crash-class signals (SIGSEGV, SIGABRT, SIGFPE, SIGBUS, SIGILL) are handled
//! synchronously: the handler writes one critical line straight to the stdout
//! descriptor, restores the default disposition and re-raises so the kernel
//! terminates the process the usual way (core dump, signal exit status).
//! Nothing in that path allocates or takes a lock.
//!
//! Termination-class signals (SIGINT, SIGTERM) are not handled here. The
//! binary observes them from its event loop and calls
//! [`Lifecycle::request_shutdown`] in normal context.

use std::fmt::{self, Write as _};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

use crate::error::{Result, ServerError};

const CRASH_SIGNALS: [Signal; 5] = [
    Signal::SIGSEGV,
    Signal::SIGABRT,
    Signal::SIGFPE,
    Signal::SIGBUS,
    Signal::SIGILL,
];

const TERMINATION_SIGNALS: [Signal; 2] = [Signal::SIGINT, Signal::SIGTERM];

static PROCESS_STATE: StateCell = StateCell::new();
static LOGGER_READY: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProcessState {
    Starting,
    Running,
    ShuttingDown,
    Crashed,
    Exited,
}

impl ProcessState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Starting,
            1 => Self::Running,
            2 => Self::ShuttingDown,
            3 => Self::Crashed,
            _ => Self::Exited,
        }
    }
}

/// Lock-free holder for a [`ProcessState`], writable from a signal handler.
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub const fn new() -> Self {
        Self(AtomicU8::new(ProcessState::Starting as u8))
    }

    pub fn get(&self) -> ProcessState {
        ProcessState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: ProcessState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

/// How a delivered signal is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalClass {
    /// Unrecoverable fault: log, then die by the signal's default action.
    Crash,
    /// Orderly shutdown request: stop the event loop, exit 0.
    Termination,
}

impl SignalClass {
    /// Signals of this class. Every other signal keeps its default disposition.
    pub fn signals(self) -> &'static [Signal] {
        match self {
            Self::Crash => &CRASH_SIGNALS,
            Self::Termination => &TERMINATION_SIGNALS,
        }
    }
}

/// The serving loop, as seen by the lifecycle controller.
pub trait EventLoop {
    /// Block until [`quit`](Self::quit) is called.
    fn run(&self);
    fn quit(&self);
}

/// Allow the crash handler to write its line. Call once logging is set up.
pub fn mark_logger_ready() {
    LOGGER_READY.store(true, Ordering::Release);
}

/// Owner of the run/stop transition of the serving loop.
#[derive(Debug, Clone, Copy)]
pub struct Lifecycle {
    state: &'static StateCell,
}

impl Lifecycle {
    /// The lifecycle of this process, shared with the crash handler.
    pub fn process() -> Self {
        Self::with_state(&PROCESS_STATE)
    }

    /// A lifecycle tracking its own state cell.
    pub fn with_state(state: &'static StateCell) -> Self {
        Self { state }
    }

    pub fn state(&self) -> ProcessState {
        self.state.get()
    }

    /// Install the crash-class handlers for the whole process.
    pub fn install_crash_handlers(&self) -> Result<()> {
        let action = SigAction::new(
            SigHandler::Handler(handle_crash),
            SaFlags::SA_RESETHAND | SaFlags::SA_NODEFER,
            SigSet::empty(),
        );
        for &sig in SignalClass::Crash.signals() {
            // SAFETY: handle_crash only touches atomics, a stack buffer and
            // async-signal-safe syscalls.
            unsafe { signal::sigaction(sig, &action) }
                .map_err(|source| ServerError::Signal { signal: sig, source })?;
        }
        tracing::debug!("crash handlers installed");
        Ok(())
    }

    /// Run `event_loop` until it is stopped, then mark the process exited.
    pub fn run<L: EventLoop + ?Sized>(&self, event_loop: &L) {
        self.state.set(ProcessState::Running);
        event_loop.run();
        self.state.set(ProcessState::Exited);
        tracing::info!("=== RTSP Test Server exiting normally ===");
    }

    /// React to a termination-class signal: log it and stop the loop.
    pub fn request_shutdown<L: EventLoop + ?Sized>(&self, sig: Signal, event_loop: &L) {
        match self.state() {
            ProcessState::ShuttingDown | ProcessState::Exited => {
                tracing::debug!(signal = sig.as_str(), "shutdown already in progress");
                return;
            }
            _ => {}
        }
        tracing::info!(
            signal = sig as i32,
            name = sig.as_str(),
            "received signal, shutting down..."
        );
        self.state.set(ProcessState::ShuttingDown);
        event_loop.quit();
    }
}

extern "C" fn handle_crash(signo: libc::c_int) {
    PROCESS_STATE.set(ProcessState::Crashed);

    let sig = Signal::try_from(signo).ok();
    if LOGGER_READY.load(Ordering::Acquire) {
        let mut line = CrashLine::new();
        if line.render(realtime_now(), signo, sig).is_ok() {
            let bytes = line.as_bytes();
            // SAFETY: write(2) is async-signal-safe and `bytes` outlives the call.
            unsafe { libc::write(libc::STDOUT_FILENO, bytes.as_ptr().cast(), bytes.len()) };
        }
    }

    if let Some(sig) = sig {
        // SAFETY: restoring the default disposition is always sound.
        let _ = unsafe { signal::signal(sig, SigHandler::SigDfl) };
        let _ = signal::raise(sig);
    }

    // SAFETY: _exit is async-signal-safe and skips all userspace cleanup.
    unsafe { libc::_exit(128 + signo) }
}

/// Wall-clock time as `(unix seconds, microseconds)`.
fn realtime_now() -> (i64, u32) {
    // SAFETY: timespec is plain data; clock_gettime is async-signal-safe.
    let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
    if unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts) } != 0 {
        return (0, 0);
    }
    (ts.tv_sec as i64, (ts.tv_nsec / 1_000) as u32)
}

/// Proleptic Gregorian `(year, month, day)` for days since 1970-01-01.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Fixed-size, allocation-free buffer for the crash message.
///
/// Laid out like the `tracing-subscriber` fmt lines around it.
struct CrashLine {
    buf: [u8; 192],
    len: usize,
}

impl CrashLine {
    const fn new() -> Self {
        Self {
            buf: [0; 192],
            len: 0,
        }
    }

    fn render(
        &mut self,
        (secs, micros): (i64, u32),
        signo: libc::c_int,
        sig: Option<Signal>,
    ) -> fmt::Result {
        let (year, month, day) = civil_from_days(secs.div_euclid(86_400));
        let tod = secs.rem_euclid(86_400);
        let name = sig.map_or("unknown", Signal::as_str);
        writeln!(
            self,
            "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{micros:06}Z ERROR {}: \
             Server crashed with signal {signo} ({name})",
            tod / 3_600,
            tod % 3_600 / 60,
            tod % 60,
            module_path!(),
        )
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl fmt::Write for CrashLine {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len + s.len();
        if end > self.buf.len() {
            return Err(fmt::Error);
        }
        self.buf[self.len..end].copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}
