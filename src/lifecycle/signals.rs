//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGTERM, SIGQUIT and SIGINT (on Windows: Ctrl-C,
//!   Ctrl-Break, console close and shutdown)
//! - Record the first recognized signal in a shared [`CancelFlag`]
//! - Log other observed signals (SIGHUP, SIGUSR1, SIGUSR2) and ignore them
//!
//! # Design Decisions
//! - Uses Tokio's signal streams; the OS-level handler only wakes a task,
//!   and that task does nothing but the flag write (or a log line)
//! - The flag is a single atomic byte written at most once: first signal wins
//! - Registration failure for a recognized class is fatal to startup

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

#[cfg(unix)]
mod sys {
    pub const SIGTERM: i32 = libc::SIGTERM;
    pub const SIGQUIT: i32 = libc::SIGQUIT;
    pub const SIGINT: i32 = libc::SIGINT;

    /// Signals we listen for only to report them.
    pub const OBSERVED: [i32; 3] = [libc::SIGHUP, libc::SIGUSR1, libc::SIGUSR2];
}

#[cfg(not(unix))]
mod sys {
    // Signal numbers as the C runtime defines them, kept for exit codes.
    pub const SIGTERM: i32 = 15;
    pub const SIGQUIT: i32 = 3;
    pub const SIGINT: i32 = 2;
}

const NOT_REQUESTED: u8 = 0;

/// Why cancellation was requested.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    /// SIGTERM: graceful terminate.
    Terminate = 1,
    /// SIGQUIT.
    Quit = 2,
    /// SIGINT (Ctrl-C).
    Interrupt = 3,
}

impl Reason {
    pub const ALL: [Reason; 3] = [Reason::Terminate, Reason::Quit, Reason::Interrupt];

    /// The signal number that produces this reason.
    pub fn signal_number(self) -> i32 {
        match self {
            Reason::Terminate => sys::SIGTERM,
            Reason::Quit => sys::SIGQUIT,
            Reason::Interrupt => sys::SIGINT,
        }
    }

    /// Map a raw signal number to a recognized reason.
    pub fn from_signal(signo: i32) -> Option<Reason> {
        Reason::ALL.into_iter().find(|r| r.signal_number() == signo)
    }

    /// Conventional signal name, used in diagnostics.
    pub fn signal_name(self) -> &'static str {
        match self {
            Reason::Terminate => "SIGTERM",
            Reason::Quit => "SIGQUIT",
            Reason::Interrupt => "SIGINT",
        }
    }

    fn from_raw(raw: u8) -> Option<Reason> {
        match raw {
            1 => Some(Reason::Terminate),
            2 => Some(Reason::Quit),
            3 => Some(Reason::Interrupt),
            _ => None,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reason::Terminate => "terminate",
            Reason::Quit => "quit",
            Reason::Interrupt => "interrupt",
        };
        f.write_str(name)
    }
}

/// Anything the runner can ask "has cancellation been requested?".
pub trait CancelSource {
    /// Non-blocking read of the recorded reason.
    fn requested_reason(&self) -> Option<Reason>;
}

/// Shared, write-once cancellation state.
///
/// Cloning shares the underlying cell.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    state: Arc<AtomicU8>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `reason` unless a reason is already recorded.
    ///
    /// Returns true only for the call that performed the transition.
    pub fn request(&self, reason: Reason) -> bool {
        self.state
            .compare_exchange(NOT_REQUESTED, reason as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn reason(&self) -> Option<Reason> {
        Reason::from_raw(self.state.load(Ordering::SeqCst))
    }

    pub fn is_requested(&self) -> bool {
        self.reason().is_some()
    }
}

impl CancelSource for CancelFlag {
    fn requested_reason(&self) -> Option<Reason> {
        self.reason()
    }
}

/// What happened to a delivered signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// First recognized signal; its reason is now recorded.
    Recorded(Reason),
    /// Recognized, but a reason was already recorded.
    AlreadyRequested { recorded: Reason, ignored: Reason },
    /// Not one of the recognized classes.
    Unknown(i32),
}

/// Errors that prevent the gate from being installed.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Signal streams need a Tokio runtime with the I/O driver enabled.
    #[error("asynchronous signal delivery is not available: no Tokio runtime")]
    NoRuntime,

    #[error("could not set {signal} handler: {source}")]
    Register {
        signal: &'static str,
        #[source]
        source: io::Error,
    },

    /// No way to receive this signal class on the target platform.
    #[error("{signal} cannot be handled on this platform")]
    Unsupported { signal: &'static str },
}

/// Bridges OS signals into a [`CancelFlag`].
///
/// Dropping the gate stops its listener tasks. Tokio keeps the OS-level
/// handlers installed, so signals arriving afterwards are swallowed.
pub struct SignalGate {
    flag: CancelFlag,
    listeners: Vec<JoinHandle<()>>,
}

impl SignalGate {
    /// Register handlers for the recognized and observed signal classes.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn install(flag: CancelFlag) -> Result<Self, SetupError> {
        let runtime = Handle::try_current().map_err(|_| SetupError::NoRuntime)?;
        let mut gate = Self {
            flag,
            listeners: Vec::new(),
        };

        for reason in Reason::ALL {
            gate.listen(&runtime, reason)?;
        }
        gate.observe_unrecognized(&runtime);

        tracing::debug!(listeners = gate.listeners.len(), "Signal handlers installed");
        Ok(gate)
    }

    /// Apply one delivered signal to `flag`.
    ///
    /// This is everything a signal does: a single flag write, or a log line.
    pub fn deliver(flag: &CancelFlag, signo: i32) -> Delivery {
        let Some(reason) = Reason::from_signal(signo) else {
            tracing::info!(signal = signo, "Unknown signal received: {}", signo);
            return Delivery::Unknown(signo);
        };

        if flag.request(reason) {
            tracing::info!(signal = reason.signal_name(), %reason, "Cancellation requested");
            return Delivery::Recorded(reason);
        }

        // request() only fails once a reason is set
        let recorded = flag.reason().unwrap_or(reason);
        tracing::debug!(
            signal = reason.signal_name(),
            recorded = %recorded,
            "Cancellation already requested, ignoring"
        );
        Delivery::AlreadyRequested {
            recorded,
            ignored: reason,
        }
    }

    #[cfg(unix)]
    fn listen(&mut self, runtime: &Handle, reason: Reason) -> Result<(), SetupError> {
        let signo = reason.signal_number();
        let stream = self.register(runtime, signo).map_err(|source| SetupError::Register {
            signal: reason.signal_name(),
            source,
        })?;
        self.spawn(runtime, stream, signo);
        Ok(())
    }

    #[cfg(unix)]
    fn observe_unrecognized(&mut self, runtime: &Handle) {
        for signo in sys::OBSERVED {
            match self.register(runtime, signo) {
                Ok(stream) => self.spawn(runtime, stream, signo),
                Err(e) => tracing::warn!(signal = signo, error = %e, "Could not observe signal"),
            }
        }
    }

    #[cfg(unix)]
    fn register(&self, runtime: &Handle, signo: i32) -> io::Result<tokio::signal::unix::Signal> {
        use tokio::signal::unix::{signal, SignalKind};

        let _guard = runtime.enter();
        signal(SignalKind::from_raw(signo))
    }

    #[cfg(unix)]
    fn spawn(&mut self, runtime: &Handle, mut stream: tokio::signal::unix::Signal, signo: i32) {
        let flag = self.flag.clone();
        self.listeners.push(runtime.spawn(async move {
            while stream.recv().await.is_some() {
                SignalGate::deliver(&flag, signo);
            }
        }));
    }

    // Ctrl-Break stands in for quit; console close and system shutdown for terminate.
    #[cfg(windows)]
    fn listen(&mut self, runtime: &Handle, reason: Reason) -> Result<(), SetupError> {
        use tokio::signal::windows;

        let _guard = runtime.enter();
        let register = |source: io::Error| SetupError::Register {
            signal: reason.signal_name(),
            source,
        };
        let signo = reason.signal_number();

        macro_rules! forward {
            ($gate:ident, $stream:expr) => {{
                let mut stream = $stream;
                let flag = $gate.flag.clone();
                $gate.listeners.push(runtime.spawn(async move {
                    while stream.recv().await.is_some() {
                        SignalGate::deliver(&flag, signo);
                    }
                }));
            }};
        }

        match reason {
            Reason::Interrupt => forward!(self, windows::ctrl_c().map_err(register)?),
            Reason::Quit => forward!(self, windows::ctrl_break().map_err(register)?),
            Reason::Terminate => {
                let close = windows::ctrl_close().map_err(register)?;
                let shutdown = windows::ctrl_shutdown().map_err(register)?;
                forward!(self, close);
                forward!(self, shutdown);
            }
        }
        Ok(())
    }

    #[cfg(windows)]
    fn observe_unrecognized(&mut self, _runtime: &Handle) {}

    #[cfg(not(any(unix, windows)))]
    fn listen(&mut self, _runtime: &Handle, reason: Reason) -> Result<(), SetupError> {
        Err(SetupError::Unsupported {
            signal: reason.signal_name(),
        })
    }

    #[cfg(not(any(unix, windows)))]
    fn observe_unrecognized(&mut self, _runtime: &Handle) {}
}

impl CancelSource for SignalGate {
    fn requested_reason(&self) -> Option<Reason> {
        self.flag.reason()
    }
}

impl Drop for SignalGate {
    fn drop(&mut self) {
        for listener in &self.listeners {
            listener.abort();
        }
    }
}

impl fmt::Debug for SignalGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalGate")
            .field("flag", &self.flag)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
