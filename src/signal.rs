//! Broken-pipe emulation
//!
//! The host never delivers SIGPIPE, so a write to a closed pipe just fails.
//! Every write path hands its failure to [`check_write`], which looks up the
//! disposition registered for [`Signal::Pipe`] and either exits the process
//! the way an unhandled SIGPIPE would, or reports `BrokenPipe`.

use std::io;
use std::sync::Mutex;

use tracing::debug;

/// Signals the shim emulates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Pipe,
}

impl Signal {
    /// Conventional signal number
    pub fn number(self) -> i32 {
        match self {
            Signal::Pipe => 13,
        }
    }

    /// Exit status of a process killed by this signal
    pub fn exit_status(self) -> i32 {
        128 + self.number()
    }
}

/// Registered handling for an emulated signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposition {
    /// Terminate the process
    #[default]
    Default,
    /// Surface the failure as an error
    Ignore,
}

#[derive(Debug, Default)]
struct SignalTable {
    pipe: Disposition,
}

impl SignalTable {
    fn slot(&mut self, signal: Signal) -> &mut Disposition {
        match signal {
            Signal::Pipe => &mut self.pipe,
        }
    }
}

static SIGNALS: Mutex<SignalTable> = Mutex::new(SignalTable {
    pipe: Disposition::Default,
});

fn table() -> std::sync::MutexGuard<'static, SignalTable> {
    SIGNALS.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Register `disposition` for `signal`, returning the previous one
pub fn signal(signal: Signal, disposition: Disposition) -> Disposition {
    std::mem::replace(table().slot(signal), disposition)
}

pub fn disposition(signal: Signal) -> Disposition {
    *table().slot(signal)
}

#[cfg(windows)]
mod codes {
    pub const ERROR_BROKEN_PIPE: i32 = 109;
    pub const ERROR_NO_DATA: i32 = 232;
}

/// Whether `err` means the reading end of the destination went away.
///
/// `ERROR_NO_DATA` only counts when the destination is a pipe.
pub fn is_pipe_closed(err: &io::Error, destination_is_pipe: impl FnOnce() -> bool) -> bool {
    #[cfg(windows)]
    {
        match err.raw_os_error() {
            Some(codes::ERROR_BROKEN_PIPE) => true,
            Some(codes::ERROR_NO_DATA) => destination_is_pipe(),
            _ => false,
        }
    }
    #[cfg(not(windows))]
    {
        let _ = destination_is_pipe;
        err.kind() == io::ErrorKind::BrokenPipe
    }
}

/// What to do about a failed write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Exit with this status
    Terminate(i32),
    /// Return a `BrokenPipe` error
    BrokenPipe,
    /// Not a pipe failure; return the error untouched
    Propagate,
}

pub fn classify(pipe_closed: bool, disposition: Disposition) -> Outcome {
    match (pipe_closed, disposition) {
        (false, _) => Outcome::Propagate,
        (true, Disposition::Default) => Outcome::Terminate(Signal::Pipe.exit_status()),
        (true, Disposition::Ignore) => Outcome::BrokenPipe,
    }
}

/// Route a write failure through the registered SIGPIPE disposition
pub fn check_write<T>(
    result: io::Result<T>,
    destination_is_pipe: impl FnOnce() -> bool,
) -> io::Result<T> {
    let err = match result {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    let closed = is_pipe_closed(&err, destination_is_pipe);
    match classify(closed, disposition(Signal::Pipe)) {
        Outcome::Propagate => Err(err),
        Outcome::BrokenPipe => {
            debug!("Write to closed pipe: {}", err);
            Err(io::Error::new(io::ErrorKind::BrokenPipe, err))
        }
        Outcome::Terminate(status) => {
            debug!("Write to closed pipe, exiting with {}", status);
            std::process::exit(status)
        }
    }
}

/// Run `f` with `disposition` registered, one caller at a time
#[cfg(test)]
pub(crate) fn with_disposition<T>(
    sig: Signal,
    disposition: Disposition,
    f: impl FnOnce() -> T,
) -> T {
    static SERIAL: Mutex<()> = Mutex::new(());
    let _serial = SERIAL.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    let previous = signal(sig, disposition);
    let result = f();
    signal(sig, previous);
    result
}
