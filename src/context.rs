//! Process-wide console context
//!
//! The console is one shared device, so attribute state, the codepage map
//! and the scratch buffer live in a single [`Context`]. The process
//! instance is built on first use behind a mutex; [`init`] may configure
//! it beforehand.

use std::cell::Cell;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::{debug, info};

use crate::codepage::CodepageMap;
use crate::config::Config;
use crate::console::{Attr, Console, Stream, SystemConsole};

/// Presence of this variable disables escape interpretation
pub const SKIP_EMULATION_VAR: &str = "VTSHIM_SKIP_ANSI_EMULATION";

/// Startup options for the context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Write escape sequences literally instead of interpreting them
    pub skip_emulation: bool,
    /// Switch a CP850 console to CP858 so the euro sign renders
    pub euro_codepage: bool,
}

impl Options {
    /// Defaults plus the environment override
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            skip_emulation: config.emulation.skip_ansi_emulation,
            euro_codepage: config.emulation.euro_codepage,
        }
        .with_env()
    }

    fn with_env(mut self) -> Self {
        if std::env::var_os(SKIP_EMULATION_VAR).is_some() {
            self.skip_emulation = true;
        }
        self
    }
}

/// Console state shared by every pump
pub struct Context<C> {
    pub(crate) console: C,
    /// Attribute captured at startup; reset target and erase fill
    pub(crate) base: Attr,
    pub(crate) current: Attr,
    pub(crate) reverse: bool,
    pub(crate) codepage: CodepageMap,
    skip_emulation: bool,
    /// Reused across writes, only ever grows
    pub(crate) scratch: Vec<u8>,
}

impl<C: Console> Context<C> {
    pub fn new(mut console: C, options: Options) -> Self {
        if options.euro_codepage
            && console.input_codepage() == 850
            && console.output_codepage() == 850
        {
            if let Err(e) = console.set_codepages(858) {
                debug!("Could not switch console to CP858: {}", e);
            }
        }

        let base = match console.screen_info() {
            Ok(info) => info.attributes,
            Err(e) => {
                debug!("No screen buffer, assuming plain attribute: {}", e);
                Attr::PLAIN
            }
        };
        let codepage = CodepageMap::for_console(console.output_codepage());

        info!(
            "Console context ready: attribute={:#06x}, codepage={:?}, skip_emulation={}",
            base.bits(),
            codepage.codepage(),
            options.skip_emulation
        );

        Self {
            console,
            base,
            current: base,
            reverse: false,
            codepage,
            skip_emulation: options.skip_emulation,
            scratch: Vec::new(),
        }
    }

    pub fn is_console(&self, stream: Stream) -> bool {
        self.console.is_console(stream)
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    pub fn base_attribute(&self) -> Attr {
        self.base
    }

    pub fn current_attribute(&self) -> Attr {
        self.current
    }

    pub fn is_reversed(&self) -> bool {
        self.reverse
    }

    /// Attribute as written to the console, after applying reverse video
    pub fn effective_attribute(&self) -> Attr {
        if self.reverse {
            self.current.reversed()
        } else {
            self.current
        }
    }

    pub fn codepage(&self) -> &CodepageMap {
        &self.codepage
    }

    pub fn skip_emulation(&self) -> bool {
        self.skip_emulation
    }

    pub fn scratch_capacity(&self) -> usize {
        self.scratch.capacity()
    }
}

static CONTEXT: OnceLock<Mutex<Context<SystemConsole>>> = OnceLock::new();

thread_local! {
    static HELD: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as inside the context until dropped
struct HeldMark {
    previous: bool,
}

impl HeldMark {
    fn set() -> Self {
        Self {
            previous: HELD.with(|held| held.replace(true)),
        }
    }
}

impl Drop for HeldMark {
    fn drop(&mut self) {
        HELD.with(|held| held.set(self.previous));
    }
}

/// Locked process context
pub struct ContextGuard {
    // Unlocks before the mark clears
    inner: MutexGuard<'static, Context<SystemConsole>>,
    _mark: HeldMark,
}

impl Deref for ContextGuard {
    type Target = Context<SystemConsole>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ContextGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

/// Build the process context with explicit options.
///
/// Returns `false` if the context already exists; it is then left as is.
pub fn init(options: Options) -> bool {
    let _mark = HeldMark::set();
    let mut fresh = false;
    CONTEXT.get_or_init(|| {
        fresh = true;
        Mutex::new(Context::new(SystemConsole::open(), options))
    });
    fresh
}

/// Lock the process context, building it from the environment on first use.
///
/// The lock is not reentrant: calling this again on a thread that already
/// holds the guard deadlocks. Code that may run inside a pump (a tracing
/// subscriber, for one) should use [`try_global`].
pub fn global() -> ContextGuard {
    let mark = HeldMark::set();
    let inner = CONTEXT
        .get_or_init(|| Mutex::new(Context::new(SystemConsole::open(), Options::from_env())))
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    ContextGuard { inner, _mark: mark }
}

/// Like [`global`], but `None` if this thread is already inside the context
pub fn try_global() -> Option<ContextGuard> {
    if held_by_current_thread() {
        None
    } else {
        Some(global())
    }
}

pub fn held_by_current_thread() -> bool {
    HELD.with(Cell::get)
}
