//! Command object resolution.
//!
//! The command object receives bound request parameters. By default it is
//! the page's own handler; a page may declare a separate object instead.
//! Resolution happens at most once per page instance.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

/// A command object shared outside its page.
pub type SharedCommand = Arc<Mutex<Box<dyn Any + Send>>>;

/// Identity of one resolved command object, used to track its resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandKey(u64);

impl CommandKey {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for CommandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd-{}", self.0)
    }
}

/// Where bound parameters go.
#[derive(Clone)]
pub enum CommandTarget {
    /// Bind into the page handler itself.
    Page,
    /// Bind into a separate object.
    Alternate(SharedCommand),
}

impl CommandTarget {
    /// Wrap a value as an alternate command object.
    pub fn alternate<T: Any + Send>(value: T) -> Self {
        CommandTarget::Alternate(Arc::new(Mutex::new(Box::new(value))))
    }
}

impl fmt::Debug for CommandTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandTarget::Page => f.write_str("Page"),
            CommandTarget::Alternate(_) => f.write_str("Alternate(..)"),
        }
    }
}

/// A command object after resolution.
#[derive(Debug, Clone)]
pub struct ResolvedCommand {
    key: CommandKey,
    target: CommandTarget,
}

impl ResolvedCommand {
    fn new(target: CommandTarget) -> Self {
        Self {
            key: CommandKey::next(),
            target,
        }
    }

    /// Resource tracking key.
    pub fn key(&self) -> CommandKey {
        self.key
    }

    /// Binding target.
    pub fn target(&self) -> &CommandTarget {
        &self.target
    }

    /// Check whether two resolutions refer to the same command object.
    pub fn same_as(&self, other: &ResolvedCommand) -> bool {
        self.key == other.key
            && match (&self.target, &other.target) {
                (CommandTarget::Page, CommandTarget::Page) => true,
                (CommandTarget::Alternate(a), CommandTarget::Alternate(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
    }
}

/// Single-flight holder for a page's command object.
///
/// The first caller runs the resolution routine; concurrent callers block
/// until it finishes and then observe the same result. The routine never
/// runs twice.
#[derive(Debug, Default)]
pub struct CommandSlot {
    cell: OnceLock<ResolvedCommand>,
}

impl CommandSlot {
    /// Create an unresolved slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the command object, running `determine` only on first use.
    pub fn resolve(&self, determine: impl FnOnce() -> CommandTarget) -> &ResolvedCommand {
        self.cell.get_or_init(|| ResolvedCommand::new(determine()))
    }

    /// The resolved command object, if resolution already happened.
    pub fn get(&self) -> Option<&ResolvedCommand> {
        self.cell.get()
    }

    /// Check whether resolution already happened.
    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }
}
