//! Simulated shell: a scripted intro followed by an interactive prompt.

pub mod commands;
pub mod line;
pub mod scheduler;
pub mod script;
pub mod session;
pub mod state;
pub mod typewriter;
pub mod vfs;

pub use commands::{CommandOutcome, CommandRegistry, CommandSpec};
pub use line::{LineId, LineKind, TerminalLine};
pub use session::{KeyInput, SessionOptions, TerminalSession};
pub use state::{HistoryDirection, TerminalAction, TerminalMode, TerminalState};
pub use typewriter::{
    ItemKind, Typewriter, TypewriterItem, TypewriterPhase, TypewriterSink, TypewriterTiming,
};
pub use vfs::VirtualFileSystem;
