use crate::terminal::commands::{CommandOutcome, CommandRegistry};
use crate::terminal::line::LineKind;
use crate::terminal::script;
use crate::terminal::state::{HistoryDirection, TerminalAction, TerminalMode, TerminalState};
use crate::terminal::typewriter::{Typewriter, TypewriterItem, TypewriterPhase, TypewriterTiming};

/// Delay before the window chrome appears after the terminal is mounted.
pub const CHROME_REVEAL_MS: u64 = script::CHROME_DELAY_MS * 10;
/// Delay before the intro script starts typing.
pub const SCRIPT_START_MS: u64 = CHROME_REVEAL_MS + 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Enter,
    Up,
    Down,
    Tab,
    Backspace,
    CtrlC,
    CtrlL,
    Char(char),
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub reduced_motion: bool,
    pub timing: TypewriterTiming,
    pub sequence: Vec<TypewriterItem>,
    pub current_directory: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            reduced_motion: false,
            timing: TypewriterTiming::default(),
            sequence: script::intro_sequence(),
            current_directory: crate::terminal::state::DEFAULT_DIRECTORY.to_owned(),
        }
    }
}

/// One mounted terminal: its state, its intro script, and its command set.
#[derive(Debug)]
pub struct TerminalSession {
    state: TerminalState,
    typewriter: Typewriter,
    registry: CommandRegistry,
    reduced_motion: bool,
    now_ms: u64,
    started: bool,
    chrome_visible: bool,
    mounted: bool,
}

impl TerminalSession {
    pub fn new(options: SessionOptions, registry: CommandRegistry) -> Self {
        Self {
            state: TerminalState::new(options.current_directory),
            typewriter: Typewriter::new(options.sequence, options.timing, options.reduced_motion),
            registry,
            reduced_motion: options.reduced_motion,
            now_ms: 0,
            started: false,
            chrome_visible: false,
            mounted: true,
        }
    }

    pub fn state(&self) -> &TerminalState {
        &self.state
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn typewriter_phase(&self) -> TypewriterPhase {
        self.typewriter.phase()
    }

    pub fn chrome_visible(&self) -> bool {
        self.chrome_visible
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Begins the intro. Reduced motion reveals the whole script at once.
    pub fn start(&mut self) {
        if self.started || !self.mounted {
            return;
        }
        self.started = true;
        if self.reduced_motion {
            self.chrome_visible = true;
            self.typewriter.skip(&mut self.state);
        } else {
            self.tick(0);
        }
    }

    /// Moves the session clock forward.
    pub fn tick(&mut self, elapsed_ms: u64) {
        if !self.started || !self.mounted {
            return;
        }
        self.now_ms = self.now_ms.saturating_add(elapsed_ms);
        if !self.chrome_visible && self.now_ms >= CHROME_REVEAL_MS {
            self.chrome_visible = true;
        }
        if self.typewriter.phase() == TypewriterPhase::Idle && self.now_ms >= SCRIPT_START_MS {
            self.typewriter.advance_to(SCRIPT_START_MS, &mut self.state);
            self.typewriter.run(&mut self.state);
        }
        self.typewriter.advance_to(self.now_ms, &mut self.state);
    }

    /// Session time at which something will next change on its own, if anything.
    pub fn next_deadline(&self) -> Option<u64> {
        if !self.started || !self.mounted {
            return None;
        }
        if !self.chrome_visible {
            return Some(CHROME_REVEAL_MS);
        }
        if self.typewriter.phase() == TypewriterPhase::Idle {
            return Some(SCRIPT_START_MS);
        }
        self.typewriter.next_deadline()
    }

    /// Jumps to the end of the intro. Only honored while the intro is still playing.
    pub fn request_skip(&mut self) -> bool {
        if !self.mounted
            || self.state.mode() != TerminalMode::Scripted
            || self.state.typewriter_complete()
        {
            return false;
        }
        self.chrome_visible = true;
        self.typewriter.skip(&mut self.state)
    }

    /// Runs one command line. Returns `None` when the input was blank or input is disabled.
    pub fn submit(&mut self, input: &str) -> Option<CommandOutcome> {
        if !self.state.input_enabled() {
            return None;
        }
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        self.state.append_line(LineKind::Command, format!("$ {trimmed}"), false);
        self.state
            .dispatch(TerminalAction::PushCommandHistory(trimmed.to_owned()));

        let outcome = self.registry.execute(trimmed, &self.state);
        if outcome.clear_requested {
            self.state.dispatch(TerminalAction::Clear);
            return Some(outcome);
        }
        let kind = if outcome.is_error {
            LineKind::Error
        } else {
            LineKind::Output
        };
        for line in &outcome.output_lines {
            self.state.append_line(kind, line.as_str(), false);
        }
        Some(outcome)
    }

    /// Applies one key press to the input line. Returns the outcome when a command ran.
    pub fn handle_key(&mut self, key: KeyInput) -> Option<CommandOutcome> {
        if !self.state.input_enabled() {
            return None;
        }
        match key {
            KeyInput::Enter => {
                let input = self.state.input_buffer().to_owned();
                return self.submit(&input);
            }
            KeyInput::Up => self
                .state
                .dispatch(TerminalAction::NavigateHistory(HistoryDirection::Up)),
            KeyInput::Down => self
                .state
                .dispatch(TerminalAction::NavigateHistory(HistoryDirection::Down)),
            KeyInput::CtrlC => self.state.dispatch(TerminalAction::SetInput(String::new())),
            KeyInput::CtrlL => self.state.dispatch(TerminalAction::Clear),
            KeyInput::Tab => {
                let input = self.state.input_buffer();
                let completion = match self.registry.suggestions(input).as_slice() {
                    [only] if !input.trim().is_empty() => Some(format!("{only} ")),
                    _ => None,
                };
                match completion {
                    Some(value) => self.state.dispatch(TerminalAction::SetInput(value)),
                    None => None,
                }
            }
            KeyInput::Backspace => {
                let mut value = self.state.input_buffer().to_owned();
                value.pop();
                self.state.dispatch(TerminalAction::SetInput(value))
            }
            KeyInput::Char(ch) if !ch.is_control() => {
                let mut value = self.state.input_buffer().to_owned();
                value.push(ch);
                self.state.dispatch(TerminalAction::SetInput(value))
            }
            KeyInput::Char(_) => None,
        };
        None
    }

    /// The fixed command chips offered under the prompt.
    pub fn suggested_commands(&self) -> &'static [&'static str] {
        &script::SUGGESTED_COMMANDS
    }

    /// Cancels pending intro timers. Nothing further changes after this.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.typewriter.teardown();
        self.mounted = false;
        tracing::debug!(at_ms = self.now_ms, "terminal session unmounted");
    }
}

impl Default for TerminalSession {
    fn default() -> Self {
        Self::new(SessionOptions::default(), CommandRegistry::default())
    }
}
