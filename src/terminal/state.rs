use std::collections::VecDeque;

use chrono::Utc;
use serde::Serialize;

use crate::terminal::line::{LineId, LineKind, TerminalLine};

pub const COMMAND_HISTORY_CAP: usize = 50;
pub const DEFAULT_DIRECTORY: &str = "~/pointlabs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalMode {
    Scripted,
    Interactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    /// Toward older entries.
    Up,
    /// Toward newer entries, ending at an empty buffer.
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TerminalAction {
    AppendLine {
        kind: LineKind,
        text: String,
        still_typing: bool,
    },
    UpdateLine {
        id: LineId,
        text: String,
        still_typing: bool,
    },
    SetInput(String),
    SetTyping(bool),
    PushCommandHistory(String),
    NavigateHistory(HistoryDirection),
    Clear,
    CompleteTypewriter,
}

/// Everything one terminal instance shows and remembers.
#[derive(Debug, Clone, Serialize)]
pub struct TerminalState {
    mode: TerminalMode,
    history: Vec<TerminalLine>,
    input_buffer: String,
    command_history: VecDeque<String>,
    command_history_cursor: Option<usize>,
    current_directory: String,
    typewriter_complete: bool,
    is_typing: bool,
    #[serde(skip)]
    next_line_id: u64,
}

impl TerminalState {
    pub fn new(current_directory: impl Into<String>) -> Self {
        Self {
            mode: TerminalMode::Scripted,
            history: Vec::new(),
            input_buffer: String::new(),
            command_history: VecDeque::with_capacity(COMMAND_HISTORY_CAP),
            command_history_cursor: None,
            current_directory: current_directory.into(),
            typewriter_complete: false,
            is_typing: false,
            next_line_id: 0,
        }
    }

    pub fn mode(&self) -> TerminalMode {
        self.mode
    }

    pub fn history(&self) -> &[TerminalLine] {
        &self.history
    }

    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    /// Most recent first.
    pub fn command_history(&self) -> impl ExactSizeIterator<Item = &str> {
        self.command_history.iter().map(String::as_str)
    }

    /// `None` while the user is not browsing history.
    pub fn command_history_cursor(&self) -> Option<usize> {
        self.command_history_cursor
    }

    pub fn current_directory(&self) -> &str {
        &self.current_directory
    }

    pub fn typewriter_complete(&self) -> bool {
        self.typewriter_complete
    }

    pub fn input_enabled(&self) -> bool {
        self.mode == TerminalMode::Interactive
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing
    }

    /// Applies one action. Returns the id of the line when the action appended one.
    pub fn dispatch(&mut self, action: TerminalAction) -> Option<LineId> {
        match action {
            TerminalAction::AppendLine {
                kind,
                text,
                still_typing,
            } => return Some(self.append_line(kind, text, still_typing)),
            TerminalAction::UpdateLine {
                id,
                text,
                still_typing,
            } => {
                self.update_line(id, text, still_typing);
            }
            TerminalAction::SetInput(value) => self.set_input(value),
            TerminalAction::SetTyping(typing) => self.is_typing = typing,
            TerminalAction::PushCommandHistory(command) => self.push_command_history(command),
            TerminalAction::NavigateHistory(direction) => self.navigate_history(direction),
            TerminalAction::Clear => self.history.clear(),
            TerminalAction::CompleteTypewriter => self.complete_typewriter(),
        }
        None
    }

    pub fn append_line(
        &mut self,
        kind: LineKind,
        text: impl Into<String>,
        still_typing: bool,
    ) -> LineId {
        let id = LineId::new(self.next_line_id);
        self.next_line_id += 1;
        self.history.push(TerminalLine {
            id,
            kind,
            text: text.into(),
            created_at: Utc::now(),
            still_typing,
        });
        id
    }

    /// Rewrites the newest line while it is still being typed. Any other target is refused.
    pub fn update_line(&mut self, id: LineId, text: impl Into<String>, still_typing: bool) -> bool {
        match self.history.last_mut() {
            Some(line) if line.id == id && line.still_typing => {
                line.text = text.into();
                line.still_typing = still_typing;
                true
            }
            _ => {
                tracing::debug!(%id, "ignored update of a settled or non-tail line");
                false
            }
        }
    }

    pub fn set_input(&mut self, value: impl Into<String>) {
        if !self.input_enabled() {
            return;
        }
        self.input_buffer = value.into();
        self.command_history_cursor = None;
    }

    pub fn push_command_history(&mut self, command: impl Into<String>) {
        self.command_history.push_front(command.into());
        self.command_history.truncate(COMMAND_HISTORY_CAP);
        self.command_history_cursor = None;
        self.input_buffer.clear();
    }

    pub fn navigate_history(&mut self, direction: HistoryDirection) {
        if !self.input_enabled() || self.command_history.is_empty() {
            return;
        }
        let oldest = self.command_history.len() - 1;
        let next = match (direction, self.command_history_cursor) {
            (HistoryDirection::Up, None) => Some(0),
            (HistoryDirection::Up, Some(index)) => Some((index + 1).min(oldest)),
            (HistoryDirection::Down, None) | (HistoryDirection::Down, Some(0)) => None,
            (HistoryDirection::Down, Some(index)) => Some(index - 1),
        };

        self.command_history_cursor = next;
        self.input_buffer = match next {
            Some(index) => self.command_history[index].clone(),
            None => String::new(),
        };
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    fn complete_typewriter(&mut self) {
        if self.typewriter_complete {
            return;
        }
        self.typewriter_complete = true;
        self.is_typing = false;
        self.mode = TerminalMode::Interactive;
        tracing::debug!("terminal switched to interactive mode");
    }
}

impl Default for TerminalState {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        HistoryDirection, TerminalAction, TerminalMode, TerminalState, COMMAND_HISTORY_CAP,
    };
    use crate::terminal::line::LineKind;

    fn interactive() -> TerminalState {
        let mut state = TerminalState::default();
        state.dispatch(TerminalAction::CompleteTypewriter);
        state
    }

    #[test]
    fn starts_scripted_with_input_disabled() {
        let mut state = TerminalState::default();
        assert_eq!(state.mode(), TerminalMode::Scripted);
        assert!(!state.typewriter_complete());

        state.set_input("ls");
        assert_eq!(state.input_buffer(), "");
    }

    #[test]
    fn completion_is_one_way() {
        let mut state = interactive();
        assert_eq!(state.mode(), TerminalMode::Interactive);
        assert!(state.typewriter_complete());
        state.dispatch(TerminalAction::CompleteTypewriter);
        assert_eq!(state.mode(), TerminalMode::Interactive);
    }

    #[test]
    fn only_the_typing_tail_line_can_be_updated() {
        let mut state = TerminalState::default();
        let settled = state.append_line(LineKind::Output, "done", false);
        assert!(!state.update_line(settled, "changed", false));

        let typing = state.append_line(LineKind::Command, "$ ", true);
        assert!(state.update_line(typing, "$ l", true));
        assert!(state.update_line(typing, "$ ls", false));
        assert!(!state.update_line(typing, "$ ls -la", false));

        let texts = state
            .history()
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(texts, vec!["done", "$ ls"]);
    }

    #[test]
    fn appended_lines_get_unique_ids() {
        let mut state = TerminalState::default();
        let first = state.append_line(LineKind::System, "a", false);
        state.clear();
        let second = state.append_line(LineKind::System, "b", false);
        assert_ne!(first, second);
    }

    #[test]
    fn history_ring_is_capped_most_recent_first() {
        let mut state = interactive();
        for index in 0..(COMMAND_HISTORY_CAP + 25) {
            state.push_command_history(format!("echo {index}"));
        }
        assert_eq!(state.command_history().len(), COMMAND_HISTORY_CAP);
        assert_eq!(state.command_history().next(), Some("echo 74"));
        assert_eq!(state.command_history().last(), Some("echo 25"));
    }

    #[test]
    fn navigation_is_bounded_at_both_ends() {
        let mut state = interactive();
        state.push_command_history("first");
        state.push_command_history("second");

        state.navigate_history(HistoryDirection::Up);
        assert_eq!(state.input_buffer(), "second");
        state.navigate_history(HistoryDirection::Up);
        assert_eq!(state.input_buffer(), "first");
        state.navigate_history(HistoryDirection::Up);
        assert_eq!(state.input_buffer(), "first");
        assert_eq!(state.command_history_cursor(), Some(1));

        state.navigate_history(HistoryDirection::Down);
        assert_eq!(state.input_buffer(), "second");
        state.navigate_history(HistoryDirection::Down);
        assert_eq!(state.input_buffer(), "");
        assert_eq!(state.command_history_cursor(), None);
        state.navigate_history(HistoryDirection::Down);
        assert_eq!(state.command_history_cursor(), None);
    }

    #[test]
    fn typing_resets_navigation() {
        let mut state = interactive();
        state.push_command_history("help");
        state.navigate_history(HistoryDirection::Up);
        state.set_input("hel");
        assert_eq!(state.command_history_cursor(), None);
        assert_eq!(state.input_buffer(), "hel");
    }

    #[test]
    fn navigation_with_empty_history_is_a_no_op() {
        let mut state = interactive();
        state.set_input("draft");
        state.navigate_history(HistoryDirection::Up);
        assert_eq!(state.input_buffer(), "draft");
    }
}
