//! Scripted reveal of terminal content over virtual time.
//!
//! The [`Typewriter`] never sleeps. Callers move its clock forward with [`Typewriter::advance`]
//! and every due step is applied to a [`TypewriterSink`] in order.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::terminal::line::{LineId, LineKind};
use crate::terminal::scheduler::TimerQueue;
use crate::terminal::script;
use crate::terminal::state::{TerminalAction, TerminalState};

const PROMPT: &str = "$ ";
/// Upper bound for any configured delay: one hour.
pub const MAX_DELAY_MS: u64 = 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Command,
    Output,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypewriterItem {
    pub kind: ItemKind,
    pub text: String,
    #[serde(default)]
    pub pre_delay_ms: u64,
    #[serde(default)]
    pub char_delay_ms: Option<u64>,
}

impl TypewriterItem {
    pub fn command(text: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Command,
            text: text.into(),
            pre_delay_ms: 0,
            char_delay_ms: None,
        }
    }

    pub fn output(text: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Output,
            text: text.into(),
            pre_delay_ms: 0,
            char_delay_ms: None,
        }
    }

    pub fn with_pre_delay(mut self, ms: u64) -> Self {
        self.pre_delay_ms = ms;
        self
    }

    pub fn with_char_delay(mut self, ms: u64) -> Self {
        self.char_delay_ms = Some(ms);
        self
    }

    fn revealed_command(&self) -> String {
        format!("{PROMPT}{}", self.text)
    }

    fn output_lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypewriterTiming {
    pub char_delay_ms: u64,
    pub line_delay_ms: u64,
    pub command_delay_ms: u64,
}

impl TypewriterTiming {
    pub fn validate(&self) -> Result<()> {
        if self.char_delay_ms == 0 {
            bail!("terminal.timing.char_delay_ms must be > 0");
        }
        for (label, value) in [
            ("char_delay_ms", self.char_delay_ms),
            ("line_delay_ms", self.line_delay_ms),
            ("command_delay_ms", self.command_delay_ms),
        ] {
            if value > MAX_DELAY_MS {
                bail!("terminal.timing.{label} must be <= {MAX_DELAY_MS}, got {value}");
            }
        }
        Ok(())
    }
}

impl Default for TypewriterTiming {
    fn default() -> Self {
        script::STOCK_TIMING
    }
}

/// Receives the effects of a running sequence.
pub trait TypewriterSink {
    fn add_line(&mut self, kind: LineKind, text: &str, still_typing: bool) -> LineId;
    fn update_line(&mut self, id: LineId, text: &str, still_typing: bool);
    fn set_typing(&mut self, typing: bool);
    /// Called exactly once per sequence, whether it finished or was skipped.
    fn complete(&mut self);
}

impl TypewriterSink for TerminalState {
    fn add_line(&mut self, kind: LineKind, text: &str, still_typing: bool) -> LineId {
        self.append_line(kind, text, still_typing)
    }

    fn update_line(&mut self, id: LineId, text: &str, still_typing: bool) {
        TerminalState::update_line(self, id, text, still_typing);
    }

    fn set_typing(&mut self, typing: bool) {
        self.dispatch(TerminalAction::SetTyping(typing));
    }

    fn complete(&mut self) {
        self.dispatch(TerminalAction::CompleteTypewriter);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypewriterPhase {
    Idle,
    Running,
    Aborted,
    Completed,
}

impl TypewriterPhase {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Aborted | Self::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Begin(usize),
    TypeChar(usize),
    OutputLine(usize),
}

/// How much of the active item is already on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Pending { item: usize },
    Typing { item: usize, line: LineId, revealed: usize },
    Emitting { item: usize, emitted: usize },
    Shown { item: usize },
}

impl Cursor {
    fn first_unshown(self) -> usize {
        match self {
            Self::Pending { item } => item,
            Self::Typing { item, .. } | Self::Emitting { item, .. } | Self::Shown { item } => {
                item + 1
            }
        }
    }
}

#[derive(Debug)]
pub struct Typewriter {
    sequence: Vec<TypewriterItem>,
    timing: TypewriterTiming,
    reduced_motion: bool,
    phase: TypewriterPhase,
    timers: TimerQueue<Step>,
    cursor: Cursor,
    now_ms: u64,
}

impl Typewriter {
    pub fn new(sequence: Vec<TypewriterItem>, timing: TypewriterTiming, reduced_motion: bool) -> Self {
        Self {
            sequence,
            timing,
            reduced_motion,
            phase: TypewriterPhase::Idle,
            timers: TimerQueue::new(),
            cursor: Cursor::Pending { item: 0 },
            now_ms: 0,
        }
    }

    pub fn phase(&self) -> TypewriterPhase {
        self.phase
    }

    pub fn sequence(&self) -> &[TypewriterItem] {
        &self.sequence
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Starts the sequence. A second call while running, or after finishing, does nothing.
    pub fn run(&mut self, sink: &mut impl TypewriterSink) {
        if self.phase != TypewriterPhase::Idle {
            tracing::debug!(phase = ?self.phase, "typewriter run ignored");
            return;
        }
        self.phase = TypewriterPhase::Running;
        tracing::debug!(
            items = self.sequence.len(),
            reduced_motion = self.reduced_motion,
            "typewriter started"
        );
        let due = self.now_ms.saturating_add(self.pre_delay(0));
        self.timers.schedule(due, Step::Begin(0));
        self.advance_to(self.now_ms, sink);
    }

    pub fn advance(&mut self, elapsed_ms: u64, sink: &mut impl TypewriterSink) {
        self.advance_to(self.now_ms.saturating_add(elapsed_ms), sink);
    }

    pub fn advance_to(&mut self, now_ms: u64, sink: &mut impl TypewriterSink) {
        while let Some((due, step)) = self.timers.pop_due(now_ms) {
            self.now_ms = due;
            self.apply(step, sink);
        }
        self.now_ms = self.now_ms.max(now_ms);
    }

    /// Shows everything that is left at once and finishes the sequence.
    ///
    /// Returns `false` when the sequence had already finished.
    pub fn skip(&mut self, sink: &mut impl TypewriterSink) -> bool {
        if self.phase.is_finished() {
            return false;
        }
        let cancelled = self.timers.cancel_all();

        match self.cursor {
            Cursor::Typing { item, line, .. } => {
                let text = self.sequence[item].revealed_command();
                sink.update_line(line, &text, false);
            }
            Cursor::Emitting { item, emitted } => {
                for text in self.sequence[item].output_lines().skip(emitted) {
                    sink.add_line(LineKind::Output, text, false);
                }
            }
            Cursor::Pending { .. } | Cursor::Shown { .. } => {}
        }
        let first = self.cursor.first_unshown();
        for item in self.sequence.iter().skip(first) {
            show_whole(item, sink);
        }

        self.cursor = Cursor::Shown {
            item: self.sequence.len(),
        };
        self.phase = TypewriterPhase::Aborted;
        sink.set_typing(false);
        sink.complete();
        tracing::debug!(cancelled, flushed_from = first, "typewriter skipped to end");
        true
    }

    /// Cancels pending steps without revealing anything further. A torn-down sequence never runs.
    pub fn teardown(&mut self) {
        let cancelled = self.timers.cancel_all();
        if !self.phase.is_finished() {
            self.phase = TypewriterPhase::Aborted;
        }
        if cancelled > 0 {
            tracing::debug!(cancelled, "typewriter torn down");
        }
    }

    fn pre_delay(&self, item: usize) -> u64 {
        if self.reduced_motion {
            return 0;
        }
        self.sequence.get(item).map_or(0, |item| item.pre_delay_ms)
    }

    fn char_delay(&self, item: usize) -> u64 {
        self.sequence[item]
            .char_delay_ms
            .unwrap_or(self.timing.char_delay_ms)
    }

    fn schedule_next_item(&mut self, after: usize, gap_ms: u64) {
        let next = after + 1;
        let due = self
            .now_ms
            .saturating_add(gap_ms)
            .saturating_add(self.pre_delay(next));
        self.timers.schedule(due, Step::Begin(next));
    }

    fn apply(&mut self, step: Step, sink: &mut impl TypewriterSink) {
        match step {
            Step::Begin(item) => self.begin(item, sink),
            Step::TypeChar(item) => self.type_char(item, sink),
            Step::OutputLine(item) => self.emit_line(item, sink),
        }
    }

    fn begin(&mut self, index: usize, sink: &mut impl TypewriterSink) {
        let Some(item) = self.sequence.get(index) else {
            self.finish(sink);
            return;
        };

        match item.kind {
            ItemKind::Command => {
                sink.set_typing(true);
                if self.reduced_motion || item.text.is_empty() {
                    sink.add_line(LineKind::Command, &item.revealed_command(), false);
                    sink.set_typing(false);
                    self.cursor = Cursor::Shown { item: index };
                    self.schedule_next_item(index, self.timing.command_delay_ms);
                } else {
                    let line = sink.add_line(LineKind::Command, PROMPT, true);
                    self.cursor = Cursor::Typing {
                        item: index,
                        line,
                        revealed: 0,
                    };
                    let due = self.now_ms.saturating_add(self.char_delay(index));
                    self.timers.schedule(due, Step::TypeChar(index));
                }
            }
            ItemKind::Output => {
                if self.reduced_motion {
                    for text in item.output_lines() {
                        sink.add_line(LineKind::Output, text, false);
                    }
                    self.cursor = Cursor::Shown { item: index };
                    self.schedule_next_item(index, 0);
                } else {
                    self.cursor = Cursor::Emitting {
                        item: index,
                        emitted: 0,
                    };
                    self.emit_line(index, sink);
                }
            }
        }
    }

    fn type_char(&mut self, index: usize, sink: &mut impl TypewriterSink) {
        let Cursor::Typing { item, line, revealed } = self.cursor else {
            return;
        };
        debug_assert_eq!(item, index);
        let revealed = revealed + 1;
        let command = &self.sequence[index].text;
        let total = command.chars().count();
        let text = format!("{PROMPT}{}", command.chars().take(revealed).collect::<String>());

        if revealed >= total {
            sink.update_line(line, &text, false);
            sink.set_typing(false);
            self.cursor = Cursor::Shown { item: index };
            self.schedule_next_item(index, self.timing.command_delay_ms);
        } else {
            sink.update_line(line, &text, true);
            self.cursor = Cursor::Typing {
                item: index,
                line,
                revealed,
            };
            let due = self.now_ms.saturating_add(self.char_delay(index));
            self.timers.schedule(due, Step::TypeChar(index));
        }
    }

    fn emit_line(&mut self, index: usize, sink: &mut impl TypewriterSink) {
        let Cursor::Emitting { item, emitted } = self.cursor else {
            return;
        };
        debug_assert_eq!(item, index);
        let lines = self.sequence[index].output_lines().collect::<Vec<_>>();
        if let Some(text) = lines.get(emitted) {
            sink.add_line(LineKind::Output, text, false);
        }
        let emitted = emitted + 1;

        if emitted >= lines.len() {
            self.cursor = Cursor::Shown { item: index };
            self.schedule_next_item(index, self.timing.line_delay_ms);
        } else {
            self.cursor = Cursor::Emitting {
                item: index,
                emitted,
            };
            let due = self.now_ms.saturating_add(self.timing.line_delay_ms);
            self.timers.schedule(due, Step::OutputLine(index));
        }
    }

    fn finish(&mut self, sink: &mut impl TypewriterSink) {
        self.phase = TypewriterPhase::Completed;
        sink.set_typing(false);
        sink.complete();
        tracing::debug!(at_ms = self.now_ms, "typewriter completed");
    }
}

fn show_whole(item: &TypewriterItem, sink: &mut impl TypewriterSink) {
    match item.kind {
        ItemKind::Command => {
            sink.add_line(LineKind::Command, &item.revealed_command(), false);
        }
        ItemKind::Output => {
            for text in item.output_lines() {
                sink.add_line(LineKind::Output, text, false);
            }
        }
    }
}
