use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LineId(u64);

impl LineId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Command,
    Output,
    Error,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminalLine {
    pub id: LineId,
    pub kind: LineKind,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub still_typing: bool,
}
