//! Outliner editing commands.
//!
//! The rich-text surface is not wired yet, so the default command set handles
//! nothing and every command reports `false` ("not handled"), letting key
//! bindings fall through to the host.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::connection::ConnectionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutlinerCommand {
    IndentItem,
    OutdentItem,
    ToggleCollapse,
    MoveItemUp,
    MoveItemDown,
    MoveCursorUp,
    MoveCursorDown,
    SplitItem,
    JoinWithNext,
    JoinWithPrev,
    GoLineStartSmart,
    GoLineEndSmart,
}

impl OutlinerCommand {
    pub const ALL: [OutlinerCommand; 12] = [
        OutlinerCommand::IndentItem,
        OutlinerCommand::OutdentItem,
        OutlinerCommand::ToggleCollapse,
        OutlinerCommand::MoveItemUp,
        OutlinerCommand::MoveItemDown,
        OutlinerCommand::MoveCursorUp,
        OutlinerCommand::MoveCursorDown,
        OutlinerCommand::SplitItem,
        OutlinerCommand::JoinWithNext,
        OutlinerCommand::JoinWithPrev,
        OutlinerCommand::GoLineStartSmart,
        OutlinerCommand::GoLineEndSmart,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OutlinerCommand::IndentItem => "indentItem",
            OutlinerCommand::OutdentItem => "outdentItem",
            OutlinerCommand::ToggleCollapse => "toggleCollapse",
            OutlinerCommand::MoveItemUp => "moveItemUp",
            OutlinerCommand::MoveItemDown => "moveItemDown",
            OutlinerCommand::MoveCursorUp => "moveCursorUp",
            OutlinerCommand::MoveCursorDown => "moveCursorDown",
            OutlinerCommand::SplitItem => "splitItem",
            OutlinerCommand::JoinWithNext => "joinWithNext",
            OutlinerCommand::JoinWithPrev => "joinWithPrev",
            OutlinerCommand::GoLineStartSmart => "goLineStartSmart",
            OutlinerCommand::GoLineEndSmart => "goLineEndSmart",
        }
    }
}

impl fmt::Display for OutlinerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutlinerCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutlinerCommand::ALL
            .iter()
            .copied()
            .find(|command| command.name() == s)
            .ok_or_else(|| format!("Unknown outliner command: {}", s))
    }
}

/// Executes outliner commands against the editor surface
pub trait OutlinerCommands: Send + Sync {
    /// Returns whether the command was handled
    fn execute(&self, command: OutlinerCommand) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCommands;

impl OutlinerCommands for NoopCommands {
    fn execute(&self, command: OutlinerCommand) -> bool {
        tracing::trace!(command = %command, "outliner command not handled");
        false
    }
}

/// What a rendering layer receives from a bound session
pub struct OutlinerContext<'a> {
    pub provider_id: &'a str,
    pub commands: &'a dyn OutlinerCommands,
    pub connection_state: ConnectionState,
    pub read_only: bool,
    pub max_depth: u32,
}

impl fmt::Debug for OutlinerContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutlinerContext")
            .field("provider_id", &self.provider_id)
            .field("connection_state", &self.connection_state)
            .field("read_only", &self.read_only)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}
