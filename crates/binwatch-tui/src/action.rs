//! Every UI state transition is an [`Action`].

use std::fmt;
use std::sync::Arc;

use binwatch_core::{BackendStatus, EntityId, ManualAction, MarkerDiff, PollerState, Snapshot};

use crate::screen::ScreenId;

/// Severity of a status-bar message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

/// A transient message shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: StatusLevel::Info,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: StatusLevel::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: StatusLevel::Error,
        }
    }
}

/// Actions that need a y/n before they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    ResetDemoData,
}

impl fmt::Display for ConfirmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResetDemoData => f.write_str("Reset all bins to fresh demo data?"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    ToggleHelp,
    /// Jump to the map with this bin selected.
    LocateBin(EntityId),

    // ── Monitor feed ──────────────────────────────────────────────
    SnapshotUpdated(Arc<Snapshot>),
    MarkersChanged(Arc<MarkerDiff>),
    PollerStateChanged(PollerState),
    PollFailed(String),
    ActionFinished {
        action: ManualAction,
        outcome: Result<String, String>,
    },
    BackendStatusLoaded(Result<BackendStatus, String>),

    // ── Requests to the monitor ───────────────────────────────────
    RequestRefresh,
    RequestResetDemo,
    RequestSimulate,
    RequestMarkRead(EntityId),
    RequestBackendStatus,

    // ── Confirm dialog ────────────────────────────────────────────
    ShowConfirm(ConfirmAction),
    ConfirmYes,
    ConfirmNo,

    // ── Status bar ────────────────────────────────────────────────
    Status(StatusMessage),
}
