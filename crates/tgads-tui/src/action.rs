//! Action enum — every user intent the App knows how to apply.

use tgads_core::ads::AdField;
use tgads_core::catalog::SortField;
use tgads_core::{ChannelId, MetaField};

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    FilterBar,
    ChannelTable,
    SelectionPane,
    AdPane,
    ValuePicker,
    HelpOverlay,
}

/// Components produce Actions; the App applies them.
#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    ToggleHelp,

    // ── Focus ────────────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),

    // ── Text entry ───────────────────────────────────────────────────────────
    OpenInput,
    CloseInput,

    // ── Table navigation ─────────────────────────────────────────────────────
    CursorMove(isize),
    CursorTo(usize),
    CursorLast,
    Page(bool),
    Scroll(i64),

    // ── View derivation ──────────────────────────────────────────────────────
    Search(String),
    SortBy(SortField),
    ClearSort,

    // ── Fetching ─────────────────────────────────────────────────────────────
    ToggleFilter(MetaField, String),
    Reload,
    FetchSimilar,
    Refresh(ChannelId),

    // ── Metadata edits ───────────────────────────────────────────────────────
    OpenPicker(ChannelId, MetaField),
    ClosePicker,
    EditField(ChannelId, MetaField, String),

    // ── Selection ────────────────────────────────────────────────────────────
    SelectCursor,
    SelectAllVisible,
    Deselect(String),
    ClearSelection,
    SetSelectionText(String),

    // ── Ad composition ───────────────────────────────────────────────────────
    SetAdField(AdField, String),
    CycleAdField(AdField),
    GenerateAd,
    PublishAd,

    CopyToClipboard(String),
    Noop,
}
