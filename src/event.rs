use serde::{Deserialize, Serialize};

use crate::capabilities::HttpResult;
use crate::model::{Activity, ActivityId, Field};

/// Everything that can happen to the core: screen lifecycle, user edits, and
/// capability responses. Response variants are boxed to keep the enum small.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    // Detail screen
    /// Detail screen mounted with a route id: load the activity, from the
    /// canonical map when cached, from the API otherwise.
    ActivityRequested { id: ActivityId },
    /// Detail screen unmounted.
    SelectionCleared,

    // Form screen
    /// Form screen mounted. `Some(id)` edits an existing activity, `None`
    /// starts a blank draft.
    EditorOpened { id: Option<ActivityId> },
    /// One draft field replaced with a new value.
    FieldChanged { field: Field, value: String },
    /// Submit the current draft; the draft variant decides create vs edit.
    SubmitRequested,
    /// Form screen unmounted: reset the editor and clear the selection.
    EditorClosed,

    // Capability responses
    FetchCompleted {
        id: ActivityId,
        result: Box<HttpResult>,
    },
    /// The submitted activity rides along so the success path inserts exactly
    /// what was sent, even if the draft moved on meanwhile.
    CreateCompleted {
        activity: Box<Activity>,
        result: Box<HttpResult>,
    },
    EditCompleted {
        activity: Box<Activity>,
        result: Box<HttpResult>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ActivityRequested { .. } => "activity_requested",
            Self::SelectionCleared => "selection_cleared",
            Self::EditorOpened { .. } => "editor_opened",
            Self::FieldChanged { .. } => "field_changed",
            Self::SubmitRequested => "submit_requested",
            Self::EditorClosed => "editor_closed",
            Self::FetchCompleted { .. } => "fetch_completed",
            Self::CreateCompleted { .. } => "create_completed",
            Self::EditCompleted { .. } => "edit_completed",
        }
    }

    /// Capability responses are not user-initiated; everything else comes
    /// from a screen.
    pub fn is_user_initiated(&self) -> bool {
        !matches!(
            self,
            Self::FetchCompleted { .. } | Self::CreateCompleted { .. } | Self::EditCompleted { .. }
        )
    }
}
