use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::AppError;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("activity id cannot be empty")]
    EmptyActivityId,
}

/// Identifier of a persisted activity.
///
/// Non-empty by construction, on deserialization included. An unsaved draft
/// is represented by `Draft::New`, never by a reserved id value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ActivityId(String);

impl ActivityId {
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        if s.is_empty() {
            return Err(ValidationError::EmptyActivityId);
        }
        Ok(Self(s))
    }

    /// Fresh globally-unique identifier for a new draft. Uniqueness is
    /// assumed, not verified.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ActivityId {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ActivityId> for String {
    fn from(id: ActivityId) -> Self {
        id.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The user-editable fields of an activity. All free text; `date` is a
/// date/time literal kept exactly as entered (no timezone normalization
/// happens in the core).
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ActivityFields {
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: String,
    pub city: String,
    pub venue: String,
}

/// Names one editable field. The identifier is deliberately not listed here:
/// it is never user-editable.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Title,
    Description,
    Category,
    Date,
    City,
    Venue,
}

impl ActivityFields {
    /// Replaces exactly one field, leaving the rest untouched.
    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Title => self.title = value,
            Field::Description => self.description = value,
            Field::Category => self.category = value,
            Field::Date => self.date = value,
            Field::City => self.city = value,
            Field::Venue => self.venue = value,
        }
    }
}

/// Wire form is flat JSON: `{id, title, description, category, date, city, venue}`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Activity {
    pub id: ActivityId,
    #[serde(flatten)]
    pub fields: ActivityFields,
}

/// An editable copy of one activity, owned by the editor. It is independent
/// of the canonical map until a submit succeeds.
///
/// The variant is the create-vs-edit decision: `New` drafts have no
/// identifier and submit as a create; `Persisted` drafts submit as an edit.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Draft {
    New(ActivityFields),
    Persisted {
        id: ActivityId,
        fields: ActivityFields,
    },
}

impl Draft {
    pub fn from_activity(activity: &Activity) -> Self {
        Self::Persisted {
            id: activity.id.clone(),
            fields: activity.fields.clone(),
        }
    }

    pub fn fields(&self) -> &ActivityFields {
        match self {
            Self::New(fields) | Self::Persisted { fields, .. } => fields,
        }
    }

    pub fn fields_mut(&mut self) -> &mut ActivityFields {
        match self {
            Self::New(fields) | Self::Persisted { fields, .. } => fields,
        }
    }

    pub fn persisted_id(&self) -> Option<&ActivityId> {
        match self {
            Self::New(_) => None,
            Self::Persisted { id, .. } => Some(id),
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::New(_))
    }
}

/// The editor screen's lifecycle. Transitions are gated by state alone, so an
/// unrelated re-mount of the form cannot clobber a draft in progress.
///
/// `Loaded` holds a draft that still mirrors canonical data; the first field
/// edit moves it to `Editing`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub enum EditorState {
    #[default]
    Idle,
    Loading {
        id: ActivityId,
    },
    Loaded {
        draft: Draft,
    },
    Editing {
        draft: Draft,
    },
}

impl EditorState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn draft(&self) -> Option<&Draft> {
        match self {
            Self::Idle | Self::Loading { .. } => None,
            Self::Loaded { draft } | Self::Editing { draft } => Some(draft),
        }
    }

    /// Applies one field edit if a draft is present, moving to `Editing`.
    /// Returns false (and changes nothing) in `Idle` and `Loading`.
    pub fn apply_edit(&mut self, field: Field, value: String) -> bool {
        match std::mem::take(self) {
            Self::Loaded { mut draft } | Self::Editing { mut draft } => {
                draft.fields_mut().set(field, value);
                *self = Self::Editing { draft };
                true
            }
            other => {
                *self = other;
                false
            }
        }
    }
}

/// The canonical activity map plus the two status flags and the selection
/// pointer. This is the single authoritative in-memory store; once an entry
/// is cached it is served from here and never re-fetched or self-invalidated.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ActivityCache {
    activities: HashMap<ActivityId, Activity>,
    selected: Option<ActivityId>,

    /// True exactly while a fetch-by-id is outstanding for an uncached id.
    pub loading_initial: bool,
    /// True exactly while a create or edit request is outstanding.
    pub submitting: bool,
}

impl ActivityCache {
    pub fn contains(&self, id: &ActivityId) -> bool {
        self.activities.contains_key(id)
    }

    pub fn get(&self, id: &ActivityId) -> Option<&Activity> {
        self.activities.get(id)
    }

    /// Inserts (or replaces in place) the entry keyed by the activity's own
    /// id and selects it. Success path of load, create and edit.
    pub fn insert_and_select(&mut self, activity: Activity) {
        let id = activity.id.clone();
        self.activities.insert(id.clone(), activity);
        self.selected = Some(id);
    }

    /// Selects an existing entry. Returns false (selection untouched) if no
    /// entry for `id` exists, so the selection can never dangle.
    pub fn select(&mut self, id: &ActivityId) -> bool {
        if self.activities.contains_key(id) {
            self.selected = Some(id.clone());
            true
        } else {
            false
        }
    }

    /// Unsets the selection. The canonical map is untouched.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_activity(&self) -> Option<&Activity> {
        self.selected.as_ref().and_then(|id| self.activities.get(id))
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Model {
    pub cache: ActivityCache,
    pub editor: EditorState,
    pub last_error: Option<AppError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(id: &str, title: &str) -> Activity {
        Activity {
            id: ActivityId::new(id).unwrap(),
            fields: ActivityFields {
                title: title.into(),
                ..ActivityFields::default()
            },
        }
    }

    #[test]
    fn activity_id_rejects_empty() {
        assert_eq!(ActivityId::new(""), Err(ValidationError::EmptyActivityId));
        assert!(ActivityId::new("a1").is_ok());
    }

    #[test]
    fn activity_id_rejects_empty_on_deserialize() {
        let ok: Result<ActivityId, _> = serde_json::from_str("\"a1\"");
        assert!(ok.is_ok());
        let empty: Result<ActivityId, _> = serde_json::from_str("\"\"");
        assert!(empty.is_err());
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(ActivityId::generate(), ActivityId::generate());
    }

    #[test]
    fn activity_wire_form_is_flat() {
        let json = serde_json::to_value(activity("a1", "Run")).unwrap();
        assert_eq!(json["id"], "a1");
        assert_eq!(json["title"], "Run");
        assert_eq!(json["venue"], "");
        assert!(json.get("fields").is_none());
    }

    #[test]
    fn set_replaces_only_the_named_field() {
        let mut fields = ActivityFields {
            title: "Run".into(),
            city: "Leeds".into(),
            ..ActivityFields::default()
        };
        fields.set(Field::City, "York".into());
        assert_eq!(fields.city, "York");
        assert_eq!(fields.title, "Run");
        assert_eq!(fields.venue, "");
    }

    #[test]
    fn first_edit_moves_loaded_to_editing() {
        let mut editor = EditorState::Loaded {
            draft: Draft::from_activity(&activity("a1", "Run")),
        };
        assert!(editor.apply_edit(Field::Title, "Jog".into()));
        match &editor {
            EditorState::Editing { draft } => assert_eq!(draft.fields().title, "Jog"),
            other => panic!("expected Editing, got {other:?}"),
        }
    }

    #[test]
    fn edits_are_ignored_without_a_draft() {
        let mut editor = EditorState::Idle;
        assert!(!editor.apply_edit(Field::Title, "Jog".into()));
        assert_eq!(editor, EditorState::Idle);

        let id = ActivityId::new("a1").unwrap();
        let mut editor = EditorState::Loading { id: id.clone() };
        assert!(!editor.apply_edit(Field::Title, "Jog".into()));
        assert_eq!(editor, EditorState::Loading { id });
    }

    #[test]
    fn select_refuses_unknown_ids() {
        let mut cache = ActivityCache::default();
        let missing = ActivityId::new("nope").unwrap();
        assert!(!cache.select(&missing));
        assert!(cache.selected_activity().is_none());
    }

    #[test]
    fn insert_and_select_replaces_in_place() {
        let mut cache = ActivityCache::default();
        cache.insert_and_select(activity("a1", "Run"));
        cache.insert_and_select(activity("a1", "Jog"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.selected_activity().unwrap().fields.title, "Jog");
    }

    #[test]
    fn clear_selection_keeps_the_entry() {
        let mut cache = ActivityCache::default();
        cache.insert_and_select(activity("a1", "Run"));
        cache.clear_selection();
        assert!(cache.selected_activity().is_none());
        assert!(cache.contains(&ActivityId::new("a1").unwrap()));
    }

    #[test]
    fn draft_variant_carries_the_create_vs_edit_decision() {
        let new = Draft::New(ActivityFields::default());
        assert!(new.is_new());
        assert!(new.persisted_id().is_none());

        let persisted = Draft::from_activity(&activity("a1", "Run"));
        assert!(!persisted.is_new());
        assert_eq!(persisted.persisted_id().unwrap().as_str(), "a1");
    }
}
