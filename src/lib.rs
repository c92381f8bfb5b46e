#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod capabilities;
pub mod event;
pub mod model;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use event::Event;
pub use model::{
    Activity, ActivityCache, ActivityFields, ActivityId, Draft, EditorState, Field, Model,
};

use capabilities::HttpError;

/// API resource the data-access collaborator serves activities from.
pub const ACTIVITIES_API_PATH: &str = "/api/activities";
/// Shell route for the read-only detail screen.
pub const ACTIVITY_DETAIL_ROUTE: &str = "/activities";

pub const FETCH_TIMEOUT_MS: u64 = 30_000;
pub const SUBMIT_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    NotFound,
    Validation,
    Deserialization,
    Server,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::NotFound => "NOT_FOUND",
            Self::Validation => "VALIDATION_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Server => "SERVER_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::Server)
    }
}

/// A failure converted to state at the update-loop boundary. Nothing in this
/// core is fatal: every failure resets the relevant status flag and leaves
/// the user free to retry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn from_status(status: u16) -> Self {
        let kind = match status {
            404 => ErrorKind::NotFound,
            s if (400..500).contains(&s) => ErrorKind::Validation,
            s if (500..600).contains(&s) => ErrorKind::Server,
            _ => ErrorKind::Unknown,
        };
        Self::new(kind, format!("server returned status {status}"))
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message)
    }
}

impl From<&HttpError> for AppError {
    fn from(e: &HttpError) -> Self {
        let kind = match e {
            HttpError::Network { .. } => ErrorKind::Network,
            HttpError::Timeout { .. } => ErrorKind::Timeout,
            HttpError::Deserialization { .. } => ErrorKind::Deserialization,
            HttpError::InvalidPath { .. }
            | HttpError::InvalidHeader { .. }
            | HttpError::InvalidRequest { .. }
            | HttpError::BodyTooLarge { .. }
            | HttpError::Serialization { .. } => ErrorKind::Validation,
        };
        Self::new(kind, e.to_string())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: String,
    pub city: String,
    pub venue: String,
}

impl From<&Activity> for ActivityView {
    fn from(activity: &Activity) -> Self {
        Self {
            id: activity.id.to_string(),
            title: activity.fields.title.clone(),
            description: activity.fields.description.clone(),
            category: activity.fields.category.clone(),
            date: activity.fields.date.clone(),
            city: activity.fields.city.clone(),
            venue: activity.fields.venue.clone(),
        }
    }
}

/// What the detail screen renders. A fetch failure and a genuinely missing
/// entity both end up as `NotFound`; the core does not tell them apart.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum DetailView {
    Loading,
    NotFound,
    Activity(ActivityView),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormView {
    /// Present only for drafts of already-persisted activities.
    pub id: Option<String>,
    pub is_new: bool,
    pub fields: ActivityFields,
    /// True once the user has changed at least one field.
    pub dirty: bool,
}

impl FormView {
    fn new(draft: &Draft, dirty: bool) -> Self {
        Self {
            id: draft.persisted_id().map(ActivityId::to_string),
            is_new: draft.is_new(),
            fields: draft.fields().clone(),
            dirty,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewModel {
    pub loading_initial: bool,
    pub submitting: bool,
    pub detail: DetailView,
    pub form: Option<FormView>,
    pub error: Option<String>,
}

pub mod app {
    use super::{
        ActivityView, AppError, DetailView, FormView, ViewModel, ACTIVITIES_API_PATH,
        ACTIVITY_DETAIL_ROUTE, FETCH_TIMEOUT_MS, SUBMIT_TIMEOUT_MS,
    };
    use crate::capabilities::{Capabilities, HttpError, HttpRequest, HttpResult};
    use crate::event::Event;
    use crate::model::{Activity, ActivityFields, ActivityId, Draft, EditorState, Model};
    use tracing::{debug, warn};

    #[derive(Default)]
    pub struct App;

    impl App {
        fn fetch_request(id: &ActivityId) -> Result<HttpRequest, HttpError> {
            Ok(HttpRequest::get(format!("{ACTIVITIES_API_PATH}/{id}"))?
                .with_timeout(FETCH_TIMEOUT_MS))
        }

        fn submit_request(activity: &Activity, is_new: bool) -> Result<HttpRequest, HttpError> {
            let request = if is_new {
                HttpRequest::post(ACTIVITIES_API_PATH)?
            } else {
                HttpRequest::put(format!("{ACTIVITIES_API_PATH}/{}", activity.id))?
            };
            Ok(request.with_json(activity)?.with_timeout(SUBMIT_TIMEOUT_MS))
        }

        /// Issues the fetch and raises `loading_initial`. The flag only goes
        /// up if a request is actually in flight.
        fn start_fetch(id: ActivityId, model: &mut Model, caps: &Capabilities) -> bool {
            match Self::fetch_request(&id) {
                Ok(request) => {
                    model.cache.loading_initial = true;
                    caps.http.send(request, move |result| Event::FetchCompleted {
                        id,
                        result: Box::new(result),
                    });
                    true
                }
                Err(error) => {
                    warn!(id = %id, error = %error, "could not build fetch request");
                    model.last_error = Some(AppError::from(&error));
                    false
                }
            }
        }

        fn decode_activity(result: HttpResult) -> Result<Activity, AppError> {
            let response = result.map_err(|e| AppError::from(&e))?;
            if !response.is_success() {
                return Err(AppError::from_status(response.status()));
            }
            response.json::<Activity>().map_err(|e| AppError::from(&e))
        }

        fn check_submit(result: HttpResult) -> Result<(), AppError> {
            let response = result.map_err(|e| AppError::from(&e))?;
            if response.is_success() {
                Ok(())
            } else {
                Err(AppError::from_status(response.status()))
            }
        }

        /// Shared tail of create and edit. On success the submitted activity
        /// becomes the canonical entry and navigation to its detail route is
        /// emitted, strictly after completion. On failure the draft is left
        /// untouched for retry and the returning `submitting` flag is the
        /// only recovery signal.
        fn complete_submit(
            activity: Activity,
            result: HttpResult,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            model.cache.submitting = false;
            match Self::check_submit(result) {
                Ok(()) => {
                    let id = activity.id.clone();
                    model.cache.insert_and_select(activity);
                    model.editor = EditorState::Idle;
                    caps.navigate
                        .navigate_to(format!("{ACTIVITY_DETAIL_ROUTE}/{id}"));
                }
                Err(error) => {
                    warn!(id = %activity.id, error = %error, "submit failed");
                    model.last_error = Some(error);
                }
            }
            caps.render.render();
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            debug!(event = event.name(), "handling event");

            match event {
                Event::ActivityRequested { id } => {
                    model.last_error = None;
                    if model.cache.select(&id) {
                        // Cache hit: the canonical map is authoritative once
                        // populated, no re-fetch.
                        debug!(id = %id, "activity served from cache");
                    } else {
                        Self::start_fetch(id, model, caps);
                    }
                    caps.render.render();
                }

                Event::SelectionCleared => {
                    model.cache.clear_selection();
                    caps.render.render();
                }

                Event::EditorOpened { id } => {
                    if model.editor.is_idle() {
                        model.last_error = None;
                        match id {
                            None => {
                                model.editor = EditorState::Loaded {
                                    draft: Draft::New(ActivityFields::default()),
                                };
                            }
                            Some(id) => match model.cache.get(&id).map(Draft::from_activity) {
                                Some(draft) => {
                                    model.cache.select(&id);
                                    model.editor = EditorState::Loaded { draft };
                                }
                                None => {
                                    if Self::start_fetch(id.clone(), model, caps) {
                                        model.editor = EditorState::Loading { id };
                                    }
                                }
                            },
                        }
                    } else {
                        // A draft is live; an unrelated re-mount must not
                        // clobber it.
                        debug!("editor already active, ignoring open");
                    }
                    caps.render.render();
                }

                Event::FieldChanged { field, value } => {
                    if model.editor.apply_edit(field, value) {
                        caps.render.render();
                    } else {
                        warn!(?field, "field change without an editable draft");
                    }
                }

                Event::SubmitRequested => {
                    match model.editor.draft() {
                        _ if model.cache.submitting => {
                            debug!("submit ignored, another submit is in flight");
                        }
                        None => warn!("submit requested without a draft"),
                        Some(draft) => {
                            let is_new = draft.is_new();
                            let activity = match draft {
                                // A fresh id is generated per create attempt;
                                // the draft keeps its New tag so a failed
                                // create retries as a create.
                                Draft::New(fields) => Activity {
                                    id: ActivityId::generate(),
                                    fields: fields.clone(),
                                },
                                Draft::Persisted { id, fields } => Activity {
                                    id: id.clone(),
                                    fields: fields.clone(),
                                },
                            };
                            match Self::submit_request(&activity, is_new) {
                                Ok(request) => {
                                    model.last_error = None;
                                    model.cache.submitting = true;
                                    let activity = Box::new(activity);
                                    if is_new {
                                        caps.http.send(request, move |result| {
                                            Event::CreateCompleted {
                                                activity,
                                                result: Box::new(result),
                                            }
                                        });
                                    } else {
                                        caps.http.send(request, move |result| {
                                            Event::EditCompleted {
                                                activity,
                                                result: Box::new(result),
                                            }
                                        });
                                    }
                                }
                                Err(error) => {
                                    warn!(error = %error, "could not build submit request");
                                    model.last_error = Some(AppError::from(&error));
                                }
                            }
                        }
                    }
                    caps.render.render();
                }

                Event::EditorClosed => {
                    model.editor = EditorState::Idle;
                    model.cache.clear_selection();
                    caps.render.render();
                }

                Event::FetchCompleted { id, result } => {
                    model.cache.loading_initial = false;
                    match Self::decode_activity(*result) {
                        Ok(activity) => {
                            if matches!(&model.editor, EditorState::Loading { id: pending } if *pending == activity.id)
                            {
                                model.editor = EditorState::Loaded {
                                    draft: Draft::from_activity(&activity),
                                };
                            }
                            model.cache.insert_and_select(activity);
                        }
                        Err(error) => {
                            // No entry is created; the detail screen shows
                            // "not found".
                            warn!(id = %id, error = %error, "activity fetch failed");
                            if matches!(&model.editor, EditorState::Loading { id: pending } if *pending == id)
                            {
                                model.editor = EditorState::Idle;
                            }
                            model.last_error = Some(error);
                        }
                    }
                    caps.render.render();
                }

                Event::CreateCompleted { activity, result } => {
                    Self::complete_submit(*activity, *result, model, caps);
                }

                Event::EditCompleted { activity, result } => {
                    Self::complete_submit(*activity, *result, model, caps);
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            let detail = if model.cache.loading_initial {
                DetailView::Loading
            } else if let Some(activity) = model.cache.selected_activity() {
                DetailView::Activity(ActivityView::from(activity))
            } else {
                DetailView::NotFound
            };

            let form = match &model.editor {
                EditorState::Idle | EditorState::Loading { .. } => None,
                EditorState::Loaded { draft } => Some(FormView::new(draft, false)),
                EditorState::Editing { draft } => Some(FormView::new(draft, true)),
            };

            ViewModel {
                loading_initial: model.cache.loading_initial,
                submitting: model.cache.submitting,
                detail,
                form,
                error: model.last_error.as_ref().map(|e| e.message.clone()),
            }
        }
    }
}
