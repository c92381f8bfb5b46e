mod http;
mod navigate;

pub use self::http::{
    Http, HttpError, HttpMethod, HttpOperation, HttpRequest, HttpResponse, HttpResult,
    DEFAULT_TIMEOUT_MS,
};
pub use self::navigate::{Navigate, NavigateOperation};

// Crux's built-in Render capability is the view-update notification contract:
// every state mutation is followed by a render effect the shell subscribes to.
pub use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
    pub navigate: Navigate<Event>,
}
