use std::fmt::Display;

use super::templates::{self, Template};

const FRAME_ID_PARAM: &str = "frameId";

/// A screen address, e.g. `/capture?frameId=quad-landscape`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Frames,
    Capture { frame_id: Option<String> },
    Compose { frame_id: Option<String> },
}

/// A route whose template has been looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Landing,
    Selection,
    Capture(&'static Template),
    Compose(&'static Template),
}

impl Route {
    /// Parses a route. `/` is the landing screen; unknown paths land on the
    /// frame selection screen.
    pub fn parse(input: &str) -> Route {
        let (path, query) = input.split_once('?').unwrap_or((input, ""));
        let frame_id = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == FRAME_ID_PARAM)
            .map(|(_, value)| value.to_string())
            .filter(|value| !value.is_empty());

        match path.trim_end_matches('/') {
            "" => Route::Home,
            "/capture" => Route::Capture { frame_id },
            "/compose" => Route::Compose { frame_id },
            _ => Route::Frames,
        }
    }

    pub fn capture(template: &Template) -> Route {
        Route::Capture {
            frame_id: Some(template.id.to_string()),
        }
    }

    pub fn compose(template: &Template) -> Route {
        Route::Compose {
            frame_id: Some(template.id.to_string()),
        }
    }

    /// Resolves the `frameId` parameter. A missing or unknown template
    /// redirects to selection.
    pub fn resolve(&self) -> Screen {
        let lookup = |frame_id: &Option<String>| frame_id.as_deref().and_then(templates::find);
        match self {
            Route::Home => Screen::Landing,
            Route::Frames => Screen::Selection,
            Route::Capture { frame_id } => lookup(frame_id)
                .map(Screen::Capture)
                .unwrap_or(Screen::Selection),
            Route::Compose { frame_id } => lookup(frame_id)
                .map(Screen::Compose)
                .unwrap_or(Screen::Selection),
        }
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (path, frame_id) = match self {
            Route::Home => return write!(f, "/"),
            Route::Frames => return write!(f, "/frames"),
            Route::Capture { frame_id } => ("/capture", frame_id),
            Route::Compose { frame_id } => ("/compose", frame_id),
        };
        match frame_id {
            Some(id) => write!(f, "{path}?{FRAME_ID_PARAM}={id}"),
            None => write!(f, "{path}"),
        }
    }
}
