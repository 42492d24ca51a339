use std::fmt::Display;

use super::templates::Layout;

/// A decorative image drawn over the whole composed canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlay {
    pub name: &'static str,
    pub file: &'static str,
}

impl Display for Overlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

static VERTICAL_OVERLAYS: [Overlay; 4] = [
    Overlay {
        name: "Y2K",
        file: "vertical-overlay.svg",
    },
    Overlay {
        name: "CUTESY",
        file: "vertical-overlay2.svg",
    },
    Overlay {
        name: "MINECRAFT",
        file: "vertical-overlay3.svg",
    },
    Overlay {
        name: "RETRO COMICS",
        file: "vertical-overlay4.svg",
    },
];

// Reserved: no quad overlays have been drawn yet.
static HORIZONTAL_OVERLAYS: [Overlay; 0] = [];

pub fn for_layout(layout: Layout) -> &'static [Overlay] {
    match layout {
        Layout::Vertical => &VERTICAL_OVERLAYS,
        Layout::Horizontal => &HORIZONTAL_OVERLAYS,
        Layout::Single | Layout::Grid => &[],
    }
}

/// Resolves the overlay stored alongside the photos, falling back to the
/// first overlay of the layout when nothing valid was stored.
pub fn resolve(layout: Layout, stored: Option<&str>) -> Option<Overlay> {
    let options = for_layout(layout);
    stored
        .and_then(|file| options.iter().find(|overlay| overlay.file == file))
        .or_else(|| options.first())
        .copied()
}

/// Overlay artwork path relative to the asset root.
pub fn asset_path(layout: Layout, overlay: &Overlay) -> Option<String> {
    let dir = match layout {
        Layout::Vertical => "vertical",
        Layout::Horizontal => "quad",
        Layout::Single | Layout::Grid => return None,
    };
    Some(format!("overlay/{dir}/{}", overlay.file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_layouts_get_four_overlays() {
        let names: Vec<_> = for_layout(Layout::Vertical).iter().map(|o| o.name).collect();
        assert_eq!(names, ["Y2K", "CUTESY", "MINECRAFT", "RETRO COMICS"]);
    }

    #[test]
    fn other_layouts_get_none() {
        assert!(for_layout(Layout::Horizontal).is_empty());
        assert!(for_layout(Layout::Grid).is_empty());
        assert!(for_layout(Layout::Single).is_empty());
    }

    #[test]
    fn resolve_prefers_a_valid_stored_overlay() {
        let overlay = resolve(Layout::Vertical, Some("vertical-overlay3.svg")).unwrap();
        assert_eq!(overlay.name, "MINECRAFT");
    }

    #[test]
    fn resolve_ignores_unknown_stored_overlay() {
        let overlay = resolve(Layout::Vertical, Some("quad-overlay.svg")).unwrap();
        assert_eq!(overlay.file, "vertical-overlay.svg");
        assert_eq!(resolve(Layout::Horizontal, Some("vertical-overlay.svg")), None);
        assert_eq!(resolve(Layout::Grid, None), None);
    }

    #[test]
    fn asset_paths_use_layout_directories() {
        let overlay = VERTICAL_OVERLAYS[1];
        assert_eq!(
            asset_path(Layout::Vertical, &overlay).as_deref(),
            Some("overlay/vertical/vertical-overlay2.svg")
        );
        assert_eq!(
            asset_path(Layout::Horizontal, &overlay).as_deref(),
            Some("overlay/quad/vertical-overlay2.svg")
        );
        assert_eq!(asset_path(Layout::Grid, &overlay), None);
    }
}
