use std::fmt::Display;

/// How the photo slots of a template are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Vertical,
    Horizontal,
    Single,
    Grid,
}

impl Layout {
    /// Whether photos taken in the given orientation are the ones this layout
    /// was designed for.
    pub fn expects_orientation(self, is_landscape: bool) -> bool {
        match self {
            Layout::Horizontal => is_landscape,
            Layout::Vertical => !is_landscape,
            Layout::Single | Layout::Grid => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

/// A rectangle on the output canvas reserved for one photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SlotRect {
    const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        SlotRect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub layout: Layout,
    pub slot_count: usize,
    /// Artwork path, relative to the asset root.
    pub artwork: &'static str,
}

impl Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

const NARROW_VERTICAL_ID: &str = "vertical-narrow";

static NARROW_VERTICAL_SLOTS: [SlotRect; 4] = [
    SlotRect::new(40, 55, 520, 300),
    SlotRect::new(40, 375, 520, 300),
    SlotRect::new(40, 695, 520, 300),
    SlotRect::new(40, 1015, 520, 300),
];

static VERTICAL_SLOTS: [SlotRect; 4] = [
    SlotRect::new(125, 90, 800, 350),
    SlotRect::new(125, 460, 800, 350),
    SlotRect::new(125, 830, 800, 350),
    SlotRect::new(125, 1200, 800, 350),
];

static GRID_SLOTS: [SlotRect; 4] = [
    SlotRect::new(90, 90, 495, 495),
    SlotRect::new(615, 90, 495, 495),
    SlotRect::new(90, 615, 495, 495),
    SlotRect::new(615, 615, 495, 495),
];

static HORIZONTAL_SLOTS: [SlotRect; 4] = [
    SlotRect::new(90, 90, 800, 450),
    SlotRect::new(910, 90, 800, 450),
    SlotRect::new(90, 560, 800, 450),
    SlotRect::new(910, 560, 800, 450),
];

static TEMPLATES: [Template; 4] = [
    Template {
        id: NARROW_VERTICAL_ID,
        name: "Narrow Vertical Strip",
        description: "Sleek narrow vertical frame with minimalist white design",
        layout: Layout::Vertical,
        slot_count: 4,
        artwork: "frames/vertical-narrow.svg",
    },
    Template {
        id: "vertical-nocturne",
        name: "Nocturne's Vertical",
        description: "Elegant white frame with vertical layout and signature footer",
        layout: Layout::Vertical,
        slot_count: 4,
        artwork: "frames/vertical-nocturne.svg",
    },
    Template {
        id: "boxed-memories",
        name: "Boxed Memories",
        description: "Modern grid layout with four square photos and a stylish footer",
        layout: Layout::Grid,
        slot_count: 4,
        artwork: "frames/boxed-memories.svg",
    },
    Template {
        id: "quad-landscape",
        name: "Quad Landscape",
        description: "Modern landscape layout with four photos and elegant footer",
        layout: Layout::Horizontal,
        slot_count: 4,
        artwork: "frames/quad-landscape.svg",
    },
];

pub fn all() -> &'static [Template] {
    &TEMPLATES
}

pub fn find(id: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|template| template.id == id)
}

impl Template {
    pub fn canvas_size(&self) -> CanvasSize {
        match (self.layout, self.id) {
            (Layout::Horizontal, _) => CanvasSize {
                width: 1800,
                height: 1200,
            },
            (_, NARROW_VERTICAL_ID) => CanvasSize {
                width: 600,
                height: 1500,
            },
            _ => CanvasSize {
                width: 1050,
                height: 1800,
            },
        }
    }

    pub fn slot_rects(&self) -> &'static [SlotRect] {
        if self.id == NARROW_VERTICAL_ID {
            return &NARROW_VERTICAL_SLOTS;
        }
        match self.layout {
            Layout::Vertical => &VERTICAL_SLOTS,
            Layout::Grid => &GRID_SLOTS,
            Layout::Horizontal => &HORIZONTAL_SLOTS,
            Layout::Single => &[],
        }
    }
}
