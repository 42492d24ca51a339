use std::time::Instant;

use image::{buffer::ConvertBuffer, codecs::jpeg::JpegEncoder, RgbImage, RgbaImage};
use rayon::prelude::*;

use super::{
    assets::{AssetError, AssetLoader},
    overlays::{self, Overlay},
    templates::{SlotRect, Template},
};

pub const OUTPUT_JPEG_QUALITY: u8 = 90;
pub const OUTPUT_FILE_NAME: &str = "nocturne-booth-photos.jpg";

const WHITE: image::Rgba<u8> = image::Rgba([255, 255, 255, 255]);

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("photo {index} could not be decoded: {source}")]
    Photo {
        index: usize,
        source: image::ImageError,
    },
    #[error("failed to encode the composed image: {0}")]
    Encode(image::ImageError),
}

/// Destination of one photo on the canvas, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Which rule decided a photo's destination rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Fit inside the slot keeping the aspect ratio.
    Contain,
    /// Portrait photo in a landscape slot: full slot height.
    FillHeight,
    /// Landscape photo in a portrait slot: full slot width.
    FillWidth,
    /// No rule applied; the photo is stretched over the raw slot.
    Stretched,
}

/// Works out where a `photo_width` x `photo_height` photo lands inside
/// `slot`.
///
/// When the session orientation is the one the layout was designed for the
/// photo gets a contain fit. Otherwise only the portrait-in-landscape and
/// landscape-in-portrait cases are fitted; anything else keeps the slot's
/// own rectangle and is reported as [`Placement::Stretched`].
pub fn place_photo(
    photo_width: u32,
    photo_height: u32,
    slot: &SlotRect,
    orientation_matches: bool,
) -> (DrawRect, Placement) {
    let image_aspect = photo_width as f32 / photo_height as f32;
    let slot_aspect = slot.aspect_ratio();

    let mut rect = DrawRect {
        x: slot.x as f32,
        y: slot.y as f32,
        width: slot.width as f32,
        height: slot.height as f32,
    };

    if orientation_matches {
        if image_aspect > slot_aspect {
            // wider than the slot
            rect.height = slot.width as f32 / image_aspect;
            rect.y = slot.y as f32 + (slot.height as f32 - rect.height) / 2.0;
        } else {
            rect.width = slot.height as f32 * image_aspect;
            rect.x = slot.x as f32 + (slot.width as f32 - rect.width) / 2.0;
        }
        return (rect, Placement::Contain);
    }

    if image_aspect < 1.0 && slot_aspect > 1.0 {
        rect.width = slot.height as f32 * image_aspect;
        rect.x = slot.x as f32 + (slot.width as f32 - rect.width) / 2.0;
        (rect, Placement::FillHeight)
    } else if image_aspect > 1.0 && slot_aspect < 1.0 {
        rect.height = slot.width as f32 / image_aspect;
        rect.y = slot.y as f32 + (slot.height as f32 - rect.height) / 2.0;
        (rect, Placement::FillWidth)
    } else {
        (rect, Placement::Stretched)
    }
}

/// Lays `photos` into the template slots over `artwork`, with `overlay` on
/// top of everything.
///
/// Photo `i` always goes to slot `i`. Extra photos are ignored and slots
/// without a photo keep showing the artwork. The result is always exactly
/// the template's canvas size.
pub fn render_take(
    template: &Template,
    photos: &[RgbaImage],
    is_landscape: bool,
    artwork: &RgbaImage,
    overlay: Option<&RgbaImage>,
) -> RgbaImage {
    let size = template.canvas_size();
    let mut canvas = RgbaImage::from_pixel(size.width, size.height, WHITE);
    draw_stretched(&mut canvas, artwork);

    let orientation_matches = template.layout.expects_orientation(is_landscape);
    for (i, (photo, slot)) in photos
        .iter()
        .zip(template.slot_rects())
        .take(template.slot_count)
        .enumerate()
    {
        let (rect, placement) = place_photo(photo.width(), photo.height(), slot, orientation_matches);
        if placement == Placement::Stretched {
            log::warn!(
                "Photo {} ({}x{}) has no fitting rule for slot {:?}; stretching",
                i,
                photo.width(),
                photo.height(),
                slot
            );
        }

        let width = (rect.width.round() as u32).max(1);
        let height = (rect.height.round() as u32).max(1);
        let resized =
            image::imageops::resize(photo, width, height, image::imageops::FilterType::Lanczos3);
        image::imageops::overlay(
            &mut canvas,
            &resized,
            rect.x.round() as i64,
            rect.y.round() as i64,
        );
    }

    if let Some(overlay) = overlay {
        draw_stretched(&mut canvas, overlay);
    }

    canvas
}

fn draw_stretched(canvas: &mut RgbaImage, layer: &RgbaImage) {
    if layer.dimensions() == canvas.dimensions() {
        image::imageops::overlay(canvas, layer, 0, 0);
    } else {
        let resized = image::imageops::resize(
            layer,
            canvas.width(),
            canvas.height(),
            image::imageops::FilterType::Triangle,
        );
        image::imageops::overlay(canvas, &resized, 0, 0);
    }
}

pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    // JPEG has no alpha channel.
    let rgb: RgbImage = image.convert();
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, quality).encode_image(&rgb)?;
    Ok(encoded)
}

/// Everything a composition needs, owned so it can move onto a blocking
/// thread.
#[derive(Debug, Clone)]
pub struct ComposeRequest {
    pub template: &'static Template,
    pub photos: Vec<Vec<u8>>,
    pub is_landscape: bool,
    pub overlay: Option<Overlay>,
}

#[derive(Debug, Clone)]
pub struct ComposedImage {
    pub image: RgbaImage,
    pub jpeg: Vec<u8>,
}

/// Loads the artwork, decodes every photo and renders the take.
///
/// Any asset or photo that fails to load aborts the whole composition.
pub fn compose(request: &ComposeRequest, assets: &AssetLoader) -> Result<ComposedImage, ComposeError> {
    let started = Instant::now();
    let template = request.template;
    let size = template.canvas_size();

    let artwork = assets.load_stretched(template.artwork, size)?;
    let overlay = request
        .overlay
        .as_ref()
        .and_then(|overlay| overlays::asset_path(template.layout, overlay))
        .map(|path| assets.load_stretched(&path, size))
        .transpose()?;

    // Decoding runs in parallel; the collect keeps capture order.
    let photos = request
        .photos
        .par_iter()
        .enumerate()
        .map(|(index, bytes)| {
            image::load_from_memory(bytes)
                .map(|photo| photo.to_rgba8())
                .map_err(|source| ComposeError::Photo { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let image = render_take(
        template,
        &photos,
        request.is_landscape,
        &artwork,
        overlay.as_ref(),
    );
    let jpeg = encode_jpeg(&image, OUTPUT_JPEG_QUALITY).map_err(ComposeError::Encode)?;

    log::debug!(
        "Composed {} photos into {} ({}x{}) in {:?}",
        photos.len(),
        template.id,
        size.width,
        size.height,
        started.elapsed()
    );

    Ok(ComposedImage { image, jpeg })
}
