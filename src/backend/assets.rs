use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use image::RgbaImage;
use once_cell::sync::Lazy;

use super::templates::CanvasSize;

static FONTS: Lazy<Arc<usvg::fontdb::Database>> = Lazy::new(|| {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    Arc::new(db)
});

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse svg {path}: {source}")]
    Svg { path: PathBuf, source: usvg::Error },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("could not allocate a {width}x{height} raster for {path}")]
    Raster {
        path: PathBuf,
        width: u32,
        height: u32,
    },
}

/// Loads frame and overlay artwork from the asset directory.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        AssetLoader { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads an asset stretched to exactly `size`, ignoring its own aspect
    /// ratio. SVGs are rasterized straight at the target size.
    pub fn load_stretched(&self, relative: &str, size: CanvasSize) -> Result<RgbaImage, AssetError> {
        let path = self.root.join(relative);
        let bytes = std::fs::read(&path).map_err(|source| AssetError::Io {
            path: path.clone(),
            source,
        })?;

        let is_svg = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
        if is_svg {
            return rasterize_svg(&path, &bytes, size);
        }

        let image = image::load_from_memory(&bytes)
            .map_err(|source| AssetError::Decode {
                path: path.clone(),
                source,
            })?
            .to_rgba8();
        if image.dimensions() == (size.width, size.height) {
            return Ok(image);
        }
        Ok(image::imageops::resize(
            &image,
            size.width,
            size.height,
            image::imageops::FilterType::Triangle,
        ))
    }
}

fn rasterize_svg(path: &Path, bytes: &[u8], size: CanvasSize) -> Result<RgbaImage, AssetError> {
    let opts = usvg::Options {
        resources_dir: path.parent().map(|p| p.to_path_buf()),
        fontdb: FONTS.clone(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_data(bytes, &opts).map_err(|source| AssetError::Svg {
        path: path.to_path_buf(),
        source,
    })?;

    let raster_error = || AssetError::Raster {
        path: path.to_path_buf(),
        width: size.width,
        height: size.height,
    };
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width, size.height).ok_or_else(raster_error)?;
    let sx = size.width as f32 / tree.size().width();
    let sy = size.height as f32 / tree.size().height();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    // tiny-skia keeps premultiplied alpha; the compositor expects straight.
    let mut raw = Vec::with_capacity(pixmap.pixels().len() * 4);
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        raw.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }
    RgbaImage::from_raw(size.width, size.height, raw).ok_or_else(raster_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: CanvasSize = CanvasSize {
        width: 40,
        height: 20,
    };

    #[test]
    fn svg_is_stretched_to_the_canvas() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("frame.svg"),
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
                <rect width="10" height="10" fill="#ff0000"/>
            </svg>"##,
        )
        .unwrap();

        let image = AssetLoader::new(dir.path()).load_stretched("frame.svg", SIZE).unwrap();
        assert_eq!(image.dimensions(), (40, 20));
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(39, 19).0, [255, 0, 0, 255]);
    }

    #[test]
    fn transparent_svg_regions_stay_transparent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("overlay.svg"),
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="2">
                <rect width="2" height="2" fill="#0000ff"/>
            </svg>"##,
        )
        .unwrap();

        let image = AssetLoader::new(dir.path()).load_stretched("overlay.svg", SIZE).unwrap();
        assert_eq!(image.get_pixel(5, 10).0, [0, 0, 255, 255]);
        assert_eq!(image.get_pixel(35, 10).0[3], 0);
    }

    #[test]
    fn raster_assets_are_resized() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(3, 3, image::Rgba([10, 20, 30, 255]))
            .save(dir.path().join("frame.png"))
            .unwrap();

        let image = AssetLoader::new(dir.path()).load_stretched("frame.png", SIZE).unwrap();
        assert_eq!(image.dimensions(), (40, 20));
        assert_eq!(image.get_pixel(20, 10).0, [10, 20, 30, 255]);
    }

    #[test]
    fn missing_and_broken_assets_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(dir.path());
        assert!(matches!(
            loader.load_stretched("frames/missing.svg", SIZE),
            Err(AssetError::Io { .. })
        ));

        std::fs::write(dir.path().join("broken.svg"), "<svg").unwrap();
        assert!(matches!(
            loader.load_stretched("broken.svg", SIZE),
            Err(AssetError::Svg { .. })
        ));

        std::fs::write(dir.path().join("broken.png"), [0u8, 1, 2]).unwrap();
        assert!(matches!(
            loader.load_stretched("broken.png", SIZE),
            Err(AssetError::Decode { .. })
        ));
    }

    #[test]
    fn bundled_artwork_loads() {
        use crate::backend::{overlays, templates};

        let loader = AssetLoader::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("assets"));
        for template in templates::all() {
            let size = template.canvas_size();
            let artwork = loader.load_stretched(template.artwork, size).unwrap();
            assert_eq!(artwork.dimensions(), (size.width, size.height));

            for overlay in overlays::for_layout(template.layout) {
                let path = overlays::asset_path(template.layout, overlay).unwrap();
                loader.load_stretched(&path, size).unwrap();
            }
        }
    }
}
