use std::fmt::Display;

use image::RgbaImage;

use super::CaptureConstraints;

/// A synthetic camera that renders a moving test pattern. Used when no
/// native camera backend is compiled in, and by tests.
#[derive(Debug, Clone, Copy)]
pub struct MockBackend {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCameraInfo {
    pub name: String,
    /// Size delivered when no resolution is requested.
    pub native_size: (u32, u32),
    pub refuse_preferred: bool,
    pub refuse_fallback: bool,
}

impl Default for MockCameraInfo {
    fn default() -> Self {
        MockCameraInfo {
            name: "Test pattern".to_string(),
            native_size: (640, 480),
            refuse_preferred: false,
            refuse_fallback: false,
        }
    }
}

impl Display for MockCameraInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl super::CameraBackend for MockBackend {
    type Error = String;
    type EnumeratedCamera = MockCameraInfo;
    type Camera = MockCamera;

    fn enumerate_cameras() -> Result<Vec<MockCameraInfo>, String> {
        Ok(vec![MockCameraInfo::default()])
    }

    fn open_camera(
        item: MockCameraInfo,
        constraints: &CaptureConstraints,
    ) -> Result<MockCamera, String> {
        let refused = match constraints.ideal_resolution {
            Some(_) => item.refuse_preferred,
            None => item.refuse_fallback,
        };
        if refused {
            return Err(format!("{} refused {:?}", item.name, constraints));
        }
        let (width, height) = constraints.ideal_resolution.unwrap_or(item.native_size);
        Ok(MockCamera {
            width,
            height,
            frame: 0,
        })
    }
}

pub struct MockCamera {
    width: u32,
    height: u32,
    frame: u32,
}

impl MockCamera {
    fn render(&mut self) -> RgbaImage {
        self.frame = self.frame.wrapping_add(1);
        let shift = self.frame;
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let band = ((x + shift * 8) / 64 % 2) as u8;
            image::Rgba([
                (x * 255 / self.width.max(1)) as u8,
                (y * 255 / self.height.max(1)) as u8,
                band * 160,
                255,
            ])
        })
    }
}

impl super::CameraBackendCamera for MockCamera {
    type Error = String;

    fn capture_video_frame(&mut self) -> Result<RgbaImage, String> {
        Ok(self.render())
    }

    fn capture_still_frame(&mut self) -> Result<RgbaImage, String> {
        Ok(self.render())
    }
}
