use std::fmt::{Debug, Display};

use super::templates::Layout;

pub mod mock;
#[cfg(feature = "camera_nokhwa")]
pub mod nokhwa;

/// What to ask the camera for when opening it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureConstraints {
    pub ideal_resolution: Option<(u32, u32)>,
    pub facing_user: bool,
    pub aspect_ratio: Option<f32>,
}

impl CaptureConstraints {
    /// High quality request. A camera mounted in portrait asks for a
    /// portrait stream unless the template is a horizontal one.
    pub fn preferred(layout: Layout, portrait_mount: bool) -> Self {
        if portrait_mount {
            let landscape = layout == Layout::Horizontal;
            CaptureConstraints {
                ideal_resolution: Some(if landscape { (1920, 1080) } else { (1080, 1920) }),
                facing_user: true,
                aspect_ratio: Some(if landscape { 16.0 / 9.0 } else { 9.0 / 16.0 }),
            }
        } else {
            CaptureConstraints {
                ideal_resolution: Some((1920, 1080)),
                facing_user: true,
                aspect_ratio: None,
            }
        }
    }

    /// Minimal request used when the preferred one is refused.
    pub fn fallback() -> Self {
        CaptureConstraints {
            ideal_resolution: None,
            facing_user: true,
            aspect_ratio: None,
        }
    }
}

pub trait CameraBackend: Clone {
    type Error: Debug + Display + Send;
    type EnumeratedCamera: Debug + Display + PartialEq + Clone + Send;
    type Camera: CameraBackendCamera;

    fn initialize() -> Result<(), Self::Error> {
        Ok(())
    }
    fn enumerate_cameras() -> Result<Vec<Self::EnumeratedCamera>, Self::Error>;
    fn open_camera(
        item: Self::EnumeratedCamera,
        constraints: &CaptureConstraints,
    ) -> Result<Self::Camera, Self::Error>;
}

pub trait CameraBackendCamera: Send {
    type Error: Debug + Display + Send + Clone;

    fn capture_video_frame(&mut self) -> Result<image::RgbaImage, Self::Error>;
    fn capture_still_frame(&mut self) -> Result<image::RgbaImage, Self::Error>;
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("no camera available ({preferred}; fallback: {fallback})")]
pub struct CameraError {
    pub preferred: String,
    pub fallback: String,
}

/// Opens `item` with the preferred constraints, retrying once with the
/// fallback constraints.
pub fn open_with_fallback<C: CameraBackend>(
    item: C::EnumeratedCamera,
    preferred: &CaptureConstraints,
) -> Result<C::Camera, CameraError> {
    let preferred_err = match C::open_camera(item.clone(), preferred) {
        Ok(camera) => return Ok(camera),
        Err(err) => err,
    };
    log::warn!(
        "Opening {} with {:?} failed ({}); retrying with fallback constraints",
        item,
        preferred,
        preferred_err
    );
    C::open_camera(item, &CaptureConstraints::fallback()).map_err(|fallback_err| {
        log::error!("Fallback camera access failed: {}", fallback_err);
        CameraError {
            preferred: preferred_err.to_string(),
            fallback: fallback_err.to_string(),
        }
    })
}

#[cfg(feature = "camera_nokhwa")]
pub type DefaultCameraBackend = nokhwa::NokhwaBackend;
#[cfg(not(feature = "camera_nokhwa"))]
pub type DefaultCameraBackend = mock::MockBackend;

#[cfg(test)]
mod tests {
    use super::{mock::*, *};

    #[test]
    fn preferred_constraints_follow_the_mount() {
        let desktop = CaptureConstraints::preferred(Layout::Vertical, false);
        assert_eq!(desktop.ideal_resolution, Some((1920, 1080)));
        assert_eq!(desktop.aspect_ratio, None);
        assert!(desktop.facing_user);

        let portrait = CaptureConstraints::preferred(Layout::Vertical, true);
        assert_eq!(portrait.ideal_resolution, Some((1080, 1920)));
        assert_eq!(portrait.aspect_ratio, Some(9.0 / 16.0));

        let quad = CaptureConstraints::preferred(Layout::Horizontal, true);
        assert_eq!(quad.ideal_resolution, Some((1920, 1080)));
    }

    #[test]
    fn opens_with_preferred_constraints_when_possible() {
        let item = MockCameraInfo::default();
        let mut camera = open_with_fallback::<MockBackend>(
            item,
            &CaptureConstraints::preferred(Layout::Horizontal, false),
        )
        .unwrap();
        assert_eq!(camera.capture_video_frame().unwrap().dimensions(), (1920, 1080));
    }

    #[test]
    fn falls_back_once_when_preferred_is_refused() {
        let item = MockCameraInfo {
            refuse_preferred: true,
            ..Default::default()
        };
        let mut camera = open_with_fallback::<MockBackend>(
            item,
            &CaptureConstraints::preferred(Layout::Horizontal, false),
        )
        .unwrap();
        // fallback streams come in at the camera's native size
        assert_eq!(camera.capture_still_frame().unwrap().dimensions(), (640, 480));
    }

    #[test]
    fn reports_failure_when_both_attempts_fail() {
        let item = MockCameraInfo {
            refuse_preferred: true,
            refuse_fallback: true,
            ..Default::default()
        };
        let err = open_with_fallback::<MockBackend>(
            item,
            &CaptureConstraints::preferred(Layout::Vertical, false),
        )
        .err()
        .unwrap();
        assert!(err.preferred.contains("refused"));
        assert!(err.fallback.contains("refused"));
    }
}
