use nokhwa::{
    self,
    pixel_format::RgbAFormat,
    utils::{
        CameraFormat, CameraInfo, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
    Camera, NokhwaError,
};

use super::CaptureConstraints;

const PREFERRED_FRAME_RATE: u32 = 30;

#[derive(Debug, Clone, Copy)]
pub struct NokhwaBackend {}

impl super::CameraBackend for NokhwaBackend {
    type Error = NokhwaError;
    type EnumeratedCamera = CameraInfo;
    type Camera = NokhwaCamera;

    fn initialize() -> Result<(), Self::Error> {
        nokhwa::nokhwa_initialize(|granted| {
            log::info!("Camera permission granted: {}", granted);
        });
        // Lie because it needs to be sync
        Ok(())
    }

    fn enumerate_cameras() -> Result<Vec<nokhwa::utils::CameraInfo>, NokhwaError> {
        if !nokhwa::nokhwa_check() {
            return Err(NokhwaError::UnitializedError);
        }
        nokhwa::query(nokhwa::utils::ApiBackend::Auto)
    }

    /// Desktop webcams always face the user, so `facing_user` needs no
    /// translation here.
    fn open_camera(
        item: Self::EnumeratedCamera,
        constraints: &CaptureConstraints,
    ) -> Result<NokhwaCamera, Self::Error> {
        let format = match constraints.ideal_resolution {
            Some((width, height)) => RequestedFormatType::Closest(CameraFormat::new(
                Resolution::new(width, height),
                FrameFormat::MJPEG,
                PREFERRED_FRAME_RATE,
            )),
            None => RequestedFormatType::AbsoluteHighestFrameRate,
        };
        let mut camera = Camera::new(item.index().clone(), RequestedFormat::new::<RgbAFormat>(format))?;
        camera.open_stream()?;
        let resolution = camera.resolution();
        log::info!(
            "Opened {} at {}x{}",
            item.human_name(),
            resolution.width(),
            resolution.height()
        );
        Ok(NokhwaCamera { camera })
    }
}

pub struct NokhwaCamera {
    camera: Camera,
}

impl Drop for NokhwaCamera {
    fn drop(&mut self) {
        // releases the device so other applications can use it
        if let Err(err) = self.camera.stop_stream() {
            log::warn!("Failed to stop camera stream: {}", err);
        }
    }
}

impl super::CameraBackendCamera for NokhwaCamera {
    type Error = NokhwaError;

    /// The still is the current frame at the stream's native resolution.
    fn capture_still_frame(&mut self) -> Result<image::RgbaImage, NokhwaError> {
        self.camera.frame()?.decode_image::<RgbAFormat>()
    }

    fn capture_video_frame(&mut self) -> Result<image::RgbaImage, NokhwaError> {
        self.camera.frame()?.decode_image::<RgbAFormat>()
    }
}
