use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use iced::widget::image::Handle;
use iced::Task;
use image::RgbaImage;

use crate::backend::still;

const RETRY_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub enum CameraMessage {
    CaptureFrame,
    NewFrame(Result<(Handle, (u32, u32)), String>),
}

/// Live camera preview.
///
/// Frames are pulled one at a time on a blocking thread; each new frame
/// schedules the next read. The camera is released when the last clone of
/// the feed (and any in-flight read) is dropped.
#[derive(Debug, Clone)]
pub struct CameraFeed<C: crate::backend::cameras::CameraBackendCamera + 'static> {
    camera: Arc<Mutex<C>>,
    current_frame: Option<Handle>,
    stream_size: Option<(u32, u32)>,
    options: CameraFeedOptions,
}

#[derive(Debug, Clone, Copy)]
pub struct CameraFeedOptions {
    pub mirror: bool,
    /// Preview frames are shrunk by this factor before display.
    pub preview_downscale: f32,
}

impl Default for CameraFeedOptions {
    fn default() -> Self {
        Self {
            mirror: true,
            preview_downscale: 1.4,
        }
    }
}

impl<C: crate::backend::cameras::CameraBackendCamera + 'static> CameraFeed<C> {
    pub fn new(camera: C, options: CameraFeedOptions) -> (Self, Task<CameraMessage>) {
        (
            CameraFeed {
                camera: Arc::new(Mutex::new(camera)),
                current_frame: None,
                stream_size: None,
                options,
            },
            Task::done(CameraMessage::CaptureFrame),
        )
    }

    /// Native size of the stream, known once the first frame arrived.
    pub fn stream_size(&self) -> Option<(u32, u32)> {
        self.stream_size
    }

    /// Grabs a full-resolution still and encodes it as a stored photo.
    pub fn capture_still(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, String>> + Send + 'static {
        let cloned_camera = self.camera.clone();
        async move {
            tokio::task::spawn_blocking(move || -> Result<Vec<u8>, String> {
                let frame = cloned_camera
                    .lock()
                    .expect("failed to lock camera mutex")
                    .capture_still_frame()
                    .map_err(|err| err.to_string())?;
                still::encode_still(frame).map_err(|err| err.to_string())
            })
            .await
            .map_err(|err| format!("capture task failed: {err}"))?
        }
    }

    pub fn update(&mut self, message: CameraMessage) -> Task<CameraMessage> {
        match message {
            CameraMessage::CaptureFrame => {
                let cloned_camera = self.camera.clone();
                let options = self.options;
                Task::perform(
                    async move {
                        tokio::task::spawn_blocking(move || -> Result<_, String> {
                            let frame = cloned_camera
                                .lock()
                                .expect("failed to lock camera mutex")
                                .capture_video_frame()
                                .map_err(|err| err.to_string())?;
                            let size = frame.dimensions();
                            let frame = preview_postprocessing(frame, options);

                            // output a handle
                            Ok((
                                Handle::from_rgba(frame.width(), frame.height(), frame.into_raw()),
                                size,
                            ))
                        })
                        .await
                        .map_err(|err| format!("frame task failed: {err}"))?
                    },
                    CameraMessage::NewFrame,
                )
            }
            CameraMessage::NewFrame(Ok((handle, size))) => {
                if self.stream_size.is_none() {
                    log::info!("Camera stream is {}x{}", size.0, size.1);
                    self.stream_size = Some(size);
                }
                self.current_frame = Some(handle);
                Task::done(CameraMessage::CaptureFrame)
            }
            CameraMessage::NewFrame(Err(err)) => {
                log::warn!("Failed to read a camera frame: {}", err);
                Task::perform(tokio::time::sleep(RETRY_DELAY), |_| {
                    CameraMessage::CaptureFrame
                })
            }
        }
    }

    /// Get the image handle of the current frame.
    pub fn handle(&self) -> Handle {
        self.current_frame
            .clone()
            .unwrap_or_else(|| Handle::from_rgba(0, 0, vec![]))
    }

    /// Wrap the current frame in an `Image` widget.
    pub fn view(&self) -> iced::widget::image::Image<Handle> {
        iced::widget::Image::new(self.handle())
    }
}

fn preview_postprocessing(mut frame: RgbaImage, options: CameraFeedOptions) -> RgbaImage {
    // the subject expects to see a mirror
    if options.mirror {
        image::imageops::flip_horizontal_in_place(&mut frame);
    }
    if options.preview_downscale <= 1.0 {
        return frame;
    }
    image::imageops::resize(
        &frame,
        ((frame.width() as f32) / options.preview_downscale) as u32,
        ((frame.height() as f32) / options.preview_downscale) as u32,
        image::imageops::FilterType::Triangle,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_is_mirrored_and_shrunk() {
        let mut frame = RgbaImage::from_pixel(140, 70, image::Rgba([0, 0, 0, 255]));
        frame.put_pixel(0, 0, image::Rgba([255, 255, 255, 255]));
        let options = CameraFeedOptions {
            mirror: true,
            preview_downscale: 1.0,
        };
        let preview = preview_postprocessing(frame.clone(), options);
        assert_eq!(preview.get_pixel(139, 0).0, [255, 255, 255, 255]);

        let shrunk = preview_postprocessing(frame, CameraFeedOptions::default());
        assert_eq!(shrunk.dimensions(), (100, 50));
    }
}
