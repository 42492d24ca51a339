pub mod camera_feed;
pub mod capture;
pub mod compose;
pub mod landing;
pub mod selection;
pub mod title_overlay;
