//! Hands captured photos from the capture screen to the compose screen.
//!
//! The store is a directory of JSON documents, one per key. Only one screen
//! writes at a time, and the compose screen deletes the entry once it has
//! read it.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};

pub const PHOTOS_KEY: &str = "nocturne-photos";

const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    #[error("handoff store i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("handoff payload is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("photo {index} is not a base64 data url")]
    NotADataUrl { index: usize },
    #[error("photo {index} has invalid base64: {source}")]
    Base64 {
        index: usize,
        source: base64::DecodeError,
    },
}

/// The captured session: encoded photos in capture order plus the
/// orientation of the stream they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoSet {
    pub photos: Vec<Vec<u8>>,
    pub is_landscape: bool,
}

/// What the compose screen gets back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
    pub photo_set: PhotoSet,
    pub overlay: Option<String>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct Payload {
    photos: Vec<String>,
    #[serde(default = "default_is_landscape")]
    is_landscape: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    overlay: Option<String>,
}

fn default_is_landscape() -> bool {
    true
}

#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum StoredPayload {
    Session(Payload),
    // Older captures stored only the photo list.
    Legacy(Vec<String>),
}

/// A last-write-wins key/value store rooted at a directory.
#[derive(Debug, Clone)]
pub struct HandoffStore {
    dir: PathBuf,
}

impl HandoffStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        HandoffStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, HandoffError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), HandoffError> {
        fs::create_dir_all(&self.dir)?;
        // Write then rename so a reader never sees half a payload.
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, self.path_for(key))?;
        log::debug!("Wrote {} bytes to {}", value.len(), key);
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), HandoffError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Stores a freshly captured photo set, replacing whatever was there.
    pub fn put_photos(&self, photo_set: &PhotoSet) -> Result<(), HandoffError> {
        self.put(photo_set, None)
    }

    /// Rewrites the entry with the chosen overlay so it survives a reload of
    /// the compose screen.
    pub fn put_overlay(&self, photo_set: &PhotoSet, overlay: &str) -> Result<(), HandoffError> {
        self.put(photo_set, Some(overlay.to_string()))
    }

    fn put(&self, photo_set: &PhotoSet, overlay: Option<String>) -> Result<(), HandoffError> {
        let payload = Payload {
            photos: photo_set.photos.iter().map(|p| encode_data_url(p)).collect(),
            is_landscape: photo_set.is_landscape,
            overlay,
        };
        self.set(PHOTOS_KEY, &serde_json::to_string(&payload)?)
    }

    /// Reads the photo entry without consuming it. An entry with no photos
    /// counts as absent.
    pub fn peek(&self) -> Result<Option<Handoff>, HandoffError> {
        let Some(raw) = self.get(PHOTOS_KEY)? else {
            return Ok(None);
        };
        let payload = match serde_json::from_str::<StoredPayload>(&raw)? {
            StoredPayload::Session(payload) => payload,
            StoredPayload::Legacy(photos) => Payload {
                photos,
                is_landscape: default_is_landscape(),
                overlay: None,
            },
        };
        if payload.photos.is_empty() {
            return Ok(None);
        }

        let photos = payload
            .photos
            .iter()
            .enumerate()
            .map(|(index, url)| decode_data_url(url, index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Handoff {
            photo_set: PhotoSet {
                photos,
                is_landscape: payload.is_landscape,
            },
            overlay: payload.overlay,
        }))
    }

    /// Reads and deletes the photo entry.
    pub fn take(&self) -> Result<Option<Handoff>, HandoffError> {
        let handoff = self.peek()?;
        if handoff.is_some() {
            self.remove(PHOTOS_KEY)?;
            log::debug!("Consumed {}", PHOTOS_KEY);
        }
        Ok(handoff)
    }
}

pub fn encode_data_url(jpeg: &[u8]) -> String {
    format!("{JPEG_DATA_URL_PREFIX}{}", BASE64_STANDARD.encode(jpeg))
}

fn decode_data_url(url: &str, index: usize) -> Result<Vec<u8>, HandoffError> {
    let (header, data) = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or(HandoffError::NotADataUrl { index })?;
    if !header.ends_with(";base64") {
        return Err(HandoffError::NotADataUrl { index });
    }
    BASE64_STANDARD
        .decode(data)
        .map_err(|source| HandoffError::Base64 { index, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo_set() -> PhotoSet {
        PhotoSet {
            photos: vec![vec![0xFF, 0xD8, 1, 2, 3], vec![0xFF, 0xD8, 4, 5, 6]],
            is_landscape: false,
        }
    }

    #[test]
    fn empty_store_has_no_photos() {
        let dir = tempfile::tempdir().unwrap();
        let store = HandoffStore::new(dir.path().join("store"));
        assert_eq!(store.peek().unwrap(), None);
        assert_eq!(store.take().unwrap(), None);
    }

    #[test]
    fn take_returns_photos_in_order_and_deletes_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = HandoffStore::new(dir.path());
        store.put_photos(&photo_set()).unwrap();

        let handoff = store.take().unwrap().unwrap();
        assert_eq!(handoff.photo_set, photo_set());
        assert_eq!(handoff.overlay, None);
        assert_eq!(store.get(PHOTOS_KEY).unwrap(), None);
    }

    #[test]
    fn payload_uses_the_browser_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = HandoffStore::new(dir.path());
        store.put_overlay(&photo_set(), "vertical-overlay2.svg").unwrap();

        let raw = store.get(PHOTOS_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["isLandscape"], false);
        assert_eq!(json["overlay"], "vertical-overlay2.svg");
        assert!(json["photos"][0]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn overlay_survives_a_reread() {
        let dir = tempfile::tempdir().unwrap();
        let store = HandoffStore::new(dir.path());
        store.put_overlay(&photo_set(), "vertical-overlay4.svg").unwrap();
        let handoff = store.peek().unwrap().unwrap();
        assert_eq!(handoff.overlay.as_deref(), Some("vertical-overlay4.svg"));
        assert!(store.peek().unwrap().is_some());
    }

    #[test]
    fn later_writes_win() {
        let dir = tempfile::tempdir().unwrap();
        let store = HandoffStore::new(dir.path());
        store.put_photos(&photo_set()).unwrap();
        let replacement = PhotoSet {
            photos: vec![vec![9]],
            is_landscape: true,
        };
        store.put_photos(&replacement).unwrap();
        assert_eq!(store.take().unwrap().unwrap().photo_set, replacement);
    }

    #[test]
    fn legacy_array_payload_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let store = HandoffStore::new(dir.path());
        let url = encode_data_url(&[1, 2, 3]);
        store
            .set(PHOTOS_KEY, &serde_json::to_string(&[url]).unwrap())
            .unwrap();
        let handoff = store.take().unwrap().unwrap();
        assert_eq!(handoff.photo_set.photos, vec![vec![1, 2, 3]]);
        assert!(handoff.photo_set.is_landscape);
    }

    #[test]
    fn payload_without_photos_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = HandoffStore::new(dir.path());
        store
            .set(PHOTOS_KEY, r#"{"photos": [], "isLandscape": true}"#)
            .unwrap();
        assert_eq!(store.take().unwrap(), None);
        store.set(PHOTOS_KEY, r#"{"isLandscape": true}"#).unwrap();
        assert!(matches!(store.take(), Err(HandoffError::Json(_))));
    }

    #[test]
    fn malformed_payloads_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = HandoffStore::new(dir.path());
        store.set(PHOTOS_KEY, "not json").unwrap();
        assert!(matches!(store.peek(), Err(HandoffError::Json(_))));

        store
            .set(PHOTOS_KEY, r#"{"photos": ["https://example.com/a.jpg"]}"#)
            .unwrap();
        assert!(matches!(
            store.peek(),
            Err(HandoffError::NotADataUrl { index: 0 })
        ));

        store
            .set(PHOTOS_KEY, r#"{"photos": ["data:image/jpeg;base64,!!!"]}"#)
            .unwrap();
        assert!(matches!(
            store.peek(),
            Err(HandoffError::Base64 { index: 0, .. })
        ));
    }
}
