//! Typed repository for uploaded media.

use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD};
use color_eyre::eyre::{Result, WrapErr, bail};
use serde_json::Value;

use crate::store::{
    BlobStore, FileBlobStore, FileKeyValueStore, KeyValueStore, MemoryBlobStore,
    MemoryKeyValueStore,
};

const IMAGE_KEY: &str = "customImg";
const VIDEO_KEY: &str = "customVideo";

/// The current backdrop. An image and a video never coexist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backdrop {
    /// A `data:` URL.
    Image(String),
    Video(Vec<u8>),
}

/// Background media and voice messages.
pub struct MediaRepository {
    local: Box<dyn KeyValueStore>,
    videos: Box<dyn BlobStore>,
    audios: Box<dyn BlobStore>,
}

impl std::fmt::Debug for MediaRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaRepository").finish_non_exhaustive()
    }
}

impl MediaRepository {
    pub fn new(
        local: Box<dyn KeyValueStore>,
        videos: Box<dyn BlobStore>,
        audios: Box<dyn BlobStore>,
    ) -> Self {
        Self {
            local,
            videos,
            audios,
        }
    }

    /// Repository backed by files under `data_dir`.
    pub fn open(data_dir: &Path) -> Self {
        Self::new(
            Box::new(FileKeyValueStore::new(data_dir.join("local.json"))),
            Box::new(FileBlobStore::new(data_dir.join("videos"))),
            Box::new(FileBlobStore::new(data_dir.join("audios"))),
        )
    }

    pub fn in_memory() -> Self {
        Self::new(
            Box::new(MemoryKeyValueStore::default()),
            Box::new(MemoryBlobStore::default()),
            Box::new(MemoryBlobStore::default()),
        )
    }

    /// Store an image as a data URL and drop any video.
    pub fn save_image(&mut self, bytes: &[u8], mime: &str) -> Result<String> {
        let url = format!("data:{mime};base64,{}", STANDARD.encode(bytes));
        self.local.set(IMAGE_KEY, Value::String(url.clone()))?;
        self.videos.delete(VIDEO_KEY)?;
        Ok(url)
    }

    /// Store a video and drop any image.
    pub fn save_video(&mut self, bytes: &[u8]) -> Result<()> {
        self.videos.put(VIDEO_KEY, bytes)?;
        self.local.remove(IMAGE_KEY)
    }

    /// The stored backdrop. If both are somehow present the image wins.
    pub fn background(&self) -> Result<Option<Backdrop>> {
        if let Some(Value::String(url)) = self.local.get(IMAGE_KEY)? {
            return Ok(Some(Backdrop::Image(url)));
        }
        Ok(self.videos.get(VIDEO_KEY)?.map(Backdrop::Video))
    }

    pub fn clear_background(&mut self) -> Result<()> {
        self.local.remove(IMAGE_KEY)?;
        self.videos.delete(VIDEO_KEY)
    }

    /// Append a voice message, returning its key.
    pub fn add_voice_message(&mut self, bytes: &[u8]) -> Result<u64> {
        self.audios.add(bytes)
    }

    /// All voice messages in upload order.
    pub fn voice_messages(&self) -> Result<Vec<Vec<u8>>> {
        self.audios.get_all()
    }

    pub fn clear_voice_messages(&mut self) -> Result<()> {
        self.audios.clear()
    }

    /// Remove every stored blob.
    pub fn clear_all(&mut self) -> Result<()> {
        self.local.clear()?;
        self.videos.clear()?;
        self.audios.clear()
    }
}

/// Payload bytes of a base64 `data:` URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let Some((_, payload)) = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
    else {
        bail!("not a base64 data URL");
    };
    STANDARD.decode(payload).wrap_err("invalid base64 payload")
}

/// Guess an image mime type from the file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}
