//! Persistence for backdrop.
//!
//! Settings live in a TOML file that is replaced as a whole on save.
//! Larger media lives under the data directory: a small JSON key/value
//! document for the image data URL plus two blob directories, one keyed
//! (the backdrop video) and one auto-incrementing (voice messages).

mod media;
mod paths;
mod settings;
mod store;

pub use media::{Backdrop, MediaRepository, decode_data_url, mime_for_path};
pub use paths::{CONFIG_ENV, Paths};
pub use settings::{Settings, load_settings, normalize_subreddits};
pub use store::{
    BlobStore, FileBlobStore, FileKeyValueStore, FileSettingsStore, KeyValueStore,
    MemoryBlobStore, MemoryKeyValueStore, MemorySettingsStore, SettingsStore,
};
