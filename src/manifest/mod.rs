//! YAML manifests describing test units, their metadata and shell commands.

pub mod loader;
pub mod model;

pub use loader::{LoadedManifest, load_from_path, load_home_list, load_registry, parse};
pub use model::{InfoFields, Manifest, ManifestEntry, ManifestMethod};
