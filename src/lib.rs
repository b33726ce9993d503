#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod asset_paths;
pub mod builder;
pub mod config;
pub mod error;
pub mod manifest;
pub mod models;
pub mod project;
pub mod resolver;
pub mod serve;
pub mod store;
pub mod styles;

pub use builder::ManifestBuilder;
pub use config::{AppcacheConfig, LoadedConfig};
pub use error::{ManifestError, ManifestResult};
pub use models::{Manifest, ManifestSections, ResolvedAsset};
pub use project::{AppcacheSettings, PathSource};
pub use serve::{ManifestServer, manifest_attribute};
pub use store::ManifestStore;
