// src/config/mod.rs

//! Jobs file loading and validation.
//!
//! - `model.rs`: the serde data model and the validated `TaskDefinition`.
//! - `loader.rs`: read a TOML/YAML file from disk.
//! - `validate.rs`: turn a `RawConfigFile` into a `ConfigFile`.

pub mod duration;
pub mod loader;
pub mod model;
pub mod storage;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, JobConfig, RawConfigFile, TaskDefinition};
pub use storage::StorageSettings;
