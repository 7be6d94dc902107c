// ABOUTME: Custom error page rendering for the edge
// ABOUTME: Template discovery, caching and response synthesis behind injectable stores

pub mod cell;
pub mod config_store;
pub mod error;
pub mod event;
pub mod handler;
pub mod object_store;
pub mod resolver;
pub mod settings;
pub mod sigv4;
pub mod template;

#[cfg(target_arch = "wasm32")]
pub mod params;
#[cfg(target_arch = "wasm32")]
pub mod storage;

pub use crate::config_store::{ConfigEntry, ConfigProvider, MemoryConfigStore};
pub use crate::error::{ConfigLookupError, HandlerError, Result, SettingsError, TemplateFetchError};
pub use crate::event::{Outcome, ViewerEvent, ViewerRequest, ViewerResponse};
pub use crate::handler::{ErrorPageHandler, Phase};
pub use crate::object_store::{MemoryObjectStore, ObjectStore};
pub use crate::settings::{CacheMode, FailurePolicy, Settings};
