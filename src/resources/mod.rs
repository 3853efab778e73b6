//! Long-lived state: loaded resources, their pools and the registry, plus
//! the object pool's ECS resources and host configuration.
//!
//! Overview
//! - `resource` – the ten resource kinds and the type-erased handle
//! - `resourcepool` – one named pool, one map per kind
//! - `registry` – built-in and custom pools, active pool, precedence lookup
//! - `loader` – asset requests and the loader seam
//! - `objectpool` – world bound, super pause, world masks, current object
//! - `poolconfig` – INI configuration
//! - `audio` – bridge and channels for the background audio thread
//! - `lua_runtime` – the `engine` table binding (feature `lua`)
pub mod audio;
pub mod loader;
#[cfg(feature = "lua")]
pub mod lua_runtime;
pub mod objectpool;
pub mod poolconfig;
pub mod registry;
pub mod resource;
pub mod resourcepool;
