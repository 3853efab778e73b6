//! stagepool library.
//!
//! A multi-pool runtime resource registry plus the query surface of a live
//! game object pool, with an optional Lua binding.
//!
//! - [`resources`] – resource types, pools, the registry, config and loaders
//! - [`objectpool`] – the game object pool facet
//! - [`components`] – ECS components of live objects
//! - [`systems`] – object pool frame systems, asset command processing, audio thread
//! - [`events`] – audio commands and messages

pub mod components;
pub mod events;
pub mod objectpool;
pub mod resources;
pub mod systems;

#[cfg(feature = "lua")]
pub mod luarc_generator;
#[cfg(feature = "lua")]
pub mod stub_generator;
