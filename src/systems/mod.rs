//! Systems and processors run by the host each frame.
//!
//! Submodules overview
//! - [`objectpool`] – super pause swap, velocity integration, bound check, coordinate refresh
//! - [`assetcommands`] – turn queued asset commands into loaded resources
//! - [`audio`] – the background audio thread and message polling

pub mod assetcommands;
pub mod audio;
pub mod objectpool;
