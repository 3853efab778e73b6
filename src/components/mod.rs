//! ECS components attached to live game objects.
//!
//! - `gameobject` – object tag with world mask, plus position/velocity
pub mod gameobject;
