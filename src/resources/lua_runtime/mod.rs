//! Lua scripting binding for the resource registry and the object pool.
//!
//! Every handler reaches the registry and the object pool through the
//! context stored in Lua's app data, never through a global.
//!
//! - [`runtime`] - the [`LuaRuntime`] and the `engine` table API
//! - [`meta`] - `engine.__meta`, consumed by the stub and luarc generators
//!
//! # Example
//!
//! ```lua
//! engine.create_pool("level1")
//! engine.set_active_pool("level1")
//! engine.load_texture("bg", "assets/textures/bg.png")
//! engine.load_sprite("ship", "atlas", 0, 0, 32, 32)
//!
//! local found, w, h = engine.get_texture_size("bg")
//! engine.set_super_pause(30)
//! ```

mod meta;
mod runtime;

pub use runtime::LuaRuntime;
