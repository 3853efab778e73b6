//! Lua runtime core implementation.
//!
//! This module contains the `LuaRuntime` struct which manages the Lua
//! interpreter and provides the `engine` table API to Lua scripts.

use super::meta::build_meta;
use crate::objectpool::GameObjectPool;
use crate::resources::loader::{AssetCmd, AssetRequest};
use crate::resources::registry::ResourceRegistry;
use crate::resources::resource::{ResourceKind, TextureRect};
use bevy_ecs::prelude::Entity;
use mlua::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use log::{error, info, warn};

/// Shared state accessible from Lua function closures.
/// This is stored in Lua's app_data and passed explicitly to every handler.
pub(super) struct LuaAppData {
    registry: Arc<ResourceRegistry>,
    objects: Rc<RefCell<GameObjectPool>>,
    asset_commands: RefCell<Vec<AssetCmd>>,
}

/// Lua interpreter plus the `engine` table bound to one registry and one
/// object pool.
///
/// Not `Send`: the Lua state and the object pool handle stay on the thread
/// that created them.
pub struct LuaRuntime {
    lua: Lua,
}

fn app_data(lua: &Lua) -> LuaResult<mlua::AppDataRef<'_, LuaAppData>> {
    lua.app_data_ref::<LuaAppData>()
        .ok_or_else(|| LuaError::runtime("LuaAppData not found"))
}

fn with_registry<R>(lua: &Lua, f: impl FnOnce(&ResourceRegistry) -> R) -> LuaResult<R> {
    let data = app_data(lua)?;
    Ok(f(&data.registry))
}

fn with_objects<R>(lua: &Lua, f: impl FnOnce(&mut GameObjectPool) -> R) -> LuaResult<R> {
    let data = app_data(lua)?;
    let mut pool = data
        .objects
        .try_borrow_mut()
        .map_err(|_| LuaError::runtime("object pool is busy"))?;
    Ok(f(&mut pool))
}

fn parse_kind(kind: &str) -> LuaResult<ResourceKind> {
    ResourceKind::from_name(kind)
        .ok_or_else(|| LuaError::runtime(format!("unknown resource kind '{}'", kind)))
}

/// Registers a Lua function that queues an asset request tagged with the
/// pool active at call time.
macro_rules! register_asset_cmd {
    ($engine:expr, $lua:expr, $name:expr, |$args:pat_param| $arg_ty:ty, $req:expr) => {
        $engine.set(
            $name,
            $lua.create_function(|lua, $args: $arg_ty| {
                let data = app_data(lua)?;
                let pool = data.registry.active_pool_name();
                data.asset_commands.borrow_mut().push(AssetCmd {
                    pool,
                    request: $req,
                });
                Ok(())
            })?,
        )?;
    };
}

impl LuaRuntime {
    /// Creates a new Lua runtime bound to `registry` and `objects` and
    /// registers the `engine` API.
    ///
    /// World-mask functions are only registered when `objects` was built with
    /// multi-world enabled.
    pub fn new(
        registry: Arc<ResourceRegistry>,
        objects: Rc<RefCell<GameObjectPool>>,
    ) -> LuaResult<Self> {
        let lua = Lua::new();

        // Set up the package path so `require` can find scripts in assets/scripts/
        lua.load(r#"package.path = "./assets/scripts/?.lua;./assets/scripts/?/init.lua;" .. package.path"#)
            .exec()?;

        let multi_world = objects.borrow().is_multi_world();

        lua.set_app_data(LuaAppData {
            registry,
            objects,
            asset_commands: RefCell::new(Vec::new()),
        });

        let runtime = Self { lua };
        runtime.register_base_api()?;
        runtime.register_pool_api()?;
        runtime.register_resource_api()?;
        runtime.register_asset_api()?;
        runtime.register_object_api()?;
        if multi_world {
            runtime.register_world_api()?;
        }
        runtime.register_meta()?;

        Ok(runtime)
    }

    /// Registers the base `engine` table with logging functions.
    fn register_base_api(&self) -> LuaResult<()> {
        let engine = self.lua.create_table()?;

        // engine.log(message) - General purpose logging
        engine.set(
            "log",
            self.lua.create_function(|_, msg: String| {
                info!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;

        engine.set(
            "log_info",
            self.lua.create_function(|_, msg: String| {
                info!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;

        engine.set(
            "log_warn",
            self.lua.create_function(|_, msg: String| {
                warn!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;

        engine.set(
            "log_error",
            self.lua.create_function(|_, msg: String| {
                error!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;

        self.lua.globals().set("engine", engine)?;

        Ok(())
    }

    /// Pool lifecycle and registry settings.
    fn register_pool_api(&self) -> LuaResult<()> {
        let engine: LuaTable = self.lua.globals().get("engine")?;

        engine.set(
            "create_pool",
            self.lua.create_function(|lua, name: String| {
                with_registry(lua, |r| r.create_pool(&name))
            })?,
        )?;

        engine.set(
            "remove_pool",
            self.lua.create_function(|lua, name: String| {
                with_registry(lua, |r| r.remove_pool(&name))
            })?,
        )?;

        // engine.set_active_pool(name?) - nil deactivates the custom pool
        engine.set(
            "set_active_pool",
            self.lua.create_function(|lua, name: Option<String>| {
                with_registry(lua, |r| {
                    r.set_active_pool_by_name(name.as_deref().unwrap_or(""))
                })
            })?,
        )?;

        engine.set(
            "get_active_pool",
            self.lua
                .create_function(|lua, ()| with_registry(lua, |r| r.active_pool_name()))?,
        )?;

        engine.set(
            "enumerate_pools",
            self.lua
                .create_function(|lua, ()| with_registry(lua, |r| r.enumerate_pools()))?,
        )?;

        engine.set(
            "list_resources",
            self.lua
                .create_function(|lua, (pool, kind): (String, String)| {
                    let kind = parse_kind(&kind)?;
                    with_registry(lua, |r| r.get_pool(&pool).map(|p| p.names(kind)))
                })?,
        )?;

        engine.set(
            "clear_all_resources",
            self.lua
                .create_function(|lua, ()| with_registry(lua, |r| r.clear_all_resources()))?,
        )?;

        engine.set(
            "set_resource_loading_log",
            self.lua.create_function(|_, enabled: bool| {
                ResourceRegistry::set_resource_loading_log(enabled);
                Ok(())
            })?,
        )?;

        engine.set(
            "get_resource_loading_log",
            self.lua
                .create_function(|_, ()| Ok(ResourceRegistry::resource_loading_log()))?,
        )?;

        engine.set(
            "set_image_scale",
            self.lua.create_function(|lua, scale: f32| {
                with_registry(lua, |r| r.set_image_scale_factor(scale))
            })?,
        )?;

        engine.set(
            "get_image_scale",
            self.lua
                .create_function(|lua, ()| with_registry(lua, |r| r.image_scale_factor()))?,
        )?;

        Ok(())
    }

    /// Name resolution and resource-side effects.
    fn register_resource_api(&self) -> LuaResult<()> {
        let engine: LuaTable = self.lua.globals().get("engine")?;

        engine.set(
            "has_resource",
            self.lua
                .create_function(|lua, (kind, name): (String, String)| {
                    let kind = parse_kind(&kind)?;
                    with_registry(lua, |r| r.has_resource(kind, &name))
                })?,
        )?;

        // engine.find_resource(kind, name) -> pool name or nil
        engine.set(
            "find_resource",
            self.lua
                .create_function(|lua, (kind, name): (String, String)| {
                    let kind = parse_kind(&kind)?;
                    with_registry(lua, |r| r.find_pool_of(kind, &name))
                })?,
        )?;

        // engine.get_texture_size(name) -> false | true, w, h
        engine.set(
            "get_texture_size",
            self.lua.create_function(|lua, name: String| {
                with_registry(lua, |r| match r.get_texture_size(&name) {
                    Some((w, h)) => (true, Some(w), Some(h)),
                    None => (false, None, None),
                })
            })?,
        )?;

        engine.set(
            "cache_glyphs",
            self.lua
                .create_function(|lua, (font, text): (String, String)| {
                    with_registry(lua, |r| r.cache_glyphs_for_string(&font, &text))
                })?,
        )?;

        engine.set(
            "play_sound",
            self.lua.create_function(
                |lua, (name, volume, pan): (String, Option<f32>, Option<f32>)| {
                    with_registry(lua, |r| match r.find_sound(&name) {
                        Some(snd) => {
                            snd.play(volume.unwrap_or(1.0), pan.unwrap_or(0.0));
                            true
                        }
                        None => false,
                    })
                },
            )?,
        )?;

        engine.set(
            "stop_sound",
            self.lua.create_function(|lua, name: String| {
                with_registry(lua, |r| match r.find_sound(&name) {
                    Some(snd) => {
                        snd.stop();
                        true
                    }
                    None => false,
                })
            })?,
        )?;

        Ok(())
    }

    fn register_asset_api(&self) -> LuaResult<()> {
        let engine: LuaTable = self.lua.globals().get("engine")?;
        register_asset_cmd!(engine, self.lua, "load_texture",
            |(name, path, mipmap)| (String, String, Option<bool>),
            AssetRequest::Texture { name, path, mipmap: mipmap.unwrap_or(false) });
        register_asset_cmd!(engine, self.lua, "load_sprite",
            |(name, texture, x, y, w, h)| (String, String, f32, f32, f32, f32),
            AssetRequest::Sprite { name, texture, rect: TextureRect::new(x, y, w, h) });
        register_asset_cmd!(engine, self.lua, "load_animation",
            |(name, texture, x, y, w, h, columns, rows, interval)|
            (String, String, f32, f32, f32, f32, u32, u32, Option<u32>),
            AssetRequest::Animation {
                name, texture, rect: TextureRect::new(x, y, w, h),
                columns, rows, interval: interval.unwrap_or(1),
            });
        register_asset_cmd!(engine, self.lua, "load_music",
            |(name, path, loop_start, loop_end)| (String, String, Option<f64>, Option<f64>),
            AssetRequest::Music {
                name, path,
                loop_start: loop_start.unwrap_or(0.0),
                loop_end: loop_end.unwrap_or(0.0),
            });
        register_asset_cmd!(engine, self.lua, "load_sound",
            |(name, path)| (String, String), AssetRequest::Sound { name, path });
        register_asset_cmd!(engine, self.lua, "load_particle",
            |(name, path, sprite)| (String, String, String),
            AssetRequest::Particle { name, path, sprite });
        register_asset_cmd!(engine, self.lua, "load_sprite_font",
            |(name, texture, charset, glyph_width, glyph_height, columns)|
            (String, String, String, f32, f32, u32),
            AssetRequest::SpriteFont { name, texture, charset, glyph_width, glyph_height, columns });
        register_asset_cmd!(engine, self.lua, "load_ttf",
            |(name, path, size)| (String, String, f32),
            AssetRequest::OutlineFont { name, path, size });
        register_asset_cmd!(engine, self.lua, "load_fx",
            |(name, path)| (String, String), AssetRequest::PostEffectShader { name, path });
        register_asset_cmd!(engine, self.lua, "load_model",
            |(name, path)| (String, String), AssetRequest::Model { name, path });
        Ok(())
    }

    /// Object pool query surface.
    fn register_object_api(&self) -> LuaResult<()> {
        let engine: LuaTable = self.lua.globals().get("engine")?;

        engine.set(
            "get_object_count",
            self.lua
                .create_function(|lua, ()| with_objects(lua, |p| p.object_count()))?,
        )?;

        engine.set(
            "spawn_object",
            self.lua.create_function(
                |lua, (x, y, vx, vy, bound): (f64, f64, Option<f64>, Option<f64>, Option<bool>)| {
                    with_objects(lua, |p| {
                        p.spawn(
                            x,
                            y,
                            vx.unwrap_or(0.0),
                            vy.unwrap_or(0.0),
                            bound.unwrap_or(true),
                        )
                        .to_bits()
                    })
                },
            )?,
        )?;

        engine.set(
            "despawn_object",
            self.lua.create_function(|lua, id: u64| {
                with_objects(lua, |p| p.despawn(Entity::from_bits(id)))
            })?,
        )?;

        // engine.get_object_position(id) -> x, y | nil
        engine.set(
            "get_object_position",
            self.lua.create_function(|lua, id: u64| {
                with_objects(lua, |p| match p.position(Entity::from_bits(id)) {
                    Some((x, y)) => (Some(x), Some(y)),
                    None => (None, None),
                })
            })?,
        )?;

        engine.set(
            "set_object_velocity",
            self.lua
                .create_function(|lua, (id, vx, vy): (u64, f64, f64)| {
                    with_objects(lua, |p| p.set_velocity(Entity::from_bits(id), vx, vy))
                })?,
        )?;

        engine.set(
            "set_world_bound",
            self.lua.create_function(
                |lua, (left, right, bottom, top): (f64, f64, f64, f64)| {
                    with_objects(lua, |p| p.set_bound(left, right, bottom, top))
                },
            )?,
        )?;

        engine.set(
            "get_world_bound",
            self.lua
                .create_function(|lua, ()| with_objects(lua, |p| p.bound()))?,
        )?;

        engine.set(
            "refresh_coordinates",
            self.lua
                .create_function(|lua, ()| with_objects(lua, |p| p.refresh_coordinates()))?,
        )?;

        engine.set(
            "get_super_pause",
            self.lua
                .create_function(|lua, ()| with_objects(lua, |p| p.super_pause()))?,
        )?;

        engine.set(
            "set_super_pause",
            self.lua.create_function(|lua, frames: i64| {
                with_objects(lua, |p| p.set_super_pause(frames))
            })?,
        )?;

        engine.set(
            "add_super_pause",
            self.lua.create_function(|lua, frames: Option<i64>| {
                with_objects(lua, |p| p.add_super_pause(frames.unwrap_or(1)))
            })?,
        )?;

        engine.set(
            "get_elapsed_super_pause",
            self.lua
                .create_function(|lua, ()| with_objects(lua, |p| p.elapsed_super_pause()))?,
        )?;

        Ok(())
    }

    /// World-mask functions, registered only for multi-world object pools.
    fn register_world_api(&self) -> LuaResult<()> {
        let engine: LuaTable = self.lua.globals().get("engine")?;

        fn with_worlds<R>(
            lua: &Lua,
            f: impl FnOnce(&mut crate::objectpool::MultiWorld<'_>) -> R,
        ) -> LuaResult<R> {
            with_objects(lua, |p| p.multi_world().map(|mut mw| f(&mut mw)))?
                .ok_or_else(|| LuaError::runtime("multi-world is not enabled"))
        }

        engine.set(
            "get_world_flag",
            self.lua
                .create_function(|lua, ()| with_worlds(lua, |mw| mw.world_flag()))?,
        )?;

        engine.set(
            "set_world_flag",
            self.lua.create_function(|lua, flag: u32| {
                with_worlds(lua, |mw| mw.set_world_flag(flag))
            })?,
        )?;

        engine.set(
            "is_same_world",
            self.lua
                .create_function(|lua, (a, b): (u32, u32)| with_worlds(lua, |mw| mw.is_same_world(a, b)))?,
        )?;

        engine.set(
            "set_active_worlds",
            self.lua.create_function(|lua, mask: Option<u32>| {
                with_worlds(lua, |mw| mw.set_active_worlds(mask.unwrap_or(0)))
            })?,
        )?;

        engine.set(
            "get_active_worlds",
            self.lua
                .create_function(|lua, ()| with_worlds(lua, |mw| mw.active_worlds()))?,
        )?;

        engine.set(
            "get_current_object",
            self.lua.create_function(|lua, ()| {
                with_worlds(lua, |mw| mw.current_object().map(|e| e.to_bits()))
            })?,
        )?;

        Ok(())
    }

    fn register_meta(&self) -> LuaResult<()> {
        let engine: LuaTable = self.lua.globals().get("engine")?;
        let meta = build_meta(&self.lua, &engine)?;
        engine.set("__meta", meta)?;
        Ok(())
    }

    /// Drains all queued asset commands.
    ///
    /// Feed the result to
    /// [`process_asset_commands`](crate::systems::assetcommands::process_asset_commands).
    pub fn drain_asset_commands(&self) -> Vec<AssetCmd> {
        self.lua
            .app_data_ref::<LuaAppData>()
            .map(|data| data.asset_commands.borrow_mut().drain(..).collect())
            .unwrap_or_default()
    }

    /// Runs one object pool frame, calling the global Lua function `callback`
    /// (if defined) for every object due for an update.
    ///
    /// The object pool is not borrowed while the callback runs, so it can
    /// query the pool freely. Returns the number of objects updated.
    ///
    /// # Errors
    ///
    /// Returns the first callback error. The frame is still finished.
    pub fn run_object_frame(&self, callback: &str) -> LuaResult<usize> {
        let objects = app_data(&self.lua)?.objects.clone();
        let func = self.lua.globals().get::<LuaFunction>(callback).ok();

        let due = objects.borrow_mut().begin_frame();
        let mut updated = 0;
        let mut result = Ok(());
        for entity in due {
            let entered = objects.borrow_mut().enter_object(entity);
            if !entered {
                continue;
            }
            updated += 1;
            if let Some(ref f) = func
                && let Err(e) = f.call::<()>(entity.to_bits())
            {
                result = Err(e);
                break;
            }
        }
        objects.borrow_mut().end_frame();
        result.map(|_| updated)
    }

    /// Loads and executes a Lua script file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the script has syntax/runtime errors.
    pub fn run_script(&self, path: &str) -> LuaResult<()> {
        let script = std::fs::read_to_string(path)
            .map_err(|e| LuaError::ExternalError(std::sync::Arc::new(e)))?;
        self.lua.load(&script).set_name(path).exec()
    }

    /// Calls a global Lua function by name with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the function doesn't exist or execution fails.
    pub fn call_function<A, R>(&self, name: &str, args: A) -> LuaResult<R>
    where
        A: IntoLuaMulti,
        R: FromLuaMulti,
    {
        let func: LuaFunction = self.lua.globals().get(name)?;
        func.call(args)
    }

    /// Checks if a global function exists.
    pub fn has_function(&self, name: &str) -> bool {
        self.lua.globals().get::<LuaFunction>(name).is_ok()
    }

    /// Returns a reference to the underlying Lua state.
    pub fn lua(&self) -> &Lua {
        &self.lua
    }
}
