//! Metadata describing the `engine` table.
//!
//! Published to scripts as `engine.__meta` and consumed by the stub and
//! `.luarc.json` generators. Only functions actually registered on the
//! `engine` table are published, so the multi-world entries disappear when
//! the object pool is built without world masks.

use mlua::prelude::*;

use crate::resources::resource::ResourceKind;

pub(super) struct FnDoc {
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub params: &'static [(&'static str, &'static str)],
    pub returns: Option<&'static str>,
}

pub(super) struct CallbackDoc {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [(&'static str, &'static str)],
}

macro_rules! fn_doc {
    ($cat:literal, $name:literal, $desc:literal, [$(($p:literal, $t:literal)),* $(,)?]) => {
        FnDoc { name: $name, category: $cat, description: $desc, params: &[$(($p, $t)),*], returns: None }
    };
    ($cat:literal, $name:literal, $desc:literal, [$(($p:literal, $t:literal)),* $(,)?] -> $ret:literal) => {
        FnDoc { name: $name, category: $cat, description: $desc, params: &[$(($p, $t)),*], returns: Some($ret) }
    };
}

pub(super) const FUNCTIONS: &[FnDoc] = &[
    fn_doc!("base", "log", "Log a message at info level", [("message", "string")]),
    fn_doc!("base", "log_info", "Log a message at info level", [("message", "string")]),
    fn_doc!("base", "log_warn", "Log a message at warn level", [("message", "string")]),
    fn_doc!("base", "log_error", "Log a message at error level", [("message", "string")]),
    // pool
    fn_doc!("pool", "create_pool", "Create an empty custom resource pool.\nFails for empty, reserved or existing names.",
        [("name", "string")] -> "boolean"),
    fn_doc!("pool", "remove_pool", "Clear and remove a custom resource pool", [("name", "string")] -> "boolean"),
    fn_doc!("pool", "set_active_pool", "Select the pool receiving loads.\n\"global\"/\"stage\" select a built-in pool, nil or \"\" deactivates the custom pool.",
        [("name", "string?")] -> "boolean"),
    fn_doc!("pool", "get_active_pool", "Name of the pool receiving loads", [] -> "string"),
    fn_doc!("pool", "enumerate_pools", "All pool names, \"global\" and \"stage\" first", [] -> "string[]"),
    fn_doc!("pool", "list_resources", "Names of every resource of a kind in one pool, nil if the pool does not exist",
        [("pool", "string"), ("kind", "ResourceKind")] -> "string[]?"),
    fn_doc!("pool", "clear_all_resources", "Empty the global and stage pools and restore defaults", []),
    fn_doc!("pool", "set_resource_loading_log", "Toggle logging of resource loads", [("enabled", "boolean")]),
    fn_doc!("pool", "get_resource_loading_log", "Whether resource loads are logged", [] -> "boolean"),
    fn_doc!("pool", "set_image_scale", "Set the global image scale factor", [("scale", "number")]),
    fn_doc!("pool", "get_image_scale", "Global image scale factor", [] -> "number"),
    // resource
    fn_doc!("resource", "has_resource", "Whether a name resolves to a resource of the given kind in any pool",
        [("kind", "ResourceKind"), ("name", "string")] -> "boolean"),
    fn_doc!("resource", "find_resource", "Name of the pool a resource resolves from, nil if not found",
        [("kind", "ResourceKind"), ("name", "string")] -> "string?"),
    fn_doc!("resource", "get_texture_size", "Pixel size of a texture.\nReturns false when the texture is not found, otherwise true, width, height.",
        [("name", "string")] -> "boolean"),
    fn_doc!("resource", "cache_glyphs", "Cache the glyphs of a string in an outline font", [("font", "string"), ("text", "string")]),
    fn_doc!("resource", "play_sound", "Buffer a sound effect play request for this frame",
        [("name", "string"), ("volume", "number?"), ("pan", "number?")] -> "boolean"),
    fn_doc!("resource", "stop_sound", "Buffer a sound effect stop request for this frame", [("name", "string")] -> "boolean"),
    // asset
    fn_doc!("asset", "load_texture", "Queue a texture load into the active pool",
        [("name", "string"), ("path", "string"), ("mipmap", "boolean?")]),
    fn_doc!("asset", "load_sprite", "Queue a sprite cut from a loaded texture",
        [("name", "string"), ("texture", "string"), ("x", "number"), ("y", "number"), ("w", "number"), ("h", "number")]),
    fn_doc!("asset", "load_animation", "Queue an animation grid cut from a loaded texture",
        [("name", "string"), ("texture", "string"), ("x", "number"), ("y", "number"), ("w", "number"), ("h", "number"),
         ("columns", "integer"), ("rows", "integer"), ("interval", "integer?")]),
    fn_doc!("asset", "load_music", "Queue a music track load",
        [("name", "string"), ("path", "string"), ("loop_start", "number?"), ("loop_end", "number?")]),
    fn_doc!("asset", "load_sound", "Queue a sound effect load", [("name", "string"), ("path", "string")]),
    fn_doc!("asset", "load_particle", "Queue a particle definition load",
        [("name", "string"), ("path", "string"), ("sprite", "string")]),
    fn_doc!("asset", "load_sprite_font", "Queue a fixed-grid sprite font cut from a loaded texture",
        [("name", "string"), ("texture", "string"), ("charset", "string"), ("glyph_width", "number"),
         ("glyph_height", "number"), ("columns", "integer")]),
    fn_doc!("asset", "load_ttf", "Queue an outline font load", [("name", "string"), ("path", "string"), ("size", "number")]),
    fn_doc!("asset", "load_fx", "Queue a post-effect shader load", [("name", "string"), ("path", "string")]),
    fn_doc!("asset", "load_model", "Queue a model load", [("name", "string"), ("path", "string")]),
    // object
    fn_doc!("object", "get_object_count", "Number of live objects", [] -> "integer"),
    fn_doc!("object", "spawn_object", "Spawn an object in the current world flag",
        [("x", "number"), ("y", "number"), ("vx", "number?"), ("vy", "number?"), ("bound", "boolean?")] -> "integer"),
    fn_doc!("object", "despawn_object", "Remove an object", [("id", "integer")] -> "boolean"),
    fn_doc!("object", "get_object_position", "Position of an object, nil if it does not exist", [("id", "integer")] -> "number?"),
    fn_doc!("object", "set_object_velocity", "Set the velocity of an object",
        [("id", "integer"), ("vx", "number"), ("vy", "number")] -> "boolean"),
    fn_doc!("object", "set_world_bound", "Set the world bounding rectangle",
        [("left", "number"), ("right", "number"), ("bottom", "number"), ("top", "number")]),
    fn_doc!("object", "get_world_bound", "World bounding rectangle as left, right, bottom, top", [] -> "number"),
    fn_doc!("object", "refresh_coordinates", "Recompute per-object displacement since the last refresh", []),
    fn_doc!("object", "get_super_pause", "Super pause value applying from the next frame", [] -> "integer"),
    fn_doc!("object", "set_super_pause", "Skip object updates for the given number of frames, starting next frame",
        [("frames", "integer")]),
    fn_doc!("object", "add_super_pause", "Add to the next-frame super pause value", [("frames", "integer?")]),
    fn_doc!("object", "get_elapsed_super_pause", "Super pause value in effect this frame", [] -> "integer"),
    // world
    fn_doc!("world", "get_world_flag", "World flag given to newly spawned objects", [] -> "integer"),
    fn_doc!("world", "set_world_flag", "Set the world flag given to newly spawned objects", [("flag", "integer")]),
    fn_doc!("world", "is_same_world", "Whether two world masks share a world", [("a", "integer"), ("b", "integer")] -> "boolean"),
    fn_doc!("world", "set_active_worlds", "Restrict updates to the given worlds; 0 or nil selects all", [("mask", "integer?")]),
    fn_doc!("world", "get_active_worlds", "Mask of worlds being updated", [] -> "integer"),
    fn_doc!("world", "get_current_object", "Object being updated, nil outside an update traversal", [] -> "integer?"),
];

pub(super) const CALLBACKS: &[CallbackDoc] = &[
    CallbackDoc {
        name: "on_frame",
        description: "Called once per frame before objects are updated",
        params: &[("frame", "integer")],
    },
    CallbackDoc {
        name: "on_object_update",
        description: "Called for every object due for an update while it is the current object",
        params: &[("id", "integer")],
    },
];

fn params_table(lua: &Lua, params: &[(&str, &str)]) -> LuaResult<LuaTable> {
    let tbl = lua.create_table()?;
    for (i, (name, ty)) in params.iter().enumerate() {
        let p = lua.create_table()?;
        p.set("name", *name)?;
        p.set("type", *ty)?;
        tbl.set(i + 1, p)?;
    }
    Ok(tbl)
}

/// Builds `engine.__meta` for every registered function.
pub(super) fn build_meta(lua: &Lua, engine: &LuaTable) -> LuaResult<LuaTable> {
    let meta = lua.create_table()?;

    let functions = lua.create_table()?;
    for doc in FUNCTIONS {
        if engine.get::<LuaFunction>(doc.name).is_err() {
            continue;
        }
        let f = lua.create_table()?;
        f.set("description", doc.description)?;
        f.set("category", doc.category)?;
        f.set("params", params_table(lua, doc.params)?)?;
        if let Some(ret) = doc.returns {
            let r = lua.create_table()?;
            r.set("type", ret)?;
            f.set("returns", r)?;
        }
        functions.set(doc.name, f)?;
    }
    meta.set("functions", functions)?;

    let enums = lua.create_table()?;
    let kind = lua.create_table()?;
    kind.set("description", "Resource kind names")?;
    kind.set(
        "values",
        lua.create_sequence_from(ResourceKind::ALL.iter().map(|k| k.as_str()))?,
    )?;
    enums.set("ResourceKind", kind)?;
    meta.set("enums", enums)?;

    let callbacks = lua.create_table()?;
    for doc in CALLBACKS {
        let cb = lua.create_table()?;
        cb.set("description", doc.description)?;
        cb.set("params", params_table(lua, doc.params)?)?;
        callbacks.set(doc.name, cb)?;
    }
    meta.set("callbacks", callbacks)?;

    Ok(meta)
}
