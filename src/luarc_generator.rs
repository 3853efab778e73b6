//! Generator for `.luarc.json`, the Lua Language Server configuration.
//!
//! Points the language server at the generated stubs file, declares the
//! `engine` global and mirrors the `require` search path the runtime installs.

use crate::resources::lua_runtime::LuaRuntime;
use mlua::prelude::*;
use std::path::Path;

/// Generate `.luarc.json` content for scripts run by `runtime`.
///
/// Fails if `engine.__meta.functions` is missing, since the stubs the config
/// points to could not have been generated either.
pub fn generate_luarc(runtime: &LuaRuntime, stubs_filename: &str) -> Result<String, String> {
    let lua = runtime.lua();

    let engine: LuaTable = lua
        .globals()
        .get("engine")
        .map_err(|e| format!("Failed to get engine table: {e}"))?;
    let meta: LuaTable = engine
        .get("__meta")
        .map_err(|e| format!("Failed to get engine.__meta: {e}"))?;
    let _functions: LuaTable = meta
        .get("functions")
        .map_err(|e| format!("Failed to get engine.__meta.functions: {e}"))?;

    let content = serde_json::json!({
        "$schema": "https://raw.githubusercontent.com/LuaLS/vscode-lua/master/setting/schema.json",
        "runtime.version": "LuaJIT",
        "runtime.path": ["assets/scripts/?.lua", "assets/scripts/?/init.lua"],
        "diagnostics.globals": ["engine"],
        "workspace.library": [stubs_filename],
        "workspace.checkThirdParty": false,
        "completion.autoRequire": false
    });

    serde_json::to_string_pretty(&content)
        .map_err(|e| format!("Failed to serialize .luarc.json: {e}"))
}

/// Write the generated `.luarc.json` content to a file.
pub fn write_luarc(path: &Path, content: &str) -> Result<(), String> {
    std::fs::write(path, content)
        .map_err(|e| format!("Failed to write {}: {e}", path.display()))
}
