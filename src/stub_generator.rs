//! Lua stub generator for EmmyLua / lua-language-server.
//!
//! Reads `engine.__meta` from the Lua runtime and emits a deterministic
//! `engine.lua` stub file with `---@alias`, `---@param`, and `---@return`
//! annotations.

use crate::resources::lua_runtime::LuaRuntime;
use mlua::prelude::*;
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// Category display order for deterministic output.
const CATEGORY_ORDER: &[&str] = &["base", "pool", "resource", "asset", "object", "world"];

/// Human-readable section titles for each category.
fn category_title(cat: &str) -> &str {
    match cat {
        "base" => "Logging Functions",
        "pool" => "Resource Pools",
        "resource" => "Resource Lookup",
        "asset" => "Asset Loading",
        "object" => "Object Pool",
        "world" => "Multi-World",
        _ => cat,
    }
}

/// Maps a meta type string to the EmmyLua annotation type.
fn lua_type_annotation(meta_type: &str) -> String {
    match meta_type {
        "string[]?" => "string[]|nil".into(),
        s if s.ends_with('?') => format!("{}|nil", &s[..s.len() - 1]),
        other => other.into(),
    }
}

/// Extracted function metadata.
struct FnMeta {
    name: String,
    description: String,
    category: String,
    params: Vec<(String, String)>,
    returns: Option<String>,
}

/// Extracted enum metadata.
struct EnumMeta {
    name: String,
    description: String,
    values: Vec<String>,
}

/// Extracted callback metadata.
struct CallbackMeta {
    name: String,
    description: String,
    params: Vec<(String, String)>,
}

/// Extract all metadata from `engine.__meta` and generate the stub file content.
pub fn generate_stubs(runtime: &LuaRuntime) -> Result<String, String> {
    let lua = runtime.lua();

    let engine: LuaTable = lua
        .globals()
        .get("engine")
        .map_err(|e| format!("Failed to get engine table: {e}"))?;
    let meta: LuaTable = engine
        .get("__meta")
        .map_err(|e| format!("Failed to get engine.__meta: {e}"))?;

    let functions = extract_functions(&meta).map_err(|e| format!("Functions: {e}"))?;
    let enums = extract_enums(&meta).map_err(|e| format!("Enums: {e}"))?;
    let callbacks = extract_callbacks(&meta).map_err(|e| format!("Callbacks: {e}"))?;

    render_stubs(&functions, &enums, &callbacks)
}

/// Write the generated stubs to a file.
pub fn write_stubs(path: &Path, content: &str) -> Result<(), String> {
    std::fs::write(path, content).map_err(|e| format!("Failed to write {}: {e}", path.display()))
}

// --------------- Extraction ---------------

fn extract_params(tbl: &LuaTable) -> Result<Vec<(String, String)>, LuaError> {
    let params_tbl: LuaTable = tbl.get("params")?;
    let mut params = Vec::new();
    for p in params_tbl.sequence_values::<LuaTable>() {
        let p = p?;
        params.push((p.get::<String>("name")?, p.get::<String>("type")?));
    }
    Ok(params)
}

fn extract_functions(meta: &LuaTable) -> Result<Vec<FnMeta>, LuaError> {
    let fns_tbl: LuaTable = meta.get("functions")?;
    let mut result = Vec::new();
    for pair in fns_tbl.pairs::<String, LuaTable>() {
        let (name, tbl) = pair?;
        let description: String = tbl.get("description")?;
        let category: String = tbl.get("category")?;
        let params = extract_params(&tbl)?;
        let returns: Option<String> = tbl
            .get::<LuaTable>("returns")
            .ok()
            .and_then(|r| r.get::<String>("type").ok());
        result.push(FnMeta {
            name,
            description,
            category,
            params,
            returns,
        });
    }
    // Sort by category order, then alphabetically within category
    result.sort_by(|a, b| {
        let ca = CATEGORY_ORDER
            .iter()
            .position(|c| *c == a.category)
            .unwrap_or(99);
        let cb = CATEGORY_ORDER
            .iter()
            .position(|c| *c == b.category)
            .unwrap_or(99);
        ca.cmp(&cb).then_with(|| a.name.cmp(&b.name))
    });
    Ok(result)
}

fn extract_enums(meta: &LuaTable) -> Result<Vec<EnumMeta>, LuaError> {
    let enums_tbl: LuaTable = meta.get("enums")?;
    let mut result = Vec::new();
    for pair in enums_tbl.pairs::<String, LuaTable>() {
        let (name, tbl) = pair?;
        let description: String = tbl.get("description")?;
        let vals_tbl: LuaTable = tbl.get("values")?;
        let mut values = Vec::new();
        for v in vals_tbl.sequence_values::<String>() {
            values.push(v?);
        }
        result.push(EnumMeta {
            name,
            description,
            values,
        });
    }
    result.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(result)
}

fn extract_callbacks(meta: &LuaTable) -> Result<Vec<CallbackMeta>, LuaError> {
    let cb_tbl: LuaTable = meta.get("callbacks")?;
    let mut result = Vec::new();
    for pair in cb_tbl.pairs::<String, LuaTable>() {
        let (name, tbl) = pair?;
        let description: String = tbl.get("description")?;
        let params = extract_params(&tbl)?;
        result.push(CallbackMeta {
            name,
            description,
            params,
        });
    }
    let cb_order = ["on_frame", "on_object_update"];
    result.sort_by_key(|c| cb_order.iter().position(|n| *n == c.name).unwrap_or(99));
    Ok(result)
}

// --------------- Rendering ---------------

fn render_stubs(
    functions: &[FnMeta],
    enums: &[EnumMeta],
    callbacks: &[CallbackMeta],
) -> Result<String, String> {
    let mut out = String::with_capacity(16 * 1024);
    render_header(&mut out).map_err(|e| format!("Header: {e}"))?;
    render_enums(&mut out, enums).map_err(|e| format!("Enums: {e}"))?;
    render_callbacks(&mut out, callbacks).map_err(|e| format!("Callbacks: {e}"))?;
    render_functions(&mut out, functions).map_err(|e| format!("Functions: {e}"))?;
    Ok(out)
}

fn render_header(out: &mut String) -> std::fmt::Result {
    writeln!(out, "---@meta")?;
    writeln!(out)?;
    writeln!(
        out,
        "-- THIS FILE IS AUTO-GENERATED by `stagepool --create-lua-stubs`."
    )?;
    writeln!(
        out,
        "-- DO NOT EDIT MANUALLY. Regenerate from engine.__meta instead."
    )?;
    writeln!(out)?;
    writeln!(out, "---@class engine")?;
    writeln!(out, "---Resource registry and object pool API (Rust)")?;
    writeln!(
        out,
        "---All functions are available globally via the `engine` table"
    )?;
    writeln!(out, "engine = {{}}")?;
    writeln!(out)
}

fn render_enums(out: &mut String, enums: &[EnumMeta]) -> std::fmt::Result {
    writeln!(out, "-- ==================== Enums ====================")?;
    writeln!(out)?;

    for e in enums {
        writeln!(out, "---{}", e.description)?;
        let values_str: Vec<String> = e.values.iter().map(|v| format!("\"{}\"", v)).collect();
        writeln!(out, "---@alias {} {}", e.name, values_str.join(" | "))?;
        writeln!(out)?;
    }
    Ok(())
}

fn render_callbacks(out: &mut String, callbacks: &[CallbackMeta]) -> std::fmt::Result {
    writeln!(
        out,
        "-- ==================== Callback Signatures ===================="
    )?;
    writeln!(
        out,
        "-- Define these globals in your scripts; the host calls them every frame."
    )?;
    writeln!(out)?;

    for cb in callbacks {
        writeln!(out, "---{}", cb.description)?;
        for (pname, ptype) in &cb.params {
            writeln!(out, "---@param {} {}", pname, lua_type_annotation(ptype))?;
        }
        let param_names: Vec<&str> = cb.params.iter().map(|(n, _)| n.as_str()).collect();
        writeln!(out, "function {}({}) end", cb.name, param_names.join(", "))?;
        writeln!(out)?;
    }
    Ok(())
}

fn render_functions(out: &mut String, functions: &[FnMeta]) -> std::fmt::Result {
    let mut current_category = "";

    for f in functions {
        if f.category != current_category {
            current_category = &f.category;
            writeln!(
                out,
                "-- ==================== {} ====================",
                category_title(current_category)
            )?;
            writeln!(out)?;
        }
        render_function(out, f)?;
    }
    Ok(())
}

fn render_function(out: &mut String, f: &FnMeta) -> std::fmt::Result {
    for line in f.description.lines() {
        writeln!(out, "---{}", line)?;
    }
    for (pname, ptype) in &f.params {
        writeln!(out, "---@param {} {}", pname, lua_type_annotation(ptype))?;
    }
    if let Some(ref ret) = f.returns {
        writeln!(out, "---@return {}", lua_type_annotation(ret))?;
    }
    let param_names: Vec<&str> = f.params.iter().map(|(n, _)| n.as_str()).collect();
    writeln!(
        out,
        "function engine.{}({}) end",
        f.name,
        param_names.join(", ")
    )?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_types_become_nilable() {
        assert_eq!(lua_type_annotation("string?"), "string|nil");
        assert_eq!(lua_type_annotation("string[]?"), "string[]|nil");
        assert_eq!(lua_type_annotation("ResourceKind"), "ResourceKind");
    }
}
