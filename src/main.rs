//! stagepool host entry point.
//!
//! Wires the pieces together:
//! - a [`ResourceRegistry`] shared through an `Arc`
//! - a [`GameObjectPool`] driven once per frame
//! - the background audio thread fed by flushed sound effects
//! - (with the `lua` feature) a [`LuaRuntime`] running the main script
//!
//! # Main Loop
//!
//! 1. Load `config.ini` and build the registry and object pool
//! 2. Run the main script and load the assets it queued
//! 3. For each frame:
//!    - call the script's `on_frame(frame)` and load newly queued assets
//!    - update objects (calling `on_object_update(id)` for each)
//!    - flush buffered sound effect commands to the audio thread
//! 4. Stop the audio thread on exit
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --config ./config.ini --frames 600
//! ```

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use clap::Parser;
use log::{debug, info, warn};

use stagepool::objectpool::GameObjectPool;
use stagepool::resources::audio::{setup_audio, shutdown_audio};
use stagepool::resources::poolconfig::PoolConfig;
use stagepool::resources::registry::ResourceRegistry;
use stagepool::systems::audio::poll_audio_messages;

#[cfg(feature = "lua")]
use log::error;
#[cfg(feature = "lua")]
use stagepool::resources::loader::HeadlessLoader;
#[cfg(feature = "lua")]
use stagepool::resources::lua_runtime::LuaRuntime;
#[cfg(feature = "lua")]
use stagepool::systems::assetcommands::process_asset_commands;
#[cfg(feature = "lua")]
use stagepool::{luarc_generator, stub_generator};

/// Multi-pool resource registry host
#[derive(Parser)]
#[command(version, about = "Runs scripts against a multi-pool resource registry and object pool")]
struct Cli {
    /// Path to the INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Number of frames to run before exiting.
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Generate Lua LSP stubs from engine metadata and exit.
    /// Optionally provide a path (default: assets/scripts/engine.lua).
    #[cfg(feature = "lua")]
    #[arg(long, value_name = "PATH")]
    create_lua_stubs: Option<Option<PathBuf>>,

    /// Generate .luarc.json for Lua Language Server and exit.
    /// Optionally provide a path (default: assets/scripts/.luarc.json).
    #[cfg(feature = "lua")]
    #[arg(long, value_name = "PATH")]
    create_luarc: Option<Option<PathBuf>>,
}

#[cfg(feature = "lua")]
fn tooling_runtime() -> LuaRuntime {
    let registry = Arc::new(ResourceRegistry::new());
    let objects = Rc::new(RefCell::new(GameObjectPool::new(
        stagepool::objectpool::ObjectPoolSettings {
            multi_world: true,
            ..Default::default()
        },
    )));
    LuaRuntime::new(registry, objects).expect("Failed to create Lua runtime for tooling")
}

/// Handles `--create-lua-stubs` / `--create-luarc`. Returns `true` if the
/// program should exit.
#[cfg(feature = "lua")]
fn run_tooling(cli: &Cli) -> bool {
    if let Some(ref maybe_path) = cli.create_lua_stubs {
        let path = maybe_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("assets/scripts/engine.lua"));
        let runtime = tooling_runtime();
        match stub_generator::generate_stubs(&runtime)
            .and_then(|content| stub_generator::write_stubs(&path, &content))
        {
            Ok(()) => println!("Lua stubs written to {}", path.display()),
            Err(e) => {
                eprintln!("Error generating stubs: {e}");
                std::process::exit(1);
            }
        }
        return true;
    }

    if let Some(ref maybe_path) = cli.create_luarc {
        let path = maybe_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("assets/scripts/.luarc.json"));
        let runtime = tooling_runtime();
        match luarc_generator::generate_luarc(&runtime, "engine.lua")
            .and_then(|content| luarc_generator::write_luarc(&path, &content))
        {
            Ok(()) => println!(".luarc.json written to {}", path.display()),
            Err(e) => {
                eprintln!("Error generating .luarc.json: {e}");
                std::process::exit(1);
            }
        }
        return true;
    }

    false
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Early-exit: editor tooling needs no audio or frame loop
    #[cfg(feature = "lua")]
    if run_tooling(&cli) {
        return;
    }

    let mut config = PoolConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        warn!("{}; using defaults", e);
    }

    ResourceRegistry::set_resource_loading_log(config.loading_log);
    let registry = Arc::new(ResourceRegistry::new());
    registry.set_image_scale_factor(config.image_scale);

    let audio = setup_audio();
    #[cfg(feature = "lua")]
    let loader = HeadlessLoader::new().with_audio(audio.tx_cmd.clone());

    let objects = Rc::new(RefCell::new(GameObjectPool::new(
        config.object_pool_settings(),
    )));

    #[cfg(feature = "lua")]
    let lua_runtime = {
        let runtime = LuaRuntime::new(registry.clone(), objects.clone())
            .expect("Failed to create Lua runtime");
        let main_script = config.main_script.to_string_lossy();
        if let Err(e) = runtime.run_script(&main_script) {
            error!("Failed to load {}: {}", main_script, e);
        }
        let loaded =
            process_asset_commands(&registry, &loader, runtime.drain_asset_commands());
        info!("Main script loaded {} assets", loaded);
        runtime
    };

    info!("Running {} frames", cli.frames);
    for frame in 0..cli.frames {
        #[cfg(feature = "lua")]
        {
            if lua_runtime.has_function("on_frame")
                && let Err(e) = lua_runtime.call_function::<_, ()>("on_frame", frame)
            {
                error!("on_frame failed: {}", e);
            }
            process_asset_commands(&registry, &loader, lua_runtime.drain_asset_commands());
            if let Err(e) = lua_runtime.run_object_frame("on_object_update") {
                error!("on_object_update failed: {}", e);
            }
        }
        #[cfg(not(feature = "lua"))]
        {
            let _ = frame;
            objects.borrow_mut().tick();
        }

        registry.flush_audio_commands();
        for msg in poll_audio_messages(&audio) {
            debug!("audio: {:?}", msg);
        }
    }

    info!(
        "Finished: pools={:?}, objects={}",
        registry.enumerate_pools(),
        objects.borrow_mut().object_count()
    );

    shutdown_audio(audio);
}
