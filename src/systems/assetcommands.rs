//! Asset command processing.
//!
//! Applies the [`AssetCmd`](crate::resources::loader::AssetCmd) values queued
//! by scripts: each request goes through an
//! [`AssetLoader`](crate::resources::loader::AssetLoader) and the result is
//! stored in the pool the command was tagged with. If that pool was removed
//! in the meantime, the resource lands in the currently active pool instead.

use log::{error, warn};

use crate::resources::loader::{AssetCmd, AssetLoader};
use crate::resources::registry::ResourceRegistry;

/// Load a single asset command. Returns `true` when the resource was stored.
pub fn process_asset_command(
    registry: &ResourceRegistry,
    loader: &dyn AssetLoader,
    cmd: AssetCmd,
) -> bool {
    let AssetCmd { pool, request } = cmd;
    let handle = match loader.load(&request, registry) {
        Ok(handle) => handle,
        Err(e) => {
            error!(
                "Failed to load {} '{}': {}",
                request.kind(),
                request.name(),
                e
            );
            return false;
        }
    };

    if !registry.load_into(&pool, handle.clone()) {
        warn!(
            "Pool '{}' no longer exists, loading {} '{}' into '{}'",
            pool,
            request.kind(),
            request.name(),
            registry.active_pool_name()
        );
        registry.load_handle(handle);
    }
    true
}

/// Load every queued command in order. Returns how many succeeded.
pub fn process_asset_commands(
    registry: &ResourceRegistry,
    loader: &dyn AssetLoader,
    cmds: impl IntoIterator<Item = AssetCmd>,
) -> usize {
    cmds.into_iter()
        .map(|cmd| process_asset_command(registry, loader, cmd))
        .filter(|loaded| *loaded)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::loader::{AssetRequest, HeadlessLoader};
    use crate::resources::resource::{TextureRect, TextureResource};

    fn texture(pool: &str, name: &str) -> AssetCmd {
        AssetCmd {
            pool: pool.to_string(),
            request: AssetRequest::Texture {
                name: name.to_string(),
                path: format!("{}.png", name),
                mipmap: false,
            },
        }
    }

    #[test]
    fn test_commands_land_in_tagged_pool() {
        let registry = ResourceRegistry::new();
        registry.create_pool("level1");
        let loaded = process_asset_commands(
            &registry,
            &HeadlessLoader::new(),
            vec![texture("level1", "bg"), texture("stage", "hud")],
        );
        assert_eq!(loaded, 2);
        assert!(registry.get_pool("level1").unwrap().get::<TextureResource>("bg").is_some());
        assert!(registry.get_pool("stage").unwrap().get::<TextureResource>("hud").is_some());
        assert!(registry.get_pool("global").unwrap().get::<TextureResource>("bg").is_none());
    }

    #[test]
    fn test_removed_pool_falls_back_to_active() {
        let registry = ResourceRegistry::new();
        registry.set_active_pool_by_name("stage");
        assert!(process_asset_command(
            &registry,
            &HeadlessLoader::new(),
            texture("gone", "bg")
        ));
        assert!(registry.get_pool("stage").unwrap().get::<TextureResource>("bg").is_some());
    }

    #[test]
    fn test_failed_load_is_counted_out() {
        let registry = ResourceRegistry::new();
        let bad = AssetCmd {
            pool: "global".into(),
            request: AssetRequest::Sprite {
                name: "ship".into(),
                texture: "missing".into(),
                rect: TextureRect::default(),
            },
        };
        let loaded = process_asset_commands(
            &registry,
            &HeadlessLoader::new(),
            vec![texture("global", "atlas"), bad],
        );
        assert_eq!(loaded, 1);
        assert!(registry.find_sprite("ship").is_none());
    }
}
