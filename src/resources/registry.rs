//! Multi-pool resource registry.
//!
//! The registry owns the two built-in pools (`global` and `stage`) and any
//! number of script-created custom pools. It decides which pool receives new
//! loads and resolves bare names across all pools with a fixed precedence:
//!
//! 1. the active custom pool, if one is active;
//! 2. the stage pool;
//! 3. the global pool;
//! 4. every other custom pool, in creation order.
//!
//! A miss is `None`, never an error: scripts routinely probe several scopes.
//!
//! # Concurrency
//!
//! Pool lifecycle operations (create, remove, set-active, enumerate) take a
//! single mutex. Lookups never take it: they read the active custom pool and
//! the custom pool list from snapshots published on every lifecycle change.
//! A lookup racing with a removal may still see the removed pool (already
//! cleared) but never a dangling resource, since everything is `Arc`-owned.
//!
//! The registry is an explicit context object: create one at startup and hand
//! an `Arc<ResourceRegistry>` to whatever needs it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::{ArcSwap, ArcSwapOption};
use indexmap::IndexMap;
use log::{error, info};
use parking_lot::{Mutex, RwLock};

use super::resource::*;
use super::resourcepool::{
    GLOBAL_POOL_NAME, PoolResource, PoolType, ResourcePool, STAGE_POOL_NAME,
    is_reserved_pool_name,
};

/// Default for the global image scale factor.
pub const DEFAULT_IMAGE_SCALE: f32 = 1.0;

/// Whether resource loads are logged. Verbose in debug builds.
static RESOURCE_LOADING_LOG: AtomicBool = AtomicBool::new(cfg!(debug_assertions));

/// Custom pools plus the name of the active one. Only touched under the
/// registry's lifecycle lock.
#[derive(Default)]
struct CustomPools {
    pools: IndexMap<String, Arc<ResourcePool>>,
    active_name: String,
}

#[derive(Debug, Clone, Copy)]
struct RegistrySettings {
    active_builtin: PoolType,
    image_scale: f32,
}

/// The registry of all resource pools.
pub struct ResourceRegistry {
    global: Arc<ResourcePool>,
    stage: Arc<ResourcePool>,
    custom: Mutex<CustomPools>,
    /// Custom pools in creation order, republished after every change.
    custom_snapshot: ArcSwap<Vec<Arc<ResourcePool>>>,
    active_custom: ArcSwapOption<ResourcePool>,
    settings: RwLock<RegistrySettings>,
}

/// Generates the named `find_*` wrappers over [`ResourceRegistry::find`].
macro_rules! find_fns {
    ($($(#[$doc:meta])* $fn_name:ident => $ty:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $fn_name(&self, name: &str) -> Option<Arc<$ty>> {
                self.find::<$ty>(name)
            }
        )*
    };
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self {
            global: Arc::new(ResourcePool::new(PoolType::Global, "")),
            stage: Arc::new(ResourcePool::new(PoolType::Stage, "")),
            custom: Mutex::new(CustomPools::default()),
            custom_snapshot: ArcSwap::from_pointee(Vec::new()),
            active_custom: ArcSwapOption::empty(),
            settings: RwLock::new(RegistrySettings {
                active_builtin: PoolType::Global,
                image_scale: DEFAULT_IMAGE_SCALE,
            }),
        }
    }

    // ------------------------------------------------------------------
    // Pool lifecycle
    // ------------------------------------------------------------------

    /// Create an empty custom pool. Fails for empty, reserved or existing
    /// names. The new pool is not activated.
    pub fn create_pool(&self, name: &str) -> bool {
        if name.is_empty() || is_reserved_pool_name(name) {
            return false;
        }
        let mut custom = self.custom.lock();
        if custom.pools.contains_key(name) {
            return false;
        }
        custom.pools.insert(
            name.to_string(),
            Arc::new(ResourcePool::new(PoolType::Custom, name)),
        );
        self.publish_custom(&custom);
        info!("Resource pool '{}' created", name);
        true
    }

    /// Clear and remove a custom pool. If it was active, it is deactivated
    /// first so no lookup resolves through it as the active pool while it is
    /// torn down.
    pub fn remove_pool(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        let mut custom = self.custom.lock();
        let Some(pool) = custom.pools.get(name).cloned() else {
            return false;
        };
        if custom.active_name == name {
            self.active_custom.store(None);
            custom.active_name.clear();
        }
        pool.clear();
        custom.pools.shift_remove(name);
        self.publish_custom(&custom);
        info!("Resource pool '{}' removed", name);
        true
    }

    /// Resolve a pool by name. Built-in names never take the lock.
    pub fn get_pool(&self, name: &str) -> Option<Arc<ResourcePool>> {
        match name {
            "" => None,
            GLOBAL_POOL_NAME => Some(self.global.clone()),
            STAGE_POOL_NAME => Some(self.stage.clone()),
            _ => self.custom.lock().pools.get(name).cloned(),
        }
    }

    /// Select the pool used for subsequent loads and searched first.
    ///
    /// - `""` deactivates the custom pool, leaving the built-in selection.
    /// - `"global"` / `"stage"` deactivate the custom pool and select that
    ///   built-in pool.
    /// - Any other name must be an existing custom pool; otherwise nothing
    ///   changes and `false` is returned.
    pub fn set_active_pool_by_name(&self, name: &str) -> bool {
        let builtin = match name {
            GLOBAL_POOL_NAME => Some(PoolType::Global),
            STAGE_POOL_NAME => Some(PoolType::Stage),
            _ => None,
        };

        let mut custom = self.custom.lock();
        if name.is_empty() || builtin.is_some() {
            self.active_custom.store(None);
            custom.active_name.clear();
            if let Some(t) = builtin {
                self.settings.write().active_builtin = t;
            }
            return true;
        }

        let Some(pool) = custom.pools.get(name).cloned() else {
            return false;
        };
        self.active_custom.store(Some(pool));
        custom.active_name = name.to_string();
        true
    }

    /// `"global"`, `"stage"`, then every custom pool in creation order.
    pub fn enumerate_pools(&self) -> Vec<String> {
        let custom = self.custom.lock();
        let mut names = Vec::with_capacity(2 + custom.pools.len());
        names.push(GLOBAL_POOL_NAME.to_string());
        names.push(STAGE_POOL_NAME.to_string());
        names.extend(custom.pools.keys().cloned());
        names
    }

    /// Name of the active custom pool, empty when none is active.
    pub fn active_custom_pool_name(&self) -> String {
        self.custom.lock().active_name.clone()
    }

    /// Name of the pool that receives loads: the active custom pool if any,
    /// otherwise the selected built-in pool.
    pub fn active_pool_name(&self) -> String {
        match self.active_custom.load_full() {
            Some(pool) => pool.name().to_string(),
            None => self.active_pool_type().as_str().to_string(),
        }
    }

    /// Built-in pool selected for use while no custom pool is active.
    pub fn active_pool_type(&self) -> PoolType {
        self.settings.read().active_builtin
    }

    /// Select a built-in pool without touching the custom pool selection.
    /// `PoolType::Custom` is rejected.
    pub fn set_active_pool_type(&self, pool_type: PoolType) -> bool {
        if pool_type == PoolType::Custom {
            return false;
        }
        self.settings.write().active_builtin = pool_type;
        true
    }

    /// The pool receiving loads right now.
    pub fn active_pool(&self) -> Arc<ResourcePool> {
        match self.active_custom.load_full() {
            Some(pool) => pool,
            None => self.builtin_pool(self.active_pool_type()),
        }
    }

    /// Built-in pool for `pool_type`; `None` for `PoolType::Custom`.
    pub fn pool_by_type(&self, pool_type: PoolType) -> Option<Arc<ResourcePool>> {
        match pool_type {
            PoolType::Global => Some(self.global.clone()),
            PoolType::Stage => Some(self.stage.clone()),
            PoolType::Custom => None,
        }
    }

    fn builtin_pool(&self, pool_type: PoolType) -> Arc<ResourcePool> {
        match pool_type {
            PoolType::Stage => self.stage.clone(),
            _ => self.global.clone(),
        }
    }

    /// Empty the built-in pools and restore defaults for a stage transition.
    /// Custom pools are caller-managed and survive.
    pub fn clear_all_resources(&self) {
        self.global.clear();
        self.stage.clear();
        let mut settings = self.settings.write();
        settings.active_builtin = PoolType::Global;
        settings.image_scale = DEFAULT_IMAGE_SCALE;
    }

    fn publish_custom(&self, custom: &CustomPools) {
        self.custom_snapshot
            .store(Arc::new(custom.pools.values().cloned().collect()));
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Insert `resource` into the active pool.
    pub fn load<T: PoolResource>(&self, resource: Arc<T>) {
        self.load_handle(resource.into_handle());
    }

    /// Insert a type-erased resource into the active pool.
    pub fn load_handle(&self, handle: ResourceHandle) {
        let pool = self.active_pool();
        Self::log_load(&pool, &handle);
        pool.insert_handle(handle);
    }

    /// Insert into the named pool. Returns `false` if the pool does not exist.
    pub fn load_into(&self, pool_name: &str, handle: ResourceHandle) -> bool {
        let Some(pool) = self.get_pool(pool_name) else {
            return false;
        };
        Self::log_load(&pool, &handle);
        pool.insert_handle(handle);
        true
    }

    fn log_load(pool: &ResourcePool, handle: &ResourceHandle) {
        if Self::resource_loading_log() {
            info!(
                "Loaded {} '{}' into pool '{}'",
                handle.kind(),
                handle.name(),
                pool.name()
            );
        }
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Resolve `name` across all pools using the precedence order described
    /// in the module docs.
    pub fn find<T: PoolResource>(&self, name: &str) -> Option<Arc<T>> {
        self.resolve(|pool| pool.get::<T>(name))
    }

    /// Name of the pool `name` resolves from for `kind`.
    pub fn find_pool_of(&self, kind: ResourceKind, name: &str) -> Option<String> {
        self.resolve(|pool| {
            pool.contains(kind, name).then(|| pool.name().to_string())
        })
    }

    /// Run `probe` over the pools in precedence order, returning the first hit.
    fn resolve<R>(&self, probe: impl Fn(&ResourcePool) -> Option<R>) -> Option<R> {
        let active = self.active_custom.load_full();
        if let Some(found) = active.as_deref().and_then(|pool| probe(pool)) {
            return Some(found);
        }
        if let Some(found) = probe(&*self.stage) {
            return Some(found);
        }
        if let Some(found) = probe(&*self.global) {
            return Some(found);
        }
        self.custom_snapshot
            .load()
            .iter()
            .filter(|pool| !active.as_ref().is_some_and(|a| Arc::ptr_eq(a, *pool)))
            .find_map(|pool| probe(&**pool))
    }

    /// Type-erased [`find`](Self::find).
    pub fn find_handle(&self, kind: ResourceKind, name: &str) -> Option<ResourceHandle> {
        match kind {
            ResourceKind::Texture => self.find_erased::<TextureResource>(name),
            ResourceKind::Sprite => self.find_erased::<SpriteResource>(name),
            ResourceKind::Animation => self.find_erased::<AnimationResource>(name),
            ResourceKind::Music => self.find_erased::<MusicResource>(name),
            ResourceKind::SoundEffect => self.find_erased::<SoundEffectResource>(name),
            ResourceKind::Particle => self.find_erased::<ParticleResource>(name),
            ResourceKind::SpriteFont => self.find_erased::<SpriteFontResource>(name),
            ResourceKind::OutlineFont => self.find_erased::<OutlineFontResource>(name),
            ResourceKind::PostEffectShader => self.find_erased::<PostEffectShaderResource>(name),
            ResourceKind::Model => self.find_erased::<ModelResource>(name),
        }
    }

    fn find_erased<T: PoolResource>(&self, name: &str) -> Option<ResourceHandle> {
        self.find::<T>(name).map(T::into_handle)
    }

    /// Whether `name` resolves to a resource of `kind` in any pool.
    pub fn has_resource(&self, kind: ResourceKind, name: &str) -> bool {
        self.find_handle(kind, name).is_some()
    }

    find_fns! {
        find_texture => TextureResource;
        find_sprite => SpriteResource;
        find_animation => AnimationResource;
        find_music => MusicResource;
        find_sound => SoundEffectResource;
        find_particle => ParticleResource;
        find_sprite_font => SpriteFontResource;
        /// Outline (TrueType) fonts.
        find_outline_font => OutlineFontResource;
        /// Post-effect shaders.
        find_fx => PostEffectShaderResource;
        find_model => ModelResource;
    }

    // ------------------------------------------------------------------
    // Auxiliary operations
    // ------------------------------------------------------------------

    /// Pixel size of the texture `name` resolves to.
    pub fn get_texture_size(&self, name: &str) -> Option<(u32, u32)> {
        self.find_texture(name).map(|tex| tex.size())
    }

    /// Rasterize the glyphs of `text` into the outline font `font_name`.
    /// A missing font is logged and otherwise ignored.
    pub fn cache_glyphs_for_string(&self, font_name: &str, text: &str) {
        match self.find_outline_font(font_name) {
            Some(font) => {
                font.glyph_cache().cache_string(text);
            }
            None => error!(
                "cache_glyphs_for_string: font '{}' not found while caching glyphs",
                font_name
            ),
        }
    }

    /// Flush the buffered commands of every sound effect in the built-in
    /// pools. Custom pools carry no live audio state and are skipped.
    /// Returns the number of commands forwarded.
    pub fn flush_audio_commands(&self) -> usize {
        [&self.global, &self.stage]
            .into_iter()
            .flat_map(|pool| pool.values::<SoundEffectResource>())
            .map(|snd| snd.flush_command())
            .sum()
    }

    pub fn image_scale_factor(&self) -> f32 {
        self.settings.read().image_scale
    }

    pub fn set_image_scale_factor(&self, scale: f32) {
        self.settings.write().image_scale = scale;
    }

    /// Process-wide switch for resource load logging.
    pub fn set_resource_loading_log(enabled: bool) {
        RESOURCE_LOADING_LOG.store(enabled, Ordering::Relaxed);
    }

    pub fn resource_loading_log() -> bool {
        RESOURCE_LOADING_LOG.load(Ordering::Relaxed)
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
