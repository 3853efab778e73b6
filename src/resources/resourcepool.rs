//! Resource pool: one name → resource map per resource kind.
//!
//! A pool is either one of the two built-in pools (`global`, `stage`) or a
//! custom pool created by scripts. Inserting a name that already exists in
//! the same kind replaces the previous entry (last write wins), which is what
//! asset hot-reload relies on.
//!
//! Pools are shared between the registry and any caller that resolved them,
//! so the maps sit behind a read/write lock. Readers never block each other.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::resource::*;

/// Name reserved for the global built-in pool.
pub const GLOBAL_POOL_NAME: &str = "global";
/// Name reserved for the stage built-in pool.
pub const STAGE_POOL_NAME: &str = "stage";

/// Returns `true` for the names of the two built-in pools.
pub fn is_reserved_pool_name(name: &str) -> bool {
    name == GLOBAL_POOL_NAME || name == STAGE_POOL_NAME
}

/// Role of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PoolType {
    #[default]
    Global,
    Stage,
    Custom,
}

impl PoolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolType::Global => GLOBAL_POOL_NAME,
            PoolType::Stage => STAGE_POOL_NAME,
            PoolType::Custom => "custom",
        }
    }
}

/// Name → resource map for a single kind.
pub type ResourceMap<T> = FxHashMap<String, Arc<T>>;

/// The per-kind maps owned by a pool.
#[derive(Debug, Default)]
pub struct PoolMaps {
    textures: ResourceMap<TextureResource>,
    sprites: ResourceMap<SpriteResource>,
    animations: ResourceMap<AnimationResource>,
    music: ResourceMap<MusicResource>,
    sounds: ResourceMap<SoundEffectResource>,
    particles: ResourceMap<ParticleResource>,
    sprite_fonts: ResourceMap<SpriteFontResource>,
    outline_fonts: ResourceMap<OutlineFontResource>,
    post_effects: ResourceMap<PostEffectShaderResource>,
    models: ResourceMap<ModelResource>,
}

/// Runs `$body` with `$map` bound to the map of `$kind`, type-erased over the
/// value type.
macro_rules! with_kind_map {
    ($maps:expr, $kind:expr, |$map:ident| $body:expr) => {
        match $kind {
            ResourceKind::Texture => { let $map = &$maps.textures; $body }
            ResourceKind::Sprite => { let $map = &$maps.sprites; $body }
            ResourceKind::Animation => { let $map = &$maps.animations; $body }
            ResourceKind::Music => { let $map = &$maps.music; $body }
            ResourceKind::SoundEffect => { let $map = &$maps.sounds; $body }
            ResourceKind::Particle => { let $map = &$maps.particles; $body }
            ResourceKind::SpriteFont => { let $map = &$maps.sprite_fonts; $body }
            ResourceKind::OutlineFont => { let $map = &$maps.outline_fonts; $body }
            ResourceKind::PostEffectShader => { let $map = &$maps.post_effects; $body }
            ResourceKind::Model => { let $map = &$maps.models; $body }
        }
    };
}

impl PoolMaps {
    fn len(&self, kind: ResourceKind) -> usize {
        with_kind_map!(self, kind, |map| map.len())
    }

    fn contains(&self, kind: ResourceKind, name: &str) -> bool {
        with_kind_map!(self, kind, |map| map.contains_key(name))
    }

    fn names(&self, kind: ResourceKind) -> Vec<String> {
        with_kind_map!(self, kind, |map| map.keys().cloned().collect())
    }

    fn clear(&mut self) {
        *self = PoolMaps::default();
    }
}

/// A resource type that can be stored in a [`ResourcePool`].
///
/// Implemented for the payload type of every [`ResourceKind`]; the generic
/// pool and registry operations dispatch through it.
pub trait PoolResource: Send + Sync + Sized + 'static {
    const KIND: ResourceKind;

    /// Key under which the resource is stored.
    fn name(&self) -> &str;

    fn slot(maps: &PoolMaps) -> &ResourceMap<Self>;

    fn slot_mut(maps: &mut PoolMaps) -> &mut ResourceMap<Self>;

    fn into_handle(self: Arc<Self>) -> ResourceHandle;
}

macro_rules! pool_resource {
    ($($ty:ty => $kind:ident, $field:ident;)*) => {
        $(
            impl PoolResource for $ty {
                const KIND: ResourceKind = ResourceKind::$kind;

                fn name(&self) -> &str {
                    &self.name
                }

                fn slot(maps: &PoolMaps) -> &ResourceMap<Self> {
                    &maps.$field
                }

                fn slot_mut(maps: &mut PoolMaps) -> &mut ResourceMap<Self> {
                    &mut maps.$field
                }

                fn into_handle(self: Arc<Self>) -> ResourceHandle {
                    ResourceHandle::$kind(self)
                }
            }
        )*
    };
}

pool_resource! {
    TextureResource => Texture, textures;
    SpriteResource => Sprite, sprites;
    AnimationResource => Animation, animations;
    MusicResource => Music, music;
    SoundEffectResource => SoundEffect, sounds;
    ParticleResource => Particle, particles;
    SpriteFontResource => SpriteFont, sprite_fonts;
    OutlineFontResource => OutlineFont, outline_fonts;
    PostEffectShaderResource => PostEffectShader, post_effects;
    ModelResource => Model, models;
}

/// A named container of loaded resources.
#[derive(Debug)]
pub struct ResourcePool {
    pool_type: PoolType,
    name: String,
    maps: RwLock<PoolMaps>,
}

impl ResourcePool {
    /// Create an empty pool. Built-in pools carry an empty name.
    pub fn new(pool_type: PoolType, name: impl Into<String>) -> Self {
        Self {
            pool_type,
            name: name.into(),
            maps: RwLock::new(PoolMaps::default()),
        }
    }

    pub fn pool_type(&self) -> PoolType {
        self.pool_type
    }

    /// Name of the pool: the custom name, or the reserved name for built-ins.
    pub fn name(&self) -> &str {
        match self.pool_type {
            PoolType::Custom => &self.name,
            builtin => builtin.as_str(),
        }
    }

    /// Store `resource` under its own name, returning the entry it replaced.
    pub fn insert<T: PoolResource>(&self, resource: Arc<T>) -> Option<Arc<T>> {
        let key = resource.name().to_string();
        T::slot_mut(&mut self.maps.write()).insert(key, resource)
    }

    /// Store a type-erased resource under its own name.
    pub fn insert_handle(&self, handle: ResourceHandle) {
        match handle {
            ResourceHandle::Texture(r) => drop(self.insert(r)),
            ResourceHandle::Sprite(r) => drop(self.insert(r)),
            ResourceHandle::Animation(r) => drop(self.insert(r)),
            ResourceHandle::Music(r) => drop(self.insert(r)),
            ResourceHandle::SoundEffect(r) => drop(self.insert(r)),
            ResourceHandle::Particle(r) => drop(self.insert(r)),
            ResourceHandle::SpriteFont(r) => drop(self.insert(r)),
            ResourceHandle::OutlineFont(r) => drop(self.insert(r)),
            ResourceHandle::PostEffectShader(r) => drop(self.insert(r)),
            ResourceHandle::Model(r) => drop(self.insert(r)),
        }
    }

    /// Look up a resource by name within this pool only.
    pub fn get<T: PoolResource>(&self, name: &str) -> Option<Arc<T>> {
        T::slot(&self.maps.read()).get(name).cloned()
    }

    /// Type-erased lookup.
    pub fn get_handle(&self, kind: ResourceKind, name: &str) -> Option<ResourceHandle> {
        match kind {
            ResourceKind::Texture => self.get_erased::<TextureResource>(name),
            ResourceKind::Sprite => self.get_erased::<SpriteResource>(name),
            ResourceKind::Animation => self.get_erased::<AnimationResource>(name),
            ResourceKind::Music => self.get_erased::<MusicResource>(name),
            ResourceKind::SoundEffect => self.get_erased::<SoundEffectResource>(name),
            ResourceKind::Particle => self.get_erased::<ParticleResource>(name),
            ResourceKind::SpriteFont => self.get_erased::<SpriteFontResource>(name),
            ResourceKind::OutlineFont => self.get_erased::<OutlineFontResource>(name),
            ResourceKind::PostEffectShader => self.get_erased::<PostEffectShaderResource>(name),
            ResourceKind::Model => self.get_erased::<ModelResource>(name),
        }
    }

    fn get_erased<T: PoolResource>(&self, name: &str) -> Option<ResourceHandle> {
        self.get::<T>(name).map(T::into_handle)
    }

    pub fn remove<T: PoolResource>(&self, name: &str) -> Option<Arc<T>> {
        T::slot_mut(&mut self.maps.write()).remove(name)
    }

    pub fn contains(&self, kind: ResourceKind, name: &str) -> bool {
        self.maps.read().contains(kind, name)
    }

    /// Number of resources of `kind`.
    pub fn len(&self, kind: ResourceKind) -> usize {
        self.maps.read().len(kind)
    }

    /// `true` when no kind holds any resource.
    pub fn is_empty(&self) -> bool {
        let maps = self.maps.read();
        ResourceKind::ALL.into_iter().all(|k| maps.len(k) == 0)
    }

    /// Names stored under `kind`, in no particular order.
    pub fn names(&self, kind: ResourceKind) -> Vec<String> {
        self.maps.read().names(kind)
    }

    /// Snapshot of every resource of type `T`.
    ///
    /// The lock is released before the caller sees the values, so callbacks
    /// run on the snapshot may touch the pool again.
    pub fn values<T: PoolResource>(&self) -> Vec<Arc<T>> {
        T::slot(&self.maps.read()).values().cloned().collect()
    }

    /// Release every resource of every kind.
    pub fn clear(&self) {
        self.maps.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture(name: &str, w: u32, h: u32) -> Arc<TextureResource> {
        Arc::new(TextureResource::new(name, format!("img/{name}.png"), w, h))
    }

    #[test]
    fn test_builtin_pool_names() {
        assert_eq!(ResourcePool::new(PoolType::Global, "").name(), "global");
        assert_eq!(ResourcePool::new(PoolType::Stage, "").name(), "stage");
        assert_eq!(ResourcePool::new(PoolType::Custom, "mod_a").name(), "mod_a");
    }

    #[test]
    fn test_insert_then_get() {
        let pool = ResourcePool::new(PoolType::Global, "");
        pool.insert(texture("boss", 512, 512));
        let tex = pool.get::<TextureResource>("boss").unwrap();
        assert_eq!(tex.size(), (512, 512));
        assert!(pool.get::<TextureResource>("missing").is_none());
    }

    #[test]
    fn test_insert_overwrites_last_write_wins() {
        let pool = ResourcePool::new(PoolType::Stage, "");
        assert!(pool.insert(texture("bg", 64, 64)).is_none());
        let replaced = pool.insert(texture("bg", 128, 128)).unwrap();
        assert_eq!(replaced.width, 64);
        assert_eq!(pool.get::<TextureResource>("bg").unwrap().width, 128);
        assert_eq!(pool.len(ResourceKind::Texture), 1);
    }

    #[test]
    fn test_kinds_are_independent_namespaces() {
        let pool = ResourcePool::new(PoolType::Global, "");
        let tex = texture("shot", 32, 32);
        pool.insert(tex.clone());
        pool.insert(Arc::new(SpriteResource {
            name: "shot".into(),
            texture: tex,
            rect: TextureRect::new(0.0, 0.0, 16.0, 16.0),
        }));
        assert!(pool.contains(ResourceKind::Texture, "shot"));
        assert!(pool.contains(ResourceKind::Sprite, "shot"));
        assert!(!pool.contains(ResourceKind::Animation, "shot"));

        pool.remove::<SpriteResource>("shot");
        assert!(pool.contains(ResourceKind::Texture, "shot"));
        assert!(!pool.contains(ResourceKind::Sprite, "shot"));
    }

    #[test]
    fn test_get_handle_matches_kind() {
        let pool = ResourcePool::new(PoolType::Global, "");
        pool.insert_handle(ResourceHandle::Model(Arc::new(ModelResource {
            name: "ship".into(),
            path: "mdl/ship.glb".into(),
        })));
        let handle = pool.get_handle(ResourceKind::Model, "ship").unwrap();
        assert_eq!(handle.kind(), ResourceKind::Model);
        assert!(pool.get_handle(ResourceKind::Texture, "ship").is_none());
    }

    #[test]
    fn test_clear_releases_all_kinds() {
        let pool = ResourcePool::new(PoolType::Custom, "tmp");
        let tex = texture("a", 1, 1);
        pool.insert(tex.clone());
        pool.insert(Arc::new(MusicResource {
            name: "bgm".into(),
            path: "bgm.ogg".into(),
            loop_start: 0.0,
            loop_end: 0.0,
        }));
        assert!(!pool.is_empty());
        pool.clear();
        assert!(pool.is_empty());
        // Outstanding handles stay valid after the pool lets go
        assert_eq!(Arc::strong_count(&tex), 1);
        assert_eq!(tex.name, "a");
    }

    #[test]
    fn test_names_lists_one_kind() {
        let pool = ResourcePool::new(PoolType::Global, "");
        pool.insert(texture("a", 1, 1));
        pool.insert(texture("b", 1, 1));
        let mut names = pool.names(ResourceKind::Texture);
        names.sort();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
        assert!(pool.names(ResourceKind::Sprite).is_empty());
    }

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved_pool_name("global"));
        assert!(is_reserved_pool_name("stage"));
        assert!(!is_reserved_pool_name("Global"));
        assert!(!is_reserved_pool_name(""));
    }
}
