//! Asset loading requests and the loader seam.
//!
//! Scripts never decode files themselves. They queue an [`AssetCmd`] tagged
//! with the pool that was active when the request was made; the host drains
//! the queue and hands every request to an [`AssetLoader`], an opaque factory
//! that turns a request into a [`ResourceHandle`] or an error message.
//!
//! [`HeadlessLoader`] builds resources from request metadata alone, which is
//! all the registry needs when no rendering or audio backend is attached.

use std::path::Path;
use std::sync::Arc;

use crossbeam_channel::Sender;
use rustc_hash::FxHashMap;

use crate::events::audio::AudioCmd;
use crate::resources::registry::ResourceRegistry;
use crate::resources::resource::*;

/// A single asset to materialize.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetRequest {
    Texture {
        name: String,
        path: String,
        mipmap: bool,
    },
    /// Sub-rectangle of an already loaded texture.
    Sprite {
        name: String,
        texture: String,
        rect: TextureRect,
    },
    /// Grid of `columns` x `rows` frames starting at `rect`.
    Animation {
        name: String,
        texture: String,
        rect: TextureRect,
        columns: u32,
        rows: u32,
        interval: u32,
    },
    Music {
        name: String,
        path: String,
        loop_start: f64,
        loop_end: f64,
    },
    Sound {
        name: String,
        path: String,
    },
    Particle {
        name: String,
        path: String,
        sprite: String,
    },
    /// Fixed-size glyph grid cut from a texture, one cell per char of
    /// `charset`, row-major.
    SpriteFont {
        name: String,
        texture: String,
        charset: String,
        glyph_width: f32,
        glyph_height: f32,
        columns: u32,
    },
    OutlineFont {
        name: String,
        path: String,
        size: f32,
    },
    PostEffectShader {
        name: String,
        path: String,
    },
    Model {
        name: String,
        path: String,
    },
}

impl AssetRequest {
    pub fn kind(&self) -> ResourceKind {
        match self {
            AssetRequest::Texture { .. } => ResourceKind::Texture,
            AssetRequest::Sprite { .. } => ResourceKind::Sprite,
            AssetRequest::Animation { .. } => ResourceKind::Animation,
            AssetRequest::Music { .. } => ResourceKind::Music,
            AssetRequest::Sound { .. } => ResourceKind::SoundEffect,
            AssetRequest::Particle { .. } => ResourceKind::Particle,
            AssetRequest::SpriteFont { .. } => ResourceKind::SpriteFont,
            AssetRequest::OutlineFont { .. } => ResourceKind::OutlineFont,
            AssetRequest::PostEffectShader { .. } => ResourceKind::PostEffectShader,
            AssetRequest::Model { .. } => ResourceKind::Model,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AssetRequest::Texture { name, .. }
            | AssetRequest::Sprite { name, .. }
            | AssetRequest::Animation { name, .. }
            | AssetRequest::Music { name, .. }
            | AssetRequest::Sound { name, .. }
            | AssetRequest::Particle { name, .. }
            | AssetRequest::SpriteFont { name, .. }
            | AssetRequest::OutlineFont { name, .. }
            | AssetRequest::PostEffectShader { name, .. }
            | AssetRequest::Model { name, .. } => name,
        }
    }

    /// Source file, for requests backed by one.
    pub fn path(&self) -> Option<&str> {
        match self {
            AssetRequest::Texture { path, .. }
            | AssetRequest::Music { path, .. }
            | AssetRequest::Sound { path, .. }
            | AssetRequest::Particle { path, .. }
            | AssetRequest::OutlineFont { path, .. }
            | AssetRequest::PostEffectShader { path, .. }
            | AssetRequest::Model { path, .. } => Some(path),
            AssetRequest::Sprite { .. }
            | AssetRequest::Animation { .. }
            | AssetRequest::SpriteFont { .. } => None,
        }
    }
}

/// An asset request bound to the pool it should land in.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetCmd {
    /// Pool that was active when the request was queued.
    pub pool: String,
    pub request: AssetRequest,
}

/// Factory turning requests into resources.
///
/// `registry` is available for resolving dependencies such as the texture a
/// sprite is cut from.
pub trait AssetLoader {
    fn load(
        &self,
        request: &AssetRequest,
        registry: &ResourceRegistry,
    ) -> Result<ResourceHandle, String>;
}

/// Loader that builds resources from request metadata without decoding.
///
/// Textures get a configured size (per path, or the default). Sound effects
/// are wired to the audio sender when one is given.
#[derive(Debug, Clone)]
pub struct HeadlessLoader {
    audio: Option<Sender<AudioCmd>>,
    default_texture_size: (u32, u32),
    texture_sizes: FxHashMap<String, (u32, u32)>,
    require_files: bool,
}

impl Default for HeadlessLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessLoader {
    pub fn new() -> Self {
        Self {
            audio: None,
            default_texture_size: (256, 256),
            texture_sizes: FxHashMap::default(),
            require_files: false,
        }
    }

    pub fn with_audio(mut self, tx: Sender<AudioCmd>) -> Self {
        self.audio = Some(tx);
        self
    }

    pub fn with_default_texture_size(mut self, width: u32, height: u32) -> Self {
        self.default_texture_size = (width, height);
        self
    }

    /// Report `width` x `height` for textures loaded from `path`.
    pub fn with_texture_size(mut self, path: impl Into<String>, width: u32, height: u32) -> Self {
        self.texture_sizes.insert(path.into(), (width, height));
        self
    }

    /// Fail requests whose source file does not exist.
    pub fn require_files(mut self, require: bool) -> Self {
        self.require_files = require;
        self
    }

    fn texture_dependency(
        registry: &ResourceRegistry,
        texture: &str,
        for_name: &str,
    ) -> Result<Arc<TextureResource>, String> {
        registry
            .find_texture(texture)
            .ok_or_else(|| format!("texture '{}' not found for '{}'", texture, for_name))
    }
}

impl AssetLoader for HeadlessLoader {
    fn load(
        &self,
        request: &AssetRequest,
        registry: &ResourceRegistry,
    ) -> Result<ResourceHandle, String> {
        if self.require_files
            && let Some(path) = request.path()
            && !Path::new(path).exists()
        {
            return Err(format!("file not found: {}", path));
        }

        let handle = match request {
            AssetRequest::Texture { name, path, mipmap } => {
                let (w, h) = self
                    .texture_sizes
                    .get(path)
                    .copied()
                    .unwrap_or(self.default_texture_size);
                let mut tex = TextureResource::new(name.as_str(), path.as_str(), w, h);
                tex.mipmap = *mipmap;
                ResourceHandle::Texture(Arc::new(tex))
            }
            AssetRequest::Sprite {
                name,
                texture,
                rect,
            } => ResourceHandle::Sprite(Arc::new(SpriteResource {
                name: name.clone(),
                texture: Self::texture_dependency(registry, texture, name)?,
                rect: *rect,
            })),
            AssetRequest::Animation {
                name,
                texture,
                rect,
                columns,
                rows,
                interval,
            } => {
                if *columns == 0 || *rows == 0 {
                    return Err(format!("animation '{}' has an empty frame grid", name));
                }
                ResourceHandle::Animation(Arc::new(AnimationResource {
                    name: name.clone(),
                    texture: Self::texture_dependency(registry, texture, name)?,
                    rect: *rect,
                    columns: *columns,
                    rows: *rows,
                    interval: (*interval).max(1),
                }))
            }
            AssetRequest::Music {
                name,
                path,
                loop_start,
                loop_end,
            } => ResourceHandle::Music(Arc::new(MusicResource {
                name: name.clone(),
                path: path.clone(),
                loop_start: *loop_start,
                loop_end: *loop_end,
            })),
            AssetRequest::Sound { name, path } => ResourceHandle::SoundEffect(Arc::new(
                SoundEffectResource::new(name.as_str(), path.as_str(), self.audio.clone()),
            )),
            AssetRequest::Particle { name, path, sprite } => {
                let sprite_res = registry
                    .find_sprite(sprite)
                    .ok_or_else(|| format!("sprite '{}' not found for '{}'", sprite, name))?;
                ResourceHandle::Particle(Arc::new(ParticleResource {
                    name: name.clone(),
                    path: path.clone(),
                    sprite: sprite_res,
                }))
            }
            AssetRequest::SpriteFont {
                name,
                texture,
                charset,
                glyph_width,
                glyph_height,
                columns,
            } => {
                let columns = (*columns).max(1);
                let glyphs = charset
                    .chars()
                    .enumerate()
                    .map(|(i, ch)| {
                        let col = (i as u32 % columns) as f32;
                        let row = (i as u32 / columns) as f32;
                        (
                            ch,
                            TextureRect::new(
                                col * glyph_width,
                                row * glyph_height,
                                *glyph_width,
                                *glyph_height,
                            ),
                        )
                    })
                    .collect();
                ResourceHandle::SpriteFont(Arc::new(SpriteFontResource {
                    name: name.clone(),
                    texture: Self::texture_dependency(registry, texture, name)?,
                    glyphs,
                }))
            }
            AssetRequest::OutlineFont { name, path, size } => {
                if *size <= 0.0 {
                    return Err(format!("font '{}' has invalid size {}", name, size));
                }
                ResourceHandle::OutlineFont(Arc::new(OutlineFontResource::new(
                    name.as_str(),
                    path.as_str(),
                    *size,
                )))
            }
            AssetRequest::PostEffectShader { name, path } => {
                ResourceHandle::PostEffectShader(Arc::new(PostEffectShaderResource {
                    name: name.clone(),
                    path: path.clone(),
                }))
            }
            AssetRequest::Model { name, path } => ResourceHandle::Model(Arc::new(ModelResource {
                name: name.clone(),
                path: path.clone(),
            })),
        };
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_uses_configured_size() {
        let registry = ResourceRegistry::new();
        let loader = HeadlessLoader::new()
            .with_default_texture_size(64, 32)
            .with_texture_size("big.png", 1024, 512);
        let small = loader
            .load(
                &AssetRequest::Texture {
                    name: "a".into(),
                    path: "a.png".into(),
                    mipmap: false,
                },
                &registry,
            )
            .unwrap();
        let big = loader
            .load(
                &AssetRequest::Texture {
                    name: "b".into(),
                    path: "big.png".into(),
                    mipmap: true,
                },
                &registry,
            )
            .unwrap();
        match (small, big) {
            (ResourceHandle::Texture(s), ResourceHandle::Texture(b)) => {
                assert_eq!(s.size(), (64, 32));
                assert_eq!(b.size(), (1024, 512));
                assert!(b.mipmap);
            }
            other => panic!("unexpected handles: {:?}", other),
        }
    }

    #[test]
    fn test_sprite_requires_texture() {
        let registry = ResourceRegistry::new();
        let loader = HeadlessLoader::new();
        let request = AssetRequest::Sprite {
            name: "ship".into(),
            texture: "atlas".into(),
            rect: TextureRect::new(0.0, 0.0, 16.0, 16.0),
        };
        assert!(loader.load(&request, &registry).is_err());

        registry.load(Arc::new(TextureResource::new("atlas", "atlas.png", 128, 128)));
        let handle = loader.load(&request, &registry).unwrap();
        assert_eq!(handle.kind(), ResourceKind::Sprite);
        assert_eq!(handle.name(), "ship");
    }

    #[test]
    fn test_sprite_font_grid() {
        let registry = ResourceRegistry::new();
        registry.load(Arc::new(TextureResource::new("font", "font.png", 64, 64)));
        let handle = HeadlessLoader::new()
            .load(
                &AssetRequest::SpriteFont {
                    name: "digits".into(),
                    texture: "font".into(),
                    charset: "0123".into(),
                    glyph_width: 8.0,
                    glyph_height: 10.0,
                    columns: 3,
                },
                &registry,
            )
            .unwrap();
        let ResourceHandle::SpriteFont(font) = handle else {
            panic!("expected sprite font");
        };
        assert_eq!(font.glyphs.len(), 4);
        assert_eq!(font.glyphs[&'2'], TextureRect::new(16.0, 0.0, 8.0, 10.0));
        assert_eq!(font.glyphs[&'3'], TextureRect::new(0.0, 10.0, 8.0, 10.0));
    }

    #[test]
    fn test_require_files_rejects_missing() {
        let registry = ResourceRegistry::new();
        let loader = HeadlessLoader::new().require_files(true);
        let err = loader
            .load(
                &AssetRequest::Model {
                    name: "m".into(),
                    path: "/nonexistent/model.obj".into(),
                },
                &registry,
            )
            .unwrap_err();
        assert!(err.contains("file not found"));
    }

    #[test]
    fn test_request_metadata() {
        let req = AssetRequest::Sound {
            name: "hit".into(),
            path: "se/hit.wav".into(),
        };
        assert_eq!(req.kind(), ResourceKind::SoundEffect);
        assert_eq!(req.name(), "hit");
        assert_eq!(req.path(), Some("se/hit.wav"));
    }
}
