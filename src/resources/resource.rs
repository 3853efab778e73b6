//! Loaded resource types stored in resource pools.
//!
//! Every resource is immutable once it has been handed to a pool and is
//! shared through an [`Arc`]. The only interior mutation allowed is a
//! kind-specific cache: the glyph cache of an outline font and the pending
//! command buffer of a sound effect. Neither changes the identity of the
//! resource.
//!
//! Payloads here carry the metadata the registry and its callers need
//! (dimensions, source paths, sub-rectangles). Decoded pixel or sample data
//! belongs to the rendering and audio backends.

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::events::audio::AudioCmd;

/// The ten resource categories. Each kind is an independent namespace inside
/// a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture,
    Sprite,
    Animation,
    Music,
    SoundEffect,
    Particle,
    SpriteFont,
    OutlineFont,
    PostEffectShader,
    Model,
}

impl ResourceKind {
    /// All kinds, in declaration order.
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::Texture,
        ResourceKind::Sprite,
        ResourceKind::Animation,
        ResourceKind::Music,
        ResourceKind::SoundEffect,
        ResourceKind::Particle,
        ResourceKind::SpriteFont,
        ResourceKind::OutlineFont,
        ResourceKind::PostEffectShader,
        ResourceKind::Model,
    ];

    /// Short name used by scripts and log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Texture => "texture",
            ResourceKind::Sprite => "sprite",
            ResourceKind::Animation => "animation",
            ResourceKind::Music => "music",
            ResourceKind::SoundEffect => "sound",
            ResourceKind::Particle => "particle",
            ResourceKind::SpriteFont => "sprite_font",
            ResourceKind::OutlineFont => "ttf",
            ResourceKind::PostEffectShader => "fx",
            ResourceKind::Model => "model",
        }
    }

    /// Parse a kind from its script name.
    pub fn from_name(name: &str) -> Option<Self> {
        ResourceKind::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned sub-rectangle of a texture, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextureRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl TextureRect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// A loaded texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureResource {
    pub name: String,
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub mipmap: bool,
}

impl TextureResource {
    pub fn new(name: impl Into<String>, path: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            width,
            height,
            mipmap: false,
        }
    }

    /// Pixel dimensions as `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// A sprite: a rectangle cut out of a texture.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteResource {
    pub name: String,
    pub texture: Arc<TextureResource>,
    pub rect: TextureRect,
}

/// A sprite-sheet animation: `columns * rows` frames laid out from `rect`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationResource {
    pub name: String,
    pub texture: Arc<TextureResource>,
    pub rect: TextureRect,
    pub columns: u32,
    pub rows: u32,
    /// Frames each image stays on screen.
    pub interval: u32,
}

impl AnimationResource {
    pub fn frame_count(&self) -> u32 {
        self.columns * self.rows
    }
}

/// A streamed music track with an optional loop window (seconds).
#[derive(Debug, Clone, PartialEq)]
pub struct MusicResource {
    pub name: String,
    pub path: String,
    pub loop_start: f64,
    pub loop_end: f64,
}

/// A particle system definition emitting copies of a sprite.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleResource {
    pub name: String,
    pub path: String,
    pub sprite: Arc<SpriteResource>,
}

/// A bitmap font with fixed glyph rectangles on a texture.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteFontResource {
    pub name: String,
    pub texture: Arc<TextureResource>,
    pub glyphs: FxHashMap<char, TextureRect>,
}

/// A post-processing shader.
#[derive(Debug, Clone, PartialEq)]
pub struct PostEffectShaderResource {
    pub name: String,
    pub path: String,
}

/// A 3D model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResource {
    pub name: String,
    pub path: String,
}

/// Set of glyphs an outline font has already rasterized.
///
/// Caching appends only; a glyph is never evicted while the font is alive.
#[derive(Debug, Default)]
pub struct GlyphCache {
    glyphs: Mutex<FxHashSet<char>>,
}

impl GlyphCache {
    /// Materialize every glyph used by `text`. Returns how many glyphs were
    /// newly added.
    pub fn cache_string(&self, text: &str) -> usize {
        let mut glyphs = self.glyphs.lock();
        text.chars()
            .filter(|c| !c.is_control())
            .filter(|c| glyphs.insert(*c))
            .count()
    }

    pub fn contains(&self, glyph: char) -> bool {
        self.glyphs.lock().contains(&glyph)
    }

    pub fn len(&self) -> usize {
        self.glyphs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.lock().is_empty()
    }
}

/// An outline (TrueType) font rasterized on demand at a fixed size.
#[derive(Debug)]
pub struct OutlineFontResource {
    pub name: String,
    pub path: String,
    pub size: f32,
    glyph_cache: GlyphCache,
}

impl OutlineFontResource {
    pub fn new(name: impl Into<String>, path: impl Into<String>, size: f32) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            size,
            glyph_cache: GlyphCache::default(),
        }
    }

    pub fn glyph_cache(&self) -> &GlyphCache {
        &self.glyph_cache
    }
}

/// Play request buffered during the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayRequest {
    pub volume: f32,
    pub pan: f32,
}

#[derive(Debug, Default)]
struct PendingSound {
    stop: bool,
    play: Option<PlayRequest>,
}

/// A sound effect whose playback requests are buffered until the next flush.
///
/// Several `play` calls in the same frame collapse into one request at the
/// loudest volume. A `stop` discards plays requested before it.
#[derive(Debug)]
pub struct SoundEffectResource {
    pub name: String,
    pub path: String,
    pending: Mutex<PendingSound>,
    output: Option<Sender<AudioCmd>>,
}

impl SoundEffectResource {
    /// Create a sound effect. Without an output the flushed commands are
    /// dropped, which is what headless runs want.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        output: Option<Sender<AudioCmd>>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            pending: Mutex::new(PendingSound::default()),
            output,
        }
    }

    /// Request playback at `volume` (0..1) and `pan` (-1..1).
    pub fn play(&self, volume: f32, pan: f32) {
        let request = PlayRequest {
            volume: volume.clamp(0.0, 1.0),
            pan: pan.clamp(-1.0, 1.0),
        };
        let mut pending = self.pending.lock();
        pending.play = match pending.play {
            Some(prev) if prev.volume >= request.volume => Some(prev),
            _ => Some(request),
        };
    }

    pub fn stop(&self) {
        let mut pending = self.pending.lock();
        pending.stop = true;
        pending.play = None;
    }

    /// Whether anything is waiting for the next flush.
    pub fn has_pending(&self) -> bool {
        let pending = self.pending.lock();
        pending.stop || pending.play.is_some()
    }

    /// Forward the buffered commands and reset the buffer. Returns the number
    /// of commands emitted.
    pub fn flush_command(&self) -> usize {
        let PendingSound { stop, play } = std::mem::take(&mut *self.pending.lock());
        let mut emitted = 0;
        if stop {
            self.emit(AudioCmd::StopFx {
                id: self.name.clone(),
            });
            emitted += 1;
        }
        if let Some(PlayRequest { volume, pan }) = play {
            self.emit(AudioCmd::PlayFx {
                id: self.name.clone(),
                volume,
                pan,
            });
            emitted += 1;
        }
        emitted
    }

    fn emit(&self, cmd: AudioCmd) {
        if let Some(tx) = &self.output {
            // The audio thread may already be gone during shutdown
            let _ = tx.send(cmd);
        }
    }
}

/// A type-erased resource handle, tagged by kind.
#[derive(Debug, Clone)]
pub enum ResourceHandle {
    Texture(Arc<TextureResource>),
    Sprite(Arc<SpriteResource>),
    Animation(Arc<AnimationResource>),
    Music(Arc<MusicResource>),
    SoundEffect(Arc<SoundEffectResource>),
    Particle(Arc<ParticleResource>),
    SpriteFont(Arc<SpriteFontResource>),
    OutlineFont(Arc<OutlineFontResource>),
    PostEffectShader(Arc<PostEffectShaderResource>),
    Model(Arc<ModelResource>),
}

impl ResourceHandle {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceHandle::Texture(_) => ResourceKind::Texture,
            ResourceHandle::Sprite(_) => ResourceKind::Sprite,
            ResourceHandle::Animation(_) => ResourceKind::Animation,
            ResourceHandle::Music(_) => ResourceKind::Music,
            ResourceHandle::SoundEffect(_) => ResourceKind::SoundEffect,
            ResourceHandle::Particle(_) => ResourceKind::Particle,
            ResourceHandle::SpriteFont(_) => ResourceKind::SpriteFont,
            ResourceHandle::OutlineFont(_) => ResourceKind::OutlineFont,
            ResourceHandle::PostEffectShader(_) => ResourceKind::PostEffectShader,
            ResourceHandle::Model(_) => ResourceKind::Model,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ResourceHandle::Texture(r) => &r.name,
            ResourceHandle::Sprite(r) => &r.name,
            ResourceHandle::Animation(r) => &r.name,
            ResourceHandle::Music(r) => &r.name,
            ResourceHandle::SoundEffect(r) => &r.name,
            ResourceHandle::Particle(r) => &r.name,
            ResourceHandle::SpriteFont(r) => &r.name,
            ResourceHandle::OutlineFont(r) => &r.name,
            ResourceHandle::PostEffectShader(r) => &r.name,
            ResourceHandle::Model(r) => &r.name,
        }
    }
}
