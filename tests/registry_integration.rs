//! Registry integration tests: pool lifecycle, precedence lookup, reset
//! behaviour and concurrent lookups.

use std::sync::Arc;

use stagepool::resources::registry::ResourceRegistry;
use stagepool::resources::resource::{
    OutlineFontResource, ResourceKind, SoundEffectResource, SpriteResource, TextureRect,
    TextureResource,
};
use stagepool::resources::resourcepool::PoolType;

fn texture(name: &str, w: u32, h: u32) -> Arc<TextureResource> {
    Arc::new(TextureResource::new(name, format!("{}.png", name), w, h))
}

fn sprite(name: &str, tex: &Arc<TextureResource>) -> Arc<SpriteResource> {
    Arc::new(SpriteResource {
        name: name.to_string(),
        texture: tex.clone(),
        rect: TextureRect::new(0.0, 0.0, 8.0, 8.0),
    })
}

#[test]
fn reserved_names_cannot_be_custom_pools() {
    let reg = ResourceRegistry::new();
    for name in ["global", "stage"] {
        assert!(!reg.create_pool(name));
    }
    assert_eq!(reg.enumerate_pools(), vec!["global", "stage"]);
    // Built-ins still resolve by name
    assert_eq!(reg.get_pool("global").unwrap().pool_type(), PoolType::Global);
    assert_eq!(reg.get_pool("stage").unwrap().pool_type(), PoolType::Stage);
}

#[test]
fn duplicate_create_keeps_original_pool() {
    let reg = ResourceRegistry::new();
    assert!(reg.create_pool("custom1"));
    let first = reg.get_pool("custom1").unwrap();
    first.insert(texture("marker", 1, 1));

    assert!(!reg.create_pool("custom1"));
    let again = reg.get_pool("custom1").unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert!(again.contains(ResourceKind::Texture, "marker"));
}

#[test]
fn removing_active_pool_falls_through_to_builtins() {
    let reg = ResourceRegistry::new();
    reg.create_pool("custom1");
    assert!(reg.set_active_pool_by_name("custom1"));
    reg.load(texture("x", 64, 64));
    reg.get_pool("stage").unwrap().insert(texture("x", 32, 32));

    assert_eq!(reg.get_texture_size("x"), Some((64, 64)));
    assert!(reg.remove_pool("custom1"));
    assert_eq!(reg.active_custom_pool_name(), "");
    assert!(reg.get_pool("custom1").is_none());
    assert_eq!(reg.get_texture_size("x"), Some((32, 32)));
    assert!(!reg.remove_pool("custom1"));
    assert!(!reg.remove_pool(""));
}

#[test]
fn active_custom_pool_shadows_stage_and_stage_shadows_global() {
    let reg = ResourceRegistry::new();
    reg.create_pool("mod");
    reg.set_active_pool_by_name("mod");
    reg.get_pool("mod").unwrap().insert(texture("X", 1, 1));
    reg.get_pool("stage").unwrap().insert(texture("X", 2, 2));
    reg.get_pool("global").unwrap().insert(texture("X", 3, 3));
    reg.get_pool("stage").unwrap().insert(texture("Z", 2, 2));
    reg.get_pool("global").unwrap().insert(texture("Z", 3, 3));

    assert_eq!(reg.find_texture("X").unwrap().size(), (1, 1));
    assert_eq!(reg.find_texture("Z").unwrap().size(), (2, 2));
    assert_eq!(reg.find_pool_of(ResourceKind::Texture, "X").as_deref(), Some("mod"));
    assert_eq!(reg.find_pool_of(ResourceKind::Texture, "Z").as_deref(), Some("stage"));
}

#[test]
fn inactive_custom_pools_are_scanned_last() {
    let reg = ResourceRegistry::new();
    reg.create_pool("other");
    let tex = texture("atlas", 16, 16);
    reg.get_pool("other").unwrap().insert(sprite("Y", &tex));

    let found = reg.find_sprite("Y").unwrap();
    assert_eq!(found.name, "Y");
    assert!(reg.find_sprite("missing").is_none());
}

#[test]
fn fallback_scan_follows_creation_order() {
    let reg = ResourceRegistry::new();
    reg.create_pool("first");
    reg.create_pool("second");
    reg.create_pool("third");
    reg.get_pool("second").unwrap().insert(texture("dup", 2, 2));
    reg.get_pool("third").unwrap().insert(texture("dup", 3, 3));
    assert_eq!(reg.find_texture("dup").unwrap().size(), (2, 2));

    // The active pool is skipped during the scan, not rechecked
    reg.set_active_pool_by_name("first");
    assert_eq!(reg.find_pool_of(ResourceKind::Texture, "dup").as_deref(), Some("second"));

    reg.remove_pool("second");
    assert_eq!(reg.find_texture("dup").unwrap().size(), (3, 3));
    assert_eq!(reg.enumerate_pools(), vec!["global", "stage", "first", "third"]);
}

#[test]
fn enumerate_lists_builtins_first() {
    let reg = ResourceRegistry::new();
    assert_eq!(reg.enumerate_pools(), vec!["global", "stage"]);
    for name in ["b", "a", "c"] {
        reg.create_pool(name);
    }
    let pools = reg.enumerate_pools();
    assert_eq!(&pools[..2], &["global", "stage"]);
    assert_eq!(&pools[2..], &["b", "a", "c"]);
}

#[test]
fn clear_all_resources_spares_custom_pools() {
    let reg = ResourceRegistry::new();
    reg.create_pool("keep");
    reg.get_pool("keep").unwrap().insert(texture("k", 1, 1));
    reg.get_pool("global").unwrap().insert(texture("g", 1, 1));
    reg.get_pool("stage").unwrap().insert(texture("s", 1, 1));
    reg.set_active_pool_by_name("stage");
    reg.set_image_scale_factor(3.0);

    reg.clear_all_resources();

    assert!(reg.get_pool("global").unwrap().is_empty());
    assert!(reg.get_pool("stage").unwrap().is_empty());
    assert_eq!(reg.active_pool_type(), PoolType::Global);
    assert_eq!(reg.image_scale_factor(), 1.0);
    assert!(reg.get_pool("keep").unwrap().contains(ResourceKind::Texture, "k"));
    assert!(reg.find_texture("k").is_some());
}

#[test]
fn texture_size_miss_reports_none() {
    let reg = ResourceRegistry::new();
    let mut size = (7, 9);
    if let Some(found) = reg.get_texture_size("nope") {
        size = found;
    }
    assert_eq!(size, (7, 9));
}

#[test]
fn glyph_caching_touches_only_the_font() {
    let reg = ResourceRegistry::new();
    let font = Arc::new(OutlineFontResource::new("ui", "ui.ttf", 16.0));
    reg.load(font.clone());
    reg.cache_glyphs_for_string("ui", "hello");
    assert_eq!(font.glyph_cache().len(), 4);
    // Missing font is logged and ignored
    reg.cache_glyphs_for_string("nope", "abc");
    assert!(!font.glyph_cache().contains('a'));
}

#[test]
fn audio_flush_skips_custom_pools() {
    let (tx, rx) = crossbeam_channel::unbounded();
    let reg = ResourceRegistry::new();
    let global_snd = Arc::new(SoundEffectResource::new("g", "g.wav", Some(tx.clone())));
    let custom_snd = Arc::new(SoundEffectResource::new("c", "c.wav", Some(tx)));
    reg.load(global_snd.clone());
    reg.create_pool("mod");
    reg.get_pool("mod").unwrap().insert(custom_snd.clone());

    global_snd.play(0.5, 0.0);
    custom_snd.play(0.5, 0.0);
    assert_eq!(reg.flush_audio_commands(), 1);
    assert_eq!(rx.try_iter().count(), 1);
    assert!(custom_snd.has_pending());
    assert!(!global_snd.has_pending());
}

#[test]
fn loading_log_flag_round_trips() {
    let before = ResourceRegistry::resource_loading_log();
    ResourceRegistry::set_resource_loading_log(!before);
    assert_eq!(ResourceRegistry::resource_loading_log(), !before);
    ResourceRegistry::set_resource_loading_log(before);
}

#[test]
fn lookups_survive_concurrent_pool_churn() {
    let reg = Arc::new(ResourceRegistry::new());
    reg.get_pool("global").unwrap().insert(texture("base", 4, 4));

    std::thread::scope(|s| {
        let writer = reg.clone();
        s.spawn(move || {
            for i in 0..200 {
                let name = format!("pool{}", i % 4);
                writer.create_pool(&name);
                if let Some(pool) = writer.get_pool(&name) {
                    pool.insert(texture("churn", 8, 8));
                }
                writer.set_active_pool_by_name(&name);
                writer.remove_pool(&name);
            }
        });
        for _ in 0..4 {
            let reader = reg.clone();
            s.spawn(move || {
                for _ in 0..500 {
                    assert_eq!(reader.get_texture_size("base"), Some((4, 4)));
                    if let Some(tex) = reader.find_texture("churn") {
                        assert_eq!(tex.size(), (8, 8));
                    }
                    assert!(reader.enumerate_pools().len() >= 2);
                }
            });
        }
    });

    assert_eq!(reg.enumerate_pools(), vec!["global", "stage"]);
    assert!(reg.find_texture("churn").is_none());
}
