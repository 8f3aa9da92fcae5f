use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use egui::{ColorImage, Context, TextureHandle, TextureId, TextureOptions};
use image::RgbaImage;
use thiserror::Error;

use crate::element::ElementId;

/// Errors that can occur during texture generation
#[derive(Error, Debug)]
pub enum TextureGenerationError {
    #[error("Nothing to upload yet")]
    NotReady,
    #[error("Invalid texture dimensions {0}x{1}")]
    InvalidDimensions(u32, u32),
}

/// What a cached texture belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKey {
    Background,
    Element(ElementId),
}

/// Hash anything that determines a texture's pixels into a version number
pub fn texture_version(parts: impl Hash) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    parts.hash(&mut hasher);
    hasher.finish()
}

/// Upload an RGBA bitmap as an egui image
pub fn color_image(image: &RgbaImage) -> Result<ColorImage, TextureGenerationError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(TextureGenerationError::InvalidDimensions(
            image.width(),
            image.height(),
        ));
    }
    Ok(ColorImage::from_rgba_unmultiplied(
        [image.width() as usize, image.height() as usize],
        image.as_raw(),
    ))
}

/// GPU textures for the background and every element, cached per version
/// with least-recently-used eviction
pub struct TextureManager {
    /// Cache of textures by (key, version)
    texture_cache: HashMap<(TextureKey, u64), TextureHandle>,
    /// Tracks when each texture was last used
    last_used: HashMap<(TextureKey, u64), u64>,
    /// Current frame counter for LRU tracking
    current_frame: u64,
    max_cache_size: usize,
}

impl std::fmt::Debug for TextureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureManager")
            .field("cached", &self.texture_cache.len())
            .field("frame", &self.current_frame)
            .finish()
    }
}

impl Default for TextureManager {
    fn default() -> Self {
        Self::new(64)
    }
}

impl TextureManager {
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            texture_cache: HashMap::new(),
            last_used: HashMap::new(),
            current_frame: 0,
            max_cache_size: max_cache_size.max(1),
        }
    }

    /// Should be called at the start of each frame
    pub fn begin_frame(&mut self) {
        self.current_frame += 1;
    }

    /// Gets or creates the texture for `key` at `version`
    pub fn get_or_create_texture<F>(
        &mut self,
        key: TextureKey,
        version: u64,
        generator: F,
        ctx: &Context,
    ) -> Result<TextureId, TextureGenerationError>
    where
        F: FnOnce() -> Result<ColorImage, TextureGenerationError>,
    {
        let cache_key = (key, version);
        if let Some(handle) = self.texture_cache.get(&cache_key) {
            self.last_used.insert(cache_key, self.current_frame);
            return Ok(handle.id());
        }

        let image = generator()?;
        let name = match key {
            TextureKey::Background => format!("background_v{}", version),
            TextureKey::Element(id) => format!("element_{}_v{}", id, version),
        };
        let handle = ctx.load_texture(name, image, TextureOptions::LINEAR);
        let id = handle.id();

        // Older versions of the same key are never shown again
        self.invalidate(key);
        self.texture_cache.insert(cache_key, handle);
        self.last_used.insert(cache_key, self.current_frame);
        self.prune_cache_if_needed();

        Ok(id)
    }

    /// Drop every texture belonging to `key`
    pub fn invalidate(&mut self, key: TextureKey) {
        self.texture_cache.retain(|(cached, _), _| *cached != key);
        self.last_used.retain(|(cached, _), _| *cached != key);
    }

    fn prune_cache_if_needed(&mut self) {
        if self.texture_cache.len() <= self.max_cache_size {
            return;
        }

        let mut entries: Vec<((TextureKey, u64), u64)> =
            self.last_used.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(_, frame)| *frame);

        let to_remove = entries.len() - self.max_cache_size;
        for (key, _) in entries.iter().take(to_remove) {
            self.texture_cache.remove(key);
            self.last_used.remove(key);
        }
    }

    /// Forget textures of elements that no longer exist
    pub fn retain_elements(&mut self, alive: impl Fn(ElementId) -> bool) {
        let keep = |key: &TextureKey| match key {
            TextureKey::Background => true,
            TextureKey::Element(id) => alive(*id),
        };
        self.texture_cache.retain(|(key, _), _| keep(key));
        self.last_used.retain(|(key, _), _| keep(key));
    }

    pub fn cache_size(&self) -> usize {
        self.texture_cache.len()
    }

    #[cfg(test)]
    fn get_texture(&self, key: TextureKey, version: u64) -> Option<&TextureHandle> {
        self.texture_cache.get(&(key, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_texture_generator() -> Result<ColorImage, TextureGenerationError> {
        Ok(ColorImage::new([10, 10], egui::Color32::WHITE))
    }

    #[test]
    fn test_cache_hit() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(10);
        let key = TextureKey::Element(ElementId::new());

        let first = manager
            .get_or_create_texture(key, 1, mock_texture_generator, &ctx)
            .unwrap();
        let second = manager
            .get_or_create_texture(key, 1, || Err(TextureGenerationError::NotReady), &ctx)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(manager.cache_size(), 1);
    }

    #[test]
    fn test_new_version_replaces_old() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(10);
        let key = TextureKey::Element(ElementId::new());

        manager.get_or_create_texture(key, 1, mock_texture_generator, &ctx).unwrap();
        manager.get_or_create_texture(key, 2, mock_texture_generator, &ctx).unwrap();

        assert_eq!(manager.cache_size(), 1);
        assert!(manager.get_texture(key, 1).is_none());
        assert!(manager.get_texture(key, 2).is_some());
    }

    #[test]
    fn test_lru_eviction() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(2);
        let keys = [ElementId::new(), ElementId::new(), ElementId::new()].map(TextureKey::Element);

        for key in keys {
            manager.get_or_create_texture(key, 1, mock_texture_generator, &ctx).unwrap();
            manager.begin_frame();
        }

        assert_eq!(manager.cache_size(), 2);
        assert!(manager.get_texture(keys[0], 1).is_none());
        assert!(manager.get_texture(keys[1], 1).is_some());
        assert!(manager.get_texture(keys[2], 1).is_some());
    }

    #[test]
    fn test_retain_elements_keeps_background() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(10);
        let gone = ElementId::new();

        manager
            .get_or_create_texture(TextureKey::Background, 7, mock_texture_generator, &ctx)
            .unwrap();
        manager
            .get_or_create_texture(TextureKey::Element(gone), 1, mock_texture_generator, &ctx)
            .unwrap();
        manager.retain_elements(|id| id != gone);

        assert_eq!(manager.cache_size(), 1);
        assert!(manager.get_texture(TextureKey::Background, 7).is_some());
    }

    #[test]
    fn test_generator_errors_propagate() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(10);
        let result = manager.get_or_create_texture(
            TextureKey::Background,
            1,
            || Err(TextureGenerationError::NotReady),
            &ctx,
        );
        assert!(matches!(result, Err(TextureGenerationError::NotReady)));
        assert_eq!(manager.cache_size(), 0);
    }

    #[test]
    fn test_empty_bitmap_is_rejected() {
        let image = RgbaImage::new(0, 4);
        assert!(matches!(
            color_image(&image),
            Err(TextureGenerationError::InvalidDimensions(0, 4))
        ));
    }
}
