//! Key cap artwork: loading, cover scaling and a per-size render cache.

use crate::error::{Error, Result};
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Background image shared by every cell bound to one key
#[derive(Clone)]
pub struct KeyBackground {
    source: Arc<DynamicImage>,
    path: Option<PathBuf>,
    cache: Option<RenderCache>,
}

#[derive(Clone)]
struct RenderCache {
    width: u32,
    height: u32,
    rgba: RgbaImage,
}

impl KeyBackground {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| Error::Image {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            source: Arc::new(image),
            path: Some(path.to_path_buf()),
            cache: None,
        })
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            source: Arc::new(image),
            path: None,
            cache: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Both handles refer to the same decoded image
    pub fn same_image(&self, other: &KeyBackground) -> bool {
        Arc::ptr_eq(&self.source, &other.source)
    }

    /// Image scaled to cover `width x height` pixels (aspect kept by expanding, centre-cropped)
    pub fn pixels(&mut self, width: u32, height: u32) -> &RgbaImage {
        let cache = match self.cache.take() {
            Some(cache) if cache.width == width && cache.height == height => cache,
            _ => RenderCache {
                width,
                height,
                rgba: self
                    .source
                    .resize_to_fill(width.max(1), height.max(1), FilterType::Triangle)
                    .to_rgba8(),
            },
        };
        &self.cache.insert(cache).rgba
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn striped(width: u32, height: u32) -> DynamicImage {
        let img = RgbaImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn pixels_fill_requested_size() {
        let mut bg = KeyBackground::from_image(striped(40, 10));
        let rgba = bg.pixels(8, 8);
        assert_eq!(rgba.dimensions(), (8, 8));
    }

    #[test]
    fn cache_is_rebuilt_on_resize() {
        let mut bg = KeyBackground::from_image(striped(16, 16));
        assert_eq!(bg.pixels(4, 4).dimensions(), (4, 4));
        assert_eq!(bg.pixels(6, 2).dimensions(), (6, 2));
    }

    #[test]
    fn same_size_reuses_the_cache() {
        let mut bg = KeyBackground::from_image(striped(16, 16));
        let first = bg.pixels(5, 3).as_ptr();
        assert_eq!(bg.pixels(5, 3).as_ptr(), first);
        assert_eq!(bg.pixels(5, 3).dimensions(), (5, 3));
        assert_eq!(bg.pixels(0, 0).dimensions(), (1, 1));
        assert_eq!(bg.pixels(0, 0).dimensions(), (1, 1));
    }

    #[test]
    fn clones_share_the_source() {
        let bg = KeyBackground::from_image(striped(4, 4));
        let other = KeyBackground::from_image(striped(4, 4));
        assert!(bg.same_image(&bg.clone()));
        assert!(!bg.same_image(&other));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = KeyBackground::from_path("/nonexistent/heatboard-test.png");
        assert!(matches!(err, Err(Error::Image { .. })));
    }
}
