//! The uploaded backdrop image, fitted to the terminal as half-block cells.
//!
//! Every cell covers two source pixels stacked vertically, drawn as `▀`
//! with the top pixel as foreground and the bottom pixel as background.

use backdrop_core::{ScaleMode, ThemeColor};
use image::{
    RgbImage,
    imageops::{self, FilterType},
};

/// Decoded images are thumbnailed to at most this many pixels per side.
const MAX_SOURCE_SIDE: u32 = 1024;

/// A decoded backdrop image.
#[derive(Debug, Clone)]
pub struct Picture {
    source: RgbImage,
}

impl Picture {
    /// Decode any format the `image` crate was built with.
    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
        let img = if img.width() > MAX_SOURCE_SIDE || img.height() > MAX_SOURCE_SIDE {
            img.thumbnail(MAX_SOURCE_SIDE, MAX_SOURCE_SIDE)
        } else {
            img
        };
        Ok(Self::from_rgb(img.to_rgb8()))
    }

    pub fn from_rgb(source: RgbImage) -> Self {
        Self { source }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.source.dimensions()
    }
}

/// Resample `source` onto a `width` x `height` pixel grid. Pixels the
/// image does not reach (letterboxing in contain mode) are `None`.
pub fn fit(source: &RgbImage, mode: ScaleMode, width: u32, height: u32) -> Vec<Option<ThemeColor>> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let (iw, ih) = source.dimensions();
    let (iw, ih) = (iw.max(1), ih.max(1));
    let sx = width as f32 / iw as f32;
    let sy = height as f32 / ih as f32;
    let rgb = |p: &image::Rgb<u8>| {
        let [r, g, b] = p.0;
        Some(ThemeColor::new(r, g, b))
    };

    match mode {
        ScaleMode::Fill => imageops::resize(source, width, height, FilterType::Triangle)
            .pixels()
            .map(rgb)
            .collect(),
        ScaleMode::Cover => {
            let scale = sx.max(sy);
            let rw = ((iw as f32 * scale).ceil() as u32).max(width);
            let rh = ((ih as f32 * scale).ceil() as u32).max(height);
            let scaled = imageops::resize(source, rw, rh, FilterType::Triangle);
            let (ox, oy) = ((rw - width) / 2, (rh - height) / 2);
            imageops::crop_imm(&scaled, ox, oy, width, height)
                .to_image()
                .pixels()
                .map(rgb)
                .collect()
        }
        ScaleMode::Contain => {
            let scale = sx.min(sy);
            let rw = ((iw as f32 * scale).round() as u32).clamp(1, width);
            let rh = ((ih as f32 * scale).round() as u32).clamp(1, height);
            let scaled = imageops::resize(source, rw, rh, FilterType::Triangle);
            let (ox, oy) = ((width - rw) / 2, (height - rh) / 2);
            let mut pixels = vec![None; width as usize * height as usize];
            for (x, y, p) in scaled.enumerate_pixels() {
                pixels[(y + oy) as usize * width as usize + (x + ox) as usize] = rgb(p);
            }
            pixels
        }
    }
}

/// The picture fitted to the current viewport.
#[derive(Debug, Default)]
pub struct PictureLayer {
    picture: Option<Picture>,
    mode: ScaleMode,
    width: u16,
    height: u16,
    /// `width` x `2 * height` fitted pixels; empty when there is no picture.
    pixels: Vec<Option<ThemeColor>>,
}

impl PictureLayer {
    pub fn set_picture(&mut self, picture: Option<Picture>) {
        self.picture = picture;
        self.refit();
    }

    pub fn set_mode(&mut self, mode: ScaleMode) {
        if mode != self.mode {
            self.mode = mode;
            self.refit();
        }
    }

    pub fn mode(&self) -> ScaleMode {
        self.mode
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.refit();
    }

    pub fn is_visible(&self) -> bool {
        !self.pixels.is_empty()
    }

    /// Top and bottom pixel of cell `(x, y)`. A letterboxed half is black;
    /// a cell the image does not touch at all is `None`.
    pub fn cell(&self, x: u16, y: u16) -> Option<(ThemeColor, ThemeColor)> {
        if self.pixels.is_empty() || x >= self.width || y >= self.height {
            return None;
        }
        let w = self.width as usize;
        let top = self.pixels[2 * y as usize * w + x as usize];
        let bottom = self.pixels[(2 * y as usize + 1) * w + x as usize];
        let black = ThemeColor::new(0, 0, 0);
        match (top, bottom) {
            (None, None) => None,
            (top, bottom) => Some((top.unwrap_or(black), bottom.unwrap_or(black))),
        }
    }

    fn refit(&mut self) {
        self.pixels = match &self.picture {
            Some(picture) => fit(
                &picture.source,
                self.mode,
                u32::from(self.width),
                u32::from(self.height) * 2,
            ),
            None => Vec::new(),
        };
    }
}
