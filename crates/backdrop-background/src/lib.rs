//! Background layers for the backdrop terminal new-tab.
//!
//! Layers are composed bottom to top: the uploaded picture, fitted to the
//! viewport as half blocks; the digital rain, which keeps a fading cell
//! buffer and advances on its own timer; and the sprite overlay, which is
//! cleared and redrawn on every frame.

mod animations;
mod color;
mod picture;
mod state;

pub use animations::rain::{GLYPH_WIDTH, RainLayer, RainStyle};
pub use animations::sprites::{
    Particle, SPRITE_COUNT, SpriteFrame, SpriteLayer, SpriteSheet, SpriteSource,
};
pub use color::hsl_to_rgb;
pub use picture::{Picture, PictureLayer, fit};
pub use state::{BackgroundState, LayerOptions};
