//! Synthetic scene used by the sweep binary and tests.

use shutter_core::{Image8, PixelLayout};

pub const BACKGROUND_WIDTH: usize = 800;
pub const BACKGROUND_HEIGHT: usize = 600;
pub const BACKGROUND_LEVEL: u8 = 200;
pub const GRID_SPACING: usize = 50;
pub const GRID_LEVEL: u8 = 150;

pub const OBJECT_WIDTH: usize = 200;
pub const OBJECT_HEIGHT: usize = 100;
/// Inset of the red rectangle inside the object.
pub const OBJECT_MARGIN: usize = 10;

/// Light grey RGB background with a one-pixel grid.
pub fn demo_background() -> Image8 {
    let mut bg = Image8::filled(
        BACKGROUND_WIDTH,
        BACKGROUND_HEIGHT,
        PixelLayout::Rgb,
        BACKGROUND_LEVEL,
    );
    for y in 0..BACKGROUND_HEIGHT {
        for x in 0..BACKGROUND_WIDTH {
            if x % GRID_SPACING == 0 || y % GRID_SPACING == 0 {
                bg.pixel_mut(x, y).fill(GRID_LEVEL);
            }
        }
    }
    bg
}

/// Opaque white RGBA object with a filled red rectangle inset by
/// [`OBJECT_MARGIN`]; the rectangle's far edges are inclusive.
pub fn demo_object() -> Image8 {
    let mut obj = Image8::filled(OBJECT_WIDTH, OBJECT_HEIGHT, PixelLayout::Rgba, 255);
    for y in OBJECT_MARGIN..=OBJECT_HEIGHT - OBJECT_MARGIN {
        for x in OBJECT_MARGIN..=OBJECT_WIDTH - OBJECT_MARGIN {
            obj.pixel_mut(x, y).copy_from_slice(&[255, 0, 0, 255]);
        }
    }
    obj
}
