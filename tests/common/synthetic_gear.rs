//! Synthetic spur-gear images for end-to-end pipeline tests.
//!
//! The geometry mirrors the calibrated defaults: the gear body sits inside
//! the hub-exclusion radius, the eight teeth sit outside it, and the bore
//! matches the expected 25 px reference radius.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_circle_mut;

pub const SIZE: u32 = 512;
pub const CENTER: (i32, i32) = (256, 256);
pub const BODY_RADIUS: i32 = 155;
pub const BORE_RADIUS: i32 = 25;
pub const TOOTH_RING_RADIUS: f64 = 185.0;
pub const TOOTH_RADIUS: i32 = 12;
pub const TOOTH_COUNT: usize = 8;

const BODY_VALUE: u8 = 220;

/// Center of tooth `index` on a ring of the given radius.
pub fn tooth_center(index: usize, ring_radius: f64) -> (i32, i32) {
    let angle = index as f64 * std::f64::consts::TAU / TOOTH_COUNT as f64;
    (
        CENTER.0 + (ring_radius * angle.cos()).round() as i32,
        CENTER.1 + (ring_radius * angle.sin()).round() as i32,
    )
}

/// A gear with the given bore radius and per-tooth radii (0 = tooth absent).
pub fn gear(bore_radius: i32, tooth_radii: &[i32; TOOTH_COUNT]) -> GrayImage {
    let mut img = GrayImage::from_pixel(SIZE, SIZE, Luma([0u8]));
    draw_filled_circle_mut(&mut img, CENTER, BODY_RADIUS, Luma([BODY_VALUE]));
    for (index, &radius) in tooth_radii.iter().enumerate() {
        if radius > 0 {
            let center = tooth_center(index, TOOTH_RING_RADIUS);
            draw_filled_circle_mut(&mut img, center, radius, Luma([BODY_VALUE]));
        }
    }
    if bore_radius > 0 {
        draw_filled_circle_mut(&mut img, CENTER, bore_radius, Luma([0u8]));
    }
    img
}

/// The reference gear: full teeth, nominal bore.
pub fn ideal_gear() -> GrayImage {
    gear(BORE_RADIUS, &[TOOTH_RADIUS; TOOTH_COUNT])
}

/// A gear whose tooth `index` is missing entirely.
pub fn gear_with_broken_tooth(index: usize) -> GrayImage {
    let mut radii = [TOOTH_RADIUS; TOOTH_COUNT];
    radii[index] = 0;
    gear(BORE_RADIUS, &radii)
}

/// A gear whose tooth `index` is worn down to a small remnant near the
/// tooth root.
pub fn gear_with_worn_tooth(index: usize, remnant_radius: i32) -> GrayImage {
    let mut img = gear_with_broken_tooth(index);
    let inward = (TOOTH_RADIUS - remnant_radius) as f64;
    let center = tooth_center(index, TOOTH_RING_RADIUS - inward);
    draw_filled_circle_mut(&mut img, center, remnant_radius, Luma([BODY_VALUE]));
    img
}
