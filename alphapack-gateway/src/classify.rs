//! Rarity classification from reward-banner pixels.
//!
//! The classifier samples a grid of pixels inside two proportional banner
//! regions (the banner moved between game versions), matches every sample
//! against the calibrated signature table, and majority-votes the result.
//! Pure and deterministic: the same bytes always classify the same way.

use image::{DynamicImage, GenericImageView};

use alphapack_core::{Rarity, SignatureTable};

/// Proportional rectangle inside an image, endpoints inclusive.
#[derive(Debug, Clone, Copy)]
struct BannerArea {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

/// Reward banner position in the pre-2020 layout.
const BANNER_LEGACY: BannerArea = BannerArea {
    x0: 0.486979,
    y0: 0.785185,
    x1: 0.507813,
    y1: 0.861111,
};

/// Reward banner position in the current layout.
const BANNER_CURRENT: BannerArea = BannerArea {
    x0: 0.510416,
    y0: 0.882407,
    x1: 0.546875,
    y1: 0.912037,
};

/// Pixel stride of the sampling grid within a banner area.
const SAMPLE_STRIDE: u32 = 2;

/// Classify a screenshot into a reward tier.
///
/// Votes are tallied per tier across both banner areas; the tier with the
/// most matching samples wins, ties broken by [`Rarity::CLASSIFIABLE`]
/// priority order. No matching sample anywhere yields `Unknown`.
pub fn classify(image: &DynamicImage, table: &SignatureTable) -> Rarity {
    let mut votes = [0usize; Rarity::CLASSIFIABLE.len()];

    for area in [BANNER_LEGACY, BANNER_CURRENT] {
        tally_area(image, table, area, &mut votes);
    }

    let mut best: Option<(Rarity, usize)> = None;
    for (idx, rarity) in Rarity::CLASSIFIABLE.into_iter().enumerate() {
        let count = votes[idx];
        if count == 0 {
            continue;
        }
        // Strict comparison keeps the earlier (higher-priority) tier on ties.
        if best.map(|(_, best_count)| count > best_count).unwrap_or(true) {
            best = Some((rarity, count));
        }
    }

    best.map(|(rarity, _)| rarity).unwrap_or(Rarity::Unknown)
}

fn tally_area(
    image: &DynamicImage,
    table: &SignatureTable,
    area: BannerArea,
    votes: &mut [usize; Rarity::CLASSIFIABLE.len()],
) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let start_x = scale(area.x0, width);
    let end_x = scale(area.x1, width);
    let start_y = scale(area.y0, height);
    let end_y = scale(area.y1, height);

    let mut y = start_y;
    while y <= end_y {
        let mut x = start_x;
        while x <= end_x {
            let pixel = image.get_pixel(x.min(width - 1), y.min(height - 1));
            let [r, g, b, _] = pixel.0;
            if let Some(rarity) = table.match_pixel(r, g, b) {
                if let Some(idx) = Rarity::CLASSIFIABLE.iter().position(|&c| c == rarity) {
                    votes[idx] += 1;
                }
            }
            x += SAMPLE_STRIDE;
        }
        y += SAMPLE_STRIDE;
    }
}

fn scale(proportion: f32, extent: u32) -> u32 {
    (extent as f32 * proportion).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Full-HD canvas filled with `base`, with the current banner area
    /// painted `banner`.
    fn screenshot(base: [u8; 3], banner: [u8; 3]) -> DynamicImage {
        let (w, h) = (1920u32, 1080u32);
        let mut img = RgbImage::from_pixel(w, h, Rgb(base));
        let x0 = scale(BANNER_CURRENT.x0, w);
        let x1 = scale(BANNER_CURRENT.x1, w);
        let y0 = scale(BANNER_CURRENT.y0, h);
        let y1 = scale(BANNER_CURRENT.y1, h);
        for y in y0..=y1 {
            for x in x0..=x1 {
                img.put_pixel(x, y, Rgb(banner));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    fn table() -> SignatureTable {
        SignatureTable::builtin()
    }

    #[test]
    fn classifies_each_tier_from_banner_color() {
        // Background black so only the banner votes.
        let cases = [
            ([90, 90, 90], Rarity::Common),
            ([82, 200, 135], Rarity::Uncommon),
            ([80, 160, 220], Rarity::Rare),
            ([150, 70, 170], Rarity::Epic),
            ([240, 155, 20], Rarity::Legendary),
        ];
        for (color, expected) in cases {
            let img = screenshot([0, 0, 0], color);
            assert_eq!(classify(&img, &table()), expected, "color {:?}", color);
        }
    }

    #[test]
    fn unmatched_image_is_unknown() {
        let img = screenshot([0, 0, 0], [1, 2, 3]);
        assert_eq!(classify(&img, &table()), Rarity::Unknown);
    }

    #[test]
    fn classification_is_deterministic() {
        let img = screenshot([0, 0, 0], [150, 70, 170]);
        let first = classify(&img, &table());
        let second = classify(&img, &table());
        assert_eq!(first, second);
        assert_eq!(first, Rarity::Epic);
    }

    #[test]
    fn gray_tolerance_disambiguates_common() {
        // In Common's gray cube but visibly tinted: must not vote Common.
        let img = screenshot([0, 0, 0], [80, 100, 95]);
        assert_eq!(classify(&img, &table()), Rarity::Unknown);
    }

    #[test]
    fn majority_wins_over_minority_area() {
        // Conflicting areas: the legacy banner contributes more samples at
        // FHD than the current one, so its tier carries the vote.
        let (w, h) = (1920u32, 1080u32);
        let mut img = RgbImage::from_pixel(w, h, Rgb([0, 0, 0]));
        for (area, color) in [
            (BANNER_LEGACY, [80u8, 160, 220]),
            (BANNER_CURRENT, [150u8, 70, 170]),
        ] {
            let x0 = scale(area.x0, w);
            let x1 = scale(area.x1, w);
            let y0 = scale(area.y0, h);
            let y1 = scale(area.y1, h);
            for y in y0..=y1 {
                for x in x0..=x1 {
                    img.put_pixel(x, y, Rgb(color));
                }
            }
        }
        let img = DynamicImage::ImageRgb8(img);
        assert_eq!(classify(&img, &table()), Rarity::Rare);
    }

    #[test]
    fn small_images_scale_proportionally() {
        // 640x360: same proportions, different absolute pixels.
        let (w, h) = (640u32, 360u32);
        let mut img = RgbImage::from_pixel(w, h, Rgb([0, 0, 0]));
        let x0 = scale(BANNER_CURRENT.x0, w);
        let x1 = scale(BANNER_CURRENT.x1, w);
        let y0 = scale(BANNER_CURRENT.y0, h);
        let y1 = scale(BANNER_CURRENT.y1, h);
        for y in y0..=y1 {
            for x in x0..=x1 {
                img.put_pixel(x.min(w - 1), y.min(h - 1), Rgb([240, 155, 20]));
            }
        }
        let img = DynamicImage::ImageRgb8(img);
        assert_eq!(classify(&img, &table()), Rarity::Legendary);
    }
}
