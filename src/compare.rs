//! Perceptual frame comparison.
//!
//! Compares two equally-sized RGBA buffers and counts the pixels that
//! differ perceptually, ignoring anti-aliasing artifacts. The distance
//! metric works in YIQ space so luma differences weigh more than
//! chroma; partial alpha is un-premultiplied by blending toward white
//! before conversion.
//!
//! The sensitivity, the maximum YIQ distance, and the duplicate cutoff
//! are fixed contract constants shared with previously exported
//! archives, not tunables.

/// Fixed comparison sensitivity.
pub const SENSITIVITY: f64 = 0.1;

/// Maximum possible squared YIQ distance between two pixels.
pub const MAX_YIQ_DISTANCE_SQ: f64 = 35215.0;

/// Two frames with fewer differing pixels than this are duplicates.
pub const DUPLICATE_CUTOFF: u32 = 10;

/// Whether a diff count from [`diff_count`] marks the pair as
/// visually-duplicate frames.
pub fn counts_as_duplicate(diff: u32) -> bool {
    diff < DUPLICATE_CUTOFF
}

/// Count the substantive differing pixels between two RGBA buffers.
///
/// Both buffers must be `width * height * 4` bytes; mismatched sizes
/// are a contract violation. Bitwise-identical buffers short-circuit
/// to 0. A pixel whose perceptual distance exceeds the fixed threshold
/// is still excluded when it classifies as anti-aliasing on either
/// image.
pub fn diff_count(a: &[u8], b: &[u8], width: u32, height: u32) -> u32 {
    let expected = (width as usize) * (height as usize) * 4;
    assert_eq!(a.len(), expected, "buffer A does not match {}x{}", width, height);
    assert_eq!(b.len(), expected, "buffer B does not match {}x{}", width, height);

    if a == b {
        return 0;
    }

    let max_delta = SENSITIVITY * SENSITIVITY * MAX_YIQ_DISTANCE_SQ;
    let mut diff = 0u32;

    for y in 0..height {
        for x in 0..width {
            let pos = ((y * width + x) as usize) * 4;
            let delta = color_delta(a, b, pos, pos, false);
            if delta.abs() > max_delta
                && !(antialiased(a, x, y, width, height, b)
                    || antialiased(b, x, y, width, height, a))
            {
                diff += 1;
            }
        }
    }

    diff
}

fn rgba_at(img: &[u8], pos: usize) -> (f64, f64, f64, f64) {
    (
        img[pos] as f64,
        img[pos + 1] as f64,
        img[pos + 2] as f64,
        img[pos + 3] as f64,
    )
}

/// Blend a channel toward white by its alpha.
fn blend(channel: f64, alpha: f64) -> f64 {
    255.0 + (channel - 255.0) * alpha
}

fn rgb2y(r: f64, g: f64, b: f64) -> f64 {
    r * 0.29889531 + g * 0.58662247 + b * 0.11448223
}

fn rgb2i(r: f64, g: f64, b: f64) -> f64 {
    r * 0.59597799 - g * 0.2741761 - b * 0.32180189
}

fn rgb2q(r: f64, g: f64, b: f64) -> f64 {
    r * 0.21147017 - g * 0.52261711 + b * 0.31114694
}

/// Perceptual distance between a pixel of `img1` and a pixel of
/// `img2`. Negative when the first pixel is lighter; the sign is
/// informational only. With `y_only`, returns the plain luma delta.
fn color_delta(img1: &[u8], img2: &[u8], pos1: usize, pos2: usize, y_only: bool) -> f64 {
    let (mut r1, mut g1, mut b1, a1) = rgba_at(img1, pos1);
    let (mut r2, mut g2, mut b2, a2) = rgba_at(img2, pos2);

    if a1 == a2 && r1 == r2 && g1 == g2 && b1 == b2 {
        return 0.0;
    }

    if a1 < 255.0 {
        let alpha = a1 / 255.0;
        r1 = blend(r1, alpha);
        g1 = blend(g1, alpha);
        b1 = blend(b1, alpha);
    }
    if a2 < 255.0 {
        let alpha = a2 / 255.0;
        r2 = blend(r2, alpha);
        g2 = blend(g2, alpha);
        b2 = blend(b2, alpha);
    }

    let y1 = rgb2y(r1, g1, b1);
    let y2 = rgb2y(r2, g2, b2);
    let y = y1 - y2;

    if y_only {
        return y;
    }

    let i = rgb2i(r1, g1, b1) - rgb2i(r2, g2, b2);
    let q = rgb2q(r1, g1, b1) - rgb2q(r2, g2, b2);

    let delta = 0.5053 * y * y + 0.299 * i * i + 0.1957 * q * q;

    if y1 > y2 {
        -delta
    } else {
        delta
    }
}

/// Anti-aliasing classification for the pixel at (x, y) of `img`.
///
/// The pixel is maybe-AA when it has at most two exactly-equal
/// neighbors and both a strictly darker and a strictly brighter
/// neighbor (luma only). It is confirmed AA when the single darkest or
/// single brightest neighbor sits in a locally-flat region (three or
/// more exactly-equal siblings) in *both* images.
fn antialiased(img: &[u8], x: u32, y: u32, width: u32, height: u32, other: &[u8]) -> bool {
    let x0 = x.saturating_sub(1);
    let y0 = y.saturating_sub(1);
    let x1 = (x + 1).min(width - 1);
    let y1 = (y + 1).min(height - 1);
    let pos = ((y * width + x) as usize) * 4;

    let mut zeroes = if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
        1u32
    } else {
        0u32
    };
    let mut min = 0.0f64;
    let mut max = 0.0f64;
    let mut min_at = (0u32, 0u32);
    let mut max_at = (0u32, 0u32);

    for ny in y0..=y1 {
        for nx in x0..=x1 {
            if nx == x && ny == y {
                continue;
            }

            let delta = color_delta(img, img, pos, ((ny * width + nx) as usize) * 4, true);

            if delta == 0.0 {
                zeroes += 1;
                if zeroes > 2 {
                    return false;
                }
            } else if delta < min {
                min = delta;
                min_at = (nx, ny);
            } else if delta > max {
                max = delta;
                max_at = (nx, ny);
            }
        }
    }

    // No darker or no brighter neighbor: not an edge.
    if min == 0.0 || max == 0.0 {
        return false;
    }

    (has_many_siblings(img, min_at.0, min_at.1, width, height)
        && has_many_siblings(other, min_at.0, min_at.1, width, height))
        || (has_many_siblings(img, max_at.0, max_at.1, width, height)
            && has_many_siblings(other, max_at.0, max_at.1, width, height))
}

/// Whether the pixel at (x, y) has three or more exactly-equal
/// neighbors, i.e. sits in a locally-flat region.
fn has_many_siblings(img: &[u8], x: u32, y: u32, width: u32, height: u32) -> bool {
    let x0 = x.saturating_sub(1);
    let y0 = y.saturating_sub(1);
    let x1 = (x + 1).min(width - 1);
    let y1 = (y + 1).min(height - 1);
    let pos = ((y * width + x) as usize) * 4;

    let mut zeroes = if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
        1u32
    } else {
        0u32
    };

    for ny in y0..=y1 {
        for nx in x0..=x1 {
            if nx == x && ny == y {
                continue;
            }
            let npos = ((ny * width + nx) as usize) * 4;
            if img[pos..pos + 4] == img[npos..npos + 4] {
                zeroes += 1;
            }
            if zeroes > 2 {
                return true;
            }
        }
    }

    false
}
