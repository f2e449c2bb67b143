//! Atlas page composition.
//!
//! Rasterizes a packing result onto a page-sized canvas. Source pixels
//! are copied verbatim at their assigned offsets, never resampled.

use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::packer::PackResult;

/// A rectangle on an atlas page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtlasRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

/// One source image's location on an atlas page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtlasEntry<K> {
    /// Identity of the source image.
    pub source: K,
    /// Where its pixels landed.
    pub rect: AtlasRect,
}

/// Rasterize one packing result.
///
/// Allocates a canvas of the result's page dimensions and blits every
/// placed source at its offset. Placements whose source is absent from
/// `sources` are left blank and omitted from the entry list.
pub fn compose_page<K: Copy + Ord>(
    result: &PackResult<K>,
    sources: &BTreeMap<K, RgbaImage>,
) -> (RgbaImage, Vec<AtlasEntry<K>>) {
    let mut canvas = RgbaImage::new(result.page_width, result.page_height);
    let mut entries = Vec::with_capacity(result.placements.len());

    for placement in &result.placements {
        let Some(source) = sources.get(&placement.key) else {
            continue;
        };
        imageops::replace(&mut canvas, source, placement.x as i64, placement.y as i64);
        entries.push(AtlasEntry {
            source: placement.key,
            rect: AtlasRect {
                x: placement.x,
                y: placement.y,
                width: placement.width,
                height: placement.height,
            },
        });
    }

    (canvas, entries)
}
