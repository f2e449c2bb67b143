//! Multi-page atlas driver.
//!
//! Packs and composites the residual unplaced set until every
//! rectangle is placed or proven unplaceable, then names the resulting
//! pages.

use image::RgbaImage;
use std::collections::BTreeMap;

use super::compositor::{compose_page, AtlasEntry};
use super::packer::{pack, PackOptions, RectSpec};

/// One named atlas page.
pub struct AtlasPage<K> {
    /// File name of the page inside its archive.
    pub name: String,
    /// The composed raster.
    pub image: RgbaImage,
    /// Where each source landed.
    pub entries: Vec<AtlasEntry<K>>,
}

/// Result of a full multi-page run.
pub struct PagedAtlas<K> {
    /// Composed pages, in packing order.
    pub pages: Vec<AtlasPage<K>>,
    /// Rectangles that exceed the page bound and can never be placed.
    pub oversized: Vec<RectSpec<K>>,
}

/// Name for page `index` of `total`: `{base}.png` for a single page,
/// `{base}-pack-N.png` (1-indexed) otherwise.
pub fn page_file_name(base: &str, index: usize, total: usize) -> String {
    if total == 1 {
        format!("{base}.png")
    } else {
        format!("{base}-pack-{}.png", index + 1)
    }
}

/// Pack and composite until the residual set is empty.
///
/// Each pass packs the rectangles the previous pass left unplaced. A
/// pass that places nothing means every remaining rectangle exceeds
/// the page bound; those are returned as `oversized` instead of
/// looping forever. Pages are named through `name_page(index, total)`.
pub fn compose_pages<K, N>(
    rects: Vec<RectSpec<K>>,
    sources: &BTreeMap<K, RgbaImage>,
    options: PackOptions,
    mut name_page: N,
) -> PagedAtlas<K>
where
    K: Copy + Ord,
    N: FnMut(usize, usize) -> String,
{
    let mut residual = rects;
    let mut composed: Vec<(RgbaImage, Vec<AtlasEntry<K>>)> = Vec::new();
    let mut oversized = Vec::new();

    while !residual.is_empty() {
        let result = pack(&residual, options);
        if result.placements.is_empty() {
            oversized = result.unplaced;
            break;
        }
        composed.push(compose_page(&result, sources));
        residual = result.unplaced;
    }

    let total = composed.len();
    let pages = composed
        .into_iter()
        .enumerate()
        .map(|(index, (image, entries))| AtlasPage {
            name: name_page(index, total),
            image,
            entries,
        })
        .collect();

    PagedAtlas { pages, oversized }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sources_for(rects: &[RectSpec<u32>]) -> BTreeMap<u32, RgbaImage> {
        rects
            .iter()
            .map(|r| {
                (
                    r.key,
                    RgbaImage::from_pixel(r.width, r.height, Rgba([r.key as u8, 0, 0, 255])),
                )
            })
            .collect()
    }

    #[test]
    fn single_page_uses_plain_name() {
        let rects = vec![RectSpec::new(1u32, 8, 8), RectSpec::new(2u32, 8, 8)];
        let sources = sources_for(&rects);
        let atlas = compose_pages(rects, &sources, PackOptions::default(), |i, total| {
            page_file_name("texture", i, total)
        });
        assert_eq!(atlas.pages.len(), 1);
        assert_eq!(atlas.pages[0].name, "texture.png");
        assert!(atlas.oversized.is_empty());
    }

    #[test]
    fn residual_spills_to_numbered_pages() {
        // Two rects, each filling a page on its own.
        let rects = vec![RectSpec::new(1u32, 60, 60), RectSpec::new(2u32, 60, 60)];
        let sources = sources_for(&rects);
        let options = PackOptions {
            max_width: 64,
            max_height: 64,
        };
        let atlas = compose_pages(rects, &sources, options, |i, total| {
            page_file_name("texture", i, total)
        });
        assert_eq!(atlas.pages.len(), 2);
        assert_eq!(atlas.pages[0].name, "texture-pack-1.png");
        assert_eq!(atlas.pages[1].name, "texture-pack-2.png");
        assert_eq!(atlas.pages[0].entries.len(), 1);
        assert_eq!(atlas.pages[1].entries.len(), 1);
    }

    #[test]
    fn oversized_rects_terminate_the_loop() {
        let rects = vec![RectSpec::new(1u32, 8, 8), RectSpec::new(2u32, 100, 100)];
        let sources = sources_for(&rects);
        let options = PackOptions {
            max_width: 64,
            max_height: 64,
        };
        let atlas = compose_pages(rects, &sources, options, |i, total| {
            page_file_name("texture", i, total)
        });
        assert_eq!(atlas.pages.len(), 1);
        assert_eq!(atlas.oversized.len(), 1);
        assert_eq!(atlas.oversized[0].key, 2);
    }
}
