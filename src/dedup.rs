//! Duplicate frame elimination.
//!
//! Finds visually-duplicate raster frames in a candidate set using the
//! perceptual comparator and removes the duplicates from the
//! repository in one batch. Comparison is O(n²) over the candidate
//! set, which stays acceptable for bounded interactive collections,
//! and runs sequentially so results are reproducible across runs.

use image::{ImageFormat, RgbaImage};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::compare::{counts_as_duplicate, diff_count};
use crate::store::{ProjectRepo, RepoError, Table};
use crate::types::{Frame, Id};

/// A frame row with its decoded pixel buffer.
pub struct FrameImage {
    /// The frame's repository id.
    pub id: Id<Frame>,
    /// Decoded RGBA pixels.
    pub image: RgbaImage,
}

impl FrameImage {
    /// Decode a frame row's PNG bytes.
    pub fn decode(frame: &Frame) -> Result<Self, image::ImageError> {
        let image = image::load_from_memory_with_format(&frame.data, ImageFormat::Png)?.to_rgba8();
        Ok(Self {
            id: frame.id,
            image,
        })
    }
}

/// Result of one elimination pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupOutcome {
    /// Candidates that survived, in input order.
    pub kept: Vec<Id<Frame>>,
    /// Removed duplicate → surviving canonical frame.
    pub merged: BTreeMap<Id<Frame>, Id<Frame>>,
}

impl DedupOutcome {
    /// Where a frame reference should point after elimination.
    pub fn canonical(&self, id: Id<Frame>) -> Id<Frame> {
        self.merged.get(&id).copied().unwrap_or(id)
    }
}

/// Merges visually-duplicate frames and removes them from the store.
pub struct DuplicateEliminator<R: ProjectRepo> {
    repo: Arc<R>,
}

impl<R: ProjectRepo> DuplicateEliminator<R> {
    /// Create an eliminator over a repository.
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Compare every not-yet-merged candidate against every later
    /// not-yet-merged candidate of equal dimensions; matches merge the
    /// later one into the earlier. Merged frames are removed from the
    /// repository in one batch at the end; cascading cleanup of rows
    /// that referenced a removed frame is the repository's own
    /// responsibility.
    pub async fn eliminate(&self, candidates: &[FrameImage]) -> Result<DedupOutcome, RepoError> {
        let mut merged: BTreeMap<Id<Frame>, Id<Frame>> = BTreeMap::new();

        for (i, canonical) in candidates.iter().enumerate() {
            if merged.contains_key(&canonical.id) {
                continue;
            }
            for later in &candidates[i + 1..] {
                if merged.contains_key(&later.id) {
                    continue;
                }
                if canonical.image.dimensions() != later.image.dimensions() {
                    continue;
                }
                let (width, height) = canonical.image.dimensions();
                let diff = diff_count(
                    canonical.image.as_raw(),
                    later.image.as_raw(),
                    width,
                    height,
                );
                if counts_as_duplicate(diff) {
                    tracing::debug!(duplicate = %later.id, canonical = %canonical.id, "merging frame");
                    merged.insert(later.id, canonical.id);
                }
            }
        }

        for duplicate in merged.keys() {
            self.repo.frames().remove(*duplicate).await?;
        }

        let kept = candidates
            .iter()
            .map(|c| c.id)
            .filter(|id| !merged.contains_key(id))
            .collect();

        Ok(DedupOutcome { kept, merged })
    }
}
