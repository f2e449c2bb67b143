//! Growing binary-tree rectangle packer.
//!
//! Maintains a binary tree of free/occupied regions rooted at a
//! zero-sized node. Each placed rectangle splits a free leaf into an
//! occupied node plus a right strip and a bottom strip; when nothing
//! fits, the root grows along whichever axis keeps the bounding box
//! closest to square, bounded by the page maximum. Rectangles that can
//! never be placed are returned, not errors: callers pack the residual
//! again for further pages.

use crate::MAX_PAGE_DIMENSION;

/// Page bound for a packing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackOptions {
    /// Maximum page width in pixels.
    pub max_width: u32,
    /// Maximum page height in pixels.
    pub max_height: u32,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            max_width: MAX_PAGE_DIMENSION,
            max_height: MAX_PAGE_DIMENSION,
        }
    }
}

/// One rectangle to pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectSpec<K> {
    /// Caller-side identity of the rectangle.
    pub key: K,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl<K> RectSpec<K> {
    /// Create a rectangle spec.
    pub fn new(key: K, width: u32, height: u32) -> Self {
        Self { key, width, height }
    }
}

/// A placed rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement<K> {
    /// Caller-side identity of the rectangle.
    pub key: K,
    /// Left edge on the page.
    pub x: u32,
    /// Top edge on the page.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Result of one packing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackResult<K> {
    /// Placed rectangles.
    pub placements: Vec<Placement<K>>,
    /// Rectangles that did not fit this pass, in sorted order.
    pub unplaced: Vec<RectSpec<K>>,
    /// Tightest bounding width over placed rectangles.
    pub page_width: u32,
    /// Tightest bounding height over placed rectangles.
    pub page_height: u32,
}

struct Node {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    used: bool,
    right: Option<Box<Node>>,
    down: Option<Box<Node>>,
}

impl Node {
    fn leaf(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            used: false,
            right: None,
            down: None,
        }
    }

    /// Find a free leaf at least `w` x `h`.
    fn find(&mut self, w: u32, h: u32) -> Option<&mut Node> {
        if self.used {
            if let Some(found) = self.right.as_deref_mut().and_then(|n| n.find(w, h)) {
                return Some(found);
            }
            self.down.as_deref_mut().and_then(|n| n.find(w, h))
        } else if w <= self.w && h <= self.h {
            Some(self)
        } else {
            None
        }
    }

    /// Occupy this free leaf with an exact-size rectangle, leaving a
    /// right strip and a bottom strip as free children.
    fn split(&mut self, w: u32, h: u32) {
        self.used = true;
        self.down = Some(Box::new(Node::leaf(self.x, self.y + h, self.w, self.h - h)));
        self.right = Some(Box::new(Node::leaf(self.x + w, self.y, self.w - w, h)));
    }
}

struct Packer {
    root: Node,
    max_width: u32,
    max_height: u32,
}

impl Packer {
    fn new(options: PackOptions) -> Self {
        Self {
            root: Node::leaf(0, 0, 0, 0),
            max_width: options.max_width,
            max_height: options.max_height,
        }
    }

    /// Place one rectangle, returning its page offset.
    fn place(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w > self.max_width || h > self.max_height {
            return None;
        }

        // Bootstrap: the zero-sized root adopts the first rectangle.
        if self.root.w == 0 && self.root.h == 0 {
            self.root = Node::leaf(0, 0, w, h);
        }

        if let Some(node) = self.root.find(w, h) {
            let at = (node.x, node.y);
            node.split(w, h);
            return Some(at);
        }

        if !self.grow(w, h) {
            return None;
        }

        let node = self.root.find(w, h)?;
        let at = (node.x, node.y);
        node.split(w, h);
        Some(at)
    }

    /// Extend the root along whichever axis keeps the bounding box
    /// closest to square, within the page bound.
    fn grow(&mut self, w: u32, h: u32) -> bool {
        let can_down = w <= self.root.w && self.root.h + h <= self.max_height;
        let can_right = h <= self.root.h && self.root.w + w <= self.max_width;

        let should_right = can_right && self.root.h >= self.root.w + w;
        let should_down = can_down && self.root.w >= self.root.h + h;

        if should_right {
            self.grow_right(w);
        } else if should_down {
            self.grow_down(h);
        } else if can_right {
            self.grow_right(w);
        } else if can_down {
            self.grow_down(h);
        } else {
            return false;
        }
        true
    }

    fn grow_right(&mut self, w: u32) {
        let old_w = self.root.w;
        let old_h = self.root.h;
        let old = std::mem::replace(&mut self.root, Node::leaf(0, 0, 0, 0));
        self.root = Node {
            x: 0,
            y: 0,
            w: old_w + w,
            h: old_h,
            used: true,
            right: Some(Box::new(Node::leaf(old_w, 0, w, old_h))),
            down: Some(Box::new(old)),
        };
    }

    fn grow_down(&mut self, h: u32) {
        let old_w = self.root.w;
        let old_h = self.root.h;
        let old = std::mem::replace(&mut self.root, Node::leaf(0, 0, 0, 0));
        self.root = Node {
            x: 0,
            y: 0,
            w: old_w,
            h: old_h + h,
            used: true,
            right: Some(Box::new(old)),
            down: Some(Box::new(Node::leaf(0, old_h, old_w, h))),
        };
    }
}

/// Pack rectangles into one page.
///
/// Sorts ascending along the axis dominating the aggregate footprint
/// (a deterministic heuristic, not a correctness requirement), then
/// find-or-grow places each rectangle. Rectangles that do not fit land
/// in `unplaced`; an empty input yields an empty placement set and a
/// 0x0 page.
pub fn pack<K: Copy>(rects: &[RectSpec<K>], options: PackOptions) -> PackResult<K> {
    let mut sorted: Vec<RectSpec<K>> = rects.to_vec();
    let footprint_w: u64 = rects.iter().map(|r| r.width as u64).sum();
    let footprint_h: u64 = rects.iter().map(|r| r.height as u64).sum();
    if footprint_w > footprint_h {
        sorted.sort_by_key(|r| r.width);
    } else {
        sorted.sort_by_key(|r| r.height);
    }

    let mut packer = Packer::new(options);
    let mut placements = Vec::with_capacity(sorted.len());
    let mut unplaced = Vec::new();

    for rect in sorted {
        match packer.place(rect.width, rect.height) {
            Some((x, y)) => placements.push(Placement {
                key: rect.key,
                x,
                y,
                width: rect.width,
                height: rect.height,
            }),
            None => unplaced.push(rect),
        }
    }

    let page_width = placements.iter().map(|p| p.x + p.width).max().unwrap_or(0);
    let page_height = placements.iter().map(|p| p.y + p.height).max().unwrap_or(0);

    PackResult {
        placements,
        unplaced,
        page_width,
        page_height,
    }
}
