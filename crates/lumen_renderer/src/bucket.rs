//! Work decomposition: rectangular buckets of pixels.
//!
//! A per-pixel frame is a grid of 1x1 buckets in row-major order. Larger
//! buckets are ordered centre-out so the middle of the image finishes first.

use crate::config::TaskGranularity;

/// A rectangular region of the image rendered by one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// Top-left corner
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Position in submission order
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Image coordinates covered by the bucket, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> {
        let Bucket {
            x, y, width, height, ..
        } = *self;
        (y..y + height).flat_map(move |py| (x..x + width).map(move |px| (px, py)))
    }
}

pub const DEFAULT_BUCKET_SIZE: u32 = 64;

/// Tiles the image with `bucket_size` squares, clipped at the right and
/// bottom edges, in centre-out order.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let size = bucket_size.max(1);
    let mut buckets = Vec::new();
    for y in (0..height).step_by(size as usize) {
        for x in (0..width).step_by(size as usize) {
            let bucket = Bucket::new(x, y, size.min(width - x), size.min(height - y), 0);
            buckets.push(bucket);
        }
    }

    sort_spiral(&mut buckets, width, height);
    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = i;
    }
    buckets
}

/// Orders buckets by distance from the image centre.
fn sort_spiral(buckets: &mut [Bucket], width: u32, height: u32) {
    let center = (width as f32 / 2.0, height as f32 / 2.0);
    let distance = |b: &Bucket| {
        let dx = b.x as f32 + b.width as f32 / 2.0 - center.0;
        let dy = b.y as f32 + b.height as f32 / 2.0 - center.1;
        dx * dx + dy * dy
    };
    // Stable sort keeps row-major order between equidistant buckets.
    buckets.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
}

/// One 1x1 bucket per pixel, row-major.
pub fn pixel_tasks(width: u32, height: u32) -> Vec<Bucket> {
    (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .enumerate()
        .map(|(i, (x, y))| Bucket::new(x, y, 1, 1, i))
        .collect()
}

/// Splits a frame into tasks according to `granularity`.
pub fn plan_tasks(width: u32, height: u32, granularity: TaskGranularity) -> Vec<Bucket> {
    match granularity {
        TaskGranularity::Pixel => pixel_tasks(width, height),
        TaskGranularity::Bucket { size } => generate_buckets(width, height, size),
    }
}
