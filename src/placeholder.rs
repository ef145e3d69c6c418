//! Endless, shuffled rotation of decorative placeholder images.
//!
//! Cards show a placeholder while their thumbnail lazy-loads. The images are
//! shuffled once and then cycled forever; at every cycle boundary the first
//! image is rotated to the back if it would otherwise repeat the image that
//! was just shown.

use rand::Rng;
use rand::seq::SliceRandom;

/// Images used when the site configuration does not name its own. The files
/// themselves are supplied alongside the generated site, not by these tools.
pub const DEFAULT_PLACEHOLDERS: [&str; 5] = [
    "/assets/placeholder_closewink.webp",
    "/assets/placeholder_smile.webp",
    "/assets/placeholder_surprise.webp",
    "/assets/placeholder_upturned.webp",
    "/assets/placeholder_wink.webp",
];

/// Single-threaded iterator over placeholder image paths. Never ends unless
/// the image set is empty.
#[derive(Debug, Clone)]
pub struct PlaceholderSelector {
    order: Vec<String>,
    cursor: usize,
    last: Option<String>,
}

impl PlaceholderSelector {
    /// Shuffles `images` with the thread-local generator.
    pub fn new(images: Vec<String>) -> Self {
        Self::with_rng(images, &mut rand::rng())
    }

    /// Shuffles `images` with the given generator. The boundary check starts
    /// out comparing against the last image of the unshuffled list.
    pub fn with_rng<R: Rng + ?Sized>(images: Vec<String>, rng: &mut R) -> Self {
        let last = images.last().cloned();
        let mut order = images;
        order.shuffle(rng);
        Self {
            order,
            cursor: 0,
            last,
        }
    }

    pub fn defaults() -> Self {
        Self::new(DEFAULT_PLACEHOLDERS.iter().map(|s| s.to_string()).collect())
    }

    /// Current working order; only changes by single rotations.
    pub fn order(&self) -> &[String] {
        &self.order
    }
}

impl Iterator for PlaceholderSelector {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.order.is_empty() {
            return None;
        }
        if self.cursor == 0 && self.last.as_deref() == self.order.first().map(String::as_str) {
            self.order.rotate_left(1);
        }

        let item = self.order[self.cursor].clone();
        self.cursor += 1;
        if self.cursor == self.order.len() {
            self.cursor = 0;
            self.last = Some(item.clone());
        }
        Some(item)
    }
}
