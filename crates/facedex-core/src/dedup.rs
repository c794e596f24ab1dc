//! Identity keys and duplicate filtering for face captures.

use crate::types::{Face, ImageRef};
use std::collections::HashSet;

/// Drop every face whose image reference was already seen, keeping first-seen order.
///
/// Idempotent: a deduplicated sequence passes through unchanged.
pub fn dedupe_by_image(faces: impl IntoIterator<Item = Face>) -> Vec<Face> {
    let mut seen: HashSet<ImageRef> = HashSet::new();
    faces
        .into_iter()
        .filter(|face| seen.insert(face.image.clone()))
        .collect()
}

/// Whether any face in `faces` is the same capture as `image`.
pub fn contains_image(faces: &[Face], image: &ImageRef) -> bool {
    faces.iter().any(|face| &face.image == image)
}
