//! Deciding whether a geometry change needs new memory.

use crate::geometry::BufferGeometry;

/// Returns true when a buffer of geometry `current` must be reallocated to
/// satisfy `required`.
///
/// A fully set `updated` geometry means an update has already been applied, so
/// the answer is `false` whatever `current` and `required` say. Otherwise any
/// difference in width, height or format between `current` and `required`
/// requires a new buffer.
pub fn needs_reallocation(
    current: BufferGeometry,
    required: BufferGeometry,
    updated: BufferGeometry,
) -> bool {
    if updated.is_set() {
        return false;
    }
    current != required
}
