use std::num::NonZeroUsize;

/// `users/lookup` accepts at most this many ids per request.
pub const LOOKUP_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(size) => size,
    None => unreachable!(),
};

/// Split `items` into consecutive groups of at most `size` elements.
/// The last group holds the remainder; an empty slice yields no groups.
pub fn batches<T>(items: &[T], size: NonZeroUsize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.get())
}
