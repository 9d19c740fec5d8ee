//! The shrink iterator algebra: lazy, finite sequences of smaller candidates.
//!
//! Ordering matters throughout: earlier candidates are more aggressive
//! shrinks, and the search commits to the first candidate that still fails.

/// A lazy, finite sequence of shrink candidates.
pub type Shrinks<T> = Box<dyn Iterator<Item = T>>;

/// The empty candidate sequence.
pub fn nothing<T: 'static>() -> Shrinks<T> {
    Box::new(std::iter::empty())
}

/// Yield `values` in order, once.
pub fn constant<T: 'static>(values: Vec<T>) -> Shrinks<T> {
    Box::new(values.into_iter())
}

/// Apply `f` to each candidate.
pub fn map<T, U, F>(candidates: Shrinks<T>, f: F) -> Shrinks<U>
where
    T: 'static,
    U: 'static,
    F: FnMut(T) -> U + 'static,
{
    Box::new(candidates.map(f))
}

/// All of `first`, then all of `second`.
pub fn sequentially<T: 'static>(first: Shrinks<T>, second: Shrinks<T>) -> Shrinks<T> {
    Box::new(first.chain(second))
}

/// For each position in order, yield copies of `elements` with that position
/// replaced by each of its candidates from `per`. Position `i` is exhausted
/// before position `i + 1` is considered.
pub fn each_element<T, F>(elements: Vec<T>, per: F) -> Shrinks<Vec<T>>
where
    T: Clone + 'static,
    F: Fn(&T) -> Shrinks<T> + 'static,
{
    let len = elements.len();
    Box::new((0..len).flat_map(move |index| {
        let whole = elements.clone();
        per(&elements[index]).map(move |candidate| {
            let mut replaced = whole.clone();
            replaced[index] = candidate;
            replaced
        })
    }))
}

/// Progressively smaller copies of `elements` with one contiguous chunk
/// removed: the largest removals come first, and every single-element
/// removal is eventually yielded.
pub fn remove_chunks<T: Clone + 'static>(elements: Vec<T>) -> Shrinks<Vec<T>> {
    let len = elements.len();
    Box::new((1..=len).rev().flat_map(move |chunk| {
        let elements = elements.clone();
        (0..=len - chunk).map(move |start| {
            let mut kept = Vec::with_capacity(len - chunk);
            kept.extend_from_slice(&elements[..start]);
            kept.extend_from_slice(&elements[start + chunk..]);
            kept
        })
    }))
}
