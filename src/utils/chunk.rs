//! Fixed-size batching used by the advisory aggregator's OSV queries.

/// Split `items` into chunks of at most `size` elements, preserving order.
/// A `size` of zero yields a single chunk containing all items.
pub fn chunked<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    if size == 0 {
        return vec![items.to_vec()];
    }
    items.chunks(size).map(|c| c.to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_into_even_chunks() {
        let items = vec![1, 2, 3, 4, 5, 6];
        let chunks = chunked(&items, 2);
        assert_eq!(chunks, vec![vec![1, 2], vec![3, 4], vec![5, 6]]);
    }

    #[test]
    fn handles_remainder() {
        let items = vec![1, 2, 3, 4, 5];
        let chunks = chunked(&items, 2);
        assert_eq!(chunks, vec![vec![1, 2], vec![3, 4], vec![5]]);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let items: Vec<i32> = vec![];
        let chunks = chunked(&items, 3);
        assert!(chunks.is_empty());
    }
}
