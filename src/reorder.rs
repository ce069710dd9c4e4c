//! Manual reordering of list entries.
//!
//! Moving an entry changes only its position. Scores follow on the next
//! ranking pass through positional importance.

/// Swap the entry at `index` with the one `offset` places away.
///
/// The target is clamped to the list bounds, so moving the first entry up or
/// the last entry down does nothing. Returns whether the list changed.
pub fn reorder<T>(items: &mut [T], index: usize, offset: isize) -> bool {
    let len = items.len();
    if index >= len {
        return false;
    }
    let target = index.saturating_add_signed(offset).min(len - 1);
    if target == index {
        return false;
    }
    items.swap(index, target);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_moves() {
        let mut v = vec!['a', 'b', 'c'];
        assert!(reorder(&mut v, 1, -1));
        assert_eq!(v, vec!['b', 'a', 'c']);
        assert!(reorder(&mut v, 1, 1));
        assert_eq!(v, vec!['b', 'c', 'a']);
    }

    #[test]
    fn test_boundaries_are_noops() {
        let mut v = vec![1, 2, 3];
        assert!(!reorder(&mut v, 0, -1));
        assert!(!reorder(&mut v, 2, 1));
        assert_eq!(v, vec![1, 2, 3]);
    }

    #[test]
    fn test_large_offsets_clamp() {
        let mut v = vec![1, 2, 3, 4];
        assert!(reorder(&mut v, 1, 10));
        assert_eq!(v, vec![1, 4, 3, 2]);
        assert!(reorder(&mut v, 2, -10));
        assert_eq!(v, vec![3, 4, 1, 2]);
    }

    #[test]
    fn test_empty_and_out_of_range() {
        let mut empty: Vec<u8> = Vec::new();
        assert!(!reorder(&mut empty, 0, 1));
        let mut v = vec![1];
        assert!(!reorder(&mut v, 0, 1));
        assert!(!reorder(&mut v, 5, -1));
        assert_eq!(v, vec![1]);
    }
}
