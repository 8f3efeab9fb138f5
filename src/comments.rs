//! Comment thread reconstruction.
//!
//! The export lists comments flat, each pointing at its parent (`0` for a
//! top-level comment). [`build_tree`] nests replies under their parents while
//! keeping the original order among siblings.

use crate::model::Comment;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CommentError {
    #[error("Comment {comment_id} is its own ancestor")]
    CyclicCommentGraph { comment_id: i64 },
}

/// Build the forest of comments hanging off `parent_id` (`0` for the roots).
///
/// Comments whose parent is missing are unreachable and dropped. Only the
/// reachable part of the graph is walked, so a loop can only be hit through
/// duplicate ids; it is reported instead of recursing forever.
pub fn build_tree(flat: &[Comment], parent_id: i64) -> Result<Vec<Comment>, CommentError> {
    let mut path = HashSet::new();
    build_level(flat, parent_id, &mut path)
}

fn build_level(
    flat: &[Comment],
    parent_id: i64,
    path: &mut HashSet<i64>,
) -> Result<Vec<Comment>, CommentError> {
    let mut level = Vec::new();
    for c in flat.iter().filter(|c| c.parent_id == parent_id) {
        if !path.insert(c.id) {
            return Err(CommentError::CyclicCommentGraph { comment_id: c.id });
        }
        let mut node = c.clone();
        node.children = build_level(flat, c.id, path)?;
        path.remove(&c.id);
        level.push(node);
    }
    Ok(level)
}

/// Total number of comments in a forest.
pub fn count(forest: &[Comment]) -> usize {
    forest.iter().map(|c| 1 + count(&c.children)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::comment;

    fn shape(forest: &[Comment]) -> Vec<(i64, Vec<i64>)> {
        forest
            .iter()
            .map(|c| (c.id, c.children.iter().map(|k| k.id).collect()))
            .collect()
    }

    #[test]
    fn nested_threads() {
        let flat = vec![comment(1, 0), comment(2, 1), comment(3, 0), comment(4, 2)];
        let tree = build_tree(&flat, 0).unwrap();

        assert_eq!(shape(&tree), vec![(1, vec![2]), (3, vec![])]);
        let two = &tree[0].children[0];
        assert_eq!(two.id, 2);
        assert_eq!(shape(&two.children), vec![(4, vec![])]);
        assert!(two.children[0].children.is_empty());
        assert_eq!(count(&tree), 4);
    }

    #[test]
    fn sibling_order_is_preserved() {
        let flat = vec![comment(5, 0), comment(9, 5), comment(2, 0), comment(7, 5)];
        let tree = build_tree(&flat, 0).unwrap();
        assert_eq!(shape(&tree), vec![(5, vec![9, 7]), (2, vec![])]);
    }

    #[test]
    fn orphans_are_dropped() {
        let flat = vec![comment(1, 0), comment(2, 99)];
        let tree = build_tree(&flat, 0).unwrap();
        assert_eq!(count(&tree), 1);
    }

    #[test]
    fn unreachable_loop_is_ignored() {
        let flat = vec![comment(1, 0), comment(2, 3), comment(3, 2)];
        let tree = build_tree(&flat, 0).unwrap();
        assert_eq!(shape(&tree), vec![(1, vec![])]);
    }

    #[test]
    fn duplicate_id_loop_is_reported() {
        let flat = vec![comment(1, 0), comment(2, 1), comment(1, 2)];
        assert_eq!(
            build_tree(&flat, 0).unwrap_err(),
            CommentError::CyclicCommentGraph { comment_id: 1 }
        );
    }

    #[test]
    fn empty_input() {
        assert!(build_tree(&[], 0).unwrap().is_empty());
    }
}
