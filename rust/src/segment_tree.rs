//! Segment tree whose node values are never stored.
//!
//! The tree has a fixed shape over an inclusive index range. Each node only
//! remembers which leaf in its subtree currently holds the maximum; the
//! values themselves come from a [`ValueSource`] supplied on every call, so
//! a caller whose values shift between passes can re-rank a single path
//! without the tree caching anything stale.
//!
//! Ties between siblings always resolve to the left child.

use std::ops::{Index, RangeInclusive};

use thiserror::Error;

/// Errors raised by [`DynamicSegmentTree`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentTreeError {
    #[error("Index {index} is outside the segment tree range [{lo}, {hi}]")]
    IndexOutOfRange { index: usize, lo: usize, hi: usize },
    #[error("Cannot build a segment tree over the empty range [{lo}, {hi}]")]
    EmptyRange { lo: usize, hi: usize },
}

/// Supplies the value at a leaf index for one build or update pass.
pub trait ValueSource {
    type Value: Ord;
    type Error: From<SegmentTreeError>;

    fn value_at(&mut self, index: usize) -> Result<Self::Value, Self::Error>;
}

/// Handle to a node in the tree's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Clone, Debug)]
pub struct Node {
    lo: usize,
    hi: usize,
    children: Option<(NodeId, NodeId)>,
    /// Leaf in this subtree with the largest value as of the last pass that
    /// touched this node. A leaf points at itself.
    argmax: NodeId,
}

impl Node {
    pub fn interval(&self) -> RangeInclusive<usize> {
        self.lo..=self.hi
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        self.children
    }

    pub fn argmax(&self) -> NodeId {
        self.argmax
    }
}

/// Balanced binary tree over `[lo, hi]` tracking the argmax leaf per subtree.
#[derive(Clone, Debug)]
pub struct DynamicSegmentTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl DynamicSegmentTree {
    /// Build the tree over `[lo, hi]`, ranking every internal node with
    /// `values`.
    pub fn build<S: ValueSource>(lo: usize, hi: usize, values: &mut S) -> Result<Self, S::Error> {
        if lo > hi {
            return Err(SegmentTreeError::EmptyRange { lo, hi }.into());
        }

        let mut tree = Self {
            nodes: Vec::with_capacity(2 * (hi - lo + 1) - 1),
            root: NodeId(0),
        };
        tree.root = tree.build_node(lo, hi, values)?;
        Ok(tree)
    }

    fn build_node<S: ValueSource>(
        &mut self,
        lo: usize,
        hi: usize,
        values: &mut S,
    ) -> Result<NodeId, S::Error> {
        if lo == hi {
            let id = NodeId(self.nodes.len());
            self.nodes.push(Node {
                lo,
                hi,
                children: None,
                argmax: id,
            });
            return Ok(id);
        }

        // Left half gets floor(n / 2) leaves.
        let mid = lo + (hi - lo + 1) / 2 - 1;
        let left = self.build_node(lo, mid, values)?;
        let right = self.build_node(mid + 1, hi, values)?;
        let argmax = self.pick(left, right, values)?;

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            lo,
            hi,
            children: Some((left, right)),
            argmax,
        });
        Ok(id)
    }

    /// Re-rank every node on the path from the root to leaf `index`.
    ///
    /// Only nodes whose interval contains `index` are revisited; other
    /// subtrees keep their argmax. This is sound as long as the caller's
    /// values outside the path changed by at most a uniform shift per
    /// untouched subtree.
    pub fn update<S: ValueSource>(&mut self, index: usize, values: &mut S) -> Result<(), S::Error> {
        self.check(index)?;

        let mut path = Vec::with_capacity(self.depth_hint());
        let mut node = self.root;
        path.push(node);
        while let Some((left, right)) = self.nodes[node.0].children {
            node = if index > self.nodes[left.0].hi {
                right
            } else {
                left
            };
            path.push(node);
        }

        // The leaf needs no work, its value is the value source's business.
        for &id in path.iter().rev().skip(1) {
            if let Some((left, right)) = self.nodes[id.0].children {
                let argmax = self.pick(left, right, values)?;
                self.nodes[id.0].argmax = argmax;
            }
        }
        Ok(())
    }

    /// Locate the leaf for `index`.
    pub fn find_leaf(&self, index: usize) -> Result<NodeId, SegmentTreeError> {
        self.check(index)?;

        let mut node = self.root;
        while let Some((left, right)) = self.nodes[node.0].children {
            node = if self.nodes[left.0].interval().contains(&index) {
                left
            } else {
                right
            };
        }
        Ok(node)
    }

    /// Leaf index currently holding the maximum over the whole range.
    pub fn argmax(&self) -> usize {
        let leaf = self.nodes[self.root.0].argmax;
        self.nodes[leaf.0].lo
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Whole index range covered by the tree.
    pub fn interval(&self) -> RangeInclusive<usize> {
        self.nodes[self.root.0].interval()
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        let root = &self.nodes[self.root.0];
        root.hi - root.lo + 1
    }

    /// Always false: an empty range is rejected by [`DynamicSegmentTree::build`].
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Total number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Compare the two children's current argmax leaves; the left wins ties.
    fn pick<S: ValueSource>(
        &self,
        left: NodeId,
        right: NodeId,
        values: &mut S,
    ) -> Result<NodeId, S::Error> {
        let left_max = self.nodes[left.0].argmax;
        let right_max = self.nodes[right.0].argmax;
        let left_value = values.value_at(self.nodes[left_max.0].lo)?;
        let right_value = values.value_at(self.nodes[right_max.0].lo)?;
        Ok(if right_value > left_value {
            right_max
        } else {
            left_max
        })
    }

    fn check(&self, index: usize) -> Result<(), SegmentTreeError> {
        let root = &self.nodes[self.root.0];
        if !root.interval().contains(&index) {
            return Err(SegmentTreeError::IndexOutOfRange {
                index,
                lo: root.lo,
                hi: root.hi,
            });
        }
        Ok(())
    }

    fn depth_hint(&self) -> usize {
        (usize::BITS - self.len().leading_zeros()) as usize + 1
    }
}

impl Index<NodeId> for DynamicSegmentTree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Values over `1..=n` where only revealed indices are finite.
    struct Revealed {
        values: Vec<i64>,
        revealed: Vec<bool>,
        calls: usize,
    }

    impl Revealed {
        fn new(values: Vec<i64>) -> Self {
            let n = values.len();
            Self {
                values,
                revealed: vec![false; n],
                calls: 0,
            }
        }

        fn reveal(&mut self, index: usize) {
            self.revealed[index - 1] = true;
        }
    }

    impl ValueSource for Revealed {
        type Value = Option<i64>;
        type Error = SegmentTreeError;

        fn value_at(&mut self, index: usize) -> Result<Option<i64>, SegmentTreeError> {
            self.calls += 1;
            Ok(self.revealed[index - 1].then(|| self.values[index - 1]))
        }
    }

    fn leftmost_max(source: &Revealed) -> Option<usize> {
        let mut best: Option<(i64, usize)> = None;
        for (i, (&value, &shown)) in source.values.iter().zip(&source.revealed).enumerate() {
            if !shown {
                continue;
            }
            match best {
                Some((v, _)) if v >= value => {}
                _ => best = Some((value, i + 1)),
            }
        }
        best.map(|(_, i)| i)
    }

    #[test]
    fn test_build_shape() {
        let mut source = Revealed::new(vec![0; 9]);
        let tree = DynamicSegmentTree::build(1, 9, &mut source).unwrap();
        assert_eq!(tree.len(), 9);
        assert_eq!(tree.node_count(), 17);
        assert_eq!(tree.interval(), 1..=9);

        let (left, right) = tree[tree.root()].children().unwrap();
        assert_eq!(tree[left].interval(), 1..=4);
        assert_eq!(tree[right].interval(), 5..=9);
    }

    #[test]
    fn test_all_unset_resolves_left() {
        let mut source = Revealed::new(vec![0; 7]);
        let tree = DynamicSegmentTree::build(1, 7, &mut source).unwrap();
        assert_eq!(tree.argmax(), 1);
    }

    #[test]
    fn test_updates_track_maximum() {
        let mut source = Revealed::new(vec![9, 2, 6, 3, 1, 5, 0, 7, 6]);
        let mut tree = DynamicSegmentTree::build(1, 9, &mut source).unwrap();

        source.reveal(8);
        tree.update(8, &mut source).unwrap();
        assert_eq!(tree.argmax(), 8);

        source.reveal(3);
        tree.update(3, &mut source).unwrap();
        assert_eq!(tree.argmax(), 8);

        for i in 1..=9 {
            source.reveal(i);
            tree.update(i, &mut source).unwrap();
        }
        assert_eq!(tree.argmax(), 1);
    }

    #[test]
    fn test_ties_prefer_left() {
        let mut source = Revealed::new(vec![4, 1, 4, 4]);
        let mut tree = DynamicSegmentTree::build(1, 4, &mut source).unwrap();
        for i in [4, 3, 2, 1] {
            source.reveal(i);
            tree.update(i, &mut source).unwrap();
        }
        assert_eq!(tree.argmax(), 1);
    }

    #[test]
    fn test_update_touches_one_path() {
        let mut source = Revealed::new(vec![1; 16]);
        let mut tree = DynamicSegmentTree::build(1, 16, &mut source).unwrap();
        source.calls = 0;
        source.reveal(5);
        tree.update(5, &mut source).unwrap();
        // Four internal levels, two lookups each.
        assert_eq!(source.calls, 8);
    }

    #[test]
    fn test_find_leaf() {
        let mut source = Revealed::new(vec![0; 7]);
        let tree = DynamicSegmentTree::build(3, 7, &mut source).unwrap();
        for index in 3..=7 {
            let leaf = tree.find_leaf(index).unwrap();
            assert!(tree[leaf].is_leaf());
            assert_eq!(tree[leaf].interval(), index..=index);
            assert_eq!(tree[leaf].argmax(), leaf);
        }
        assert_eq!(
            tree.find_leaf(8),
            Err(SegmentTreeError::IndexOutOfRange {
                index: 8,
                lo: 3,
                hi: 7
            })
        );
        assert!(tree.find_leaf(2).is_err());
    }

    #[test]
    fn test_single_leaf() {
        let mut source = Revealed::new(vec![3]);
        let mut tree = DynamicSegmentTree::build(1, 1, &mut source).unwrap();
        source.reveal(1);
        tree.update(1, &mut source).unwrap();
        assert_eq!(tree.argmax(), 1);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_empty_range_rejected() {
        let mut source = Revealed::new(vec![]);
        let err = DynamicSegmentTree::build(2, 1, &mut source).unwrap_err();
        assert_eq!(err, SegmentTreeError::EmptyRange { lo: 2, hi: 1 });
    }

    #[test]
    fn test_update_out_of_range() {
        let mut source = Revealed::new(vec![0; 3]);
        let mut tree = DynamicSegmentTree::build(1, 3, &mut source).unwrap();
        assert!(tree.update(0, &mut source).is_err());
        assert!(tree.update(4, &mut source).is_err());
    }

    proptest! {
        #[test]
        fn prop_argmax_is_leftmost_maximum(
            (values, order) in (1usize..80).prop_flat_map(|n| (
                prop::collection::vec(-50i64..50, n),
                Just((1..=n).collect::<Vec<usize>>()).prop_shuffle(),
            )),
        ) {
            let n = values.len();
            let mut source = Revealed::new(values);
            let mut tree = DynamicSegmentTree::build(1, n, &mut source).unwrap();
            for index in order {
                source.reveal(index);
                tree.update(index, &mut source).unwrap();
                prop_assert_eq!(Some(tree.argmax()), leftmost_max(&source));
            }
        }
    }
}
