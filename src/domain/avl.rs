use std::cmp::Ordering;

use tracing::instrument;

use super::node::{Link, Node};
use super::record::{Code, Record};

/// Self-balancing binary search tree of inventory records keyed by code.
///
/// After every public mutating call the BST ordering holds and every node
/// satisfies `|height(left) - height(right)| <= 1`.
#[derive(Debug, Default)]
pub struct AvlTree {
    pub(crate) root: Link,
}

impl AvlTree {
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Insert `record` keyed by its code.
    ///
    /// Returns `false` and leaves the tree untouched when the code is already
    /// present: the stored record wins and `record` is dropped.
    #[instrument(level = "trace", skip(self, record), fields(code = record.code()))]
    pub fn insert(&mut self, record: Record) -> bool {
        let mut inserted = false;
        self.root = Some(insert_into(self.root.take(), record, &mut inserted));
        inserted
    }

    #[instrument(level = "trace", skip(self))]
    pub fn search(&self, code: Code) -> Option<&Record> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match code.cmp(&node.record.code()) {
                Ordering::Equal => return Some(&node.record),
                Ordering::Less => current = node.left.as_deref(),
                Ordering::Greater => current = node.right.as_deref(),
            }
        }
        None
    }

    /// Mutable lookup; only the record's stock can change through it, so the
    /// key ordering is never disturbed.
    #[instrument(level = "trace", skip(self))]
    pub fn search_mut(&mut self, code: Code) -> Option<&mut Record> {
        let mut current = self.root.as_deref_mut();
        while let Some(node) = current {
            match code.cmp(&node.record.code()) {
                Ordering::Equal => return Some(&mut node.record),
                Ordering::Less => current = node.left.as_deref_mut(),
                Ordering::Greater => current = node.right.as_deref_mut(),
            }
        }
        None
    }

    /// Remove the record stored under `code`, returning it.
    ///
    /// Absent codes are a no-op returning `None`.
    #[instrument(level = "trace", skip(self))]
    pub fn remove(&mut self, code: Code) -> Option<Record> {
        let (root, removed) = remove_from(self.root.take(), code);
        self.root = root;
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of records, counted by walking the whole tree.
    pub fn count(&self) -> usize {
        count_nodes(&self.root)
    }

    /// Height of the root; 0 for an empty tree.
    pub fn height(&self) -> u32 {
        Node::height_of(&self.root)
    }

    pub fn root(&self) -> Option<&Record> {
        self.root.as_deref().map(|node| &node.record)
    }

    /// In-order (ascending code) traversal.
    pub fn iter(&self) -> InOrder<'_> {
        InOrder::new(self.root.as_deref())
    }

    pub fn codes(&self) -> Vec<Code> {
        self.iter().map(Record::code).collect()
    }
}

impl<'a> IntoIterator for &'a AvlTree {
    type Item = &'a Record;
    type IntoIter = InOrder<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Extend<Record> for AvlTree {
    fn extend<I: IntoIterator<Item = Record>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl FromIterator<Record> for AvlTree {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

pub struct InOrder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> InOrder<'a> {
    fn new(root: Option<&'a Node>) -> Self {
        let mut iter = Self { stack: Vec::new() };
        iter.push_left_spine(root);
        iter
    }

    fn push_left_spine(&mut self, mut current: Option<&'a Node>) {
        while let Some(node) = current {
            self.stack.push(node);
            current = node.left.as_deref();
        }
    }
}

impl<'a> Iterator for InOrder<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.as_deref());
        Some(&node.record)
    }
}

fn insert_into(link: Link, record: Record, inserted: &mut bool) -> Box<Node> {
    let Some(mut node) = link else {
        *inserted = true;
        return Node::leaf(record);
    };

    match record.code().cmp(&node.record.code()) {
        Ordering::Less => node.left = Some(insert_into(node.left.take(), record, inserted)),
        Ordering::Greater => node.right = Some(insert_into(node.right.take(), record, inserted)),
        Ordering::Equal => return node,
    }

    rebalance(node)
}

/// Returns the new subtree root and the record that left the tree.
fn remove_from(link: Link, code: Code) -> (Link, Option<Record>) {
    let Some(mut node) = link else {
        return (None, None);
    };

    let removed = match code.cmp(&node.record.code()) {
        Ordering::Less => {
            let (left, removed) = remove_from(node.left.take(), code);
            node.left = left;
            removed
        }
        Ordering::Greater => {
            let (right, removed) = remove_from(node.right.take(), code);
            node.right = right;
            removed
        }
        Ordering::Equal => match (node.left.take(), node.right.take()) {
            (None, None) => return (None, Some(node.record)),
            (Some(child), None) | (None, Some(child)) => {
                return (Some(rebalance(child)), Some(node.record));
            }
            (Some(left), Some(right)) => {
                let successor = leftmost(&right).code();
                let (right, successor_record) = remove_from(Some(right), successor);
                node.left = Some(left);
                node.right = right;
                successor_record.map(|record| std::mem::replace(&mut node.record, record))
            }
        },
    };

    (Some(rebalance(node)), removed)
}

fn leftmost(mut node: &Node) -> &Record {
    while let Some(left) = node.left.as_deref() {
        node = left;
    }
    &node.record
}

fn count_nodes(link: &Link) -> usize {
    link.as_ref()
        .map_or(0, |node| 1 + count_nodes(&node.left) + count_nodes(&node.right))
}

/// Refresh the cached height and restore the AVL property at `node`.
fn rebalance(mut node: Box<Node>) -> Box<Node> {
    node.update_height();
    let balance = node.balance_factor();

    if balance > 1 {
        if node.left.as_ref().is_some_and(|left| left.balance_factor() < 0) {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }

    if balance < -1 {
        if node.right.as_ref().is_some_and(|right| right.balance_factor() > 0) {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }

    node
}

fn rotate_right(mut y: Box<Node>) -> Box<Node> {
    let Some(mut x) = y.left.take() else {
        return y;
    };
    y.left = x.right.take();
    // child first, then the new parent
    y.update_height();
    x.right = Some(y);
    x.update_height();
    x
}

fn rotate_left(mut x: Box<Node>) -> Box<Node> {
    let Some(mut y) = x.right.take() else {
        return x;
    };
    x.right = y.left.take();
    x.update_height();
    y.left = Some(x);
    y.update_height();
    y
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn item(code: Code) -> Record {
        Record::new(code, format!("item-{code}"), 1, 10.0)
    }

    fn tree_of(codes: &[Code]) -> AvlTree {
        codes.iter().copied().map(item).collect()
    }

    /// Walks the tree and checks ordering, cached heights and balance.
    /// Returns the subtree height.
    fn assert_invariants(link: &Link, lower: Option<Code>, upper: Option<Code>) -> u32 {
        let Some(node) = link else {
            return 0;
        };
        let code = node.record.code();
        if let Some(lower) = lower {
            assert!(code > lower, "{code} must be greater than {lower}");
        }
        if let Some(upper) = upper {
            assert!(code < upper, "{code} must be less than {upper}");
        }
        let left = assert_invariants(&node.left, lower, Some(code));
        let right = assert_invariants(&node.right, Some(code), upper);
        assert_eq!(node.height, 1 + left.max(right), "stale height at {code}");
        assert!(
            (i64::from(left) - i64::from(right)).abs() <= 1,
            "unbalanced at {code}: {left} vs {right}"
        );
        node.height
    }

    #[test]
    fn given_ascending_inserts_when_third_arrives_then_rotates_left() {
        let tree = tree_of(&[10, 20, 30]);
        assert_eq!(tree.root().map(Record::code), Some(20));
        assert_eq!(tree.height(), 2);
        assert_invariants(&tree.root, None, None);
    }

    #[rstest]
    #[case::left_left(&[30, 20, 10], 20)]
    #[case::left_right(&[30, 10, 20], 20)]
    #[case::right_left(&[10, 30, 20], 20)]
    #[case::right_right(&[10, 20, 30], 20)]
    fn given_three_codes_when_unbalanced_then_middle_becomes_root(
        #[case] codes: &[Code],
        #[case] expected_root: Code,
    ) {
        let tree = tree_of(codes);
        assert_eq!(tree.root().map(Record::code), Some(expected_root));
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.codes(), vec![10, 20, 30]);
    }

    #[test]
    fn given_duplicate_code_when_inserting_then_first_record_wins() {
        let mut tree = AvlTree::new();
        assert!(tree.insert(Record::new(5, "original", 3, 1.0)));
        if let Some(record) = tree.search_mut(5) {
            record.reduce_stock(1);
        }

        assert!(!tree.insert(Record::new(5, "replacement", 9, 2.0)));

        let stored = tree.search(5).expect("present");
        assert_eq!(stored.name(), "original");
        assert_eq!(stored.stock(), 2);
        assert_eq!(tree.count(), 1);
    }

    #[test]
    fn given_leaf_when_removed_then_parent_slot_empties() {
        let mut tree = tree_of(&[20, 10, 30]);
        let removed = tree.remove(10).expect("removed");
        assert_eq!(removed.code(), 10);
        assert_eq!(tree.codes(), vec![20, 30]);
        assert_invariants(&tree.root, None, None);
    }

    #[rstest]
    #[case::only_left_child(&[20, 10, 30, 5], 10, vec![5, 20, 30])]
    #[case::only_right_child(&[20, 10, 30, 40], 30, vec![10, 20, 40])]
    fn given_single_child_when_removed_then_child_is_promoted(
        #[case] codes: &[Code],
        #[case] target: Code,
        #[case] expected: Vec<Code>,
    ) {
        let mut tree = tree_of(codes);
        tree.remove(target);
        assert_eq!(tree.codes(), expected);
        assert!(tree.search(target).is_none());
        assert_invariants(&tree.root, None, None);
    }

    #[test]
    fn given_two_children_when_removing_root_then_successor_takes_its_place() {
        let mut tree = tree_of(&[50, 30, 70, 20, 40, 60, 80]);
        let removed = tree.remove(50).expect("removed");

        assert_eq!(removed.code(), 50);
        assert_eq!(tree.root().map(Record::code), Some(60));
        assert_eq!(tree.codes(), vec![20, 30, 40, 60, 70, 80]);
        assert_invariants(&tree.root, None, None);
    }

    #[test]
    fn given_two_children_when_successor_has_right_child_then_order_is_kept() {
        let mut tree = tree_of(&[40, 20, 60, 10, 30, 50, 70, 55]);
        tree.remove(40);
        assert_eq!(tree.root().map(Record::code), Some(50));
        assert_eq!(tree.codes(), vec![10, 20, 30, 50, 55, 60, 70]);
        assert_invariants(&tree.root, None, None);
    }

    #[test]
    fn given_removals_when_subtree_shrinks_then_rebalances_on_unwind() {
        let mut tree = tree_of(&[50, 30, 70, 20, 40, 60, 80, 10]);
        tree.remove(60);
        tree.remove(80);
        tree.remove(70);
        assert_invariants(&tree.root, None, None);
        assert_eq!(tree.codes(), vec![10, 20, 30, 40, 50]);
        assert_eq!(tree.root().map(Record::code), Some(30));
    }

    #[test]
    fn given_absent_code_when_removing_then_tree_is_unchanged() {
        let mut tree = tree_of(&[2, 1, 3]);
        assert!(tree.remove(99).is_none());
        assert_eq!(tree.count(), 3);
        assert_eq!(tree.root().map(Record::code), Some(2));
    }

    #[test]
    fn given_empty_tree_when_queried_then_reports_nothing() {
        let mut tree = AvlTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.count(), 0);
        assert_eq!(tree.height(), 0);
        assert!(tree.root().is_none());
        assert!(tree.search(1).is_none());
        assert!(tree.remove(1).is_none());
        assert_eq!(tree.iter().count(), 0);
    }

    #[test]
    fn given_stock_change_via_search_mut_when_searching_again_then_sees_new_stock() {
        let mut tree = AvlTree::new();
        tree.insert(Record::new(3, "Fan", 2, 30.0));
        if let Some(record) = tree.search_mut(3) {
            record.reduce_stock(1);
        }
        assert_eq!(tree.search(3).map(Record::stock), Some(1));
    }

    #[test]
    fn given_many_sequential_inserts_when_built_then_height_stays_logarithmic() {
        let tree = tree_of(&(1..=1000).collect::<Vec<_>>());
        assert_eq!(tree.count(), 1000);
        let bound = 1.45 * ((1000.0_f64 + 2.0).log2());
        assert!(f64::from(tree.height()) <= bound);
        assert_invariants(&tree.root, None, None);
    }
}
