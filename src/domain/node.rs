use super::record::Record;

/// Owned link to a subtree; `None` is an absent child.
pub(crate) type Link = Option<Box<Node>>;

/// Tree node owning its record and both children.
///
/// `height` is cached: a leaf has height 1, an absent child counts as 0.
#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) record: Record,
    pub(crate) left: Link,
    pub(crate) right: Link,
    pub(crate) height: u32,
}

impl Node {
    pub(crate) fn leaf(record: Record) -> Box<Self> {
        Box::new(Self {
            record,
            left: None,
            right: None,
            height: 1,
        })
    }

    pub(crate) fn height_of(link: &Link) -> u32 {
        link.as_ref().map_or(0, |node| node.height)
    }

    pub(crate) fn update_height(&mut self) {
        self.height = 1 + Self::height_of(&self.left).max(Self::height_of(&self.right));
    }

    /// `height(left) - height(right)`.
    pub(crate) fn balance_factor(&self) -> i64 {
        i64::from(Self::height_of(&self.left)) - i64::from(Self::height_of(&self.right))
    }
}
