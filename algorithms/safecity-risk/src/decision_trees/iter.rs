use std::iter::Iterator;

use super::TreeNode;

/// Depth-first iterator over the nodes of a decision tree, children after their parent
pub struct NodeIter<'a, F> {
    queue: Vec<&'a TreeNode<F>>,
}

impl<'a, F> NodeIter<'a, F> {
    pub fn new(queue: Vec<&'a TreeNode<F>>) -> Self {
        NodeIter { queue }
    }
}

impl<'a, F> Iterator for NodeIter<'a, F> {
    type Item = &'a TreeNode<F>;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.pop().map(|node| {
            self.queue.extend(node.children());
            node
        })
    }
}
