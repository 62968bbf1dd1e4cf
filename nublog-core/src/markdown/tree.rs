//! Depth-first traversal shared by the source and render trees.

/// Control signal returned by traversal callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Descend into the (possibly replaced) node's children
    Continue,
    /// Do not descend into this node's children
    Skip,
    /// Abort the whole traversal
    Stop,
}

/// A node that owns an ordered list of children.
pub trait TreeNode: Sized {
    fn children(&self) -> &[Self];

    /// `None` for leaf variants that can never hold children.
    fn children_mut(&mut self) -> Option<&mut Vec<Self>>;

    /// Pre-order walk. Returns `false` when a callback asked to stop.
    fn walk<F>(&self, f: &mut F) -> bool
    where
        F: FnMut(&Self) -> Visit,
    {
        match f(self) {
            Visit::Stop => return false,
            Visit::Skip => return true,
            Visit::Continue => {}
        }
        self.children().iter().all(|child| child.walk(f))
    }

    /// Pre-order walk allowing the callback to edit or replace each node in
    /// place. Children are visited after the callback, so a replacement is
    /// walked in its new shape unless the callback returns [`Visit::Skip`].
    fn walk_mut<F>(&mut self, f: &mut F) -> bool
    where
        F: FnMut(&mut Self) -> Visit,
    {
        match f(self) {
            Visit::Stop => return false,
            Visit::Skip => return true,
            Visit::Continue => {}
        }
        match self.children_mut() {
            Some(children) => children.iter_mut().all(|child| child.walk_mut(f)),
            None => true,
        }
    }

    /// Fallible variant of [`TreeNode::walk_mut`]; the first error aborts the walk.
    fn try_walk_mut<E, F>(&mut self, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&mut Self) -> Result<Visit, E>,
    {
        let mut result = Ok(());
        self.walk_mut(&mut |node| match f(node) {
            Ok(visit) => visit,
            Err(err) => {
                result = Err(err);
                Visit::Stop
            }
        });
        result
    }
}
