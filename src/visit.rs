//! Post-order, depth-first traversal over the composite nodes of a tree.
//!
//! Every composite is handed to the visitor only after all composites nested
//! inside it have been visited. Leaves are never passed to the visitor.
//! Children the visitor introduces into a block are not visited by the same
//! traversal.

use crate::ast::{Block, Node};

/// Visits every composite reachable from `node`, innermost first.
pub fn visit<F>(node: &Node, f: &mut F)
where
    F: FnMut(&Block),
{
    if let Node::Composite(block) = node {
        block.body.iter().for_each(|child| visit(child, f));
        f(block)
    }
}

/// Visits every composite reachable from `node`, innermost first, allowing
/// the visitor to rewrite each block's body.
pub fn visit_mut<F>(node: &mut Node, f: &mut F)
where
    F: FnMut(&mut Block),
{
    if let Node::Composite(block) = node {
        block.body.iter_mut().for_each(|child| visit_mut(child, f));
        f(block)
    }
}

/// Like [`visit_mut`], but stops at the first error the visitor returns.
pub fn try_visit_mut<F, E>(node: &mut Node, f: &mut F) -> Result<(), E>
where
    F: FnMut(&mut Block) -> Result<(), E>,
{
    match node {
        Node::Leaf(_) => Ok(()),
        Node::Composite(block) => {
            block
                .body
                .iter_mut()
                .try_for_each(|child| try_visit_mut(child, f))?;
            f(block)
        }
    }
}

/// Returns true if `predicate` holds for any composite reachable from `node`.
pub fn any_block<F>(node: &Node, mut predicate: F) -> bool
where
    F: FnMut(&Block) -> bool,
{
    let mut found = false;
    visit(node, &mut |block| found = found || predicate(block));
    found
}
