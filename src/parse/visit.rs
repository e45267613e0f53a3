use super::ast::Node;

/// Read-only traversal. Override [`Visit::visit_node`] and call [`walk_node`] to descend.
pub trait Visit {
    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node)
    }
}

pub trait VisitMut {
    fn visit_node_mut(&mut self, node: &mut Node) {
        walk_node_mut(self, node)
    }
}

pub fn walk_node<V: Visit + ?Sized>(v: &mut V, node: &Node) {
    match node {
        Node::Unary(_, x) => v.visit_node(x),
        Node::Arithmetic(l, _, r) => {
            v.visit_node(l);
            v.visit_node(r);
        }
        Node::Function(f) => f.args.iter().for_each(|arg| v.visit_node(arg)),
        Node::Group(g) => g.items.iter().for_each(|item| v.visit_node(item)),
        Node::InlineRoll(inline) => v.visit_node(&inline.body),
        Node::Number(_)
        | Node::Dice(_)
        | Node::CustomDice(_)
        | Node::FudgeDice(_)
        | Node::Table(_)
        | Node::Macro(_)
        | Node::RollQuery(_)
        | Node::RollReference(_)
        | Node::Formatting(_) => {}
    }
}

pub fn walk_node_mut<V: VisitMut + ?Sized>(v: &mut V, node: &mut Node) {
    match node {
        Node::Unary(_, x) => v.visit_node_mut(x),
        Node::Arithmetic(l, _, r) => {
            v.visit_node_mut(l);
            v.visit_node_mut(r);
        }
        Node::Function(f) => f.args.iter_mut().for_each(|arg| v.visit_node_mut(arg)),
        Node::Group(g) => g.items.iter_mut().for_each(|item| v.visit_node_mut(item)),
        Node::InlineRoll(inline) => v.visit_node_mut(&mut inline.body),
        Node::Number(_)
        | Node::Dice(_)
        | Node::CustomDice(_)
        | Node::FudgeDice(_)
        | Node::Table(_)
        | Node::Macro(_)
        | Node::RollQuery(_)
        | Node::RollReference(_)
        | Node::Formatting(_) => {}
    }
}

/// Collects every node matching `f` in pre-order.
pub fn collect<T>(node: &Node, f: impl FnMut(&Node) -> Option<T>) -> Vec<T> {
    struct Collector<F, T> {
        f: F,
        found: Vec<T>,
    }

    impl<F: FnMut(&Node) -> Option<T>, T> Visit for Collector<F, T> {
        fn visit_node(&mut self, node: &Node) {
            self.found.extend((self.f)(node));
            walk_node(self, node);
        }
    }

    let mut collector = Collector {
        f,
        found: Vec::new(),
    };
    collector.visit_node(node);
    collector.found
}

struct InlineIndexer {
    next: usize,
}

impl VisitMut for InlineIndexer {
    fn visit_node_mut(&mut self, node: &mut Node) {
        if let Node::InlineRoll(inline) = node {
            inline.index = Some(self.next);
            self.next += 1;
        }
        walk_node_mut(self, node);
    }
}

/// Numbers inline rolls in document order, outer rolls before the rolls nested inside them.
/// Returns how many were found.
pub fn index_inline_rolls(node: &mut Node) -> usize {
    let mut indexer = InlineIndexer { next: 0 };
    indexer.visit_node_mut(node);
    indexer.next
}
