use crate::Node;

pub trait Visitable {
    fn visit_edges(&self, visitor: &mut impl Visitor);
    fn visit_edges_mut(&mut self, visitor: &mut impl Visitor);
}

pub trait Visitor: Sized {
    fn visit(&mut self, node: &Node) {
        let _ = node;
    }
    fn visit_mut(&mut self, node: &mut Node) {
        let _ = node;
    }
}

// relocation only needs to rewrite edges, so a closure is enough
impl<F: FnMut(&mut Node)> Visitor for F {
    fn visit_mut(&mut self, node: &mut Node) {
        self(node)
    }
}

/// Anything that holds GC roots outside the heap.
pub trait RootProvider {
    fn visit_roots(&mut self, visitor: &mut dyn FnMut(&mut Node));
}

/// Values pinned by the host through [`crate::Vm::add_root`].
#[derive(Debug, Default)]
pub struct Roots {
    nodes: Vec<Node>,
}

impl Roots {
    pub fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl RootProvider for Roots {
    fn visit_roots(&mut self, visitor: &mut dyn FnMut(&mut Node)) {
        for root in &mut self.nodes {
            visitor(root);
        }
    }
}
