use std::{cmp::Ordering, fmt};

use crate::{
    Behavior, BuiltinResult, Capabilities, CopyPolicy, Gc, Implementation, Kind, Listener, Node,
    RecordLike, RecordRef, Relocate, Storage, Visitable, Visitor, Vm, VmError, VmResult,
    raise_illegal_field_selection, raise_type_error,
};

#[derive(Debug, Clone)]
pub enum Arity {
    /// features are `1..=width`
    Tuple,
    /// sorted by [`compare_features`]
    Features(Box<[Node]>),
}

#[derive(Debug, Clone)]
pub struct Record {
    label: Node,
    arity: Arity,
    fields: Box<[Node]>,
}

/// Canonical feature order: integers, then atoms by content, then the
/// other literals.
pub fn compare_features(left: &Node, right: &Node) -> Ordering {
    fn rank(node: &Node) -> u8 {
        match node {
            Node::SmallInt(_) => 0,
            Node::Atom(_) => 1,
            Node::Boolean(_) => 2,
            Node::Unit(_) => 3,
            _ => 4,
        }
    }

    match (left, right) {
        (Node::SmallInt(l), Node::SmallInt(r)) => l.0.cmp(&r.0),
        (Node::Atom(l), Node::Atom(r)) => l.content().cmp(r.content()),
        (Node::Boolean(l), Node::Boolean(r)) => l.0.cmp(&r.0),
        _ => rank(left).cmp(&rank(right)),
    }
}

impl Record {
    pub(crate) fn tuple(label: Node, fields: Vec<Node>) -> Self {
        Self {
            label,
            arity: Arity::Tuple,
            fields: fields.into_boxed_slice(),
        }
    }

    // `fields` must be sorted and free of duplicates
    pub(crate) fn from_sorted(label: Node, fields: Vec<(Node, Node)>) -> Self {
        let is_tuple = fields
            .iter()
            .enumerate()
            .all(|(index, (feature, _))| feature.as_int() == Some(index as i64 + 1));
        let (features, values): (Vec<Node>, Vec<Node>) = fields.into_iter().unzip();
        let arity = if is_tuple {
            Arity::Tuple
        } else {
            Arity::Features(features.into_boxed_slice())
        };
        Self {
            label,
            arity,
            fields: values.into_boxed_slice(),
        }
    }

    pub(crate) fn placeholder() -> Self {
        Self::tuple(Node::unit(), Vec::new())
    }

    pub fn label(&self) -> &Node {
        &self.label
    }

    pub fn arity(&self) -> &Arity {
        &self.arity
    }

    pub fn width(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &[Node] {
        &self.fields
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self.arity, Arity::Tuple)
    }

    pub fn feature_at(&self, index: usize) -> Node {
        match &self.arity {
            Arity::Tuple => Node::int(index as i64 + 1),
            Arity::Features(features) => features[index].clone(),
        }
    }

    /// `feature` must already be dereferenced.
    pub fn lookup(&self, feature: &Node) -> Option<&Node> {
        match &self.arity {
            Arity::Tuple => self.lookup_number(feature.as_int()?),
            Arity::Features(features) => {
                let index = features
                    .binary_search_by(|probe| compare_features(probe, feature))
                    .ok()?;
                Some(&self.fields[index])
            }
        }
    }

    pub fn lookup_number(&self, feature: i64) -> Option<&Node> {
        match &self.arity {
            Arity::Tuple => {
                let index = usize::try_from(feature.checked_sub(1)?).ok()?;
                self.fields.get(index)
            }
            Arity::Features(features) => {
                let index = features
                    .binary_search_by(|probe| compare_features(probe, &Node::int(feature)))
                    .ok()?;
                Some(&self.fields[index])
            }
        }
    }

    pub fn same_arity(&self, vm: &Vm, other: &Record) -> bool {
        match (&self.arity, &other.arity) {
            (Arity::Tuple, Arity::Tuple) => self.width() == other.width(),
            (Arity::Features(left), Arity::Features(right)) => {
                left.len() == right.len()
                    && left.iter().zip(right.iter()).all(|(l, r)| vm.equals(l, r))
            }
            _ => false,
        }
    }
}

impl Visitable for Record {
    fn visit_edges(&self, visitor: &mut impl Visitor) {
        visitor.visit(&self.label);
        if let Arity::Features(features) = &self.arity {
            features.iter().for_each(|feature| visitor.visit(feature));
        }
        self.fields.iter().for_each(|field| visitor.visit(field));
    }

    fn visit_edges_mut(&mut self, visitor: &mut impl Visitor) {
        visitor.visit_mut(&mut self.label);
        if let Arity::Features(features) = &mut self.arity {
            features.iter_mut().for_each(|feature| visitor.visit_mut(feature));
        }
        self.fields.iter_mut().for_each(|field| visitor.visit_mut(field));
    }
}

impl Vm {
    /// Builds a record from `(feature, value)` pairs in any order.
    ///
    /// A record without fields is its label. Records whose features are
    /// exactly `1..=n` are stored as tuples.
    pub fn build_record(&mut self, label: Node, fields: Vec<(Node, Node)>) -> VmResult<Node> {
        let label = self.deref(&label);
        if !label.is_literal() {
            return Err(VmError::InvalidLabel(self.repr(&label).to_string()));
        }
        if fields.is_empty() {
            return Ok(label);
        }

        let mut resolved = Vec::with_capacity(fields.len());
        for (feature, value) in fields {
            let feature = self.deref(&feature);
            if !feature.is_feature() {
                return Err(VmError::InvalidFeature(self.repr(&feature).to_string()));
            }
            resolved.push((feature, value));
        }
        resolved.sort_by(|(l, _), (r, _)| compare_features(l, r));
        if let Some(pair) = resolved
            .windows(2)
            .find(|pair| compare_features(&pair[0].0, &pair[1].0) == Ordering::Equal)
        {
            return Err(VmError::DuplicateFeature(self.repr(&pair[0].0).to_string()));
        }

        let record = Record::from_sorted(label, resolved);
        Ok(self.heap_mut().allocate_record(record).into())
    }

    pub fn build_tuple(&mut self, label: Node, values: Vec<Node>) -> VmResult<Node> {
        let label = self.deref(&label);
        if !label.is_literal() {
            return Err(VmError::InvalidLabel(self.repr(&label).to_string()));
        }
        if values.is_empty() {
            return Ok(label);
        }
        Ok(self.heap_mut().allocate_record(Record::tuple(label, values)).into())
    }
}

impl Implementation for RecordRef {
    type Payload<'a> = RecordRef;

    const KIND: Kind = Kind::Record;
    const CAPABILITIES: Capabilities =
        Capabilities::new(CopyPolicy::Transient, Storage::Boxed, Behavior::Structural);

    fn value(&self) -> RecordRef {
        *self
    }

    // structural, through the VM so cycles are tracked
    fn equals(&self, vm: &Vm, right: &Self) -> bool {
        self == right || vm.equals(&(*self).into(), &(*right).into())
    }

    fn print_repr(&self, vm: &Vm, out: &mut dyn fmt::Write, depth: usize) -> fmt::Result {
        if depth == 0 {
            return out.write_str(",,,");
        }
        let record = vm.heap().record(*self);
        // leading features 1..n print positionally, like a tuple
        let positional = (0..record.width())
            .take_while(|&index| record.feature_at(index).as_int() == Some(index as i64 + 1))
            .count();
        vm.print_node(out, record.label(), depth)?;
        out.write_char('(')?;
        for (index, field) in record.fields().iter().enumerate() {
            if index > 0 {
                out.write_char(' ')?;
            }
            if index >= positional {
                vm.print_node(out, &record.feature_at(index), depth)?;
                out.write_char(':')?;
            }
            vm.print_node(out, field, depth - 1)?;
        }
        out.write_char(')')
    }
}

impl RecordLike for RecordRef {
    fn label(&self, vm: &mut Vm, result: &mut Node) -> BuiltinResult {
        *result = vm.heap().record(*self).label().clone();
        BuiltinResult::Proceed
    }

    fn width(&self, vm: &mut Vm, result: &mut Node) -> BuiltinResult {
        *result = Node::int(vm.heap().record(*self).width() as i64);
        BuiltinResult::Proceed
    }

    fn dot(&self, vm: &mut Vm, feature: &Node, result: &mut Node) -> BuiltinResult {
        let feature = vm.deref(feature);
        if let Node::Variable(var) = feature {
            return BuiltinResult::Suspend(var);
        }
        if !feature.is_feature() {
            return raise_type_error(vm, "Feature", feature);
        }
        match vm.heap().record(*self).lookup(&feature).cloned() {
            Some(value) => {
                *result = value;
                BuiltinResult::Proceed
            }
            None => raise_illegal_field_selection(vm, (*self).into(), feature),
        }
    }

    fn dot_number(&self, vm: &mut Vm, feature: i64, result: &mut Node) -> BuiltinResult {
        match vm.heap().record(*self).lookup_number(feature).cloned() {
            Some(value) => {
                *result = value;
                BuiltinResult::Proceed
            }
            None => raise_illegal_field_selection(vm, (*self).into(), Node::int(feature)),
        }
    }

    /// Proceeds with the feature of the first determined field. While all
    /// fields are unbound the thread waits on a control variable that the
    /// first binding of any field binds as well.
    fn wait_or(&self, vm: &mut Vm, result: &mut Node) -> BuiltinResult {
        let record = vm.heap().record(*self);
        let mut unbound = Vec::with_capacity(record.width());
        for (index, field) in record.fields().iter().enumerate() {
            match vm.deref(field) {
                Node::Variable(var) => unbound.push(var),
                _ => {
                    *result = record.feature_at(index);
                    return BuiltinResult::Proceed;
                }
            }
        }
        if let [var] = unbound[..] {
            return BuiltinResult::Suspend(var);
        }

        // a retry finds the control variable of the previous attempt
        let heap = vm.heap();
        let pending = heap.listeners(unbound[0]).iter().find_map(|listener| match listener {
            Listener::Variable(control)
                if !vm.is_determined(&(*control).into())
                    && unbound[1..]
                        .iter()
                        .all(|var| heap.listeners(*var).contains(listener)) =>
            {
                Some(*control)
            }
            _ => None,
        });
        if let Some(control) = pending {
            return BuiltinResult::Suspend(control);
        }

        let control = vm.new_variable();
        for var in unbound {
            vm.heap_mut().add_listener(var, Listener::Variable(control));
        }
        BuiltinResult::Suspend(control)
    }
}

impl Relocate for RecordRef {
    type Output = RecordRef;

    fn build(vm: &Vm, gc: &mut Gc, from: &Self) -> RecordRef {
        if let Some(relocated) = gc.relocated_record(*from) {
            return relocated;
        }
        // reserve first so cycles through bound variables terminate
        let target = gc.reserve_record(*from);
        let mut record = vm.heap().record(*from).clone();
        record.visit_edges_mut(&mut |node: &mut Node| *node = gc.relocate(vm, node));
        gc.heap_mut().replace_record(target, record);
        target
    }
}
