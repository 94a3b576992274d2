use std::fmt::{self, Write};

use crate::{Implementation, Node, Vm};

const KEYWORDS: &[&str] = &[
    "andthen", "at", "attr", "break", "case", "catch", "choice", "class", "collect", "cond",
    "declare", "define", "dis", "div", "do", "else", "elsecase", "elseif", "elseof", "end",
    "fail", "false", "feat", "finally", "for", "from", "fun", "functor", "if", "import", "in",
    "lazy", "local", "lock", "meth", "mod", "not", "of", "or", "orelse", "prepare", "proc",
    "prop", "raise", "require", "return", "self", "skip", "then", "thread", "true", "try",
    "unit",
];

fn is_bare_atom(content: &str) -> bool {
    let mut chars = content.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !KEYWORDS.contains(&content)
}

/// Writes an atom the way it would be read back: bare when it is a plain
/// lowercase identifier, quoted otherwise.
pub fn write_atom(out: &mut dyn Write, content: &str) -> fmt::Result {
    if is_bare_atom(content) {
        return out.write_str(content);
    }
    out.write_char('\'')?;
    for c in content.chars() {
        match c {
            '\'' => out.write_str("\\'")?,
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\t' => out.write_str("\\t")?,
            '\r' => out.write_str("\\r")?,
            c if c.is_control() => write!(out, "\\x{:02X}", c as u32)?,
            c => out.write_char(c)?,
        }
    }
    out.write_char('\'')
}

/// [`fmt::Display`] adapter printing a value with the VM's print depth.
pub struct Repr<'a> {
    vm: &'a Vm,
    node: &'a Node,
    depth: usize,
}

impl fmt::Display for Repr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.vm.print_node(f, self.node, self.depth)
    }
}

impl Vm {
    pub fn repr<'a>(&'a self, node: &'a Node) -> Repr<'a> {
        Repr {
            vm: self,
            node,
            depth: self.settings().print_depth,
        }
    }

    pub fn print(&self, node: &Node, depth: usize) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = self.print_node(&mut out, node, depth);
        out
    }

    pub fn print_node(&self, out: &mut dyn Write, node: &Node, depth: usize) -> fmt::Result {
        match node {
            Node::Atom(atom) => atom.print_repr(self, out, depth),
            Node::SmallInt(int) => int.print_repr(self, out, depth),
            Node::Float(float) => float.print_repr(self, out, depth),
            Node::Boolean(boolean) => boolean.print_repr(self, out, depth),
            Node::Unit(unit) => unit.print_repr(self, out, depth),
            Node::Record(record) => record.print_repr(self, out, depth),
            Node::Variable(var) => var.print_repr(self, out, depth),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VMCreateInfo;

    fn atom(content: &str) -> String {
        let mut out = String::new();
        write_atom(&mut out, content).unwrap();
        out
    }

    #[test]
    fn plain_identifiers_print_bare() {
        assert_eq!(atom("foo"), "foo");
        assert_eq!(atom("fooBar_2"), "fooBar_2");
    }

    #[test]
    fn everything_else_is_quoted() {
        assert_eq!(atom(""), "''");
        assert_eq!(atom("Foo"), "'Foo'");
        assert_eq!(atom("hello world"), "'hello world'");
        assert_eq!(atom("it's"), "'it\\'s'");
        assert_eq!(atom("a\\b"), "'a\\\\b'");
        assert_eq!(atom("line\n"), "'line\\n'");
        assert_eq!(atom("\u{1}"), "'\\x01'");
        assert_eq!(atom("ünï"), "'ünï'");
    }

    #[test]
    fn keywords_are_quoted() {
        assert_eq!(atom("case"), "'case'");
        assert_eq!(atom("true"), "'true'");
        assert_eq!(atom("unit"), "'unit'");
        assert_eq!(atom("cases"), "cases");
    }

    #[test]
    fn repr_uses_the_vm_print_depth() {
        let mut vm = Vm::new(VMCreateInfo {
            print_depth: Some(1),
            ..Default::default()
        });
        let inner_label = vm.new_atom("inner");
        let inner = vm.build_tuple(inner_label, vec![Node::int(1)]).unwrap();
        let outer_label = vm.new_atom("outer");
        let outer = vm.build_tuple(outer_label, vec![inner]).unwrap();
        assert_eq!(vm.repr(&outer).to_string(), "outer(,,,)");
        assert_eq!(vm.print(&outer, 2), "outer(inner(1))");
    }
}
