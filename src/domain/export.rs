//! Structural views of the tree: Graphviz DOT export and terminal rendering
//!
//! Both are read-only snapshots for debugging; neither touches the tree's
//! logical behavior.

use std::io::{self, Write};

use termtree::Tree;

use super::avl::AvlTree;
use super::node::Node;
use super::record::Code;

impl AvlTree {
    /// Write the tree shape as a Graphviz digraph.
    ///
    /// Every node appears once with its code, name, stock and height, followed
    /// by an edge to each child. Absent children get their own `null`
    /// placeholder so the rendered tree keeps left/right positions.
    pub fn export_structure<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        writeln!(sink, "digraph AVLTree {{")?;
        writeln!(
            sink,
            "  node [shape=box, style=filled, fillcolor=\"lightblue\"];"
        )?;
        match self.root.as_deref() {
            None => writeln!(sink, "  \"null\" [shape=plaintext, label=\"null\"];")?,
            Some(root) => write_node(root, sink)?,
        }
        writeln!(sink, "}}")?;
        Ok(())
    }

    /// [`AvlTree::export_structure`] collected into a string.
    pub fn to_dot(&self) -> String {
        let mut buffer = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.export_structure(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

fn write_node<W: Write>(node: &Node, sink: &mut W) -> io::Result<()> {
    let code = node.record.code();
    writeln!(
        sink,
        "  \"{code}\" [label=\"[{code}] {}\\nstock: {} | height: {}\"];",
        escape_label(node.record.name()),
        node.record.stock(),
        node.height
    )?;
    write_edge(code, "left", node.left.as_deref(), sink)?;
    write_edge(code, "right", node.right.as_deref(), sink)
}

fn write_edge<W: Write>(
    parent: Code,
    side: &str,
    child: Option<&Node>,
    sink: &mut W,
) -> io::Result<()> {
    match child {
        Some(child) => {
            writeln!(sink, "  \"{parent}\" -> \"{}\";", child.record.code())?;
            write_node(child, sink)
        }
        None => {
            let placeholder = format!("null_{side}_{parent}");
            writeln!(
                sink,
                "  \"{placeholder}\" [shape=plaintext, label=\"null\"];"
            )?;
            writeln!(sink, "  \"{parent}\" -> \"{placeholder}\";")
        }
    }
}

fn escape_label(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render a tree for terminal display.
///
/// Workaround for E0116: `termtree::Tree` is foreign, so conversion lives in
/// a local trait.
pub trait TreeDisplay {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeDisplay for AvlTree {
    fn to_tree_string(&self) -> Tree<String> {
        match self.root.as_deref() {
            Some(root) => build_display(root, None),
            None => Tree::new("Empty tree".to_string()),
        }
    }
}

fn build_display(node: &Node, side: Option<&str>) -> Tree<String> {
    let label = match side {
        Some(side) => format!("{side} {} (h={})", node.record, node.height),
        None => format!("{} (h={})", node.record, node.height),
    };
    let mut tree = Tree::new(label);
    if let Some(left) = node.left.as_deref() {
        tree.push(build_display(left, Some("L")));
    }
    if let Some(right) = node.right.as_deref() {
        tree.push(build_display(right, Some("R")));
    }
    tree
}
