//! ASCII tree rendering of a file set
//!
//! Renders the hierarchical layout of the packed files for the archive
//! footer, with box-drawing connectors. In dry runs each leaf is annotated
//! with its line count.

use crate::fileset::FileSet;
use crate::fsys::Fs;

#[derive(Debug, Default)]
struct Node {
    children: Vec<(String, Node)>,
}

impl Node {
    fn branch(&mut self, name: &str) -> &mut Node {
        if let Some(idx) = self.children.iter().position(|(n, _)| n == name) {
            return &mut self.children[idx].1;
        }
        self.children.push((name.to_string(), Node::default()));
        let last = self.children.len() - 1;
        &mut self.children[last].1
    }

    fn leaf(&mut self, label: String) {
        self.children.push((label, Node::default()));
    }
}

/// Render the tree for a file set, rooted at `.`.
///
/// When `fs` is given, leaves carry a ` (#N)` line-count annotation read
/// from the file contents.
pub fn generate(set: &FileSet, fs: Option<&dyn Fs>) -> String {
    let mut root = Node::default();

    for path in set.iter() {
        add_path(&mut root, path, fs);
    }

    let mut out = String::from(".\n");
    render(&root, "", &mut out);
    out
}

fn add_path(root: &mut Node, path: &str, fs: Option<&dyn Fs>) {
    let parts: Vec<&str> = path.split('/').collect();
    let mut current = root;

    for (i, part) in parts.iter().enumerate() {
        if i + 1 == parts.len() {
            let label = match fs {
                Some(fs) => {
                    let lines = count_lines(&fs.read(path).unwrap_or_default());
                    format!("{part} (#{lines})")
                }
                None => (*part).to_string(),
            };
            current.leaf(label);
        } else {
            current = current.branch(part);
        }
    }
}

fn render(node: &Node, prefix: &str, out: &mut String) {
    let count = node.children.len();
    for (i, (name, child)) in node.children.iter().enumerate() {
        let last = i + 1 == count;
        out.push_str(prefix);
        out.push_str(if last { "└── " } else { "├── " });
        out.push_str(name);
        out.push('\n');

        let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
        render(child, &child_prefix, out);
    }
}

/// Number of lines in a byte buffer; a trailing unterminated line counts
fn count_lines(data: &[u8]) -> usize {
    if data.is_empty() {
        return 0;
    }
    let newlines = data.iter().filter(|&&b| b == b'\n').count();
    if data.ends_with(b"\n") {
        newlines
    } else {
        newlines + 1
    }
}
