//! Plain-text rendering of a state tree.

use reducible_runtime::{RenderError, Renderer};
use reducible_state::Envelope;

/// Renders each node as `component path` followed by its fields, children
/// indented below their parent.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextRenderer;

impl TextRenderer {
    fn render_node(&self, envelope: &Envelope, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        out.push_str(&format!("{indent}{} ({})\n", envelope.component_id, envelope.path));
        for (key, value) in &envelope.data {
            out.push_str(&format!("{indent}  {key} = {value}\n"));
        }
        for child in envelope.children.values() {
            self.render_node(child, depth + 1, out);
        }
    }
}

impl Renderer for TextRenderer {
    fn render(&self, _component_id: &str, envelope: &Envelope) -> Result<String, RenderError> {
        let mut out = String::new();
        self.render_node(envelope, 0, &mut out);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demos::dashboard::Dashboard;

    #[test]
    fn renders_nested_tree() {
        let text = TextRenderer.render("Dashboard", &Dashboard::tree("root")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Dashboard (root)");
        assert_eq!(lines[1], "  title = \"Dashboard\"");
        assert_eq!(lines[2], "  Counter (root/counter)");
        assert_eq!(lines[3], "    count = 0");
    }
}
