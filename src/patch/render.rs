//! HTML projection of a slot subtree.
//!
//! The tree is the source of truth; this renderer is a pure serialization of
//! it. Text and attribute values are escaped, so resolved slot text can never
//! inject markup into the previewed document.

use crate::patch::tree::SlotNode;

const VOID_TAGS: [&str; 2] = ["img", "br"];

/// Serialize a slot subtree to HTML.
pub fn render_html(node: &SlotNode) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &SlotNode, out: &mut String) {
    out.push('<');
    out.push_str(&node.tag);
    for (key, value) in &node.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(value));
        out.push('"');
    }
    if !node.styles.is_empty() {
        let style = node
            .styles
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("; ");
        out.push_str(" style=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(&style));
        out.push('"');
    }
    out.push('>');

    if VOID_TAGS.contains(&node.tag.as_str()) {
        return;
    }

    out.push_str(&html_escape::encode_text(&node.text));
    for child in &node.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&node.tag);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::tree::{SLOT_ID_ATTR, SlotPatch, apply_content, ensure_inner_wrapper};

    #[test]
    fn renders_nested_wrapper_structure() {
        let mut outer = SlotNode::new("span").with_attr(SLOT_ID_ATTR, "s1");
        let idx = ensure_inner_wrapper(&mut outer);
        apply_content(&mut outer.children[idx], &SlotPatch::Text("hi".into()));
        assert_eq!(
            render_html(&outer),
            "<span data-flux-id=\"s1\"><span data-flux-slot-inner=\"\">hi</span></span>"
        );
    }

    #[test]
    fn text_content_is_escaped() {
        let mut n = SlotNode::new("span");
        n.text = "<b>&".to_string();
        let html = render_html(&n);
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn img_is_void_and_attrs_escaped() {
        let n = SlotNode::new("img")
            .with_attr("src", "a.png")
            .with_attr("alt", "say \"hi\"");
        let html = render_html(&n);
        assert!(html.starts_with("<img "));
        assert!(!html.contains("</img>"));
        assert!(html.contains("&quot;hi&quot;"));
    }

    #[test]
    fn styles_render_sorted_and_inline() {
        let mut n = SlotNode::new("span");
        n.set_style("position", "relative");
        n.set_style("min-width", "12px");
        assert!(render_html(&n).contains("style=\"min-width: 12px; position: relative\""));
    }
}
