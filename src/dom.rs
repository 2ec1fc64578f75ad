//! Script-free DOM used for all markup-level rewrites.
//!
//! A [`Document`] is a parsed HTML document that can be queried with CSS
//! selectors, mutated in place and serialized back. Parsing never runs
//! scripts, so inspecting or rewriting markup has no side effects. Each
//! document is an independent context that is released when dropped.

use ego_tree::{NodeId, NodeMut, NodeRef};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::{Error, Result};

/// Parse a CSS selector, mapping failures to [`Error::SelectorError`].
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::SelectorError {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Values of `attr` on every element of `content` matching `selector`.
pub fn attribute_values(content: &str, selector: &str, attr: &str) -> Result<Vec<String>> {
    let selector = parse_selector(selector)?;
    let document = Document::parse(content);
    let values = document
        .attached(&selector)
        .filter_map(|el| el.value().attr(attr).map(str::to_string))
        .collect();
    Ok(values)
}

/// A mutable HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse a complete HTML document.
    pub fn parse(content: &str) -> Self {
        Self {
            html: Html::parse_document(content),
        }
    }

    /// Elements reachable from the document root that match `selector`.
    ///
    /// `Html::select` scans the whole node arena, which still holds detached
    /// subtrees, so queries walk down from the root instead.
    fn attached<'s>(&'s self, selector: &'s Selector) -> impl Iterator<Item = ElementRef<'s>> + 's {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(move |el| selector.matches(el))
    }

    /// Ids of all attached elements matching `selector`, in document order.
    pub fn select_ids(&self, selector: &Selector) -> Vec<NodeId> {
        self.attached(selector).map(|el| el.id()).collect()
    }

    /// First attached element matching `selector`.
    pub fn select_first(&self, selector: &Selector) -> Option<NodeId> {
        self.attached(selector).next().map(|el| el.id())
    }

    /// Number of attached elements matching `selector`.
    pub fn count(&self, selector: &Selector) -> usize {
        self.attached(selector).count()
    }

    fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }

    /// Lower-case tag name of the element `id`.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.value().name())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.value().attr(name))
    }

    /// Set attribute `name` on element `id`, replacing any existing value.
    ///
    /// New attributes are appended after the existing ones.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            if let Node::Element(el) = node.value() {
                if let Some(existing) = el.attrs.iter_mut().find(|(k, _)| &*k.local == name) {
                    *existing.1 = value.into();
                    return;
                }
                // Attribute names live in the null namespace.
                let mut key = el.name.clone();
                key.prefix = None;
                key.ns = "".into();
                key.local = name.into();
                el.attrs.insert(key, value.into());
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            if let Node::Element(el) = node.value() {
                el.attrs.retain(|k, _| &*k.local != name);
            }
        }
    }

    /// Detach node `id` (and its subtree) from the document.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.detach();
        }
    }

    /// Outer HTML of element `id`.
    pub fn outer_html(&self, id: NodeId) -> Option<String> {
        self.element(id).map(|el| el.html())
    }

    /// Outer HTML of the first element matching `selector`.
    pub fn outer_html_of(&self, selector: &Selector) -> Option<String> {
        self.attached(selector).next().map(|el| el.html())
    }

    /// Replace node `target` with a deep copy of node `source` taken from
    /// another document. Returns the id of the inserted copy.
    pub fn replace_with_copy(
        &mut self,
        target: NodeId,
        from: &Document,
        source: NodeId,
    ) -> Result<NodeId> {
        let source = from
            .html
            .tree
            .get(source)
            .ok_or_else(|| Error::RenderError("source node is not part of its document".into()))?;
        let copied = {
            let mut anchor = self
                .html
                .tree
                .get_mut(target)
                .ok_or_else(|| Error::RenderError("target node is not part of the document".into()))?;
            let inserted = anchor.insert_before(source.value().clone());
            let id = inserted.id();
            copy_children(inserted, source);
            id
        };
        self.detach(target);
        Ok(copied)
    }

    /// Replace node `target` by moving node `replacement` (which may be
    /// detached) into its position.
    pub fn replace_with_node(&mut self, target: NodeId, replacement: NodeId) -> Result<()> {
        if target == replacement {
            return Ok(());
        }
        let mut anchor = self
            .html
            .tree
            .get_mut(target)
            .ok_or_else(|| Error::RenderError("target node is not part of the document".into()))?;
        anchor.insert_id_before(replacement);
        anchor.detach();
        Ok(())
    }

    /// Serialize the document, doctype included.
    pub fn html(&self) -> String {
        let mut out = String::new();
        for child in self.html.tree.root().children() {
            match child.value() {
                Node::Doctype(doctype) => {
                    out.push_str("<!DOCTYPE ");
                    out.push_str(doctype.name());
                    match (doctype.public_id(), doctype.system_id()) {
                        ("", "") => {}
                        ("", system) => {
                            out.push_str(&format!(" SYSTEM \"{}\"", system));
                        }
                        (public, "") => {
                            out.push_str(&format!(" PUBLIC \"{}\"", public));
                        }
                        (public, system) => {
                            out.push_str(&format!(" PUBLIC \"{}\" \"{}\"", public, system));
                        }
                    }
                    out.push('>');
                }
                Node::Comment(comment) => {
                    out.push_str("<!--");
                    out.push_str(comment);
                    out.push_str("-->");
                }
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(child) {
                        out.push_str(&el.html());
                    }
                }
                _ => {}
            }
        }
        out
    }
}

fn copy_children(mut dest: NodeMut<'_, Node>, source: NodeRef<'_, Node>) {
    for child in source.children() {
        let appended = dest.append(child.value().clone());
        copy_children(appended, child);
    }
}
