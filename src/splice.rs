//! Turns a rendered page into a static artifact consistent with the template.
//!
//! Two independent rewrites are applied to the serialized page:
//!
//! - [`rewrite_head`] keeps template head elements (dropping their
//!   provenance marker) and app-owned `<style>` elements, and removes
//!   everything else the app injected at runtime.
//! - [`rewrite_body`] puts the template's `<body>` shell back in place and
//!   swaps the shell's bootstrap element for the rendered one.

use log::warn;

use crate::dom::{parse_selector, Document};
use crate::template::{HEAD_CHILDREN, PROVENANCE_ATTR, PROVENANCE_VALUE};
use crate::Result;

/// Attribute carrying the app id on styles the app rendered.
pub const TRANSITION_ATTR: &str = "ng-transition";

/// Run the head rewrite then the body rewrite on `content`.
pub fn splice(
    content: &str,
    template: &str,
    bootstrap: &str,
    app_id: Option<&str>,
) -> Result<String> {
    let content = rewrite_head(content, app_id)?;
    rewrite_body(&content, template, bootstrap)
}

/// Prune the `<head>` of `content` to template markup plus app styles.
pub fn rewrite_head(content: &str, app_id: Option<&str>) -> Result<String> {
    let selector = parse_selector(HEAD_CHILDREN)?;
    let app_id = app_id.filter(|id| !id.is_empty());
    let mut doc = Document::parse(content);

    for id in doc.select_ids(&selector) {
        if doc.attr(id, PROVENANCE_ATTR) == Some(PROVENANCE_VALUE) {
            doc.remove_attr(id, PROVENANCE_ATTR);
        } else if let (Some("style"), Some(app_id)) = (doc.tag_name(id), app_id) {
            doc.set_attr(id, TRANSITION_ATTR, app_id);
        } else {
            doc.detach(id);
        }
    }

    Ok(doc.html())
}

/// Replace the `<body>` of `content` with the template's body shell, keeping
/// the rendered subtree of the element matched by `bootstrap`.
pub fn rewrite_body(content: &str, template: &str, bootstrap: &str) -> Result<String> {
    let bootstrap_sel = parse_selector(bootstrap)?;
    let body_sel = parse_selector("body")?;
    let head_sel = parse_selector("head")?;

    let shell = Document::parse(template);
    let mut page = Document::parse(content);

    let rendered_app = page.select_first(&bootstrap_sel);
    let heads = page.count(&head_sel);

    if let (Some(page_body), Some(shell_body)) =
        (page.select_first(&body_sel), shell.select_first(&body_sel))
    {
        page.replace_with_copy(page_body, &shell, shell_body)?;
    }

    for extra in page.select_ids(&head_sel).into_iter().skip(heads) {
        page.detach(extra);
    }

    match (rendered_app, page.select_first(&bootstrap_sel)) {
        (Some(app), Some(placeholder)) => page.replace_with_node(placeholder, app)?,
        (None, _) => warn!("No element matches bootstrap selector '{}' in rendered page", bootstrap),
        (Some(_), None) => warn!("Template body has no element matching '{}'", bootstrap),
    }

    Ok(page.html())
}
