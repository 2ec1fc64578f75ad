//! Link harvesting: turn the hrefs of a rendered page into candidate routes.

use std::sync::OnceLock;

use regex::Regex;

use crate::route::normalize;
use crate::{Page, Result};

/// Elements whose `href` is followed.
pub const LINK_SELECTOR: &str = "a[href]";

fn scheme_prefix() -> &'static Regex {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    SCHEME.get_or_init(|| Regex::new(r"^\s*[a-zA-Z]+\s*:").expect("scheme pattern is valid"))
}

/// Reduce a raw href to an in-site link, or `None` when it should not be
/// followed (other sites, other schemes, pure fragments, empty values).
///
/// `origins` are the `scheme://host[:port]` spellings the site is served
/// from; links starting with one of them are treated as absolute-from-root.
pub fn site_link(raw: &str, origins: &[String]) -> Option<String> {
    let trimmed = raw.trim();
    let mut link = origins
        .iter()
        .find_map(|origin| strip_origin(trimmed, origin))
        .unwrap_or(trimmed);
    if let Some(idx) = link.find('#') {
        link = &link[..idx];
    }
    if link.contains("://") || scheme_prefix().is_match(link) {
        return None;
    }
    let link = link.trim();
    if link.is_empty() {
        None
    } else {
        Some(link.to_string())
    }
}

fn strip_origin<'a>(link: &'a str, origin: &str) -> Option<&'a str> {
    let rest = link.strip_prefix(origin)?;
    (rest.is_empty() || rest.starts_with(['/', '?', '#'])).then_some(rest)
}

/// Routes reachable from the page currently loaded in `page`, which is
/// displaying `current`. Routes are returned once each, in document order.
pub fn harvest_links<P: Page>(page: &P, current: &str, origins: &[String]) -> Result<Vec<String>> {
    let hrefs = page.attribute_values(LINK_SELECTOR, "href")?;
    let mut routes: Vec<String> = Vec::new();
    for route in hrefs
        .iter()
        .filter_map(|href| site_link(href, origins))
        .map(|link| normalize(current, &link))
    {
        if !routes.contains(&route) {
            routes.push(route);
        }
    }
    Ok(routes)
}
