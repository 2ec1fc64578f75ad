//! Routes: link normalization and the route → output file mapping.
//!
//! A route is a site-relative path without leading slash, scheme or
//! fragment, e.g. `"index.html"`, `"docs/"` or `"a/b/page"`.

use std::path::{Path, PathBuf};

/// Resolve `link` (as found on the page at `current`) to a route.
///
/// Links starting with `/` are taken from the site root. Anything else is
/// resolved against the directory of `current`, where every leading `../`
/// pops one directory (never above the root). Interior `..` and `./`
/// segments are left untouched.
pub fn normalize(current: &str, link: &str) -> String {
    if link.starts_with('/') {
        return link.trim_start_matches('/').to_string();
    }

    let mut dir = parent_dir(current);
    let mut link = link;
    while let Some(rest) = link.strip_prefix("../") {
        dir = parent_dir(dir);
        link = rest;
    }

    if dir.is_empty() {
        link.to_string()
    } else {
        format!("{}/{}", dir, link)
    }
}

fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// The other spelling of `route` with its trailing slash toggled.
pub fn toggle_trailing_slash(route: &str) -> String {
    match route.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => format!("{}/", route),
    }
}

/// Where rendered routes land on disk.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    html_suffix: String,
    directory_index: Option<String>,
}

impl OutputLayout {
    pub fn new(
        root: impl Into<PathBuf>,
        html_suffix: Option<&str>,
        directory_index: Option<&str>,
    ) -> Self {
        Self {
            root: root.into(),
            html_suffix: html_suffix.unwrap_or_default().to_string(),
            directory_index: directory_index.map(str::to_string),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Output file for `route`.
    ///
    /// Directory routes (`""` or ending in `/`) go to the directory index
    /// when one is configured, otherwise to the directory name plus the
    /// html suffix (`a/b/` → `a/b.html`).
    pub fn file_for(&self, route: &str) -> PathBuf {
        if route.is_empty() || route.ends_with('/') {
            match &self.directory_index {
                Some(index) => self.root.join(route).join(index),
                None => {
                    let dir = route.strip_suffix('/').unwrap_or(route);
                    self.root.join(format!("{}{}", dir, self.html_suffix))
                }
            }
        } else {
            self.root.join(format!("{}{}", route, self.html_suffix))
        }
    }

    /// Route that renders to the same file as `route`, if any.
    ///
    /// Without a directory index `a/b` and `a/b/` share one output file.
    pub fn alias_of(&self, route: &str) -> Option<String> {
        if self.directory_index.is_some() {
            return None;
        }
        Some(toggle_trailing_slash(route))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_links_are_taken_from_root() {
        assert_eq!(normalize("dir/page.html", "/about"), "about");
        assert_eq!(normalize("dir/page.html", "///a/b/"), "a/b/");
        assert_eq!(normalize("", "/"), "");
    }

    #[test]
    fn relative_links_resolve_against_current_directory() {
        assert_eq!(normalize("index.html", "link1.html"), "link1.html");
        assert_eq!(normalize("link1.html", "dir1/dir2/dir3/link3.html"), "dir1/dir2/dir3/link3.html");
        assert_eq!(normalize("docs/", "intro"), "docs/intro");
        assert_eq!(normalize("docs/guide", "intro"), "docs/intro");
    }

    #[test]
    fn leading_parent_segments_pop_directories() {
        let page = "dir1/dir2/dir3/link3.html";
        assert_eq!(normalize(page, "../../link5.html"), "dir1/link5.html");
        assert_eq!(normalize(page, "../../../link4.html"), "link4.html");
    }

    #[test]
    fn parent_segments_clamp_at_root() {
        assert_eq!(normalize("dir1/dir2/dir3/link3.html", "../../../../../link4.html"), "link4.html");
        assert_eq!(normalize("index.html", "../x"), "x");
    }

    #[test]
    fn interior_segments_are_not_resolved() {
        assert_eq!(normalize("a/page", "b/../c"), "a/b/../c");
        assert_eq!(normalize("a/page", "./c"), "a/./c");
    }

    #[test]
    fn normalized_routes_are_stable_from_root() {
        let cases = [
            ("dir1/dir2/dir3/link3.html", "../../link5.html"),
            ("docs/", "intro"),
            ("x/y", "/abs/"),
            ("index.html", "../../up"),
        ];
        for (current, link) in cases {
            let route = normalize(current, link);
            assert_eq!(normalize("", &route), route);
        }
    }

    #[test]
    fn file_without_directory_index_uses_suffix() {
        let layout = OutputLayout::new("/site", Some(".html"), None);
        assert_eq!(layout.file_for("a/b/"), PathBuf::from("/site/a/b.html"));
        assert_eq!(layout.file_for("a/b"), PathBuf::from("/site/a/b.html"));
        assert_eq!(layout.file_for(""), PathBuf::from("/site/.html"));
    }

    #[test]
    fn file_with_directory_index() {
        let layout = OutputLayout::new("/site", Some(".html"), Some("index.html"));
        assert_eq!(layout.file_for("a/b/"), PathBuf::from("/site/a/b/index.html"));
        assert_eq!(layout.file_for(""), PathBuf::from("/site/index.html"));
        assert_eq!(layout.file_for("a/b"), PathBuf::from("/site/a/b.html"));
    }

    #[test]
    fn file_without_suffix() {
        let layout = OutputLayout::new("/site", None, None);
        assert_eq!(layout.file_for("index.html"), PathBuf::from("/site/index.html"));
        assert_eq!(layout.file_for("docs/"), PathBuf::from("/site/docs"));
    }

    #[test]
    fn aliases_only_without_directory_index() {
        let layout = OutputLayout::new("/site", None, None);
        assert_eq!(layout.alias_of("a/b").as_deref(), Some("a/b/"));
        assert_eq!(layout.alias_of("a/b/").as_deref(), Some("a/b"));

        let indexed = OutputLayout::new("/site", None, Some("index.html"));
        assert!(indexed.alias_of("a/b").is_none());
    }
}
