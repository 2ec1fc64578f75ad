//! Crawl tests against an in-memory engine
//!
//! The fake engine plays the part of a browser running the app: every load
//! returns the template currently on disk with the app's markup for that
//! route rendered into the bootstrap element, plus some runtime head
//! injections.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use spa_prerender::template::PROVENANCE_ATTR;
use spa_prerender::{prerender_with, Engine, EngineConfig, Error, Page, Result, Settings};

const TEMPLATE: &str = r#"<!DOCTYPE html><html><head><title>Site</title></head><body><app-root>Loading</app-root><script src="main.js"></script></body></html>"#;

#[derive(Default)]
struct Shared {
    loads: Mutex<Vec<String>>,
    page_closed: AtomicBool,
    engine_closed: AtomicBool,
}

struct FakeEngine {
    root: PathBuf,
    pages: Arc<HashMap<String, String>>,
    shared: Arc<Shared>,
}

struct FakePage {
    root: PathBuf,
    pages: Arc<HashMap<String, String>>,
    shared: Arc<Shared>,
    current: Option<String>,
}

impl FakeEngine {
    /// Engine rendering `pages` (route → app markup) on top of the template
    /// found under `root`.
    fn serving(root: &Path, pages: &[(&str, &str)]) -> (Self, Arc<Shared>) {
        let shared = Arc::new(Shared::default());
        let engine = Self {
            root: root.to_path_buf(),
            pages: Arc::new(
                pages
                    .iter()
                    .map(|(route, html)| (route.to_string(), html.to_string()))
                    .collect(),
            ),
            shared: Arc::clone(&shared),
        };
        (engine, shared)
    }
}

impl Engine for FakeEngine {
    type Page = FakePage;

    fn new(_config: EngineConfig) -> Result<Self> {
        Err(Error::InitializationError("use FakeEngine::serving".into()))
    }

    fn new_page(&mut self) -> Result<FakePage> {
        Ok(FakePage {
            root: self.root.clone(),
            pages: Arc::clone(&self.pages),
            shared: Arc::clone(&self.shared),
            current: None,
        })
    }

    fn close(self) -> Result<()> {
        self.shared.engine_closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl Page for FakePage {
    fn load_url(&mut self, url: &str) -> Result<()> {
        // http://127.0.0.1:port/<route>
        let route = url.splitn(4, '/').nth(3).unwrap_or_default().to_string();
        self.shared.loads.lock().unwrap().push(route.clone());
        if route == "broken" {
            return Err(Error::LoadError(format!("{} answered with status 500", url)));
        }
        self.current = Some(route);
        Ok(())
    }

    fn content(&self) -> Result<String> {
        let route = self
            .current
            .as_deref()
            .ok_or_else(|| Error::RenderError("No document loaded".into()))?;
        let shell = fs::read_to_string(self.root.join("index.html")).unwrap();
        let app = self.pages.get(route).map(String::as_str).unwrap_or("");
        Ok(shell
            .replace(
                "<app-root>Loading</app-root>",
                &format!(r#"<app-root ng-version="5"><h1>{}</h1>{}</app-root>"#, route, app),
            )
            .replace(
                "</head>",
                r#"<style>.x{color:red}</style><script src="chunk.js"></script></head>"#,
            ))
    }

    fn close(self) -> Result<()> {
        self.shared.page_closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), TEMPLATE).unwrap();
    dir
}

fn settings(root: &Path) -> Settings {
    let mut settings = Settings::new(root, vec!["app-root".to_string()]);
    settings.port = 0;
    settings
}

fn loads(shared: &Shared) -> Vec<String> {
    shared.loads.lock().unwrap().clone()
}

fn read(root: &Path, file: &str) -> String {
    fs::read_to_string(root.join(file)).unwrap_or_else(|e| panic!("{}: {}", file, e))
}

#[test]
fn crawl_renders_every_reachable_route_once() {
    let dir = site();
    let root = dir.path();
    let (engine, shared) = FakeEngine::serving(
        root,
        &[
            (
                "index.html",
                r##"<a href="link1.html">1</a><a href="/link2.html">2</a><a href="mailto:me@example.com">m</a><a href="https://example.com/x">x</a><a href="#top">t</a><a href="link1.html#intro">1</a>"##,
            ),
            (
                "link1.html",
                r#"<a href="dir1/dir2/dir3/link3.html">3</a><a href="index.html">home</a>"#,
            ),
            (
                "dir1/dir2/dir3/link3.html",
                r#"<a href="../../link5.html">5</a><a href="../../../link4.html">4</a>"#,
            ),
        ],
    );

    let report = prerender_with(engine, &settings(root)).unwrap();

    let loaded = loads(&shared);
    let unique: HashSet<&String> = loaded.iter().collect();
    assert_eq!(unique.len(), loaded.len(), "a route was loaded twice: {:?}", loaded);
    let expected: HashSet<String> = [
        "index.html",
        "link1.html",
        "link2.html",
        "dir1/dir2/dir3/link3.html",
        "dir1/link5.html",
        "link4.html",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assert_eq!(loaded.iter().cloned().collect::<HashSet<_>>(), expected);
    assert_eq!(loaded[0], "index.html");

    for file in ["link1.html", "link2.html", "dir1/dir2/dir3/link3.html", "dir1/link5.html", "link4.html"] {
        assert!(root.join(file).is_file(), "{} was not written", file);
    }
    assert_eq!(report.rendered.len(), 6);
    assert!(report.seed_rendered);
    assert_eq!(report.template_file, root.join("index.html"));
    assert!(shared.page_closed.load(Ordering::SeqCst));
    assert!(shared.engine_closed.load(Ordering::SeqCst));
}

#[test]
fn seed_page_replaces_template_at_the_end() {
    let dir = site();
    let root = dir.path();
    let (engine, shared) = FakeEngine::serving(
        root,
        &[
            ("index.html", r#"<a href="about.html">about</a>"#),
            ("about.html", ""),
        ],
    );

    prerender_with(engine, &settings(root)).unwrap();

    // The about page was rendered while the template was still the shell.
    assert_eq!(loads(&shared), vec!["index.html", "about.html"]);
    let about = read(root, "about.html");
    assert!(about.contains("<h1>about.html</h1>"));

    let index = read(root, "index.html");
    assert!(index.contains(r#"<app-root ng-version="5"><h1>index.html</h1><a href="about.html">about</a></app-root>"#));
    assert!(index.contains("<title>Site</title>"));
    assert!(index.contains(r#"<script src="main.js"></script>"#));
    assert!(!index.contains(PROVENANCE_ATTR));
    assert!(!index.contains("chunk.js"));
    assert!(!index.contains("<style>"));
}

#[test]
fn app_styles_are_kept_when_app_id_is_set() {
    let dir = site();
    let root = dir.path();
    let (engine, _) = FakeEngine::serving(root, &[("index.html", "")]);
    let mut settings = settings(root);
    settings.app_id = Some("site".to_string());

    prerender_with(engine, &settings).unwrap();

    let index = read(root, "index.html");
    assert!(index.contains(r#"<style ng-transition="site">.x{color:red}</style>"#));
    assert!(!index.contains("chunk.js"));
}

#[test]
fn trailing_slash_aliases_collapse_without_directory_index() {
    let dir = site();
    let root = dir.path();
    let (engine, shared) = FakeEngine::serving(
        root,
        &[("index", r#"<a href="docs">a</a><a href="docs/">b</a><a href="/about">c</a>"#)],
    );
    let mut settings = settings(root);
    settings.seed = "index".to_string();
    settings.html_suffix = Some(".html".to_string());

    let report = prerender_with(engine, &settings).unwrap();

    assert_eq!(loads(&shared), vec!["index", "docs", "about"]);
    assert!(root.join("docs.html").is_file());
    assert!(root.join("about.html").is_file());
    assert!(!root.join("docs").exists());
    assert!(report.seed_rendered);
}

#[test]
fn directory_index_keeps_both_spellings() {
    let dir = site();
    let root = dir.path();
    let (engine, shared) = FakeEngine::serving(
        root,
        &[("index", r#"<a href="docs">a</a><a href="docs/">b</a>"#)],
    );
    let mut settings = settings(root);
    settings.seed = "index".to_string();
    settings.html_suffix = Some(".html".to_string());
    settings.directory_index = Some("index.html".to_string());

    prerender_with(engine, &settings).unwrap();

    assert_eq!(loads(&shared), vec!["index", "docs", "docs/"]);
    assert!(read(root, "docs.html").contains("<h1>docs</h1>"));
    assert!(read(root, "docs/index.html").contains("<h1>docs/</h1>"));
}

#[test]
fn unlinked_template_is_restored() {
    let dir = site();
    let root = dir.path();
    let (engine, _) = FakeEngine::serving(root, &[("start", "")]);
    let mut settings = settings(root);
    settings.seed = "start".to_string();
    settings.html_suffix = Some(".html".to_string());

    let report = prerender_with(engine, &settings).unwrap();

    assert!(!report.seed_rendered);
    assert_eq!(read(root, "index.html"), TEMPLATE);
    assert!(read(root, "start.html").contains("<h1>start</h1>"));
}

#[test]
fn dot_segment_route_to_template_is_held_back() {
    let dir = site();
    let root = dir.path();
    let (engine, shared) = FakeEngine::serving(
        root,
        &[("start", r#"<a href="./index.html">home</a><a href="later">later</a>"#)],
    );
    let mut settings = settings(root);
    settings.seed = "start".to_string();

    let report = prerender_with(engine, &settings).unwrap();

    assert_eq!(loads(&shared), vec!["start", "./index.html", "later"]);
    // The shell was still in place when the last route was rendered.
    assert!(read(root, "later").contains("<h1>later</h1>"));
    assert!(report.seed_rendered);
    assert_eq!(report.files, vec![root.join("start"), root.join("later"), root.join("index.html")]);
    assert!(read(root, "index.html").contains("<h1>./index.html</h1>"));
}

#[test]
fn failed_route_aborts_and_restores_template() {
    let dir = site();
    let root = dir.path();
    let (engine, shared) = FakeEngine::serving(
        root,
        &[("index.html", r#"<a href="ok.html">ok</a><a href="broken">broken</a>"#)],
    );

    let err = prerender_with(engine, &settings(root)).unwrap_err();

    assert_eq!(err.route(), Some("broken"));
    assert!(matches!(err, Error::CrawlError { ref source, .. } if matches!(**source, Error::LoadError(_))));
    assert_eq!(read(root, "index.html"), TEMPLATE);
    assert!(shared.page_closed.load(Ordering::SeqCst));
    assert!(shared.engine_closed.load(Ordering::SeqCst));
}

#[test]
fn missing_template_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, shared) = FakeEngine::serving(dir.path(), &[]);

    let err = prerender_with(engine, &settings(dir.path())).unwrap_err();

    assert!(matches!(err, Error::IoError { .. }));
    assert!(loads(&shared).is_empty());
}
