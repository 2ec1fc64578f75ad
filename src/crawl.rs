//! The crawl: discover routes by following links and write one static file
//! per route.
//!
//! Starting from the seed route, each pending route is loaded through the
//! local site server, its links are harvested into the worklist, and the
//! rendered page is spliced into the template shell and written to disk.
//! Routes are processed one at a time until no pending route is left.
//!
//! The page whose output file is the template file itself is held back
//! until the end of the crawl, since the template keeps being served for
//! routes that are still pending.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;

use crate::harvest::harvest_links;
use crate::route::OutputLayout;
use crate::server::StaticServer;
use crate::settings::Settings;
use crate::splice::splice;
use crate::template::Template;
use crate::{Engine, Error, Page, Result};

/// Worklist state of one crawl.
///
/// Every known route is either pending or visited, never both. `queue`
/// keeps discovery order and may hold routes visited out of turn; those
/// are dropped once they reach the front, so the front is always pending.
#[derive(Debug, Clone, Default)]
pub struct CrawlState {
    queue: VecDeque<String>,
    pending: HashSet<String>,
    visited: HashSet<String>,
}

impl CrawlState {
    /// State with only `seed` pending.
    pub fn new(seed: impl Into<String>) -> Self {
        let mut state = Self::default();
        state.discover(seed);
        state
    }

    /// Next route to render, if any. Routes come out in discovery order.
    pub fn next_pending(&self) -> Option<&str> {
        self.queue.front().map(String::as_str)
    }

    /// Add `route` to the worklist unless it is already known.
    /// Returns whether the route was new.
    pub fn discover(&mut self, route: impl Into<String>) -> bool {
        let route = route.into();
        if self.is_known(&route) {
            return false;
        }
        self.pending.insert(route.clone());
        self.queue.push_back(route);
        true
    }

    /// Move `route` to the visited set, from pending or from nowhere.
    pub fn mark_visited(&mut self, route: &str) {
        self.pending.remove(route);
        self.visited.insert(route.to_string());
        while self
            .queue
            .front()
            .is_some_and(|front| !self.pending.contains(front))
        {
            self.queue.pop_front();
        }
    }

    pub fn is_pending(&self, route: &str) -> bool {
        self.pending.contains(route)
    }

    pub fn is_visited(&self, route: &str) -> bool {
        self.visited.contains(route)
    }

    pub fn is_known(&self, route: &str) -> bool {
        self.is_visited(route) || self.is_pending(route)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_done(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Outcome of a successful crawl.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlReport {
    /// Routes in the order they were rendered
    pub rendered: Vec<String>,
    /// Files written during the crawl, the template file included
    pub files: Vec<PathBuf>,
    /// The template file
    pub template_file: PathBuf,
    /// Whether the template file now holds the rendered seed page
    pub seed_rendered: bool,
}

/// Prerender the site described by `settings` using `engine`.
///
/// Any failure aborts the crawl. The engine and the site server are shut
/// down and the original template content is put back before the error is
/// returned.
pub fn prerender_with<E: Engine>(engine: E, settings: &Settings) -> Result<CrawlReport> {
    settings.validate()?;

    let template_file = settings.template_file();
    let original = fs::read_to_string(&template_file).map_err(|e| Error::io(&template_file, e))?;
    let template = Template::capture(original)?;

    // Requests for the template path itself are answered from disk, so the
    // tagged shell has to be there too.
    fs::write(&template_file, template.tagged()).map_err(|e| Error::io(&template_file, e))?;

    let outcome = crawl_site(engine, settings, &template);

    match outcome {
        Ok(mut crawl) => {
            let seed_rendered = crawl.seed_render.is_some();
            let content = template.finalize(crawl.seed_render.take());
            fs::write(&template_file, content).map_err(|e| Error::io(&template_file, e))?;
            if seed_rendered {
                info!("Overwrite seed template: {}", template_file.display());
            } else {
                info!(
                    "Seed template is not a (linked) page, restored original content: {}",
                    template_file.display()
                );
            }

            let mut report = crawl.report;
            report.files.push(template_file.clone());
            report.template_file = template_file;
            report.seed_rendered = seed_rendered;
            Ok(report)
        }
        Err(e) => {
            if let Err(restore) = fs::write(&template_file, template.original()) {
                warn!("Failed to restore template {}: {}", template_file.display(), restore);
            }
            Err(e)
        }
    }
}

struct Crawl {
    report: CrawlReport,
    seed_render: Option<String>,
}

/// Start the server, run the worklist to completion and release the page,
/// engine and server in that order, whatever the outcome.
fn crawl_site<E: Engine>(mut engine: E, settings: &Settings, template: &Template) -> Result<Crawl> {
    let server = StaticServer::start(
        &settings.root,
        Arc::new(template.tagged().to_string()),
        settings.port,
    )?;

    let crawler = Crawler {
        host: server.host(),
        origins: server.origins(),
        layout: OutputLayout::new(
            &settings.root,
            settings.html_suffix.as_deref(),
            settings.directory_index.as_deref(),
        ),
        template_file: settings.template_file(),
        template: template.tagged(),
        bootstrap: settings.bootstrap_selector(),
        app_id: settings.app_id.as_deref(),
    };

    let outcome = engine.new_page().and_then(|mut page| {
        let mut state = CrawlState::new(settings.seed.as_str());
        let result = crawler.run(&mut page, &mut state);
        let closed = page.close();
        result.and_then(|crawl| closed.map(|_| crawl))
    });
    let closed = engine.close();
    drop(server);

    let crawl = outcome?;
    closed?;
    Ok(crawl)
}

struct Crawler<'a> {
    host: String,
    origins: Vec<String>,
    layout: OutputLayout,
    template_file: PathBuf,
    template: &'a str,
    bootstrap: &'a str,
    app_id: Option<&'a str>,
}

impl Crawler<'_> {
    fn run<P: Page>(&self, page: &mut P, state: &mut CrawlState) -> Result<Crawl> {
        let mut crawl = Crawl {
            report: CrawlReport::default(),
            seed_render: None,
        };

        while let Some(route) = state.next_pending().map(str::to_string) {
            self.render_route(page, &route, state, &mut crawl)
                .map_err(|e| Error::crawl(route.as_str(), e))?;

            state.mark_visited(&route);
            if let Some(alias) = self.layout.alias_of(&route) {
                state.mark_visited(&alias);
            }
            crawl.report.rendered.push(route);
        }

        Ok(crawl)
    }

    fn render_route<P: Page>(
        &self,
        page: &mut P,
        route: &str,
        state: &mut CrawlState,
        crawl: &mut Crawl,
    ) -> Result<()> {
        page.load_url(&format!("{}/{}", self.host, route))?;
        let content = page.content()?;

        for link in harvest_links(page, route, &self.origins)? {
            if state.discover(link.as_str()) {
                debug!("Discovered {} on {}", link, route);
            }
        }

        let html = splice(&content, self.template, self.bootstrap, self.app_id)?;

        let file = self.layout.file_for(route);
        if let Some(dir) = file.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }

        if same_file(&file, &self.template_file) {
            info!("Rendered: {} (not written yet since this is also the seed template)", file.display());
            crawl.seed_render = Some(html);
        } else {
            fs::write(&file, html).map_err(|e| Error::io(&file, e))?;
            info!("Rendered: {}", file.display());
            crawl.report.files.push(file);
        }
        Ok(())
    }
}

/// Case-insensitive comparison of two paths after lexically resolving `.`
/// and `..` components.
fn same_file(a: &Path, b: &Path) -> bool {
    lexical_key(a) == lexical_key(b)
}

fn lexical_key(path: &Path) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir if parts.last().is_some_and(|p| p != "..") => {
                parts.pop();
            }
            other => parts.push(other.as_os_str().to_string_lossy().to_lowercase()),
        }
    }
    parts
}
