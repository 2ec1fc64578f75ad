//! SPA prerenderer
//!
//! Statically renders a single-page application into a tree of standalone
//! HTML files. A headless engine loads each route of the app from a local
//! server, in-app links are followed to discover further routes, and every
//! rendered page is spliced back into the app's template shell so it can be
//! served without running any JavaScript.
//!
//! # Features
//!
//! - **simple** (default): HTTP-fetch engine, no JavaScript execution
//! - **cdp**: headless Chrome via the Chrome DevTools Protocol
//!
//! # Example
//!
//! ```no_run
//! use spa_prerender::Settings;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load("prerender.conf.json")?;
//! let report = spa_prerender::prerender(&settings)?;
//! println!("Rendered {} pages", report.rendered.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod crawl;
pub mod dom;
pub mod harvest;
pub mod route;
pub mod server;
pub mod settings;
pub mod splice;
pub mod template;

#[cfg(feature = "cdp")]
pub mod cdp;

// HTTP-fetch engine (no JS)
#[cfg(feature = "simple")]
pub mod simple;

pub use crawl::{prerender_with, CrawlReport, CrawlState};
pub use settings::Settings;

/// Configuration for the headless engine
///
/// # Examples
///
/// ```
/// let cfg = spa_prerender::EngineConfig::default();
/// assert!(cfg.user_agent.contains("Prerender"));
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// User agent string to send with requests
    pub user_agent: String,
    /// Viewport dimensions
    pub viewport: Viewport,
    /// Timeout for page loads in milliseconds
    pub timeout_ms: u64,
    /// Whether the app's JavaScript runs when a page is loaded
    pub enable_javascript: bool,
    /// Time given to the app to render after navigation, in milliseconds
    pub settle_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) Prerender/0.1".to_string(),
            viewport: Viewport::default(),
            timeout_ms: 30000,
            enable_javascript: true,
            settle_ms: 500,
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 900,
        }
    }
}

/// A headless engine able to open isolated page contexts
pub trait Engine {
    /// Page context type handed out by this engine
    type Page: Page;

    /// Create a new engine instance with the given configuration
    fn new(config: EngineConfig) -> Result<Self>
    where
        Self: Sized;

    /// Open a fresh page context
    fn new_page(&mut self) -> Result<Self::Page>;

    /// Close the engine and clean up resources
    fn close(self) -> Result<()>;
}

/// A single page context inside an [`Engine`]
pub trait Page {
    /// Load a URL and wait for the page to be ready
    fn load_url(&mut self, url: &str) -> Result<()>;

    /// Serialized HTML of the current document
    fn content(&self) -> Result<String>;

    /// Values of `attr` on every element matching `selector` in the current
    /// document. The default implementation queries the serialized content;
    /// backends with a live DOM may override this.
    fn attribute_values(&self, selector: &str, attr: &str) -> Result<Vec<String>> {
        dom::attribute_values(&self.content()?, selector, attr)
    }

    /// Close the page context
    fn close(self) -> Result<()>;
}

/// Create a new engine instance with the default backend
///
/// The CDP backend is preferred when the `cdp` feature is enabled since it
/// runs the app's JavaScript. Otherwise the `SimpleEngine` is used.
#[cfg(feature = "cdp")]
pub fn new_engine(config: EngineConfig) -> Result<impl Engine> {
    cdp::CdpEngine::new(config)
}

#[cfg(all(not(feature = "cdp"), feature = "simple"))]
pub fn new_engine(config: EngineConfig) -> Result<impl Engine> {
    simple::SimpleEngine::new(config)
}

/// Prerender the site described by `settings` with the default engine.
#[cfg(any(feature = "cdp", feature = "simple"))]
pub fn prerender(settings: &Settings) -> Result<CrawlReport> {
    let engine = new_engine(EngineConfig::default())?;
    prerender_with(engine, settings)
}

/// Engine backends selectable at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Headless Chrome over CDP (`cdp` feature); runs the app
    Chrome,
    /// Plain HTTP fetch (`simple` feature); pages are rendered as served
    Http,
}

impl Backend {
    /// Whether the backend executes the app's JavaScript.
    pub fn runs_javascript(self) -> bool {
        matches!(self, Backend::Chrome)
    }

    /// Whether this build carries the backend.
    pub fn is_available(self) -> bool {
        match self {
            Backend::Chrome => cfg!(feature = "cdp"),
            Backend::Http => cfg!(feature = "simple"),
        }
    }
}

impl Default for Backend {
    /// The backend [`new_engine`] picks.
    fn default() -> Self {
        if cfg!(feature = "cdp") {
            Backend::Chrome
        } else {
            Backend::Http
        }
    }
}

/// Prerender the site described by `settings` with an explicitly chosen backend.
pub fn prerender_using(backend: Backend, config: EngineConfig, settings: &Settings) -> Result<CrawlReport> {
    match backend {
        Backend::Chrome => prerender_chrome(config, settings),
        Backend::Http => prerender_http(config, settings),
    }
}

#[cfg(feature = "cdp")]
fn prerender_chrome(config: EngineConfig, settings: &Settings) -> Result<CrawlReport> {
    prerender_with(cdp::CdpEngine::new(config)?, settings)
}

#[cfg(not(feature = "cdp"))]
fn prerender_chrome(_config: EngineConfig, _settings: &Settings) -> Result<CrawlReport> {
    Err(Error::InitializationError(
        "the Chrome backend needs the `cdp` feature".into(),
    ))
}

#[cfg(feature = "simple")]
fn prerender_http(config: EngineConfig, settings: &Settings) -> Result<CrawlReport> {
    prerender_with(simple::SimpleEngine::new(config)?, settings)
}

#[cfg(not(feature = "simple"))]
fn prerender_http(_config: EngineConfig, _settings: &Settings) -> Result<CrawlReport> {
    Err(Error::InitializationError(
        "the HTTP backend needs the `simple` feature".into(),
    ))
}
