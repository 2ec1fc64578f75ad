//! Error types for the prerenderer

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for prerender operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading settings or crawling a site
#[derive(Error, Debug)]
pub enum Error {
    /// A settings field is missing or has an invalid value
    #[error("Invalid configuration: {field}: {reason}")]
    ConfigError { field: String, reason: String },

    /// The settings file could not be parsed as JSON
    #[error("Malformed settings: {0}")]
    SettingsParseError(String),

    /// Failed to initialize the engine
    #[error("Engine initialization failed: {0}")]
    InitializationError(String),

    /// Failed to load a URL
    #[error("Failed to load URL: {0}")]
    LoadError(String),

    /// Failed to render or serialize content
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Failed to execute JavaScript
    #[error("Script execution failed: {0}")]
    ScriptError(String),

    /// A CSS selector could not be parsed
    #[error("Invalid selector '{selector}': {message}")]
    SelectorError { selector: String, message: String },

    /// The local site server failed
    #[error("Server error: {0}")]
    ServerError(String),

    /// Filesystem failure, with the file that caused it
    #[error("I/O error on {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A route failed to render; the whole crawl is aborted
    #[error("Failed to prerender route '{route}': {source}")]
    CrawlError {
        route: String,
        #[source]
        source: Box<Error>,
    },

}

impl Error {
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ConfigError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::IoError {
            path: path.into(),
            source,
        }
    }

    /// Attach the failing route to a crawl-time error.
    pub fn crawl(route: impl Into<String>, source: Error) -> Self {
        Error::CrawlError {
            route: route.into(),
            source: Box::new(source),
        }
    }

    /// Route that was being rendered when the crawl failed, if any.
    pub fn route(&self) -> Option<&str> {
        match self {
            Error::CrawlError { route, .. } => Some(route),
            _ => None,
        }
    }
}
