//! A lightweight, browser-less engine that fetches HTML over HTTP.
//!
//! Pages are loaded with a plain HTTP GET and the response body is the
//! document. No JavaScript runs, so this engine renders exactly what the
//! server sends: fine for sites whose links are present in the served
//! markup, and for exercising the crawl without a browser.

use std::time::Duration;

use log::warn;
use reqwest::blocking::Client;

use crate::{Engine, EngineConfig, Error, Page, Result};

/// Engine backed by a shared HTTP client.
pub struct SimpleEngine {
    client: Client,
    config: EngineConfig,
}

/// A page of a [`SimpleEngine`]: the last fetched document.
pub struct SimplePage {
    client: Client,
    config: EngineConfig,
    last_html: Option<String>,
    last_url: Option<String>,
}

impl Engine for SimpleEngine {
    type Page = SimplePage;

    fn new(config: EngineConfig) -> Result<Self>
    where
        Self: Sized,
    {
        if config.enable_javascript {
            warn!("SimpleEngine does not run JavaScript; pages are rendered as served");
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn new_page(&mut self) -> Result<SimplePage> {
        Ok(SimplePage {
            client: self.client.clone(),
            config: self.config.clone(),
            last_html: None,
            last_url: None,
        })
    }

    fn close(self) -> Result<()> {
        Ok(())
    }
}

impl SimplePage {
    /// URL of the last loaded document.
    pub fn url(&self) -> Option<&str> {
        self.last_url.as_deref()
    }
}

impl Page for SimplePage {
    fn load_url(&mut self, url: &str) -> Result<()> {
        let res = self
            .client
            .get(url)
            .header("User-Agent", self.config.user_agent.clone())
            .send()
            .map_err(|e| Error::LoadError(format!("Failed to fetch {}: {}", url, e)))?;

        if !res.status().is_success() {
            return Err(Error::LoadError(format!("{} answered with status {}", url, res.status())));
        }

        let body = res
            .text()
            .map_err(|e| Error::LoadError(format!("Failed to read response body: {}", e)))?;

        self.last_html = Some(body);
        self.last_url = Some(url.to_string());
        Ok(())
    }

    fn content(&self) -> Result<String> {
        self.last_html
            .clone()
            .ok_or_else(|| Error::RenderError("No document loaded".into()))
    }

    fn close(self) -> Result<()> {
        Ok(())
    }
}
