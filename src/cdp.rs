//! Chrome DevTools Protocol adapter implementation

use std::sync::Arc;
use std::time::Duration;

use headless_chrome::browser::tab::Tab;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, warn};

use crate::{Engine, EngineConfig, Error, Page, Result};

/// CDP-based headless engine implementation (uses the `headless_chrome` crate)
///
/// This adapter launches a headless Chrome instance; every page context is
/// a separate tab.
pub struct CdpEngine {
    browser: Browser,
    config: EngineConfig,
}

/// A Chrome tab driven over CDP.
pub struct CdpPage {
    tab: Arc<Tab>,
    config: EngineConfig,
}

impl Engine for CdpEngine {
    type Page = CdpPage;

    fn new(config: EngineConfig) -> Result<Self>
    where
        Self: Sized,
    {
        // Configure headless Chrome launch options
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .window_size(Some((config.viewport.width, config.viewport.height)))
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        Ok(Self { browser, config })
    }

    fn new_page(&mut self) -> Result<CdpPage> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;

        tab.set_default_timeout(Duration::from_millis(self.config.timeout_ms));

        tab.set_user_agent(&self.config.user_agent, None, None)
            .map_err(|e| Error::InitializationError(format!("Failed to set user agent: {}", e)))?;

        if !self.config.enable_javascript {
            use headless_chrome::protocol::cdp::Emulation::SetScriptExecutionDisabled;
            tab.call_method(SetScriptExecutionDisabled { value: true })
                .map_err(|e| Error::InitializationError(format!("Failed to disable JavaScript: {}", e)))?;
        }

        Ok(CdpPage {
            tab,
            config: self.config.clone(),
        })
    }

    fn close(self) -> Result<()> {
        // Dropping the browser terminates the Chrome child process.
        drop(self.browser);
        Ok(())
    }
}

impl Page for CdpPage {
    fn load_url(&mut self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| Error::LoadError(format!("Navigation to {} failed: {}", url, e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::LoadError(format!("Wait for navigation failed: {}", e)))?;

        // Give the app time to render
        std::thread::sleep(Duration::from_millis(self.config.settle_ms));
        debug!("Loaded {}", url);
        Ok(())
    }

    fn content(&self) -> Result<String> {
        self.tab
            .get_content()
            .map_err(|e| Error::RenderError(format!("Failed to serialize document: {}", e)))
    }

    /// Query the live DOM rather than the serialized markup.
    fn attribute_values(&self, selector: &str, attr: &str) -> Result<Vec<String>> {
        if !self.config.enable_javascript {
            return crate::dom::attribute_values(&self.content()?, selector, attr);
        }

        let script = format!(
            "JSON.stringify(Array.from(document.querySelectorAll({}), e => e.getAttribute({})).filter(v => v !== null))",
            serde_json::to_string(selector).unwrap_or_default(),
            serde_json::to_string(attr).unwrap_or_default(),
        );
        let result = self
            .tab
            .evaluate(&script, false)
            .map_err(|e| Error::ScriptError(format!("Attribute query failed: {}", e)))?;

        match result.value {
            Some(serde_json::Value::String(json)) => serde_json::from_str(&json)
                .map_err(|e| Error::ScriptError(format!("Malformed attribute list: {}", e))),
            other => Err(Error::ScriptError(format!("Unexpected attribute query result: {:?}", other))),
        }
    }

    fn close(self) -> Result<()> {
        if let Err(e) = self.tab.close(false) {
            warn!("Failed to close tab: {}", e);
        }
        Ok(())
    }
}
