//! Prerender settings: loading and validating `prerender.conf.json`.
//!
//! The settings file is a JSON object with the keys below. Keys that are
//! left out fall back to their defaults; unknown keys are rejected.
//!
//! | key              | type               | default        |
//! |------------------|--------------------|----------------|
//! | `root`           | string             | `"dist"`       |
//! | `template`       | string             | `"index.html"` |
//! | `seed`           | string             | `"index.html"` |
//! | `bootstrap`      | string or [string] | required       |
//! | `appId`          | string             | none           |
//! | `port`           | number             | `8080`         |
//! | `htmlSuffix`     | string             | none           |
//! | `directoryIndex` | string             | none           |

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::dom::parse_selector;
use crate::{Error, Result};

/// Settings file looked up when none is given explicitly.
pub const DEFAULT_CONFIG_FILE: &str = "prerender.conf.json";

const FIELDS: &[&str] = &[
    "root",
    "template",
    "seed",
    "bootstrap",
    "appId",
    "port",
    "htmlSuffix",
    "directoryIndex",
];

/// Validated prerender settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Directory holding the built site
    pub root: PathBuf,
    /// Template file, relative to `root`
    pub template: String,
    /// Route the crawl starts from
    pub seed: String,
    /// Selectors of the elements the app mounts into; the first one is used
    pub bootstrap: Vec<String>,
    /// Identifier put on style elements rendered by the app
    pub app_id: Option<String>,
    /// Port of the local site server (0 picks a free port)
    pub port: u16,
    /// Suffix appended to output file names
    pub html_suffix: Option<String>,
    /// File name used for routes ending in `/`
    pub directory_index: Option<String>,
}

impl Settings {
    /// Settings with default values for everything but the bootstrap selectors.
    pub fn new(root: impl Into<PathBuf>, bootstrap: Vec<String>) -> Self {
        Self {
            root: root.into(),
            template: "index.html".to_string(),
            seed: "index.html".to_string(),
            bootstrap,
            app_id: None,
            port: 8080,
            html_suffix: None,
            directory_index: None,
        }
    }

    /// Read and validate a settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json_str(&text)
    }

    /// Parse and validate settings from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| Error::SettingsParseError(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Validate settings given as a JSON value.
    pub fn from_value(value: &Value) -> Result<Self> {
        let fields = value
            .as_object()
            .ok_or_else(|| Error::SettingsParseError("settings must be a JSON object".into()))?;

        if let Some(unknown) = fields.keys().find(|k| !FIELDS.contains(&k.as_str())) {
            return Err(Error::config(unknown.as_str(), format!("unrecognized field {}", unknown)));
        }

        let settings = Self {
            root: PathBuf::from(string_field(fields, "root")?.unwrap_or_else(|| "dist".into())),
            template: string_field(fields, "template")?.unwrap_or_else(|| "index.html".into()),
            seed: string_field(fields, "seed")?.unwrap_or_else(|| "index.html".into()),
            bootstrap: bootstrap_field(fields)?,
            app_id: string_field(fields, "appId")?,
            port: port_field(fields)?,
            html_suffix: string_field(fields, "htmlSuffix")?,
            directory_index: string_field(fields, "directoryIndex")?,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check the value constraints that do not depend on the file format.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_template(&self.template) {
            return Err(Error::config("template", "invalid value for template field"));
        }

        let first = self
            .bootstrap
            .first()
            .ok_or_else(|| Error::config("bootstrap", "must not be empty"))?;
        parse_selector(first)
            .map_err(|e| Error::config("bootstrap", format!("invalid selector: {}", e)))?;

        if let Some(app_id) = &self.app_id {
            if !is_valid_app_id(app_id) {
                return Err(Error::config("appId", "invalid value for appId field"));
            }
        }
        Ok(())
    }

    /// Absolute-or-relative path of the template file.
    pub fn template_file(&self) -> PathBuf {
        self.root.join(&self.template)
    }

    /// The authoritative bootstrap selector.
    pub fn bootstrap_selector(&self) -> &str {
        self.bootstrap.first().map(String::as_str).unwrap_or_default()
    }
}

fn string_field(fields: &Map<String, Value>, name: &str) -> Result<Option<String>> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::config(name, "must have a string value")),
    }
}

fn port_field(fields: &Map<String, Value>) -> Result<u16> {
    match fields.get("port") {
        None | Some(Value::Null) => Ok(8080),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|p| u16::try_from(p).ok())
            .ok_or_else(|| Error::config("port", "must be an integer between 0 and 65535")),
        Some(_) => Err(Error::config("port", "must have a number value")),
    }
}

fn bootstrap_field(fields: &Map<String, Value>) -> Result<Vec<String>> {
    match fields.get("bootstrap") {
        None | Some(Value::Null) => Err(Error::config("bootstrap", "field is missing")),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => {
            if items.is_empty() {
                return Err(Error::config("bootstrap", "must not be empty"));
            }
            items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| Error::config("bootstrap", "must have string members only"))
                })
                .collect()
        }
        Some(_) => Err(Error::config("bootstrap", "must be an array")),
    }
}

fn is_valid_template(template: &str) -> bool {
    !template.is_empty()
        && !template.starts_with(['/', '\\'])
        && !template.ends_with(['/', '\\'])
        && !Path::new(template).is_absolute()
        && !template.split(['/', '\\']).any(|segment| segment == "..")
}

fn is_valid_app_id(app_id: &str) -> bool {
    let name = app_id.strip_suffix('=').unwrap_or(app_id);
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}
