// JSON-backed locale catalogue.
//
// Each locale is one nested JSON document; keys are looked up by walking the
// dotted path (`log.admin.verb.create` -> log → admin → verb → create).
// Lookups fall back to the default locale, then to the bundled en-GB messages.
// The bundled en-GB catalogue is compiled in, extra locales are read from disk.

use crate::core::locale::{substitute, LocaleError, Translator};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

const BUNDLED_LOCALE: &str = "en-GB";
const BUNDLED_CATALOGUE: &str = include_str!("../../../locales/en-GB.json");

pub struct JsonLocaleCatalog {
    default_locale: String,
    catalogues: HashMap<String, Value>,
}

impl JsonLocaleCatalog {
    /// Catalogue with only the bundled en-GB messages.
    pub fn bundled(default_locale: impl Into<String>) -> Result<Self, LocaleError> {
        let catalog = Self {
            default_locale: default_locale.into(),
            catalogues: HashMap::new(),
        };
        catalog.with_catalogue(BUNDLED_LOCALE, BUNDLED_CATALOGUE)
    }

    pub fn with_catalogue(mut self, locale: &str, json: &str) -> Result<Self, LocaleError> {
        let value: Value =
            serde_json::from_str(json).map_err(|source| LocaleError::InvalidCatalogue {
                locale: locale.to_string(),
                source,
            })?;
        self.catalogues.insert(locale.to_string(), value);
        Ok(self)
    }

    /// Load every `<locale>.json` file in `dir`. A file for a locale that is
    /// already loaded replaces it.
    pub fn load_dir(mut self, dir: impl AsRef<Path>) -> Result<Self, LocaleError> {
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(locale) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
            else {
                continue;
            };

            let text = std::fs::read_to_string(&path)?;
            self = self.with_catalogue(&locale, &text)?;
            tracing::debug!(locale = %locale, path = %path.display(), "Loaded locale catalogue");
        }
        Ok(self)
    }

    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = self.catalogues.keys().map(String::as_str).collect();
        locales.sort_unstable();
        locales
    }

    fn lookup(&self, locale: &str, key: &str) -> Option<&str> {
        let mut node = self.catalogues.get(locale)?;
        for part in key.split('.') {
            node = node.get(part)?;
        }
        node.as_str()
    }
}

impl Translator for JsonLocaleCatalog {
    fn translate(&self, locale: &str, key: &str, vars: &[(&str, &str)]) -> String {
        match self
            .lookup(locale, key)
            .or_else(|| self.lookup(&self.default_locale, key))
            .or_else(|| self.lookup(BUNDLED_LOCALE, key))
        {
            Some(template) => substitute(template, vars),
            None => {
                tracing::warn!(locale, key, "Missing locale message");
                key.to_string()
            }
        }
    }

    fn has_locale(&self, locale: &str) -> bool {
        self.catalogues.contains_key(locale)
    }

    fn default_locale(&self) -> &str {
        &self.default_locale
    }
}
