// Localisation port.
//
// The admin log never formats user-facing text itself: every string goes
// through a `Translator`, bound to the guild's locale with `LocaleMessages`.

use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocaleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid locale catalogue for {locale}: {source}")]
    InvalidCatalogue {
        locale: String,
        source: serde_json::Error,
    },
}

pub trait Translator: Send + Sync {
    /// Look up `key` (dotted, e.g. `log.admin.changes`) for `locale` and
    /// substitute `{name}` placeholders from `vars`.
    ///
    /// Implementations fall back to the default locale, then to the key.
    fn translate(&self, locale: &str, key: &str, vars: &[(&str, &str)]) -> String;

    fn has_locale(&self, locale: &str) -> bool;

    fn default_locale(&self) -> &str;
}

/// A translator bound to one locale.
pub struct LocaleMessages {
    translator: Arc<dyn Translator>,
    locale: String,
}

impl LocaleMessages {
    pub fn new(translator: Arc<dyn Translator>, locale: impl Into<String>) -> Self {
        Self {
            translator,
            locale: locale.into(),
        }
    }

    pub fn get(&self, key: &str) -> String {
        self.translator.translate(&self.locale, key, &[])
    }

    pub fn get_with(&self, key: &str, vars: &[(&str, &str)]) -> String {
        self.translator.translate(&self.locale, key, vars)
    }
}

#[cfg(test)]
impl LocaleMessages {
    pub fn locale(&self) -> &str {
        &self.locale
    }
}

/// Replace `{name}` placeholders; unknown placeholders are left as-is.
pub fn substitute(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{}}}", name), value);
    }
    out
}
