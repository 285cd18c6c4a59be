pub mod locale_service;

pub use locale_service::{substitute, LocaleError, LocaleMessages, Translator};
