// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "logging/mod.rs"]
pub mod logging;

#[path = "locale/mod.rs"]
pub mod locale;
