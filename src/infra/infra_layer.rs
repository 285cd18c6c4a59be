// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "logging/mod.rs"]
pub mod logging;

#[path = "locale/mod.rs"]
pub mod locale;
