//! Typed client for the parts of the Medusa HTTP surface consumed by the
//! manual search watcher: the search status endpoint, the search triggers,
//! the boot configuration and the indexer show lookup.
pub mod apis;
pub mod commands;
pub mod models;
