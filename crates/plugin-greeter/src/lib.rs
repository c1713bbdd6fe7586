//! Greeting plugins for HotRoute.
//!
//! `hello` and `goodbye` share one set of routes (a templated index, a
//! redirect built with `url_for`, static files and a scoped 403 handler).
//! `hello` additionally binds a bare endpoint and request hooks.

pub mod goodbye;
pub mod greeting;
pub mod hello;

use hotroute_plugin::PluginCatalog;

/// Adds the greeting plugins to `catalog`.
pub fn register(catalog: &mut PluginCatalog) {
    catalog
        .register(hello::ENTRY, hello::create)
        .register(goodbye::ENTRY, goodbye::create);
}

/// A catalog holding only the greeting plugins.
pub fn catalog() -> PluginCatalog {
    let mut catalog = PluginCatalog::new();
    register(&mut catalog);
    catalog
}
