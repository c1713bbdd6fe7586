//! The `hello` plugin.

use http::header::HeaderName;
use serde_json::{Map, json};
use tracing::debug;

use hotroute_host::{HandlerResult, RequestContext, abort};
use hotroute_plugin::{Plugin, PluginResult, PluginSource};

use crate::greeting;

/// Catalog entry name.
pub const ENTRY: &str = "hello";

const PLUGIN_HEADER: &str = "x-hotroute-plugin";

/// Constructs the plugin.
pub fn create(source: &PluginSource) -> PluginResult<Plugin> {
    let mut plugin = greeting::build(source, "Hello Forbidden!")?;

    plugin.bind_endpoint("raise", raise)?;
    plugin.add_url_rule("/endpoints/raise", "raise", None, Default::default())?;

    plugin.before_request(|ctx| {
        debug!(endpoint = ?ctx.endpoint(), "Handled before request");
        Ok(None)
    });
    plugin.after_request(|_ctx, response| {
        response.with_header(HeaderName::from_static(PLUGIN_HEADER), ENTRY)
    });

    let (id, name) = (source.manifest.id.clone(), source.manifest.plugin.name.clone());
    plugin.context_processor(move |_ctx| {
        let mut extra = Map::new();
        extra.insert("plugin".to_string(), json!({ "id": id, "name": name }));
        extra
    });

    Ok(plugin)
}

fn raise(_ctx: &RequestContext<'_>) -> HandlerResult {
    Err(abort(502))
}
