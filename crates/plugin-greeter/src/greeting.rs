//! Routes shared by the greeting plugins.

use http::StatusCode;
use serde_json::{Map, Value};

use hotroute_host::{ErrorKey, Response, ViewArgs, abort};
use hotroute_plugin::{Plugin, PluginResult, PluginSource};

/// Builds a greeting plugin from its manifest.
///
/// Routes, relative to the plugin mount point:
/// `/<name>` renders `index.html`, `/doge` redirects to `/Doge`,
/// `/staticfile` serves `static/file.txt`, `/403` aborts with a 403 that
/// the plugin answers with `forbidden`.
pub fn build(source: &PluginSource, forbidden: &'static str) -> PluginResult<Plugin> {
    let mut plugin = Plugin::from_manifest(&source.manifest, source.root.clone())?;
    plugin.static_folder("static")?;
    plugin.template_folder("templates");

    plugin.route("/doge", "doge", |ctx| {
        let mut values = ViewArgs::new();
        values.insert("name".to_string(), "Doge".to_string());
        ctx.redirect_to(".index", values)
    })?;

    plugin.route("/<string:name>", "index", |ctx| {
        let mut context = Map::new();
        context.insert(
            "name".to_string(),
            Value::from(ctx.arg("name").unwrap_or_default()),
        );
        ctx.render_template("index.html", context)
    })?;

    plugin.route("/staticfile", "static_file", |ctx| ctx.send_static_file("file.txt"))?;

    plugin.route("/403", "test_forbidden", |_ctx| Err(abort(403)))?;

    plugin.error_handler(ErrorKey::Status(403), move |_ctx, _abort| {
        Response::text(forbidden).with_status(StatusCode::FORBIDDEN)
    })?;

    Ok(plugin)
}
