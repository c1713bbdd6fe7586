//! Per-request view of the host handed to views and hooks.

use std::path::{Component, Path};

use http::header;
use serde_json::{Map, Value};
use tracing::debug;

use crate::app::HostApp;
use crate::error::HostError;
use crate::hooks::{Hook, HookKind};
use crate::http::{Abort, HandlerResult, Request, Response, ViewArgs};
use crate::template;

/// Scopes enclosing `endpoint`, innermost first.
///
/// `plugins.hello.index` yields `["plugins.hello", "plugins"]`; an endpoint
/// without a dot belongs to the application only.
pub fn blueprints_of(endpoint: &str) -> Vec<String> {
    let Some((scope, _)) = endpoint.rsplit_once('.') else {
        return Vec::new();
    };
    let mut scopes = vec![scope.to_string()];
    let mut current = scope;
    while let Some((parent, _)) = current.rsplit_once('.') {
        scopes.push(parent.to_string());
        current = parent;
    }
    scopes
}

/// The request being handled together with the matched endpoint.
pub struct RequestContext<'a> {
    app: &'a HostApp,
    request: &'a Request,
    endpoint: Option<String>,
    view_args: ViewArgs,
    blueprints: Vec<String>,
}

impl<'a> RequestContext<'a> {
    pub(crate) fn new(
        app: &'a HostApp,
        request: &'a Request,
        endpoint: Option<String>,
        view_args: ViewArgs,
    ) -> Self {
        let blueprints = endpoint.as_deref().map(blueprints_of).unwrap_or_default();
        Self {
            app,
            request,
            endpoint,
            view_args,
            blueprints,
        }
    }

    /// The host application.
    pub fn app(&self) -> &HostApp {
        self.app
    }

    /// The incoming request.
    pub fn request(&self) -> &Request {
        self.request
    }

    /// Matched endpoint, `None` when routing failed.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Values captured from the URL.
    pub fn view_args(&self) -> &ViewArgs {
        &self.view_args
    }

    /// A single captured value.
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.view_args.get(name).map(String::as_str)
    }

    /// Innermost enclosing scope.
    pub fn blueprint(&self) -> Option<&str> {
        self.blueprints.first().map(String::as_str)
    }

    /// All enclosing scopes, innermost first.
    pub fn blueprints(&self) -> &[String] {
        &self.blueprints
    }

    /// Builds a URL for `endpoint`.
    ///
    /// An endpoint starting with `.` is resolved inside the current scope,
    /// so `.index` in a `plugins.hello` view means `plugins.hello.index`.
    pub fn url_for(&self, endpoint: &str, mut values: ViewArgs) -> Result<String, HostError> {
        let endpoint = match (endpoint.strip_prefix('.'), self.blueprint()) {
            (Some(local), Some(scope)) => format!("{scope}.{local}"),
            (Some(local), None) => local.to_string(),
            (None, _) => endpoint.to_string(),
        };

        let scopes = blueprints_of(&endpoint);
        for scope in self.app.scopes_outer_first(&scopes) {
            for hook in self.app.hooks(HookKind::UrlDefaults, scope) {
                if let Hook::UrlDefaults(inject) = hook {
                    inject(&endpoint, &mut values);
                }
            }
        }

        self.app.url_map().build(&endpoint, &values)
    }

    /// Redirects to the URL built for `endpoint`.
    pub fn redirect_to(&self, endpoint: &str, values: ViewArgs) -> HandlerResult {
        let location = self
            .url_for(endpoint, values)
            .map_err(|e| Abort::internal(e.to_string()))?;
        Ok(Response::redirect(&location))
    }

    /// Renders a template from the current scope's template folder, falling
    /// back to the application folder.
    pub fn render_template(&self, name: &str, context: Map<String, Value>) -> HandlerResult {
        let source = self
            .load_template(name)
            .map_err(|e| Abort::internal(e.to_string()))?;

        let mut merged = Map::new();
        for scope in self.app.scopes_outer_first(&self.blueprints) {
            for hook in self.app.hooks(HookKind::ContextProcessor, scope) {
                if let Hook::ContextProcessor(process) = hook {
                    merged.extend(process(self));
                }
            }
        }
        merged.extend(context);

        let body = template::render(name, &source, &merged)
            .map_err(|e| Abort::internal(e.to_string()))?;
        Ok(Response::html(body))
    }

    fn load_template(&self, name: &str) -> Result<String, HostError> {
        let folders = self
            .blueprints
            .iter()
            .filter_map(|scope| self.app.resources(scope))
            .filter_map(|res| res.template_folder.as_deref())
            .chain(self.app.template_folder());

        for folder in folders {
            if let Some(path) = safe_join(folder, name) {
                if let Ok(source) = std::fs::read_to_string(&path) {
                    debug!(template = %name, path = %path.display(), "Template loaded");
                    return Ok(source);
                }
            }
        }

        Err(HostError::TemplateNotFound {
            name: name.to_string(),
        })
    }

    /// Serves `filename` from the current scope's static folder.
    pub fn send_static_file(&self, filename: &str) -> HandlerResult {
        let folder = self
            .blueprints
            .iter()
            .filter_map(|scope| self.app.resources(scope))
            .find_map(|res| res.static_folder.as_deref())
            .ok_or_else(Abort::not_found)?;
        serve_file(folder, filename)
    }
}

fn safe_join(folder: &Path, name: &str) -> Option<std::path::PathBuf> {
    let relative = Path::new(name);
    let clean = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    clean.then(|| folder.join(relative))
}

/// Serves a file below `folder`. Names escaping the folder are `404`.
pub fn serve_file(folder: &Path, name: &str) -> HandlerResult {
    let path = safe_join(folder, name).ok_or_else(Abort::not_found)?;
    let body = std::fs::read(&path).map_err(|_| Abort::not_found())?;
    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    Ok(Response::new(http::StatusCode::OK, body).with_header(header::CONTENT_TYPE, mime.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blueprints_of() {
        assert_eq!(
            blueprints_of("plugins.hello.index"),
            vec!["plugins.hello".to_string(), "plugins".to_string()]
        );
        assert_eq!(blueprints_of("plugins.index"), vec!["plugins".to_string()]);
        assert!(blueprints_of("api").is_empty());
    }

    #[test]
    fn test_serve_file_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file.txt"), "HELLO!").unwrap();

        let resp = serve_file(dir.path(), "file.txt").unwrap();
        assert_eq!(resp.body_text(), "HELLO!");
        assert!(
            resp.headers[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );

        let err = serve_file(dir.path(), "../file.txt").unwrap_err();
        assert_eq!(err.status, http::StatusCode::NOT_FOUND);
        assert!(serve_file(dir.path(), "/etc/passwd").is_err());
        assert!(serve_file(dir.path(), "missing.txt").is_err());
    }
}
