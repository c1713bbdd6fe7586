//! Template rendering with Tera (Jinja2-like syntax).
//!
//! Autoescaping follows Tera's defaults: templates named `*.html`, `*.htm`
//! or `*.xml` are HTML-escaped.

use std::error::Error as _;

use serde_json::{Map, Value};
use tera::{Context, Tera};

use crate::error::HostError;

/// Renders `source`, registered under `name`, against `context`.
pub fn render(name: &str, source: &str, context: &Map<String, Value>) -> Result<String, HostError> {
    let failed = |e: tera::Error| HostError::TemplateRender {
        name: name.to_string(),
        message: describe(&e),
    };

    let mut tera = Tera::default();
    tera.add_raw_template(name, source).map_err(failed)?;
    let context = Context::from_value(Value::Object(context.clone())).map_err(failed)?;
    tera.render(name, &context).map_err(failed)
}

/// Tera reports the useful detail in the source chain.
fn describe(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
