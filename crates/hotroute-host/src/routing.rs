//! URL rules and the routing table.
//!
//! Adding a rule slots it into the match order in place. Removing rules
//! always rebuilds the whole index, which is the expensive operation the
//! plugin lifecycle avoids on stop/start and defers to unload.

use std::collections::BTreeSet;
use std::fmt;

use http::Method;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::HostError;
use crate::http::{Abort, ViewArgs};

const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const PATH_COMPONENT: &AsciiSet = &COMPONENT.remove(b'/');

/// Converter applied to a variable URL segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    /// One non-empty segment without `/`.
    String,
    /// One segment of ASCII digits.
    Int,
    /// The remainder of the path, `/` included.
    Path,
}

impl Converter {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "int" => Some(Self::Int),
            "path" => Some(Self::Path),
            _ => None,
        }
    }

    fn weight(&self) -> u8 {
        match self {
            Self::Int => 1,
            Self::String => 2,
            Self::Path => 3,
        }
    }

    fn accepts(&self, value: &str) -> bool {
        match self {
            Self::String => !value.is_empty() && !value.contains('/'),
            Self::Int => !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()),
            Self::Path => !value.is_empty(),
        }
    }
}

/// One `/`-separated piece of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text.
    Static(String),
    /// A captured variable.
    Variable {
        /// Name under which the value is captured.
        name: String,
        /// How the value is matched.
        converter: Converter,
    },
}

/// A parsed rule such as `/say/<string:name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulePattern {
    segments: Vec<Segment>,
}

impl RulePattern {
    /// Parses a rule. It must start with `/`; variables take the form
    /// `<name>` or `<converter:name>` and `path` variables must come last.
    pub fn parse(rule: &str) -> Result<Self, HostError> {
        let malformed = |reason: &str| HostError::MalformedRule {
            rule: rule.to_string(),
            reason: reason.to_string(),
        };

        let body = rule
            .strip_prefix('/')
            .ok_or_else(|| malformed("rule must start with '/'"))?;

        let mut segments = Vec::new();
        let mut names = BTreeSet::new();
        let parts: Vec<&str> = body.split('/').collect();
        for (index, part) in parts.iter().enumerate() {
            let segment = match part.strip_prefix('<').and_then(|p| p.strip_suffix('>')) {
                Some(inner) => {
                    let (converter, name) = match inner.split_once(':') {
                        Some((conv, name)) => (
                            Converter::parse(conv)
                                .ok_or_else(|| malformed(&format!("unknown converter '{conv}'")))?,
                            name,
                        ),
                        None => (Converter::String, inner),
                    };
                    if name.is_empty() {
                        return Err(malformed("variable name is empty"));
                    }
                    if !names.insert(name.to_string()) {
                        return Err(malformed(&format!("variable '{name}' used twice")));
                    }
                    if converter == Converter::Path && index + 1 != parts.len() {
                        return Err(malformed("path variable must be the last segment"));
                    }
                    Segment::Variable {
                        name: name.to_string(),
                        converter,
                    }
                }
                None if part.contains('<') || part.contains('>') => {
                    return Err(malformed("variables must span a whole segment"));
                }
                None => Segment::Static(part.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self { segments })
    }

    /// Returns this pattern mounted under literal prefix segments.
    pub fn prefixed(&self, prefix: &[&str]) -> Self {
        let mut segments: Vec<Segment> = prefix
            .iter()
            .map(|p| Segment::Static((*p).to_string()))
            .collect();
        segments.extend(self.segments.iter().cloned());
        Self { segments }
    }

    /// Segments of the pattern.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the captured variables, in order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Variable { name, .. } => Some(name.as_str()),
            Segment::Static(_) => None,
        })
    }

    fn weight(&self) -> Vec<u8> {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Static(_) => 0,
                Segment::Variable { converter, .. } => converter.weight(),
            })
            .collect()
    }

    fn matches(&self, parts: &[&str]) -> Option<ViewArgs> {
        let mut args = ViewArgs::new();
        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Static(text) => {
                    if parts.get(index) != Some(&text.as_str()) {
                        return None;
                    }
                }
                Segment::Variable {
                    name,
                    converter: Converter::Path,
                } => {
                    let rest = parts.get(index..)?.join("/");
                    if !Converter::Path.accepts(&rest) {
                        return None;
                    }
                    args.insert(name.clone(), rest);
                    return Some(args);
                }
                Segment::Variable { name, converter } => {
                    let part = parts.get(index)?;
                    if !converter.accepts(part) {
                        return None;
                    }
                    args.insert(name.clone(), (*part).to_string());
                }
            }
        }
        (parts.len() == self.segments.len()).then_some(args)
    }

    fn build(&self, values: &ViewArgs) -> Option<String> {
        let mut url = String::new();
        for segment in &self.segments {
            url.push('/');
            match segment {
                Segment::Static(text) => url.push_str(text),
                Segment::Variable { name, converter } => {
                    let value = values.get(name)?;
                    if !converter.accepts(value) {
                        return None;
                    }
                    let set = match converter {
                        Converter::Path => PATH_COMPONENT,
                        _ => COMPONENT,
                    };
                    url.extend(utf8_percent_encode(value, set));
                }
            }
        }
        Some(url)
    }
}

impl fmt::Display for RulePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            f.write_str("/")?;
            match segment {
                Segment::Static(text) => f.write_str(text)?,
                Segment::Variable { name, converter } => match converter {
                    Converter::String => write!(f, "<{name}>")?,
                    Converter::Int => write!(f, "<int:{name}>")?,
                    Converter::Path => write!(f, "<path:{name}>")?,
                },
            }
        }
        Ok(())
    }
}

/// Per-route options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOptions {
    /// Allowed methods. `HEAD` is implied by `GET`.
    pub methods: Vec<Method>,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            methods: vec![Method::GET],
        }
    }
}

impl RouteOptions {
    /// Options allowing exactly the given methods.
    pub fn methods(methods: impl IntoIterator<Item = Method>) -> Self {
        Self {
            methods: methods.into_iter().collect(),
        }
    }
}

/// An entry of the routing table.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: RulePattern,
    endpoint: String,
    methods: Vec<Method>,
    weight: Vec<u8>,
}

impl Rule {
    /// Creates a rule routing `pattern` to `endpoint`.
    pub fn new(pattern: RulePattern, endpoint: impl Into<String>, options: &RouteOptions) -> Self {
        let weight = pattern.weight();
        Self {
            pattern,
            endpoint: endpoint.into(),
            methods: options.methods.clone(),
            weight,
        }
    }

    /// Rule text, e.g. `/plugins/hello/<name>`.
    pub fn rule(&self) -> String {
        self.pattern.to_string()
    }

    /// Parsed pattern.
    pub fn pattern(&self) -> &RulePattern {
        &self.pattern
    }

    /// Fully-qualified endpoint name.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Allowed methods.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Whether the rule accepts `method`.
    pub fn allows(&self, method: &Method) -> bool {
        self.methods.contains(method) || (*method == Method::HEAD && self.methods.contains(&Method::GET))
    }
}

/// Result of a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Endpoint of the matched rule.
    pub endpoint: String,
    /// Captured variables.
    pub view_args: ViewArgs,
}

/// The routing table.
#[derive(Debug, Default)]
pub struct UrlMap {
    rules: Vec<Rule>,
    /// Indices into `rules`, most specific first.
    order: Vec<usize>,
    rebuilds: u64,
}

impl UrlMap {
    /// Creates an empty routing table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule. A rule with the same endpoint and pattern already in
    /// the table is updated in place rather than duplicated.
    pub fn add(&mut self, rule: Rule) {
        if let Some(existing) = self
            .rules
            .iter_mut()
            .find(|r| r.endpoint == rule.endpoint && r.pattern == rule.pattern)
        {
            existing.methods = rule.methods;
            return;
        }

        let index = self.rules.len();
        let position = self
            .order
            .partition_point(|&i| self.rules[i].weight <= rule.weight);
        self.rules.push(rule);
        self.order.insert(position, index);
    }

    /// Removes every rule for which `remove` returns true and rebuilds the
    /// match index. Returns the number of rules removed.
    pub fn remove_where(&mut self, mut remove: impl FnMut(&Rule) -> bool) -> usize {
        let before = self.rules.len();
        self.rules.retain(|r| !remove(r));
        self.rebuild();
        before - self.rules.len()
    }

    fn rebuild(&mut self) {
        let mut order: Vec<usize> = (0..self.rules.len()).collect();
        order.sort_by(|&a, &b| self.rules[a].weight.cmp(&self.rules[b].weight));
        self.order = order;
        self.rebuilds += 1;
    }

    /// How many times the match index has been rebuilt.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// All rules in insertion order.
    pub fn iter_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether any rule routes to `endpoint`.
    pub fn contains_endpoint(&self, endpoint: &str) -> bool {
        self.rules.iter().any(|r| r.endpoint == endpoint)
    }

    /// Matches a decoded request path.
    ///
    /// Fails with `404` when nothing matches and `405` when only rules
    /// with other methods match.
    pub fn match_path(&self, method: &Method, path: &str) -> Result<RouteMatch, Abort> {
        let Some(body) = path.strip_prefix('/') else {
            return Err(Abort::not_found());
        };
        let parts: Vec<&str> = body.split('/').collect();

        let mut method_mismatch = false;
        for &index in &self.order {
            let rule = &self.rules[index];
            if let Some(view_args) = rule.pattern.matches(&parts) {
                if rule.allows(method) {
                    return Ok(RouteMatch {
                        endpoint: rule.endpoint.clone(),
                        view_args,
                    });
                }
                method_mismatch = true;
            }
        }

        if method_mismatch {
            Err(Abort::new(http::StatusCode::METHOD_NOT_ALLOWED))
        } else {
            Err(Abort::not_found())
        }
    }

    /// Builds a URL for `endpoint`. Values not consumed by the rule are
    /// appended as a query string.
    pub fn build(&self, endpoint: &str, values: &ViewArgs) -> Result<String, HostError> {
        for rule in self.rules.iter().filter(|r| r.endpoint == endpoint) {
            let Some(mut url) = rule.pattern.build(values) else {
                continue;
            };

            let used: BTreeSet<&str> = rule.pattern.variables().collect();
            let query: Vec<String> = values
                .iter()
                .filter(|(k, _)| !used.contains(k.as_str()))
                .map(|(k, v)| {
                    format!(
                        "{}={}",
                        utf8_percent_encode(k, COMPONENT),
                        utf8_percent_encode(v, COMPONENT)
                    )
                })
                .collect();
            if !query.is_empty() {
                url.push('?');
                url.push_str(&query.join("&"));
            }
            return Ok(url);
        }

        Err(HostError::BuildFailed {
            endpoint: endpoint.to_string(),
        })
    }
}
