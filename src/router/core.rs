use super::routes::Endpoint;
use http::Method;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::debug;

/// One entry of the routing table before compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    pub method: Method,
    /// Path pattern: `{name}` matches one segment, `{*name}` the rest of
    /// the path (at least one character).
    pub pattern: &'static str,
    pub endpoint: Endpoint,
}

impl RouteSpec {
    pub const fn new(method: Method, pattern: &'static str, endpoint: Endpoint) -> Self {
        Self {
            method,
            pattern,
            endpoint,
        }
    }
}

/// Result of successfully matching a request path to a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub endpoint: Endpoint,
    /// Percent-decoded path parameters
    pub path_params: HashMap<String, String>,
}

impl RouteMatch {
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    method: Method,
    regex: Regex,
    endpoint: Endpoint,
    param_names: Vec<String>,
}

/// Router to match HTTP requests to endpoints.
///
/// Routes are tried in table order; the first match wins.
#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<CompiledRoute>,
}

impl Router {
    /// Compile a routing table.
    ///
    /// # Errors
    ///
    /// Returns the regex error for a malformed pattern.
    pub fn new(specs: &[RouteSpec]) -> Result<Self, regex::Error> {
        let routes = specs
            .iter()
            .map(|spec| {
                let (regex, param_names) = Self::path_to_regex(spec.pattern)?;
                Ok(CompiledRoute {
                    method: spec.method.clone(),
                    regex,
                    endpoint: spec.endpoint,
                    param_names,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        debug!(route_count = routes.len(), "Router compiled");
        Ok(Self { routes })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        for route in &self.routes {
            if route.method != *method {
                continue;
            }
            if let Some(captures) = route.regex.captures(path) {
                let path_params = route
                    .param_names
                    .iter()
                    .enumerate()
                    .filter_map(|(i, name)| {
                        captures
                            .get(i + 1)
                            .map(|m| (name.clone(), percent_decode(m.as_str())))
                    })
                    .collect();
                return Some(RouteMatch {
                    endpoint: route.endpoint,
                    path_params,
                });
            }
        }
        None
    }

    /// True when some route matches `path`, whatever its method.
    #[must_use]
    pub fn path_known(&self, path: &str) -> bool {
        self.routes.iter().any(|r| r.regex.is_match(path))
    }

    pub(crate) fn path_to_regex(path: &str) -> Result<(Regex, Vec<String>), regex::Error> {
        if path == "/" {
            return Ok((Regex::new(r"^/$")?, Vec::new()));
        }

        let mut pattern = String::with_capacity(path.len() + 8);
        pattern.push('^');
        let mut param_names = Vec::with_capacity(path.matches('{').count());
        let mut catch_all = false;

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            match segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
            {
                Some(name) => match name.strip_prefix('*') {
                    Some(rest) => {
                        pattern.push_str("/(.+)");
                        param_names.push(rest.to_string());
                        catch_all = true;
                    }
                    None => {
                        pattern.push_str("/([^/]+)");
                        param_names.push(name.to_string());
                    }
                },
                None => {
                    pattern.push('/');
                    pattern.push_str(&regex::escape(segment));
                }
            }
        }

        // A trailing slash is tolerated on fixed-length routes.
        if !catch_all {
            pattern.push_str("/?");
        }
        pattern.push('$');
        Ok((Regex::new(&pattern)?, param_names))
    }
}

fn percent_decode(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        Err(_) => raw.to_string(),
    }
}
