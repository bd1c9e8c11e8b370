//! Path classification for the gatekeeping pipeline.

use crate::config::schema::RoutesConfig;

/// Which downstream checks apply to a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteClass {
    /// Admission control, rate limiting, CORS stamping.
    Api,
    /// Forced cache suppression on top of the baseline headers.
    Admin,
    /// Baseline only: nonce, CSP, static security headers.
    Other,
}

/// Classifies incoming paths by configured prefix.
#[derive(Clone, Debug)]
pub struct RouteClassifier {
    api_prefix: String,
    admin_prefix: String,
}

impl RouteClassifier {
    pub fn new(config: &RoutesConfig) -> Self {
        Self {
            api_prefix: config.api_prefix.clone(),
            admin_prefix: config.admin_prefix.clone(),
        }
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        if has_prefix_segment(path, &self.api_prefix) {
            RouteClass::Api
        } else if has_prefix_segment(path, &self.admin_prefix) {
            RouteClass::Admin
        } else {
            RouteClass::Other
        }
    }
}

/// Prefix match anchored at a path-segment boundary: `/api` matches `/api`
/// and `/api/leads`, never `/apichat`.
fn has_prefix_segment(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
