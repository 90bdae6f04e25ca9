use std::collections::BTreeMap;

/// Named route for the backend's learner registration endpoint.
pub const REGISTER_LEARNER: &str = "learners.register";

pub const REGISTER_LEARNER_PATH: &str = "/api/v1/learners/register";
pub const SHOW_LEARNER_PATH: &str = "/api/v1/learners/:learner_id";

/// Resolves route names to URLs for the wizard.
pub trait LinkResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<String>;
}

/// Static route table joined onto a base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    base_url: String,
    routes: BTreeMap<String, String>,
}

impl RouteTable {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            routes: BTreeMap::new(),
        }
    }

    /// Table with the learner routes served by this workspace's API.
    pub fn standard(base_url: impl Into<String>) -> Self {
        Self::new(base_url).with_route(REGISTER_LEARNER, REGISTER_LEARNER_PATH)
    }

    pub fn with_route(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.routes.insert(name.into(), path.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard("")
    }
}

impl LinkResolver for RouteTable {
    fn resolve(&self, name: &str) -> Option<String> {
        let path = self.routes.get(name)?;
        if path.starts_with('/') {
            Some(format!("{}{}", self.base_url, path))
        } else {
            Some(format!("{}/{}", self.base_url, path))
        }
    }
}
