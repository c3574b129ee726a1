//! Session and registry configuration

use std::time::Duration;

/// Session configuration
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Bindings fetched per `list` / `next_n` round trip when enumerating;
    /// zero is treated as one
    pub list_page_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { list_page_size: 100 }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list_page_size(mut self, size: usize) -> Self {
        self.list_page_size = size.max(1);
        self
    }
}

/// Servant registry configuration
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// Longest the caller of `run` sleeps between stop checks
    pub poll_interval: Duration,
    /// Name of the persistent child adapter
    ///
    /// If unset, `<session>_adapter`, or `<session>_adapter_<n>` with the
    /// smallest `n >= 2` not already taken by another registry of the same
    /// session. An explicit name that is taken fails registry creation.
    pub adapter_name: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            adapter_name: None,
        }
    }
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_adapter_name(mut self, name: impl Into<String>) -> Self {
        self.adapter_name = Some(name.into());
        self
    }

    pub(crate) fn adapter_name_for(&self, session: &str, taken: impl Fn(&str) -> bool) -> String {
        if let Some(name) = &self.adapter_name {
            return name.clone();
        }
        let base = format!("{}_adapter", session);
        if !taken(&base) {
            return base;
        }
        (2usize..)
            .map(|n| format!("{}_{}", base, n))
            .find(|name| !taken(name))
            .unwrap_or(base)
    }
}
