//! Shared state passed by reference to every operation.

use crate::paths::Layout;
use crate::settings::Settings;
use emsdk_schema::Host;

/// Groups the root layout, the host description and the install settings.
#[derive(Debug, Clone)]
pub struct Context {
    pub layout: Layout,
    pub host: Host,
    pub settings: Settings,
}

impl Context {
    pub fn new(layout: Layout, host: Host, settings: Settings) -> Self {
        Self {
            layout,
            host,
            settings,
        }
    }

    /// Convert a path string to the host's separator convention.
    pub fn native(&self, p: &str) -> String {
        crate::paths::to_native_path(p, self.host.is_windows())
    }
}
