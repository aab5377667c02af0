//! Chart Viewer
//! Hands saved charts to the system image viewer.

use log::{debug, warn};
use std::path::Path;

pub struct ChartViewer {
    enabled: bool,
}

impl ChartViewer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Open `path` with the default application. Returns whether a viewer
    /// was launched; failures are logged and never abort the report.
    pub fn show(&self, path: &Path) -> bool {
        if !self.enabled {
            debug!("display disabled, not opening {}", path.display());
            return false;
        }
        match open::that(path) {
            Ok(()) => true,
            Err(e) => {
                warn!("could not open {}: {}", path.display(), e);
                false
            }
        }
    }
}
