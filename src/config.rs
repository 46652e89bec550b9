//! Engine configuration
//!
//! Read from JSON; every field has a default so a partial (or missing) file
//! is fine.

use crate::constants::overlay::CAPTION_SELECTOR;
use crate::constants::watch::DEFAULT_POLL_INTERVAL_MS;
use crate::error::{Error, Result};
use crate::host::{OverlayController, RedrawSink};
use crate::nodes::{CompletionOrder, NodeRegistry};
use crate::probe::{HttpProbe, ImageProbe, InputDirProbe};
use crate::runtime::{HostServices, WatchRuntime, WatchTrigger};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

const CONFIG_DIR: &str = "nodle";
const CONFIG_FILE: &str = "image-properties.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cadence of the watched-slot poll, in milliseconds
    pub poll_interval_ms: u64,
    pub completion_order: CompletionOrder,
    /// Host input folder probed when no server is configured
    pub input_dir: Option<PathBuf>,
    /// Base URL of the host's image endpoint
    pub server_url: Option<String>,
    pub overlay_selector: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            completion_order: CompletionOrder::default(),
            input_dir: None,
            server_url: None,
            overlay_selector: CAPTION_SELECTOR.to_string(),
        }
    }
}

impl EngineConfig {
    /// `<config dir>/nodle/image-properties.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`, or from [`Self::default_path`] when `None`.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => {
                debug!("No config directory; using default engine config");
                return Ok(Self::default());
            }
        };

        if !path.exists() {
            debug!("No config at {}; using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Registry of the built-in nodes, resolving probes in the configured order
    pub fn registry(&self) -> NodeRegistry {
        NodeRegistry::with_builtin_nodes(self.completion_order)
    }

    /// Poll the watched slot at the configured cadence
    pub fn poll_trigger(&self) -> WatchTrigger {
        WatchTrigger::Poll(self.poll_interval())
    }

    pub fn services(
        &self,
        redraw: Rc<dyn RedrawSink>,
        overlay: Rc<dyn OverlayController>,
    ) -> HostServices {
        HostServices::new(redraw, overlay, self.overlay_selector.as_str())
    }

    /// Watcher runtime using the configured probe
    pub fn runtime(&self, services: Rc<HostServices>) -> WatchRuntime {
        WatchRuntime::new(self.probe(), services)
    }

    /// The configured probe: HTTP when a server is set, else the input folder
    pub fn probe(&self) -> Rc<dyn ImageProbe> {
        match &self.server_url {
            Some(url) => Rc::new(HttpProbe::new(url.as_str())),
            None => {
                let root = self
                    .input_dir
                    .clone()
                    .unwrap_or_else(|| PathBuf::from("input"));
                Rc::new(InputDirProbe::new(root))
            }
        }
    }
}
