//! Configuration contexts for the aicall CLI.
//!
//! Configuration is stored in ~/.aicall/config.yaml and holds named contexts,
//! each carrying a bridge configuration and runner settings.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use aicall_bridge::BridgeConfig;
use serde::{Deserialize, Serialize};

/// Default configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".aicall";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Default capacity of the event channel used by the runner.
pub const DEFAULT_EVENT_BUFFER: usize = 256;
/// Default time the runner waits for callbacks to drain after each step.
pub const DEFAULT_SETTLE_MS: u64 = 20;

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Name of the currently active context.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_context: String,

    /// Map of context name to context configuration.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub contexts: BTreeMap<String, Context>,

    #[serde(skip)]
    config_path: PathBuf,
}

/// A named bridge setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            name: String::new(),
            bridge: BridgeConfig::default(),
            event_buffer: DEFAULT_EVENT_BUFFER,
            settle_ms: DEFAULT_SETTLE_MS,
        }
    }
}

fn default_event_buffer() -> usize {
    DEFAULT_EVENT_BUFFER
}

fn default_settle_ms() -> u64 {
    DEFAULT_SETTLE_MS
}

impl Config {
    /// Gets the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(DEFAULT_CONFIG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Saves the configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Adds or replaces a context.
    pub fn set_context(&mut self, name: &str, mut ctx: Context) -> anyhow::Result<()> {
        ctx.name = name.to_string();
        self.contexts.insert(name.to_string(), ctx);
        self.save()
    }

    /// Deletes a context.
    pub fn delete_context(&mut self, name: &str) -> anyhow::Result<()> {
        if self.contexts.remove(name).is_none() {
            anyhow::bail!("context '{}' not found", name);
        }
        if self.current_context == name {
            self.current_context.clear();
        }
        self.save()
    }

    /// Sets the current context.
    pub fn use_context(&mut self, name: &str) -> anyhow::Result<()> {
        if !self.contexts.contains_key(name) {
            anyhow::bail!("context '{}' not found", name);
        }
        self.current_context = name.to_string();
        self.save()
    }

    pub fn get_context(&self, name: &str) -> Option<&Context> {
        self.contexts.get(name)
    }

    /// Resolves the context by name, or the current context if no name is given.
    ///
    /// With neither a name nor a current context, the defaults are used.
    pub fn resolve_context(&self, name: Option<&str>) -> anyhow::Result<Context> {
        match name {
            Some(n) if !n.is_empty() => self
                .get_context(n)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("context '{}' not found", n)),
            _ if self.current_context.is_empty() => Ok(Context::default()),
            _ => self
                .get_context(&self.current_context)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("current context '{}' not found", self.current_context)),
        }
    }

    /// Lists all context names in order.
    pub fn list_contexts(&self) -> Vec<&str> {
        self.contexts.keys().map(|s| s.as_str()).collect()
    }
}

/// Loads the configuration, creating an empty file if none exists.
pub fn load_config(custom_path: Option<&str>) -> anyhow::Result<Config> {
    let config_path = match custom_path {
        Some(p) => PathBuf::from(p),
        None => Config::default_config_path()
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path"))?,
    };

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut cfg: Config = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&content)?
        }
    } else {
        let cfg = Config::default();
        std::fs::write(&config_path, serde_yaml::to_string(&cfg)?)?;
        cfg
    };

    cfg.config_path = config_path;
    Ok(cfg)
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use aicall_bridge::AgentType;

    fn temp_config() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let cfg = load_config(path.to_str()).unwrap();
        (dir, cfg)
    }

    #[test]
    fn test_load_creates_file() {
        let (_dir, cfg) = temp_config();
        assert!(cfg.path().exists());
        assert!(cfg.contexts.is_empty());
    }

    #[test]
    fn test_context_roundtrip_on_disk() {
        let (_dir, mut cfg) = temp_config();
        let mut ctx = Context::default();
        ctx.bridge.agent_type = AgentType::AvatarAgent;
        ctx.settle_ms = 5;
        cfg.set_context("avatar", ctx).unwrap();
        cfg.use_context("avatar").unwrap();

        let reloaded = load_config(cfg.path().to_str()).unwrap();
        assert_eq!(reloaded.current_context, "avatar");
        let ctx = reloaded.resolve_context(None).unwrap();
        assert_eq!(ctx.name, "avatar");
        assert_eq!(ctx.bridge.agent_type, AgentType::AvatarAgent);
        assert_eq!(ctx.settle_ms, 5);
        assert_eq!(ctx.event_buffer, DEFAULT_EVENT_BUFFER);
    }

    #[test]
    fn test_use_unknown_context() {
        let (_dir, mut cfg) = temp_config();
        assert!(cfg.use_context("missing").is_err());
        assert!(cfg.resolve_context(Some("missing")).is_err());
    }

    #[test]
    fn test_resolve_defaults_without_current() {
        let (_dir, cfg) = temp_config();
        let ctx = cfg.resolve_context(None).unwrap();
        assert_eq!(ctx, Context::default());
    }

    #[test]
    fn test_delete_current_context() {
        let (_dir, mut cfg) = temp_config();
        cfg.set_context("a", Context::default()).unwrap();
        cfg.set_context("b", Context::default()).unwrap();
        cfg.use_context("a").unwrap();
        cfg.delete_context("a").unwrap();
        assert!(cfg.current_context.is_empty());
        assert_eq!(cfg.list_contexts(), vec!["b"]);
        assert!(cfg.delete_context("a").is_err());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
current_context: dev
contexts:
  dev:
    bridge:
      agentType: VisionAgent
      fatalErrorFloor: 2000
      call:
        agentVoiceId: zhixiaobai
    settleMs: 10
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        let ctx = cfg.resolve_context(None).unwrap();
        assert_eq!(ctx.bridge.agent_type, AgentType::VisionAgent);
        assert_eq!(ctx.bridge.fatal_error_floor, Some(2000));
        assert_eq!(ctx.bridge.call.agent_voice_id.as_deref(), Some("zhixiaobai"));
        assert!(ctx.bridge.call.enable_speaker);
        assert_eq!(ctx.settle_ms, 10);
    }
}
