use std::collections::HashSet;
use std::path::PathBuf;

use serde::Deserialize;

use crate::loader::LoadOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutesConfig {
    /// Directory scanned for descriptor files.
    pub root: PathBuf,
    /// Descriptor file extension, without the leading dot.
    pub module_extension: String,
    #[serde(default)]
    pub excluded_directory_names: Vec<String>,
    #[serde(default)]
    pub excluded_file_names: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RouterConfig {
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SecurityConfig {
    pub enable_hsts: Option<bool>,
    pub hsts_max_age: Option<u64>,
    pub hsts_include_subdomains: Option<bool>,
    pub csp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// When set, logs are also written to a daily rotated file in this directory.
    pub directory: Option<PathBuf>,
    pub file_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub routes: RoutesConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub security: Option<SecurityConfig>,
    pub logging: LoggingConfig,
}

const DEFAULTS: &str = include_str!("../config/default.toml");

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        match ::config::Config::builder()
            .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
            .build()
            .and_then(|cfg| cfg.try_deserialize())
        {
            Ok(app_cfg) => app_cfg,
            Err(e) => {
                eprintln!("FATAL: Failed to load default config: {}", e);
                panic!("Failed to load default config: {}", e);
            }
        }
    }
}

impl RoutesConfig {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            excluded_directory_names: self.excluded_directory_names.iter().cloned().collect::<HashSet<_>>(),
            excluded_file_names: self.excluded_file_names.iter().cloned().collect::<HashSet<_>>(),
            module_extension: self.module_extension.clone(),
            exclude_globs: self.exclude_globs.clone(),
        }
    }
}

pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();

    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
        // Optional local file: routewald.toml (in CWD)
        .add_source(::config::File::with_name("routewald").required(false));

    if let Ok(custom_path) = std::env::var("ROUTEWALD_CONFIG") {
        builder = builder.add_source(::config::File::with_name(&custom_path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(
        ::config::Environment::with_prefix("ROUTEWALD")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("routes.excluded_directory_names")
            .with_list_parse_key("routes.excluded_file_names")
            .with_list_parse_key("routes.exclude_globs")
            .try_parsing(true),
    );

    let cfg = builder.build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

pub fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    // Server
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }

    // Routes
    let ext = cfg.routes.module_extension.as_str();
    if ext.is_empty() || ext.starts_with('.') {
        return Err(anyhow::anyhow!(
            "routes.module_extension must be non-empty and without a leading dot, got {:?}",
            ext
        ));
    }
    for pattern in &cfg.routes.exclude_globs {
        globset::Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid routes.exclude_globs entry {:?}: {}", pattern, e))?;
    }

    // Router
    if let Some(prefix) = cfg.router.prefix.as_deref() {
        if !prefix.starts_with('/') || prefix == "/" || prefix.ends_with('/') {
            return Err(anyhow::anyhow!(
                "router.prefix must start with '/', must not end with '/' and must not be '/', got {:?}",
                prefix
            ));
        }
    }

    Ok(())
}
