//! Recursive discovery and registration of route descriptor files.
//!
//! The directory tree is walked depth-first with entries sorted by file name, so
//! registration order is stable between runs. Each candidate file is loaded through
//! a [`DescriptorProvider`], its handler names are resolved against a
//! [`HandlerRegistry`], and the resulting chains are handed to a [`RouteRegistrar`].
//!
//! Loading the same tree twice into the same registrar registers every route twice;
//! nothing is deduplicated here.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::chain::HandlerChain;
use crate::descriptor::{DescriptorProvider, FileDescriptorProvider, RouteDescriptor};
use crate::error::{LoadError, ScanError};
use crate::handlers::HandlerRegistry;
use crate::logging::{LoadLogger, TracingLogger};
use crate::router::RouteRegistrar;

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Directories with these names are never descended into.
    pub excluded_directory_names: HashSet<String>,
    /// Files with these names are never loaded.
    pub excluded_file_names: HashSet<String>,
    /// Only files with this extension are loaded.
    pub module_extension: String,
    /// Glob patterns matched against paths relative to the root.
    pub exclude_globs: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            excluded_directory_names: HashSet::new(),
            excluded_file_names: HashSet::new(),
            module_extension: "toml".to_string(),
            exclude_globs: Vec::new(),
        }
    }
}

/// Outcome of loading one candidate file.
#[derive(Debug)]
pub enum FileOutcome {
    /// Registered (or attempted to register) this many method/path pairs.
    Registered(usize),
    /// Disabled or without a path.
    NotARoute,
    Failed(LoadError),
}

#[derive(Clone)]
pub struct RouteLoader {
    provider: Arc<dyn DescriptorProvider>,
    handlers: Arc<HandlerRegistry>,
    logger: Arc<dyn LoadLogger>,
}

impl RouteLoader {
    /// Loader reading descriptor files from disk and logging through `tracing`.
    pub fn new(handlers: HandlerRegistry) -> Self {
        Self::with_parts(Arc::new(FileDescriptorProvider), Arc::new(handlers), Arc::new(TracingLogger))
    }

    pub fn with_parts(
        provider: Arc<dyn DescriptorProvider>,
        handlers: Arc<HandlerRegistry>,
        logger: Arc<dyn LoadLogger>,
    ) -> Self {
        Self { provider, handlers, logger }
    }

    /// Scans `root` and registers every route found with `router`.
    ///
    /// Returns the number of files that were loaded as enabled, path-bearing
    /// descriptors. Files that fail to load are logged and skipped; a directory
    /// that cannot be read aborts the scan.
    pub async fn load_routes<R>(&self, router: &mut R, root: &Path, options: &LoadOptions) -> Result<usize, ScanError>
    where
        R: RouteRegistrar + ?Sized,
    {
        let candidates = discover(root.to_path_buf(), options.clone()).await?;
        let mut count = 0;
        for path in candidates {
            if let FileOutcome::Registered(_) = self.load_file(router, &path).await {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Loads a single descriptor file and registers its routes.
    pub async fn load_file<R>(&self, router: &mut R, path: &Path) -> FileOutcome
    where
        R: RouteRegistrar + ?Sized,
    {
        let descriptor = match self.provider.load(path).await {
            Ok(d) => d,
            Err(e) => {
                self.logger.error(path, &e);
                return FileOutcome::Failed(e);
            }
        };
        if !descriptor.is_route() {
            return FileOutcome::NotARoute;
        }
        let chains = match self.resolve(&descriptor) {
            Ok(c) => c,
            Err(e) => {
                self.logger.error(path, &e);
                return FileOutcome::Failed(e);
            }
        };

        let paths = descriptor.paths.as_deref().unwrap_or_default();
        let mut registered = 0;
        for (method, chain) in chains {
            for route_path in paths {
                router.register(method.clone(), route_path, chain.clone());
                self.logger
                    .info(&format!("Registered {} {} from {}", method, route_path, path.display()));
                registered += 1;
            }
        }
        FileOutcome::Registered(registered)
    }

    // Resolves every chain up front so a bad name registers nothing from the file.
    fn resolve(&self, descriptor: &RouteDescriptor) -> Result<Vec<(axum::http::Method, HandlerChain)>, LoadError> {
        descriptor
            .methods
            .iter()
            .filter_map(|spec| spec.handler.as_deref().map(|handler| (spec, handler)))
            .map(|(spec, handler)| {
                let chain = self.handlers.resolve(&spec.middlewares, handler)?;
                Ok((spec.method.clone(), chain))
            })
            .collect()
    }
}

/// Lists the candidate descriptor files under `root` in traversal order.
pub async fn discover(root: PathBuf, options: LoadOptions) -> Result<Vec<PathBuf>, ScanError> {
    tokio::task::spawn_blocking(move || discover_blocking(&root, &options)).await?
}

fn discover_blocking(root: &Path, options: &LoadOptions) -> Result<Vec<PathBuf>, ScanError> {
    let globs = build_globset(&options.exclude_globs)?;
    // A root that is missing or not a directory fails here rather than yielding nothing.
    std::fs::read_dir(root).map_err(|source| ScanError::ReadDir { path: root.to_path_buf(), source })?;
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            if globs.is_match(relative) {
                return false;
            }
            if entry.file_type().is_dir() {
                !options.excluded_directory_names.contains(name.as_ref())
            } else {
                !options.excluded_file_names.contains(name.as_ref())
            }
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches_ext = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == options.module_extension);
        if matches_ext {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for p in patterns {
        builder.add(Glob::new(p)?);
    }
    Ok(builder.build()?)
}
