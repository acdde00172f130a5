//! Core analyzer for orchestrating lint execution.

use crate::catalog::{CatalogError, FATAL_CHECK_ERROR};
use crate::checker::{build_catalog, Checker, CheckerBox, Linter};
use crate::config::Config;
use crate::context::FileContext;
use crate::model::parse_module;
use crate::resolver::FsModuleResolver;
use crate::sink::MessagePolicy;
use crate::types::{LintResult, Location, Violation};
use crate::utils::{module_name_for, ModulePath};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// IO error reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing a Python source file.
    #[error("Parse error in {path}: {message}")]
    Parse {
        /// Path to the file that failed to parse.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// Glob pattern error.
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// File discovery error.
    #[error("File discovery failed: {0}")]
    Walk(#[from] ignore::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Two checkers declare the same message.
    #[error("Invalid message catalog: {0}")]
    Catalog(#[from] CatalogError),
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    checkers: Vec<CheckerBox>,
    exclude_patterns: Vec<String>,
    python_path: Vec<PathBuf>,
    config: Option<Config>,
    fail_on_parse_error: bool,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root directory (or single file) to analyze.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Adds a checker to the analyzer.
    #[must_use]
    pub fn checker<C: Checker + 'static>(mut self, checker: C) -> Self {
        self.checkers.push(Box::new(checker));
        self
    }

    /// Adds a boxed checker to the analyzer.
    #[must_use]
    pub fn checker_box(mut self, checker: CheckerBox) -> Self {
        self.checkers.push(checker);
        self
    }

    /// Adds an exclude glob pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds multiple exclude glob patterns.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Adds an import root for cross-module resolution.
    #[must_use]
    pub fn python_path(mut self, root: impl Into<PathBuf>) -> Self {
        self.python_path.push(root.into());
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets whether to fail on unparseable files (default: false).
    #[must_use]
    pub fn fail_on_parse_error(mut self, fail: bool) -> Self {
        self.fail_on_parse_error = fail;
        self
    }

    /// Builds the analyzer.
    ///
    /// Checkers disabled in the configuration are dropped here.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot be read, an exclude
    /// pattern is invalid, or two checkers declare the same message.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let config = self.config.unwrap_or_default();
        let root = self
            .root
            .unwrap_or_else(|| config.analyzer.root.clone());

        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(&root)
        };

        let mut exclude_patterns = self.exclude_patterns;
        exclude_patterns.extend(config.analyzer.exclude.iter().cloned());
        for pattern in &exclude_patterns {
            glob::Pattern::new(pattern)?;
        }

        let base = if root.is_file() {
            root.parent().map_or_else(|| root.clone(), Path::to_path_buf)
        } else {
            root.clone()
        };
        let mut python_path = self.python_path;
        python_path.extend(config.analyzer.python_path.iter().cloned());
        let python_path = python_path
            .into_iter()
            .map(|p| if p.is_absolute() { p } else { base.join(p) })
            .collect();

        let checkers: Vec<CheckerBox> = self
            .checkers
            .into_iter()
            .filter(|checker| {
                let enabled = config.is_rule_enabled(checker.name());
                if !enabled {
                    debug!("Skipping disabled checker: {}", checker.name());
                }
                enabled
            })
            .collect();

        let catalog = build_catalog(&checkers)?;
        let severity: HashMap<String, _> = config
            .rules
            .iter()
            .filter_map(|(name, rule)| rule.severity.map(|s| (name.clone(), s)))
            .collect();
        let policy = MessagePolicy::new(&catalog, &config.messages, &severity);

        Ok(Analyzer {
            root,
            base,
            linter: Linter::from_parts(checkers, catalog, policy),
            exclude_patterns,
            python_path,
            respect_gitignore: config.analyzer.respect_gitignore,
            fail_on_parse_error: self.fail_on_parse_error,
        })
    }
}

/// The main analyzer that orchestrates lint execution.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    root: PathBuf,
    base: PathBuf,
    linter: Linter,
    exclude_patterns: Vec<String>,
    python_path: Vec<PathBuf>,
    respect_gitignore: bool,
    fail_on_parse_error: bool,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the root being analyzed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the number of registered checkers.
    #[must_use]
    pub fn checker_count(&self) -> usize {
        self.linter.checkers().len()
    }

    /// The underlying linter.
    #[must_use]
    pub fn linter(&self) -> &Linter {
        &self.linter
    }

    /// Analyzes all files and returns the results.
    ///
    /// A checker failure aborts only the affected file: its earlier
    /// diagnostics are kept and an `F9001` diagnostic records the failure.
    ///
    /// # Errors
    ///
    /// Returns an error if file discovery fails, or if a file cannot be
    /// parsed while `fail_on_parse_error` is set.
    pub fn analyze(&self) -> Result<LintResult, AnalyzerError> {
        info!("Starting analysis at {:?}", self.root);

        let mut result = LintResult::new();
        let files = self.discover_files()?;

        info!("Found {} files to analyze", files.len());

        let modules: Vec<(PathBuf, ModulePath)> = files
            .into_iter()
            .map(|path| {
                let module = module_name_for(&path);
                (path, module)
            })
            .collect();

        let mut resolver = FsModuleResolver::new(self.python_path.iter().cloned());
        for (_, module) in &modules {
            resolver.add_root(module.package_root.clone());
        }

        for (path, module_path) in modules {
            debug!("Analyzing: {} ({})", path.display(), module_path.name);

            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Failed to read {}: {}", path.display(), e);
                    continue;
                }
            };

            let module = match parse_module(&module_path.name, path.clone(), content.clone()) {
                Ok(module) => module,
                Err(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    if self.fail_on_parse_error {
                        return Err(AnalyzerError::Parse {
                            path,
                            message: e.to_string(),
                        });
                    }
                    continue;
                }
            };
            if module.syntax_errors {
                warn!("Syntax errors in {}; checking the recovered tree", path.display());
            }

            let ctx = FileContext::with_module_name(
                &path,
                &content,
                &self.base,
                module_path.name,
                module_path.package_root,
            );
            let report = self.linter.check_module(&ctx, &module, &resolver);
            result.violations.extend(report.violations);
            result.files_checked += 1;

            if let Some(error) = report.error {
                warn!("Checking {} aborted: {}", path.display(), error);
                result.files_failed += 1;
                if let Some(violation) = self.fatal_violation(&ctx, &error.to_string()) {
                    result.violations.push(violation);
                }
            }
        }

        result.sort();

        info!(
            "Analysis complete: {} violations in {} files",
            result.violations.len(),
            result.files_checked
        );

        Ok(result)
    }

    fn fatal_violation(&self, ctx: &FileContext<'_>, error: &str) -> Option<Violation> {
        let def = &FATAL_CHECK_ERROR;
        let policy = self.linter.policy();
        if !policy.is_enabled(def.code) {
            return None;
        }
        let args = vec![error.to_string()];
        Some(
            Violation::new(
                def.code,
                def.symbol,
                policy.severity(def.code),
                Location::new(ctx.relative_path.clone(), 1, 0),
                def.render(&args),
            )
            .with_checker("host")
            .with_args(args),
        )
    }

    /// Discovers all Python source files to analyze.
    fn discover_files(&self) -> Result<Vec<PathBuf>, AnalyzerError> {
        if self.root.is_file() {
            return Ok(vec![self.root.clone()]);
        }

        let mut builder = ignore::WalkBuilder::new(&self.root);
        builder
            .hidden(false)
            .git_ignore(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .require_git(false);

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("py") {
                continue;
            }

            if self.should_exclude(path) {
                debug!("Excluding: {}", path.display());
                continue;
            }

            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    /// Checks if a path should be excluded.
    fn should_exclude(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.base).unwrap_or(path);
        let candidates = [path.to_string_lossy(), relative.to_string_lossy()];

        self.exclude_patterns.iter().any(|pattern| {
            let matches_glob = glob::Pattern::new(pattern)
                .is_ok_and(|glob| candidates.iter().any(|c| glob.matches(c)));

            // Also check as substring for patterns like "**/build/**"
            let normalized = pattern.replace("**/", "").replace("/**", "");
            let matches_segment = !normalized.is_empty()
                && !normalized.contains('*')
                && candidates
                    .iter()
                    .any(|c| Path::new(c.as_ref()).components().any(|comp| comp.as_os_str() == normalized.as_str()));

            matches_glob || matches_segment
        })
    }
}
