//! Build configuration: `stackasm.toml` plus flag and environment overrides.
//!
//! ```toml
//! [target]
//! registers = 3
//!
//! [build]
//! runtime = "../runtime"
//! cc = "gcc"
//! ```


use std::path::{Path, PathBuf};

use crate::asm::MAX_ALLOCATABLE;
use crate::diagnostic::Diagnostic;
use crate::span::Span;

/// File name looked up in the input's directory and its ancestors.
pub const CONFIG_FILE: &str = "stackasm.toml";
/// Environment variable naming the runtime directory.
pub const RUNTIME_ENV: &str = "STACKASM_RUNTIME";
pub const DEFAULT_RUNTIME: &str = "../runtime";
pub const DEFAULT_CC: &str = "gcc";

/// Settings read from a `stackasm.toml`. Absent keys stay `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuildConfig {
    /// Directory holding the config file; relative paths resolve against it.
    pub root_dir: PathBuf,
    pub registers: Option<u8>,
    pub runtime: Option<PathBuf>,
    pub cc: Option<String>,
}

impl BuildConfig {
    /// Load and parse a config file.
    pub fn load(toml_path: &Path) -> Result<BuildConfig, Diagnostic> {
        let content = std::fs::read_to_string(toml_path).map_err(|e| {
            Diagnostic::error(
                format!("cannot read '{}': {}", toml_path.display(), e),
                Span::dummy(),
            )
        })?;
        let root_dir = toml_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        let config = Self::parse(&content, root_dir)?;
        log::debug!("loaded {}: {:?}", toml_path.display(), config);
        Ok(config)
    }

    /// Section-aware parse of the small TOML subset the file uses.
    pub fn parse(content: &str, root_dir: PathBuf) -> Result<BuildConfig, Diagnostic> {
        let err = |msg: String| Diagnostic::error(msg, Span::dummy());

        let mut config = BuildConfig {
            root_dir,
            ..Self::default()
        };
        let mut section = String::new();

        for (idx, line) in content.lines().enumerate() {
            let lineno = idx + 1;
            let trimmed = line.trim();
            if trimmed.starts_with('#') || trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                section = trimmed[1..trimmed.len() - 1].trim().to_string();
                continue;
            }
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(err(format!(
                    "{}:{}: expected `key = value`",
                    CONFIG_FILE, lineno
                )));
            };
            let key = key.trim().trim_matches('"');
            let value = strip_comment(value.trim());

            match (section.as_str(), key) {
                ("target", "registers") => {
                    let n: u8 = value.parse().map_err(|_| {
                        err(format!(
                            "{}:{}: `registers` must be an integer, got `{}`",
                            CONFIG_FILE, lineno, value
                        ))
                    })?;
                    config.registers = Some(n);
                }
                ("build", "runtime") => {
                    let path = PathBuf::from(parse_string(value, lineno)?);
                    config.runtime = Some(config.root_dir.join(path));
                }
                ("build", "cc") => config.cc = Some(parse_string(value, lineno)?),
                _ => log::warn!("{}:{}: ignoring unknown key `{}`", CONFIG_FILE, lineno, key),
            }
        }

        Ok(config)
    }

    /// Find a config file in `start_dir` or its ancestors.
    pub fn find(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.exists() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Load the config governing `input`, if there is one.
    pub fn discover(input: &Path) -> Result<Option<BuildConfig>, Diagnostic> {
        let dir = match input.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        match Self::find(dir) {
            Some(path) => Self::load(&path).map(Some),
            None => Ok(None),
        }
    }
}

/// Drop a trailing `# comment` outside of a quoted string.
fn strip_comment(value: &str) -> &str {
    if value.starts_with('"') {
        if let Some(close) = value[1..].find('"') {
            return &value[..close + 2];
        }
        return value;
    }
    match value.find('#') {
        Some(i) => value[..i].trim_end(),
        None => value,
    }
}

fn parse_string(value: &str, lineno: usize) -> Result<String, Diagnostic> {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        Ok(value[1..value.len() - 1].to_string())
    } else {
        Err(Diagnostic::error(
            format!(
                "{}:{}: expected a quoted string, got `{}`",
                CONFIG_FILE, lineno, value
            ),
            Span::dummy(),
        ))
    }
}

// ─── Resolution ───────────────────────────────────────────────────

/// Runtime directory: flag, then environment, then config file, then default.
pub fn resolve_runtime(
    flag: Option<&Path>,
    env_value: Option<&str>,
    config: Option<&BuildConfig>,
) -> PathBuf {
    if let Some(dir) = flag {
        return dir.to_path_buf();
    }
    if let Some(dir) = env_value.filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(dir) = config.and_then(|c| c.runtime.clone()) {
        return dir;
    }
    PathBuf::from(DEFAULT_RUNTIME)
}

/// C compiler used to assemble and link.
pub fn resolve_cc(flag: Option<&str>, config: Option<&BuildConfig>) -> String {
    flag.map(str::to_string)
        .or_else(|| config.and_then(|c| c.cc.clone()))
        .unwrap_or_else(|| DEFAULT_CC.to_string())
}

/// Usable register count. Out-of-range values are rejected, not clamped.
pub fn resolve_registers(flag: Option<u8>, config: Option<&BuildConfig>) -> Result<u8, Diagnostic> {
    let (n, origin) = match (flag, config.and_then(|c| c.registers)) {
        (Some(n), _) => (n, "--registers"),
        (None, Some(n)) => (n, CONFIG_FILE),
        (None, None) => return Ok(MAX_ALLOCATABLE),
    };
    if (1..=MAX_ALLOCATABLE).contains(&n) {
        Ok(n)
    } else {
        Err(Diagnostic::error(
            format!("{}: register count {} is out of range", origin, n),
            Span::dummy(),
        )
        .with_help(format!("use a value between 1 and {}", MAX_ALLOCATABLE)))
    }
}
