use crate::config::{LoggingConfig, Section};
use std::{
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt;

use file_rotate::{compression::Compression, suffix::AppendCount, ContentLimit, FileRotate};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 3;

// -------- level helpers --------
fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

fn level_filter(s: &str) -> LevelFilter {
    parse_tracing_level(s)
        .map(LevelFilter::from_level)
        .unwrap_or(LevelFilter::OFF)
}

/// Returns true if target == prefix or target starts with "prefix::"
fn matches_target_prefix(target: &str, prefix: &str) -> bool {
    target == prefix
        || (target.starts_with(prefix) && target[prefix.len()..].starts_with("::"))
}

// -------- rotating writer for files --------
#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendCount>>>);

impl Write for RotWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log file writer poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log file writer poisoned"))?
            .flush()
    }
}

// A writer handle that may be None (drops writes)
struct RoutedWriter(Option<RotWriter>);

impl Write for RoutedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.0 {
            Some(w) => w.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.0 {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

/// Routes log records to per-target files, falling back to the default file.
#[derive(Clone, Default)]
struct FileRouter {
    default: Option<RotWriter>,
    by_prefix: Vec<(String, RotWriter)>,
}

impl FileRouter {
    fn resolve_for(&self, target: &str) -> Option<RotWriter> {
        self.by_prefix
            .iter()
            .find(|(prefix, _)| matches_target_prefix(target, prefix))
            .map(|(_, w)| w.clone())
            .or_else(|| self.default.clone())
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = RoutedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RoutedWriter(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        RoutedWriter(self.resolve_for(meta.target()))
    }
}

// -------- path resolution helpers --------

/// Absolute paths are kept as-is; relative paths are joined with `base_dir`.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn create_rotating_writer_at_path(
    log_path: &Path,
    max_bytes: usize,
    max_backups: usize,
) -> std::io::Result<RotWriter> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let rot = FileRotate::new(
        log_path,
        AppendCount::new(max_backups),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    );

    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

fn writer_for_section(name: &str, section: &Section, base_dir: &Path) -> Option<RotWriter> {
    if section.file.trim().is_empty() {
        return None;
    }

    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let max_backups = section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);
    let log_path = resolve_log_path(&section.file, base_dir);

    match create_rotating_writer_at_path(&log_path, max_bytes as usize, max_backups) {
        Ok(writer) => Some(writer),
        Err(e) => {
            eprintln!(
                "Failed to init log file for '{}': {} ({})",
                name,
                log_path.to_string_lossy(),
                e
            );
            None
        }
    }
}

// -------- filters --------

fn build_console_targets(cfg: &LoggingConfig) -> Targets {
    let default = cfg
        .get(DEFAULT_SECTION)
        .map(|s| level_filter(&s.console_level))
        .unwrap_or(LevelFilter::OFF);

    cfg.iter()
        .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
        .fold(Targets::new().with_default(default), |targets, (name, s)| {
            targets.with_target(name.clone(), level_filter(&s.console_level))
        })
}

fn build_file_targets(cfg: &LoggingConfig, router: &FileRouter) -> Targets {
    let has_default_file = router.default.is_some();
    let default = match cfg.get(DEFAULT_SECTION) {
        Some(s) if has_default_file => level_filter(&s.file_level),
        _ => LevelFilter::OFF,
    };

    cfg.iter()
        .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
        .fold(Targets::new().with_default(default), |targets, (name, s)| {
            let routed = has_default_file || router.by_prefix.iter().any(|(p, _)| p == name);
            let level = if routed {
                level_filter(&s.file_level)
            } else {
                LevelFilter::OFF
            };
            targets.with_target(name.clone(), level)
        })
}

fn build_file_router(cfg: &LoggingConfig, base_dir: &Path) -> FileRouter {
    let mut router = FileRouter::default();
    for (name, section) in cfg {
        let Some(writer) = writer_for_section(name, section, base_dir) else {
            continue;
        };
        if name == DEFAULT_SECTION {
            router.default = Some(writer);
        } else {
            router.by_prefix.push((name.clone(), writer));
        }
    }
    router
}

// -------- public init --------

/// Initialize logging from a configuration.
/// - `cfg`: target name → section; "default" covers everything else
/// - `base_dir`: base directory used to resolve relative log file paths
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` → `tracing` *before* installing the subscriber
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        init_default_logging();
        return;
    }

    use tracing_subscriber::{layer::SubscriberExt, prelude::*, Registry};

    let ansi = std::io::stdout().is_terminal();
    let router = build_file_router(cfg, base_dir);

    let console_layer = fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(build_console_targets(cfg));

    let file_layer = (!router.is_empty()).then(|| {
        let targets = build_file_targets(cfg, &router);
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(router)
            .with_filter(targets)
    });

    let _ = Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

fn init_default_logging() {
    let _ = fmt()
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .try_init();
}

// =================== tests ===================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_logging_config;
    use tempfile::tempdir;

    fn section(console: &str, file: &str, file_level: &str) -> Section {
        Section {
            console_level: console.into(),
            file: file.into(),
            file_level: file_level.into(),
            max_backups: Some(2),
            max_size_mb: Some(1),
        }
    }

    #[test]
    fn test_logging_level_parsing() {
        assert_eq!(parse_tracing_level("trace"), Some(Level::TRACE));
        assert_eq!(parse_tracing_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_tracing_level("Info"), Some(Level::INFO));
        assert_eq!(parse_tracing_level("warn"), Some(Level::WARN));
        assert_eq!(parse_tracing_level("ERROR"), Some(Level::ERROR));
        assert_eq!(parse_tracing_level("off"), None);
        assert_eq!(parse_tracing_level("none"), None);
        assert_eq!(parse_tracing_level("invalid"), Some(Level::INFO));
        assert_eq!(level_filter("off"), LevelFilter::OFF);
    }

    #[test]
    fn test_target_prefix_matching() {
        assert!(matches_target_prefix("family_tree", "family_tree"));
        assert!(matches_target_prefix(
            "family_tree::domain::service",
            "family_tree"
        ));
        assert!(!matches_target_prefix("family_tree_extra", "family_tree"));
        assert!(!matches_target_prefix("runtime", "family_tree"));
    }

    #[test]
    fn test_file_paths_resolved_against_base_dir() {
        let tmp = tempdir().unwrap();
        let resolved = resolve_log_path("logs/test.log", tmp.path());
        assert!(resolved.starts_with(tmp.path()));
        assert!(resolved.ends_with("logs/test.log"));

        let absolute = tmp.path().join("abs.log");
        let resolved = resolve_log_path(absolute.to_str().unwrap(), Path::new("/elsewhere"));
        assert_eq!(resolved, absolute);
    }

    #[test]
    fn test_create_rotating_writer_creates_parent() {
        let tmp = tempdir().unwrap();
        let p = tmp.path().join("nested/dir/app.log");

        let mut writer = create_rotating_writer_at_path(&p, 128 * 1024, 2).unwrap();
        writer.write_all(b"hello\n").unwrap();
        writer.flush().unwrap();

        assert!(p.parent().unwrap().exists());
        assert_eq!(std::fs::read_to_string(&p).unwrap(), "hello\n");
    }

    #[test]
    fn test_router_prefers_target_file_over_default() {
        let tmp = tempdir().unwrap();
        let mut cfg = default_logging_config();
        cfg.insert(
            "family_tree".into(),
            section("debug", "logs/family_tree_only.log", "trace"),
        );

        let router = build_file_router(&cfg, tmp.path());
        assert!(router.default.is_some());
        assert_eq!(router.by_prefix.len(), 1);

        let mut w = RoutedWriter(router.resolve_for("family_tree::domain"));
        w.write_all(b"routed\n").unwrap();
        w.flush().unwrap();

        let written =
            std::fs::read_to_string(tmp.path().join("logs/family_tree_only.log")).unwrap();
        assert_eq!(written, "routed\n");
        assert!(router.resolve_for("runtime::config").is_some());
    }

    #[test]
    fn test_empty_router_drops_writes() {
        let cfg: LoggingConfig =
            [("default".to_string(), section("info", "", "debug"))].into();
        let router = build_file_router(&cfg, Path::new("."));
        assert!(router.is_empty());

        let mut w = RoutedWriter(router.resolve_for("anything"));
        assert_eq!(w.write(b"dropped").unwrap(), 7);
    }

    #[test]
    fn test_targets_reflect_sections() {
        let tmp = tempdir().unwrap();
        let mut cfg = default_logging_config();
        cfg.insert("family_tree".into(), section("trace", "", "warn"));
        cfg.insert("noisy".into(), section("off", "", "off"));

        let console = build_console_targets(&cfg);
        assert!(console.would_enable("family_tree::domain", &Level::TRACE));
        assert!(!console.would_enable("noisy", &Level::ERROR));
        assert!(console.would_enable("other", &Level::INFO));
        assert!(!console.would_enable("other", &Level::DEBUG));

        let router = build_file_router(&cfg, tmp.path());
        let file = build_file_targets(&cfg, &router);
        assert!(file.would_enable("family_tree", &Level::WARN));
        assert!(!file.would_enable("family_tree", &Level::INFO));
        assert!(file.would_enable("other", &Level::DEBUG));
    }
}
