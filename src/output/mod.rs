//! Output module for saving scraped records
//!
//! Saving is dispatched through a [`SaveRegistry`] keyed by
//! `(format, per_page)`. Built-in handlers cover JSON, CSV, YAML and
//! SQLite; users can register their own or override the built-ins.
//!
//! # Formats
//!
//! - `json`, `csv`, `yaml`/`yml`: written once at the end of a crawl, to
//!   the output file or stdout
//! - `sqlite`/`db`: appended after every page or once at the end; requires
//!   an output path

mod formats;
mod sqlite;

pub use formats::{save_csv, save_json, save_yaml, to_csv_string};
pub use sqlite::{save_sqlite, SqliteOutput};

use crate::extract::{flatten, Record, ScrapedData};
use crate::rules::Handler;
use crate::SaveError;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// A save handler: receives the flattened rows and the output path and
/// reports whether saving succeeded
pub type SaveFn = Handler<(Vec<Record>, Option<PathBuf>), bool>;

/// Dispatch table from `(format, per_page)` to save handlers
#[derive(Clone, Default)]
pub struct SaveRegistry {
    handlers: HashMap<(String, bool), SaveFn>,
}

impl SaveRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in handlers
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register(
            "json",
            false,
            Handler::sync(|(rows, path): (Vec<Record>, Option<PathBuf>)| {
                save_json(&rows, path.as_deref())
            }),
        );
        registry.register(
            "csv",
            false,
            Handler::sync(|(rows, path): (Vec<Record>, Option<PathBuf>)| {
                save_csv(&rows, path.as_deref())
            }),
        );
        for format in ["yaml", "yml"] {
            registry.register(
                format,
                false,
                Handler::sync(|(rows, path): (Vec<Record>, Option<PathBuf>)| {
                    save_yaml(&rows, path.as_deref())
                }),
            );
        }
        for format in ["sqlite", "db"] {
            for per_page in [false, true] {
                registry.register(
                    format,
                    per_page,
                    Handler::sync(|(rows, path): (Vec<Record>, Option<PathBuf>)| {
                        save_sqlite(&rows, path.as_deref())
                    }),
                );
            }
        }

        registry
    }

    /// Registers a handler, replacing any previous one for the same key
    ///
    /// Format names are case-insensitive.
    pub fn register(&mut self, format: &str, per_page: bool, handler: SaveFn) {
        let key = (format.to_lowercase(), per_page);
        if self.handlers.insert(key, handler).is_some() {
            tracing::debug!(
                "Replaced save handler for '{}' (per page: {})",
                format,
                per_page
            );
        }
    }

    /// Picks the format to save in
    ///
    /// The output file's extension wins over the requested format.
    ///
    /// # Example
    ///
    /// ```
    /// use std::path::Path;
    /// use sumi_harvest::output::SaveRegistry;
    ///
    /// assert_eq!(SaveRegistry::resolve_format("json", Some(Path::new("out.CSV"))), "csv");
    /// assert_eq!(SaveRegistry::resolve_format("json", Some(Path::new("out"))), "json");
    /// assert_eq!(SaveRegistry::resolve_format("YAML", None), "yaml");
    /// ```
    pub fn resolve_format(format: &str, output: Option<&Path>) -> String {
        output
            .and_then(Path::extension)
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .unwrap_or(format)
            .to_lowercase()
    }

    pub fn has_handler(&self, format: &str, per_page: bool) -> bool {
        self.handlers
            .contains_key(&(format.to_lowercase(), per_page))
    }

    /// True if any registered handler is asynchronous
    pub fn has_async(&self) -> bool {
        self.handlers.values().any(Handler::is_async)
    }

    /// Flattens the buffer and hands the rows to the matching handler
    ///
    /// The buffer is cleared only when the handler reports success; on any
    /// failure it is left untouched so a later save can retry.
    ///
    /// # Arguments
    ///
    /// * `buffer` - Scraped items accumulated since the last successful save
    /// * `format` - Requested format, overridden by the output extension
    /// * `output` - Output path, `None` for stdout
    /// * `per_page` - Whether this is a per-page flush
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Saved, or nothing to save
    /// * `Err(SaveError)` - No handler, or the handler failed
    pub async fn save(
        &self,
        buffer: &mut Vec<ScrapedData>,
        format: &str,
        output: Option<&Path>,
        per_page: bool,
    ) -> Result<(), SaveError> {
        let format = Self::resolve_format(format, output);
        let Some(handler) = self.handlers.get(&(format.clone(), per_page)) else {
            return Err(SaveError::NoHandler { format, per_page });
        };

        let rows = flatten(buffer.clone());
        if rows.is_empty() {
            tracing::info!("No data was scraped. Skipped saving");
            return Ok(());
        }
        let row_count = rows.len();

        match handler.call((rows, output.map(Path::to_path_buf))).await {
            Ok(true) => {
                tracing::debug!("Saved {} records as {}", row_count, format);
                buffer.clear();
                Ok(())
            }
            Ok(false) => Err(SaveError::Failed { format }),
            Err(source) => Err(SaveError::Handler { format, source }),
        }
    }
}

impl fmt::Debug for SaveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.handlers.keys().collect();
        keys.sort();
        f.debug_struct("SaveRegistry")
            .field("handlers", &keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Data;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn item(element_index: usize, key: &str, value: &str) -> ScrapedData {
        let mut data = Data::new();
        data.insert(key.to_string(), json!(value));
        ScrapedData {
            page_number: 1,
            page_url: "https://a.com/".into(),
            group_id: 0,
            group_index: 0,
            element_index,
            data,
        }
    }

    #[test]
    fn test_builtin_keys() {
        let registry = SaveRegistry::with_builtins();
        for format in ["json", "csv", "yaml", "yml", "sqlite", "db"] {
            assert!(registry.has_handler(format, false), "{}", format);
        }
        assert!(registry.has_handler("sqlite", true));
        assert!(registry.has_handler("db", true));
        assert!(!registry.has_handler("json", true));
        assert!(!registry.has_async());
    }

    #[test]
    fn test_resolve_format_prefers_extension() {
        assert_eq!(
            SaveRegistry::resolve_format("json", Some(Path::new("/tmp/x.yml"))),
            "yml"
        );
        assert_eq!(
            SaveRegistry::resolve_format("csv", Some(Path::new("/tmp/.hidden"))),
            "csv"
        );
        assert_eq!(SaveRegistry::resolve_format("Custom", None), "custom");
    }

    #[tokio::test]
    async fn test_missing_handler_keeps_buffer() {
        let registry = SaveRegistry::new();
        let mut buffer = vec![item(0, "a", "1")];

        let err = registry
            .save(&mut buffer, "custom", None, false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SaveError::NoHandler { ref format, per_page: false } if format == "custom"
        ));
        assert_eq!(buffer.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_handler_keeps_buffer() {
        let mut registry = SaveRegistry::new();
        registry.register("custom", false, Handler::sync(|_| Ok(false)));
        let mut buffer = vec![item(0, "a", "1")];

        let err = registry
            .save(&mut buffer, "custom", None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, SaveError::Failed { .. }));
        assert_eq!(buffer.len(), 1);
    }

    #[tokio::test]
    async fn test_erroring_handler_keeps_buffer() {
        let mut registry = SaveRegistry::new();
        registry.register(
            "custom",
            true,
            Handler::sync(|_| Err(anyhow::anyhow!("disk full"))),
        );
        let mut buffer = vec![item(0, "a", "1")];

        let err = registry
            .save(&mut buffer, "custom", None, true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert_eq!(buffer.len(), 1);
    }

    #[tokio::test]
    async fn test_success_clears_buffer_and_passes_flattened_rows() {
        let received: Rc<RefCell<Vec<Record>>> = Rc::default();
        let sink = Rc::clone(&received);

        let mut registry = SaveRegistry::new();
        registry.register(
            "custom",
            false,
            Handler::from_async(move |(rows, path): (Vec<Record>, Option<PathBuf>)| {
                let sink = Rc::clone(&sink);
                async move {
                    assert_eq!(path, Some(PathBuf::from("out.custom")));
                    sink.borrow_mut().extend(rows);
                    Ok(true)
                }
            }),
        );
        assert!(registry.has_async());

        let mut buffer = vec![item(0, "a", "1"), item(0, "b", "2"), item(1, "a", "3")];
        registry
            .save(&mut buffer, "json", Some(Path::new("out.custom")), false)
            .await
            .unwrap();

        assert!(buffer.is_empty());
        let rows = received.borrow();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].data["a"], json!("1"));
        assert_eq!(rows[0].data["b"], json!("2"));
        assert_eq!(rows[1].element_index, 1);
    }

    #[tokio::test]
    async fn test_empty_buffer_skips_handler() {
        let mut registry = SaveRegistry::new();
        registry.register("custom", false, Handler::sync(|_| Ok(false)));

        let mut buffer = Vec::new();
        assert!(registry
            .save(&mut buffer, "custom", None, false)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_register_overrides_builtin() {
        let mut registry = SaveRegistry::with_builtins();
        registry.register("JSON", false, Handler::sync(|_| Ok(false)));

        let mut buffer = vec![item(0, "a", "1")];
        let err = registry
            .save(&mut buffer, "json", None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, SaveError::Failed { .. }));
    }
}
