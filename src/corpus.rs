//! Corpus loading.
//!
//! The corpus is a JSON array of clauses. Portuguese field names are the
//! canonical ones (`texto`, `titulo`, `secao`); English aliases are accepted.
//! The first element decides how the whole file is read.

use std::fs;
use std::path::{Path, PathBuf};

use index::Document;
use serde_json::{Map, Value};
use thiserror::Error;

const TEXT_KEYS: [&str; 2] = ["texto", "text"];
const TITLE_KEYS: [&str; 2] = ["titulo", "title"];
const SECTION_KEYS: [&str; 3] = ["secao", "section", "id"];

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("no corpus file found (tried: {})", display_paths(.0))]
    NotFound(Vec<PathBuf>),

    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {}", .path.display(), .source)]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported corpus format: {0}")]
    Format(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Layout detected from the first corpus element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusFormat {
    /// Every clause has a title and a text; both are embedded.
    Titled,
    /// Text only.
    Plain,
}

/// Loads the first candidate path that exists.
///
/// Clauses with blank text are skipped.
pub fn load_corpus<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Document>, CorpusError> {
    let path = paths
        .iter()
        .map(AsRef::<Path>::as_ref)
        .find(|p| p.exists())
        .ok_or_else(|| {
            CorpusError::NotFound(paths.iter().map(|p| p.as_ref().to_path_buf()).collect())
        })?;

    tracing::info!(path = %path.display(), "loading corpus");
    let raw = fs::read_to_string(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&raw).map_err(|source| CorpusError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let (format, documents) = parse_corpus(&value)?;
    tracing::info!(?format, documents = documents.len(), "corpus loaded");
    Ok(documents)
}

/// Parses an already decoded corpus value.
pub fn parse_corpus(value: &Value) -> Result<(CorpusFormat, Vec<Document>), CorpusError> {
    let items = match value {
        Value::Array(items) if !items.is_empty() => items,
        Value::Array(_) => return Err(CorpusError::Format("corpus array is empty".into())),
        _ => {
            return Err(CorpusError::Format(
                "top level must be an array of clauses".into(),
            ))
        }
    };

    let format = detect_format(&items[0])?;
    let mut documents = Vec::with_capacity(items.len());
    for item in items {
        let Some(fields) = item.as_object() else {
            continue;
        };
        let Some(text) = string_field(fields, &TEXT_KEYS).filter(|t| !t.trim().is_empty()) else {
            continue;
        };

        let mut doc = Document::new(text);
        if format == CorpusFormat::Titled {
            if let Some(title) = string_field(fields, &TITLE_KEYS) {
                doc = doc.with_title(title);
            }
        }
        if let Some(section) = string_field(fields, &SECTION_KEYS) {
            doc = doc.with_section(section);
        }
        documents.push(doc);
    }
    Ok((format, documents))
}

fn detect_format(first: &Value) -> Result<CorpusFormat, CorpusError> {
    let fields = first.as_object().ok_or_else(|| {
        CorpusError::Format("unrecognised layout: clauses must be JSON objects".into())
    })?;
    let has = |keys: &[&str]| keys.iter().any(|k| fields.contains_key(*k));

    match (has(&TITLE_KEYS), has(&TEXT_KEYS)) {
        (true, true) => Ok(CorpusFormat::Titled),
        (false, true) => Ok(CorpusFormat::Plain),
        _ => Err(CorpusError::Format(
            "unrecognised layout: expected a 'texto' or 'text' field".into(),
        )),
    }
}

// Numbers are accepted so numeric ids still label a section.
fn string_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match fields.get(*k)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
