use std::path::PathBuf;

use thiserror::Error;

use crate::FragmentKind;

/// Configuration errors raised while loading fragments or composing shaders.
///
/// None of these are recoverable at runtime: a failed composition leaves the
/// previously composed shader in place and the error is reported upstream.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("no {kind} fragment registered under '{key}'")]
    UnknownFragment { kind: FragmentKind, key: String },

    #[error("template is missing required placeholder '{0}'")]
    MissingPlaceholder(&'static str),

    #[error("template contains placeholder '{token}' {count} times; expected exactly once")]
    RepeatedPlaceholder { token: &'static str, count: usize },

    #[error("{kind} fragments '{first}' and '{second}' both resolve to key '{key}'")]
    DuplicateKey {
        kind: FragmentKind,
        key: String,
        first: String,
        second: String,
    },

    #[error("{kind} fragments '{first}' and '{second}' share display label '{label}'")]
    LabelCollision {
        kind: FragmentKind,
        label: String,
        first: String,
        second: String,
    },

    #[error("fragment file {0} does not yield a usable key")]
    InvalidKey(PathBuf),

    #[error("shader template not found at {0}")]
    TemplateMissing(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
