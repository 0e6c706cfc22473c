/// Convenience result type used across postforge.
pub type ForgeResult<T> = Result<T, ForgeError>;

/// Which kind of stored record a lookup failed to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    /// A template document.
    Template,
    /// A user document.
    User,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Template => f.write_str("template"),
            Self::User => f.write_str("user"),
        }
    }
}

/// Top-level error taxonomy surfaced to callers of the render APIs.
#[derive(thiserror::Error, Debug)]
pub enum ForgeError {
    /// A template or user id did not resolve in the document store.
    #[error("not found: {kind} '{id}'")]
    NotFound {
        /// Record kind that was looked up.
        kind: RecordKind,
        /// The unresolved id.
        id: String,
    },

    /// Network, HTTP status, or decode failure while retrieving an asset.
    #[error("asset fetch error: {url}: {reason}")]
    AssetFetch {
        /// Source URL (or path) of the asset.
        url: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// The template is missing or carries an unusable geometry/style field.
    #[error("invalid template: field '{field}': {reason}")]
    InvalidTemplate {
        /// Offending document field, e.g. `frameSize`.
        field: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// Raster or video encoding failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The upload collaborator rejected the finished artifact.
    #[error("upload error: {0}")]
    Upload(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ForgeError {
    /// Build a [`ForgeError::NotFound`] value.
    pub fn not_found(kind: RecordKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Build a [`ForgeError::AssetFetch`] value.
    pub fn asset_fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AssetFetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`ForgeError::InvalidTemplate`] value.
    pub fn invalid_template(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`ForgeError::Encoding`] value.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Build a [`ForgeError::Upload`] value.
    pub fn upload(msg: impl Into<String>) -> Self {
        Self::Upload(msg.into())
    }

    /// Stable machine-readable tag for this error, used in tagged results.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AssetFetch { .. } => "asset_fetch",
            Self::InvalidTemplate { .. } => "invalid_template",
            Self::Encoding(_) => "encoding",
            Self::Upload(_) => "upload",
            Self::Other(_) => "internal",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
