//! Typed failure modes for manifest intake, file resolution, and assembly.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while building a bundle.
///
/// The assembler accumulates these rather than failing fast, so a single
/// run can surface every problem in the manifest instead of stopping at
/// the first one (see [`crate::assembler::Assembler::problems`]).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BundleError {
    /// A manifest block was malformed: wrong type, missing field, or an
    /// unrecognized `type` tag.
    #[error("invalid manifest block: {0}")]
    ManifestInvalid(String),

    /// Two manifest entries claimed the same virtual path for distinct
    /// content.
    #[error("duplicate target path: {0}")]
    DuplicateTarget(String),

    /// A local file referenced by the manifest does not exist or could
    /// not be read as UTF-8.
    #[error("source file missing or unreadable: {}", .0.display())]
    SourceMissing(PathBuf),

    /// A source file's `import_code` target could not be located.
    #[error("unresolved import in {}: {1}", .0.display())]
    ImportUnresolved(PathBuf, String),

    /// A string contains a code point outside the Basic Multilingual
    /// Plane (would require a UTF-16 surrogate pair).
    #[error("string requires a surrogate pair, unsupported: {0:?}")]
    EncodingUnsupported(String),

    /// A `launch` block's argument list was empty or exceeded 255 items.
    #[error("launch argv must have 1..=255 arguments, got {0}")]
    ArgvRange(usize),

    /// A deferred build or test pointed at a file that never acquired a
    /// game path during resolution.
    #[error("unresolved file reference for deferred block: {0}")]
    UnresolvedReference(String),
}
