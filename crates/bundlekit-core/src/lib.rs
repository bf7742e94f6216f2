//! Core engine for assembling bundle manifests into a chunk-framed binary
//! artifact.
//!
//! This crate resolves a declarative manifest into a dictionary-coded,
//! optionally-compressed artifact consumed by an in-game virtual
//! filesystem extractor. It is designed to be driven by a CLI frontend
//! without coupling to any specific UI.

/// Manifest block dispatch: walks a parsed manifest tree and drives an
/// [`Assembler`].
pub mod dispatch;
/// Accumulates manifest operations and emits the canonical chunk stream.
pub mod assembler;
/// Chunk framing and fixed-width integer writers for the wire format.
pub mod chunk;
/// Dictionary-coded compression and decompression.
pub mod compress;
/// Base85 output encoding.
pub mod encode;
/// Typed failure modes for manifest intake, file resolution, and assembly.
pub mod error;
/// Local file loading and `import_code` rewriting.
pub mod filestore;
/// Virtual path normalization and the source-file name sanitizer.
pub mod paths;
/// The shared string/path pool.
pub mod pool;

pub use assembler::Assembler;
pub use error::BundleError;
