//! RFC 1924 Base85 output encoding, with optional line folding.

const LINE_WIDTH: usize = 70;

/// Encode `bytes` as Base85. When `multiline` is set, the output is
/// folded to [`LINE_WIDTH`]-character lines separated by `\n`.
///
/// # Panics
///
/// Never panics in practice: the RFC 1924 alphabet is pure ASCII, so the
/// internal `from_utf8` conversion always succeeds.
pub fn encode(bytes: &[u8], multiline: bool) -> String {
    let flat = base85::encode(bytes);
    if !multiline {
        return flat;
    }
    let mut out = String::with_capacity(flat.len() + flat.len() / LINE_WIDTH + 1);
    for (i, chunk) in flat.as_bytes().chunks(LINE_WIDTH).enumerate() {
        if i > 0 {
            out.push('\n');
        }
        // Base85's RFC 1924 alphabet is pure ASCII, so chunking on bytes
        // never splits a multi-byte character.
        out.push_str(std::str::from_utf8(chunk).expect("base85 output is ASCII"));
    }
    out
}
