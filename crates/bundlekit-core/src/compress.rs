//! A small dictionary coder: a frequency-selected substring dictionary,
//! greedy longest-match encoding, dictionary compaction, and 12-bit packed
//! codewords terminated by an end-of-stream sentinel equal to the final
//! dictionary size.

use std::collections::{HashMap, HashSet};

use crate::chunk::{header_chunk, VERSION_COMPRESSED};

/// Longest substring length the dictionary will ever store.
const MAX_ENTRY_LEN: usize = 15;
/// Total code space: indices `0..MAX_DICT_ENTRIES` are available to
/// dictionary entries and the end-of-stream sentinel together.
const MAX_DICT_ENTRIES: usize = 4095;

/// Phase A: count every substring of length 2..=15 and every distinct
/// byte, select the top substrings by frequency up to the remaining
/// budget, and assign initial codes in ascending-frequency order.
fn build_initial_dictionary(data: &[u8]) -> (Vec<Vec<u8>>, HashMap<Vec<u8>, u16>) {
    let mut substring_counts: HashMap<&[u8], usize> = HashMap::new();
    for len in 2..=MAX_ENTRY_LEN {
        if len > data.len() {
            break;
        }
        for window in data.windows(len) {
            *substring_counts.entry(window).or_insert(0) += 1;
        }
    }

    let mut byte_counts: HashMap<u8, usize> = HashMap::new();
    for &b in data {
        *byte_counts.entry(b).or_insert(0) += 1;
    }
    let distinct_byte_count = byte_counts.len();
    let budget = MAX_DICT_ENTRIES.saturating_sub(distinct_byte_count);

    let mut ranked_substrings: Vec<(&[u8], usize)> = substring_counts.into_iter().collect();
    ranked_substrings.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut with_freq: Vec<(Vec<u8>, usize)> = ranked_substrings
        .into_iter()
        .take(budget)
        .map(|(bytes, count)| (bytes.to_vec(), count))
        .collect();
    for (byte, count) in byte_counts {
        with_freq.push((vec![byte], count));
    }
    with_freq.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    let entries: Vec<Vec<u8>> = with_freq.into_iter().map(|(bytes, _)| bytes).collect();
    let lookup = entries
        .iter()
        .enumerate()
        .map(|(code, bytes)| (bytes.clone(), code as u16))
        .collect();
    (entries, lookup)
}

/// Phase B: greedily tokenize `data` against the initial dictionary,
/// always preferring the longest matching entry at each position.
fn encode_codewords(data: &[u8], lookup: &HashMap<Vec<u8>, u16>) -> Vec<u16> {
    let mut codewords = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let max_len = MAX_ENTRY_LEN.min(data.len() - i);
        let mut matched = None;
        for len in (1..=max_len).rev() {
            if let Some(&code) = lookup.get(&data[i..i + len]) {
                matched = Some((code, len));
                break;
            }
        }
        let (code, len) = matched.expect("every distinct byte is in the dictionary");
        codewords.push(code);
        i += len;
    }
    codewords
}

/// Phase C: drop dictionary entries the encoded stream never used,
/// renumber survivors starting at 0 in ascending-stored-length order, and
/// rewrite `codewords` through the old-to-new map.
fn compact_dictionary(entries: Vec<Vec<u8>>, codewords: &mut [u16]) -> Vec<Vec<u8>> {
    let used: HashSet<u16> = codewords.iter().copied().collect();
    let mut survivors: Vec<(u16, Vec<u8>)> = entries
        .into_iter()
        .enumerate()
        .filter(|(i, _)| used.contains(&(*i as u16)))
        .map(|(i, bytes)| (i as u16, bytes))
        .collect();
    survivors.sort_by(|a, b| a.1.len().cmp(&b.1.len()).then_with(|| a.1.cmp(&b.1)));

    let mut old_to_new = HashMap::with_capacity(survivors.len());
    let mut final_entries = Vec::with_capacity(survivors.len());
    for (new_code, (old_code, bytes)) in survivors.into_iter().enumerate() {
        old_to_new.insert(old_code, new_code as u16);
        final_entries.push(bytes);
    }
    for code in codewords.iter_mut() {
        *code = old_to_new[code];
    }
    final_entries
}

/// Phase D: serialize the final dictionary as run-length records: a
/// nonzero byte `((len-1)<<4)|count` (at most 15 entries per run) followed
/// by `count` raw entries of that length, repeated until a `0x00` byte
/// terminates the table.
fn write_dictionary_header(out: &mut Vec<u8>, entries: &[Vec<u8>]) {
    let mut i = 0;
    while i < entries.len() {
        let len = entries[i].len();
        let mut run_len = 0usize;
        while i + run_len < entries.len() && entries[i + run_len].len() == len && run_len < 15 {
            run_len += 1;
        }
        out.push((((len - 1) as u8) << 4) | run_len as u8);
        for entry in &entries[i..i + run_len] {
            out.extend_from_slice(entry);
        }
        i += run_len;
    }
    out.push(0);
}

/// Parse a dictionary header at the front of `bytes`, returning the
/// entries (in code order) and the number of bytes consumed.
fn read_dictionary_header(bytes: &[u8]) -> Option<(Vec<Vec<u8>>, usize)> {
    let mut entries = Vec::new();
    let mut pos = 0;
    loop {
        let header_byte = *bytes.get(pos)?;
        pos += 1;
        if header_byte == 0 {
            return Some((entries, pos));
        }
        let len = ((header_byte >> 4) as usize) + 1;
        let count = (header_byte & 0x0F) as usize;
        for _ in 0..count {
            let end = pos + len;
            entries.push(bytes.get(pos..end)?.to_vec());
            pos = end;
        }
    }
}

/// Phase E: pack 12-bit codewords two-to-three-bytes. An odd trailing
/// codeword is padded with zero bits in the low nybble of its final byte.
fn pack_codewords(codewords: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(codewords.len() * 3 / 2 + 1);
    let mut pairs = codewords.chunks_exact(2);
    for pair in &mut pairs {
        let (a, b) = (pair[0], pair[1]);
        out.push((a >> 4) as u8);
        out.push((((a & 0xF) << 4) | (b >> 8)) as u8);
        out.push((b & 0xFF) as u8);
    }
    if let [a] = *pairs.remainder() {
        out.push((a >> 4) as u8);
        out.push(((a & 0xF) << 4) as u8);
    }
    out
}

/// Unpack 12-bit codewords until `eos` is seen or the byte stream runs
/// out.
fn unpack_codewords(bytes: &[u8], eos: u16) -> Vec<u16> {
    let mut codewords = Vec::new();
    let mut chunks = bytes.chunks_exact(3);
    for chunk in &mut chunks {
        let (b0, b1, b2) = (chunk[0] as u16, chunk[1] as u16, chunk[2] as u16);
        let a = (b0 << 4) | (b1 >> 4);
        codewords.push(a);
        if a == eos {
            return codewords;
        }
        let b = ((b1 & 0xF) << 8) | b2;
        codewords.push(b);
        if b == eos {
            return codewords;
        }
    }
    if chunks.remainder().len() == 2 {
        let rem = chunks.remainder();
        let (b0, b1) = (rem[0] as u16, rem[1] as u16);
        codewords.push((b0 << 4) | (b1 >> 4));
    }
    codewords
}

/// Compress `data` into a version-2 header chunk, a dictionary header,
/// and the packed codeword body.
pub fn compress(data: &[u8]) -> Vec<u8> {
    let (initial_entries, lookup) = build_initial_dictionary(data);
    let mut codewords = encode_codewords(data, &lookup);
    let final_entries = compact_dictionary(initial_entries, &mut codewords);

    let eos = final_entries.len() as u16;
    codewords.push(eos);

    let mut out = header_chunk(VERSION_COMPRESSED);
    write_dictionary_header(&mut out, &final_entries);
    out.extend(pack_codewords(&codewords));
    out
}

/// Decompress a payload produced by [`compress`].
///
/// # Errors
///
/// Returns `Err` with a diagnostic message if the version-2 header chunk
/// or dictionary header is truncated, a codeword references an
/// out-of-range dictionary entry, or the codeword stream ends without an
/// end-of-stream sentinel.
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>, String> {
    // Skip the version-2 header chunk: [kind:u8][len:u16][version:u16][reserved:u16].
    let body = bytes.get(7..).ok_or("truncated version-2 header chunk")?;

    let (entries, header_len) =
        read_dictionary_header(body).ok_or("truncated compressed dictionary header")?;
    let eos = entries.len() as u16;
    let codewords = unpack_codewords(&body[header_len..], eos);

    let mut out = Vec::new();
    let mut saw_eos = false;
    for code in codewords {
        if code == eos {
            saw_eos = true;
            break;
        }
        let entry = entries
            .get(code as usize)
            .ok_or_else(|| format!("codeword {code} has no dictionary entry"))?;
        out.extend_from_slice(entry);
    }
    if !saw_eos {
        return Err("codeword stream ended without end-of-stream sentinel".to_string());
    }
    Ok(out)
}
