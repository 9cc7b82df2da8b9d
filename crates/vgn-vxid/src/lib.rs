//! Identifier codec — internal ids (vids) ↔ external ids (vxids).
//!
//! # Scheme
//!
//! Every entity is stored under a 128-bit UUID (the *vid*). At every service
//! boundary the same identity is rendered as `<prefix>_<base57>` (the
//! *vxid*), e.g. `inst_tjy87Sg2xF7dkXtFtrkU6W`. The mapping is bijective:
//!
//! - the base57 suffix is the UUID's 128-bit value written least-significant
//!   digit first in the 57-character alphabet below, padded at the end with
//!   the zero digit (`2`) to a fixed width of 22;
//! - decoding strips everything up to the first `_` (and anything after a
//!   second `_`), then folds the suffix back into a `u128`.
//!
//! The digit order and end-padding are load-bearing: existing rows were
//! written with this exact rendering, so any deviation breaks every stored
//! external reference. The empty string round-trips to the empty string.

use uuid::Uuid;

/// Base57 alphabet: alphanumerics minus the look-alikes `0`, `1`, `I`, `O`, `l`.
const ALPHABET: &[u8; 57] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Fixed width of the encoded suffix: ceil(log57(2^128)).
const ENCODED_LEN: usize = 22;

const PFX_DELIM: char = '_';

// ---------------------------------------------------------------------------
// Prefix registry
// ---------------------------------------------------------------------------

/// Per-entity vxid prefixes. Process-wide, read-only.
pub mod pfx {
    pub const ORGANIZATION: &str = "org";
    pub const USER: &str = "usr";
    pub const ACCOUNT: &str = "acct";
    pub const PORTFOLIO: &str = "prt";
    pub const STRATEGY: &str = "str";
    pub const INSTRUMENT: &str = "inst";
    pub const TRANSACTION: &str = "txn";
    pub const LOT: &str = "lot";
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure decoding or encoding an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VxidError {
    /// The input contains a character outside the base57 alphabet, or is not
    /// a parseable UUID on the encode side.
    Malformed { input: String },
    /// A well-formed 57-ary numeral whose value exceeds 128 bits.
    Overflow { input: String },
    /// Vectorised call with a prefix slice that is neither length 1 nor the
    /// id slice's length.
    PrefixLenMismatch { ids: usize, prefixes: usize },
}

impl std::fmt::Display for VxidError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed { input } => write!(f, "malformed identifier {input:?}"),
            Self::Overflow { input } => {
                write!(f, "identifier {input:?} does not fit in 128 bits")
            }
            Self::PrefixLenMismatch { ids, prefixes } => write!(
                f,
                "ids and prefixes slice lengths are different sizes {ids}, {prefixes}"
            ),
        }
    }
}

impl std::error::Error for VxidError {}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Convert an internal id (vid) to an external id (vxid).
///
/// Empty in → empty out. An empty prefix produces the bare short form with
/// no delimiter.
pub fn encode(vid: &str, prefix: &str) -> Result<String, VxidError> {
    if vid.is_empty() {
        return Ok(String::new());
    }

    let uuid = Uuid::parse_str(vid).map_err(|_| VxidError::Malformed {
        input: vid.to_string(),
    })?;

    let mut out = String::with_capacity(prefix.len() + 1 + ENCODED_LEN);
    if !prefix.is_empty() {
        out.push_str(prefix);
        out.push(PFX_DELIM);
    }

    let mut n = uuid.as_u128();
    while n > 0 {
        let digit = (n % 57) as usize;
        n /= 57;
        out.push(ALPHABET[digit] as char);
    }
    // Pad the high end out to fixed width (the high digits of small values
    // are zeros, and zeros live at the END of the string).
    for _ in 0..(ENCODED_LEN - suffix_len(&out, prefix)) {
        out.push(ALPHABET[0] as char);
    }

    Ok(out)
}

fn suffix_len(out: &str, prefix: &str) -> usize {
    let consumed = if prefix.is_empty() {
        0
    } else {
        prefix.len() + 1
    };
    out.len() - consumed
}

/// Vectorised [`encode`]: `prefixes` is either length 1 (broadcast to every
/// id) or the same length as `vids` (pairwise).
pub fn encode_many(vids: &[String], prefixes: &[&str]) -> Result<Vec<String>, VxidError> {
    if prefixes.is_empty() || (prefixes.len() > 1 && prefixes.len() != vids.len()) {
        return Err(VxidError::PrefixLenMismatch {
            ids: vids.len(),
            prefixes: prefixes.len(),
        });
    }

    let mut vxids = Vec::with_capacity(vids.len());
    for (i, vid) in vids.iter().enumerate() {
        let pfx = if prefixes.len() > 1 {
            prefixes[i]
        } else {
            prefixes[0]
        };
        vxids.push(encode(vid, pfx)?);
    }

    Ok(vxids)
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// Convert an external id (vxid) back to an internal id (vid).
///
/// Empty in → empty out. A prefix (anything up to the first `_`) is
/// discarded; so is anything after a second `_`.
pub fn decode(vxid: &str) -> Result<String, VxidError> {
    if vxid.is_empty() {
        return Ok(String::new());
    }

    let mut components = vxid.split(PFX_DELIM);
    let first = components.next().unwrap_or("");
    let suffix = components.next().unwrap_or(first);

    // First character is the least significant digit, so fold from the end.
    let mut n: u128 = 0;
    for b in suffix.bytes().rev() {
        let digit = ALPHABET
            .iter()
            .position(|&a| a == b)
            .ok_or_else(|| VxidError::Malformed {
                input: vxid.to_string(),
            })? as u128;
        n = n
            .checked_mul(57)
            .and_then(|n| n.checked_add(digit))
            .ok_or_else(|| VxidError::Overflow {
                input: vxid.to_string(),
            })?;
    }

    Ok(Uuid::from_u128(n).to_string())
}

/// Vectorised [`decode`].
pub fn decode_many(vxids: &[String]) -> Result<Vec<String>, VxidError> {
    vxids.iter().map(|v| decode(v)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
