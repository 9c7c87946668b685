//! Fractional positions for sibling ordering.
//!
//! Containment facts carry a base-62 position string. Siblings sort by
//! comparing positions lexicographically, so inserting between two siblings
//! only needs a new key strictly between theirs; nobody else is rewritten.
//!
//! Generated keys never end in `'0'`, which keeps the space between any two
//! keys non-empty.

/// Base-62 charset for fractional indexing (0-9, A-Z, a-z).
/// Lexicographically ordered: '0' < '9' < 'A' < 'Z' < 'a' < 'z'.
pub const BASE62: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Get the index of a character in the BASE62 charset.
fn base62_index(c: u8) -> usize {
    BASE62.iter().position(|&b| b == c).unwrap_or(0)
}

/// Midpoint of two digit strings, `a < b`; `None` for `b` means "no upper bound".
fn midpoint(a: &[u8], b: Option<&[u8]>) -> Vec<u8> {
    if let Some(b) = b {
        // Shared prefix (with `a` padded by zeros) is copied verbatim.
        let mut n = 0;
        while n < b.len() && a.get(n).copied().unwrap_or(b'0') == b[n] {
            n += 1;
        }
        if n == b.len() {
            // b is a's zero-padded prefix: no room below it, treat as unbounded.
            return midpoint(a, None);
        }
        if n > 0 {
            let mut out = b[..n].to_vec();
            out.extend(midpoint(a.get(n..).unwrap_or(&[]), Some(&b[n..])));
            return out;
        }
    }

    let digit_a = a.first().map(|&c| base62_index(c)).unwrap_or(0);
    let digit_b = b
        .and_then(|b| b.first())
        .map(|&c| base62_index(c))
        .unwrap_or(BASE62.len());

    if digit_b > digit_a + 1 {
        vec![BASE62[(digit_a + digit_b).div_ceil(2)]]
    } else if let Some(b) = b.filter(|b| b.len() > 1) {
        b[..1].to_vec()
    } else {
        let mut out = vec![BASE62[digit_a]];
        out.extend(midpoint(a.get(1..).unwrap_or(&[]), None));
        out
    }
}

/// Position strictly between `before` and `after`.
///
/// `None` means "start of list" / "end of list". When the bounds are not in
/// ascending order (ties from concurrent inserts), the upper bound is dropped
/// and the key lands after `before`.
pub fn position_between(before: Option<&str>, after: Option<&str>) -> String {
    let a = before.unwrap_or("");
    let b = after.filter(|b| *b > a);
    let key = midpoint(a.as_bytes(), b.map(str::as_bytes));
    // BASE62 is ASCII, so every produced byte is a valid char.
    key.into_iter().map(char::from).collect()
}

/// Position after the last sibling.
pub fn position_after(last: Option<&str>) -> String {
    position_between(last, None)
}
