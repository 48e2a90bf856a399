//! Command identifiers are the djb2 hash (XOR variant) of the procedure
//! name: `h = ((h << 5) + h) ^ c` starting from 5381.
//!
//! Collisions are resolved by the slave's dispatch registry with
//! last-writer-wins registration.

/// Hash a procedure name.
pub fn hash_name(name: &str) -> u32 {
    hash_bytes(name.as_bytes())
}

/// Hash a byte slice, stopping at an embedded NUL.
///
/// Matches `hash_name` for any slice without interior NULs, so identifiers
/// computed from C-style strings and Rust strings agree.
pub fn hash_bytes(bytes: &[u8]) -> u32 {
    let mut h: u32 = 5381;
    for &c in bytes {
        if c == 0 {
            break;
        }
        h = (h << 5).wrapping_add(h) ^ u32::from(c);
    }
    h
}
