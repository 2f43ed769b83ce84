use xxhash_rust::xxh3::xxh3_128;
use xxhash_rust::xxh3::Xxh3;

/// Hasher for generating identifiers such as dependency placeholders.
///
/// The hashes don't need to be incredibly fast, but they should be stable across
/// runs, machines, platforms and versions.
pub type IdentifierHasher = Xxh3;

/// Digest used for content addressed bundle names.
///
/// Always 32 lowercase hexadecimal characters.
pub fn hash_bytes(bytes: &[u8]) -> String {
  format!("{:032x}", xxh3_128(bytes))
}

pub fn hash_string(s: &str) -> String {
  hash_bytes(s.as_bytes())
}
