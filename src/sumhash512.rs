use crate::compress::{LookupTable, Matrix};
use crate::hash::Digest;

/// The size in bytes of a sumhash512 checksum.
pub const DIGEST_SIZE: usize = 64;

/// The block size, in bytes, of the sumhash512 hash function.
pub const DIGEST_BLOCK_SIZE: usize = 64;

/// Seed of the fixed sumhash512 matrix.
const SEED: &[u8] = b"Algorand";

/// Builds the sumhash512 compressor: the lookup table of the 8 x 1024
/// matrix derived from the `"Algorand"` seed.
///
/// The table is immutable, so one call can feed any number of hashers.
pub fn compressor() -> LookupTable {
    Matrix::from_seed(SEED, 8, 1024).lookup_table()
}

/// Creates a hash computing a sumhash512 checksum, 64 bytes of output over
/// 64-byte blocks.
///
/// If `salt` is `None` the hash runs in unsalted mode; otherwise the salt
/// must be [`DIGEST_BLOCK_SIZE`] bytes and the hash runs in salted mode.
pub fn new(salt: Option<Vec<u8>>) -> Digest<LookupTable> {
    Digest::new(compressor(), salt)
}
