#![warn(missing_docs)]
//! Algorand's subset-sum cryptographic hash function.
//!
//! sumhash hashes by summing, modulo 2^64, the columns of a fixed random
//! matrix that the bits of the input select. The compression function comes
//! in two interchangeable forms, the raw [`compress::Matrix`] and its
//! precomputed [`compress::LookupTable`], wrapped by a streaming
//! Merkle-Damgard [`hash::Digest`] with an optional salt. Matrices are
//! drawn from a caller-supplied random source or derived deterministically
//! from a seed with SHAKE256.
//!
//! # Example
//!
//! The fixed 512-bit parameterization:
//! ```
//! let mut h = sumhash::sumhash512::new(None);
//! h.write("hello world".as_bytes());
//! println!("Result: {}", hex::encode(h.sum(Vec::new())));
//! ```
//!
//! Custom parameters, salted:
//! ```
//! use sumhash::{compress::Matrix, hash::Digest};
//!
//! let a = Matrix::from_seed(b"my application", 10, 1280);
//! let salt = vec![0x13; 80];
//! let mut h = Digest::new(a.lookup_table(), Some(salt));
//! h.write("hello world".as_bytes());
//! assert_eq!(h.sum(Vec::new()).len(), 80);
//! ```

/// The compression function: the random matrix, its lookup-table form, and
/// the [`compress::Compressor`] capability both satisfy.
pub mod compress;
/// The crate error type.
pub mod error;
/// The streaming hash built over any compressor.
pub mod hash;
/// The fixed sumhash512 parameterization.
pub mod sumhash512;
/// A `digest` crate core for sumhash512.
pub mod sumhash512core;

pub use error::Error;
