use std::io::Read;

use byteorder::{ByteOrder, LittleEndian};
use sha3::{
    digest::{ExtendableOutput, Update},
    Shake256,
};

use crate::error::Error;

/// Compressor is the fixed-size compression function at the heart of the
/// iterated hash.
///
/// Implementations map exactly `input_len` bytes to exactly `output_len`
/// bytes; [`Matrix`] and [`LookupTable`] are the two canonical forms and
/// produce identical output for identical input.
pub trait Compressor: Clone {
    /// Length in bytes of a compression input.
    fn input_len(&self) -> usize;

    /// Length in bytes of a compression output.
    fn output_len(&self) -> usize;

    /// Compresses `src` (`input_len` bytes) into `dst` (`output_len` bytes).
    ///
    /// Panics when either slice has the wrong length.
    fn compress(&self, dst: &mut [u8], src: &[u8]);
}

/// Matrix is the n-by-m sumhash matrix A with entries in Z_q where q=2^64.
///
/// Words are stored flat in row-major order: the word selected by input
/// bit `i` for output word `k` lives at index `k*m + i`. Viewed over GF(2),
/// bit `b` of that word is the entry of the `(64k+b)`-th row of the binary
/// matrix in column `i`. A matrix is immutable once built and can be shared
/// freely between hashers.
#[derive(Clone, Debug)]
pub struct Matrix {
    words: Vec<u64>,
    n: usize,
    m: usize,
}

impl Matrix {
    /// Draws a random n x m matrix from `rand`.
    ///
    /// Consumes `8*n*m` bytes, decoded as little-endian 64-bit words in
    /// row-major order. Returns [`Error::ShortRandomSource`] when the
    /// source cannot supply that many bytes.
    ///
    /// Panics unless `m` is a multiple of 64 and `m > n*64`; smaller `m`
    /// would leave the iterated hash without room for a message block.
    pub fn random<R: Read>(mut rand: R, n: usize, m: usize) -> Result<Matrix, Error> {
        assert!(n > 0, "n must be positive");
        assert!(m % 64 == 0, "m={m} is not a multiple of 64");
        assert!(m > n * 64, "m={m} must exceed n*64={}", n * 64);

        let mut words = vec![0u64; n * m];
        let mut row = vec![0u8; 8 * m];
        for bundle in words.chunks_exact_mut(m) {
            rand.read_exact(&mut row).map_err(Error::ShortRandomSource)?;
            LittleEndian::read_u64_into(&row, bundle);
        }
        Ok(Matrix { words, n, m })
    }

    /// Derives the n x m matrix deterministically from `seed`.
    ///
    /// The random source is SHAKE256 over the three little-endian u16
    /// values 64, `n`, `m` followed by the seed bytes, so matrices of
    /// different shapes never share a stream. Equal seeds and shapes yield
    /// byte-identical matrices.
    pub fn from_seed(seed: &[u8], n: usize, m: usize) -> Matrix {
        let mut xof = Shake256::default();
        xof.update(&64u16.to_le_bytes());
        xof.update(&(n as u16).to_le_bytes());
        xof.update(&(m as u16).to_le_bytes());
        xof.update(seed);

        Matrix::random(xof.finalize_xof(), n, m).expect("SHAKE256 output is unbounded")
    }

    /// Precomputes the nibble [`LookupTable`] equivalent of this matrix.
    ///
    /// For every output word and every half-byte of input, the table holds
    /// the 16 possible subset sums of the four matrix words that nibble
    /// selects. Compression then does two unconditional adds per input
    /// byte instead of eight masked ones.
    pub fn lookup_table(&self) -> LookupTable {
        let mut entries = Vec::with_capacity(self.n * self.m / 4);
        for bundle in self.words.chunks_exact(self.m) {
            for quad in bundle.chunks_exact(4) {
                let mut sums = [0u64; 16];
                for (v, sum) in sums.iter_mut().enumerate() {
                    *sum = nibble_sum(quad, v as u8);
                }
                entries.push(sums);
            }
        }
        LookupTable {
            entries,
            n: self.n,
            m: self.m,
        }
    }
}

/// Sum (mod 2^64) of the words of `quad` selected by the low four bits
/// of `v`, computed with masks instead of branches.
fn nibble_sum(quad: &[u64], v: u8) -> u64 {
    let s0 = quad[0] & (u64::from(v) & 1).wrapping_neg();
    let s1 = quad[1] & (u64::from(v >> 1) & 1).wrapping_neg();
    let s2 = quad[2] & (u64::from(v >> 2) & 1).wrapping_neg();
    let s3 = quad[3] & (u64::from(v >> 3) & 1).wrapping_neg();

    s0.wrapping_add(s1).wrapping_add(s2).wrapping_add(s3)
}

impl Compressor for Matrix {
    fn input_len(&self) -> usize {
        self.m / 8
    }

    fn output_len(&self) -> usize {
        self.n * 8
    }

    fn compress(&self, dst: &mut [u8], src: &[u8]) {
        check_lengths(self, dst, src);

        for (bundle, out) in self.words.chunks_exact(self.m).zip(dst.chunks_exact_mut(8)) {
            let mut acc = 0u64;
            for (cols, &byte) in bundle.chunks_exact(8).zip(src) {
                for (b, &w) in cols.iter().enumerate() {
                    let mask = ((u64::from(byte) >> b) & 1).wrapping_neg();
                    acc = acc.wrapping_add(w & mask);
                }
            }
            LittleEndian::write_u64(out, acc);
        }
    }
}

/// LookupTable is the precomputed nibble-sum form of a [`Matrix`].
///
/// Dimensions are `[n][m/4][16]`: entry `(k, 2j+h)` holds the sums for the
/// low (`h=0`) and high (`h=1`) nibble of input byte `j` contributing to
/// output word `k`.
#[derive(Clone)]
pub struct LookupTable {
    entries: Vec<[u64; 16]>,
    n: usize,
    m: usize,
}

impl Compressor for LookupTable {
    fn input_len(&self) -> usize {
        self.m / 8
    }

    fn output_len(&self) -> usize {
        self.n * 8
    }

    fn compress(&self, dst: &mut [u8], src: &[u8]) {
        check_lengths(self, dst, src);

        let per_word = self.m / 4;
        for (bundle, out) in self
            .entries
            .chunks_exact(per_word)
            .zip(dst.chunks_exact_mut(8))
        {
            let mut acc = 0u64;
            for (pair, &byte) in bundle.chunks_exact(2).zip(src) {
                acc = acc
                    .wrapping_add(pair[0][usize::from(byte & 0x0f)])
                    .wrapping_add(pair[1][usize::from(byte >> 4)]);
            }
            LittleEndian::write_u64(out, acc);
        }
    }
}

fn check_lengths<C: Compressor>(c: &C, dst: &[u8], src: &[u8]) {
    assert!(
        src.len() == c.input_len(),
        "input is {} bytes, want {}",
        src.len(),
        c.input_len()
    );
    assert!(
        dst.len() == c.output_len(),
        "output is {} bytes, want {}",
        dst.len(),
        c.output_len()
    );
}
