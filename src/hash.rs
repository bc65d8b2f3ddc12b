use byteorder::{ByteOrder, LittleEndian};

use crate::compress::Compressor;

/// Digest is a streaming Merkle-Damgard hash over a [`Compressor`].
///
/// Each absorbed block carries the previous chaining value in the leading
/// `size` bytes of the compression input and `block_size` message bytes
/// after it. In salted mode the salt is XORed into every message block and
/// one all-zero block is absorbed up front, so the first real block is
/// effectively prefixed by the salt itself.
///
/// A hash state is single-owner; share the compressor, not the `Digest`.
#[derive(Clone)]
pub struct Digest<C: Compressor> {
    c: C,
    size: usize,       // number of bytes in a hash output
    block_size: usize, // number of message bytes absorbed per compression

    h: Vec<u8>,  // hash chain (from last compression, or IV)
    x: Vec<u8>,  // buffered input, never a whole block
    nx: usize,   // number of buffered bytes in x
    len: u64,    // total input bytes written, wrapping mod 2^64

    salt: Option<Vec<u8>>,
}

impl<C: Compressor> Digest<C> {
    /// Creates a hash over `c`, in salted mode when `salt` is given.
    ///
    /// The salt must be exactly `block_size` bytes, and the compressor must
    /// compress: `input_len` has to exceed `output_len` by more than the 16
    /// bytes the length padding needs. Both are caller contract errors and
    /// panic.
    pub fn new(c: C, salt: Option<Vec<u8>>) -> Digest<C> {
        let size = c.output_len();
        let input_len = c.input_len();
        assert!(
            input_len > size + 16,
            "compressor input of {input_len} bytes leaves no block after {size} output bytes"
        );
        let block_size = input_len - size;

        if let Some(ref salt) = salt {
            assert!(
                salt.len() == block_size,
                "salt is {} bytes, want {}",
                salt.len(),
                block_size
            );
        }

        let mut d = Digest {
            c,
            size,
            block_size,
            h: vec![0; size],
            x: vec![0; block_size],
            nx: 0,
            len: 0,
            salt,
        };
        d.reset();
        d
    }

    /// Returns the digest length in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the number of message bytes absorbed per compression.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Returns the hash to its freshly constructed state, keeping the
    /// compressor and salt.
    pub fn reset(&mut self) {
        self.h.fill(0);
        self.nx = 0;
        self.len = 0;
        if self.salt.is_some() {
            // Absorb an initial block of zeros, effectively prepending
            // the salt to the input.
            let zeros = vec![0u8; self.block_size];
            self.write(&zeros);
        }
    }

    /// Absorbs `p` into the hash state.
    ///
    /// Writes never fail and accept any length; the byte counter wraps
    /// modulo 2^64.
    pub fn write(&mut self, mut p: &[u8]) {
        self.len = self.len.wrapping_add(p.len() as u64);

        if self.nx > 0 {
            // top up the buffered partial block first
            let take = (self.block_size - self.nx).min(p.len());
            self.x[self.nx..self.nx + take].copy_from_slice(&p[..take]);
            self.nx += take;
            if self.nx == self.block_size {
                let x = std::mem::take(&mut self.x);
                self.blocks(&x);
                self.x = x;
                self.nx = 0;
            }
            p = &p[take..];
        }

        if p.len() >= self.block_size {
            // absorb the remaining whole blocks straight from the input
            let tail = p.len() % self.block_size;
            self.blocks(&p[..p.len() - tail]);
            p = &p[p.len() - tail..];
        }

        if !p.is_empty() {
            self.x[..p.len()].copy_from_slice(p);
            self.nx = p.len();
        }
    }

    /// Appends the current digest to `prefix` and returns it.
    ///
    /// Finalization runs on a clone, so the caller can keep writing to and
    /// summing the live state.
    pub fn sum(&self, mut prefix: Vec<u8>) -> Vec<u8> {
        let mut d = self.clone();
        let digest = d.check_sum();
        prefix.extend_from_slice(&digest);
        prefix
    }

    fn check_sum(&mut self) -> Vec<u8> {
        let b = self.block_size;
        let p = b - 16;

        // number of input bits written, before padding is appended
        let bitlen = self.len.wrapping_mul(8);

        // Pad with 0x01 (sumhash reads bits little-endian) and zeros until
        // 16 bytes short of a block boundary, spilling into a fresh block
        // when the tail would not fit.
        let mut pad = vec![0u8; b];
        pad[0] = 0x01;
        let padlen = if self.nx < p { p - self.nx } else { b + p - self.nx };
        self.write(&pad[..padlen]);

        // 128-bit little-endian length field; the upper half is always
        // zero with a 64-bit byte counter.
        let mut tail = [0u8; 16];
        LittleEndian::write_u64(&mut tail[..8], bitlen);
        self.write(&tail);

        debug_assert_eq!(self.nx, 0, "finalization left buffered bytes");

        self.h.clone()
    }

    // Absorbs data, whose length must be a multiple of block_size.
    fn blocks(&mut self, data: &[u8]) {
        let mut cin = vec![0u8; self.c.input_len()];
        for block in data.chunks_exact(self.block_size) {
            cin[..self.size].copy_from_slice(&self.h);
            match self.salt {
                Some(ref salt) => {
                    for ((c, &x), &s) in cin[self.size..].iter_mut().zip(block).zip(salt) {
                        *c = x ^ s;
                    }
                }
                None => cin[self.size..].copy_from_slice(block),
            }
            self.c.compress(&mut self.h, &cin);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use sha3::{
        digest::{ExtendableOutput, Update},
        Shake256,
    };

    use super::*;
    use crate::compress::Matrix;

    fn shake(tag: &[u8], len: usize) -> Vec<u8> {
        let mut xof = Shake256::default();
        xof.update(tag);
        let mut out = vec![0u8; len];
        xof.finalize_xof()
            .read_exact(&mut out)
            .expect("SHAKE256 output is unbounded");
        out
    }

    #[test]
    fn expected_output() {
        let a = Matrix::from_seed(b"Algorand", 10, 10 * 64 * 2);
        let at = a.lookup_table();
        let input = shake(b"sumhash input", 6000);

        let expected = "cedae6c2ac201c6d79b5f8af41ceee8d9506adda4f79ab697aed9865773be091\
                        2313c6b28b696b219d512b245103830d3e33e541f702d4b9b0395c2dc54781ae\
                        c9c83c8725e4ee7a608092847d32f037";
        let mut h = Digest::new(a.clone(), None);
        h.write(&input);
        assert_eq!(hex::encode(h.sum(Vec::new())), expected);

        let mut h = Digest::new(at.clone(), None);
        h.write(&input);
        assert_eq!(hex::encode(h.sum(Vec::new())), expected);

        let salt = shake(b"sumhash salt", 80);
        let expected_salted = "18ff67b5a2f6f864cd046845f036d2a2be5e91c0324610fdf48921c71382decf\
                               dba1c0f619b190953f46c9bb68fb4483300af30f86a62fec384f8c9f4ed6da2d\
                               ebaeec681240362ce7c872cd4b82cad1";
        let mut h = Digest::new(a, Some(salt.clone()));
        h.write(&input);
        assert_eq!(hex::encode(h.sum(Vec::new())), expected_salted);

        let mut h = Digest::new(at, Some(salt));
        h.write(&input);
        assert_eq!(hex::encode(h.sum(Vec::new())), expected_salted);
    }

    #[test]
    fn expected_output_wide_block() {
        let a = Matrix::from_seed(&[0x11, 0x22, 0x33, 0x44], 14, 14 * 64 * 4);

        let mut h = Digest::new(a.lookup_table(), None);
        h.write(b"1234567890");
        assert_eq!(
            hex::encode(h.sum(Vec::new())),
            "fc91828801365750f0267edd5530a301d1471736c485472bbadf22507731a81f\
             d67e0d80cce722a81c6dc690b698f5771713855c5d1927488d79713e3abd8105\
             3de2c7db1430b8fb106b3f6aa6b93e54aec351e47bcc176c0df58a0336d24979\
             a064f3acb67a693db399c6402149157b"
        );
    }

    #[test]
    fn hash_params() -> anyhow::Result<()> {
        for (n, m) in [(14, 14 * 64 * 4), (10, 10 * 64 * 2)] {
            let mut rand = Shake256::default().finalize_xof();
            let a = Matrix::random(&mut rand, n, m)?;
            let at = a.lookup_table();
            let input_len = a.input_len();

            let mut h1 = Digest::new(a, None);
            assert_eq!(h1.size(), n * 8, "h1 has unexpected size");
            assert_eq!(h1.block_size(), m / 8 - n * 8, "h1 has unexpected block size");

            let mut h2 = Digest::new(at, None);
            assert_eq!(h2.size(), n * 8, "h2 has unexpected size");
            assert_eq!(h2.block_size(), m / 8 - n * 8, "h2 has unexpected block size");

            for l in [1, 64, 100, 128, input_len, 6000, 6007] {
                let mut msg = vec![0; l];
                rand.read_exact(&mut msg)?;

                h1.write(&msg);
                h2.write(&msg);

                let d1 = h1.sum(Vec::new());
                let d2 = h2.sum(Vec::new());
                assert_eq!(d1, d2, "matrix and lookup table hashes differ at len {l}");

                h1.reset();
                h2.reset();
            }
        }
        Ok(())
    }

    #[test]
    fn sum_leaves_state_untouched() {
        let a = Matrix::from_seed(b"clone on sum", 4, 512);
        let mut h = Digest::new(a.clone(), None);
        h.write(b"first part");

        let d1 = h.sum(Vec::new());
        let d2 = h.sum(Vec::new());
        assert_eq!(d1, d2, "sum must be idempotent");

        // Continuing after sum must behave as if sum never happened.
        h.write(b" second part");
        let continued = h.sum(Vec::new());

        let mut oneshot = Digest::new(a, None);
        oneshot.write(b"first part second part");
        assert_eq!(continued, oneshot.sum(Vec::new()));
    }

    #[test]
    fn split_writes_match_single_write() {
        let a = Matrix::from_seed(b"split writes", 4, 512);
        let block_size = a.input_len() - a.output_len();
        assert_eq!(block_size, 32);

        let msg = shake(b"msg", 3 * block_size + 1);
        for l in [0, 1, 15, 16, 17, 31, 32, 33, 47, 48, 63, 64, 65, 96, 97] {
            let mut whole = Digest::new(a.lookup_table(), None);
            whole.write(&msg[..l]);

            let mut bytewise = Digest::new(a.lookup_table(), None);
            for b in &msg[..l] {
                bytewise.write(std::slice::from_ref(b));
            }
            assert_eq!(
                whole.sum(Vec::new()),
                bytewise.sum(Vec::new()),
                "digest differs at len {l}"
            );
        }
    }

    #[test]
    fn reset_restores_initial_state() {
        let a = Matrix::from_seed(b"reset", 4, 512);
        let salt = shake(b"reset salt", 32);

        for salt in [None, Some(salt)] {
            let mut h = Digest::new(a.lookup_table(), salt.clone());
            let fresh = h.sum(Vec::new());

            h.write(b"some bytes that must vanish");
            h.reset();
            assert_eq!(h.sum(Vec::new()), fresh);

            let other = Digest::new(a.lookup_table(), salt);
            assert_eq!(other.sum(Vec::new()), fresh);
        }
    }

    #[test]
    fn empty_input_still_digests() {
        let a = Matrix::from_seed(b"Algorand", 10, 10 * 64 * 2);
        let h = Digest::new(a, None);
        assert_eq!(h.sum(Vec::new()).len(), 80);
    }

    #[test]
    fn sum_appends_to_prefix() {
        let a = Matrix::from_seed(b"prefix", 4, 512);
        let mut h = Digest::new(a, None);
        h.write(b"payload");

        let digest = h.sum(Vec::new());
        let prefixed = h.sum(vec![0xde, 0xad]);
        assert_eq!(&prefixed[..2], &[0xde, 0xad]);
        assert_eq!(&prefixed[2..], &digest[..]);
    }

    #[test]
    #[should_panic(expected = "salt is")]
    fn rejects_wrong_salt_length() {
        let a = Matrix::from_seed(b"bad salt", 4, 512);
        let _ = Digest::new(a, Some(vec![0u8; 31]));
    }

    #[derive(Clone)]
    struct Narrow;

    impl Compressor for Narrow {
        fn input_len(&self) -> usize {
            16
        }

        fn output_len(&self) -> usize {
            8
        }

        fn compress(&self, _dst: &mut [u8], _src: &[u8]) {
            unreachable!("never absorbs")
        }
    }

    #[test]
    #[should_panic(expected = "leaves no block")]
    fn rejects_compressor_without_block_room() {
        let _ = Digest::new(Narrow, None);
    }
}
