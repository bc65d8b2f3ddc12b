use byteorder::{ByteOrder, LittleEndian};
use digest::{
    block_buffer::Eager,
    core_api::{Buffer, BufferKindUser, FixedOutputCore, UpdateCore},
    crypto_common::{Block, BlockSizeUser},
    typenum::U64,
    HashMarker, Output, OutputSizeUser,
};

use crate::compress::{Compressor, LookupTable};
use crate::sumhash512::{self, DIGEST_BLOCK_SIZE, DIGEST_SIZE};

const INPUT_LEN: usize = DIGEST_SIZE + DIGEST_BLOCK_SIZE;

/// Sumhash512Core computes sumhash512 through the `digest` crate's block
/// buffer machinery, so `CoreWrapper<Sumhash512Core>` can stand in for any
/// other RustCrypto hash.
///
/// Both front-ends agree bit for bit: wrapping this core and feeding it the
/// same bytes produces the same checksum as [`sumhash512::new`], salted or
/// not.
#[derive(Clone)]
pub struct Sumhash512Core {
    c: LookupTable,
    h: [u8; DIGEST_SIZE], // hash chain (from last compression, or IV)
    len: u64,             // bytes absorbed so far, wrapping mod 2^64
    salt: Option<Vec<u8>>,
}

impl Sumhash512Core {
    /// Creates a core in salted mode when `salt` is given; it must then be
    /// [`DIGEST_BLOCK_SIZE`] bytes.
    pub fn new(salt: Option<Vec<u8>>) -> Self {
        if let Some(ref salt) = salt {
            assert!(
                salt.len() == DIGEST_BLOCK_SIZE,
                "salt is {} bytes, want {}",
                salt.len(),
                DIGEST_BLOCK_SIZE
            );
        }
        let mut core = Self {
            c: sumhash512::compressor(),
            h: [0; DIGEST_SIZE],
            len: 0,
            salt,
        };
        if core.salt.is_some() {
            // Absorb an initial block of zeros, effectively prepending
            // the salt to the input.
            core.compress_block(&[0; DIGEST_BLOCK_SIZE]);
        }
        core
    }

    fn compress_block(&mut self, block: &[u8]) {
        self.len = self.len.wrapping_add(block.len() as u64);

        let mut cin = [0u8; INPUT_LEN];
        cin[..DIGEST_SIZE].copy_from_slice(&self.h);
        match self.salt {
            Some(ref salt) => {
                for ((c, &x), &s) in cin[DIGEST_SIZE..].iter_mut().zip(block).zip(salt) {
                    *c = x ^ s;
                }
            }
            None => cin[DIGEST_SIZE..].copy_from_slice(block),
        }
        self.c.compress(&mut self.h, &cin);
    }
}

impl Default for Sumhash512Core {
    fn default() -> Self {
        Self::new(None)
    }
}

impl HashMarker for Sumhash512Core {}

impl BlockSizeUser for Sumhash512Core {
    type BlockSize = U64;
}

impl BufferKindUser for Sumhash512Core {
    type BufferKind = Eager;
}

impl OutputSizeUser for Sumhash512Core {
    type OutputSize = U64;
}

impl UpdateCore for Sumhash512Core {
    fn update_blocks(&mut self, blocks: &[Block<Self>]) {
        for block in blocks {
            self.compress_block(block);
        }
    }
}

impl FixedOutputCore for Sumhash512Core {
    fn finalize_fixed_core(&mut self, buffer: &mut Buffer<Self>, out: &mut Output<Self>) {
        // number of input bits written, including the still-buffered tail
        let bitlen = self
            .len
            .wrapping_add(buffer.get_pos() as u64)
            .wrapping_mul(8);

        let mut tail = [0u8; 16];
        LittleEndian::write_u64(&mut tail[..8], bitlen);
        buffer.digest_pad(0x01, &tail, |block| self.compress_block(block));

        out.copy_from_slice(&self.h);
    }
}
