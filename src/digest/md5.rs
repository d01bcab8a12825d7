//! Streaming MD5 message-digest implementation (RFC 1321).
//!
//! The engine consumes input incrementally in 64-byte blocks, so arbitrarily
//! large files can be hashed through a small fixed buffer. Typical usage:
//!
//! ```
//! use hashcache::digest::Md5;
//!
//! let mut md5 = Md5::new();
//! md5.update(b"The quick brown fox ");
//! md5.update(b"jumps over the lazy dog");
//! md5.finalize();
//! assert_eq!(md5.digest().to_hex(), "9e107d9d372bb6826bd81d3542a419d6");
//! ```

use std::fmt;
use std::io::Read;

const BLOCK_SIZE: usize = 64;

// Per-round left-rotation amounts.
const S11: u32 = 7;
const S12: u32 = 12;
const S13: u32 = 17;
const S14: u32 = 22;
const S21: u32 = 5;
const S22: u32 = 9;
const S23: u32 = 14;
const S24: u32 = 20;
const S31: u32 = 4;
const S32: u32 = 11;
const S33: u32 = 16;
const S34: u32 = 23;
const S41: u32 = 6;
const S42: u32 = 10;
const S43: u32 = 15;
const S44: u32 = 21;

/// A finished 128-bit MD5 digest.
///
/// Renders as 32 lowercase hex characters via [`Digest::to_hex`] or
/// [`fmt::Display`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Digest(pub [u8; 16]);

impl Digest {
    /// Render the digest as a 32-character lowercase hex string.
    #[must_use]
    pub fn to_hex(&self) -> String {
        use std::fmt::Write;
        let mut s = String::with_capacity(32);
        for byte in self.0 {
            // Writing to a String cannot fail.
            let _ = write!(s, "{byte:02x}");
        }
        s
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Streaming MD5 state.
///
/// Feed input with [`Md5::update`] or [`Md5::update_reader`], then call
/// [`Md5::finalize`] once all input is consumed. `finalize` is idempotent;
/// `update` after finalization is a contract violation.
#[derive(Debug, Clone)]
pub struct Md5 {
    /// Working registers A, B, C, D.
    state: [u32; 4],
    /// Message length in bits; wraps naturally at 2^64.
    count: u64,
    /// Partial-block accumulator.
    buffer: [u8; BLOCK_SIZE],
    finalized: bool,
    digest: Digest,
}

impl Default for Md5 {
    fn default() -> Self {
        Self::new()
    }
}

fn f(x: u32, y: u32, z: u32) -> u32 {
    (x & y) | (!x & z)
}

fn g(x: u32, y: u32, z: u32) -> u32 {
    (x & z) | (y & !z)
}

fn h(x: u32, y: u32, z: u32) -> u32 {
    x ^ y ^ z
}

fn i(x: u32, y: u32, z: u32) -> u32 {
    y ^ (x | !z)
}

fn ff(a: &mut u32, b: u32, c: u32, d: u32, x: u32, s: u32, ac: u32) {
    *a = a
        .wrapping_add(f(b, c, d))
        .wrapping_add(x)
        .wrapping_add(ac)
        .rotate_left(s)
        .wrapping_add(b);
}

fn gg(a: &mut u32, b: u32, c: u32, d: u32, x: u32, s: u32, ac: u32) {
    *a = a
        .wrapping_add(g(b, c, d))
        .wrapping_add(x)
        .wrapping_add(ac)
        .rotate_left(s)
        .wrapping_add(b);
}

fn hh(a: &mut u32, b: u32, c: u32, d: u32, x: u32, s: u32, ac: u32) {
    *a = a
        .wrapping_add(h(b, c, d))
        .wrapping_add(x)
        .wrapping_add(ac)
        .rotate_left(s)
        .wrapping_add(b);
}

fn ii(a: &mut u32, b: u32, c: u32, d: u32, x: u32, s: u32, ac: u32) {
    *a = a
        .wrapping_add(i(b, c, d))
        .wrapping_add(x)
        .wrapping_add(ac)
        .rotate_left(s)
        .wrapping_add(b);
}

impl Md5 {
    /// Create a fresh engine with the standard initial state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: [0x6745_2301, 0xefcd_ab89, 0x98ba_dcfe, 0x1032_5476],
            count: 0,
            buffer: [0; BLOCK_SIZE],
            finalized: false,
            digest: Digest::default(),
        }
    }

    /// One-shot convenience: hash a byte slice.
    #[must_use]
    pub fn hash(input: &[u8]) -> Digest {
        let mut md5 = Self::new();
        md5.update(input);
        md5.finalize();
        md5.digest()
    }

    /// One-shot convenience: hash everything a reader yields.
    pub fn hash_reader<R: Read>(reader: R) -> std::io::Result<Digest> {
        let mut md5 = Self::new();
        md5.update_reader(reader)?;
        md5.finalize();
        Ok(md5.digest())
    }

    /// Append `input` to the pending message.
    ///
    /// May be called any number of times before [`Md5::finalize`]. Calling
    /// it after finalization violates the contract.
    pub fn update(&mut self, input: &[u8]) {
        debug_assert!(!self.finalized, "update after finalize");
        // Bytes already buffered from a previous partial block.
        let mut index = (self.count / 8 % BLOCK_SIZE as u64) as usize;
        self.count = self.count.wrapping_add((input.len() as u64) << 3);

        let first_part = BLOCK_SIZE - index;
        let mut consumed = 0;
        if input.len() >= first_part {
            // Top up the buffered block, then run full blocks straight
            // from the input.
            self.buffer[index..].copy_from_slice(&input[..first_part]);
            let block = self.buffer;
            self.transform(&block);
            consumed = first_part;
            while consumed + BLOCK_SIZE <= input.len() {
                let mut block = [0u8; BLOCK_SIZE];
                block.copy_from_slice(&input[consumed..consumed + BLOCK_SIZE]);
                self.transform(&block);
                consumed += BLOCK_SIZE;
            }
            index = 0;
        }
        self.buffer[index..index + input.len() - consumed].copy_from_slice(&input[consumed..]);
    }

    /// Stream a reader into the engine, up to 64 bytes at a time, until EOF.
    pub fn update_reader<R: Read>(&mut self, mut reader: R) -> std::io::Result<()> {
        let mut buf = [0u8; BLOCK_SIZE];
        loop {
            let read = reader.read(&mut buf)?;
            if read == 0 {
                break;
            }
            self.update(&buf[..read]);
        }
        Ok(())
    }

    /// Terminate the message and fix the digest.
    ///
    /// Pads per the standard rule (a single 1 bit, zeros to 56 mod 64, then
    /// the 64-bit little-endian bit length), processes the final block(s),
    /// and zeroizes the working buffers. Safe to call repeatedly; only the
    /// first call has an effect.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        let mut padding = [0u8; BLOCK_SIZE];
        padding[0] = 0x80;
        // Bit length before padding, appended after it.
        let bits = self.count.to_le_bytes();
        let index = (self.count / 8 % BLOCK_SIZE as u64) as usize;
        let pad_len = if index < 56 { 56 - index } else { 120 - index };
        self.update(&padding[..pad_len]);
        self.update(&bits);
        for (chunk, word) in self.digest.0.chunks_exact_mut(4).zip(self.state) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        self.buffer = [0; BLOCK_SIZE];
        self.count = 0;
        self.finalized = true;
    }

    /// The finished digest. Only meaningful after [`Md5::finalize`].
    #[must_use]
    pub fn digest(&self) -> Digest {
        debug_assert!(self.finalized, "digest before finalize");
        self.digest
    }

    /// Run the 64-step compression function over one 512-bit block.
    fn transform(&mut self, block: &[u8; BLOCK_SIZE]) {
        let mut x = [0u32; 16];
        for (word, chunk) in x.iter_mut().zip(block.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        let [mut a, mut b, mut c, mut d] = self.state;

        // Round 1
        ff(&mut a, b, c, d, x[0], S11, 0xd76a_a478);
        ff(&mut d, a, b, c, x[1], S12, 0xe8c7_b756);
        ff(&mut c, d, a, b, x[2], S13, 0x2420_70db);
        ff(&mut b, c, d, a, x[3], S14, 0xc1bd_ceee);
        ff(&mut a, b, c, d, x[4], S11, 0xf57c_0faf);
        ff(&mut d, a, b, c, x[5], S12, 0x4787_c62a);
        ff(&mut c, d, a, b, x[6], S13, 0xa830_4613);
        ff(&mut b, c, d, a, x[7], S14, 0xfd46_9501);
        ff(&mut a, b, c, d, x[8], S11, 0x6980_98d8);
        ff(&mut d, a, b, c, x[9], S12, 0x8b44_f7af);
        ff(&mut c, d, a, b, x[10], S13, 0xffff_5bb1);
        ff(&mut b, c, d, a, x[11], S14, 0x895c_d7be);
        ff(&mut a, b, c, d, x[12], S11, 0x6b90_1122);
        ff(&mut d, a, b, c, x[13], S12, 0xfd98_7193);
        ff(&mut c, d, a, b, x[14], S13, 0xa679_438e);
        ff(&mut b, c, d, a, x[15], S14, 0x49b4_0821);
        // Round 2
        gg(&mut a, b, c, d, x[1], S21, 0xf61e_2562);
        gg(&mut d, a, b, c, x[6], S22, 0xc040_b340);
        gg(&mut c, d, a, b, x[11], S23, 0x265e_5a51);
        gg(&mut b, c, d, a, x[0], S24, 0xe9b6_c7aa);
        gg(&mut a, b, c, d, x[5], S21, 0xd62f_105d);
        gg(&mut d, a, b, c, x[10], S22, 0x0244_1453);
        gg(&mut c, d, a, b, x[15], S23, 0xd8a1_e681);
        gg(&mut b, c, d, a, x[4], S24, 0xe7d3_fbc8);
        gg(&mut a, b, c, d, x[9], S21, 0x21e1_cde6);
        gg(&mut d, a, b, c, x[14], S22, 0xc337_07d6);
        gg(&mut c, d, a, b, x[3], S23, 0xf4d5_0d87);
        gg(&mut b, c, d, a, x[8], S24, 0x455a_14ed);
        gg(&mut a, b, c, d, x[13], S21, 0xa9e3_e905);
        gg(&mut d, a, b, c, x[2], S22, 0xfcef_a3f8);
        gg(&mut c, d, a, b, x[7], S23, 0x676f_02d9);
        gg(&mut b, c, d, a, x[12], S24, 0x8d2a_4c8a);
        // Round 3
        hh(&mut a, b, c, d, x[5], S31, 0xfffa_3942);
        hh(&mut d, a, b, c, x[8], S32, 0x8771_f681);
        hh(&mut c, d, a, b, x[11], S33, 0x6d9d_6122);
        hh(&mut b, c, d, a, x[14], S34, 0xfde5_380c);
        hh(&mut a, b, c, d, x[1], S31, 0xa4be_ea44);
        hh(&mut d, a, b, c, x[4], S32, 0x4bde_cfa9);
        hh(&mut c, d, a, b, x[7], S33, 0xf6bb_4b60);
        hh(&mut b, c, d, a, x[10], S34, 0xbebf_bc70);
        hh(&mut a, b, c, d, x[13], S31, 0x289b_7ec6);
        hh(&mut d, a, b, c, x[0], S32, 0xeaa1_27fa);
        hh(&mut c, d, a, b, x[3], S33, 0xd4ef_3085);
        hh(&mut b, c, d, a, x[6], S34, 0x0488_1d05);
        hh(&mut a, b, c, d, x[9], S31, 0xd9d4_d039);
        hh(&mut d, a, b, c, x[12], S32, 0xe6db_99e5);
        hh(&mut c, d, a, b, x[15], S33, 0x1fa2_7cf8);
        hh(&mut b, c, d, a, x[2], S34, 0xc4ac_5665);
        // Round 4
        ii(&mut a, b, c, d, x[0], S41, 0xf429_2244);
        ii(&mut d, a, b, c, x[7], S42, 0x432a_ff97);
        ii(&mut c, d, a, b, x[14], S43, 0xab94_23a7);
        ii(&mut b, c, d, a, x[5], S44, 0xfc93_a039);
        ii(&mut a, b, c, d, x[12], S41, 0x655b_59c3);
        ii(&mut d, a, b, c, x[3], S42, 0x8f0c_cc92);
        ii(&mut c, d, a, b, x[10], S43, 0xffef_f47d);
        ii(&mut b, c, d, a, x[1], S44, 0x8584_5dd1);
        ii(&mut a, b, c, d, x[8], S41, 0x6fa8_7e4f);
        ii(&mut d, a, b, c, x[15], S42, 0xfe2c_e6e0);
        ii(&mut c, d, a, b, x[6], S43, 0xa301_4314);
        ii(&mut b, c, d, a, x[13], S44, 0x4e08_11a1);
        ii(&mut a, b, c, d, x[4], S41, 0xf753_7e82);
        ii(&mut d, a, b, c, x[11], S42, 0xbd3a_f235);
        ii(&mut c, d, a, b, x[2], S43, 0x2ad7_d2bb);
        ii(&mut b, c, d, a, x[9], S44, 0xeb86_d391);

        self.state[0] = self.state[0].wrapping_add(a);
        self.state[1] = self.state[1].wrapping_add(b);
        self.state[2] = self.state[2].wrapping_add(c);
        self.state[3] = self.state[3].wrapping_add(d);
    }
}
