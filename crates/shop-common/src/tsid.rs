//! TSID Generator
//!
//! Time-sorted 64-bit identifiers. Entities store the numeric form; request
//! ids and log fields use the 13-character Crockford Base32 form.
//!
//! Layout (63 usable bits, always positive as `i64`):
//! - 42 bits: milliseconds since the Unix epoch
//! - 10 bits: random component
//! - 12 bits: per-process counter (4096 ids per millisecond)

use std::sync::atomic::{AtomicU16, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Crockford Base32 alphabet (excludes I, L, O, U)
const ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

const ENCODED_LEN: usize = 13;

static COUNTER: AtomicU16 = AtomicU16::new(0);

/// Generator for unique, time-sorted identifiers.
pub struct TsidGenerator;

impl TsidGenerator {
    /// Generate a new numeric TSID.
    pub fn next_id() -> i64 {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        let counter = COUNTER.fetch_add(1, Ordering::SeqCst) as u64;
        let random = rand::random::<u16>() as u64 & 0x3FF;

        let tsid = ((millis & 0x3FF_FFFF_FFFF) << 22) | (random << 12) | (counter & 0xFFF);
        tsid as i64
    }

    /// Generate a new TSID in its Base32 text form, e.g. `0HZXEQ5Y8JY5Z`.
    pub fn generate() -> String {
        Self::encode(Self::next_id())
    }

    /// Encode a numeric TSID as 13 Crockford Base32 characters.
    pub fn encode(value: i64) -> String {
        let mut value = value as u64;
        let mut out = [b'0'; ENCODED_LEN];
        for slot in out.iter_mut().rev() {
            *slot = ALPHABET[(value & 0x1F) as usize];
            value >>= 5;
        }
        out.iter().map(|b| *b as char).collect()
    }

    /// Decode a Base32 TSID back to its numeric form.
    pub fn decode(text: &str) -> Option<i64> {
        if text.len() != ENCODED_LEN {
            return None;
        }

        let mut result: u64 = 0;
        for c in text.chars() {
            let c = c.to_ascii_uppercase();
            let val = match c {
                '0'..='9' => c as u64 - '0' as u64,
                'A'..='H' => c as u64 - 'A' as u64 + 10,
                'J'..='K' => c as u64 - 'J' as u64 + 18,
                'M'..='N' => c as u64 - 'M' as u64 + 20,
                'P'..='T' => c as u64 - 'P' as u64 + 22,
                'V'..='Z' => c as u64 - 'V' as u64 + 27,
                _ => return None,
            };
            result = (result << 5) | val;
        }
        Some(result as i64)
    }
}
