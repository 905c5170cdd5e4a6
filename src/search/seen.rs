//! Seen-set strategies for suppressing revisited states.
//!
//! The seen set is advisory: a false "seen" only costs the search a skipped
//! state, which the surrounding beam tolerates. The bloom variant therefore
//! trades a small false-positive rate for constant memory; it never reports
//! a recorded hash as unseen.

/// Abstract membership filter over fact hashes.
pub trait SeenSet {
    /// Whether `fact_hash` may have been recorded. May err on the side of
    /// "seen" (false positives) but never the reverse.
    fn was_seen(&self, fact_hash: u64) -> bool;

    /// Record a fact hash.
    fn record(&mut self, fact_hash: u64);
}

/// The no-op strategy: nothing is ever seen, nothing is stored.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSeenSet;

impl SeenSet for NoSeenSet {
    fn was_seen(&self, _fact_hash: u64) -> bool {
        false
    }

    fn record(&mut self, _fact_hash: u64) {}
}

/// A bloom filter over fact hashes.
///
/// Uses Kirsch–Mitzenmacher double hashing: the k probe positions are all
/// derived from the two halves of a single remix of the key.
#[derive(Debug, Clone)]
pub struct BloomSeenSet {
    bits: Vec<u64>,
    num_bits: usize,
    num_hashes: u32,
}

impl BloomSeenSet {
    /// Create a filter with `num_bits` bits (rounded up to a whole word) and
    /// `num_hashes` probes per key.
    pub fn new(num_bits: usize, num_hashes: u32) -> Self {
        let num_bits = num_bits.max(64);
        BloomSeenSet {
            bits: vec![0; (num_bits + 63) / 64],
            num_bits,
            num_hashes: num_hashes.max(1),
        }
    }

    /// A filter sized for roughly `expected` entries at ~1% false positives
    /// (10 bits per entry, 3 probes).
    pub fn with_expected_entries(expected: usize) -> Self {
        BloomSeenSet::new((expected * 10).max(1024), 3)
    }

    fn probes(&self, fact_hash: u64) -> impl Iterator<Item = usize> + '_ {
        // The fact hash is already well mixed; one more round decorrelates
        // the two probe seeds from the XOR structure of tree hashes.
        let remixed = remix(fact_hash);
        let h1 = remixed as usize;
        let h2 = (remixed >> 32) as usize | 1;
        (0..self.num_hashes as usize)
            .map(move |i| h1.wrapping_add(i.wrapping_mul(h2)) % self.num_bits)
    }
}

impl SeenSet for BloomSeenSet {
    fn was_seen(&self, fact_hash: u64) -> bool {
        self.probes(fact_hash)
            .all(|index| self.bits[index / 64] & (1 << (index % 64)) != 0)
    }

    fn record(&mut self, fact_hash: u64) {
        let probes: Vec<usize> = self.probes(fact_hash).collect();
        for index in probes {
            self.bits[index / 64] |= 1 << (index % 64);
        }
    }
}

fn remix(mut z: u64) -> u64 {
    z = (z ^ (z >> 33)).wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    z ^ (z >> 33)
}
