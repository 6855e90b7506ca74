//! Myers bit-parallel edit distance over token sequences.
//!
//! Global (Needleman-Wunsch) alignment with unit costs, computed with the
//! Myers/Hyyrö block bit-vector recurrence: the vertical delta column of the
//! classic DP table is packed into 64-bit words and advanced one target
//! token at a time.

use std::collections::HashMap;

use crate::bits::ceil_div;
use crate::memory::{total_system_gib, BYTES_PER_GIB};
use crate::Error;

const WORD_SIZE: usize = u64::BITS as usize;
const HIGH_BIT: u64 = 1u64 << (WORD_SIZE - 1);

/// Token-sequence edit distance calculator.
///
/// The match table (`Peq`) is the dominant allocation at
/// `unique_tokens × ⌈n/64⌉ × 8` bytes. A calculator built with
/// [`with_memory_guard`](EditDistance::with_memory_guard) checks that
/// footprint against physical RAM before allocating and fails cleanly;
/// [`new`](EditDistance::new) allocates unconditionally.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditDistance {
    guard_memory: bool,
}

impl EditDistance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memory_guard() -> Self {
        Self { guard_memory: true }
    }

    /// Normalised edit distance: raw distance divided by
    /// `max(|query|, |target|)`. Returns 0.0 when both sequences are empty.
    pub fn distance<T: AsRef<str>>(&self, query: &[T], target: &[T]) -> Result<f64, Error> {
        let max_len = query.len().max(target.len());
        if max_len == 0 {
            return Ok(0.0);
        }
        Ok(self.raw_distance(query, target)? as f64 / max_len as f64)
    }

    /// Raw edit distance: the number of insertions, deletions and
    /// substitutions turning `query` into `target`.
    pub fn raw_distance<T: AsRef<str>>(&self, query: &[T], target: &[T]) -> Result<i64, Error> {
        let n = query.len();
        let m = target.len();

        if n == 0 {
            return Ok(m as i64);
        }
        if m == 0 {
            return Ok(n as i64);
        }

        // Map tokens of both sequences into one dense id space, first-seen
        // order. Only ids that occur in the query get non-zero match rows.
        let mut token_ids: HashMap<&str, usize> = HashMap::with_capacity(n + m);
        let q_idx: Vec<usize> = query
            .iter()
            .map(|token| {
                let next_id = token_ids.len();
                *token_ids.entry(token.as_ref()).or_insert(next_id)
            })
            .collect();
        let t_idx: Vec<usize> = target
            .iter()
            .map(|token| {
                let next_id = token_ids.len();
                *token_ids.entry(token.as_ref()).or_insert(next_id)
            })
            .collect();
        let num_ids = token_ids.len();

        let num_blocks = ceil_div(n, WORD_SIZE);
        let padding = num_blocks * WORD_SIZE - n;

        if self.guard_memory {
            let peq_bytes = (num_ids as u64) * (num_blocks as u64) * 8;
            let total_gib = total_system_gib();
            if peq_bytes / BYTES_PER_GIB >= total_gib {
                return Err(Error::MemoryExceeded(format!(
                    "match table needs {peq_bytes} bytes but only {total_gib} GiB of RAM present"
                )));
            }
        }

        log::debug!("edit distance: n={n} m={m} blocks={num_blocks} unique_tokens={num_ids}");

        // Peq[id][block] has bit (i % 64) set iff query position i (with
        // i / 64 == block) holds token id. Stored flat, row-major.
        let mut peq = vec![0u64; num_ids * num_blocks];
        for (i, &id) in q_idx.iter().enumerate() {
            peq[id * num_blocks + i / WORD_SIZE] |= 1u64 << (i % WORD_SIZE);
        }

        let mut pv = vec![u64::MAX; num_blocks];
        let mut mv = vec![0u64; num_blocks];
        let mut scores: Vec<i64> = (1..=num_blocks).map(|b| (b * WORD_SIZE) as i64).collect();

        for &id in &t_idx {
            let eq_row = &peq[id * num_blocks..(id + 1) * num_blocks];
            // NW: a gap before the query is penalised.
            let mut hin = 1;
            for b in 0..num_blocks {
                let (hout, pv_out, mv_out) = advance_block(pv[b], mv[b], eq_row[b], hin);
                pv[b] = pv_out;
                mv[b] = mv_out;
                scores[b] += i64::from(hout);
                hin = hout;
            }
        }

        // The last block carries `padding` cells past the real end of the
        // query. Walk them back from the high end to undo their deltas.
        let last = num_blocks - 1;
        let mut score = scores[last];
        let mut mask = HIGH_BIT;
        for _ in 0..padding {
            if pv[last] & mask != 0 {
                score -= 1;
            }
            if mv[last] & mask != 0 {
                score += 1;
            }
            mask >>= 1;
        }

        Ok(score)
    }
}

// One block of one DP column. Pv/Mv encode the vertical deltas, eq is the
// match vector for the current target token, hin is the horizontal delta
// entering from the block above. Returns (hout, Pv', Mv') where
// hout ∈ {-1, 0, +1} propagates to the next block.
fn advance_block(pv: u64, mv: u64, eq: u64, hin: i32) -> (i32, u64, u64) {
    // Arithmetic shift: any negative hin leaves the low bit set.
    let hin_is_neg = ((hin >> 2) as u64) & 1;

    let xv = eq | mv;
    let eq = eq | hin_is_neg;
    let xh = ((eq & pv).wrapping_add(pv) ^ pv) | eq;

    let mut ph = mv | !(xh | pv);
    let mut mh = pv & xh;

    let mut hout = ((ph & HIGH_BIT) >> (WORD_SIZE - 1)) as i32;
    hout -= ((mh & HIGH_BIT) >> (WORD_SIZE - 1)) as i32;

    ph <<= 1;
    mh <<= 1;
    mh |= hin_is_neg;
    ph |= ((hin + 1) >> 1) as u64;

    let pv_out = mh | !(xv | ph);
    let mv_out = ph & xv;

    (hout, pv_out, mv_out)
}
