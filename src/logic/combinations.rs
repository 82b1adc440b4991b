//! Lazy k-combination enumeration over small pools, one bitmask per subset.

/// Largest pool a single bitmask can enumerate.
pub const MAX_MEMBERS: usize = 63;

/// Iterator over every `k`-subset of `0..n` as a bitmask (bit `i` set = member `i` chosen).
///
/// Masks come out in increasing numeric order (Gosper's hack). Pools are limited to 63
/// members; larger `n`, or `k > n`, yields nothing.
#[derive(Clone, Debug)]
pub struct Combinations {
    n: u32,
    next: Option<u64>,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        let next = if n <= MAX_MEMBERS && k <= n {
            Some((1u64 << k) - 1)
        } else {
            None
        };
        Self { n: n as u32, next }
    }
}

impl Iterator for Combinations {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let current = self.next?;
        self.next = if current == 0 {
            None
        } else {
            let lowest = current & current.wrapping_neg();
            let ripple = current + lowest;
            let candidate = (((ripple ^ current) >> 2) / lowest) | ripple;
            (candidate >> self.n == 0).then_some(candidate)
        };
        Some(current)
    }
}

/// Indices of the set bits of `mask`, ascending.
pub fn mask_members(mask: u64) -> impl Iterator<Item = usize> {
    (0..64usize).filter(move |i| mask & (1u64 << i) != 0)
}

/// Number of `k`-subsets of `n` items.
pub fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let count = (0..k).fold(1u128, |acc, i| acc * (n - i) as u128 / (i + 1) as u128);
    u64::try_from(count).unwrap_or(u64::MAX)
}
