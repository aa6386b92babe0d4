//! Counting and unranking of column combinations.
//!
//! Combinations are ordered first by size and then lexicographically by
//! column position, the same order `itertools::Itertools::combinations`
//! produces when called for each size in turn. A global index into that
//! order can be turned back into column positions without enumerating the
//! preceding combinations.

/// Column positions forming one combination, ascending.
pub type IndexCombination = Vec<usize>;

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// C(n, k). Returns 0 when k > n, 1 when k == 0, and `None` when the
/// count does not fit in a `u128`.
pub fn combinations_for_depth(n: usize, depth: usize) -> Option<u128> {
    if depth > n {
        return Some(0);
    }
    let k = depth.min(n - depth);
    let mut result = 1u128;
    for i in 0..k {
        // C(n, i + 1) = C(n, i) * (n - i) / (i + 1). Dividing the common
        // factor out first keeps every step exact, so overflow here means
        // the binomial itself does not fit.
        let divisor = (i + 1) as u128;
        let common = gcd(result, divisor);
        let factor = (n - i) as u128 / (divisor / common);
        result = (result / common).checked_mul(factor)?;
    }
    Some(result)
}

/// Number of combinations with sizes in `min_depth..=max_depth`, or `None`
/// when it does not fit in a `u128`.
pub fn total_combinations(n: usize, min_depth: usize, max_depth: usize) -> Option<u128> {
    (min_depth..=max_depth.min(n)).try_fold(0u128, |acc, depth| {
        acc.checked_add(combinations_for_depth(n, depth)?)
    })
}

/// Split a global index into (depth, rank within that depth).
pub fn global_to_depth_and_local(
    global_index: u128,
    n: usize,
    min_depth: usize,
    max_depth: usize,
) -> Option<(usize, u128)> {
    let mut remaining = global_index;
    for depth in min_depth..=max_depth.min(n) {
        let count = combinations_for_depth(n, depth)?;
        if remaining < count {
            return Some((depth, remaining));
        }
        remaining -= count;
    }
    None
}

/// The `rank`-th k-combination of `0..n` in lexicographic order. Empty when
/// `rank` is out of range or C(n, k) is not countable.
pub fn unrank_combination(rank: u128, n: usize, k: usize) -> IndexCombination {
    let Some(count) = combinations_for_depth(n, k) else {
        return Vec::new();
    };
    if k == 0 || rank >= count {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(k);
    let mut remaining = rank;
    let mut start = 0usize;

    for i in 0..k {
        let elements_remaining = k - i;
        let mut c = start;
        loop {
            // Combinations whose next element is `c`; each block is at most
            // C(n, k), so it is countable.
            let block =
                combinations_for_depth(n - c - 1, elements_remaining - 1).unwrap_or(u128::MAX);
            if remaining < block {
                break;
            }
            remaining -= block;
            c += 1;
        }
        result.push(c);
        start = c + 1;
    }

    result
}

/// Inverse of [`unrank_combination`] for an ascending combination.
pub fn rank_combination(combo: &[usize], n: usize) -> Option<u128> {
    let k = combo.len();
    if k == 0 || k > n {
        return Some(0);
    }

    let mut rank = 0u128;
    let mut start = 0usize;
    for (i, &c) in combo.iter().enumerate() {
        let elements_remaining = k - i;
        for skipped in start..c {
            rank = rank.checked_add(combinations_for_depth(
                n - skipped - 1,
                elements_remaining - 1,
            )?)?;
        }
        start = c + 1;
    }
    Some(rank)
}

pub fn unrank_global(
    global_index: u128,
    n: usize,
    min_depth: usize,
    max_depth: usize,
) -> Option<IndexCombination> {
    let (depth, local) = global_to_depth_and_local(global_index, n, min_depth, max_depth)?;
    Some(unrank_combination(local, n, depth))
}
