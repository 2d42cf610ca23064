//! Index combinations and permutations for subset enumeration.

use smallvec::SmallVec;

/// Up to six members, the largest pattern arity.
pub type Members = SmallVec<[usize; 6]>;

/// Lexicographic `k`-combinations of `0..n`.
///
/// `(0,1,2), (0,1,3), ..., (n-3,n-2,n-1)`. Yields nothing when `k > n` or
/// `k == 0`.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    indices: Members,
    started: bool,
    done: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            started: false,
            done: k == 0 || k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Members;

    fn next(&mut self) -> Option<Members> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.indices.clone());
        }

        let k = self.indices.len();
        // rightmost index that can still move forward
        let mut i = k;
        while i > 0 {
            i -= 1;
            if self.indices[i] < self.n - k + i {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                return Some(self.indices.clone());
            }
        }
        self.done = true;
        None
    }
}

/// Every ordering of `0..k`, via Heap's algorithm.
pub fn permutations(k: usize) -> Vec<Members> {
    let mut current: Members = (0..k).collect();
    let mut out = vec![current.clone()];
    let mut c = vec![0usize; k];
    let mut i = 1;
    while i < k {
        if c[i] < i {
            if i % 2 == 0 {
                current.swap(0, i);
            } else {
                current.swap(c[i], i);
            }
            out.push(current.clone());
            c[i] += 1;
            i = 1;
        } else {
            c[i] = 0;
            i += 1;
        }
    }
    out
}

/// `n choose k`, saturating.
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1usize, |acc, i| acc.saturating_mul(n - i) / (i + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_combinations_lexicographic() {
        let all: Vec<Vec<usize>> = Combinations::new(4, 2).map(|c| c.to_vec()).collect();
        assert_eq!(
            all,
            vec![vec![0, 1], vec![0, 2], vec![0, 3], vec![1, 2], vec![1, 3], vec![2, 3]]
        );
    }

    #[test]
    fn test_combinations_edge_sizes() {
        assert_eq!(Combinations::new(3, 3).count(), 1);
        assert_eq!(Combinations::new(2, 3).count(), 0);
        assert_eq!(Combinations::new(0, 3).count(), 0);
        assert_eq!(Combinations::new(5, 0).count(), 0);
    }

    #[test]
    fn test_combination_count_matches_binomial() {
        for n in 0..12 {
            for k in 1..=6 {
                assert_eq!(Combinations::new(n, k).count(), binomial(n, k), "n={n} k={k}");
            }
        }
    }

    #[test]
    fn test_permutations() {
        assert_eq!(permutations(1).len(), 1);
        assert_eq!(permutations(3).len(), 6);
        let mut p4: Vec<Vec<usize>> = permutations(4).into_iter().map(|p| p.to_vec()).collect();
        p4.sort();
        p4.dedup();
        assert_eq!(p4.len(), 24);
    }

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(40, 6), 3_838_380);
        assert_eq!(binomial(4, 6), 0);
        assert_eq!(binomial(6, 6), 1);
    }
}
