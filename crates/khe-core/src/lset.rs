//! LSet - arbitrary-length sets of small non-negative integers
//!
//! An [`LSet`] is a bit vector that grows as needed. It is used throughout
//! KHE for time domains, resource domains, and the supply side of the
//! demand matching. Trailing zero words are never stored, so two sets with
//! the same elements are equal and hash equally.

use std::cmp::Ordering;
use std::fmt;

const WORD_BITS: usize = u64::BITS as usize;

/// A set of small non-negative integers stored as a bit vector.
///
/// # Examples
///
/// ```
/// use khe_core::LSet;
///
/// let mut s: LSet = [1, 2, 3, 7].into_iter().collect();
/// s.delete(2);
/// assert!(s.contains(3));
/// assert!(!s.contains(2));
/// assert_eq!(s.to_string(), "{1, 3, 7}");
///
/// let all: LSet = (0..10).collect();
/// assert!(s.is_subset(&all));
/// assert_eq!(s.first(), Some(1));
/// assert_eq!(s.last(), Some(7));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LSet {
    words: Vec<u64>,
}

impl LSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the set `{i}`.
    pub fn singleton(i: usize) -> Self {
        let mut s = Self::new();
        s.insert(i);
        s
    }

    /// Creates the set `{0, 1, ..., n-1}`.
    pub fn full(n: usize) -> Self {
        (0..n).collect()
    }

    fn normalize(&mut self) {
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.words.clear();
    }

    /// Adds `i` to the set.
    pub fn insert(&mut self, i: usize) {
        let word = i / WORD_BITS;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1u64 << (i % WORD_BITS);
    }

    /// Removes `i` from the set, if present.
    pub fn delete(&mut self, i: usize) {
        let word = i / WORD_BITS;
        if word < self.words.len() {
            self.words[word] &= !(1u64 << (i % WORD_BITS));
            self.normalize();
        }
    }

    /// True when `i` is an element.
    #[inline]
    pub fn contains(&self, i: usize) -> bool {
        let word = i / WORD_BITS;
        word < self.words.len() && self.words[word] & (1u64 << (i % WORD_BITS)) != 0
    }

    /// True when the set has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The number of elements.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Adds every element of `other`.
    pub fn union(&mut self, other: &LSet) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (w, o) in self.words.iter_mut().zip(&other.words) {
            *w |= *o;
        }
    }

    /// Keeps only elements also in `other`.
    pub fn intersection(&mut self, other: &LSet) {
        self.words.truncate(other.words.len());
        for (w, o) in self.words.iter_mut().zip(&other.words) {
            *w &= *o;
        }
        self.normalize();
    }

    /// Removes every element of `other`.
    pub fn difference(&mut self, other: &LSet) {
        for (w, o) in self.words.iter_mut().zip(&other.words) {
            *w &= !*o;
        }
        self.normalize();
    }

    /// True when every element of `self` is in `other`.
    pub fn is_subset(&self, other: &LSet) -> bool {
        if self.words.len() > other.words.len() {
            return false;
        }
        self.words.iter().zip(&other.words).all(|(w, o)| w & !o == 0)
    }

    /// True when the sets have no common element.
    pub fn is_disjoint(&self, other: &LSet) -> bool {
        self.words.iter().zip(&other.words).all(|(w, o)| w & o == 0)
    }

    /// The smallest element, if any.
    pub fn first(&self) -> Option<usize> {
        self.words
            .iter()
            .enumerate()
            .find(|(_, w)| **w != 0)
            .map(|(i, w)| i * WORD_BITS + w.trailing_zeros() as usize)
    }

    /// The largest element, if any.
    pub fn last(&self) -> Option<usize> {
        let last = self.words.len().checked_sub(1)?;
        let w = self.words[last];
        Some(last * WORD_BITS + (WORD_BITS - 1 - w.leading_zeros() as usize))
    }

    /// The set obtained by adding `delta` to every element, keeping only
    /// results in `0..limit`.
    pub fn shift(&self, delta: isize, limit: usize) -> LSet {
        self.iter()
            .filter_map(|i| {
                let j = i as isize + delta;
                (j >= 0 && (j as usize) < limit).then_some(j as usize)
            })
            .collect()
    }

    /// Lexicographic comparison: the first element present in exactly one
    /// of the sets decides, and the set containing it is the greater.
    pub fn lexical_cmp(&self, other: &LSet) -> Ordering {
        let len = self.words.len().max(other.words.len());
        for i in 0..len {
            let a = self.words.get(i).copied().unwrap_or(0);
            let b = other.words.get(i).copied().unwrap_or(0);
            let diff = a ^ b;
            if diff != 0 {
                let bit = 1u64 << diff.trailing_zeros();
                return if a & bit != 0 {
                    Ordering::Greater
                } else {
                    Ordering::Less
                };
            }
        }
        Ordering::Equal
    }

    /// Iterates over the elements in increasing order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            words: &self.words,
            word: 0,
            bits: self.words.first().copied().unwrap_or(0),
        }
    }
}

impl Ord for LSet {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lexical_cmp(other)
    }
}

impl PartialOrd for LSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromIterator<usize> for LSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut s = LSet::new();
        for i in iter {
            s.insert(i);
        }
        s
    }
}

impl Extend<usize> for LSet {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        for i in iter {
            self.insert(i);
        }
    }
}

impl<'a> IntoIterator for &'a LSet {
    type Item = usize;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Iterator over the elements of an [`LSet`].
pub struct Iter<'a> {
    words: &'a [u64],
    word: usize,
    bits: u64,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.bits != 0 {
                let pos = self.bits.trailing_zeros() as usize;
                self.bits &= self.bits - 1;
                return Some(self.word * WORD_BITS + pos);
            }
            self.word += 1;
            self.bits = *self.words.get(self.word)?;
        }
    }
}

impl fmt::Debug for LSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LSet{}", self)
    }
}

/// Interval notation, e.g. `{0-3, 5, 8-9}`.
impl fmt::Display for LSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        let mut run: Option<(usize, usize)> = None;
        let mut flush = |f: &mut fmt::Formatter<'_>, (from, to): (usize, usize)| {
            let sep = if first { "" } else { ", " };
            first = false;
            if from == to {
                write!(f, "{}{}", sep, from)
            } else {
                write!(f, "{}{}-{}", sep, from, to)
            }
        };
        for i in self.iter() {
            run = match run {
                Some((from, to)) if to + 1 == i => Some((from, i)),
                Some(r) => {
                    flush(f, r)?;
                    Some((i, i))
                }
                None => Some((i, i)),
            };
        }
        if let Some(r) = run {
            flush(f, r)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
#[path = "lset_tests.rs"]
mod tests;
