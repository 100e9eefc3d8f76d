//! Partition - integer partitions as multisets of positive parts
//!
//! A [`Partition`] such as `(3 2 2 1)` records how a total (here 8) is
//! split into parts. Partitions describe how durations can be packed: for
//! example, whether the meets of a node fit into the meets of its parent
//! is a bin-packing question on two partitions.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A multiset of positive integers.
///
/// # Examples
///
/// ```
/// use khe_core::Partition;
///
/// let items: Partition = "2 2 2".parse().unwrap();
/// let bins: Partition = "3 3".parse().unwrap();
/// assert_eq!(items.size(), 6);
/// assert!(!items.bin_pack(&bins));
///
/// let bins: Partition = "4 2".parse().unwrap();
/// let how = items.bin_pack_and_how(&bins).unwrap();
/// assert_eq!(how[0].to_string(), "(2 2)");
/// assert_eq!(how[1].to_string(), "(2)");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Partition {
    /// `counts[i]` is the multiplicity of part `i`; index 0 is unused and
    /// the last entry is never zero.
    counts: Vec<u32>,
}

impl Partition {
    /// Creates the empty partition.
    pub fn new() -> Self {
        Self::default()
    }

    /// The partition of `width` into ones.
    pub fn unitary(width: usize) -> Self {
        let mut p = Partition::new();
        for _ in 0..width {
            p.add(1);
        }
        p
    }

    fn normalize(&mut self) {
        while self.counts.last() == Some(&0) {
            self.counts.pop();
        }
        if self.counts.len() == 1 {
            self.counts.clear();
        }
    }

    /// Removes every part.
    pub fn clear(&mut self) {
        self.counts.clear();
    }

    /// True when there are no parts.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The sum of the parts.
    pub fn size(&self) -> usize {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, c)| i * *c as usize)
            .sum()
    }

    /// The number of parts.
    pub fn parts(&self) -> usize {
        self.counts.iter().map(|c| *c as usize).sum()
    }

    /// The number of parts equal to `i`.
    pub fn parts_with_size(&self, i: usize) -> usize {
        self.counts.get(i).map_or(0, |c| *c as usize)
    }

    /// The largest part, or 0 when empty.
    pub fn max(&self) -> usize {
        self.counts.len().saturating_sub(1)
    }

    /// The smallest part, or 0 when empty.
    pub fn min(&self) -> usize {
        (1..self.counts.len())
            .find(|i| self.counts[*i] > 0)
            .unwrap_or(0)
    }

    /// True when `i` is a part.
    pub fn contains(&self, i: usize) -> bool {
        self.parts_with_size(i) > 0
    }

    /// The least part greater than or equal to `i`, if any.
    pub fn contains_at_least(&self, i: usize) -> Option<usize> {
        (i.max(1)..self.counts.len()).find(|j| self.counts[*j] > 0)
    }

    /// The greatest part less than or equal to `i`, if any.
    pub fn contains_at_most(&self, i: usize) -> Option<usize> {
        (1..=i.min(self.max())).rev().find(|j| self.counts[*j] > 0)
    }

    /// True when `other` is a sub-multiset of `self`.
    pub fn covers(&self, other: &Partition) -> bool {
        if other.max() > self.max() {
            return false;
        }
        (1..other.counts.len()).all(|i| other.counts[i] <= self.counts[i])
    }

    /// Adds part `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is zero.
    pub fn add(&mut self, i: usize) {
        assert!(i > 0, "Partition::add: part is zero");
        if i >= self.counts.len() {
            self.counts.resize(i + 1, 0);
        }
        self.counts[i] += 1;
    }

    /// Removes one part `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is not a part.
    pub fn sub(&mut self, i: usize) {
        assert!(self.contains(i), "Partition::sub: {} is not a part of {}", i, self);
        self.counts[i] -= 1;
        self.normalize();
    }

    /// Multiplies every multiplicity by `i`.
    pub fn mul(&mut self, i: u32) {
        assert!(i > 0, "Partition::mul: factor is zero");
        for c in &mut self.counts {
            *c *= i;
        }
    }

    /// Divides every multiplicity by `i`, truncating.
    pub fn div(&mut self, i: u32) {
        assert!(i > 0, "Partition::div: divisor is zero");
        for c in &mut self.counts {
            *c /= i;
        }
        self.normalize();
    }

    /// Divides every multiplicity by `i`, rounding to nearest.
    pub fn div_and_round(&mut self, i: u32) {
        assert!(i > 0, "Partition::div_and_round: divisor is zero");
        for c in &mut self.counts {
            *c = (*c * 2 + i) / (2 * i);
        }
        self.normalize();
    }

    /// Divides every multiplicity by `i`, rounding up.
    pub fn div_and_round_up(&mut self, i: u32) {
        assert!(i > 0, "Partition::div_and_round_up: divisor is zero");
        for c in &mut self.counts {
            *c = c.div_ceil(i);
        }
        self.normalize();
    }

    /// Removes smallest parts until the size is at most `limit`.
    pub fn reduce(&mut self, limit: usize) {
        while self.size() > limit {
            let min = self.min();
            self.sub(min);
        }
    }

    /// Multiset union: adds every part of `other`.
    pub fn sum(&mut self, other: &Partition) {
        if other.counts.len() > self.counts.len() {
            self.counts.resize(other.counts.len(), 0);
        }
        for (i, c) in other.counts.iter().enumerate() {
            self.counts[i] += c;
        }
    }

    /// Multiset difference: removes parts of `other`, where present.
    pub fn difference(&mut self, other: &Partition) {
        for (c, o) in self.counts.iter_mut().zip(&other.counts) {
            *c = c.saturating_sub(*o);
        }
        self.normalize();
    }

    /// Raises each multiplicity towards `other`'s, largest parts first,
    /// without letting the size exceed `limit`.
    pub fn max_to_limit(&mut self, other: &Partition, limit: usize) {
        let mut size = self.size();
        for i in (1..other.counts.len()).rev() {
            let extra = other.counts[i].saturating_sub(self.parts_with_size(i) as u32);
            for _ in 0..extra {
                if size + i > limit {
                    break;
                }
                self.add(i);
                size += i;
            }
        }
    }

    /// Iterates over the parts in decreasing order, with repetition.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (1..self.counts.len())
            .rev()
            .flat_map(move |i| std::iter::repeat(i).take(self.counts[i] as usize))
    }

    /// Brief form, e.g. `3 2x2 1`, or `None` when empty.
    pub fn show_brief(&self) -> String {
        if self.is_empty() {
            return "None".to_string();
        }
        (1..self.counts.len())
            .rev()
            .filter(|i| self.counts[*i] > 0)
            .map(|i| match self.counts[i] {
                1 => i.to_string(),
                c => format!("{}x{}", c, i),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// All partitions of `n` whose largest part is at most `m`.
    pub fn partitions_of(n: usize, m: usize) -> Vec<Partition> {
        let mut res = Vec::new();
        build(&mut Partition::new(), n, m.max(1), &mut res);
        res
    }

    /// All partitions of size at most `n` whose largest part is at most `m`.
    pub fn partitions_up_to(n: usize, m: usize) -> Vec<Partition> {
        let mut res = Vec::new();
        build_up_to(&mut Partition::new(), n, m, &mut res);
        res
    }

    /// True when the parts of `self` can be packed into bins sized by the
    /// parts of `bins`.
    pub fn bin_pack(&self, bins: &Partition) -> bool {
        bin_pack(&mut self.clone(), &mut bins.clone())
    }

    /// Like [`bin_pack`](Self::bin_pack), but on success returns one
    /// partition per bin, in decreasing bin order, holding the parts packed
    /// into that bin.
    pub fn bin_pack_and_how(&self, bins: &Partition) -> Option<Vec<Partition>> {
        if self.size() > bins.size() {
            return None;
        }
        let mut packing: Vec<Bin> = bins
            .iter()
            .map(|capacity| Bin {
                remaining: capacity,
                contents: Partition::new(),
            })
            .collect();
        bin_pack_and_how(&mut self.clone(), &mut packing)
            .then(|| packing.into_iter().map(|b| b.contents).collect())
    }
}

// n >= 0 and m >= 1; adds stem plus each partition of n with parts <= m.
fn build(stem: &mut Partition, n: usize, m: usize, res: &mut Vec<Partition>) {
    if n == 0 {
        res.push(stem.clone());
        return;
    }
    if n >= m {
        stem.add(m);
        build(stem, n - m, m, res);
        stem.sub(m);
    }
    if m > 1 {
        build(stem, n, m - 1, res);
    }
}

fn build_up_to(stem: &mut Partition, n: usize, m: usize, res: &mut Vec<Partition>) {
    if m == 0 {
        res.push(stem.clone());
        return;
    }
    if n >= m {
        stem.add(m);
        build_up_to(stem, n - m, m, res);
        stem.sub(m);
    }
    build_up_to(stem, n, m - 1, res);
}

fn bin_pack(items: &mut Partition, bins: &mut Partition) -> bool {
    if items.is_empty() {
        return true;
    }
    if bins.is_empty() || items.max() > bins.max() {
        return false;
    }
    let m = items.max();
    items.sub(m);
    let res = if bins.contains(m) {
        bins.sub(m);
        let res = bin_pack(items, bins);
        bins.add(m);
        res
    } else {
        let mut res = false;
        for i in m + 1..=bins.max() {
            if res {
                break;
            }
            if bins.contains(i) {
                bins.sub(i);
                bins.add(i - m);
                res = bin_pack(items, bins);
                bins.sub(i - m);
                bins.add(i);
            }
        }
        res
    };
    items.add(m);
    res
}

struct Bin {
    remaining: usize,
    contents: Partition,
}

fn bin_pack_and_how(items: &mut Partition, bins: &mut [Bin]) -> bool {
    if items.is_empty() {
        return true;
    }
    let m = items.max();
    if m == 1 {
        // ones fit anywhere there is room
        let mut count = items.parts_with_size(1);
        for bin in bins.iter_mut() {
            while bin.remaining >= 1 && count > 0 {
                bin.contents.add(1);
                bin.remaining -= 1;
                count -= 1;
            }
        }
        assert_eq!(count, 0, "bin_pack_and_how: capacity check failed");
        return true;
    }
    items.sub(m);
    let res = match bins.iter().position(|b| b.remaining == m) {
        Some(i) => try_bin(items, bins, i, m),
        None => (0..bins.len()).any(|i| bins[i].remaining > m && try_bin(items, bins, i, m)),
    };
    items.add(m);
    res
}

fn try_bin(items: &mut Partition, bins: &mut [Bin], i: usize, m: usize) -> bool {
    bins[i].contents.add(m);
    bins[i].remaining -= m;
    if bin_pack_and_how(items, bins) {
        return true;
    }
    bins[i].contents.sub(m);
    bins[i].remaining += m;
    false
}

impl fmt::Debug for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}: {}>", self.size(), self.show_brief())
    }
}

/// Parenthesized parts in decreasing order, e.g. `(3 2 2)`.
impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|i| i.to_string()).collect();
        write!(f, "({})", parts.join(" "))
    }
}

/// Error when parsing a partition from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionParseError {
    #[error("partition string contains 0")]
    Zero,

    #[error("partition string contains an oversize number")]
    Oversize,

    #[error("partition string contains an unexpected character '{0}'")]
    UnexpectedChar(char),
}

/// Parses space-separated parts such as `"3 2 2"`; `""` and `"None"` give
/// the empty partition.
impl FromStr for Partition {
    type Err = PartitionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut p = Partition::new();
        if s.trim() == "None" {
            return Ok(p);
        }
        for word in s.split_whitespace() {
            if let Some(ch) = word.chars().find(|c| !c.is_ascii_digit()) {
                return Err(PartitionParseError::UnexpectedChar(ch));
            }
            let part: usize = word
                .parse()
                .map_err(|_| PartitionParseError::Oversize)?;
            if part == 0 {
                return Err(PartitionParseError::Zero);
            }
            p.add(part);
        }
        Ok(p)
    }
}

#[cfg(test)]
#[path = "partition_tests.rs"]
mod tests;
