// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

// 32-bit sequence numbers for the byte stream.
//
// Sequence arithmetic is modulo 2^32: the stream position wraps through
// zero, so "before" and "after" are only meaningful for values less than
// half the number space apart. Ordering is defined through the signed
// distance between two values, which makes the comparison operators
// wrap-safe but also non-transitive once values straddle the wrap; there is
// no total order. Keeping the type separate from u32 stops an ordinary
// integer comparison from sneaking into window arithmetic.

use ::std::{cmp::Ordering, fmt};

/// Position in the connection's byte stream, modulo 2^32.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SeqNumber {
    value: u32,
}

impl SeqNumber {
    /// Signed distance from `other` to `self`: positive when `self` is
    /// ahead, reading the gap as shorter than half the sequence space.
    fn distance(self, other: SeqNumber) -> i32 {
        self.value.wrapping_sub(other.value) as i32
    }
}

impl From<u32> for SeqNumber {
    fn from(value: u32) -> Self {
        Self { value }
    }
}

impl From<SeqNumber> for u32 {
    fn from(seqno: SeqNumber) -> u32 {
        seqno.value
    }
}

impl fmt::Display for SeqNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl std::ops::Add for SeqNumber {
    type Output = SeqNumber;

    fn add(self, other: SeqNumber) -> SeqNumber {
        Self {
            value: self.value.wrapping_add(other.value),
        }
    }
}

impl std::ops::Sub for SeqNumber {
    type Output = SeqNumber;

    fn sub(self, other: SeqNumber) -> SeqNumber {
        Self {
            value: self.value.wrapping_sub(other.value),
        }
    }
}

// Every comparison operator follows from the signed distance, so a sequence
// number just past the wrap still compares greater than one just before it.
// Equality agrees with the derived PartialEq (distance zero).
impl PartialOrd for SeqNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.distance(*other).cmp(&0))
    }
}
