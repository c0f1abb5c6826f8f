//! Tick and TickSet
//!
//! A pool's liquidity distribution keyed by tick index. The map is unordered in
//! memory and sorted by index only when it leaves the crate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One initialized (or formerly initialized) tick boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tick {
    pub index: i32,
    /// Total absolute liquidity referencing this tick as a position boundary
    #[serde(with = "decimal_string::unsigned")]
    pub liquidity_gross: u128,
    /// Liquidity added to the active range when price crosses upward
    #[serde(with = "decimal_string::signed")]
    pub liquidity_net: i128,
}

impl Tick {
    pub fn empty(index: i32) -> Self {
        Self {
            index,
            liquidity_gross: 0,
            liquidity_net: 0,
        }
    }

    /// Zero-gross ticks stay in memory but are never persisted
    pub fn is_initialized(&self) -> bool {
        self.liquidity_gross != 0
    }
}

/// Index-keyed tick map for a single pool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSet {
    ticks: HashMap<i32, Tick>,
}

impl TickSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn get(&self, index: i32) -> Option<&Tick> {
        self.ticks.get(&index)
    }

    pub fn contains(&self, index: i32) -> bool {
        self.ticks.contains_key(&index)
    }

    /// Insert or replace the tick at `tick.index`
    pub fn insert(&mut self, tick: Tick) -> Option<Tick> {
        self.ticks.insert(tick.index, tick)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tick> {
        self.ticks.values()
    }

    /// Every known index, ascending
    pub fn indices(&self) -> Vec<i32> {
        let mut indices: Vec<i32> = self.ticks.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    /// Replace entries with authoritative values, adding unknown indices
    pub fn overlay<I>(&mut self, authoritative: I)
    where
        I: IntoIterator<Item = Tick>,
    {
        for tick in authoritative {
            self.ticks.insert(tick.index, tick);
        }
    }

    /// Apply one side of a position's liquidity change.
    ///
    /// The lower boundary gains `delta` of net liquidity and the upper boundary
    /// loses it; gross moves by `delta` on both. Arithmetic that would leave
    /// gross negative (or overflow either field) saturates and returns
    /// `false`, marking the tick untrustworthy without aborting the replay.
    pub fn apply_liquidity_change(&mut self, index: i32, delta: i128, is_lower: bool) -> bool {
        let tick = self.ticks.entry(index).or_insert_with(|| Tick::empty(index));
        let mut valid = true;

        tick.liquidity_gross = match tick.liquidity_gross.checked_add_signed(delta) {
            Some(gross) => gross,
            None => {
                valid = false;
                if delta < 0 {
                    0
                } else {
                    u128::MAX
                }
            }
        };

        let net_delta = if is_lower {
            Some(delta)
        } else {
            delta.checked_neg()
        };
        match net_delta.and_then(|d| tick.liquidity_net.checked_add(d)) {
            Some(net) => tick.liquidity_net = net,
            None => {
                valid = false;
                tick.liquidity_net = if is_lower == (delta > 0) {
                    i128::MAX
                } else {
                    i128::MIN
                };
            }
        }

        valid
    }

    /// Sum of net liquidity over every tick, `None` if it does not fit in i128
    pub fn net_sum(&self) -> Option<i128> {
        self.ticks
            .values()
            .try_fold(0i128, |acc, t| acc.checked_add(t.liquidity_net))
    }

    /// Initialized ticks sorted ascending by index, the persisted form
    pub fn to_sorted_initialized(&self) -> Vec<Tick> {
        let mut ticks: Vec<Tick> = self
            .ticks
            .values()
            .filter(|t| t.is_initialized())
            .copied()
            .collect();
        ticks.sort_unstable_by_key(|t| t.index);
        ticks
    }
}

impl FromIterator<Tick> for TickSet {
    fn from_iter<I: IntoIterator<Item = Tick>>(iter: I) -> Self {
        let mut set = TickSet::new();
        set.overlay(iter);
        set
    }
}

/// Decimal string (de)serialization for 128-bit liquidity values.
///
/// JSON numbers lose precision above 2^53 in most consumers, so liquidity is
/// persisted as a base-10 string.
pub mod decimal_string {
    macro_rules! decimal_module {
        ($name:ident, $ty:ty) => {
            pub mod $name {
                use serde::{Deserialize, Deserializer, Serializer};

                pub fn serialize<S: Serializer>(value: &$ty, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.collect_str(value)
                }

                pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<$ty, D::Error> {
                    let raw = String::deserialize(deserializer)?;
                    raw.parse::<$ty>().map_err(serde::de::Error::custom)
                }
            }
        };
    }

    decimal_module!(unsigned, u128);
    decimal_module!(signed, i128);
}
