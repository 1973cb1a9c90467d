//! Price Series Store
//!
//! One bounded FIFO buffer of recent prices per market. Appends are O(1);
//! when a buffer is full the oldest point is dropped without error. Reads
//! always hand out copies so an estimate in flight never observes a
//! concurrent append.

use dashmap::DashMap;
use log::{debug, warn};
use parallax_core::{MarketId, PricePoint};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Fixed-capacity circular buffer of price points for one market
#[derive(Debug, Clone)]
pub struct PriceSeries {
    points: VecDeque<PricePoint>,
    capacity: usize,
}

impl PriceSeries {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a point, returning the evicted oldest point if the buffer was full
    pub fn push(&mut self, point: PricePoint) -> Option<PricePoint> {
        let evicted = if self.points.len() == self.capacity {
            self.points.pop_front()
        } else {
            None
        };
        self.points.push_back(point);
        evicted
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent point
    pub fn latest(&self) -> Option<PricePoint> {
        self.points.back().copied()
    }

    /// Prices oldest to newest
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }
}

/// Per-market state shared between the store and the ingest path
///
/// `gate` serializes a market's whole ingest (append plus fan-out) so
/// records keyed by this market as primary are written in arrival order.
/// `series` is only held for the duration of an append or a copy.
pub(crate) struct MarketSlot {
    pub(crate) gate: Mutex<()>,
    series: Mutex<PriceSeries>,
}

impl MarketSlot {
    fn new(capacity: usize) -> Self {
        Self {
            gate: Mutex::new(()),
            series: Mutex::new(PriceSeries::new(capacity)),
        }
    }

    /// Append and return the new length
    pub(crate) fn push(&self, point: PricePoint) -> usize {
        let mut series = self.series.lock();
        series.push(point);
        series.len()
    }

    pub(crate) fn prices(&self) -> Vec<f64> {
        self.series.lock().prices()
    }

    fn len(&self) -> usize {
        self.series.lock().len()
    }

    fn latest(&self) -> Option<PricePoint> {
        self.series.lock().latest()
    }
}

/// Store of price series keyed by market
pub struct PriceSeriesStore {
    slots: DashMap<MarketId, Arc<MarketSlot>>,
    capacity: usize,
}

impl PriceSeriesStore {
    /// Create a store whose series each hold at most `capacity` points
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Per-series capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a price for a market, creating its series on first use
    ///
    /// Returns the series length after the append, or `None` if the price
    /// was rejected as non-finite.
    pub fn update_price(&self, market: &MarketId, point: PricePoint) -> Option<usize> {
        if !point.is_valid() {
            warn!("[STORE] Rejected non-finite price {} for {}", point.price, market);
            return None;
        }
        Some(self.slot(market).push(point))
    }

    /// Copy of a market's prices, oldest to newest (empty if unknown)
    pub fn snapshot(&self, market: &str) -> Vec<f64> {
        self.existing_slot(market)
            .map(|slot| slot.prices())
            .unwrap_or_default()
    }

    /// Number of stored points for a market (0 if unknown)
    pub fn len(&self, market: &str) -> usize {
        self.existing_slot(market)
            .map(|slot| slot.len())
            .unwrap_or(0)
    }

    /// Most recent point for a market
    pub fn latest(&self, market: &str) -> Option<PricePoint> {
        self.existing_slot(market).and_then(|slot| slot.latest())
    }

    /// Ids of every market with a series
    pub fn market_ids(&self) -> Vec<MarketId> {
        self.slots.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Every market with its current series length
    pub fn markets(&self) -> Vec<(MarketId, usize)> {
        // Collect handles first so no shard lock is held while locking a series
        let slots: Vec<(MarketId, Arc<MarketSlot>)> = self
            .slots
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        slots
            .into_iter()
            .map(|(id, slot)| {
                let len = slot.len();
                (id, len)
            })
            .collect()
    }

    pub fn market_count(&self) -> usize {
        self.slots.len()
    }

    /// Drop every series
    pub fn clear(&self) {
        let dropped = self.slots.len();
        self.slots.clear();
        debug!("[STORE] Cleared {} series", dropped);
    }

    /// Slot for a market, created lazily
    pub(crate) fn slot(&self, market: &MarketId) -> Arc<MarketSlot> {
        if let Some(slot) = self.existing_slot(market.as_str()) {
            return slot;
        }

        let capacity = self.capacity;
        let entry = self
            .slots
            .entry(market.clone())
            .or_insert_with(|| Arc::new(MarketSlot::new(capacity)));
        Arc::clone(entry.value())
    }

    fn existing_slot(&self, market: &str) -> Option<Arc<MarketSlot>> {
        self.slots.get(market).map(|slot| Arc::clone(slot.value()))
    }
}
