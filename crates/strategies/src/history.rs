use core_types::Bar;
use std::collections::VecDeque;

/// Fixed-size trailing buffer of completed bars, newest first.
///
/// Offset 1 (the bar that closed most recently) is `get(0)`. Bars whose index
/// does not advance past the newest stored bar are ignored, so replaying a
/// boundary event twice leaves the buffer unchanged.
#[derive(Debug, Clone)]
pub struct BarHistory {
    bars: VecDeque<Bar>,
    capacity: usize,
}

impl BarHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            bars: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Stores a completed bar. Returns `false` when the bar was a duplicate or out of order.
    pub fn push(&mut self, bar: Bar) -> bool {
        if let Some(latest) = self.bars.front() {
            if bar.index <= latest.index {
                return false;
            }
        }
        self.bars.push_front(bar);
        self.bars.truncate(self.capacity);
        true
    }

    pub fn latest(&self) -> Option<&Bar> {
        self.bars.front()
    }

    /// Bar `n` positions back from the newest completed bar.
    pub fn get(&self, n: usize) -> Option<&Bar> {
        self.bars.get(n)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bar> {
        self.bars.iter()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.bars.len() >= self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn flat(index: u64) -> Bar {
        let p = Decimal::from(index);
        Bar::new(index, p, p, p, p)
    }

    #[test]
    fn keeps_newest_first_and_caps_length() {
        let mut history = BarHistory::new(3);
        for i in 1..=5 {
            assert!(history.push(flat(i)));
        }
        let order: Vec<u64> = history.iter().map(|b| b.index).collect();
        assert_eq!(order, vec![5, 4, 3]);
        assert!(history.is_full());
        assert_eq!(history.get(1).map(|b| b.index), Some(4));
    }

    #[test]
    fn ignores_replayed_and_stale_bars() {
        let mut history = BarHistory::new(4);
        assert!(history.push(flat(7)));
        assert!(!history.push(flat(7)));
        assert!(!history.push(flat(6)));
        assert_eq!(history.len(), 1);
    }
}
