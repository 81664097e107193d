//! Bounded top-K selection shared by concurrent scoring tasks
//!
//! Every scoring task of one search pushes into the same [`TopK`]. The
//! selector keeps the `capacity` heaviest entries above a minimum weight in
//! descending order. Equal weights keep their arrival order, so the first
//! candidate seen wins a tie for the last slot.

use std::sync::{Mutex, PoisonError};

/// A value paired with its similarity weight
#[derive(Debug, Clone, PartialEq)]
pub struct Scored<T> {
    pub value: T,
    pub weight: f64,
}

/// Concurrency-safe bounded selector
#[derive(Debug)]
pub struct TopK<T> {
    capacity: usize,
    min_weight: f64,
    items: Mutex<Vec<Scored<T>>>,
}

impl<T> TopK<T> {
    pub fn new(capacity: usize, min_weight: f64) -> Self {
        Self {
            capacity,
            min_weight,
            items: Mutex::new(Vec::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn min_weight(&self) -> f64 {
        self.min_weight
    }

    /// Offer a candidate. Returns whether it was retained.
    ///
    /// Weights below the minimum (or NaN) are rejected. Once full, a
    /// candidate must be strictly heavier than the lightest retained entry
    /// to displace it.
    pub fn add(&self, value: T, weight: f64) -> bool {
        if self.capacity == 0 || weight.is_nan() || weight < self.min_weight {
            return false;
        }

        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);

        // First slot holding something strictly lighter
        let pos = items.partition_point(|item| item.weight >= weight);
        if pos >= self.capacity {
            return false;
        }

        items.insert(pos, Scored { value, weight });
        items.truncate(self.capacity);
        true
    }

    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the selector, returning entries heaviest first
    pub fn into_items(self) -> Vec<Scored<T>> {
        self.items
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> TopK<T> {
    /// Copy of the retained entries, heaviest first
    pub fn items(&self) -> Vec<Scored<T>> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn weights<T>(items: &[Scored<T>]) -> Vec<f64> {
        items.iter().map(|i| i.weight).collect()
    }

    #[test]
    fn test_keeps_highest_in_order() {
        let top = TopK::new(3, 0.0);
        for (v, w) in [("a", 0.2), ("b", 0.9), ("c", 0.5), ("d", 0.7), ("e", 0.1)] {
            top.add(v, w);
        }
        let items = top.into_items();
        assert_eq!(weights(&items), vec![0.9, 0.7, 0.5]);
        assert_eq!(items[0].value, "b");
    }

    #[test]
    fn test_min_weight_rejects() {
        let top = TopK::new(5, 0.5);
        assert!(!top.add("low", 0.49));
        assert!(!top.add("nan", f64::NAN));
        assert!(top.add("ok", 0.5));
        assert_eq!(top.len(), 1);
    }

    #[test]
    fn test_ties_keep_first_seen() {
        let top = TopK::new(2, 0.0);
        assert!(top.add("first", 0.8));
        assert!(top.add("second", 0.8));
        assert!(!top.add("third", 0.8));
        let items = top.into_items();
        assert_eq!(items[0].value, "first");
        assert_eq!(items[1].value, "second");
    }

    #[test]
    fn test_zero_capacity() {
        let top = TopK::new(0, 0.0);
        assert!(!top.add(1, 1.0));
        assert!(top.is_empty());
    }

    #[test]
    fn test_concurrent_adds() {
        let top = Arc::new(TopK::new(10, 0.0));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let top = Arc::clone(&top);
                std::thread::spawn(move || {
                    for i in 0..250 {
                        let n = t * 250 + i;
                        top.add(n, n as f64 / 2000.0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let values: Vec<usize> = top.items().into_iter().map(|s| s.value).collect();
        assert_eq!(values, (1990..2000).rev().collect::<Vec<_>>());
    }
}
