//! Rolling window of test outcomes
//!
//! The train/eval loop stops once the trailing window of test episodes shows
//! a high enough success rate. This module tracks that window.

use std::collections::VecDeque;

/// Fixed-capacity rolling window of boolean episode outcomes
///
/// # Example
///
/// ```rust
/// use maze_nav::metrics::SuccessWindow;
///
/// let mut window = SuccessWindow::new(100);
/// window.push(true);
/// window.push(false);
///
/// assert_eq!(window.len(), 2);
/// assert_eq!(window.successes(), 1);
/// assert!(!window.is_full());
/// ```
#[derive(Debug, Clone)]
pub struct SuccessWindow {
    outcomes: VecDeque<bool>,
    capacity: usize,
}

impl SuccessWindow {
    /// Create a window tracking the most recent `capacity` outcomes
    pub fn new(capacity: usize) -> Self {
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record an outcome, evicting the oldest one once at capacity
    pub fn push(&mut self, success: bool) {
        if self.outcomes.len() >= self.capacity {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(success);
    }

    /// Number of outcomes currently held
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Whether the window has accumulated `capacity` outcomes
    pub fn is_full(&self) -> bool {
        self.outcomes.len() == self.capacity
    }

    /// Number of successful outcomes in the window
    pub fn successes(&self) -> usize {
        self.outcomes.iter().filter(|&&s| s).count()
    }

    /// Window capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let window = SuccessWindow::new(100);
        assert_eq!(window.capacity(), 100);
        assert_eq!(window.len(), 0);
        assert!(window.is_empty());
        assert!(!window.is_full());
    }

    #[test]
    fn test_push_and_count() {
        let mut window = SuccessWindow::new(10);
        window.push(true);
        window.push(true);
        window.push(false);

        assert_eq!(window.len(), 3);
        assert_eq!(window.successes(), 2);
    }

    #[test]
    fn test_eviction_at_capacity() {
        let mut window = SuccessWindow::new(3);
        window.push(true);
        window.push(false);
        window.push(false);
        assert!(window.is_full());
        assert_eq!(window.successes(), 1);

        // A 4th push evicts the first (true) outcome
        window.push(false);
        assert_eq!(window.len(), 3);
        assert_eq!(window.successes(), 0);
    }

    #[test]
    fn test_only_trailing_outcomes_counted() {
        let mut window = SuccessWindow::new(100);

        // 100 failures, then 100 successes: window should hold only successes
        for _ in 0..100 {
            window.push(false);
        }
        for _ in 0..100 {
            window.push(true);
        }

        assert!(window.is_full());
        assert_eq!(window.successes(), 100);
    }

    #[test]
    fn test_not_full_below_capacity() {
        let mut window = SuccessWindow::new(100);
        for _ in 0..99 {
            window.push(true);
        }
        assert!(!window.is_full());
        window.push(true);
        assert!(window.is_full());
    }
}
