use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Sub};

/// Simulated time in seconds.
///
/// Totally ordered so it can key the event queue and the merge map.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimTime(f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    pub fn new(seconds: f64) -> Self {
        // fold -0.0 into 0.0 so equal instants share one merge key
        SimTime(seconds + 0.0)
    }

    pub fn seconds(&self) -> f64 {
        self.0
    }
}

impl From<f64> for SimTime {
    fn from(seconds: f64) -> Self {
        SimTime::new(seconds)
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for SimTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl Add<f64> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: f64) -> SimTime {
        SimTime::new(self.0 + rhs)
    }
}

impl Sub for SimTime {
    type Output = f64;

    fn sub(self, rhs: SimTime) -> f64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3e}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_zero_is_zero() {
        assert_eq!(SimTime::new(-0.0), SimTime::ZERO);
        let mut a = std::collections::hash_map::DefaultHasher::new();
        let mut b = std::collections::hash_map::DefaultHasher::new();
        SimTime::new(-0.0).hash(&mut a);
        SimTime::ZERO.hash(&mut b);
        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn test_ordering_and_arithmetic() {
        let t = SimTime::new(-1.0);
        assert!(t < SimTime::ZERO);
        assert_eq!(t + 1.5, SimTime::new(0.5));
        assert_eq!(SimTime::new(2.0) - SimTime::new(0.5), 1.5);
        assert_eq!(format!("{}", SimTime::new(1e-9)), "1.000e-9s");
    }
}
