/// Running summary for one key. All values are in tenths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    min: i32,
    max: i32,
    sum: i64,
    count: u64,
}

impl Stats {
    #[inline]
    pub fn new(value: i32) -> Self {
        Self {
            min: value,
            max: value,
            sum: value as i64,
            count: 1,
        }
    }

    #[inline]
    pub fn record(&mut self, value: i32) {
        self.sum += value as i64;
        self.count += 1;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    #[inline]
    pub fn merge(&mut self, other: &Stats) {
        self.sum += other.sum;
        self.count += other.count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn sum(&self) -> i64 {
        self.sum
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean in tenths. Floating point is only used here.
    pub fn mean(&self) -> f64 {
        self.sum as f64 / self.count as f64
    }
}
