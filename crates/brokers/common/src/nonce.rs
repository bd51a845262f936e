use std::sync::atomic::{AtomicU64, Ordering};

/// Strictly increasing nonce source, safe to share between concurrent requests.
///
/// Values are millisecond timestamps. When the clock has not moved (or moved
/// backwards) since the last value, the previous value plus one is used instead.
#[derive(Debug, Default)]
pub struct NonceGenerator {
    last: AtomicU64,
}

impl NonceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a known floor, e.g. the last nonce used by a previous process.
    pub fn starting_after(floor: u64) -> Self {
        Self {
            last: AtomicU64::new(floor),
        }
    }

    pub fn next(&self) -> u64 {
        self.next_at(now_millis())
    }

    fn next_at(&self, now: u64) -> u64 {
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(current + 1);
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => current = actual,
            }
        }
    }
}

fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_follows_clock_when_it_advances() {
        let nonces = NonceGenerator::new();
        assert_eq!(nonces.next_at(1_000), 1_000);
        assert_eq!(nonces.next_at(2_000), 2_000);
    }

    #[test]
    fn test_bumps_when_clock_stalls_or_regresses() {
        let nonces = NonceGenerator::starting_after(5_000);
        assert_eq!(nonces.next_at(5_000), 5_001);
        assert_eq!(nonces.next_at(4_000), 5_002);
    }

    #[test]
    fn test_strictly_increasing_across_threads() {
        let nonces = Arc::new(NonceGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let nonces = Arc::clone(&nonces);
                std::thread::spawn(move || (0..500).map(|_| nonces.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let count = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), count, "nonces must never repeat");
    }
}
