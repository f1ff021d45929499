//! Push keys — chronologically sortable child keys generated client-side.
//!
//! DESIGN
//! ======
//! A key is 20 characters from an alphabet whose byte order matches its
//! value order: 8 characters of millisecond timestamp followed by 12 random
//! characters. Within one millisecond the random tail is incremented instead
//! of redrawn, so keys from one generator sort in creation order.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";
const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

pub struct PushIdGenerator {
    state: Mutex<PushIdState>,
}

struct PushIdState {
    last_ms: u64,
    random: [u8; RANDOM_CHARS],
}

impl PushIdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self { state: Mutex::new(PushIdState { last_ms: 0, random: [0; RANDOM_CHARS] }) }
    }

    /// Generate a key stamped with the current time.
    #[must_use]
    pub fn next_id(&self) -> String {
        self.next_id_at(now_ms())
    }

    /// Internal: generate with an explicit timestamp (for testing).
    pub(crate) fn next_id_at(&self, now: u64) -> String {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if now == state.last_ms {
            increment(&mut state.random);
        } else {
            state.last_ms = now;
            let mut rng = rand::rng();
            for digit in &mut state.random {
                *digit = rng.random_range(0..64);
            }
        }

        let mut id = String::with_capacity(TIME_CHARS + RANDOM_CHARS);
        let mut time_digits = [0u8; TIME_CHARS];
        let mut ts = now;
        for slot in time_digits.iter_mut().rev() {
            *slot = PUSH_CHARS[usize::try_from(ts % 64).unwrap_or(0)];
            ts /= 64;
        }
        id.extend(time_digits.iter().map(|&b| char::from(b)));
        id.extend(state.random.iter().map(|&d| char::from(PUSH_CHARS[usize::from(d)])));
        id
    }
}

impl Default for PushIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Add one to a base-64 digit string, carrying leftwards.
fn increment(digits: &mut [u8; RANDOM_CHARS]) {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
}

fn now_ms() -> u64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    u64::try_from(dur.as_millis()).unwrap_or(0)
}

#[cfg(test)]
#[path = "push_id_test.rs"]
mod tests;
