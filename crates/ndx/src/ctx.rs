//! Id-generation and clock capability passed through the file.
//!
//! Every object id has the external form `"{kind}_" + 32 lowercase hex
//! characters`. The hex stream comes from a xorshift generator seeded once
//! per context, either from entropy or from a fixed seed, so tests can pin
//! the id sequence and the clock without any process-global state.

use std::cell::{Cell, RefCell};

/// Deterministic pseudorandom id source.
///
/// Not cryptographically unpredictable; collision probability is treated as
/// negligible and never checked here. Creation paths that require
/// uniqueness among siblings retry against the existing children.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    state: u64,
}

impl IdGenerator {
    /// Seed from process entropy.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_entropy() -> Self {
        let entropy = uuid::Uuid::new_v4().as_u128();
        Self::from_seed((entropy as u64) ^ ((entropy >> 64) as u64))
    }

    /// Seed explicitly; the produced id sequence is a pure function of the
    /// seed.
    pub const fn from_seed(seed: u64) -> Self {
        // xorshift has a fixed point at zero.
        let state = if seed == 0 { 0x5DEE_CE66_D1A4_F681 } else { seed };
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        let mut s = self.state;
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        self.state = s;
        s
    }

    /// Produce the next id for the given entity kind.
    pub fn next_id(&mut self, kind: &str) -> String {
        let hi = self.next_u64();
        let lo = self.next_u64();
        format!("{kind}_{hi:016x}{lo:016x}")
    }
}

/// Time source: either the system clock or a fixed value for tests.
#[derive(Debug)]
enum Clock {
    System,
    Fixed(Cell<i64>),
}

impl Clock {
    fn now(&self) -> i64 {
        match self {
            Self::System => chrono::Utc::now().timestamp(),
            Self::Fixed(secs) => secs.get(),
        }
    }
}

/// Capability bundle (ids + clock) owned by an [`crate::NdxFile`].
#[derive(Debug)]
pub struct Context {
    ids: RefCell<IdGenerator>,
    clock: Clock,
}

impl Context {
    /// Entropy-seeded ids, system clock.
    pub fn new() -> Self {
        Self {
            ids: RefCell::new(IdGenerator::from_entropy()),
            clock: Clock::System,
        }
    }

    /// Fixed seed and fixed epoch time; fully reproducible.
    pub fn deterministic(seed: u64, epoch_secs: i64) -> Self {
        Self {
            ids: RefCell::new(IdGenerator::from_seed(seed)),
            clock: Clock::Fixed(Cell::new(epoch_secs)),
        }
    }

    /// Next id for the given entity kind.
    pub fn new_id(&self, kind: &str) -> String {
        self.ids.borrow_mut().next_id(kind)
    }

    /// Current time in epoch seconds.
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Advance a fixed clock; no effect on the system clock.
    pub fn set_time_for_testing(&self, epoch_secs: i64) {
        if let Clock::Fixed(secs) = &self.clock {
            secs.set(epoch_secs);
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
