use rand::{rngs::OsRng, Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use std::cell::RefCell;

/// Seeded random source for driving randomized edit scripts.
///
/// Uses the xoshiro256** PRNG so a failing run can be replayed from its
/// [`Fuzzer::seed`].
///
/// # Examples
///
/// ```
/// use mirror_util::fuzzer::Fuzzer;
///
/// let fuzzer = Fuzzer::new(Some([3u8; 32]));
/// let n = fuzzer.random_int(1, 10);
/// assert!((1..=10).contains(&n));
///
/// assert_eq!(fuzzer.random_index(0), None);
/// assert!(fuzzer.random_index(4).unwrap() < 4);
/// ```
pub struct Fuzzer {
    /// The seed used to initialize the PRNG.
    pub seed: [u8; 32],
    rng: RefCell<Xoshiro256StarStar>,
}

impl Fuzzer {
    /// Create a fuzzer, seeding from `OsRng` when no seed is given.
    pub fn new(seed: Option<[u8; 32]>) -> Self {
        let seed = seed.unwrap_or_else(|| {
            let mut bytes = [0u8; 32];
            OsRng.fill_bytes(&mut bytes);
            bytes
        });
        Self {
            seed,
            rng: RefCell::new(Xoshiro256StarStar::from_seed(seed)),
        }
    }

    /// Random integer in `[min, max]`.
    pub fn random_int(&self, min: i64, max: i64) -> i64 {
        self.rng.borrow_mut().gen_range(min..=max)
    }

    /// Random position in a sequence of `len` elements, `None` when empty.
    pub fn random_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.rng.borrow_mut().gen_range(0..len))
    }

    /// Random insertion point in a sequence of `len` elements (`0..=len`).
    pub fn random_slot(&self, len: usize) -> usize {
        self.rng.borrow_mut().gen_range(0..=len)
    }

    /// Pick a random element. Panics on an empty slice.
    pub fn pick<'a, T>(&self, elements: &'a [T]) -> &'a T {
        let idx = self.rng.borrow_mut().gen_range(0..elements.len());
        &elements[idx]
    }

    /// `true` with the given probability.
    pub fn random_bool(&self, probability: f64) -> bool {
        self.rng.borrow_mut().gen_bool(probability)
    }

    /// Random string of `len` characters drawn from `chars`.
    pub fn random_string(&self, len: usize, chars: &str) -> String {
        let chars: Vec<char> = chars.chars().collect();
        let mut rng = self.rng.borrow_mut();
        (0..len)
            .map(|_| chars[rng.gen_range(0..chars.len())])
            .collect()
    }

    /// Repeat a callback `times` times and collect results.
    pub fn repeat<T, F>(&self, times: usize, mut callback: F) -> Vec<T>
    where
        F: FnMut() -> T,
    {
        (0..times).map(|_| callback()).collect()
    }
}
