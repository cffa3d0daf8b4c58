//! Process-unique synthetic identities.
//!
//! An [`Identity`] is an opaque string token handed out once per logical
//! item. It is never derived from the item's content, so two items holding
//! equal values still have distinct identities.

use std::borrow::Borrow;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::{rngs::OsRng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use serde::Serialize;

/// Stable handle for one logical item.
///
/// Cloning is cheap (reference counted). Two identities compare equal only
/// when they carry the same token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identity(Rc<str>);

impl Identity {
    /// Wrap an existing token. Callers are responsible for uniqueness.
    pub fn from_token(token: impl Into<Rc<str>>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Identity {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Source of fresh identities.
///
/// Implementations must never hand out the same token twice for the lifetime
/// of the allocator (and, for the shared default, of the process).
pub trait IdentityAllocator {
    fn next(&self) -> Identity;
}

impl<A: IdentityAllocator + ?Sized> IdentityAllocator for Rc<A> {
    fn next(&self) -> Identity {
        (**self).next()
    }
}

static PROCESS_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Monotonic counter allocator.
///
/// The default instance draws from one process-wide counter, so every
/// default allocator in the process produces disjoint tokens.
/// [`SequentialIds::with_prefix`] creates an isolated counter; its tokens are
/// only unique among allocators using distinct prefixes.
///
/// # Examples
///
/// ```
/// use mirror_util::identity::{IdentityAllocator, SequentialIds};
///
/// let ids = SequentialIds::default();
/// let a = ids.next();
/// let b = ids.next();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Default)]
pub struct SequentialIds {
    local: Option<LocalCounter>,
}

#[derive(Debug)]
struct LocalCounter {
    prefix: Rc<str>,
    next: std::cell::Cell<u64>,
}

impl SequentialIds {
    /// Allocator with its own counter, producing `"{prefix}{n}"`.
    ///
    /// Two allocators created with the same prefix hand out the same tokens.
    /// Give every prefixed allocator that feeds the same identity space its
    /// own prefix.
    pub fn with_prefix(prefix: impl Into<Rc<str>>) -> Self {
        Self {
            local: Some(LocalCounter {
                prefix: prefix.into(),
                next: std::cell::Cell::new(0),
            }),
        }
    }
}

impl IdentityAllocator for SequentialIds {
    fn next(&self) -> Identity {
        match &self.local {
            Some(local) => {
                let n = local.next.get();
                local.next.set(n + 1);
                Identity::from_token(format!("{}{}", local.prefix, n))
            }
            None => {
                let n = PROCESS_COUNTER.fetch_add(1, Ordering::Relaxed);
                Identity::from_token(format!("m{n}"))
            }
        }
    }
}

/// Random 128-bit tokens, for identities that must not collide across
/// processes.
pub struct RandomIds {
    rng: RefCell<Xoshiro256StarStar>,
}

impl RandomIds {
    /// Seed from the operating system.
    pub fn new() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Self::from_seed(seed)
    }

    /// Deterministic sequence, mostly useful in tests.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            rng: RefCell::new(Xoshiro256StarStar::from_seed(seed)),
        }
    }
}

impl Default for RandomIds {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RandomIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomIds").finish_non_exhaustive()
    }
}

impl IdentityAllocator for RandomIds {
    fn next(&self) -> Identity {
        let mut rng = self.rng.borrow_mut();
        let hi = rng.next_u64();
        let lo = rng.next_u64();
        Identity::from_token(format!("{hi:016x}{lo:016x}"))
    }
}
