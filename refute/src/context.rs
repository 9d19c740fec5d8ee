//! The generation context threaded through every draw.

use crate::rng::Random;
use crate::tree::{NodeId, RoseTree};

/// Default size hint when nothing narrower is in effect.
pub const NOMINAL_SIZE: usize = 100;

/// Dynamic parameters in effect during a draw.
///
/// The original design threads these as dynamically-scoped implicit
/// parameters; here they are an explicit value passed to `generate`, so each
/// test case (and each worker thread) has its own context by construction.
/// Scoped overrides are closure-based and restore the previous value on
/// every exit path, including early `Err` returns.
pub struct Context {
    pub(crate) size: usize,
    pub(crate) random: Random,
    pub(crate) no_shrink: bool,
    pub(crate) tree: Option<RoseTree>,
    pub(crate) current: Option<NodeId>,
}

impl Context {
    /// A context for one test case.
    pub fn new(size: usize, random: Random) -> Self {
        Context {
            size,
            random,
            no_shrink: false,
            tree: None,
            current: None,
        }
    }

    /// The size hint currently in effect.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether sub-draw registration is currently suppressed.
    pub fn no_shrink(&self) -> bool {
        self.no_shrink
    }

    /// The random stream for direct draws.
    pub fn random_mut(&mut self) -> &mut Random {
        &mut self.random
    }

    /// Run `body` with the size hint overridden to `size`.
    pub fn with_size<R>(&mut self, size: usize, body: impl FnOnce(&mut Context) -> R) -> R {
        let previous = std::mem::replace(&mut self.size, size);
        let result = body(self);
        self.size = previous;
        result
    }

    /// Run `body` with sub-draw registration suppressed, so the value drawn
    /// inside becomes a leaf of the shrink tree.
    pub fn with_no_shrink<R>(&mut self, body: impl FnOnce(&mut Context) -> R) -> R {
        let previous = std::mem::replace(&mut self.no_shrink, true);
        let result = body(self);
        self.no_shrink = previous;
        result
    }
}

impl Default for Context {
    /// A context at nominal size over an entropy-seeded stream, for ad-hoc
    /// sampling outside any driver.
    fn default() -> Self {
        Context::new(NOMINAL_SIZE, Random::from_entropy())
    }
}
