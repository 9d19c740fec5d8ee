//! Top-level sampling and the counterexample search driver.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::config::Config;
use crate::context::Context;
use crate::error::GenerationError;
use crate::generator::Generator;
use crate::rng::Random;
use crate::tree;

/// The result of a counterexample search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// Every trial passed.
    NoCounterexample { trials: usize },
    /// A failing case, shrunk to a local minimum.
    Counterexample { value: T, shrink_steps: usize },
    /// Generation kept failing and the discard limit was reached.
    GaveUp { trials: usize, discards: usize },
}

/// Draw one value outside any shrink tree, for diagnostics. Deterministic
/// in (size, generator, seed).
pub fn sample<T, G>(size: usize, generator: &G, seed: u64) -> Result<T, GenerationError>
where
    T: 'static,
    G: Generator<T>,
{
    let mut ctx = Context::new(size, Random::from_seed(seed));
    generator.generate(&mut ctx)
}

/// Search for a counterexample with the default bounds and the given trial
/// count.
pub fn search<T, G, P>(property: P, generator: &G, seed: u64, trials: usize) -> Outcome<T>
where
    T: Clone + 'static,
    G: Generator<T> + Clone + 'static,
    P: Fn(&T) -> bool,
{
    search_with_config(
        property,
        generator,
        seed,
        &Config::default().with_trials(trials),
    )
}

/// Search for a counterexample.
///
/// Each trial materializes a shrink tree from an independent sub-stream of
/// the seed, at a size that grows toward the configured limit. A failing
/// case hands its tree to the shrink search; a generation failure discards
/// the trial and is bounded by the discard limit.
pub fn search_with_config<T, G, P>(
    property: P,
    generator: &G,
    seed: u64,
    config: &Config,
) -> Outcome<T>
where
    T: Clone + 'static,
    G: Generator<T> + Clone + 'static,
    P: Fn(&T) -> bool,
{
    let random = Random::from_seed(seed);
    let mut discards = 0;
    for trial in 0..config.trials {
        let case_random = random.split(trial as u64);
        let size = config.size_for(trial);
        match tree::grow(generator.clone(), size, case_random) {
            Err(error) => {
                discards += 1;
                log::debug!("trial {trial} discarded: {error}");
                if discards > config.discard_limit {
                    return Outcome::GaveUp {
                        trials: trial + 1,
                        discards,
                    };
                }
            }
            Ok((grown, value)) => {
                if holds(&property, &value) {
                    continue;
                }
                log::debug!("counterexample found at trial {trial}, shrinking");
                let (minimal, shrink_steps) = tree::shrink_tree(
                    grown,
                    &|candidate| !holds(&property, candidate),
                    config.shrink_limit,
                );
                return Outcome::Counterexample {
                    value: minimal,
                    shrink_steps,
                };
            }
        }
    }
    Outcome::NoCounterexample {
        trials: config.trials,
    }
}

/// Whether the property holds for `value`; a panic counts as a failure.
fn holds<T, P: Fn(&T) -> bool>(property: &P, value: &T) -> bool {
    catch_unwind(AssertUnwindSafe(|| property(value))).unwrap_or(false)
}
