//! # Refute: a property-based testing core
//!
//! Refute searches for counterexamples to properties by random generation
//! and, when one is found, reduces it to a locally minimal failing case
//! through structured shrinking. Generators are composable values; every
//! composite draw is recorded in a rose tree that remembers how the value
//! was decomposed, and the shrink search walks that tree.
//!
//! ## Quick start
//!
//! ```rust
//! use refute::{collection, ranged, search, Outcome};
//!
//! let generator = collection::<Vec<i32>, _>(ranged(0, 10));
//! let outcome = search(|xs: &Vec<i32>| xs.len() < 100, &generator, 1, 50);
//! assert!(matches!(outcome, Outcome::NoCounterexample { .. }));
//! ```

pub mod arbitrary;
pub mod combinators;
pub mod config;
pub mod context;
pub mod error;
pub mod generator;
pub mod primitives;
pub mod rng;
pub mod runner;
pub mod shrink;
mod tree;

// Re-export the main public API
pub use arbitrary::{arbitrary, Arbitrary};
pub use combinators::{
    lambda, map, map_invertible, negative, no_shrink, non_negative, non_zero, pair_of, positive,
    rescue, resize, scale, such_that, tuple_of, InvertibleGenerator, LambdaGenerator,
    MappedGenerator, NoShrinkGenerator, RescueGenerator, ResizeGenerator, ScaleGenerator, Signed,
    SuchThatGenerator, TupleGenerator,
};
pub use config::Config;
pub use context::{Context, NOMINAL_SIZE};
pub use error::{ConfigError, GenerationError};
pub use generator::{
    constant, one_of, BoxedGenerator, ConstantGenerator, Generator, GeneratorRegistry,
    OneOfGenerator, SharedGenerator,
};
pub use primitives::{
    array_of, character, collection, ranged, vector, ArrayGenerator, BoolGenerator, CharValue,
    CharacterGenerator, CollectionGenerator, Container, IntGenerator, RangedGenerator,
    RangedValue, VectorGenerator,
};
pub use rng::Random;
pub use runner::{sample, search, search_with_config, Outcome};
pub use shrink::Shrinks;
pub use tree::pick;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_composition() {
        let generator = pair_of(constant(42), map(ranged(1, 10), |x: i32| x * 2));
        let value = sample(10, &generator, 5).unwrap();
        assert_eq!(value.0, 42);
        assert!(value.1 % 2 == 0 && (2..20).contains(&value.1));
    }

    #[test]
    fn test_arbitrary_drives_search_end_to_end() {
        let outcome = search(
            |pair: &(i32, bool)| pair.0 >= -100,
            &arbitrary::<(i32, bool)>(),
            3,
            50,
        );
        assert_eq!(outcome, Outcome::NoCounterexample { trials: 50 });
    }
}
