//! The `Arbitrary` extension point: a type-indexed default generator.

use std::collections::HashSet;
use std::hash::Hash;

use crate::combinators::{map, tuple_of, TupleGenerator};
use crate::generator::{constant, one_of, Generator, OneOfGenerator, SharedGenerator};
use crate::primitives::{
    character, collection, BoolGenerator, CharacterGenerator, CollectionGenerator, IntGenerator,
};

/// Types with a canonical default generator.
///
/// `arbitrary::<T>()` dispatches through this trait, so registering a
/// default generator for your own type is an `impl Arbitrary`. For types
/// you cannot implement it for, the runtime
/// [`GeneratorRegistry`](crate::generator::GeneratorRegistry) fills the
/// same role.
pub trait Arbitrary: Clone + Sized + 'static {
    /// The concrete generator `arbitrary` returns.
    type Gen: Generator<Self> + Clone + 'static;

    fn arbitrary() -> Self::Gen;
}

/// The default generator for `T`.
pub fn arbitrary<T: Arbitrary>() -> T::Gen {
    T::arbitrary()
}

macro_rules! impl_int_arbitrary {
    ($($t:ty),*) => {
        $(
            impl Arbitrary for $t {
                type Gen = IntGenerator<$t>;

                fn arbitrary() -> Self::Gen {
                    IntGenerator::new()
                }
            }
        )*
    };
}

impl_int_arbitrary!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Arbitrary for bool {
    type Gen = BoolGenerator;

    fn arbitrary() -> Self::Gen {
        BoolGenerator
    }
}

impl Arbitrary for char {
    type Gen = CharacterGenerator<char>;

    fn arbitrary() -> Self::Gen {
        character()
    }
}

impl Arbitrary for String {
    type Gen = CollectionGenerator<String, CharacterGenerator<char>>;

    fn arbitrary() -> Self::Gen {
        collection(character())
    }
}

impl<T: Arbitrary> Arbitrary for Vec<T> {
    type Gen = CollectionGenerator<Vec<T>, T::Gen>;

    fn arbitrary() -> Self::Gen {
        collection(T::arbitrary())
    }
}

impl<T: Arbitrary + Hash + Eq> Arbitrary for HashSet<T> {
    type Gen = CollectionGenerator<HashSet<T>, T::Gen>;

    fn arbitrary() -> Self::Gen {
        collection(T::arbitrary())
    }
}

impl<T: Arbitrary> Arbitrary for Option<T> {
    type Gen = OneOfGenerator<Option<T>>;

    fn arbitrary() -> Self::Gen {
        one_of(vec![
            SharedGenerator::new(constant(None)),
            SharedGenerator::new(map(T::arbitrary(), Some)),
        ])
    }
}

macro_rules! impl_tuple_arbitrary {
    ($($T:ident),+) => {
        impl<$($T: Arbitrary),+> Arbitrary for ($($T,)+) {
            type Gen = TupleGenerator<($($T::Gen,)+)>;

            fn arbitrary() -> Self::Gen {
                tuple_of(($($T::arbitrary(),)+))
            }
        }
    };
}

impl_tuple_arbitrary!(A, B);
impl_tuple_arbitrary!(A, B, C);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::rng::Random;

    fn test_context() -> Context {
        Context::new(10, Random::from_seed(0))
    }

    #[test]
    fn test_arbitrary_int_respects_size() {
        let generator = arbitrary::<i32>();
        let mut ctx = test_context();
        for _ in 0..200 {
            let value = generator.generate(&mut ctx).unwrap();
            assert!((-10..=10).contains(&value));
        }
    }

    #[test]
    fn test_arbitrary_tuple_draws_all_components() {
        let generator = arbitrary::<(i32, bool)>();
        let mut ctx = test_context();
        let (number, _flag) = generator.generate(&mut ctx).unwrap();
        assert!((-10..=10).contains(&number));
    }

    #[test]
    fn test_arbitrary_vec_length_bounded_by_size() {
        let generator = arbitrary::<Vec<i32>>();
        let mut ctx = test_context();
        for _ in 0..100 {
            assert!(generator.generate(&mut ctx).unwrap().len() <= 10);
        }
    }

    #[test]
    fn test_arbitrary_option_produces_both_variants() {
        let generator = arbitrary::<Option<u8>>();
        let mut ctx = test_context();
        let mut saw_none = false;
        let mut saw_some = false;
        for _ in 0..200 {
            match generator.generate(&mut ctx).unwrap() {
                None => saw_none = true,
                Some(_) => saw_some = true,
            }
        }
        assert!(saw_none && saw_some);
    }

    #[test]
    fn test_arbitrary_string_is_size_bounded() {
        let generator = arbitrary::<String>();
        let mut ctx = test_context();
        for _ in 0..50 {
            assert!(generator.generate(&mut ctx).unwrap().chars().count() <= 10);
        }
    }
}
