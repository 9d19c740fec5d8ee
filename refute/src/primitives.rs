//! Generators for primitive types and collections.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::marker::PhantomData;

use crate::context::Context;
use crate::error::GenerationError;
use crate::generator::Generator;
use crate::rng::Random;
use crate::shrink::{self, Shrinks};
use crate::tree::pick;

/// Integer types `ranged` can draw. Spans are computed in 128-bit arithmetic
/// so the full range of every 64-bit type is representable.
pub trait RangedValue: Copy + PartialOrd + std::fmt::Display + 'static {
    fn span(lo: Self, hi: Self) -> u64;
    fn from_offset(lo: Self, offset: u64) -> Self;
}

macro_rules! impl_ranged_value {
    ($($t:ty),*) => {
        $(
            impl RangedValue for $t {
                fn span(lo: Self, hi: Self) -> u64 {
                    (hi as i128 - lo as i128) as u64
                }

                fn from_offset(lo: Self, offset: u64) -> Self {
                    (lo as i128 + offset as i128) as $t
                }
            }
        )*
    };
}

impl_ranged_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Generator for integers in a half-open range.
#[derive(Debug, Clone)]
pub struct RangedGenerator<T> {
    lo: T,
    hi: T,
}

/// Uniform integer in `[lo, hi)`. Fails with `InvalidRange` when `hi < lo`
/// and returns `lo` when the bounds are equal. The draw is unbiased
/// (rejection sampling) and comes straight from the stream, so a ranged
/// value is a leaf of the shrink tree and carries no shrink of its own.
pub fn ranged<T: RangedValue>(lo: T, hi: T) -> RangedGenerator<T> {
    RangedGenerator { lo, hi }
}

impl<T: RangedValue> Generator<T> for RangedGenerator<T> {
    fn generate(&self, ctx: &mut Context) -> Result<T, GenerationError> {
        if self.hi < self.lo {
            return Err(GenerationError::invalid_range(self.lo, self.hi));
        }
        if self.hi == self.lo {
            return Ok(self.lo);
        }
        let offset = ctx.random_mut().next_below(T::span(self.lo, self.hi));
        Ok(T::from_offset(self.lo, offset))
    }
}

/// Default generator for integers: magnitude bounded by the current size,
/// shrinking toward zero.
#[derive(Debug, Clone, Default)]
pub struct IntGenerator<T> {
    _result: PhantomData<fn() -> T>,
}

impl<T> IntGenerator<T> {
    pub fn new() -> Self {
        IntGenerator {
            _result: PhantomData,
        }
    }
}

macro_rules! impl_signed_int_generator {
    ($($t:ty),*) => {
        $(
            impl Generator<$t> for IntGenerator<$t> {
                fn generate(&self, ctx: &mut Context) -> Result<$t, GenerationError> {
                    let bound = (ctx.size() as u64)
                        .min(<$t>::MAX as u64)
                        .min((u64::MAX - 1) / 2);
                    let offset = ctx.random_mut().next_below(2 * bound + 1);
                    Ok((offset as i128 - bound as i128) as $t)
                }

                fn shrink(&self, value: &$t) -> Shrinks<$t> {
                    let value = *value;
                    if value == 0 {
                        return shrink::nothing();
                    }
                    let mut candidates = vec![0];
                    if value < 0 {
                        if let Some(negated) = value.checked_neg() {
                            candidates.push(negated);
                        }
                    }
                    let mut delta = value / 2;
                    while delta != 0 {
                        candidates.push(value - delta);
                        delta /= 2;
                    }
                    shrink::constant(candidates)
                }
            }
        )*
    };
}

macro_rules! impl_unsigned_int_generator {
    ($($t:ty),*) => {
        $(
            impl Generator<$t> for IntGenerator<$t> {
                fn generate(&self, ctx: &mut Context) -> Result<$t, GenerationError> {
                    let bound = (ctx.size() as u64)
                        .min(<$t>::MAX as u64)
                        .min(u64::MAX - 1);
                    Ok(ctx.random_mut().next_below(bound + 1) as $t)
                }

                fn shrink(&self, value: &$t) -> Shrinks<$t> {
                    let value = *value;
                    if value == 0 {
                        return shrink::nothing();
                    }
                    let mut candidates = vec![0];
                    let mut delta = value / 2;
                    while delta != 0 {
                        candidates.push(value - delta);
                        delta /= 2;
                    }
                    shrink::constant(candidates)
                }
            }
        )*
    };
}

impl_signed_int_generator!(i8, i16, i32, i64, i128, isize);
impl_unsigned_int_generator!(u8, u16, u32, u64, u128, usize);

/// Default generator for booleans; `true` shrinks to `false`.
#[derive(Debug, Clone, Default)]
pub struct BoolGenerator;

impl Generator<bool> for BoolGenerator {
    fn generate(&self, ctx: &mut Context) -> Result<bool, GenerationError> {
        Ok(ctx.random_mut().next_u64() & 1 == 1)
    }

    fn shrink(&self, value: &bool) -> Shrinks<bool> {
        if *value {
            shrink::constant(vec![false])
        } else {
            shrink::nothing()
        }
    }
}

/// Character-like result types for [`character`].
pub trait CharValue: Copy + PartialEq + 'static {
    fn from_byte(byte: u8) -> Self;
    /// A full-range non-zero draw.
    fn random_nonzero(random: &mut Random) -> Self;
}

impl CharValue for char {
    fn from_byte(byte: u8) -> char {
        byte as char
    }

    fn random_nonzero(random: &mut Random) -> char {
        loop {
            let code = random.next_below(0x11_0000) as u32;
            if code != 0 {
                if let Some(ch) = char::from_u32(code) {
                    return ch;
                }
            }
        }
    }
}

impl CharValue for u8 {
    fn from_byte(byte: u8) -> u8 {
        byte
    }

    fn random_nonzero(random: &mut Random) -> u8 {
        (random.next_below(u8::MAX as u64) + 1) as u8
    }
}

/// Shrink targets for characters, most aggressive first.
const CANONICAL_CHARS: [u8; 9] = *b"abcABC123";

/// Generator for characters: either a byte in `[1, 128)` or a full-range
/// non-zero draw, chosen uniformly.
#[derive(Debug, Clone, Default)]
pub struct CharacterGenerator<T> {
    _result: PhantomData<fn() -> T>,
}

pub fn character<T: CharValue>() -> CharacterGenerator<T> {
    CharacterGenerator {
        _result: PhantomData,
    }
}

impl<T: CharValue> Generator<T> for CharacterGenerator<T> {
    fn generate(&self, ctx: &mut Context) -> Result<T, GenerationError> {
        if ctx.random_mut().next_below(2) == 0 {
            Ok(T::from_byte(ctx.random_mut().next_below(127) as u8 + 1))
        } else {
            Ok(T::random_nonzero(ctx.random_mut()))
        }
    }

    /// Every canonical character strictly smaller than `value` in the order
    /// `a b c A B C 1 2 3`; all nine for a non-canonical value.
    fn shrink(&self, value: &T) -> Shrinks<T> {
        let position = CANONICAL_CHARS
            .iter()
            .position(|byte| T::from_byte(*byte) == *value)
            .unwrap_or(CANONICAL_CHARS.len());
        shrink::constant(
            CANONICAL_CHARS[..position]
                .iter()
                .map(|byte| T::from_byte(*byte))
                .collect(),
        )
    }
}

/// Containers a generator can fill element by element. `insert` may reject
/// an element (duplicate key in a map or set); the element generators retry
/// on rejection.
pub trait Container: Clone + 'static {
    type Item: Clone + 'static;

    fn with_capacity(capacity: usize) -> Self;
    fn insert(&mut self, item: Self::Item) -> bool;
    fn items(&self) -> Vec<Self::Item>;
    fn from_items(items: Vec<Self::Item>) -> Self;
}

impl<T: Clone + 'static> Container for Vec<T> {
    type Item = T;

    fn with_capacity(capacity: usize) -> Self {
        Vec::with_capacity(capacity)
    }

    fn insert(&mut self, item: T) -> bool {
        self.push(item);
        true
    }

    fn items(&self) -> Vec<T> {
        self.clone()
    }

    fn from_items(items: Vec<T>) -> Self {
        items
    }
}

impl Container for String {
    type Item = char;

    fn with_capacity(capacity: usize) -> Self {
        String::with_capacity(capacity)
    }

    fn insert(&mut self, item: char) -> bool {
        self.push(item);
        true
    }

    fn items(&self) -> Vec<char> {
        self.chars().collect()
    }

    fn from_items(items: Vec<char>) -> Self {
        items.into_iter().collect()
    }
}

impl<T: Clone + std::hash::Hash + Eq + 'static> Container for HashSet<T> {
    type Item = T;

    fn with_capacity(capacity: usize) -> Self {
        HashSet::with_capacity(capacity)
    }

    fn insert(&mut self, item: T) -> bool {
        HashSet::insert(self, item)
    }

    fn items(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    fn from_items(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}

impl<T: Clone + Ord + 'static> Container for BTreeSet<T> {
    type Item = T;

    fn with_capacity(_capacity: usize) -> Self {
        BTreeSet::new()
    }

    fn insert(&mut self, item: T) -> bool {
        BTreeSet::insert(self, item)
    }

    fn items(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    fn from_items(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}

impl<K, V> Container for HashMap<K, V>
where
    K: Clone + std::hash::Hash + Eq + 'static,
    V: Clone + 'static,
{
    type Item = (K, V);

    fn with_capacity(capacity: usize) -> Self {
        HashMap::with_capacity(capacity)
    }

    fn insert(&mut self, (key, value): (K, V)) -> bool {
        if self.contains_key(&key) {
            return false;
        }
        HashMap::insert(self, key, value);
        true
    }

    fn items(&self) -> Vec<(K, V)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    fn from_items(items: Vec<(K, V)>) -> Self {
        items.into_iter().collect()
    }
}

const BUILDER_RETRY_LIMIT: usize = 100;

/// Generator for containers of an exact element count.
#[derive(Debug, Clone)]
pub struct VectorGenerator<C, G> {
    length: usize,
    element: G,
    _container: PhantomData<fn() -> C>,
}

/// Exactly `length` accepted elements drawn from a non-shrinking `element`.
/// A rejected element is re-drawn at an incremented size, giving up after
/// 100 consecutive rejections.
pub fn vector<C, G>(length: usize, element: G) -> VectorGenerator<C, G>
where
    C: Container,
    G: Generator<C::Item>,
{
    VectorGenerator {
        length,
        element,
        _container: PhantomData,
    }
}

impl<C, G> Generator<C> for VectorGenerator<C, G>
where
    C: Container,
    G: Generator<C::Item> + Clone + 'static,
{
    fn generate(&self, ctx: &mut Context) -> Result<C, GenerationError> {
        ctx.with_no_shrink(|ctx| {
            let mut builder = C::with_capacity(self.length);
            for _ in 0..self.length {
                insert_with_retries(&mut builder, &self.element, ctx)?;
            }
            Ok(builder)
        })
    }

    fn shrink(&self, value: &C) -> Shrinks<C> {
        let element = self.element.clone();
        shrink::map(
            shrink::each_element(value.items(), move |item| element.shrink(item)),
            C::from_items,
        )
    }
}

fn insert_with_retries<C, G>(
    builder: &mut C,
    element: &G,
    ctx: &mut Context,
) -> Result<(), GenerationError>
where
    C: Container,
    G: Generator<C::Item>,
{
    let start = ctx.size();
    let mut retries = 0;
    loop {
        let item = ctx.with_size(start + retries, |ctx| element.generate(ctx))?;
        if builder.insert(item) {
            return Ok(());
        }
        retries += 1;
        if retries > BUILDER_RETRY_LIMIT {
            return Err(GenerationError::gave_up(
                "could not generate an element the container accepts",
                retries,
                start + retries,
            ));
        }
    }
}

/// Generator for containers of a size-dependent element count.
#[derive(Debug, Clone)]
pub struct CollectionGenerator<C, G> {
    element: G,
    _container: PhantomData<fn() -> C>,
}

/// A length drawn uniformly from `[0, size]` followed by that many element
/// draws. The length draw and every element draw are separate sub-picks, so
/// the shrink tree records one child per element plus one for the length.
pub fn collection<C, G>(element: G) -> CollectionGenerator<C, G>
where
    C: Container,
    G: Generator<C::Item>,
{
    CollectionGenerator {
        element,
        _container: PhantomData,
    }
}

impl<C, G> Generator<C> for CollectionGenerator<C, G>
where
    C: Container,
    G: Generator<C::Item> + Clone + 'static,
{
    fn generate(&self, ctx: &mut Context) -> Result<C, GenerationError> {
        let length: usize = pick(&ranged(0, ctx.size() + 1), ctx)?;
        let mut builder = C::with_capacity(length);
        for _ in 0..length {
            let base = ctx.size();
            let mut retries = 0;
            loop {
                let item = ctx.with_size(base + retries, |ctx| pick(&self.element, ctx))?;
                if builder.insert(item) {
                    break;
                }
                retries += 1;
                if retries > BUILDER_RETRY_LIMIT {
                    return Err(GenerationError::gave_up(
                        "could not generate an element the container accepts",
                        retries,
                        base + retries,
                    ));
                }
            }
        }
        Ok(builder)
    }

    fn shrink(&self, value: &C) -> Shrinks<C> {
        let items = value.items();
        let element = self.element.clone();
        let candidates = shrink::sequentially(
            shrink::remove_chunks(items.clone()),
            shrink::each_element(items, move |item| element.shrink(item)),
        );
        shrink::map(candidates, C::from_items)
    }
}

/// Generator for fixed-size arrays: the length is the array length, so there
/// is no length pick and shrinking is element-wise only.
#[derive(Debug, Clone)]
pub struct ArrayGenerator<G, const N: usize> {
    element: G,
}

pub fn array_of<const N: usize, G>(element: G) -> ArrayGenerator<G, N> {
    ArrayGenerator { element }
}

impl<T, G, const N: usize> Generator<[T; N]> for ArrayGenerator<G, N>
where
    T: Clone + 'static,
    G: Generator<T> + Clone + 'static,
{
    fn generate(&self, ctx: &mut Context) -> Result<[T; N], GenerationError> {
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(pick(&self.element, ctx)?);
        }
        match <[T; N]>::try_from(items) {
            Ok(array) => Ok(array),
            Err(_) => panic!("array generator produced a wrong element count"),
        }
    }

    fn shrink(&self, value: &[T; N]) -> Shrinks<[T; N]> {
        let element = self.element.clone();
        shrink::map(
            shrink::each_element(value.to_vec(), move |item| element.shrink(item)),
            |items| match <[T; N]>::try_from(items) {
                Ok(array) => array,
                Err(_) => panic!("array shrink changed the element count"),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::constant;

    fn test_context() -> Context {
        Context::new(10, Random::from_seed(0))
    }

    #[test]
    fn test_ranged_stays_in_bounds() {
        let generator = ranged(-3i32, 7);
        let mut ctx = test_context();
        for _ in 0..500 {
            let value = generator.generate(&mut ctx).unwrap();
            assert!((-3..7).contains(&value));
        }
    }

    #[test]
    fn test_ranged_equal_bounds_returns_lo() {
        let mut ctx = test_context();
        assert_eq!(ranged(5, 5).generate(&mut ctx).unwrap(), 5);
    }

    #[test]
    fn test_ranged_invalid_bounds_fail() {
        let mut ctx = test_context();
        let error = ranged(10, 3).generate(&mut ctx).unwrap_err();
        assert_eq!(
            error,
            GenerationError::InvalidRange {
                lo: "10".to_string(),
                hi: "3".to_string(),
            }
        );
    }

    #[test]
    fn test_ranged_reaches_every_value() {
        let generator = ranged(0u8, 4);
        let mut ctx = test_context();
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[generator.generate(&mut ctx).unwrap() as usize] = true;
        }
        assert!(seen.iter().all(|hit| *hit));
    }

    #[test]
    fn test_int_generator_respects_size() {
        let generator = IntGenerator::<i32>::new();
        let mut ctx = Context::new(5, Random::from_seed(9));
        for _ in 0..200 {
            let value = generator.generate(&mut ctx).unwrap();
            assert!((-5..=5).contains(&value));
        }
    }

    #[test]
    fn test_int_shrink_proposes_zero_first() {
        let generator = IntGenerator::<i32>::new();
        let candidates: Vec<i32> = generator.shrink(&8).collect();
        assert_eq!(candidates[0], 0);
        assert!(candidates.iter().all(|c| c.abs() < 8));
        assert_eq!(generator.shrink(&0).count(), 0);
    }

    #[test]
    fn test_int_shrink_negative_tries_negation() {
        let generator = IntGenerator::<i32>::new();
        let candidates: Vec<i32> = generator.shrink(&-8).collect();
        assert_eq!(&candidates[..2], &[0, 8]);
        assert!(candidates[2..].iter().all(|c| (-8..0).contains(c)));
    }

    #[test]
    fn test_int_shrink_handles_extremes() {
        let generator = IntGenerator::<i8>::new();
        let candidates: Vec<i8> = generator.shrink(&i8::MIN).collect();
        assert_eq!(candidates[0], 0);
        assert!(candidates.iter().all(|c| *c > i8::MIN));
    }

    #[test]
    fn test_bool_generator_shrinks_true_to_false() {
        let generator = BoolGenerator;
        assert_eq!(generator.shrink(&true).collect::<Vec<_>>(), vec![false]);
        assert_eq!(generator.shrink(&false).count(), 0);
    }

    #[test]
    fn test_character_generates_non_nul() {
        let generator = character::<char>();
        let mut ctx = test_context();
        for _ in 0..300 {
            assert_ne!(generator.generate(&mut ctx).unwrap(), '\0');
        }
    }

    #[test]
    fn test_character_shrink_order() {
        let generator = character::<char>();
        assert_eq!(generator.shrink(&'a').count(), 0);
        assert_eq!(generator.shrink(&'c').collect::<Vec<_>>(), vec!['a', 'b']);
        assert_eq!(
            generator.shrink(&'1').collect::<Vec<_>>(),
            vec!['a', 'b', 'c', 'A', 'B', 'C']
        );
        assert_eq!(
            generator.shrink(&'z').collect::<Vec<_>>(),
            vec!['a', 'b', 'c', 'A', 'B', 'C', '1', '2', '3']
        );
    }

    #[test]
    fn test_vector_produces_exact_length() {
        let generator = vector::<Vec<i32>, _>(4, IntGenerator::new());
        let mut ctx = test_context();
        for _ in 0..20 {
            assert_eq!(generator.generate(&mut ctx).unwrap().len(), 4);
        }
    }

    #[test]
    fn test_vector_retries_rejected_elements() {
        // A constant element is always a duplicate after the first insert,
        // so a two-element set can never be built.
        let generator = vector::<HashSet<i32>, _>(2, constant(1));
        let mut ctx = test_context();
        let error = generator.generate(&mut ctx).unwrap_err();
        assert!(matches!(error, GenerationError::GaveUp { retries, .. } if retries > 100));
    }

    #[test]
    fn test_vector_fills_sets_with_distinct_elements() {
        let generator = vector::<HashSet<i32>, _>(3, ranged(0, 100));
        let mut ctx = test_context();
        for _ in 0..20 {
            assert_eq!(generator.generate(&mut ctx).unwrap().len(), 3);
        }
    }

    #[test]
    fn test_collection_length_tracks_size() {
        let generator = collection::<Vec<i32>, _>(IntGenerator::new());
        let mut ctx = Context::new(6, Random::from_seed(21));
        let mut saw_empty = false;
        for _ in 0..300 {
            let value = generator.generate(&mut ctx).unwrap();
            assert!(value.len() <= 6);
            saw_empty |= value.is_empty();
        }
        assert!(saw_empty, "the empty collection must be reachable");
    }

    #[test]
    fn test_collection_of_maps_rejects_duplicate_keys() {
        let generator = collection::<HashMap<u8, bool>, _>(crate::combinators::pair_of(
            ranged(0u8, 200),
            BoolGenerator,
        ));
        let mut ctx = test_context();
        for _ in 0..50 {
            let map = generator.generate(&mut ctx).unwrap();
            assert!(map.len() <= 10);
        }
    }

    #[test]
    fn test_array_of_has_fixed_length() {
        let generator = array_of::<3, _>(IntGenerator::<i32>::new());
        let mut ctx = test_context();
        let value = generator.generate(&mut ctx).unwrap();
        assert_eq!(value.len(), 3);
    }

    #[test]
    fn test_collection_shrink_removes_chunks_first() {
        let generator = collection::<Vec<i32>, _>(IntGenerator::new());
        let candidates: Vec<Vec<i32>> = generator.shrink(&vec![1, 2]).take(4).collect();
        assert_eq!(
            candidates,
            vec![vec![], vec![2], vec![1], vec![0, 2]]
        );
    }
}
