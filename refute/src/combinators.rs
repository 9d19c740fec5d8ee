//! Combinators that adapt and compose generators.

use std::marker::PhantomData;

use crate::arbitrary::{arbitrary, Arbitrary};
use crate::context::Context;
use crate::error::GenerationError;
use crate::generator::Generator;
use crate::shrink::{self, Shrinks};
use crate::tree::pick;

const RETRY_LIMIT: usize = 100;

/// A generator filtered by a predicate.
#[derive(Clone)]
pub struct SuchThatGenerator<G, P> {
    inner: G,
    predicate: P,
}

/// Draw from `inner` until `predicate` accepts, retrying with the size
/// incremented after every rejection and giving up after 100 consecutive
/// rejections. The inner draw is non-shrinking, so rejected draws never
/// leave sub-nodes behind.
pub fn such_that<T, G, P>(inner: G, predicate: P) -> SuchThatGenerator<G, P>
where
    T: 'static,
    G: Generator<T>,
    P: Fn(&T) -> bool,
{
    SuchThatGenerator { inner, predicate }
}

impl<T, G, P> Generator<T> for SuchThatGenerator<G, P>
where
    T: 'static,
    G: Generator<T>,
    P: Fn(&T) -> bool,
{
    fn generate(&self, ctx: &mut Context) -> Result<T, GenerationError> {
        let start = ctx.size();
        let mut attempts = 0;
        loop {
            let value = ctx.with_no_shrink(|ctx| {
                ctx.with_size(start + attempts, |ctx| self.inner.generate(ctx))
            })?;
            if (self.predicate)(&value) {
                return Ok(value);
            }
            attempts += 1;
            if attempts > RETRY_LIMIT {
                return Err(GenerationError::gave_up(
                    "no generated value satisfied the predicate",
                    attempts,
                    start + attempts,
                ));
            }
        }
    }
}

/// Marker for signed primitive integers; `negative` is only defined for
/// these.
pub trait Signed {}

macro_rules! impl_signed {
    ($($t:ty),*) => { $(impl Signed for $t {})* };
}

impl_signed!(i8, i16, i32, i64, i128, isize);

fn is_non_zero<T: Default + PartialEq>(value: &T) -> bool {
    *value != T::default()
}

fn is_positive<T: Default + PartialOrd>(value: &T) -> bool {
    *value > T::default()
}

fn is_negative<T: Default + PartialOrd>(value: &T) -> bool {
    *value < T::default()
}

fn is_non_negative<T: Default + PartialOrd>(value: &T) -> bool {
    *value >= T::default()
}

/// The default generator for `T`, restricted to non-zero values.
pub fn non_zero<T>() -> SuchThatGenerator<T::Gen, fn(&T) -> bool>
where
    T: Arbitrary + Default + PartialEq,
{
    such_that(arbitrary::<T>(), is_non_zero::<T> as fn(&T) -> bool)
}

/// The default generator for `T`, restricted to values greater than zero.
pub fn positive<T>() -> SuchThatGenerator<T::Gen, fn(&T) -> bool>
where
    T: Arbitrary + Default + PartialOrd,
{
    such_that(arbitrary::<T>(), is_positive::<T> as fn(&T) -> bool)
}

/// The default generator for `T`, restricted to values less than zero.
pub fn negative<T>() -> SuchThatGenerator<T::Gen, fn(&T) -> bool>
where
    T: Arbitrary + Default + PartialOrd + Signed,
{
    such_that(arbitrary::<T>(), is_negative::<T> as fn(&T) -> bool)
}

/// The default generator for `T`, restricted to values of at least zero.
pub fn non_negative<T>() -> SuchThatGenerator<T::Gen, fn(&T) -> bool>
where
    T: Arbitrary + Default + PartialOrd,
{
    such_that(arbitrary::<T>(), is_non_negative::<T> as fn(&T) -> bool)
}

/// A generator mapped through a function.
#[derive(Clone)]
pub struct MappedGenerator<T, G, F> {
    inner: G,
    mapper: F,
    _pre_image: PhantomData<fn() -> T>,
}

/// Draw from `inner` and apply `mapper`. The pre-image is recorded as a
/// sub-pick, so the mapped value shrinks through the tree even though the
/// mapped generator itself proposes no candidates (the mapping is not
/// assumed invertible; see [`map_invertible`]).
pub fn map<T, U, G, F>(inner: G, mapper: F) -> MappedGenerator<T, G, F>
where
    T: Clone + 'static,
    G: Generator<T> + Clone + 'static,
    F: Fn(T) -> U,
{
    MappedGenerator {
        inner,
        mapper,
        _pre_image: PhantomData,
    }
}

impl<T, U, G, F> Generator<U> for MappedGenerator<T, G, F>
where
    T: Clone + 'static,
    U: 'static,
    G: Generator<T> + Clone + 'static,
    F: Fn(T) -> U,
{
    fn generate(&self, ctx: &mut Context) -> Result<U, GenerationError> {
        let pre_image = pick(&self.inner, ctx)?;
        Ok((self.mapper)(pre_image))
    }
}

/// A mapped generator with an explicit inverse, shrinkable by value.
#[derive(Clone)]
pub struct InvertibleGenerator<T, G, F, I> {
    inner: G,
    mapper: F,
    inverse: I,
    _pre_image: PhantomData<fn() -> T>,
}

/// Like [`map`], but with an inverse so a value can be shrunk directly:
/// candidates are the inner generator's shrinks of the inverted value,
/// mapped forward again.
pub fn map_invertible<T, U, G, F, I>(
    inner: G,
    mapper: F,
    inverse: I,
) -> InvertibleGenerator<T, G, F, I>
where
    T: Clone + 'static,
    U: 'static,
    G: Generator<T> + Clone + 'static,
    F: Fn(T) -> U + Clone + 'static,
    I: Fn(&U) -> T,
{
    InvertibleGenerator {
        inner,
        mapper,
        inverse,
        _pre_image: PhantomData,
    }
}

impl<T, U, G, F, I> Generator<U> for InvertibleGenerator<T, G, F, I>
where
    T: Clone + 'static,
    U: 'static,
    G: Generator<T> + Clone + 'static,
    F: Fn(T) -> U + Clone + 'static,
    I: Fn(&U) -> T,
{
    fn generate(&self, ctx: &mut Context) -> Result<U, GenerationError> {
        let pre_image = pick(&self.inner, ctx)?;
        Ok((self.mapper)(pre_image))
    }

    fn shrink(&self, value: &U) -> Shrinks<U> {
        let pre_image = (self.inverse)(value);
        let mapper = self.mapper.clone();
        shrink::map(self.inner.shrink(&pre_image), move |candidate| {
            mapper(candidate)
        })
    }
}

/// A generator run at a fixed size.
#[derive(Debug, Clone)]
pub struct ResizeGenerator<G> {
    size: usize,
    inner: G,
}

/// Override the size hint to `size` for the inner draw; shrinking is
/// delegated unchanged.
pub fn resize<G>(size: usize, inner: G) -> ResizeGenerator<G> {
    ResizeGenerator { size, inner }
}

impl<T: 'static, G: Generator<T>> Generator<T> for ResizeGenerator<G> {
    fn generate(&self, ctx: &mut Context) -> Result<T, GenerationError> {
        ctx.with_size(self.size, |ctx| self.inner.generate(ctx))
    }

    fn shrink(&self, value: &T) -> Shrinks<T> {
        self.inner.shrink(value)
    }
}

/// A generator run at a scaled size.
#[derive(Debug, Clone)]
pub struct ScaleGenerator<G> {
    factor: f64,
    inner: G,
}

/// Multiply the size hint by `factor` (rounded) for the inner draw;
/// shrinking is delegated unchanged.
pub fn scale<G>(factor: f64, inner: G) -> ScaleGenerator<G> {
    ScaleGenerator { factor, inner }
}

impl<T: 'static, G: Generator<T>> Generator<T> for ScaleGenerator<G> {
    fn generate(&self, ctx: &mut Context) -> Result<T, GenerationError> {
        let scaled = (ctx.size() as f64 * self.factor).round() as usize;
        ctx.with_size(scaled, |ctx| self.inner.generate(ctx))
    }

    fn shrink(&self, value: &T) -> Shrinks<T> {
        self.inner.shrink(value)
    }
}

/// A generator whose draws are opaque to shrinking.
#[derive(Debug, Clone)]
pub struct NoShrinkGenerator<G> {
    inner: G,
}

/// Suppress sub-node registration for the inner draw, so the drawn value
/// becomes a leaf of the shrink tree, and propose no candidates.
pub fn no_shrink<G>(inner: G) -> NoShrinkGenerator<G> {
    NoShrinkGenerator { inner }
}

impl<T: 'static, G: Generator<T>> Generator<T> for NoShrinkGenerator<G> {
    fn generate(&self, ctx: &mut Context) -> Result<T, GenerationError> {
        ctx.with_no_shrink(|ctx| self.inner.generate(ctx))
    }
}

/// A generator with a local error handler.
#[derive(Clone)]
pub struct RescueGenerator<G, H> {
    inner: G,
    handler: H,
}

/// Run `inner`; on error, let `handler` inspect it and either supply a
/// replacement value or pass the error through by returning `None`.
pub fn rescue<T, G, H>(inner: G, handler: H) -> RescueGenerator<G, H>
where
    T: 'static,
    G: Generator<T>,
    H: Fn(&GenerationError) -> Option<T>,
{
    RescueGenerator { inner, handler }
}

impl<T, G, H> Generator<T> for RescueGenerator<G, H>
where
    T: 'static,
    G: Generator<T>,
    H: Fn(&GenerationError) -> Option<T>,
{
    fn generate(&self, ctx: &mut Context) -> Result<T, GenerationError> {
        match self.inner.generate(ctx) {
            Ok(value) => Ok(value),
            Err(error) => match (self.handler)(&error) {
                Some(replacement) => Ok(replacement),
                None => Err(error),
            },
        }
    }
}

/// A generator defined by a closure over the context.
#[derive(Clone)]
pub struct LambdaGenerator<F> {
    body: F,
}

pub fn lambda<T, F>(body: F) -> LambdaGenerator<F>
where
    T: 'static,
    F: Fn(&mut Context) -> Result<T, GenerationError>,
{
    LambdaGenerator { body }
}

impl<T, F> Generator<T> for LambdaGenerator<F>
where
    T: 'static,
    F: Fn(&mut Context) -> Result<T, GenerationError>,
{
    fn generate(&self, ctx: &mut Context) -> Result<T, GenerationError> {
        (self.body)(ctx)
    }
}

/// A generator of tuples built from a tuple of generators.
#[derive(Debug, Clone)]
pub struct TupleGenerator<Gens> {
    generators: Gens,
}

/// Each component is drawn from its own generator, in order, as a separate
/// sub-pick. Shrinking shrinks component `i` with the others held fixed and
/// exhausts `i` before moving to `i + 1`.
pub fn tuple_of<Gens>(generators: Gens) -> TupleGenerator<Gens> {
    TupleGenerator { generators }
}

/// The two-component special case of [`tuple_of`].
pub fn pair_of<GA, GB>(first: GA, second: GB) -> TupleGenerator<(GA, GB)> {
    TupleGenerator {
        generators: (first, second),
    }
}

macro_rules! impl_tuple_generator {
    ($(($G:ident, $T:ident, $idx:tt)),+) => {
        impl<$($T,)+ $($G,)+> Generator<($($T,)+)> for TupleGenerator<($($G,)+)>
        where
            $($T: Clone + 'static,)+
            $($G: Generator<$T> + Clone + 'static,)+
        {
            fn generate(&self, ctx: &mut Context) -> Result<($($T,)+), GenerationError> {
                Ok(($(pick(&self.generators.$idx, ctx)?,)+))
            }

            fn shrink(&self, value: &($($T,)+)) -> Shrinks<($($T,)+)> {
                let mut candidates: Shrinks<($($T,)+)> = shrink::nothing();
                $(
                    {
                        let fixed = value.clone();
                        let replaced = shrink::map(
                            self.generators.$idx.shrink(&value.$idx),
                            move |candidate| {
                                let mut tuple = fixed.clone();
                                tuple.$idx = candidate;
                                tuple
                            },
                        );
                        candidates = shrink::sequentially(candidates, replaced);
                    }
                )+
                candidates
            }
        }
    };
}

impl_tuple_generator!((G0, T0, 0), (G1, T1, 1));
impl_tuple_generator!((G0, T0, 0), (G1, T1, 1), (G2, T2, 2));
impl_tuple_generator!((G0, T0, 0), (G1, T1, 1), (G2, T2, 2), (G3, T3, 3));
