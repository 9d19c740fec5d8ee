//! The core generator trait and type-erased generator infrastructure.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;

use crate::combinators::resize;
use crate::context::{Context, NOMINAL_SIZE};
use crate::error::GenerationError;
use crate::primitives::ranged;
use crate::shrink::{self, Shrinks};
use crate::tree::pick;

/// A producer of values of type `T`.
///
/// `generate` draws one value in the given context; `shrink` proposes
/// smaller variants of a value this generator produced, most aggressive
/// first. Shrink candidates must be values a repeat generation with an
/// altered context could also have produced, so replaying a shrunk failure
/// stays meaningful.
pub trait Generator<T: 'static> {
    /// Draw one value in the current context.
    fn generate(&self, ctx: &mut Context) -> Result<T, GenerationError>;

    /// Propose smaller variants of `value`. The default proposes none.
    fn shrink(&self, _value: &T) -> Shrinks<T> {
        shrink::nothing()
    }
}

/// Internal object-safe view of a generator.
trait GeneratorObject<T: 'static> {
    fn generate_object(&self, ctx: &mut Context) -> Result<T, GenerationError>;
    fn shrink_object(&self, value: &T) -> Shrinks<T>;
}

struct ObjectWrapper<G> {
    inner: G,
}

impl<T: 'static, G: Generator<T>> GeneratorObject<T> for ObjectWrapper<G> {
    fn generate_object(&self, ctx: &mut Context) -> Result<T, GenerationError> {
        self.inner.generate(ctx)
    }

    fn shrink_object(&self, value: &T) -> Shrinks<T> {
        self.inner.shrink(value)
    }
}

/// A cheaply clonable, type-erased generator handle.
///
/// This is the currency for heterogeneous generator collections such as
/// `one_of` branches: generators of different concrete types erase to the
/// same `SharedGenerator<T>` as long as they produce the same result type.
pub struct SharedGenerator<T> {
    object: Rc<dyn GeneratorObject<T>>,
}

impl<T: 'static> SharedGenerator<T> {
    /// Erase a concrete generator.
    pub fn new<G: Generator<T> + 'static>(generator: G) -> Self {
        SharedGenerator {
            object: Rc::new(ObjectWrapper { inner: generator }),
        }
    }
}

impl<T> Clone for SharedGenerator<T> {
    fn clone(&self) -> Self {
        SharedGenerator {
            object: Rc::clone(&self.object),
        }
    }
}

impl<T: 'static> Generator<T> for SharedGenerator<T> {
    fn generate(&self, ctx: &mut Context) -> Result<T, GenerationError> {
        self.object.generate_object(ctx)
    }

    fn shrink(&self, value: &T) -> Shrinks<T> {
        self.object.shrink_object(value)
    }
}

/// A generator that always produces the same value.
#[derive(Debug, Clone)]
pub struct ConstantGenerator<T> {
    value: T,
}

/// The generator that always returns `value` and never shrinks it.
pub fn constant<T: Clone>(value: T) -> ConstantGenerator<T> {
    ConstantGenerator { value }
}

impl<T: Clone + 'static> Generator<T> for ConstantGenerator<T> {
    fn generate(&self, _ctx: &mut Context) -> Result<T, GenerationError> {
        Ok(self.value.clone())
    }
}

/// A generator that picks one of several branches uniformly.
pub struct OneOfGenerator<T> {
    branches: Vec<SharedGenerator<T>>,
}

impl<T> Clone for OneOfGenerator<T> {
    fn clone(&self) -> Self {
        OneOfGenerator {
            branches: self.branches.clone(),
        }
    }
}

/// Pick a branch index uniformly at nominal size, then delegate to that
/// branch. The index draw and the chosen branch's draw are separate
/// sub-picks, so shrinking of the produced value flows through the branch's
/// own node in the shrink tree.
pub fn one_of<T>(branches: Vec<SharedGenerator<T>>) -> OneOfGenerator<T> {
    if branches.is_empty() {
        panic!("one_of cannot be created with an empty branch list");
    }
    OneOfGenerator { branches }
}

impl<T: Clone + 'static> Generator<T> for OneOfGenerator<T> {
    fn generate(&self, ctx: &mut Context) -> Result<T, GenerationError> {
        let count = self.branches.len();
        let index = pick(&resize(NOMINAL_SIZE, ranged(0usize, count)), ctx)?;
        let branch = self.branches[index].clone();
        pick(&branch, ctx)
    }
}

/// Type-safe registry for default generators, keyed by result type.
///
/// This is the runtime half of the `arbitrary` extension point: code that
/// cannot implement `Arbitrary` for a type (say, a foreign one) can register
/// a default generator here and look it up by type.
pub struct GeneratorRegistry {
    generators: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl GeneratorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            generators: HashMap::new(),
        }
    }

    /// Register a default generator for `T`, replacing any previous one.
    pub fn register<T, G>(&mut self, generator: G)
    where
        T: 'static,
        G: Generator<T> + Send + Sync + 'static,
    {
        self.generators
            .insert(TypeId::of::<T>(), Box::new(BoxedGenerator::new(generator)));
    }

    /// Look up the default generator for `T`.
    pub fn get<T: 'static>(&self) -> Option<&BoxedGenerator<T>> {
        self.generators
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<BoxedGenerator<T>>())
    }

    /// Whether a generator is registered for `T`.
    pub fn contains<T: 'static>(&self) -> bool {
        self.generators.contains_key(&TypeId::of::<T>())
    }

    /// Remove the generator for `T`, returning whether one was present.
    pub fn remove<T: 'static>(&mut self) -> bool {
        self.generators.remove(&TypeId::of::<T>()).is_some()
    }

    /// The number of registered generators.
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A thread-safe type-erased generator, as stored by the registry.
pub struct BoxedGenerator<T> {
    generator: Box<dyn GeneratorObject<T> + Send + Sync>,
}

impl<T: 'static> BoxedGenerator<T> {
    /// Erase a concrete generator.
    pub fn new<G: Generator<T> + Send + Sync + 'static>(generator: G) -> Self {
        Self {
            generator: Box::new(ObjectWrapper { inner: generator }),
        }
    }
}

impl<T: 'static> Generator<T> for BoxedGenerator<T> {
    fn generate(&self, ctx: &mut Context) -> Result<T, GenerationError> {
        self.generator.generate_object(ctx)
    }

    fn shrink(&self, value: &T) -> Shrinks<T> {
        self.generator.shrink_object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Random;

    fn test_context() -> Context {
        Context::new(10, Random::from_seed(0))
    }

    #[test]
    fn test_constant_generator() {
        let generator = constant(42);
        let mut ctx = test_context();

        for _ in 0..10 {
            assert_eq!(generator.generate(&mut ctx).unwrap(), 42);
        }
        assert_eq!(generator.shrink(&42).count(), 0);
    }

    #[test]
    fn test_one_of_draws_from_branches() {
        let generator = one_of(vec![
            SharedGenerator::new(constant(1)),
            SharedGenerator::new(constant(2)),
            SharedGenerator::new(constant(3)),
        ]);
        let mut ctx = test_context();

        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            seen.insert(generator.generate(&mut ctx).unwrap());
        }
        assert!(seen.is_subset(&[1, 2, 3].into_iter().collect()));
        assert!(seen.len() > 1, "expected more than one branch to be hit");
    }

    #[test]
    #[should_panic(expected = "empty branch list")]
    fn test_one_of_rejects_empty_branch_list() {
        one_of::<i32>(vec![]);
    }

    #[test]
    fn test_shared_generator_delegates() {
        let shared = SharedGenerator::new(constant("test"));
        let mut ctx = test_context();

        assert_eq!(shared.generate(&mut ctx).unwrap(), "test");
        assert_eq!(shared.clone().shrink(&"test").count(), 0);
    }

    #[test]
    fn test_generator_registry_basic_operations() {
        let mut registry = GeneratorRegistry::new();

        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(!registry.contains::<i32>());

        registry.register::<i32, _>(constant(42));

        assert!(!registry.is_empty());
        assert_eq!(registry.len(), 1);
        assert!(registry.contains::<i32>());
        assert!(!registry.contains::<String>());

        assert!(registry.remove::<i32>());
        assert!(!registry.remove::<i32>());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_generator_registry_lookup_and_generate() {
        let mut registry = GeneratorRegistry::new();
        registry.register::<i32, _>(constant(42));
        registry.register::<String, _>(constant("hello".to_string()));

        let mut ctx = test_context();
        let int_gen = registry.get::<i32>().expect("i32 generator registered");
        assert_eq!(int_gen.generate(&mut ctx).unwrap(), 42);

        let string_gen = registry.get::<String>().expect("String generator registered");
        assert_eq!(string_gen.generate(&mut ctx).unwrap(), "hello");

        assert!(registry.get::<f64>().is_none());
    }
}
