//! The rose tree engine: records the structure of each composite draw and
//! drives the shrink search over it.
//!
//! Every tree-building draw funnels through [`pick`]. A node remembers the
//! erased generator that produced it, an independent random sub-stream, the
//! cached value, and one child per nested pick made while generating that
//! value. Shrinking patches a node with a candidate value, resets its
//! subtree, invalidates every ancestor's cache and re-materializes the root.

use std::any::Any;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::context::Context;
use crate::error::GenerationError;
use crate::generator::Generator;
use crate::rng::Random;

pub(crate) type NodeId = usize;

/// Clonable type-erased value stored at a node.
trait AnyValue: Any {
    fn clone_value(&self) -> Box<dyn AnyValue>;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any + Clone> AnyValue for T {
    fn clone_value(&self) -> Box<dyn AnyValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Type-erased view of the generator bound to a node.
trait NodeGenerator {
    fn generate_value(&self, ctx: &mut Context) -> Result<Box<dyn AnyValue>, GenerationError>;
    fn shrink_value(&self, value: &dyn AnyValue) -> Box<dyn Iterator<Item = Box<dyn AnyValue>>>;
}

struct ErasedGenerator<T, G> {
    generator: G,
    _result: PhantomData<fn() -> T>,
}

impl<T, G> NodeGenerator for ErasedGenerator<T, G>
where
    T: Clone + 'static,
    G: Generator<T>,
{
    fn generate_value(&self, ctx: &mut Context) -> Result<Box<dyn AnyValue>, GenerationError> {
        self.generator
            .generate(ctx)
            .map(|value| Box::new(value) as Box<dyn AnyValue>)
    }

    fn shrink_value(&self, value: &dyn AnyValue) -> Box<dyn Iterator<Item = Box<dyn AnyValue>>> {
        let value = value
            .as_any()
            .downcast_ref::<T>()
            .expect("shrink tree node holds a value of its generator's result type");
        Box::new(
            self.generator
                .shrink(value)
                .map(|candidate| Box::new(candidate) as Box<dyn AnyValue>),
        )
    }
}

fn downcast_value<T: 'static>(value: Box<dyn AnyValue>) -> T {
    match value.into_any().downcast::<T>() {
        Ok(boxed) => *boxed,
        Err(_) => panic!("shrink tree node holds a value of unexpected type"),
    }
}

struct RoseNode {
    generator: Rc<dyn NodeGenerator>,
    random: Random,
    parent: Option<NodeId>,
    value: Option<Box<dyn AnyValue>>,
    children: Vec<NodeId>,
    /// Picks made during the current materialization of this node.
    picks: usize,
}

/// One top-level draw recorded as a tree of sub-draws.
///
/// Nodes live in an arena; replaced subtrees are simply unlinked and stay
/// allocated until the tree is dropped at the end of the shrink search.
pub(crate) struct RoseTree {
    nodes: Vec<RoseNode>,
    root: NodeId,
    size: usize,
}

impl RoseTree {
    fn placeholder() -> Self {
        RoseTree {
            nodes: Vec::new(),
            root: 0,
            size: 0,
        }
    }

    #[cfg(test)]
    fn root_children(&self) -> usize {
        self.nodes[self.root].children.len()
    }
}

/// Materialize a fresh tree for one top-level draw of `generator`.
pub(crate) fn grow<T, G>(
    generator: G,
    size: usize,
    random: Random,
) -> Result<(RoseTree, T), GenerationError>
where
    T: Clone + 'static,
    G: Generator<T> + 'static,
{
    let root = RoseNode {
        generator: Rc::new(ErasedGenerator {
            generator,
            _result: PhantomData,
        }),
        random,
        parent: None,
        value: None,
        children: Vec::new(),
        picks: 0,
    };
    let mut ctx = Context::new(size, random);
    ctx.tree = Some(RoseTree {
        nodes: vec![root],
        root: 0,
        size,
    });
    let value = materialize(&mut ctx, 0)?;
    let tree = ctx.tree.take().expect("context still owns the tree");
    Ok((tree, downcast_value::<T>(value)))
}

/// Draw from `generator`, recording the draw as a child of the current
/// shrink-tree node when one is being built. Outside a tree, or under
/// `no_shrink`, this is a plain `generate` call.
pub fn pick<T, G>(generator: &G, ctx: &mut Context) -> Result<T, GenerationError>
where
    T: Clone + 'static,
    G: Generator<T> + Clone + 'static,
{
    if ctx.no_shrink() || ctx.tree.is_none() || ctx.current.is_none() {
        return generator.generate(ctx);
    }
    let parent = ctx.current.expect("checked above");
    let child = {
        let tree = ctx.tree.as_mut().expect("checked above");
        let index = tree.nodes[parent].picks;
        tree.nodes[parent].picks += 1;
        if let Some(&existing) = tree.nodes[parent].children.get(index) {
            existing
        } else {
            let sub_random = tree.nodes[parent].random.split(index as u64);
            let id = tree.nodes.len();
            tree.nodes.push(RoseNode {
                generator: Rc::new(ErasedGenerator {
                    generator: generator.clone(),
                    _result: PhantomData,
                }),
                random: sub_random,
                parent: Some(parent),
                value: None,
                children: Vec::new(),
                picks: 0,
            });
            tree.nodes[parent].children.push(id);
            id
        }
    };
    let value = materialize(ctx, child)?;
    Ok(downcast_value::<T>(value))
}

/// Return the node's value, running its generator if no value is cached.
/// While the generator runs, the node is the current node and the context
/// draws from the node's own sub-stream, so nested picks become children and
/// a repeat materialization replays identically.
fn materialize(ctx: &mut Context, node: NodeId) -> Result<Box<dyn AnyValue>, GenerationError> {
    {
        let tree = ctx.tree.as_ref().expect("materialize requires a tree");
        if let Some(value) = &tree.nodes[node].value {
            return Ok(AnyValue::clone_value(&**value));
        }
    }
    let (generator, node_random) = {
        let tree = ctx.tree.as_mut().expect("materialize requires a tree");
        let entry = &mut tree.nodes[node];
        entry.picks = 0;
        (Rc::clone(&entry.generator), entry.random)
    };
    let previous_current = ctx.current.replace(node);
    let previous_random = std::mem::replace(&mut ctx.random, node_random);
    let result = generator.generate_value(ctx);
    ctx.current = previous_current;
    ctx.random = previous_random;
    let value = result?;
    let tree = ctx.tree.as_mut().expect("materialize requires a tree");
    let entry = &mut tree.nodes[node];
    let picks_made = entry.picks;
    entry.children.truncate(picks_made);
    entry.value = Some(value.clone_value());
    Ok(value)
}

fn rematerialize_root(tree: RoseTree) -> (RoseTree, Result<Box<dyn AnyValue>, GenerationError>) {
    let root = tree.root;
    let base = tree.nodes[root].random;
    let size = tree.size;
    let mut ctx = Context::new(size, base);
    ctx.tree = Some(tree);
    let result = materialize(&mut ctx, root);
    (ctx.tree.take().expect("context still owns the tree"), result)
}

/// Nodes in pre-order: a node's whole-value shrinks are tried before the
/// shrinks of its components.
fn preorder(tree: &RoseTree) -> Vec<NodeId> {
    let mut order = Vec::with_capacity(tree.nodes.len());
    let mut stack = vec![tree.root];
    while let Some(id) = stack.pop() {
        order.push(id);
        for &child in tree.nodes[id].children.iter().rev() {
            stack.push(child);
        }
    }
    order
}

/// Greedy, first-failure-wins shrink search.
///
/// Walks the tree in pre-order; at each node, tries the candidates proposed
/// by the node's generator for its current value. A candidate that keeps the
/// property failing is committed and the scan restarts from the root; a full
/// pass with no commit means the tree is minimal. `max_steps` bounds the
/// number of committed shrinks.
pub(crate) fn shrink_tree<T>(
    tree: RoseTree,
    still_fails: &dyn Fn(&T) -> bool,
    max_steps: usize,
) -> (T, usize)
where
    T: Clone + 'static,
{
    let mut tree = tree;
    let mut steps = 0;
    'search: while steps < max_steps {
        // A rolled-back patch leaves ancestor caches invalidated; refill
        // them so every node's current value is available to shrink from.
        if tree.nodes[tree.root].value.is_none() {
            let owned = std::mem::replace(&mut tree, RoseTree::placeholder());
            let (owned, result) = rematerialize_root(owned);
            tree = owned;
            result.expect("re-materializing an unchanged tree is deterministic");
        }
        for node in preorder(&tree) {
            let current = match &tree.nodes[node].value {
                Some(value) => AnyValue::clone_value(&**value),
                None => continue,
            };
            let generator = Rc::clone(&tree.nodes[node].generator);
            for candidate in generator.shrink_value(current.as_ref()) {
                match try_candidate::<T>(&mut tree, node, candidate, still_fails) {
                    Ok(true) => {
                        steps += 1;
                        log::trace!("shrink step {steps}: committed a candidate at node {node}");
                        continue 'search;
                    }
                    Ok(false) => {}
                    // The patched tree could not produce a value; the
                    // candidate is discarded and the patch rolled back.
                    Err(error) => log::trace!("shrink candidate discarded: {error}"),
                }
            }
        }
        break;
    }
    let (tree, result) = rematerialize_root(tree);
    let value = result.expect("re-materializing an unchanged tree is deterministic");
    drop(tree);
    (
        value
            .as_any()
            .downcast_ref::<T>()
            .expect("root value has the searched type")
            .clone(),
        steps,
    )
}

/// Pin `node` to `candidate`, reset its subtree, invalidate ancestor caches
/// and re-materialize the root. Returns whether the candidate was committed;
/// on `false` or error the patch is rolled back.
fn try_candidate<T>(
    tree: &mut RoseTree,
    node: NodeId,
    candidate: Box<dyn AnyValue>,
    still_fails: &dyn Fn(&T) -> bool,
) -> Result<bool, GenerationError>
where
    T: Clone + 'static,
{
    let saved_value = tree.nodes[node].value.replace(candidate);
    let saved_children = std::mem::take(&mut tree.nodes[node].children);
    let saved_picks = tree.nodes[node].picks;
    invalidate_ancestors(tree, node);

    let owned = std::mem::replace(tree, RoseTree::placeholder());
    let (owned, result) = rematerialize_root(owned);
    *tree = owned;

    match result {
        Ok(root_value) => {
            let value = root_value
                .as_any()
                .downcast_ref::<T>()
                .expect("root value has the searched type");
            if still_fails(value) {
                Ok(true)
            } else {
                rollback(tree, node, saved_value, saved_children, saved_picks);
                Ok(false)
            }
        }
        Err(error) => {
            rollback(tree, node, saved_value, saved_children, saved_picks);
            Err(error)
        }
    }
}

fn invalidate_ancestors(tree: &mut RoseTree, node: NodeId) {
    let mut cursor = tree.nodes[node].parent;
    while let Some(ancestor) = cursor {
        tree.nodes[ancestor].value = None;
        cursor = tree.nodes[ancestor].parent;
    }
}

/// Undo a rejected patch. Ancestor caches are invalidated again because the
/// rejected re-materialization filled them with candidate-derived values;
/// they recompute to their previous values on the next materialization since
/// every child cache below them is intact.
fn rollback(
    tree: &mut RoseTree,
    node: NodeId,
    saved_value: Option<Box<dyn AnyValue>>,
    saved_children: Vec<NodeId>,
    saved_picks: usize,
) {
    let entry = &mut tree.nodes[node];
    entry.value = saved_value;
    entry.children = saved_children;
    entry.picks = saved_picks;
    invalidate_ancestors(tree, node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shrink::{self, Shrinks};

    /// Draws a small integer directly from the stream; shrinks toward zero.
    #[derive(Debug, Clone)]
    struct SmallInt;

    impl Generator<i32> for SmallInt {
        fn generate(&self, ctx: &mut Context) -> Result<i32, GenerationError> {
            Ok(ctx.random_mut().next_below(16) as i32)
        }

        fn shrink(&self, value: &i32) -> Shrinks<i32> {
            if *value == 0 {
                shrink::nothing()
            } else {
                shrink::constant(vec![0, value / 2])
            }
        }
    }

    /// Sums two sub-picks, so its node has exactly two children.
    #[derive(Debug, Clone)]
    struct SumOfTwo;

    impl Generator<i32> for SumOfTwo {
        fn generate(&self, ctx: &mut Context) -> Result<i32, GenerationError> {
            let left: i32 = pick(&SmallInt, ctx)?;
            let right: i32 = pick(&SmallInt, ctx)?;
            Ok(left + right)
        }
    }

    /// Same draw, but opaque to the tree.
    #[derive(Debug, Clone)]
    struct OpaqueSumOfTwo;

    impl Generator<i32> for OpaqueSumOfTwo {
        fn generate(&self, ctx: &mut Context) -> Result<i32, GenerationError> {
            ctx.with_no_shrink(|ctx| SumOfTwo.generate(ctx))
        }
    }

    #[test]
    fn test_grow_is_deterministic() {
        let (_, first) = grow::<i32, _>(SumOfTwo, 10, Random::from_seed(3)).unwrap();
        let (_, second) = grow::<i32, _>(SumOfTwo, 10, Random::from_seed(3)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_children_match_picks() {
        let (tree, _) = grow::<i32, _>(SumOfTwo, 10, Random::from_seed(3)).unwrap();
        assert_eq!(tree.root_children(), 2);
    }

    #[test]
    fn test_no_shrink_collapses_to_leaf() {
        let (tree, _) = grow::<i32, _>(OpaqueSumOfTwo, 10, Random::from_seed(3)).unwrap();
        assert_eq!(tree.root_children(), 0);
    }

    #[test]
    fn test_pick_outside_tree_generates_directly() {
        let mut ctx = Context::new(10, Random::from_seed(3));
        let value: i32 = pick(&SumOfTwo, &mut ctx).unwrap();
        assert!((0..32).contains(&value));
    }

    #[test]
    fn test_shrink_drives_components_to_zero() {
        let (tree, initial) = grow::<i32, _>(SumOfTwo, 10, Random::from_seed(17)).unwrap();
        let (minimal, steps) = shrink_tree::<i32>(tree, &|_| true, 1000);
        assert_eq!(minimal, 0);
        if initial != 0 {
            assert!(steps > 0);
        }
    }

    #[test]
    fn test_shrink_rolls_back_rejected_candidates() {
        let (tree, initial) = grow::<i32, _>(SumOfTwo, 10, Random::from_seed(17)).unwrap();
        // Only the original value fails, so nothing can be committed.
        let (minimal, steps) = shrink_tree::<i32>(tree, &move |v| *v == initial, 1000);
        assert_eq!(minimal, initial);
        assert_eq!(steps, 0);
    }

    #[test]
    fn test_shrink_respects_step_limit() {
        let (tree, _) = grow::<i32, _>(SumOfTwo, 10, Random::from_seed(17)).unwrap();
        let (_, steps) = shrink_tree::<i32>(tree, &|_| true, 1);
        assert!(steps <= 1);
    }
}
