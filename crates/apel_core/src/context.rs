//! Per-step context objects handed to interceptors
//!
//! A [`DrawContext`] is built for every draw call of a particle object and an
//! [`AnimationContext`] for every rendering step of a path animator. Both carry
//! the step counters, a should-render flag and a typed metadata bag. Contexts
//! are created fresh for each step and dropped once the step is done, so
//! nothing written into one is ever visible to a later step.

use crate::math::Vec3;
use crate::renderer::WorldId;
use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;

// ============================================================================
// Typed metadata keys
// ============================================================================

/// Strongly typed metadata key
///
/// Two keys address the same slot only when both their name and their value
/// type match, so `MetadataKey::<f32>::new("size")` and
/// `MetadataKey::<u32>::new("size")` never collide.
///
/// ```ignore
/// const DRAW_POSITION: MetadataKey<Vec3> = MetadataKey::new("draw_position");
/// ctx.put_metadata(&DRAW_POSITION, Vec3::ZERO);
/// ```
pub struct MetadataKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> MetadataKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: 'static> MetadataKey<T> {
    fn slot(&self) -> SlotKey {
        SlotKey {
            name: self.name,
            type_id: TypeId::of::<T>(),
        }
    }
}

impl<T> Clone for MetadataKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for MetadataKey<T> {}

impl<T> fmt::Debug for MetadataKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetadataKey<{}>({})", std::any::type_name::<T>(), self.name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct SlotKey {
    name: &'static str,
    type_id: TypeId,
}

/// Typed heterogeneous map keyed by [`MetadataKey`]
#[derive(Default)]
pub struct Metadata {
    entries: FxHashMap<SlotKey, Box<dyn Any + Send>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Any + Send>(&self, key: &MetadataKey<T>) -> Option<&T> {
        self.entries
            .get(&key.slot())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any + Send>(&mut self, key: &MetadataKey<T>) -> Option<&mut T> {
        self.entries
            .get_mut(&key.slot())
            .and_then(|value| value.downcast_mut::<T>())
    }

    /// Store a value, returning the previous one under the same key
    pub fn insert<T: Any + Send>(&mut self, key: &MetadataKey<T>, value: T) -> Option<T> {
        self.entries
            .insert(key.slot(), Box::new(value))
            .and_then(|prev| prev.downcast::<T>().ok())
            .map(|prev| *prev)
    }

    pub fn remove<T: Any + Send>(&mut self, key: &MetadataKey<T>) -> Option<T> {
        self.entries
            .remove(&key.slot())
            .and_then(|prev| prev.downcast::<T>().ok())
            .map(|prev| *prev)
    }

    pub fn contains<T: Any + Send>(&self, key: &MetadataKey<T>) -> bool {
        self.entries.contains_key(&key.slot())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.entries.keys().map(|k| k.name))
            .finish()
    }
}

// ============================================================================
// DrawContext
// ============================================================================

/// Data bag for a single draw call of a particle object
#[derive(Debug)]
pub struct DrawContext {
    world: WorldId,
    position: Vec3,
    current_step: u32,
    total_steps: u32,
    should_render: bool,
    metadata: Metadata,
}

impl DrawContext {
    pub fn new(world: WorldId, position: Vec3, current_step: u32, total_steps: u32) -> Self {
        Self {
            world,
            position,
            current_step,
            total_steps,
            should_render: true,
            metadata: Metadata::new(),
        }
    }

    pub fn world(&self) -> WorldId {
        self.world
    }

    /// Base position handed in by the animator
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    pub fn should_render(&self) -> bool {
        self.should_render
    }

    pub fn set_should_render(&mut self, should_render: bool) {
        self.should_render = should_render;
    }

    pub fn get_metadata<T: Any + Send>(&self, key: &MetadataKey<T>) -> Option<&T> {
        self.metadata.get(key)
    }

    /// Metadata value or `default` when the key is absent
    pub fn metadata_or<T: Any + Send + Clone>(&self, key: &MetadataKey<T>, default: T) -> T {
        self.metadata.get(key).cloned().unwrap_or(default)
    }

    pub fn put_metadata<T: Any + Send>(&mut self, key: &MetadataKey<T>, value: T) -> Option<T> {
        self.metadata.insert(key, value)
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

// ============================================================================
// AnimationContext
// ============================================================================

/// Data bag for a single rendering step of a path animator
///
/// Composite animators have no base position of their own, so `position` is
/// `None` for them.
#[derive(Debug)]
pub struct AnimationContext {
    world: WorldId,
    position: Option<Vec3>,
    current_step: u32,
    total_steps: u32,
    should_render: bool,
    metadata: Metadata,
}

impl AnimationContext {
    pub fn new(
        world: WorldId,
        position: Option<Vec3>,
        current_step: u32,
        total_steps: u32,
    ) -> Self {
        Self {
            world,
            position,
            current_step,
            total_steps,
            should_render: true,
            metadata: Metadata::new(),
        }
    }

    pub fn world(&self) -> WorldId {
        self.world
    }

    pub fn position(&self) -> Option<Vec3> {
        self.position
    }

    /// Overwrite the position the current step will render at
    pub fn set_position(&mut self, position: Vec3) {
        self.position = Some(position);
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    pub fn should_render(&self) -> bool {
        self.should_render
    }

    pub fn set_should_render(&mut self, should_render: bool) {
        self.should_render = should_render;
    }

    pub fn get_metadata<T: Any + Send>(&self, key: &MetadataKey<T>) -> Option<&T> {
        self.metadata.get(key)
    }

    pub fn metadata_or<T: Any + Send + Clone>(&self, key: &MetadataKey<T>, default: T) -> T {
        self.metadata.get(key).cloned().unwrap_or(default)
    }

    pub fn put_metadata<T: Any + Send>(&mut self, key: &MetadataKey<T>, value: T) -> Option<T> {
        self.metadata.insert(key, value)
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: MetadataKey<f32> = MetadataKey::new("size");
    const SIZE_INT: MetadataKey<u32> = MetadataKey::new("size");
    const LABEL: MetadataKey<String> = MetadataKey::new("label");

    #[test]
    fn test_metadata_typed_keys_do_not_collide() {
        let mut meta = Metadata::new();
        meta.insert(&SIZE, 1.5);
        meta.insert(&SIZE_INT, 7);

        assert_eq!(meta.get(&SIZE), Some(&1.5));
        assert_eq!(meta.get(&SIZE_INT), Some(&7));
        assert_eq!(meta.len(), 2);
    }

    #[test]
    fn test_metadata_insert_returns_previous() {
        let mut meta = Metadata::new();
        assert_eq!(meta.insert(&LABEL, "a".to_string()), None);
        assert_eq!(meta.insert(&LABEL, "b".to_string()), Some("a".to_string()));
        assert_eq!(meta.remove(&LABEL), Some("b".to_string()));
        assert!(meta.is_empty());
    }

    #[test]
    fn test_draw_context_defaults() {
        let ctx = DrawContext::new(WorldId(3), Vec3::ONE, 2, 10);
        assert!(ctx.should_render());
        assert_eq!(ctx.world(), WorldId(3));
        assert_eq!(ctx.position(), Vec3::ONE);
        assert_eq!(ctx.current_step(), 2);
        assert_eq!(ctx.total_steps(), 10);
        assert!(ctx.metadata().is_empty());
        assert_eq!(ctx.metadata_or(&SIZE, 0.25), 0.25);
    }

    #[test]
    fn test_metadata_not_carried_between_steps() {
        let mut first = AnimationContext::new(WorldId::default(), Some(Vec3::ZERO), 0, 2);
        first.put_metadata(&SIZE, 4.0);
        assert_eq!(first.get_metadata(&SIZE), Some(&4.0));

        let second = AnimationContext::new(WorldId::default(), Some(Vec3::ZERO), 1, 2);
        assert!(second.get_metadata(&SIZE).is_none());
    }

    #[test]
    fn test_animation_context_position_override() {
        let mut ctx = AnimationContext::new(WorldId::default(), None, 0, 1);
        assert_eq!(ctx.position(), None);
        ctx.set_position(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(ctx.position(), Some(Vec3::new(1.0, 2.0, 3.0)));
    }
}
