use std::any::Any;

use rustc_hash::FxHashMap;

/// Data one effect publishes for others recording into the same frame.
///
/// Items are found by `TAG`, so two effects agreeing on a tag and a type
/// share a single instance.
pub trait FrameItem: Default + 'static {
    const TAG: &'static str;

    /// Called once per frame, before any view is recorded.
    fn reset(&mut self);
}

trait FrameItemDyn {
    fn reset(&mut self);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: FrameItem> FrameItemDyn for T {
    fn reset(&mut self) {
        FrameItem::reset(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Frame-scoped store shared by every effect and every view of one frame.
/// The host creates it once and calls [`FrameContext::begin_frame`] before
/// recording the frame's first view.
#[derive(Default)]
pub struct FrameContext {
    items: FxHashMap<&'static str, Box<dyn FrameItemDyn>>,
    frame_index: u64,
}

impl FrameContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create<T: FrameItem>(&mut self) -> &mut T {
        let stale = self
            .items
            .get(T::TAG)
            .is_some_and(|item| !item.as_any().is::<T>());
        if stale {
            tracing::error!(
                tag = T::TAG,
                expected = std::any::type_name::<T>(),
                "frame item tag is shared by two types, replacing the stored item"
            );
            self.items.remove(T::TAG);
        }
        let item = self
            .items
            .entry(T::TAG)
            .or_insert_with(|| Box::new(T::default()) as Box<dyn FrameItemDyn>);
        item.as_any_mut()
            .downcast_mut::<T>()
            .expect("stale items were replaced above")
    }

    pub fn get<T: FrameItem>(&self) -> Option<&T> {
        self.items.get(T::TAG)?.as_any().downcast_ref::<T>()
    }

    pub fn get_mut<T: FrameItem>(&mut self) -> Option<&mut T> {
        self.items.get_mut(T::TAG)?.as_any_mut().downcast_mut::<T>()
    }

    pub fn contains<T: FrameItem>(&self) -> bool {
        self.get::<T>().is_some()
    }

    /// Resets every item in place, keeping its allocations.
    pub fn reset(&mut self) {
        for item in self.items.values_mut() {
            item.reset();
        }
    }

    pub fn begin_frame(&mut self) {
        self.reset();
        self.frame_index += 1;
        tracing::trace!(frame = self.frame_index, items = self.items.len(), "frame context reset");
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        hits: u32,
    }

    impl FrameItem for Counter {
        const TAG: &'static str = "test.counter";

        fn reset(&mut self) {
            self.hits = 0;
        }
    }

    #[derive(Default)]
    struct Impostor;

    impl FrameItem for Impostor {
        const TAG: &'static str = "test.counter";

        fn reset(&mut self) {}
    }

    #[test]
    fn get_or_create_returns_the_same_item() {
        let mut context = FrameContext::new();
        assert!(!context.contains::<Counter>());
        context.get_or_create::<Counter>().hits += 1;
        context.get_or_create::<Counter>().hits += 1;
        assert_eq!(context.get::<Counter>().map(|c| c.hits), Some(2));
    }

    #[test]
    fn begin_frame_resets_items_and_advances() {
        let mut context = FrameContext::new();
        context.get_or_create::<Counter>().hits = 7;
        context.begin_frame();
        assert_eq!(context.frame_index(), 1);
        assert_eq!(context.get::<Counter>().map(|c| c.hits), Some(0));
    }

    #[test]
    fn conflicting_tag_replaces_the_item() {
        let mut context = FrameContext::new();
        context.get_or_create::<Counter>().hits = 3;
        context.get_or_create::<Impostor>();
        assert!(context.get::<Counter>().is_none());
        assert!(context.contains::<Impostor>());
    }
}
