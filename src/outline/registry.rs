use std::fmt;
use std::sync::Arc;

use slotmap::{SlotMap, new_key_type};
use smol_str::SmolStr;

use crate::outline::style::StyleDefinition;

/// A drawable part of an outlined object, owned by the host.
pub trait Drawable {
    /// Enabled and active in the host's hierarchy.
    fn is_enabled(&self) -> bool;

    fn submesh_count(&self) -> u32;

    /// Binds the drawable's own geometry and resources (bind groups 1 and
    /// up) and draws one submesh. Group 0 is bound by the mask pass.
    fn draw_submesh(&self, pass: &mut wgpu::RenderPass<'_>, submesh: u32);
}

new_key_type! {
    pub struct ObjectKey;
}

pub struct OutlineObject {
    name: SmolStr,
    enabled: bool,
    active: bool,
    style: Option<Arc<StyleDefinition>>,
    drawables: Vec<Arc<dyn Drawable>>,
    alpha: f32,
}

impl OutlineObject {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            active: true,
            style: None,
            drawables: Vec::new(),
            alpha: 1.0,
        }
    }

    pub fn with_style(mut self, style: Arc<StyleDefinition>) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_drawables(mut self, drawables: Vec<Arc<dyn Drawable>>) -> Self {
        self.drawables = drawables;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn style(&self) -> Option<&Arc<StyleDefinition>> {
        self.style.as_ref()
    }

    pub fn drawables(&self) -> &[Arc<dyn Drawable>] {
        &self.drawables
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn set_style(&mut self, style: Option<Arc<StyleDefinition>>) {
        self.style = style;
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }
}

impl fmt::Debug for OutlineObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutlineObject")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("active", &self.active)
            .field("style", &self.style.as_ref().map(|style| style.id()))
            .field("drawables", &self.drawables.len())
            .field("alpha", &self.alpha)
            .finish()
    }
}

/// Objects that currently want an outline. The host owns the registry and
/// hands it to the outline feature every frame.
#[derive(Default)]
pub struct OutlineRegistry {
    objects: SlotMap<ObjectKey, OutlineObject>,
    order: Vec<ObjectKey>,
}

impl OutlineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, object: OutlineObject) -> ObjectKey {
        tracing::trace!(object = object.name(), "outline object registered");
        let key = self.objects.insert(object);
        self.order.push(key);
        key
    }

    pub fn deregister(&mut self, key: ObjectKey) -> Option<OutlineObject> {
        let object = self.objects.remove(key)?;
        self.order.retain(|&k| k != key);
        tracing::trace!(object = object.name(), "outline object deregistered");
        Some(object)
    }

    pub fn get(&self, key: ObjectKey) -> Option<&OutlineObject> {
        self.objects.get(key)
    }

    pub fn get_mut(&mut self, key: ObjectKey) -> Option<&mut OutlineObject> {
        self.objects.get_mut(key)
    }

    /// Replaces the object's drawables, e.g. after its hierarchy changed.
    pub fn refresh_drawables(&mut self, key: ObjectKey, drawables: Vec<Arc<dyn Drawable>>) -> bool {
        match self.objects.get_mut(key) {
            Some(object) => {
                object.drawables = drawables;
                true
            }
            None => false,
        }
    }

    /// Objects in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectKey, &OutlineObject)> + '_ {
        self.order
            .iter()
            .filter_map(|&key| self.objects.get(key).map(|object| (key, object)))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::NullDrawable;

    #[test]
    fn iteration_follows_registration_order() {
        let mut registry = OutlineRegistry::new();
        let a = registry.register(OutlineObject::new("a"));
        let b = registry.register(OutlineObject::new("b"));
        let c = registry.register(OutlineObject::new("c"));
        registry.deregister(b);

        let names: Vec<&str> = registry.iter().map(|(_, object)| object.name()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(registry.len(), 2);
        assert!(registry.get(b).is_none());
        assert!(registry.get(a).is_some() && registry.get(c).is_some());
    }

    #[test]
    fn deregistering_twice_is_harmless() {
        let mut registry = OutlineRegistry::new();
        let key = registry.register(OutlineObject::new("a"));
        assert!(registry.deregister(key).is_some());
        assert!(registry.deregister(key).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn refresh_replaces_drawables() {
        let mut registry = OutlineRegistry::new();
        let key = registry.register(
            OutlineObject::new("a").with_drawables(vec![NullDrawable::new(1)]),
        );
        assert!(registry.refresh_drawables(key, vec![NullDrawable::new(2), NullDrawable::new(3)]));
        let counts: Vec<u32> = registry
            .get(key)
            .map(|object| object.drawables().iter().map(|d| d.submesh_count()).collect())
            .unwrap_or_default();
        assert_eq!(counts, vec![2, 3]);

        registry.deregister(key);
        assert!(!registry.refresh_drawables(key, Vec::new()));
    }
}
