use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::outline::registry::{Drawable, OutlineRegistry};
use crate::outline::style::{StyleDefinition, StyleId};

/// One drawable scheduled for a mask pass this frame.
#[derive(Clone)]
pub struct RendererEntry {
    pub drawable: Arc<dyn Drawable>,
    pub submesh_count: u32,
    pub alpha: f32,
}

impl PartialEq for RendererEntry {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.drawable), Arc::as_ptr(&other.drawable))
            && self.submesh_count == other.submesh_count
            && self.alpha == other.alpha
    }
}

impl fmt::Debug for RendererEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererEntry")
            .field("drawable", &Arc::as_ptr(&self.drawable).cast::<()>())
            .field("submesh_count", &self.submesh_count)
            .field("alpha", &self.alpha)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StyleGroup {
    style: Arc<StyleDefinition>,
    entries: Vec<RendererEntry>,
}

impl StyleGroup {
    pub fn style(&self) -> &Arc<StyleDefinition> {
        &self.style
    }

    pub fn entries(&self) -> &[RendererEntry] {
        &self.entries
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GroupingDiagnostic {
    /// Logged as a warning; only the object is skipped.
    MissingStyle { object: SmolStr },
    /// Logged as an error; the whole style is skipped for the frame.
    InvalidStyle { style: StyleId, name: SmolStr },
}

impl GroupingDiagnostic {
    pub fn is_error(&self) -> bool {
        matches!(self, GroupingDiagnostic::InvalidStyle { .. })
    }
}

/// The registry collapsed by style, rebuilt from scratch every frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RendererGroups {
    groups: IndexMap<StyleId, StyleGroup>,
    requested_depth_copy: bool,
    diagnostics: Vec<GroupingDiagnostic>,
}

impl RendererGroups {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn get(&self, style: StyleId) -> Option<&StyleGroup> {
        self.groups.get(&style)
    }

    pub fn contains(&self, style: StyleId) -> bool {
        self.groups.contains_key(&style)
    }

    /// Groups in the order their styles were first met.
    pub fn iter(&self) -> impl Iterator<Item = &StyleGroup> + '_ {
        self.groups.values()
    }

    /// Whether any grouped style tests against scene depth.
    pub fn requested_depth_copy(&self) -> bool {
        self.requested_depth_copy
    }

    pub fn diagnostics(&self) -> &[GroupingDiagnostic] {
        &self.diagnostics
    }

    pub fn entry_count(&self) -> usize {
        self.groups.values().map(|group| group.entries.len()).sum()
    }
}

/// Collects the enabled drawables of every enabled object, grouped by the
/// object's style. Objects without a style and styles without any material
/// are reported and skipped.
pub fn group_renderers(registry: &OutlineRegistry) -> RendererGroups {
    let mut groups: IndexMap<StyleId, StyleGroup> = IndexMap::new();
    let mut diagnostics = Vec::new();
    let mut rejected_styles: FxHashSet<StyleId> = FxHashSet::default();

    for (_, object) in registry.iter() {
        if !object.is_enabled() || !object.is_active() {
            continue;
        }
        let Some(style) = object.style() else {
            tracing::warn!(
                object = object.name(),
                "outline object has no style definition, skipping it"
            );
            diagnostics.push(GroupingDiagnostic::MissingStyle {
                object: object.name().into(),
            });
            continue;
        };
        if !style.is_valid() {
            if rejected_styles.insert(style.id()) {
                tracing::error!(
                    style = style.name(),
                    "outline style has neither an outline nor an infill material, skipping it"
                );
                diagnostics.push(GroupingDiagnostic::InvalidStyle {
                    style: style.id(),
                    name: style.name().into(),
                });
            }
            continue;
        }

        for drawable in object.drawables() {
            if !drawable.is_enabled() {
                continue;
            }
            let entry = RendererEntry {
                drawable: Arc::clone(drawable),
                submesh_count: drawable.submesh_count(),
                alpha: object.alpha(),
            };
            groups
                .entry(style.id())
                .or_insert_with(|| StyleGroup {
                    style: Arc::clone(style),
                    entries: Vec::new(),
                })
                .entries
                .push(entry);
        }
    }

    let requested_depth_copy = groups
        .values()
        .any(|group| group.style.use_scene_depth_for_occlusion());

    RendererGroups {
        groups,
        requested_depth_copy,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::registry::OutlineObject;
    use crate::test_support::{NullDrawable, outline_style};
    use crate::view::render_pass::MaterialHandle;
    use pretty_assertions::assert_eq;

    #[test]
    fn disabled_and_inactive_objects_contribute_nothing() {
        let style = outline_style("s", true);
        let mut registry = OutlineRegistry::new();
        let off = registry.register(
            OutlineObject::new("off")
                .with_style(style.clone())
                .with_drawables(vec![NullDrawable::new(1)]),
        );
        let hidden = registry.register(
            OutlineObject::new("hidden")
                .with_style(style.clone())
                .with_drawables(vec![NullDrawable::new(1)]),
        );
        if let Some(object) = registry.get_mut(off) {
            object.set_enabled(false);
        }
        if let Some(object) = registry.get_mut(hidden) {
            object.set_active(false);
        }

        let groups = group_renderers(&registry);
        assert!(groups.is_empty());
        assert!(!groups.requested_depth_copy());
        assert!(groups.diagnostics().is_empty());
    }

    #[test]
    fn disabled_drawables_are_skipped() {
        let style = outline_style("s", false);
        let mut registry = OutlineRegistry::new();
        registry.register(
            OutlineObject::new("mixed")
                .with_style(style.clone())
                .with_drawables(vec![NullDrawable::disabled(), NullDrawable::new(3)]),
        );

        let groups = group_renderers(&registry);
        let group = groups.get(style.id()).expect("style is grouped");
        assert_eq!(group.entries().len(), 1);
        assert_eq!(group.entries()[0].submesh_count, 3);
    }

    #[test]
    fn objects_without_style_warn_once_each() {
        let mut registry = OutlineRegistry::new();
        registry.register(OutlineObject::new("a").with_drawables(vec![NullDrawable::new(1)]));
        registry.register(OutlineObject::new("b"));

        let groups = group_renderers(&registry);
        assert!(groups.is_empty());
        assert_eq!(
            groups.diagnostics(),
            &[
                GroupingDiagnostic::MissingStyle { object: "a".into() },
                GroupingDiagnostic::MissingStyle { object: "b".into() },
            ]
        );
    }

    #[test]
    fn invalid_style_is_excluded_with_one_error() {
        let empty = Arc::new(StyleDefinition::new("empty"));
        let mut registry = OutlineRegistry::new();
        for name in ["a", "b", "c"] {
            registry.register(
                OutlineObject::new(name)
                    .with_style(empty.clone())
                    .with_drawables(vec![NullDrawable::new(1)]),
            );
        }

        let groups = group_renderers(&registry);
        assert!(!groups.contains(empty.id()));
        assert!(!groups.requested_depth_copy());
        let errors: Vec<_> = groups
            .diagnostics()
            .iter()
            .filter(|d| d.is_error())
            .collect();
        assert_eq!(
            errors,
            vec![&GroupingDiagnostic::InvalidStyle {
                style: empty.id(),
                name: "empty".into(),
            }]
        );
    }

    #[test]
    fn depth_copy_is_requested_only_by_grouped_occluding_styles() {
        let occluding = outline_style("occluding", true);
        let overlay = outline_style("overlay", false);

        let mut registry = OutlineRegistry::new();
        registry.register(
            OutlineObject::new("overlay")
                .with_style(overlay.clone())
                .with_drawables(vec![NullDrawable::new(1)]),
        );
        assert!(!group_renderers(&registry).requested_depth_copy());

        // An occluding style whose drawables are all disabled forms no group.
        registry.register(
            OutlineObject::new("ghost")
                .with_style(occluding.clone())
                .with_drawables(vec![NullDrawable::disabled()]),
        );
        let groups = group_renderers(&registry);
        assert!(!groups.contains(occluding.id()));
        assert!(!groups.requested_depth_copy());

        registry.register(
            OutlineObject::new("occluded")
                .with_style(occluding.clone())
                .with_drawables(vec![NullDrawable::new(1)]),
        );
        let groups = group_renderers(&registry);
        assert!(groups.contains(occluding.id()));
        assert!(groups.requested_depth_copy());
    }

    #[test]
    fn grouping_is_idempotent() {
        let a = outline_style("a", true);
        let b = Arc::new(
            StyleDefinition::new("b").with_infill_material(MaterialHandle::from_raw(4)),
        );
        let mut registry = OutlineRegistry::new();
        registry.register(
            OutlineObject::new("one")
                .with_style(a.clone())
                .with_drawables(vec![NullDrawable::new(1), NullDrawable::new(2)])
                .with_alpha(0.5),
        );
        registry.register(
            OutlineObject::new("two")
                .with_style(b.clone())
                .with_drawables(vec![NullDrawable::new(1)]),
        );
        registry.register(OutlineObject::new("three"));

        let first = group_renderers(&registry);
        let second = group_renderers(&registry);
        assert_eq!(first, second);
        let order: Vec<StyleId> = first.iter().map(|group| group.style().id()).collect();
        assert_eq!(order, vec![a.id(), b.id()]);
    }

    #[test]
    fn objects_sharing_a_style_share_a_group() {
        let style = outline_style("shared", true);
        let mut registry = OutlineRegistry::new();
        for (name, alpha) in [("left", 1.0), ("right", 0.25)] {
            registry.register(
                OutlineObject::new(name)
                    .with_style(style.clone())
                    .with_drawables(vec![NullDrawable::new(1)])
                    .with_alpha(alpha),
            );
        }

        let groups = group_renderers(&registry);
        assert_eq!(groups.len(), 1);
        let alphas: Vec<f32> = groups
            .get(style.id())
            .map(|group| group.entries().iter().map(|entry| entry.alpha).collect())
            .unwrap_or_default();
        assert_eq!(alphas, vec![1.0, 0.25]);
    }

    #[test]
    fn widened_copy_of_a_style_groups_separately() {
        let narrow = outline_style("selection", true);
        let wide = Arc::new((*narrow).clone().with_width(40.0));
        let mut registry = OutlineRegistry::new();
        for (name, style) in [("narrow", &narrow), ("wide", &wide)] {
            registry.register(
                OutlineObject::new(name)
                    .with_style(Arc::clone(style))
                    .with_drawables(vec![NullDrawable::new(1)]),
            );
        }

        let groups = group_renderers(&registry);
        let widths: Vec<f32> = groups.iter().map(|group| group.style().width()).collect();
        assert_eq!(widths, vec![StyleDefinition::DEFAULT_WIDTH, 40.0]);
    }
}
