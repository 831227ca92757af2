use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec2;
use smol_str::SmolStr;

use crate::view::render_pass::MaterialHandle;

static NEXT_STYLE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a style definition, unique for the life of the process.
/// Two definitions with equal fields are still different styles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleId(u64);

impl StyleId {
    fn next() -> Self {
        Self(NEXT_STYLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StyleDefinition {
    id: StyleId,
    name: SmolStr,
    width: f32,
    outline_material: Option<MaterialHandle>,
    infill_material: Option<MaterialHandle>,
    use_scene_depth_for_occlusion: bool,
}

impl StyleDefinition {
    pub const DEFAULT_WIDTH: f32 = 5.0;

    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            id: StyleId::next(),
            name: name.into(),
            width: Self::DEFAULT_WIDTH,
            outline_material: None,
            infill_material: None,
            use_scene_depth_for_occlusion: true,
        }
    }

    /// Negative and NaN widths become 0.
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width.max(0.0);
        self.reidentified()
    }

    pub fn with_outline_material(mut self, material: MaterialHandle) -> Self {
        self.outline_material = Some(material);
        self.reidentified()
    }

    pub fn with_infill_material(mut self, material: MaterialHandle) -> Self {
        self.infill_material = Some(material);
        self.reidentified()
    }

    pub fn with_scene_depth_occlusion(mut self, enabled: bool) -> Self {
        self.use_scene_depth_for_occlusion = enabled;
        self.reidentified()
    }

    // A modified copy is a different style from the one it was cloned from.
    fn reidentified(mut self) -> Self {
        self.id = StyleId::next();
        self
    }

    pub fn id(&self) -> StyleId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn outline_material(&self) -> Option<MaterialHandle> {
        self.outline_material
    }

    pub fn infill_material(&self) -> Option<MaterialHandle> {
        self.infill_material
    }

    pub fn use_scene_depth_for_occlusion(&self) -> bool {
        self.use_scene_depth_for_occlusion
    }

    /// A style with neither material would draw nothing.
    pub fn is_valid(&self) -> bool {
        self.outline_material.is_some() || self.infill_material.is_some()
    }

    /// Blur extent in UV units: `x = width / target_width`,
    /// `y = width / target_height`.
    pub fn blur_extent(&self, target_width: u32, target_height: u32) -> Vec2 {
        Vec2::new(
            self.width / target_width.max(1) as f32,
            self.width / target_height.max(1) as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_definition_gets_a_fresh_id() {
        let a = StyleDefinition::new("Selection");
        let b = StyleDefinition::new("Selection");
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn modified_clone_is_a_new_style() {
        let base = StyleDefinition::new("Selection")
            .with_outline_material(MaterialHandle::from_raw(1));
        let wide = base.clone().with_width(40.0);
        assert_ne!(wide.id(), base.id());
        assert_eq!(base.width(), StyleDefinition::DEFAULT_WIDTH);
        assert_eq!(wide.width(), 40.0);

        let overlay = base.clone().with_scene_depth_occlusion(false);
        assert_ne!(overlay.id(), base.id());
        assert_ne!(overlay.id(), wide.id());
    }

    #[test]
    fn width_is_clamped_to_zero() {
        assert_eq!(StyleDefinition::new("s").with_width(-3.0).width(), 0.0);
        assert_eq!(StyleDefinition::new("s").with_width(f32::NAN).width(), 0.0);
        assert_eq!(StyleDefinition::new("s").with_width(2.5).width(), 2.5);
    }

    #[test]
    fn blur_extent_is_width_over_target_size() {
        let style = StyleDefinition::new("s").with_width(5.0);
        let extent = style.blur_extent(1920, 1080);
        assert_eq!(extent.x, 5.0 / 1920.0);
        assert_eq!(extent.y, 5.0 / 1080.0);

        for width in [0.0_f32, 0.5, 1.0, 7.25, 64.0] {
            let style = StyleDefinition::new("s").with_width(width);
            for (w, h) in [(1_u32, 1_u32), (640, 480), (3840, 2160)] {
                assert_eq!(
                    style.blur_extent(w, h),
                    Vec2::new(width / w as f32, width / h as f32)
                );
            }
        }
    }

    #[test]
    fn style_without_materials_is_invalid() {
        assert!(!StyleDefinition::new("empty").is_valid());
        assert!(
            StyleDefinition::new("infill")
                .with_infill_material(MaterialHandle::from_raw(1))
                .is_valid()
        );
    }
}
