use crate::view::frame_graph::{DepthOut, SceneColorOut};

/// Host-assigned identity of a camera/view, stable across frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Game,
    SceneView,
    Preview,
    Reflection,
}

impl ViewKind {
    /// Only the primary game view and the editor scene view get outlines.
    pub fn is_renderable(self) -> bool {
        matches!(self, ViewKind::Game | ViewKind::SceneView)
    }
}

/// Size of the view's active target. Its format travels with the imported
/// color texture; mask surfaces are always `MASK_FORMAT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetDescriptor {
    pub width: u32,
    pub height: u32,
}

impl TargetDescriptor {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// The active targets of one view, as imported into that view's frame graph.
///
/// `depth` is `None` while the scene depth surface is not valid yet at the
/// chosen injection point.
#[derive(Clone, Copy, Debug)]
pub struct ViewTargets {
    pub id: ViewId,
    pub kind: ViewKind,
    pub descriptor: TargetDescriptor,
    pub color: SceneColorOut,
    pub color_is_back_buffer: bool,
    pub depth: Option<DepthOut>,
}

impl ViewTargets {
    pub fn new(
        id: ViewId,
        kind: ViewKind,
        descriptor: TargetDescriptor,
        color: SceneColorOut,
    ) -> Self {
        Self {
            id,
            kind,
            descriptor,
            color,
            color_is_back_buffer: false,
            depth: None,
        }
    }

    pub fn with_depth(mut self, depth: DepthOut) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_back_buffer(mut self, color_is_back_buffer: bool) -> Self {
        self.color_is_back_buffer = color_is_back_buffer;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_game_and_scene_views_are_renderable() {
        assert!(ViewKind::Game.is_renderable());
        assert!(ViewKind::SceneView.is_renderable());
        assert!(!ViewKind::Preview.is_renderable());
        assert!(!ViewKind::Reflection.is_renderable());
    }

    #[test]
    fn zero_sized_targets_are_empty() {
        assert!(TargetDescriptor::new(0, 1080).is_empty());
        assert!(TargetDescriptor::new(1920, 0).is_empty());
        assert!(!TargetDescriptor::new(1920, 1080).is_empty());
    }
}
