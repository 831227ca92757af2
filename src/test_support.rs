use std::sync::Arc;

use crate::outline::{Drawable, RendererEntry, StyleDefinition};
use crate::view::frame_graph::{DEPTH_FORMAT, DepthOut, FrameGraph, SceneColorOut, TextureDesc};
use crate::view::render_pass::MaterialHandle;
use crate::view::view_target::{TargetDescriptor, ViewId, ViewKind, ViewTargets};

pub const UTILITY: MaterialHandle = MaterialHandle::from_raw(100);
pub const COPY_DEPTH: MaterialHandle = MaterialHandle::from_raw(101);
pub const OUTLINE: MaterialHandle = MaterialHandle::from_raw(20);

pub struct NullDrawable {
    submeshes: u32,
    enabled: bool,
}

impl NullDrawable {
    pub fn new(submeshes: u32) -> Arc<dyn Drawable> {
        Arc::new(Self {
            submeshes,
            enabled: true,
        })
    }

    pub fn disabled() -> Arc<dyn Drawable> {
        Arc::new(Self {
            submeshes: 1,
            enabled: false,
        })
    }
}

impl Drawable for NullDrawable {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn submesh_count(&self) -> u32 {
        self.submeshes
    }

    fn draw_submesh(&self, _pass: &mut wgpu::RenderPass<'_>, _submesh: u32) {}
}

pub fn entry(drawable: Arc<dyn Drawable>, alpha: f32) -> RendererEntry {
    RendererEntry {
        submesh_count: drawable.submesh_count(),
        drawable,
        alpha,
    }
}

pub fn outline_style(name: &str, occlusion: bool) -> Arc<StyleDefinition> {
    Arc::new(
        StyleDefinition::new(name)
            .with_outline_material(OUTLINE)
            .with_scene_depth_occlusion(occlusion),
    )
}

pub fn game_view(graph: &mut FrameGraph, id: u64, width: u32, height: u32) -> ViewTargets {
    let depth: DepthOut =
        graph.import_texture(TextureDesc::new("Scene Depth", width, height, DEPTH_FORMAT));
    game_view_without_depth(graph, id, width, height).with_depth(depth)
}

pub fn game_view_without_depth(
    graph: &mut FrameGraph,
    id: u64,
    width: u32,
    height: u32,
) -> ViewTargets {
    let color: SceneColorOut = graph.import_texture(TextureDesc::new(
        "Scene Color",
        width,
        height,
        wgpu::TextureFormat::Rgba16Float,
    ));
    ViewTargets::new(
        ViewId(id),
        ViewKind::Game,
        TargetDescriptor::new(width, height),
        color,
    )
}
