use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::outline::InjectionPoint;
use crate::view::frame_context::FrameItem;
use crate::view::frame_graph::builder::BuildContext;
use crate::view::frame_graph::texture_resource::{DepthIn, DepthOut};
use crate::view::frame_graph::{FrameGraph, GraphId, PassContext, TextureDesc};
use crate::view::render_pass::RenderPass;
use crate::view::render_pass::fullscreen::{FullscreenDraw, FullscreenUniform, draw_fullscreen};
use crate::view::render_pass::material::MaterialHandle;
use crate::view::view_target::{ViewId, ViewTargets};

const DEPTH_COPY_LABEL: &str = "Outline Depth Copy";

#[derive(Clone, Debug, PartialEq, Error)]
pub enum DepthCopyError {
    #[error("scene depth is not valid yet for view {0:?}")]
    SourceInvalid(ViewId),
    #[error("depth cannot be copied at injection point {0:?}")]
    UnsupportedInjectionPoint(InjectionPoint),
    #[error("no depth copy material was configured")]
    MissingCopyMaterial,
    #[error("scene depth target has non-depth format {0:?}")]
    NotDepthFormat(wgpu::TextureFormat),
}

/// Depth copies are only shared between passes recorded into the same graph
/// that agree on view and size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DepthCopyKey {
    pub graph: GraphId,
    pub view: ViewId,
    pub width: u32,
    pub height: u32,
}

impl DepthCopyKey {
    pub fn for_view(graph: &FrameGraph, view: &ViewTargets) -> Self {
        Self {
            graph: graph.id(),
            view: view.id,
            width: view.descriptor.width,
            height: view.descriptor.height,
        }
    }
}

/// Scene depth snapshots taken this frame, visible to every effect.
#[derive(Default)]
pub struct SharedDepthCopies {
    copies: FxHashMap<DepthCopyKey, DepthOut>,
}

impl FrameItem for SharedDepthCopies {
    const TAG: &'static str = "outline.shared_depth_copy";

    fn reset(&mut self) {
        self.copies.clear();
    }
}

impl SharedDepthCopies {
    pub fn get(&self, key: &DepthCopyKey) -> Option<DepthOut> {
        self.copies.get(key).copied()
    }

    pub fn publish(&mut self, key: DepthCopyKey, copy: DepthOut) {
        self.copies.insert(key, copy);
    }

    pub fn len(&self) -> usize {
        self.copies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.copies.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DepthCopy {
    /// A copy pass was added to the graph.
    Scheduled(DepthOut),
    /// Another pass already copied this view's depth this frame.
    Reused(DepthOut),
}

impl DepthCopy {
    pub fn target(self) -> DepthOut {
        match self {
            DepthCopy::Scheduled(target) | DepthCopy::Reused(target) => target,
        }
    }
}

/// Snapshots the view's scene depth into a transient surface, or returns the
/// snapshot an earlier pass already took for the same view and size in the
/// same graph.
pub fn schedule_depth_copy(
    graph: &mut FrameGraph,
    shared: &mut SharedDepthCopies,
    view: &ViewTargets,
    injection_point: InjectionPoint,
    material: Option<MaterialHandle>,
) -> Result<DepthCopy, DepthCopyError> {
    let key = DepthCopyKey::for_view(graph, view);
    if let Some(existing) = shared.get(&key) {
        return Ok(DepthCopy::Reused(existing));
    }
    if !injection_point.supports_depth_copy() {
        return Err(DepthCopyError::UnsupportedInjectionPoint(injection_point));
    }
    let Some(source) = view.depth.filter(|depth| depth.is_bound()) else {
        return Err(DepthCopyError::SourceInvalid(view.id));
    };
    let Some(source_desc) = source.handle().and_then(|handle| graph.texture_desc(handle)) else {
        return Err(DepthCopyError::SourceInvalid(view.id));
    };
    if !source_desc.is_depth() {
        return Err(DepthCopyError::NotDepthFormat(source_desc.format()));
    }
    let material = material.ok_or(DepthCopyError::MissingCopyMaterial)?;

    let destination: DepthOut = graph.declare_texture(TextureDesc::depth(
        "Outline Scene Depth Copy",
        key.width,
        key.height,
    ));
    graph.add_pass(DepthCopyPass::new(material, source.reader(), destination));
    shared.publish(key, destination);
    Ok(DepthCopy::Scheduled(destination))
}

pub struct DepthCopyPass {
    material: MaterialHandle,
    input: DepthCopyInput,
    output: DepthCopyOutput,
}

#[derive(Default)]
pub struct DepthCopyInput {
    pub source: DepthIn,
}

#[derive(Default)]
pub struct DepthCopyOutput {
    pub destination: DepthOut,
}

impl DepthCopyPass {
    pub fn new(material: MaterialHandle, source: DepthIn, destination: DepthOut) -> Self {
        Self {
            material,
            input: DepthCopyInput { source },
            output: DepthCopyOutput { destination },
        }
    }
}

impl RenderPass for DepthCopyPass {
    type Input = DepthCopyInput;
    type Output = DepthCopyOutput;

    fn input(&self) -> &Self::Input {
        &self.input
    }

    fn output(&self) -> &Self::Output {
        &self.output
    }

    fn label(&self) -> &str {
        DEPTH_COPY_LABEL
    }

    fn build(&mut self, builder: &mut BuildContext) {
        builder.read_texture(&self.input.source);
        builder.write_texture(&self.output.destination);
    }

    fn execute(&mut self, ctx: &mut PassContext<'_, '_>) {
        let (Some(source), Some(destination)) = (
            self.input.source.handle(),
            self.output.destination.handle(),
        ) else {
            return;
        };
        let (Some(source_view), Some(destination_view)) =
            (ctx.sampled_view(source), ctx.texture_view(destination))
        else {
            return;
        };
        let materials = ctx.materials;
        let Some(pipeline) = materials.pipeline(self.material, 0, DEPTH_COPY_LABEL) else {
            return;
        };

        // The material writes fragment depth; stencil starts clean for the
        // mask passes that mark it.
        draw_fullscreen(
            ctx,
            FullscreenDraw {
                label: DEPTH_COPY_LABEL,
                pipeline,
                source: &source_view,
                uniform: FullscreenUniform::default(),
                color: None,
                depth_stencil: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &destination_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Store,
                    }),
                }),
            },
        );
    }
}
