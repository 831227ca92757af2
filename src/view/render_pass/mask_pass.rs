use bitflags::bitflags;
use glam::Vec2;
use wgpu::util::DeviceExt;

use crate::outline::RendererEntry;
use crate::view::frame_graph::PassContext;
use crate::view::frame_graph::builder::BuildContext;
use crate::view::frame_graph::texture_resource::{DepthIn, DepthOut, MaskOut};
use crate::view::render_pass::RenderPass;
use crate::view::render_pass::material::MaterialHandle;

const MASK_LABEL: &str = "Outline Mask";
const MASK_SHADER_PASS: usize = 4;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ClearFlags: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// Where the mask pass gets the depth it tests against and marks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthMode {
    /// The shared scene depth snapshot: depth is kept so occluded pixels are
    /// rejected, stencil is cleared.
    SceneCopy,
    /// A surface of the mask pass's own, cleared entirely.
    Private,
}

impl DepthMode {
    pub fn clear_flags(self) -> ClearFlags {
        match self {
            DepthMode::SceneCopy => ClearFlags::COLOR | ClearFlags::STENCIL,
            DepthMode::Private => ClearFlags::all(),
        }
    }
}

#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct MaskUniform {
    blur_extent: [f32; 2],
    alpha: f32,
    _pad: f32,
}

/// Draws one style group's drawables into its mask surface.
pub struct MaskPass {
    entries: Vec<RendererEntry>,
    blur_extent: Vec2,
    utility: MaterialHandle,
    depth_mode: DepthMode,
    input: MaskInput,
    output: MaskOutput,
}

#[derive(Default)]
pub struct MaskInput {
    /// Bound only when depth is loaded from an earlier pass.
    pub depth: DepthIn,
}

#[derive(Default)]
pub struct MaskOutput {
    pub mask: MaskOut,
    pub depth: DepthOut,
}

impl MaskPass {
    pub fn new(
        entries: Vec<RendererEntry>,
        blur_extent: Vec2,
        utility: MaterialHandle,
        mask: MaskOut,
        depth: DepthOut,
        depth_mode: DepthMode,
    ) -> Self {
        let input = match depth_mode {
            DepthMode::SceneCopy => MaskInput {
                depth: depth.reader(),
            },
            DepthMode::Private => MaskInput::default(),
        };
        Self {
            entries,
            blur_extent,
            utility,
            depth_mode,
            input,
            output: MaskOutput { mask, depth },
        }
    }

    pub fn entries(&self) -> &[RendererEntry] {
        &self.entries
    }

    pub fn blur_extent(&self) -> Vec2 {
        self.blur_extent
    }

    pub fn depth_mode(&self) -> DepthMode {
        self.depth_mode
    }

    pub fn clear_flags(&self) -> ClearFlags {
        self.depth_mode.clear_flags()
    }
}

impl RenderPass for MaskPass {
    type Input = MaskInput;
    type Output = MaskOutput;

    fn input(&self) -> &Self::Input {
        &self.input
    }

    fn output(&self) -> &Self::Output {
        &self.output
    }

    fn label(&self) -> &str {
        MASK_LABEL
    }

    fn build(&mut self, builder: &mut BuildContext) {
        builder.write_texture(&self.output.mask);
        match self.depth_mode {
            DepthMode::SceneCopy => {
                builder.read_write_texture(&self.input.depth, &self.output.depth)
            }
            DepthMode::Private => builder.write_texture(&self.output.depth),
        }
    }

    fn execute(&mut self, ctx: &mut PassContext<'_, '_>) {
        let (Some(mask), Some(depth)) = (self.output.mask.handle(), self.output.depth.handle())
        else {
            return;
        };
        let (Some(mask_view), Some(depth_view)) = (ctx.texture_view(mask), ctx.texture_view(depth))
        else {
            return;
        };
        let materials = ctx.materials;
        let Some(pipeline) = materials.pipeline(self.utility, MASK_SHADER_PASS, MASK_LABEL) else {
            return;
        };

        let device = ctx.device;
        let layout = pipeline.get_bind_group_layout(0);
        let bind_groups: Vec<wgpu::BindGroup> = self
            .entries
            .iter()
            .map(|entry| {
                let uniform = MaskUniform {
                    blur_extent: self.blur_extent.to_array(),
                    alpha: entry.alpha,
                    _pad: 0.0,
                };
                let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Outline Mask Params Buffer"),
                    contents: bytemuck::bytes_of(&uniform),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Outline Mask Bind Group"),
                    layout: &layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                })
            })
            .collect();

        let clear = self.clear_flags();
        let color_load = if clear.contains(ClearFlags::COLOR) {
            wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT)
        } else {
            wgpu::LoadOp::Load
        };
        let depth_load = if clear.contains(ClearFlags::DEPTH) {
            wgpu::LoadOp::Clear(1.0)
        } else {
            wgpu::LoadOp::Load
        };
        let stencil_load = if clear.contains(ClearFlags::STENCIL) {
            wgpu::LoadOp::Clear(0)
        } else {
            wgpu::LoadOp::Load
        };

        let mut pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(MASK_LABEL),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &mask_view,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
                resolve_target: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: stencil_load,
                    store: wgpu::StoreOp::Store,
                }),
            }),
            ..Default::default()
        });
        pass.set_pipeline(pipeline);
        pass.set_stencil_reference(1);
        for (entry, bind_group) in self.entries.iter().zip(&bind_groups) {
            pass.set_bind_group(0, bind_group, &[]);
            for submesh in 0..entry.submesh_count {
                entry.drawable.draw_submesh(&mut pass, submesh);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{NullDrawable, entry};
    use crate::view::frame_graph::{FrameGraph, TextureDesc};

    #[test]
    fn scene_copy_keeps_depth_and_clears_stencil() {
        assert_eq!(
            DepthMode::SceneCopy.clear_flags(),
            ClearFlags::COLOR | ClearFlags::STENCIL
        );
        assert_eq!(DepthMode::Private.clear_flags(), ClearFlags::all());
    }

    #[test]
    fn private_depth_is_written_without_being_read() {
        let mut graph = FrameGraph::new();
        let mask: MaskOut = graph.declare_texture(TextureDesc::mask("Mask", 32, 32));
        let depth: DepthOut = graph.declare_texture(TextureDesc::depth("Depth", 32, 32));

        let private = MaskPass::new(
            vec![entry(NullDrawable::new(2), 0.5)],
            Vec2::ZERO,
            MaterialHandle::from_raw(0),
            mask,
            depth,
            DepthMode::Private,
        );
        assert!(!private.input().depth.is_bound());
        assert_eq!(private.output().depth, depth);
        assert_eq!(private.entries().len(), 1);

        let shared = MaskPass::new(
            Vec::new(),
            Vec2::ZERO,
            MaterialHandle::from_raw(0),
            mask,
            depth,
            DepthMode::SceneCopy,
        );
        assert_eq!(shared.input().depth, depth.reader());
    }
}
