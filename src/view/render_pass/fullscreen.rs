use wgpu::util::DeviceExt;

use crate::view::frame_graph::PassContext;

const FULLSCREEN_SAMPLER: u64 = 300;

/// Uniform block bound at group 0, binding 2 of every full-screen material
/// pass.
#[derive(Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub(crate) struct FullscreenUniform {
    pub blur_extent: [f32; 2],
    pub direction: [f32; 2],
}

pub(crate) struct FullscreenDraw<'v> {
    pub label: &'v str,
    pub pipeline: &'v wgpu::RenderPipeline,
    pub source: &'v wgpu::TextureView,
    pub uniform: FullscreenUniform,
    pub color: Option<(&'v wgpu::TextureView, wgpu::LoadOp<wgpu::Color>)>,
    pub depth_stencil: Option<wgpu::RenderPassDepthStencilAttachment<'v>>,
}

/// One screen-covering triangle through `pipeline`, sampling `source`.
pub(crate) fn draw_fullscreen(ctx: &mut PassContext<'_, '_>, draw: FullscreenDraw<'_>) {
    let device = ctx.device;
    let sampler = ctx
        .cache
        .get_or_insert_with::<wgpu::Sampler, _>(FULLSCREEN_SAMPLER, || {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("Outline Fullscreen Sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            })
        })
        .clone();

    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(draw.label),
        contents: bytemuck::bytes_of(&draw.uniform),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    let layout = draw.pipeline.get_bind_group_layout(0);
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(draw.label),
        layout: &layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(draw.source),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: uniform_buffer.as_entire_binding(),
            },
        ],
    });

    let color_attachment = draw.color.map(|(view, load)| wgpu::RenderPassColorAttachment {
        view,
        ops: wgpu::Operations {
            load,
            store: wgpu::StoreOp::Store,
        },
        depth_slice: None,
        resolve_target: None,
    });
    let color_attachments = [color_attachment];
    let color_attachments: &[Option<wgpu::RenderPassColorAttachment<'_>>] =
        if color_attachments[0].is_some() {
            &color_attachments
        } else {
            &[]
        };

    let mut pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(draw.label),
        color_attachments,
        depth_stencil_attachment: draw.depth_stencil,
        ..Default::default()
    });
    pass.set_pipeline(draw.pipeline);
    pass.set_bind_group(0, &bind_group, &[]);
    pass.draw(0..3, 0..1);
}

/// Depth-stencil attachment that only guards, never writes.
pub(crate) fn read_only_depth(
    view: &wgpu::TextureView,
) -> wgpu::RenderPassDepthStencilAttachment<'_> {
    wgpu::RenderPassDepthStencilAttachment {
        view,
        depth_ops: None,
        stencil_ops: None,
    }
}
