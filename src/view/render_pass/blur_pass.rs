use glam::Vec2;

use crate::view::frame_graph::PassContext;
use crate::view::frame_graph::builder::BuildContext;
use crate::view::frame_graph::texture_resource::{MaskIn, MaskOut};
use crate::view::render_pass::RenderPass;
use crate::view::render_pass::fullscreen::{FullscreenDraw, FullscreenUniform, draw_fullscreen};
use crate::view::render_pass::material::MaterialHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlurDirection {
    Vertical,
    Horizontal,
}

impl BlurDirection {
    /// Utility material pass that filters along this axis.
    pub fn shader_pass(self) -> usize {
        match self {
            BlurDirection::Vertical => 0,
            BlurDirection::Horizontal => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BlurDirection::Vertical => "Vertical Blur",
            BlurDirection::Horizontal => "Horizontal Blur",
        }
    }

    fn axis(self) -> [f32; 2] {
        match self {
            BlurDirection::Vertical => [0.0, 1.0],
            BlurDirection::Horizontal => [1.0, 0.0],
        }
    }
}

/// One axis of the separable mask blur. Dilates the silhouette by the
/// style's extent and carries the mask alpha into the destination.
pub struct BlurPass {
    direction: BlurDirection,
    blur_extent: Vec2,
    utility: MaterialHandle,
    input: BlurInput,
    output: BlurOutput,
}

#[derive(Default)]
pub struct BlurInput {
    pub source: MaskIn,
}

#[derive(Default)]
pub struct BlurOutput {
    pub destination: MaskOut,
}

impl BlurPass {
    pub fn new(
        direction: BlurDirection,
        utility: MaterialHandle,
        blur_extent: Vec2,
        source: MaskIn,
        destination: MaskOut,
    ) -> Self {
        Self {
            direction,
            blur_extent,
            utility,
            input: BlurInput { source },
            output: BlurOutput { destination },
        }
    }

    pub fn direction(&self) -> BlurDirection {
        self.direction
    }

    pub fn blur_extent(&self) -> Vec2 {
        self.blur_extent
    }
}

impl RenderPass for BlurPass {
    type Input = BlurInput;
    type Output = BlurOutput;

    fn input(&self) -> &Self::Input {
        &self.input
    }

    fn output(&self) -> &Self::Output {
        &self.output
    }

    fn label(&self) -> &str {
        self.direction.label()
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
        let Some(pipeline) =
            materials.pipeline(self.utility, self.direction.shader_pass(), self.direction.label())
        else {
            return;
        };

        draw_fullscreen(
            ctx,
            FullscreenDraw {
                label: self.direction.label(),
                pipeline,
                source: &source_view,
                uniform: FullscreenUniform {
                    blur_extent: self.blur_extent.to_array(),
                    direction: self.direction.axis(),
                },
                color: Some((
                    &destination_view,
                    wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                )),
                depth_stencil: None,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::frame_graph::{FrameGraph, TextureDesc};

    #[test]
    fn directions_map_to_utility_passes() {
        assert_eq!(BlurDirection::Vertical.shader_pass(), 0);
        assert_eq!(BlurDirection::Horizontal.shader_pass(), 1);
        assert_eq!(BlurDirection::Vertical.label(), "Vertical Blur");
        assert_eq!(BlurDirection::Horizontal.label(), "Horizontal Blur");
    }

    #[test]
    fn blur_declares_source_read_and_destination_write() {
        let mut graph = FrameGraph::new();
        let a: MaskOut = graph.declare_texture(TextureDesc::mask("A", 16, 16));
        let b: MaskOut = graph.declare_texture(TextureDesc::mask("B", 16, 16));
        let pass = BlurPass::new(
            BlurDirection::Vertical,
            MaterialHandle::from_raw(0),
            Vec2::new(0.25, 0.5),
            a.reader(),
            b,
        );
        assert_eq!(pass.input().source, a.reader());
        assert_eq!(pass.output().destination, b);
        assert_eq!(pass.blur_extent(), Vec2::new(0.25, 0.5));
        assert_eq!(pass.label(), "Vertical Blur");
    }
}
