use crate::view::frame_graph::PassContext;
use crate::view::frame_graph::builder::BuildContext;
use crate::view::frame_graph::texture_resource::{MaskIn, MaskOut};
use crate::view::render_pass::RenderPass;
use crate::view::render_pass::composite_pass::CompositeKind;
use crate::view::render_pass::fullscreen::{FullscreenDraw, FullscreenUniform, draw_fullscreen};
use crate::view::render_pass::material::MaterialHandle;

/// Runs a style's outline or infill material over the blurred mask,
/// producing the colored contribution the composite pass blends.
pub struct EvaluatePass {
    kind: CompositeKind,
    material: MaterialHandle,
    input: EvaluateInput,
    output: EvaluateOutput,
}

#[derive(Default)]
pub struct EvaluateInput {
    pub mask: MaskIn,
}

#[derive(Default)]
pub struct EvaluateOutput {
    pub destination: MaskOut,
}

impl EvaluatePass {
    pub fn new(
        kind: CompositeKind,
        material: MaterialHandle,
        mask: MaskIn,
        destination: MaskOut,
    ) -> Self {
        Self {
            kind,
            material,
            input: EvaluateInput { mask },
            output: EvaluateOutput { destination },
        }
    }

    pub fn kind(&self) -> CompositeKind {
        self.kind
    }

    pub fn material(&self) -> MaterialHandle {
        self.material
    }
}

impl RenderPass for EvaluatePass {
    type Input = EvaluateInput;
    type Output = EvaluateOutput;

    fn input(&self) -> &Self::Input {
        &self.input
    }

    fn output(&self) -> &Self::Output {
        &self.output
    }

    fn label(&self) -> &str {
        self.kind.evaluate_label()
    }

    fn build(&mut self, builder: &mut BuildContext) {
        builder.read_texture(&self.input.mask);
        builder.write_texture(&self.output.destination);
    }

    fn execute(&mut self, ctx: &mut PassContext<'_, '_>) {
        let (Some(mask), Some(destination)) =
            (self.input.mask.handle(), self.output.destination.handle())
        else {
            return;
        };
        let (Some(mask_view), Some(destination_view)) =
            (ctx.sampled_view(mask), ctx.texture_view(destination))
        else {
            return;
        };
        let label = self.kind.evaluate_label();
        let materials = ctx.materials;
        let Some(pipeline) = materials.pipeline(self.material, 0, label) else {
            return;
        };

        draw_fullscreen(
            ctx,
            FullscreenDraw {
                label,
                pipeline,
                source: &mask_view,
                uniform: FullscreenUniform::default(),
                color: Some((
                    &destination_view,
                    wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                )),
                depth_stencil: None,
            },
        );
    }
}
