use crate::view::frame_graph::PassContext;
use crate::view::frame_graph::builder::BuildContext;
use crate::view::frame_graph::texture_resource::{DepthIn, MaskIn, SceneColorIn, SceneColorOut};
use crate::view::render_pass::RenderPass;
use crate::view::render_pass::fullscreen::{
    FullscreenDraw, FullscreenUniform, draw_fullscreen, read_only_depth,
};
use crate::view::render_pass::material::MaterialHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompositeKind {
    Outline,
    Infill,
}

impl CompositeKind {
    /// Utility material pass that blends this contribution into scene color.
    pub fn shader_pass(self) -> usize {
        match self {
            CompositeKind::Outline => 2,
            CompositeKind::Infill => 3,
        }
    }

    pub fn evaluate_label(self) -> &'static str {
        match self {
            CompositeKind::Outline => "Outline Render",
            CompositeKind::Infill => "Infill Render",
        }
    }

    pub fn composite_label(self) -> &'static str {
        match self {
            CompositeKind::Outline => "Outline Composite",
            CompositeKind::Infill => "Infill Composite",
        }
    }
}

/// Blends an evaluated outline or infill into the scene color, with the
/// style's depth surface attached read-only as the occlusion guard.
pub struct CompositePass {
    kind: CompositeKind,
    utility: MaterialHandle,
    input: CompositeInput,
    output: CompositeOutput,
}

#[derive(Default)]
pub struct CompositeInput {
    pub source: MaskIn,
    pub depth: DepthIn,
    pub scene_color: SceneColorIn,
}

#[derive(Default)]
pub struct CompositeOutput {
    pub scene_color: SceneColorOut,
}

impl CompositePass {
    pub fn new(
        kind: CompositeKind,
        utility: MaterialHandle,
        source: MaskIn,
        depth: DepthIn,
        scene_color: SceneColorOut,
    ) -> Self {
        Self {
            kind,
            utility,
            input: CompositeInput {
                source,
                depth,
                scene_color: scene_color.reader(),
            },
            output: CompositeOutput { scene_color },
        }
    }

    pub fn kind(&self) -> CompositeKind {
        self.kind
    }
}

impl RenderPass for CompositePass {
    type Input = CompositeInput;
    type Output = CompositeOutput;

    fn input(&self) -> &Self::Input {
        &self.input
    }

    fn output(&self) -> &Self::Output {
        &self.output
    }

    fn label(&self) -> &str {
        self.kind.composite_label()
    }

    fn allow_culling(&self) -> bool {
        false
    }

    fn build(&mut self, builder: &mut BuildContext) {
        builder.read_texture(&self.input.source);
        builder.read_texture(&self.input.depth);
        builder.read_write_texture(&self.input.scene_color, &self.output.scene_color);
    }

    fn execute(&mut self, ctx: &mut PassContext<'_, '_>) {
        let (Some(source), Some(depth), Some(scene_color)) = (
            self.input.source.handle(),
            self.input.depth.handle(),
            self.output.scene_color.handle(),
        ) else {
            return;
        };
        let (Some(source_view), Some(depth_view), Some(scene_color_view)) = (
            ctx.sampled_view(source),
            ctx.texture_view(depth),
            ctx.texture_view(scene_color),
        ) else {
            return;
        };
        let label = self.kind.composite_label();
        let materials = ctx.materials;
        let Some(pipeline) = materials.pipeline(self.utility, self.kind.shader_pass(), label) else {
            return;
        };

        draw_fullscreen(
            ctx,
            FullscreenDraw {
                label,
                pipeline,
                source: &source_view,
                uniform: FullscreenUniform::default(),
                color: Some((&scene_color_view, wgpu::LoadOp::Load)),
                depth_stencil: Some(read_only_depth(&depth_view)),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_use_their_own_utility_pass_and_labels() {
        assert_eq!(CompositeKind::Outline.shader_pass(), 2);
        assert_eq!(CompositeKind::Infill.shader_pass(), 3);
        assert_eq!(CompositeKind::Outline.evaluate_label(), "Outline Render");
        assert_eq!(CompositeKind::Infill.composite_label(), "Infill Composite");
    }
}
