use std::any::Any;

use crate::view::frame_graph::PassContext;
use crate::view::frame_graph::builder::BuildContext;

pub mod blur_pass;
pub mod composite_pass;
pub mod depth_copy_pass;
pub mod evaluate_pass;
pub(crate) mod fullscreen;
pub mod mask_pass;
pub mod material;
pub mod texture_pool;
pub use blur_pass::{BlurDirection, BlurPass};
pub use composite_pass::{CompositeKind, CompositePass};
pub use depth_copy_pass::{
    DepthCopy, DepthCopyError, DepthCopyKey, DepthCopyPass, SharedDepthCopies, schedule_depth_copy,
};
pub use evaluate_pass::EvaluatePass;
pub use mask_pass::{ClearFlags, DepthMode, MaskPass};
pub use material::{Material, MaterialHandle, MaterialLibrary};
pub use texture_pool::TexturePool;

pub trait RenderPass {
    type Input: Default;
    type Output: Default;

    fn input(&self) -> &Self::Input;
    fn output(&self) -> &Self::Output;

    fn label(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Passes with side effects outside the graph's bookkeeping return false.
    fn allow_culling(&self) -> bool {
        true
    }

    fn build(&mut self, builder: &mut BuildContext);
    fn execute(&mut self, ctx: &mut PassContext<'_, '_>);
}

pub trait RenderPassDyn {
    fn build(&mut self, builder: &mut BuildContext);
    fn execute(&mut self, ctx: &mut PassContext<'_, '_>);
    fn label(&self) -> &str;
    fn allow_culling(&self) -> bool;
    fn as_any(&self) -> &dyn Any;
}

pub struct PassWrapper<P: RenderPass> {
    pub pass: P,
}

impl<P: RenderPass + 'static> RenderPassDyn for PassWrapper<P> {
    fn build(&mut self, builder: &mut BuildContext) {
        self.pass.build(builder);
    }

    fn execute(&mut self, ctx: &mut PassContext<'_, '_>) {
        self.pass.execute(ctx);
    }

    fn label(&self) -> &str {
        self.pass.label()
    }

    fn allow_culling(&self) -> bool {
        self.pass.allow_culling()
    }

    fn as_any(&self) -> &dyn Any {
        &self.pass
    }
}
