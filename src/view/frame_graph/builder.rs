use super::frame_graph::FrameGraphError;
use super::slot::{InSlot, OutSlot};
use super::texture_resource::{TextureHandle, TextureResource};

/// Handed to [`RenderPass::build`](crate::view::render_pass::RenderPass::build)
/// so a pass can declare which textures it samples or attaches and which it
/// writes. Declaration order inside one pass does not matter.
pub struct BuildContext<'a> {
    pub(crate) reads: &'a mut Vec<TextureHandle>,
    pub(crate) writes: &'a mut Vec<TextureHandle>,
    pub(crate) build_errors: &'a mut Vec<FrameGraphError>,
}

impl<'a> BuildContext<'a> {
    pub fn read_texture<Tag>(&mut self, input: &InSlot<TextureResource, Tag>) {
        match input.handle {
            Some(handle) => {
                if !self.reads.contains(&handle) {
                    self.reads.push(handle);
                }
            }
            None => {
                self.build_errors
                    .push(FrameGraphError::MissingInput("texture slot has no handle"));
            }
        }
    }

    pub fn write_texture<Tag>(&mut self, output: &OutSlot<TextureResource, Tag>) {
        match output.handle {
            Some(handle) => {
                if !self.writes.contains(&handle) {
                    self.writes.push(handle);
                }
            }
            None => {
                self.build_errors
                    .push(FrameGraphError::MissingOutput("texture slot has no handle"));
            }
        }
    }

    /// Attachment that is loaded and stored, e.g. a depth-stencil surface the
    /// pass tests against and marks.
    pub fn read_write_texture<Tag>(
        &mut self,
        input: &InSlot<TextureResource, Tag>,
        output: &OutSlot<TextureResource, Tag>,
    ) {
        self.read_texture(input);
        self.write_texture(output);
    }
}
