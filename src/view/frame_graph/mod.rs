pub(crate) mod builder;
mod frame_graph;
pub(crate) mod slot;
pub(crate) mod texture_resource;

pub use builder::BuildContext;
pub use frame_graph::{
    ExecuteProfile, FrameGraph, FrameGraphError, GpuFrame, GraphId, PassContext, PassHandle,
    ResolvedTexture, ResourceCache,
};
pub use slot::{InSlot, OutSlot, ResourceType};
pub use texture_resource::{
    DEPTH_FORMAT, DepthIn, DepthOut, DepthTag, MASK_FORMAT, MaskIn, MaskOut, MaskTag,
    SceneColorIn, SceneColorOut, SceneColorTag, TextureDesc, TextureHandle, TextureResource,
};
