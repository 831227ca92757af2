//! Screen-space outline and infill highlighting recorded into a wgpu frame
//! graph.
//!
//! Each frame the host resets a [`FrameContext`], then for every view
//! imports its color and depth targets into a [`FrameGraph`], calls
//! [`OutlineFeature::add_passes`], compiles the graph and executes it.

pub mod outline;
pub mod view;

pub use outline::{
    ConfigError, Drawable, InjectionPoint, ObjectKey, OutlineConfig, OutlineObject,
    OutlineRegistry, OutlineSettings, StyleDefinition, StyleId,
};
pub use view::frame_graph::{self, FrameGraph, FrameGraphError, GpuFrame};
pub use view::render_pass::{self, Material, MaterialHandle, MaterialLibrary, TexturePool};
pub use view::{
    FrameContext, FrameItem, OutlineFeature, OutlineMaterials, OutlineViewReport, TargetDescriptor,
    ViewId, ViewKind, ViewTargets,
};

#[cfg(test)]
pub(crate) mod test_support;
