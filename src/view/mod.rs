pub mod frame_context;
pub mod frame_graph;
pub mod outline_feature;
pub mod render_pass;
pub mod view_target;

pub use frame_context::{FrameContext, FrameItem};
pub use outline_feature::{
    DepthCopyStatus, DepthSource, OutlineFeature, OutlineMaterials, OutlineViewReport, SkipReason,
    StylePasses,
};
pub use view_target::{TargetDescriptor, ViewId, ViewKind, ViewTargets};
