use serde::{Deserialize, Serialize};

/// Point in the host's frame at which the outline passes are recorded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionPoint {
    BeforeRenderingOpaques,
    AfterRenderingOpaques,
    BeforeRenderingTransparents,
    AfterRenderingTransparents,
    #[default]
    BeforeRenderingPostProcessing,
    AfterRenderingPostProcessing,
    AfterRendering,
}

impl InjectionPoint {
    /// Whether the scene depth attachment can be sampled for a copy here.
    /// Nothing has written depth before the opaques, and after rendering the
    /// attachment has already been resolved away.
    pub fn supports_depth_copy(self) -> bool {
        !matches!(
            self,
            InjectionPoint::BeforeRenderingOpaques | InjectionPoint::AfterRendering
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineSettings {
    pub injection_point: InjectionPoint,
}

impl OutlineSettings {
    pub fn new(injection_point: InjectionPoint) -> Self {
        Self { injection_point }
    }
}
