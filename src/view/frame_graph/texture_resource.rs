use super::slot::{InSlot, OutSlot, ResourceType};

/// HDR-capable format of the mask and ping-pong surfaces.
pub const MASK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// 24-bit depth plus the stencil the mask draw marks.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureDesc {
    label: &'static str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    dimension: wgpu::TextureDimension,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub(crate) u32);

#[derive(Clone, Copy, Debug)]
pub struct TextureResource;

impl ResourceType for TextureResource {
    type Handle = TextureHandle;
}

#[derive(Clone, Copy, Debug)]
pub struct MaskTag;
pub type MaskIn = InSlot<TextureResource, MaskTag>;
pub type MaskOut = OutSlot<TextureResource, MaskTag>;

#[derive(Clone, Copy, Debug)]
pub struct DepthTag;
pub type DepthIn = InSlot<TextureResource, DepthTag>;
pub type DepthOut = OutSlot<TextureResource, DepthTag>;

#[derive(Clone, Copy, Debug)]
pub struct SceneColorTag;
pub type SceneColorIn = InSlot<TextureResource, SceneColorTag>;
pub type SceneColorOut = OutSlot<TextureResource, SceneColorTag>;

impl TextureDesc {
    pub fn new(
        label: &'static str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            label,
            width: width.max(1),
            height: height.max(1),
            format,
            dimension: wgpu::TextureDimension::D2,
        }
    }

    pub fn mask(label: &'static str, width: u32, height: u32) -> Self {
        Self::new(label, width, height, MASK_FORMAT)
    }

    pub fn depth(label: &'static str, width: u32, height: u32) -> Self {
        Self::new(label, width, height, DEPTH_FORMAT)
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn dimension(&self) -> wgpu::TextureDimension {
        self.dimension
    }

    pub fn is_depth(&self) -> bool {
        self.format.is_depth_stencil_format()
    }
}
