use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// Opaque id of a host material. Styles and passes carry handles; pipelines
/// are only looked up when the graph executes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialHandle(u32);

impl MaterialHandle {
    pub const fn from_raw(id: u32) -> Self {
        Self(id)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Host-compiled shader passes. Full-screen passes bind group 0 as
/// `{0: source view, 1: sampler, 2: uniform block}`.
pub struct Material {
    label: SmolStr,
    passes: Vec<wgpu::RenderPipeline>,
}

impl Material {
    pub fn new(label: impl Into<SmolStr>, passes: Vec<wgpu::RenderPipeline>) -> Self {
        Self {
            label: label.into(),
            passes,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pass(&self, index: usize) -> Option<&wgpu::RenderPipeline> {
        self.passes.get(index)
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }
}

#[derive(Default)]
pub struct MaterialLibrary {
    materials: FxHashMap<MaterialHandle, Material>,
    names: FxHashMap<SmolStr, MaterialHandle>,
    next_id: u32,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, material: Material) -> MaterialHandle {
        let handle = MaterialHandle(self.next_id);
        self.next_id += 1;
        if let Some(previous) = self.names.insert(material.label.clone(), handle) {
            tracing::debug!(
                material = %material.label,
                previous = previous.raw(),
                "material name now refers to a newer material"
            );
        }
        self.materials.insert(handle, material);
        handle
    }

    pub fn remove(&mut self, handle: MaterialHandle) -> Option<Material> {
        let material = self.materials.remove(&handle)?;
        if self.names.get(&material.label) == Some(&handle) {
            self.names.remove(&material.label);
        }
        Some(material)
    }

    pub fn get(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(&handle)
    }

    pub fn handle_by_name(&self, name: &str) -> Option<MaterialHandle> {
        self.names.get(name).copied()
    }

    /// Pipeline for one shader pass, warning when the material or pass is
    /// missing so the caller can simply skip its draw.
    pub(crate) fn pipeline(
        &self,
        handle: MaterialHandle,
        pass: usize,
        user: &str,
    ) -> Option<&wgpu::RenderPipeline> {
        let Some(material) = self.get(handle) else {
            tracing::warn!(
                pass = user,
                material = handle.raw(),
                "material is not registered, skipping pass"
            );
            return None;
        };
        let pipeline = material.pass(pass);
        if pipeline.is_none() {
            tracing::warn!(
                pass = user,
                material = material.label(),
                shader_pass = pass,
                available = material.pass_count(),
                "material has no such shader pass, skipping pass"
            );
        }
        pipeline
    }
}
