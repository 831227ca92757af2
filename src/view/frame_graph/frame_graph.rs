use std::any::{Any, TypeId};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use super::builder::BuildContext;
use super::slot::OutSlot;
use super::texture_resource::{TextureDesc, TextureHandle, TextureResource};
use crate::view::render_pass::{
    MaterialLibrary, PassWrapper, RenderPass, RenderPassDyn, TexturePool,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PassHandle(usize);

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one graph. Texture handles only mean something inside the
/// graph that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(u64);

impl GraphId {
    fn next() -> Self {
        Self(NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

struct PassNode {
    pass: Box<dyn RenderPassDyn>,
    reads: Vec<TextureHandle>,
    writes: Vec<TextureHandle>,
}

/// Passes recorded for one view, with the textures they exchange.
///
/// Passes are versioned against the textures they touch in insertion order:
/// a read sees the latest earlier write, and a write waits for every reader
/// of the previous contents. Passes whose results nobody consumes are culled
/// at compile time unless they write an imported texture.
pub struct FrameGraph {
    id: GraphId,
    passes: Vec<PassNode>,
    textures: Vec<TextureDesc>,
    imported: Vec<bool>,
    order: Vec<usize>,
    used_textures: Vec<bool>,
    compiled: bool,
    build_errors: Vec<FrameGraphError>,
    cache: ResourceCache,
}

#[derive(Clone, Debug, Default)]
pub struct ExecuteProfile {
    pub total_ms: f64,
    pub pass_count: usize,
    pub top_passes: Vec<(String, f64)>,
}

/// Everything the host hands over to run a compiled graph.
pub struct GpuFrame<'a> {
    pub device: &'a wgpu::Device,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub materials: &'a MaterialLibrary,
    pub pool: &'a mut TexturePool,
    /// Textures bound to the handles registered with
    /// [`FrameGraph::import_texture`].
    pub imports: &'a FxHashMap<TextureHandle, wgpu::Texture>,
}

impl FrameGraph {
    pub fn new() -> Self {
        Self {
            id: GraphId::next(),
            passes: Vec::new(),
            textures: Vec::new(),
            imported: Vec::new(),
            order: Vec::new(),
            used_textures: Vec::new(),
            compiled: false,
            build_errors: Vec::new(),
            cache: ResourceCache::new(),
        }
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn add_pass<P: RenderPass + 'static>(&mut self, pass: P) -> PassHandle {
        let node = PassNode {
            pass: Box::new(PassWrapper { pass }),
            reads: Vec::new(),
            writes: Vec::new(),
        };
        let handle = PassHandle(self.passes.len());
        self.passes.push(node);
        self.compiled = false;
        handle
    }

    /// Transient texture, taken from the pool for the duration of one
    /// execution.
    pub fn declare_texture<Tag>(&mut self, desc: TextureDesc) -> OutSlot<TextureResource, Tag> {
        self.push_texture(desc, false)
    }

    /// Texture owned by the host and written before this graph runs, such as
    /// the active color or depth target.
    pub fn import_texture<Tag>(&mut self, desc: TextureDesc) -> OutSlot<TextureResource, Tag> {
        self.push_texture(desc, true)
    }

    fn push_texture<Tag>(
        &mut self,
        desc: TextureDesc,
        imported: bool,
    ) -> OutSlot<TextureResource, Tag> {
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(desc);
        self.imported.push(imported);
        self.compiled = false;
        OutSlot::with_handle(handle)
    }

    pub fn texture_desc(&self, handle: TextureHandle) -> Option<TextureDesc> {
        self.textures.get(handle.0 as usize).copied()
    }

    pub fn is_imported(&self, handle: TextureHandle) -> bool {
        self.imported.get(handle.0 as usize).copied().unwrap_or(false)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Pass labels in the order the passes were added.
    pub fn pass_labels(&self) -> Vec<&str> {
        self.passes.iter().map(|node| node.pass.label()).collect()
    }

    /// Labels of the passes that survived culling, in execution order.
    pub fn compiled_labels(&self) -> Vec<&str> {
        self.order
            .iter()
            .map(|&index| self.passes[index].pass.label())
            .collect()
    }

    pub fn passes<P: RenderPass + 'static>(&self) -> impl Iterator<Item = &P> + '_ {
        self.passes
            .iter()
            .filter_map(|node| node.pass.as_any().downcast_ref::<P>())
    }

    pub fn compile(&mut self) -> Result<(), FrameGraphError> {
        self.order.clear();
        self.compiled = false;

        let mut build_errors: Vec<FrameGraphError> = Vec::new();
        for node in &mut self.passes {
            node.reads.clear();
            node.writes.clear();
            let mut builder = BuildContext {
                reads: &mut node.reads,
                writes: &mut node.writes,
                build_errors: &mut build_errors,
            };
            node.pass.build(&mut builder);
        }
        self.build_errors = build_errors;

        if let Some(err) = self.build_errors.pop() {
            return Err(err);
        }

        let pass_count = self.passes.len();
        let mut last_writer: FxHashMap<TextureHandle, usize> = FxHashMap::default();
        let mut readers: FxHashMap<TextureHandle, Vec<usize>> = FxHashMap::default();
        let mut graph_edges: Vec<FxHashSet<usize>> = vec![FxHashSet::default(); pass_count];
        let mut producers: Vec<Vec<usize>> = vec![Vec::new(); pass_count];

        for (index, node) in self.passes.iter().enumerate() {
            for &handle in node.reads.iter().chain(node.writes.iter()) {
                if handle.0 as usize >= self.textures.len() {
                    return Err(FrameGraphError::UnknownTexture(handle.0));
                }
            }

            for &handle in &node.reads {
                match last_writer.get(&handle) {
                    Some(&writer) if writer != index => {
                        graph_edges[writer].insert(index);
                        producers[index].push(writer);
                    }
                    Some(_) => {}
                    None if self.imported[handle.0 as usize] => {}
                    None => {
                        return Err(FrameGraphError::ReadBeforeWrite {
                            pass: node.pass.label().to_string(),
                            texture: self.textures[handle.0 as usize].label(),
                        });
                    }
                }
                readers.entry(handle).or_default().push(index);
            }

            for &handle in &node.writes {
                if let Some(&writer) = last_writer.get(&handle) {
                    if writer != index {
                        graph_edges[writer].insert(index);
                    }
                }
                if let Some(previous_readers) = readers.remove(&handle) {
                    for reader in previous_readers {
                        if reader != index {
                            graph_edges[reader].insert(index);
                        }
                    }
                }
                last_writer.insert(handle, index);
            }
        }

        // Producers always precede their consumers, so one backwards sweep
        // settles liveness.
        let mut live = vec![false; pass_count];
        for index in (0..pass_count).rev() {
            let node = &self.passes[index];
            if !node.pass.allow_culling()
                || node.writes.iter().any(|handle| self.imported[handle.0 as usize])
            {
                live[index] = true;
            }
            if live[index] {
                for &producer in &producers[index] {
                    live[producer] = true;
                }
            }
        }

        let mut indegree = vec![0usize; pass_count];
        for edges in &graph_edges {
            for &to in edges {
                indegree[to] += 1;
            }
        }

        let mut queue: BinaryHeap<Reverse<usize>> = indegree
            .iter()
            .enumerate()
            .filter_map(|(idx, &deg)| if deg == 0 { Some(Reverse(idx)) } else { None })
            .collect();

        let mut sorted = Vec::with_capacity(pass_count);
        while let Some(Reverse(n)) = queue.pop() {
            sorted.push(n);
            for &m in &graph_edges[n] {
                indegree[m] -= 1;
                if indegree[m] == 0 {
                    queue.push(Reverse(m));
                }
            }
        }

        if sorted.len() != pass_count {
            return Err(FrameGraphError::CyclicDependency);
        }

        self.order = sorted.into_iter().filter(|&index| live[index]).collect();

        self.used_textures = vec![false; self.textures.len()];
        for &index in &self.order {
            let node = &self.passes[index];
            for handle in node.reads.iter().chain(node.writes.iter()) {
                self.used_textures[handle.0 as usize] = true;
            }
        }

        let culled = pass_count - self.order.len();
        if culled > 0 {
            tracing::debug!(culled, "frame graph culled passes with unused results");
        }

        self.compiled = true;
        Ok(())
    }

    pub fn execute(&mut self, frame: GpuFrame<'_>) -> Result<ExecuteProfile, FrameGraphError> {
        if !self.compiled {
            return Err(FrameGraphError::NotCompiled);
        }
        let GpuFrame {
            device,
            encoder,
            materials,
            pool,
            imports,
        } = frame;
        let execute_started_at = Instant::now();

        let mut views: Vec<Option<ResolvedTexture>> = Vec::with_capacity(self.textures.len());
        for (index, desc) in self.textures.iter().enumerate() {
            let handle = TextureHandle(index as u32);
            let texture = if !self.used_textures[index] {
                None
            } else if self.imported[index] {
                let texture = imports.get(&handle).cloned();
                if texture.is_none() {
                    tracing::warn!(texture = desc.label(), "imported texture is not bound");
                }
                texture
            } else {
                Some(pool.acquire(device, desc))
            };
            views.push(texture.map(|texture| ResolvedTexture::new(&texture, desc)));
        }

        let mut pass_timings: FxHashMap<String, f64> = FxHashMap::default();
        let mut ctx = PassContext {
            device,
            encoder,
            materials,
            textures: &self.textures,
            views: &views,
            cache: &mut self.cache,
        };
        for &index in &self.order {
            let node = &mut self.passes[index];
            let pass_name = node.pass.label().to_string();
            tracing::trace!(pass = %pass_name, "executing pass");
            let pass_started_at = Instant::now();
            let result = catch_unwind(AssertUnwindSafe(|| {
                node.pass.execute(&mut ctx);
            }));
            let elapsed_ms = pass_started_at.elapsed().as_secs_f64() * 1000.0;
            *pass_timings.entry(pass_name.clone()).or_insert(0.0) += elapsed_ms;
            if let Err(payload) = result {
                let detail = if let Some(message) = payload.downcast_ref::<&str>() {
                    *message
                } else if let Some(message) = payload.downcast_ref::<String>() {
                    message.as_str()
                } else {
                    "unknown panic payload"
                };
                tracing::warn!(pass = %pass_name, detail, "render pass panicked and was skipped");
            }
        }
        pool.release_all();

        let mut top_passes: Vec<(String, f64)> = pass_timings.into_iter().collect();
        top_passes.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        top_passes.truncate(6);
        Ok(ExecuteProfile {
            total_ms: execute_started_at.elapsed().as_secs_f64() * 1000.0,
            pass_count: self.order.len(),
            top_passes,
        })
    }
}

impl Default for FrameGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Views of one texture resolved for execution. Combined depth-stencil
/// formats can only be sampled through a depth-only view.
pub struct ResolvedTexture {
    attachment: wgpu::TextureView,
    sampled: wgpu::TextureView,
}

impl ResolvedTexture {
    fn new(texture: &wgpu::Texture, desc: &TextureDesc) -> Self {
        let attachment = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(desc.label()),
            ..Default::default()
        });
        let sampled = if desc.is_depth() {
            texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some(desc.label()),
                aspect: wgpu::TextureAspect::DepthOnly,
                ..Default::default()
            })
        } else {
            attachment.clone()
        };
        Self {
            attachment,
            sampled,
        }
    }
}

pub struct PassContext<'a, 'b> {
    pub device: &'a wgpu::Device,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub materials: &'a MaterialLibrary,
    pub textures: &'b [TextureDesc],
    pub views: &'b [Option<ResolvedTexture>],
    pub cache: &'b mut ResourceCache,
}

impl<'a, 'b> PassContext<'a, 'b> {
    /// View for use as a render attachment.
    pub fn texture_view(&self, handle: TextureHandle) -> Option<wgpu::TextureView> {
        let resolved = self.views.get(handle.0 as usize)?.as_ref()?;
        Some(resolved.attachment.clone())
    }

    /// View for binding as a sampled texture.
    pub fn sampled_view(&self, handle: TextureHandle) -> Option<wgpu::TextureView> {
        let resolved = self.views.get(handle.0 as usize)?.as_ref()?;
        Some(resolved.sampled.clone())
    }

    pub fn texture_desc(&self, handle: TextureHandle) -> Option<TextureDesc> {
        self.textures.get(handle.0 as usize).copied()
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum FrameGraphError {
    #[error("missing input: {0}")]
    MissingInput(&'static str),
    #[error("missing output: {0}")]
    MissingOutput(&'static str),
    #[error("pass `{pass}` reads `{texture}` before any pass writes it")]
    ReadBeforeWrite { pass: String, texture: &'static str },
    #[error("texture handle {0} does not belong to this graph")]
    UnknownTexture(u32),
    #[error("frame graph contains a dependency cycle")]
    CyclicDependency,
    #[error("frame graph must be compiled before it is executed")]
    NotCompiled,
}

/// GPU objects shared by the passes of one graph, keyed by type and a
/// per-pass constant.
pub struct ResourceCache {
    store: FxHashMap<(TypeId, u64), Box<dyn Any>>,
}

impl ResourceCache {
    fn new() -> Self {
        Self {
            store: FxHashMap::default(),
        }
    }

    pub fn get_or_insert_with<T: 'static, F: FnOnce() -> T>(
        &mut self,
        key: u64,
        create: F,
    ) -> &mut T {
        self.store
            .entry((TypeId::of::<T>(), key))
            .or_insert_with(|| Box::new(create()))
            .downcast_mut::<T>()
            .expect("resource cache entries are keyed by their type")
    }
}
