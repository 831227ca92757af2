use glam::Vec2;
use smol_str::SmolStr;

use crate::outline::{
    GroupingDiagnostic, OutlineRegistry, OutlineSettings, StyleId, group_renderers,
};
use crate::view::frame_context::FrameContext;
use crate::view::frame_graph::{DepthOut, FrameGraph, MaskOut, SceneColorOut, TextureDesc};
use crate::view::render_pass::{
    BlurDirection, BlurPass, CompositeKind, CompositePass, DepthCopy, DepthCopyError, DepthMode,
    EvaluatePass, MaskPass, MaterialHandle, SharedDepthCopies, schedule_depth_copy,
};
use crate::view::view_target::{ViewId, ViewKind, ViewTargets};

/// Materials the feature needs besides the per-style ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutlineMaterials {
    /// Blur, composite and mask-draw passes.
    pub utility: MaterialHandle,
    /// Writes scene depth into the shared copy. Without it occluding styles
    /// fall back to private depth.
    pub copy_depth: Option<MaterialHandle>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    NoGroups,
    ViewKind(ViewKind),
    BackBufferTarget,
    EmptyTarget,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DepthCopyStatus {
    NotRequested,
    Scheduled,
    Reused,
    Unavailable(DepthCopyError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthSource {
    SceneCopy,
    Private,
}

/// What was recorded for one style group.
#[derive(Clone, Debug, PartialEq)]
pub struct StylePasses {
    pub style: StyleId,
    pub name: SmolStr,
    pub entries: usize,
    pub blur_extent: Vec2,
    pub depth_source: DepthSource,
    pub composites: Vec<CompositeKind>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutlineViewReport {
    pub view: ViewId,
    /// The view's color target, unchanged in identity.
    pub scene_color: SceneColorOut,
    pub skipped: Option<SkipReason>,
    pub depth_copy: DepthCopyStatus,
    pub styles: Vec<StylePasses>,
    pub diagnostics: Vec<GroupingDiagnostic>,
    pub passes_added: usize,
}

impl OutlineViewReport {
    fn new(view: &ViewTargets) -> Self {
        Self {
            view: view.id,
            scene_color: view.color,
            skipped: None,
            depth_copy: DepthCopyStatus::NotRequested,
            styles: Vec::new(),
            diagnostics: Vec::new(),
            passes_added: 0,
        }
    }

    fn skip(mut self, reason: SkipReason) -> Self {
        self.skipped = Some(reason);
        self
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }
}

/// Records the outline passes for every eligible view.
pub struct OutlineFeature {
    settings: OutlineSettings,
    materials: OutlineMaterials,
    back_buffer_reported: bool,
}

impl OutlineFeature {
    pub fn new(settings: OutlineSettings, materials: OutlineMaterials) -> Self {
        Self {
            settings,
            materials,
            back_buffer_reported: false,
        }
    }

    pub fn settings(&self) -> &OutlineSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: OutlineSettings) {
        self.settings = settings;
    }

    pub fn materials(&self) -> OutlineMaterials {
        self.materials
    }

    /// Groups the registry and adds this view's passes to `graph`. Failures
    /// degrade the effect and are described in the returned report; none
    /// of them are errors for the host.
    pub fn add_passes(
        &mut self,
        registry: &OutlineRegistry,
        view: &ViewTargets,
        graph: &mut FrameGraph,
        context: &mut FrameContext,
    ) -> OutlineViewReport {
        let groups = group_renderers(registry);
        let mut report = OutlineViewReport::new(view);
        report.diagnostics = groups.diagnostics().to_vec();

        if !view.kind.is_renderable() {
            return report.skip(SkipReason::ViewKind(view.kind));
        }
        if groups.is_empty() {
            return report.skip(SkipReason::NoGroups);
        }
        if view.color_is_back_buffer {
            if self.back_buffer_reported {
                tracing::debug!(
                    view = view.id.0,
                    "view renders to the back buffer, skipping outlines"
                );
            } else {
                self.back_buffer_reported = true;
                tracing::warn!(
                    view = view.id.0,
                    "outlines need an intermediate color target, skipping views that render \
                     straight to the back buffer"
                );
            }
            return report.skip(SkipReason::BackBufferTarget);
        }
        if view.descriptor.is_empty() {
            return report.skip(SkipReason::EmptyTarget);
        }

        let passes_before = graph.pass_count();
        let scene_depth = if groups.requested_depth_copy() {
            self.copy_scene_depth(view, graph, context, &mut report)
        } else {
            None
        };

        let (width, height) = (view.descriptor.width, view.descriptor.height);
        let mask_a: MaskOut =
            graph.declare_texture(TextureDesc::mask("Outline Texture 1", width, height));
        let mask_b: MaskOut =
            graph.declare_texture(TextureDesc::mask("Outline Texture 2", width, height));
        let mut private_depth: Option<DepthOut> = None;
        let mut fallback_reported = false;

        for group in groups.iter() {
            let style = group.style();
            let wants_scene_depth = style.use_scene_depth_for_occlusion();
            let (depth, depth_mode, depth_source) = match scene_depth {
                Some(copy) if wants_scene_depth => {
                    (copy, DepthMode::SceneCopy, DepthSource::SceneCopy)
                }
                _ => {
                    if wants_scene_depth && !fallback_reported {
                        fallback_reported = true;
                        tracing::warn!(
                            view = view.id.0,
                            style = style.name(),
                            "scene depth copy unavailable, drawing occluding outlines unoccluded"
                        );
                    }
                    let depth = *private_depth.get_or_insert_with(|| {
                        graph.declare_texture(TextureDesc::depth(
                            "Outline Temp Depth",
                            width,
                            height,
                        ))
                    });
                    (depth, DepthMode::Private, DepthSource::Private)
                }
            };

            let blur_extent = style.blur_extent(width, height);
            graph.add_pass(MaskPass::new(
                group.entries().to_vec(),
                blur_extent,
                self.materials.utility,
                mask_a,
                depth,
                depth_mode,
            ));
            graph.add_pass(BlurPass::new(
                BlurDirection::Vertical,
                self.materials.utility,
                blur_extent,
                mask_a.reader(),
                mask_b,
            ));
            graph.add_pass(BlurPass::new(
                BlurDirection::Horizontal,
                self.materials.utility,
                blur_extent,
                mask_b.reader(),
                mask_a,
            ));

            let mut composites = Vec::with_capacity(2);
            let materials = [
                (CompositeKind::Outline, style.outline_material()),
                (CompositeKind::Infill, style.infill_material()),
            ];
            for (kind, material) in materials {
                let Some(material) = material else {
                    continue;
                };
                graph.add_pass(EvaluatePass::new(kind, material, mask_a.reader(), mask_b));
                graph.add_pass(CompositePass::new(
                    kind,
                    self.materials.utility,
                    mask_b.reader(),
                    depth.reader(),
                    view.color,
                ));
                composites.push(kind);
            }

            report.styles.push(StylePasses {
                style: style.id(),
                name: style.name().into(),
                entries: group.entries().len(),
                blur_extent,
                depth_source,
                composites,
            });
        }

        report.passes_added = graph.pass_count() - passes_before;
        tracing::debug!(
            view = view.id.0,
            styles = report.styles.len(),
            passes = report.passes_added,
            depth_copy = ?report.depth_copy,
            "recorded outline passes"
        );
        report
    }

    fn copy_scene_depth(
        &self,
        view: &ViewTargets,
        graph: &mut FrameGraph,
        context: &mut FrameContext,
        report: &mut OutlineViewReport,
    ) -> Option<DepthOut> {
        let shared = context.get_or_create::<SharedDepthCopies>();
        match schedule_depth_copy(
            graph,
            shared,
            view,
            self.settings.injection_point,
            self.materials.copy_depth,
        ) {
            Ok(DepthCopy::Scheduled(copy)) => {
                report.depth_copy = DepthCopyStatus::Scheduled;
                Some(copy)
            }
            Ok(DepthCopy::Reused(copy)) => {
                report.depth_copy = DepthCopyStatus::Reused;
                Some(copy)
            }
            Err(err) => {
                match &err {
                    DepthCopyError::SourceInvalid(_) => {
                        tracing::warn!(
                            view = view.id.0,
                            "scene depth is invalid, skipping depth copy"
                        );
                    }
                    _ => {
                        tracing::error!(
                            view = view.id.0,
                            injection_point = ?self.settings.injection_point,
                            error = %err,
                            "failed to copy scene depth for outlines"
                        );
                    }
                }
                report.depth_copy = DepthCopyStatus::Unavailable(err);
                None
            }
        }
    }
}
