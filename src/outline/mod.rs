//! Outline domain records: which objects are outlined, how, and how they
//! collapse into per-style groups each frame.

pub mod config;
pub mod grouping;
pub mod registry;
pub mod settings;
pub mod style;

pub use config::{ConfigError, OutlineConfig, StyleConfig};
pub use grouping::{GroupingDiagnostic, RendererEntry, RendererGroups, StyleGroup, group_renderers};
pub use registry::{Drawable, ObjectKey, OutlineObject, OutlineRegistry};
pub use settings::{InjectionPoint, OutlineSettings};
pub use style::{StyleDefinition, StyleId};
