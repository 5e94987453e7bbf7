//! Platform-agnostic core module - shared between WASM dashboard and CLI

pub mod format;
pub mod monitor;
pub mod parser;
pub mod reconciler;
pub mod scale;
pub mod series;
pub mod snapshot;
pub mod sort;
pub mod sparkline;
pub mod template;

pub use monitor::{ClusterMonitor, ConfigError, Dispatch, MonitorConfig};
pub use parser::{parse_event, StreamEvent};
pub use reconciler::{Circle, Reconciler, Transition, VisualElement};
pub use scale::{CircuitScales, Rgb};
pub use series::{RollingSeries, Sample};
pub use snapshot::{preprocess, DerivedSnapshot, RawSnapshot, ValidationError};
pub use sort::{SortDirection, SortMetric, SortState};
pub use sparkline::{PathSegment, TrendPath};
pub use template::{ElementTemplate, RenderContext, TextTemplate};
