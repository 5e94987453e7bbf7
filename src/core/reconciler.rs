//! Visual reconciler: keeps one element per live circuit in sync with the stream
//!
//! Per circuit the state is either absent or live:
//! - absent + upsert -> element created (caller re-sorts)
//! - live + upsert   -> element updated in place
//! - live + delete   -> element and its series dropped
//! - absent + delete -> nothing

use std::collections::HashMap;

use tracing::{debug, trace};

use super::format::Formatters;
use super::scale::{CircuitScales, Rgb};
use super::series::RollingSeries;
use super::snapshot::DerivedSnapshot;
use super::sparkline::TrendPath;
use super::template::{ElementTemplate, RenderContext, TextTemplate};

/// Circle position (percent of the panel) and size (pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    pub fill: Rgb,
}

/// Values the sort controller reads without re-deriving anything
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SortKeys {
    pub rate_value: f64,
    pub error_then_volume: f64,
}

/// On-screen model of one circuit
#[derive(Debug, Clone)]
pub struct VisualElement {
    pub key: String,
    pub snapshot: DerivedSnapshot,
    pub sort_keys: SortKeys,
    pub circle: Circle,
    /// Color of the error percentage text
    pub error_color: Rgb,
    pub trend: TrendPath,
    /// Rendered once at creation
    pub header: String,
    /// Re-rendered on every upsert
    pub body: String,
    series: RollingSeries,
}

impl VisualElement {
    pub fn series(&self) -> &RollingSeries {
        &self.series
    }
}

/// Result of applying an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Created,
    Updated,
}

pub struct Reconciler {
    elements: HashMap<String, VisualElement>,
    /// Display order; new elements append until the next sort
    order: Vec<String>,
    scales: CircuitScales,
    formatters: Formatters,
    template: Box<dyn ElementTemplate>,
    include_detail_icon: bool,
    /// Cleared once the first element arrives
    loading: bool,
}

impl Reconciler {
    pub fn new(include_detail_icon: bool) -> Self {
        Self::with_template(include_detail_icon, Box::new(TextTemplate))
    }

    pub fn with_template(include_detail_icon: bool, template: Box<dyn ElementTemplate>) -> Self {
        Self {
            elements: HashMap::new(),
            order: Vec::new(),
            scales: CircuitScales::default(),
            formatters: Formatters,
            template,
            include_detail_icon,
            loading: true,
        }
    }

    /// Create or update the element for `snapshot`
    pub fn upsert(&mut self, mut snapshot: DerivedSnapshot, now_ms: i64) -> Transition {
        let key = snapshot.sanitized_key.clone();
        let seed = snapshot.seed_series.take();

        let ctx = RenderContext {
            snapshot: &snapshot,
            formatters: &self.formatters,
            include_detail_icon: self.include_detail_icon,
        };
        let body = self.template.render_body(&ctx);
        let circle = self.circle_for(&snapshot);
        let error_color = self.scales.error_color.map(snapshot.error_percentage);
        let sort_keys = SortKeys {
            rate_value: snapshot.request_rate,
            error_then_volume: snapshot.error_volume_composite_key,
        };

        let transition = match self.elements.get_mut(&key) {
            Some(element) => {
                element.snapshot = snapshot;
                element.body = body;
                Transition::Updated
            }
            None => {
                let header = self.template.render_container(&ctx);
                if self.loading {
                    debug!("First circuit received, leaving loading state");
                    self.loading = false;
                }
                self.order.push(key.clone());
                self.elements.insert(
                    key.clone(),
                    VisualElement {
                        key: key.clone(),
                        snapshot,
                        sort_keys,
                        circle,
                        error_color,
                        trend: TrendPath::empty(),
                        header,
                        body,
                        series: RollingSeries::new(),
                    },
                );
                debug!(cluster = %key, total = self.order.len(), "Circuit element created");
                Transition::Created
            }
        };

        let Some(element) = self.elements.get_mut(&key) else {
            return transition;
        };
        element.sort_keys = sort_keys;
        element.circle = circle;
        element.error_color = error_color;

        match seed {
            Some(samples) => element.series.replace_all(samples),
            None => element.series.append(element.snapshot.request_rate, now_ms),
        }
        update_trend(element, now_ms);

        trace!(
            cluster = %key,
            ?transition,
            rate = element.sort_keys.rate_value,
            radius = element.circle.radius,
            samples = element.series.len(),
            "Circuit reconciled"
        );
        transition
    }

    /// Remove the element for `key`; returns false if it was not live
    pub fn delete(&mut self, key: &str) -> bool {
        if self.elements.remove(key).is_none() {
            trace!(cluster = %key, "Delete for unknown circuit ignored");
            return false;
        }
        self.order.retain(|k| k != key);
        debug!(cluster = %key, total = self.order.len(), "Circuit element removed");
        true
    }

    fn circle_for(&self, snapshot: &DerivedSnapshot) -> Circle {
        let rate = snapshot.rate_per_second_per_host;
        Circle {
            cx: self.scales.x.map(rate),
            cy: self.scales.y.map(rate),
            radius: self.scales.radius.map(rate),
            fill: self.scales.load_color.map(snapshot.error_percentage),
        }
    }

    pub fn get(&self, key: &str) -> Option<&VisualElement> {
        self.elements.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.elements.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Keys in display order
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Elements in display order
    pub fn iter(&self) -> impl Iterator<Item = &VisualElement> {
        self.order.iter().filter_map(|k| self.elements.get(k))
    }

    /// Split borrow for sorting: the element map is read while the key list is reordered
    pub(crate) fn order_and_elements(&mut self) -> (&mut Vec<String>, &HashMap<String, VisualElement>) {
        (&mut self.order, &self.elements)
    }

    /// Drop every element (monitor teardown)
    pub fn clear(&mut self) {
        self.elements.clear();
        self.order.clear();
    }
}

/// Rebuild the trend path; a lone zero keeps the previous path
fn update_trend(element: &mut VisualElement, now_ms: i64) {
    if element.series.should_suppress() {
        trace!(cluster = %element.key, "Single zero sample, trend line skipped");
        return;
    }
    element.series.apply_leading_zero_rule();
    element.trend = TrendPath::from_series(&element.series, now_ms);
}
