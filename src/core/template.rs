//! Element templates: turn a derived snapshot into the element's body text
//!
//! Templates only see the snapshot, the fixed formatter set and display
//! options; they never carry state between calls.

use std::fmt::Write as _;

use super::format::Formatters;
use super::snapshot::DerivedSnapshot;

/// Everything a template may read while rendering one element
pub struct RenderContext<'a> {
    pub snapshot: &'a DerivedSnapshot,
    pub formatters: &'a Formatters,
    pub include_detail_icon: bool,
}

/// Rendering collaborator for circuit elements
pub trait ElementTemplate {
    /// Rendered once when the element is created (header / detail link)
    fn render_container(&self, ctx: &RenderContext<'_>) -> String;

    /// Rendered on every upsert (live figures)
    fn render_body(&self, ctx: &RenderContext<'_>) -> String;
}

/// Plain-text template used by the CLI and the egui panels
#[derive(Debug, Clone, Copy, Default)]
pub struct TextTemplate;

impl ElementTemplate for TextTemplate {
    fn render_container(&self, ctx: &RenderContext<'_>) -> String {
        let snap = ctx.snapshot;
        match (&snap.dashboard_url, ctx.include_detail_icon) {
            (Some(url), true) => format!("{} [details: {}]", snap.name, url),
            _ => snap.name.clone(),
        }
    }

    fn render_body(&self, ctx: &RenderContext<'_>) -> String {
        let snap = ctx.snapshot;
        let f = ctx.formatters;
        let mut out = String::new();

        // Writing to a String cannot fail
        let _ = writeln!(
            out,
            "{} rps  {} rps/host  {}% err",
            f.add_commas(f.round_number(snap.rate_per_second)),
            f.add_commas(f.round_number(snap.rate_per_second_per_host)),
            snap.rounded_error_percentage,
        );
        let _ = writeln!(
            out,
            "ok {} | fail {} | timeout {} | short {} | rejected {}",
            f.add_commas(snap.success_count),
            f.add_commas(snap.fail_count),
            f.add_commas(snap.timeout_count),
            f.add_commas(snap.short_circuited_count),
            f.add_commas(snap.rejected_count),
        );
        let _ = write!(out, "hosts {}", snap.reporting_hosts);
        if let Some(commands) = snap.command_count {
            let _ = write!(out, " | commands {commands}");
        }
        if let Some(mean) = snap.latency.mean {
            let _ = write!(
                out,
                " | mean {}ms/host",
                f.instance_average(mean, snap.reporting_hosts, false)
            );
        }
        out
    }
}
