//! Logging and debugging facilities for Horizon Trellis.
//!
//! This module provides:
//! - Target names for the `tracing` events emitted by each subsystem
//! - Debug visualization for control trees
//! - Performance spans for timing page phases
//!
//! # Tracing Integration
//!
//! Trellis never installs a subscriber. To see logs, install one in the
//! embedding application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_trellis=debug")
//!         .init();
//! }
//! ```
//!
//! # Debug Visualization
//!
//! ```ignore
//! use horizon_trellis_core::logging::ControlTreeDebug;
//!
//! println!("{}", ControlTreeDebug::new().format(page.root()));
//! ```

use std::fmt::Write as FmtWrite;

use crate::control::Control;

/// Span names used for page phases.
pub mod span_names {
    /// Request processing phase.
    pub const PROCESS: &str = "horizon_trellis::process";
    /// Listener dispatch phase.
    pub const DISPATCH: &str = "horizon_trellis::dispatch";
    /// Rendering phase.
    pub const RENDER: &str = "horizon_trellis::render";
    /// Head resource aggregation.
    pub const IMPORTS: &str = "horizon_trellis::imports";
    /// Menu tree construction.
    pub const MENU_BUILD: &str = "horizon_trellis::menu_build";
}

/// Target names for log filtering.
pub mod targets {
    /// Control lifecycle and action dispatch.
    pub const CONTROL: &str = "horizon_trellis_core::control";
    /// Container composition.
    pub const CONTAINER: &str = "horizon_trellis_core::container";
    /// Field binding and validation.
    pub const FIELD: &str = "horizon_trellis_core::field";
    /// Signal slot failures.
    pub const SIGNAL: &str = "horizon_trellis_core::signal";
    /// Request preparation and uploads.
    pub const REQUEST: &str = "horizon_trellis_core::request";
    /// Configuration loading.
    pub const CONFIG: &str = "horizon_trellis_core::config";
    /// Form processing.
    pub const FORM: &str = "horizon_trellis::form";
    /// Head resource aggregation.
    pub const HEAD: &str = "horizon_trellis::head";
    /// Action and page links.
    pub const LINK: &str = "horizon_trellis::link";
    /// Menu construction and rendering.
    pub const MENU: &str = "horizon_trellis::menu";
    /// Table state and rendering.
    pub const TABLE: &str = "horizon_trellis::table";
    /// Page lifecycle.
    pub const PAGE: &str = "horizon_trellis::page";
    /// Phase timings from [`PerfSpan`](super::PerfSpan).
    pub const PERF: &str = "horizon_trellis::perf";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
}

/// Configuration for control tree output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show control ids.
    pub show_ids: bool,
    /// Whether to show control kinds.
    pub show_kinds: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_kinds: true,
            max_depth: None,
        }
    }
}

impl TreeFormatOptions {
    /// Names only.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_kinds: false,
            ..Default::default()
        }
    }
}

/// Renders a control hierarchy as an indented tree.
#[derive(Debug, Clone, Default)]
pub struct ControlTreeDebug {
    options: TreeFormatOptions,
}

impl ControlTreeDebug {
    /// Create a visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format the tree rooted at `root`.
    pub fn format(&self, root: &dyn Control) -> String {
        let mut output = String::new();
        // (control, depth, ancestor "has more siblings" flags, is_last)
        let mut stack: Vec<(&dyn Control, Vec<bool>, bool)> = vec![(root, Vec::new(), true)];

        while let Some((control, rails, is_last)) = stack.pop() {
            let depth = rails.len();
            if self.options.max_depth.is_some_and(|max| depth > max) {
                continue;
            }

            output.push_str(&self.build_prefix(&rails, is_last));
            output.push_str(control.name().unwrap_or("(unnamed)"));
            if self.options.show_ids {
                write!(output, " [{}]", control.id()).expect("write to String");
            }
            if self.options.show_kinds {
                write!(output, " ({})", control.kind()).expect("write to String");
            }
            output.push('\n');

            let children = control.children();
            let mut child_rails = rails.clone();
            if depth > 0 {
                child_rails.push(!is_last);
            } else {
                child_rails.push(false);
            }
            for (i, child) in children.iter().enumerate().rev() {
                stack.push((child.as_ref(), child_rails.clone(), i + 1 == children.len()));
            }
        }
        output
    }

    fn build_prefix(&self, rails: &[bool], is_last: bool) -> String {
        if rails.is_empty() {
            return String::new();
        }
        let (rail, tee, corner) = match self.options.style {
            TreeStyle::Ascii => ("|   ", "+-- ", "`-- "),
            TreeStyle::Unicode => ("\u{2502}   ", "\u{251c}\u{2500}\u{2500} ", "\u{2514}\u{2500}\u{2500} "),
        };

        let mut prefix = String::new();
        // The first rail belongs to the root, which has no connector column.
        for &more in &rails[1..] {
            prefix.push_str(if more { rail } else { "    " });
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix
    }
}

/// A guard that keeps a tracing span entered until dropped.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Enter a performance span for `name` (one of [`span_names`]).
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
