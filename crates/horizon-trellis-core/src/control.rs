//! Control model for Horizon Trellis.
//!
//! Every node of a page tree implements [`Control`]. Controls are owned by
//! their container (`Box<dyn Control>`); the parent link is a plain
//! [`ControlId`] and never owns anything.
//!
//! # Lifecycle
//!
//! A page drives its tree through these phases, in order:
//!
//! 1. [`Control::on_init`]
//! 2. [`Control::on_process`] binds request values, validates fields and
//!    queues [`ActionEvent`]s on the [`ActionEventDispatcher`]
//! 3. queued listeners fire, after every control has processed
//! 4. [`Control::on_render`], then [`Control::render`]
//! 5. [`Control::on_destroy`]
//!
//! # Key Types
//!
//! - [`Control`] - Base trait for all nodes
//! - [`ControlBase`] - Helper struct holding id, name, parent and attributes
//! - [`ProcessContext`] - Request-scoped state passed to `on_process`
//! - [`ActionEventDispatcher`] - Deferred listener queue

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::TrellisConfig;
use crate::error::{TrellisError, TrellisResult};
use crate::field::Field;
use crate::head::HeadElement;
use crate::html::HtmlStringBuffer;
use crate::request::Request;
use crate::logging::targets;

/// A process-unique identifier for a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(u64);

impl ControlId {
    /// Allocate a fresh identifier.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value.
    #[inline]
    pub fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// AttributeMap
// ============================================================================

/// Ordered HTML attribute map. Insertion order is render order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    entries: Vec<(String, String)>,
}

impl AttributeMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, keeping the original position when it already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Look up an attribute.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Remove an attribute, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Returns true if the attribute is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.entries.iter().map(|(n, v)| (n, v))
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// ControlBase
// ============================================================================

/// State shared by every control.
///
/// Control implementations include this as a field and return it from
/// [`Control::base`].
#[derive(Debug, Clone)]
pub struct ControlBase {
    id: ControlId,
    name: Option<String>,
    parent: Option<ControlId>,
    attributes: AttributeMap,
}

impl ControlBase {
    /// Create an unnamed control base.
    pub fn new() -> Self {
        Self {
            id: ControlId::next(),
            name: None,
            parent: None,
            attributes: AttributeMap::new(),
        }
    }

    /// Create a control base with a name.
    pub fn named(name: impl Into<String>) -> Self {
        let mut base = Self::new();
        base.name = Some(name.into());
        base
    }

    /// The control id.
    #[inline]
    pub fn id(&self) -> ControlId {
        self.id
    }

    /// The control name, if assigned.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Assign the control name.
    ///
    /// Names are frozen while the control is attached to a container, since
    /// the container indexes its children by name.
    pub fn set_name(&mut self, name: impl Into<String>) -> TrellisResult<()> {
        let name = name.into();
        if self.parent.is_some() && self.name.as_deref() != Some(name.as_str()) {
            return Err(TrellisError::NameLocked(
                self.name.clone().unwrap_or_default(),
            ));
        }
        self.name = Some(name);
        Ok(())
    }

    /// The parent control id.
    #[inline]
    pub fn parent(&self) -> Option<ControlId> {
        self.parent
    }

    /// Set or clear the parent reference.
    ///
    /// A control can never be its own parent.
    pub fn set_parent(&mut self, parent: Option<ControlId>) -> TrellisResult<()> {
        if parent == Some(self.id) {
            return Err(TrellisError::invalid_argument(format!(
                "control {} cannot be its own parent",
                self.id
            )));
        }
        self.parent = parent;
        Ok(())
    }

    /// Detach from the parent.
    pub fn clear_parent(&mut self) {
        self.parent = None;
    }

    /// HTML attributes.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Mutable HTML attributes.
    pub fn attributes_mut(&mut self) -> &mut AttributeMap {
        &mut self.attributes
    }

    /// Set an HTML attribute.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.set(name, value);
    }

    /// Read the `id` attribute, defaulting to the control name.
    pub fn html_id(&self) -> Option<&str> {
        self.attributes.get("id").or(self.name.as_deref())
    }

    /// Return the name or a [`TrellisError::MissingName`] for `kind`.
    pub fn require_name(&self, kind: &'static str) -> TrellisResult<&str> {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .ok_or(TrellisError::MissingName { kind })
    }
}

impl Default for ControlBase {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Control trait
// ============================================================================

/// Type-erasure helper implemented for every `'static` type.
pub trait AsAny: Any {
    /// Borrow as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// Borrow as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The core trait for every node in a page tree.
pub trait Control: AsAny + Send + Sync {
    /// Shared control state.
    fn base(&self) -> &ControlBase;

    /// Mutable shared control state.
    fn base_mut(&mut self) -> &mut ControlBase;

    /// Short type name used in diagnostics.
    fn kind(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// The control id.
    fn id(&self) -> ControlId {
        self.base().id()
    }

    /// The control name.
    fn name(&self) -> Option<&str> {
        self.base().name()
    }

    /// The parent id.
    fn parent(&self) -> Option<ControlId> {
        self.base().parent()
    }

    /// Child controls in render order. Leaf controls have none.
    fn children(&self) -> &[Box<dyn Control>] {
        &[]
    }

    /// Mutable child controls.
    fn children_mut(&mut self) -> &mut [Box<dyn Control>] {
        &mut []
    }

    /// Called once before request processing.
    fn on_init(&mut self) {}

    /// Process the request. Returning `false` stops processing of the
    /// remaining controls.
    fn on_process(&mut self, _ctx: &mut ProcessContext<'_>) -> bool {
        true
    }

    /// Called after listeners have fired, before rendering.
    fn on_render(&mut self) {}

    /// Release per-request state.
    fn on_destroy(&mut self) -> TrellisResult<()> {
        Ok(())
    }

    /// Render the control's HTML.
    fn render(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()>;

    /// Head resources this control needs.
    fn head_elements(&self) -> Vec<HeadElement> {
        Vec::new()
    }

    /// Head resources expressed as a raw HTML snippet.
    ///
    /// Parsed by the page aggregator; an unparseable snippet aborts rendering.
    fn html_imports(&self) -> Option<String> {
        None
    }

    /// View this control as a field.
    fn as_field(&self) -> Option<&dyn Field> {
        None
    }

    /// View this control as a mutable field.
    fn as_field_mut(&mut self) -> Option<&mut dyn Field> {
        None
    }
}

impl dyn Control {
    /// Downcast to a concrete control type.
    pub fn downcast_ref<T: Control>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Downcast to a mutable concrete control type.
    pub fn downcast_mut<T: Control>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Render into a fresh string.
    pub fn to_html(&self) -> TrellisResult<String> {
        let mut buffer = HtmlStringBuffer::new();
        self.render(&mut buffer)?;
        Ok(buffer.into_string())
    }
}

/// Find a descendant of `root` (or `root` itself) by name and type.
pub fn find_control<'a, T: Control>(root: &'a dyn Control, name: &str) -> Option<&'a T> {
    let mut stack: Vec<&'a dyn Control> = vec![root];
    while let Some(node) = stack.pop() {
        if node.name() == Some(name)
            && let Some(found) = node.downcast_ref::<T>()
        {
            return Some(found);
        }
        stack.extend(node.children().iter().rev().map(|child| child.as_ref()));
    }
    None
}

/// Find a mutable descendant of `root` (or `root` itself) by name and type.
pub fn find_control_mut<'a, T: Control>(
    root: &'a mut dyn Control,
    name: &str,
) -> Option<&'a mut T> {
    let mut stack: Vec<&'a mut dyn Control> = vec![root];
    while let Some(node) = stack.pop() {
        if node.name() == Some(name) && (*node).as_any().is::<T>() {
            return node.downcast_mut::<T>();
        }
        for child in node.children_mut().iter_mut().rev() {
            stack.push(child.as_mut());
        }
    }
    None
}

// ============================================================================
// Action events
// ============================================================================

/// A listener invoked after the process phase. Returning `false` stops the
/// dispatch of later events.
pub type ActionListener = Arc<dyn Fn(&mut ActionContext<'_>) -> bool + Send + Sync>;

/// Wrap a closure as an [`ActionListener`].
pub fn listener<F>(f: F) -> ActionListener
where
    F: Fn(&mut ActionContext<'_>) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// An event queued by a control during processing.
#[derive(Clone)]
pub struct ActionEvent {
    source: ControlId,
    source_name: String,
    listener: ActionListener,
}

impl ActionEvent {
    /// Create an event for `source`.
    pub fn new(source: ControlId, source_name: impl Into<String>, listener: ActionListener) -> Self {
        Self {
            source,
            source_name: source_name.into(),
            listener,
        }
    }

    /// The control that raised the event.
    pub fn source(&self) -> ControlId {
        self.source
    }

    /// The name of the control that raised the event.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }
}

impl fmt::Debug for ActionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionEvent")
            .field("source", &self.source)
            .field("source_name", &self.source_name)
            .finish_non_exhaustive()
    }
}

/// What a listener can see and change while it runs.
pub struct ActionContext<'a> {
    source_name: &'a str,
    request: &'a Request,
    root: &'a mut dyn Control,
}

impl<'a> ActionContext<'a> {
    /// Name of the control that raised the event.
    pub fn source_name(&self) -> &str {
        self.source_name
    }

    /// The current request.
    pub fn request(&self) -> &Request {
        self.request
    }

    /// The page's root control.
    pub fn root(&mut self) -> &mut dyn Control {
        &mut *self.root
    }

    /// Find a control in the page tree by name and type.
    pub fn find<T: Control>(&mut self, name: &str) -> Option<&mut T> {
        find_control_mut::<T>(&mut *self.root, name)
    }
}

/// Queue of action events raised during the process phase.
///
/// Events fire in the order they were queued, after every control has
/// processed, so state restored during processing is visible to listeners.
#[derive(Debug, Default)]
pub struct ActionEventDispatcher {
    events: Vec<ActionEvent>,
}

impl ActionEventDispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event.
    pub fn queue(&mut self, event: ActionEvent) {
        tracing::trace!(target: targets::CONTROL, source = event.source_name(), "queued action event");
        self.events.push(event);
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if no events are queued.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Fire all queued events against `root`.
    ///
    /// Returns `false` as soon as a listener does; remaining events are
    /// discarded.
    pub fn fire(&mut self, request: &Request, root: &mut dyn Control) -> bool {
        for event in std::mem::take(&mut self.events) {
            let mut ctx = ActionContext {
                source_name: &event.source_name,
                request,
                root: &mut *root,
            };
            if !(event.listener)(&mut ctx) {
                tracing::debug!(target: targets::CONTROL, source = event.source_name(), "listener halted dispatch");
                return false;
            }
        }
        true
    }
}

/// Request-scoped state passed to [`Control::on_process`].
pub struct ProcessContext<'a> {
    request: &'a Request,
    config: &'a TrellisConfig,
    dispatcher: &'a mut ActionEventDispatcher,
}

impl<'a> ProcessContext<'a> {
    /// Create a context.
    pub fn new(
        request: &'a Request,
        config: &'a TrellisConfig,
        dispatcher: &'a mut ActionEventDispatcher,
    ) -> Self {
        Self {
            request,
            config,
            dispatcher,
        }
    }

    /// The current request.
    pub fn request(&self) -> &'a Request {
        self.request
    }

    /// The active configuration.
    pub fn config(&self) -> &'a TrellisConfig {
        self.config
    }

    /// Queue a listener invocation for after the process phase.
    pub fn queue_event(&mut self, event: ActionEvent) {
        self.dispatcher.queue(event);
    }
}
