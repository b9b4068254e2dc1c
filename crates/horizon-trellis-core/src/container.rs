//! Parent-child composition of controls.
//!
//! [`ContainerBase`] owns an ordered list of child controls and a name index
//! over it. The list is authoritative; the index is rebuilt from the
//! insertion point on every structural change so name lookups stay O(1).
//!
//! # Invariants
//!
//! - Every child's `parent()` is this container's id.
//! - Child names are unique within the container.
//! - A container can never contain itself.
//!
//! [`Panel`] is the plain `<div>` container built on top of it.

use std::collections::HashMap;
use std::fmt;

use crate::control::{Control, ControlBase, ControlId, ProcessContext, find_control};
use crate::error::{TrellisError, TrellisResult};
use crate::field::Field;
use crate::html::HtmlStringBuffer;
use crate::signal::Signal;
use crate::logging::targets;

/// A structural change reported by [`ContainerBase::children_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildrenChange {
    /// A child was inserted at the given index.
    Added { id: ControlId, index: usize },
    /// A child was removed from the given index.
    Removed { id: ControlId, index: usize },
}

/// Ordered, name-indexed child storage shared by container controls.
pub struct ContainerBase {
    control: ControlBase,
    children: Vec<Box<dyn Control>>,
    by_name: HashMap<String, usize>,
    children_changed: Signal<ChildrenChange>,
}

impl ContainerBase {
    /// Create an unnamed container.
    pub fn new() -> Self {
        Self::from_control(ControlBase::new())
    }

    /// Create a named container.
    pub fn named(name: impl Into<String>) -> Self {
        Self::from_control(ControlBase::named(name))
    }

    fn from_control(control: ControlBase) -> Self {
        Self {
            control,
            children: Vec::new(),
            by_name: HashMap::new(),
            children_changed: Signal::new(),
        }
    }

    /// The container's own control state.
    pub fn base(&self) -> &ControlBase {
        &self.control
    }

    /// Mutable control state.
    pub fn base_mut(&mut self) -> &mut ControlBase {
        &mut self.control
    }

    /// Signal emitted after every add or remove.
    pub fn children_changed(&self) -> &Signal<ChildrenChange> {
        &self.children_changed
    }

    /// Append a control.
    pub fn add<C: Control>(&mut self, control: C) -> TrellisResult<ControlId> {
        self.add_boxed(Box::new(control))
    }

    /// Append a boxed control.
    pub fn add_boxed(&mut self, control: Box<dyn Control>) -> TrellisResult<ControlId> {
        let index = self.children.len();
        self.insert_boxed(index, control)
    }

    /// Insert a control at `index`.
    pub fn insert<C: Control>(&mut self, index: usize, control: C) -> TrellisResult<ControlId> {
        self.insert_boxed(index, Box::new(control))
    }

    /// Insert a boxed control at `index`.
    ///
    /// # Errors
    ///
    /// - [`TrellisError::IndexOutOfRange`] when `index > len`
    /// - [`TrellisError::InvalidArgument`] when the control is this container
    ///   or already belongs to another container
    /// - [`TrellisError::DuplicateName`] when the name is taken
    pub fn insert_boxed(&mut self, index: usize, mut control: Box<dyn Control>) -> TrellisResult<ControlId> {
        let len = self.children.len();
        if index > len {
            return Err(TrellisError::IndexOutOfRange { index, len });
        }

        let own_id = self.control.id();
        let id = control.id();
        if id == own_id {
            return Err(TrellisError::invalid_argument(format!(
                "container {own_id} cannot contain itself"
            )));
        }
        if let Some(parent) = control.parent()
            && parent != own_id
        {
            return Err(TrellisError::invalid_argument(format!(
                "control {id} already belongs to container {parent}"
            )));
        }
        if let Some(name) = control.name()
            && self.by_name.contains_key(name)
        {
            return Err(TrellisError::DuplicateName(name.to_string()));
        }

        control.base_mut().set_parent(Some(own_id))?;
        self.children.insert(index, control);
        self.reindex_from(index);

        tracing::trace!(target: targets::CONTAINER, container = %own_id, child = %id, index, "added control");
        self.children_changed.emit(ChildrenChange::Added { id, index });
        Ok(id)
    }

    /// Remove a child by id, returning it with its parent cleared.
    pub fn remove(&mut self, id: ControlId) -> Option<Box<dyn Control>> {
        let index = self.children.iter().position(|c| c.id() == id)?;
        Some(self.remove_at(index))
    }

    /// Remove a child by name.
    pub fn remove_by_name(&mut self, name: &str) -> Option<Box<dyn Control>> {
        let index = *self.by_name.get(name)?;
        Some(self.remove_at(index))
    }

    fn remove_at(&mut self, index: usize) -> Box<dyn Control> {
        let mut control = self.children.remove(index);
        if let Some(name) = control.name() {
            self.by_name.remove(name);
        }
        self.reindex_from(index);
        control.base_mut().clear_parent();

        let id = control.id();
        tracing::trace!(target: targets::CONTAINER, container = %self.control.id(), child = %id, index, "removed control");
        self.children_changed.emit(ChildrenChange::Removed { id, index });
        control
    }

    fn reindex_from(&mut self, start: usize) {
        for (index, child) in self.children.iter().enumerate().skip(start) {
            if let Some(name) = child.name() {
                self.by_name.insert(name.to_string(), index);
            }
        }
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns true if there are no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns true if a child is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Children in render order.
    pub fn children(&self) -> &[Box<dyn Control>] {
        &self.children
    }

    /// Mutable children in render order.
    pub fn children_mut(&mut self) -> &mut [Box<dyn Control>] {
        &mut self.children
    }

    /// Look up a direct child by name.
    pub fn control(&self, name: &str) -> Option<&dyn Control> {
        self.by_name.get(name).map(|&i| self.children[i].as_ref())
    }

    /// Look up a mutable direct child by name.
    pub fn control_mut(&mut self, name: &str) -> Option<&mut dyn Control> {
        let index = *self.by_name.get(name)?;
        Some(self.children[index].as_mut())
    }

    /// Look up a direct child by name and concrete type.
    pub fn control_as<T: Control>(&self, name: &str) -> Option<&T> {
        self.control(name)?.downcast_ref::<T>()
    }

    /// Look up a mutable direct child by name and concrete type.
    pub fn control_as_mut<T: Control>(&mut self, name: &str) -> Option<&mut T> {
        self.control_mut(name)?.downcast_mut::<T>()
    }

    /// Look up a direct child field by name.
    pub fn field(&self, name: &str) -> Option<&dyn Field> {
        self.control(name)?.as_field()
    }

    /// Look up a mutable direct child field by name.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut dyn Field> {
        self.control_mut(name)?.as_field_mut()
    }

    /// Search the whole subtree for a control by name and type.
    pub fn find_descendant<T: Control>(&self, name: &str) -> Option<&T> {
        self.children
            .iter()
            .find_map(|child| find_control::<T>(child.as_ref(), name))
    }

    // ------------------------------------------------------------------------
    // Lifecycle dispatch
    // ------------------------------------------------------------------------

    /// Run `on_init` on every child.
    pub fn init_children(&mut self) {
        for child in &mut self.children {
            child.on_init();
        }
    }

    /// Run `on_process` on every child, stopping at the first that returns
    /// `false`.
    pub fn process_children(&mut self, ctx: &mut ProcessContext<'_>) -> bool {
        for child in &mut self.children {
            if !child.on_process(ctx) {
                tracing::debug!(target: targets::CONTAINER, child = %child.id(), "control stopped processing");
                return false;
            }
        }
        true
    }

    /// Run `on_render` on every child.
    pub fn on_render_children(&mut self) {
        for child in &mut self.children {
            child.on_render();
        }
    }

    /// Run `on_destroy` on every child. A failing child is logged and the
    /// remaining siblings are still destroyed.
    pub fn destroy_children(&mut self) {
        for child in &mut self.children {
            if let Err(err) = child.on_destroy() {
                tracing::error!(
                    target: targets::CONTAINER,
                    child = %child.id(),
                    kind = child.kind(),
                    error = %err,
                    "control failed to release its resources"
                );
            }
        }
    }

    /// Render every child in order.
    pub fn render_children(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        for child in &self.children {
            child.render(buffer)?;
        }
        Ok(())
    }
}

impl Default for ContainerBase {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ContainerBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBase")
            .field("control", &self.control)
            .field(
                "children",
                &self.children.iter().map(|c| (c.id(), c.name())).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// A generic container rendered as a `<div>`.
#[derive(Debug, Default)]
pub struct Panel {
    container: ContainerBase,
}

impl Panel {
    /// Create a named panel.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            container: ContainerBase::named(name),
        }
    }

    /// The child storage.
    pub fn container(&self) -> &ContainerBase {
        &self.container
    }

    /// Mutable child storage.
    pub fn container_mut(&mut self) -> &mut ContainerBase {
        &mut self.container
    }

    /// Append a control.
    pub fn add<C: Control>(&mut self, control: C) -> TrellisResult<ControlId> {
        self.container.add(control)
    }
}

impl Control for Panel {
    fn base(&self) -> &ControlBase {
        self.container.base()
    }

    fn base_mut(&mut self) -> &mut ControlBase {
        self.container.base_mut()
    }

    fn children(&self) -> &[Box<dyn Control>] {
        self.container.children()
    }

    fn children_mut(&mut self) -> &mut [Box<dyn Control>] {
        self.container.children_mut()
    }

    fn on_init(&mut self) {
        self.container.init_children();
    }

    fn on_process(&mut self, ctx: &mut ProcessContext<'_>) -> bool {
        self.container.process_children(ctx)
    }

    fn on_render(&mut self) {
        self.container.on_render_children();
    }

    fn on_destroy(&mut self) -> TrellisResult<()> {
        self.container.destroy_children();
        Ok(())
    }

    fn render(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        let base = self.container.base();
        buffer.element_start("div");
        buffer.append_optional_attribute("id", base.html_id());
        buffer.append_attributes(base.attributes().iter().filter(|(k, _)| k.as_str() != "id"));
        buffer.close_tag();
        self.container.render_children(buffer)?;
        buffer.element_end_tag("div");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Label {
        base: ControlBase,
        text: String,
        fail_destroy: bool,
    }

    impl Label {
        fn new(name: &str, text: &str) -> Self {
            Self {
                base: ControlBase::named(name),
                text: text.to_string(),
                fail_destroy: false,
            }
        }
    }

    impl Control for Label {
        fn base(&self) -> &ControlBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ControlBase {
            &mut self.base
        }

        fn on_destroy(&mut self) -> TrellisResult<()> {
            if self.fail_destroy {
                return Err(TrellisError::invalid_argument("boom"));
            }
            self.text.clear();
            Ok(())
        }

        fn render(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
            buffer.append_escaped(&self.text);
            Ok(())
        }
    }

    #[test]
    fn test_add_sets_parent_and_index() {
        let mut container = ContainerBase::named("root");
        let id = container.add(Label::new("a", "A")).unwrap();
        container.add(Label::new("b", "B")).unwrap();

        let a = container.control("a").unwrap();
        assert_eq!(a.id(), id);
        assert_eq!(a.parent(), Some(container.base().id()));
        assert_eq!(container.control_as::<Label>("b").unwrap().text, "B");
        assert!(container.control_as::<Panel>("b").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut container = ContainerBase::new();
        container.add(Label::new("a", "1")).unwrap();
        let err = container.add(Label::new("a", "2")).unwrap_err();
        assert!(matches!(err, TrellisError::DuplicateName(ref n) if n == "a"));
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn test_insert_out_of_range() {
        let mut container = ContainerBase::new();
        let err = container.insert(1, Label::new("a", "")).unwrap_err();
        assert!(matches!(err, TrellisError::IndexOutOfRange { index: 1, len: 0 }));
    }

    #[test]
    fn test_insert_reindexes() {
        let mut container = ContainerBase::new();
        container.add(Label::new("b", "B")).unwrap();
        container.add(Label::new("c", "C")).unwrap();
        container.insert(0, Label::new("a", "A")).unwrap();

        let mut buffer = HtmlStringBuffer::new();
        container.render_children(&mut buffer).unwrap();
        assert_eq!(buffer.as_str(), "ABC");
        assert_eq!(container.control_as::<Label>("c").unwrap().text, "C");

        container.remove_by_name("a").unwrap();
        assert_eq!(container.control_as::<Label>("b").unwrap().text, "B");
        assert_eq!(container.control_as::<Label>("c").unwrap().text, "C");
    }

    #[test]
    fn test_remove_clears_parent() {
        let mut container = ContainerBase::new();
        let id = container.add(Label::new("a", "A")).unwrap();
        let removed = container.remove(id).unwrap();
        assert_eq!(removed.parent(), None);
        assert!(container.control("a").is_none());
        assert!(container.remove(id).is_none());

        // A detached control can be added elsewhere.
        let mut other = ContainerBase::new();
        other.add_boxed(removed).unwrap();
    }

    #[test]
    fn test_foreign_parent_rejected() {
        let mut label = Label::new("a", "A");
        label.base_mut().set_parent(Some(ControlId::next())).unwrap();
        let mut container = ContainerBase::new();
        let err = container.add(label).unwrap_err();
        assert!(matches!(err, TrellisError::InvalidArgument(_)));
    }

    #[test]
    fn test_name_locked_after_add() {
        let mut container = ContainerBase::new();
        container.add(Label::new("a", "A")).unwrap();
        let child = container.control_mut("a").unwrap();
        assert!(matches!(
            child.base_mut().set_name("b"),
            Err(TrellisError::NameLocked(_))
        ));
    }

    #[test]
    fn test_children_changed_signal() {
        let mut container = ContainerBase::new();
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&changes);
        container.children_changed().connect(move |change| sink.lock().push(*change));

        let id = container.add(Label::new("a", "A")).unwrap();
        container.remove(id);
        assert_eq!(
            *changes.lock(),
            vec![
                ChildrenChange::Added { id, index: 0 },
                ChildrenChange::Removed { id, index: 0 },
            ]
        );
    }

    #[test]
    fn test_destroy_continues_after_failure() {
        let mut container = ContainerBase::new();
        let mut failing = Label::new("a", "A");
        failing.fail_destroy = true;
        container.add(failing).unwrap();
        container.add(Label::new("b", "B")).unwrap();

        container.destroy_children();
        assert_eq!(container.control_as::<Label>("b").unwrap().text, "");
    }

    #[test]
    fn test_panel_renders_and_finds_descendants() {
        let mut inner = Panel::new("inner");
        inner.add(Label::new("deep", "x<y")).unwrap();
        let mut outer = Panel::new("outer");
        outer.base_mut().set_attribute("class", "box");
        outer.add(inner).unwrap();

        let html = (&outer as &dyn Control).to_html().unwrap();
        assert_eq!(
            html,
            r#"<div id="outer" class="box"><div id="inner">x&lt;y</div></div>"#
        );
        assert!(outer.container().find_descendant::<Label>("deep").is_some());
    }
}
