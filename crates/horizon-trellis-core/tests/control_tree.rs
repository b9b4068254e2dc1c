//! Integration tests for the control tree lifecycle.

use std::sync::Arc;

use horizon_trellis_core::{
    ActionEvent, ActionEventDispatcher, Control, ControlBase, ControlTreeDebug, Field, FieldBase,
    HtmlStringBuffer, Panel, ProcessContext, Request, TrellisConfig, TrellisError, TrellisResult,
    TreeFormatOptions, find_control, listener, process_field,
};
use parking_lot::Mutex;

/// A counter restored from a request parameter during processing.
struct Counter {
    base: ControlBase,
    value: u32,
    seen_by_listener: Arc<Mutex<Option<u32>>>,
}

impl Counter {
    fn new(name: &str, seen: Arc<Mutex<Option<u32>>>) -> Self {
        Self {
            base: ControlBase::named(name),
            value: 0,
            seen_by_listener: seen,
        }
    }
}

impl Control for Counter {
    fn base(&self) -> &ControlBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControlBase {
        &mut self.base
    }

    fn on_process(&mut self, ctx: &mut ProcessContext<'_>) -> bool {
        // The listener is queued before the state is restored.
        let seen = Arc::clone(&self.seen_by_listener);
        ctx.queue_event(ActionEvent::new(
            self.base.id(),
            "counter",
            listener(move |ctx| {
                let value = ctx.find::<Counter>("counter").map(|c| c.value);
                *seen.lock() = value;
                true
            }),
        ));
        self.value = ctx
            .request()
            .param("count")
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        true
    }

    fn render(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        buffer.append(self.value.to_string());
        Ok(())
    }
}

/// A minimal field requiring a non-empty value.
struct NameField {
    field: FieldBase,
}

impl Control for NameField {
    fn base(&self) -> &ControlBase {
        self.field.control()
    }

    fn base_mut(&mut self) -> &mut ControlBase {
        self.field.control_mut()
    }

    fn on_process(&mut self, ctx: &mut ProcessContext<'_>) -> bool {
        process_field(self, ctx)
    }

    fn render(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        buffer.append_escaped(self.field.value());
        Ok(())
    }

    fn as_field(&self) -> Option<&dyn Field> {
        Some(self)
    }

    fn as_field_mut(&mut self) -> Option<&mut dyn Field> {
        Some(self)
    }
}

impl Field for NameField {
    fn field(&self) -> &FieldBase {
        &self.field
    }

    fn field_mut(&mut self) -> &mut FieldBase {
        &mut self.field
    }

    fn validate(&mut self) {
        self.field.clear_error();
        if self.field.is_required() && self.field.value().is_empty() {
            self.field.set_error(horizon_trellis_core::FieldError::new(
                horizon_trellis_core::ErrorKind::Required,
                "required",
            ));
        }
    }
}

#[test]
fn listeners_observe_restored_state() {
    let seen = Arc::new(Mutex::new(None));
    let mut root = Panel::new("root");
    let mut nested = Panel::new("nested");
    nested.add(Counter::new("counter", Arc::clone(&seen))).unwrap();
    root.add(nested).unwrap();

    let request = Request::get("/").with_param("count", "7");
    let config = TrellisConfig::default();
    let mut dispatcher = ActionEventDispatcher::new();

    root.on_init();
    let mut ctx = ProcessContext::new(&request, &config, &mut dispatcher);
    assert!(root.on_process(&mut ctx));
    assert_eq!(dispatcher.len(), 1);
    assert!(dispatcher.fire(&request, &mut root));

    assert_eq!(*seen.lock(), Some(7));
}

#[test]
fn field_binding_is_idempotent() {
    let mut field = NameField {
        field: FieldBase::new("firstName"),
    };
    field.field.set_required(true);

    let request = Request::post("/").with_param("firstName", "");
    let config = TrellisConfig::default();
    let mut dispatcher = ActionEventDispatcher::new();
    let mut ctx = ProcessContext::new(&request, &config, &mut dispatcher);

    process_field(&mut field, &mut ctx);
    let first = (field.is_valid(), field.error().cloned());
    process_field(&mut field, &mut ctx);
    assert_eq!((field.is_valid(), field.error().cloned()), first);
    assert!(!field.is_valid());
    assert_eq!(field.label(), "First Name");
}

#[test]
fn tree_lookup_and_debug_output() {
    let mut root = Panel::new("root");
    let mut nested = Panel::new("nested");
    nested
        .add(NameField {
            field: FieldBase::new("email"),
        })
        .unwrap();
    root.add(nested).unwrap();

    assert!(find_control::<NameField>(&root, "email").is_some());
    assert!(find_control::<Panel>(&root, "email").is_none());

    let output = ControlTreeDebug::with_options(TreeFormatOptions::minimal()).format(&root);
    assert_eq!(output.lines().collect::<Vec<_>>(), ["root", "└── nested", "    └── email"]);
}

#[test]
fn self_containment_rejected() {
    let mut panel = Panel::new("loop");
    let own_id = panel.id();
    let err = panel.base_mut().set_parent(Some(own_id)).unwrap_err();
    assert!(matches!(err, TrellisError::InvalidArgument(_)));
}
