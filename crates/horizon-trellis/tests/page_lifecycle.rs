//! End-to-end tests of the page lifecycle: binding, validation, listener
//! dispatch, head aggregation and error reporting.

use std::sync::Arc;

use horizon_trellis::field::{DateField, NumberField, TelephoneField, TextField};
use horizon_trellis::link::ActionLink;
use horizon_trellis::table::{Column, LinkDecorator, Table};
use horizon_trellis::{
    Control, ControlBase, DeploymentMode, ErrorKind, Field, Form, HtmlStringBuffer, Page, Panel,
    Request, Submit, TrellisConfig, TrellisError, TrellisResult, listener,
};
use parking_lot::Mutex;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn order_page(seen: Arc<Mutex<Option<(bool, String)>>>) -> Page {
    let mut form = Form::new("order");
    form.add(TextField::new("customer").required()).unwrap();
    form.add(NumberField::with_pattern("quantity", "#,##0")).unwrap();
    form.add(TelephoneField::new("phone").with_min_length(10)).unwrap();
    form.add(Submit::new("place", "Place order").with_listener(listener(move |ctx| {
        let form = ctx.find::<Form>("order").expect("order form");
        let quantity = form.field("quantity").map(|f| f.value().to_string()).unwrap_or_default();
        *seen.lock() = Some((form.is_valid(), quantity));
        true
    })))
    .unwrap();

    let mut page = Page::new("/order.htm").with_title("Order");
    page.add(form).unwrap();
    page
}

#[test]
fn test_valid_order_reaches_listener_with_normalised_values() {
    init_tracing();
    let seen = Arc::new(Mutex::new(None));
    let mut page = order_page(Arc::clone(&seen));

    let request = Request::post("/order.htm")
        .with_param("form_name", "order")
        .with_param("customer", "Ann")
        .with_param("quantity", "2.54")
        .with_param("phone", "02-9283-0321")
        .with_param("place", "Place order");
    let response = page.process(&request, &TrellisConfig::default()).unwrap();

    assert_eq!(*seen.lock(), Some((true, "3".to_string())));
    assert!(response.body.contains(r#"value="3""#));
    assert!(!response.body.contains(r#"class="error""#));
}

#[test]
fn test_invalid_order_reports_every_field() {
    let seen = Arc::new(Mutex::new(None));
    let mut page = order_page(Arc::clone(&seen));

    let request = Request::post("/order.htm")
        .with_param("form_name", "order")
        .with_param("customer", "")
        .with_param("quantity", "two")
        .with_param("phone", "abc-1234567")
        .with_param("place", "Place order");
    let response = page.process(&request, &TrellisConfig::default()).unwrap();

    // The listener still runs and sees the failed validation.
    assert_eq!(seen.lock().as_ref().map(|(valid, _)| *valid), Some(false));

    let form = page.find::<Form>("order").unwrap();
    let kinds: Vec<_> = form.errors().iter().map(|(name, e)| (*name, e.kind)).collect();
    assert_eq!(
        kinds,
        [
            ("customer", ErrorKind::Required),
            ("quantity", ErrorKind::NumberFormat),
            ("phone", ErrorKind::TelephoneFormat),
        ]
    );
    assert!(response.body.contains(r#"<span class="error">Customer is required</span>"#));
    assert!(response.body.contains(r#"<span class="error">Quantity must be a number</span>"#));
}

#[test]
fn test_get_request_leaves_form_untouched() {
    let seen = Arc::new(Mutex::new(None));
    let mut page = order_page(Arc::clone(&seen));

    let response = page.process(&Request::get("/order.htm"), &TrellisConfig::default()).unwrap();
    assert!(seen.lock().is_none());
    let form = page.find::<Form>("order").unwrap();
    assert!(form.errors().is_empty());
    assert_eq!(form.field("customer").map(|f| f.value()), Some(""));
    assert!(response.body.contains(r#"<form method="post" name="order" id="order""#));
}

#[test]
fn test_field_resources_imported_once() {
    let mut form = Form::new("booking");
    form.add(DateField::new("arrive")).unwrap();
    form.add(DateField::new("depart")).unwrap();
    let mut page = Page::new("/booking.htm");
    page.add(form).unwrap();

    let response = page.process(&Request::get("/booking.htm"), &TrellisConfig::default()).unwrap();
    assert_eq!(response.body.matches("/trellis/calendar/calendar.css").count(), 1);
    assert_eq!(response.body.matches("/trellis/calendar/calendar.js").count(), 1);

    // Stylesheets precede the body; body-bottom scripts follow it.
    let css = response.body.find("calendar.css").unwrap();
    let body = response.body.find("<body>").unwrap();
    let js = response.body.find("calendar.js").unwrap();
    let form = response.body.find("<form").unwrap();
    assert!(css < body && form < js);
}

#[test]
fn test_configured_date_pattern_applies_to_fields() {
    let config = TrellisConfig {
        date_pattern: "yyyy-MM-dd".to_string(),
        ..TrellisConfig::default()
    };
    let mut form = Form::new("booking");
    form.add(DateField::new("arrive")).unwrap();
    let mut page = Page::new("/booking.htm");
    page.add(form).unwrap();

    let request = Request::post("/booking.htm")
        .with_param("form_name", "booking")
        .with_param("arrive", "2024-03-05");
    page.process(&request, &config).unwrap();

    let form = page.find::<Form>("booking").unwrap();
    let arrive = form.field_as::<DateField>("arrive").unwrap();
    assert!(arrive.is_valid(), "{:?}", arrive.error());
    assert_eq!(arrive.pattern(), "yyyy-MM-dd");
    assert_eq!(arrive.date().map(|d| d.to_string()).as_deref(), Some("2024-03-05"));
}

#[derive(Debug, serde::Serialize)]
struct Customer {
    id: u32,
    name: &'static str,
}

#[test]
fn test_row_link_sees_restored_table_state() {
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);

    let mut table = Table::new("customers").with_page_size(2);
    table
        .add_control(ActionLink::new("delete", "Delete").with_listener(listener(move |ctx| {
            let id = ctx.request().param("id").map(str::to_string);
            let table = ctx.find::<Table<Customer>>("customers").expect("customers table");
            *sink.lock() = Some((id, table.effective_page(), table.sort_column().map(str::to_string)));
            true
        })))
        .unwrap();
    table.add_column(Column::new("name", |c: &Customer| c.name.to_string()));
    table.add_column(
        Column::new("action", |_: &Customer| String::new())
            .with_decorator(LinkDecorator::new(["delete"], "id").unwrap())
            .with_sortable(false),
    );
    table.set_rows(vec![
        Customer { id: 1, name: "Ann" },
        Customer { id: 2, name: "Bob" },
        Customer { id: 3, name: "Cara" },
        Customer { id: 4, name: "Dan" },
    ]);

    let mut page = Page::new("/customers.htm");
    page.add(table).unwrap();

    let request = Request::get("/customers.htm")
        .with_param("actionLink", "delete")
        .with_param("id", "2")
        .with_param("table", "customers")
        .with_param("page", "1")
        .with_param("column", "name")
        .with_param("ascending", "false");
    let response = page.process(&request, &TrellisConfig::default()).unwrap();

    assert_eq!(*seen.lock(), Some((Some("2".to_string()), 1, Some("name".to_string()))));

    // Descending by name, second page: Bob then Ann, links keep the state.
    let bob = response.body.find(">Bob<").unwrap();
    let ann = response.body.find(">Ann<").unwrap();
    assert!(bob < ann);
    assert!(response.body.contains(
        r#"href="/customers.htm?actionLink=delete&amp;id=1&amp;table=customers&amp;page=1&amp;column=name&amp;ascending=false""#
    ));
}

/// A control declaring its resources through a legacy head snippet.
struct Widget {
    base: ControlBase,
    snippet: &'static str,
}

impl Widget {
    fn new(name: &str, snippet: &'static str) -> Self {
        Self {
            base: ControlBase::named(name),
            snippet,
        }
    }
}

impl Control for Widget {
    fn base(&self) -> &ControlBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControlBase {
        &mut self.base
    }

    fn html_imports(&self) -> Option<String> {
        Some(self.snippet.to_string())
    }

    fn render(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        buffer.append("<div class=\"widget\"></div>");
        Ok(())
    }
}

#[test]
fn test_legacy_snippets_merge_with_elements() {
    let mut panel = Panel::new("sidebar");
    panel
        .add(Widget::new("a", r#"<link rel="stylesheet" href="/widget.css"/><script src="/widget.js"></script>"#))
        .unwrap();
    panel.add(Widget::new("b", r#"<link rel="stylesheet" href="/widget.css"/>"#)).unwrap();
    let mut page = Page::new("/home.htm");
    page.add(panel).unwrap();

    let response = page.process(&Request::get("/home.htm"), &TrellisConfig::default()).unwrap();
    assert_eq!(response.body.matches("/widget.css").count(), 1);
    assert_eq!(response.body.matches("/widget.js").count(), 1);
}

#[test]
fn test_unparseable_snippet_aborts_render() {
    let mut page = Page::new("/home.htm");
    page.add(Widget::new("broken", "<meta name=\"robots\" content=\"none\">")).unwrap();

    let err = page.process(&Request::get("/home.htm"), &TrellisConfig::default()).unwrap_err();
    assert!(matches!(err, TrellisError::ResourceDeclaration { .. }));

    let development = page.respond(&Request::get("/home.htm"), &TrellisConfig::default());
    assert_eq!(development.status, 500);
    assert!(development.body.contains("unparseable head resource declaration"));

    let production = TrellisConfig::default().with_mode(DeploymentMode::Production);
    let response = page.respond(&Request::get("/home.htm"), &production);
    assert_eq!(response.status, 500);
    assert!(!response.body.contains("error-chain"));
}

#[test]
fn test_global_fragments_follow_imports() {
    let mut page = Page::new("/home.htm");
    page.add_global_style("body { margin: 0 }");
    page.add_global_style("h1 { color: red }");
    page.add(Widget::new("w", r#"<link rel="stylesheet" href="/widget.css"/>"#)).unwrap();

    let response = page.process(&Request::get("/home.htm"), &TrellisConfig::default()).unwrap();
    let link = response.body.find("/widget.css").unwrap();
    let first = response.body.find("body { margin: 0 }").unwrap();
    let second = response.body.find("h1 { color: red }").unwrap();
    assert!(link < first && first < second);
    assert_eq!(response.body.matches("<style").count(), 1);
}
