//! Data tables with sorting, paging and row links.
//!
//! A [`Table`] renders rows of any type through its [`Column`]s. Paging and
//! sorting state travels in the reserved `table`, `page`, `column` and
//! `ascending` request parameters; the table restores it at the start of its
//! process phase, before its registered controls run and before any listener
//! is dispatched, so a clicked row link sees the table as the user saw it.
//!
//! # Example
//!
//! ```
//! use horizon_trellis::link::ActionLink;
//! use horizon_trellis::table::{Column, LinkDecorator, Table};
//!
//! #[derive(serde::Serialize)]
//! struct Customer { id: u32, name: String }
//!
//! let mut table = Table::new("customers").with_page_size(10);
//! table.add_control(ActionLink::new("delete", "Delete")).unwrap();
//! table.add_column(Column::new("name", |c: &Customer| c.name.clone()));
//! table.add_column(
//!     Column::new("action", |_: &Customer| String::new())
//!         .with_decorator(LinkDecorator::new(["delete"], "id").unwrap())
//!         .with_sortable(false),
//! );
//! table.set_rows(vec![Customer { id: 1, name: "Ann".into() }]);
//! assert_eq!(table.page_count(), 1);
//! ```

mod column;
mod decorator;
mod property;

pub use column::{Column, CompareFn, ValueFn};
pub use decorator::{Decorator, DecoratorContext, LinkDecorator};
pub use property::{PropertyPath, display_value};

use horizon_trellis_core::{
    Control, ControlBase, ControlId, HeadElement, HtmlStringBuffer, ProcessContext, Request,
    TrellisResult, container::ContainerBase, logging::targets, params,
};

use crate::link::build_href;

/// A sortable, pageable data table.
pub struct Table<T> {
    container: ContainerBase,
    columns: Vec<Column<T>>,
    rows: Vec<T>,
    page_size: usize,
    page_number: usize,
    sort_column: Option<String>,
    ascending: bool,
    current_path: String,
}

impl<T: Send + Sync + 'static> Table<T> {
    /// Create an empty table. A page size of zero shows every row.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            container: ContainerBase::named(name),
            columns: Vec::new(),
            rows: Vec::new(),
            page_size: 0,
            page_number: 0,
            sort_column: None,
            ascending: true,
            current_path: String::new(),
        }
    }

    /// Set the page size (builder pattern).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// The table name.
    pub fn name(&self) -> &str {
        self.container.base().name().unwrap_or_default()
    }

    /// Append a column.
    pub fn add_column(&mut self, column: Column<T>) {
        self.columns.push(column);
    }

    /// The columns, in display order.
    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column<T>> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Register a control used by decorators, typically a link.
    pub fn add_control<C: Control>(&mut self, control: C) -> TrellisResult<ControlId> {
        self.container.add(control)
    }

    /// A registered control by name and type.
    pub fn control_as<C: Control>(&self, name: &str) -> Option<&C> {
        self.container.control_as(name)
    }

    /// Replace the rows.
    pub fn set_rows(&mut self, rows: Vec<T>) {
        self.rows = rows;
    }

    /// All rows, unsorted.
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows per page; zero disables paging.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Zero-based requested page.
    pub fn page_number(&self) -> usize {
        self.page_number
    }

    /// Request a page.
    pub fn set_page_number(&mut self, page_number: usize) {
        self.page_number = page_number;
    }

    /// Number of pages, at least one.
    pub fn page_count(&self) -> usize {
        if self.page_size == 0 {
            1
        } else {
            self.rows.len().div_ceil(self.page_size).max(1)
        }
    }

    /// The page actually shown, clamped to the last page.
    pub fn effective_page(&self) -> usize {
        self.page_number.min(self.page_count() - 1)
    }

    /// The sorted column.
    pub fn sort_column(&self) -> Option<&str> {
        self.sort_column.as_deref()
    }

    /// Returns true for ascending sort.
    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    /// Sort by `column`, or clear sorting with `None`.
    pub fn set_sort_column(&mut self, column: Option<&str>, ascending: bool) {
        self.sort_column = column.map(str::to_string);
        self.ascending = ascending;
    }

    /// Row order after sorting, as indices into [`rows`](Self::rows).
    ///
    /// The sort is stable, so equal rows keep their original order in both
    /// directions.
    pub fn sorted_indices(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        if let Some(column) = self.sort_column.as_deref().and_then(|name| self.column(name)) {
            order.sort_by(|&a, &b| {
                let ordering = column.compare(&self.rows[a], &self.rows[b]);
                if self.ascending { ordering } else { ordering.reverse() }
            });
        }
        order
    }

    /// The rows shown on the current page, sorted.
    pub fn displayed_rows(&self) -> Vec<&T> {
        let order = self.sorted_indices();
        let (start, end) = if self.page_size == 0 {
            (0, order.len())
        } else {
            let start = self.effective_page() * self.page_size;
            (start, (start + self.page_size).min(order.len()))
        };
        order[start..end].iter().map(|&i| &self.rows[i]).collect()
    }

    /// Restore paging and sorting from the request when it targets this
    /// table.
    pub fn restore_state(&mut self, request: &Request) {
        if request.param(params::TABLE) != Some(self.name()) {
            return;
        }
        if let Some(page) = request.param(params::PAGE).and_then(|p| p.parse().ok()) {
            self.page_number = page;
        }
        if let Some(column) = request.param(params::COLUMN) {
            if self.column(column).is_some_and(Column::is_sortable) {
                self.sort_column = Some(column.to_string());
                self.ascending = request
                    .param(params::ASCENDING)
                    .is_none_or(|a| !a.eq_ignore_ascii_case("false"));
            } else {
                tracing::warn!(target: targets::TABLE, table = self.name(), column, "ignoring unknown sort column");
            }
        }
        tracing::debug!(
            target: targets::TABLE,
            table = self.name(),
            page = self.page_number,
            column = self.sort_column.as_deref(),
            ascending = self.ascending,
            "restored table state"
        );
    }

    fn context(&self) -> DecoratorContext<'_> {
        DecoratorContext {
            table_name: self.name(),
            page_number: self.effective_page(),
            sort_column: self.sort_column.as_deref(),
            ascending: self.ascending,
            controls: self.container.children(),
        }
    }

    fn state_href(&self, page: usize, column: Option<&str>, ascending: bool) -> String {
        let page = page.to_string();
        let ascending = ascending.to_string();
        let mut pairs = vec![(params::TABLE, self.name()), (params::PAGE, page.as_str())];
        if let Some(column) = column {
            pairs.push((params::COLUMN, column));
            pairs.push((params::ASCENDING, ascending.as_str()));
        }
        build_href(&self.current_path, pairs)
    }

    fn render_header(&self, buffer: &mut HtmlStringBuffer) {
        buffer.append("<thead><tr>");
        for column in &self.columns {
            let sorted = self.sort_column.as_deref() == Some(column.name());
            buffer.element_start("th");
            if sorted {
                buffer.append_attribute("class", if self.ascending { "sorted ascending" } else { "sorted descending" });
            }
            buffer.close_tag();
            if column.is_sortable() {
                let next_ascending = !(sorted && self.ascending);
                buffer
                    .element_start("a")
                    .append_attribute("href", self.state_href(0, Some(column.name()), next_ascending))
                    .close_tag()
                    .append_escaped(column.header())
                    .element_end_tag("a");
            } else {
                buffer.append_escaped(column.header());
            }
            buffer.element_end_tag("th");
        }
        buffer.append("</tr></thead>");
    }

    fn render_pager(&self, buffer: &mut HtmlStringBuffer) {
        let pages = self.page_count();
        let current = self.effective_page();
        let column = self.sort_column.as_deref();

        buffer.append("<div class=\"pager\">");
        let link = |buffer: &mut HtmlStringBuffer, label: &str, page: usize, enabled: bool| {
            if enabled {
                buffer
                    .element_start("a")
                    .append_attribute("href", self.state_href(page, column, self.ascending))
                    .close_tag()
                    .append_escaped(label)
                    .element_end_tag("a");
            } else {
                buffer.append("<span class=\"disabled\">").append_escaped(label).append("</span>");
            }
            buffer.append_char(' ');
        };
        link(buffer, "First", 0, current > 0);
        link(buffer, "Previous", current.saturating_sub(1), current > 0);
        buffer
            .append("<span class=\"page\">")
            .append(format!("Page {} of {}", current + 1, pages))
            .append("</span> ");
        link(buffer, "Next", current + 1, current + 1 < pages);
        link(buffer, "Last", pages - 1, current + 1 < pages);
        buffer.append("</div>");
    }
}

impl<T: Send + Sync + 'static> Control for Table<T> {
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
        let request = ctx.request();
        self.current_path = format!("{}{}", request.context_path(), request.path());
        self.restore_state(request);
        self.container.process_children(ctx)
    }

    fn on_render(&mut self) {
        self.container.on_render_children();
    }

    fn on_destroy(&mut self) -> TrellisResult<()> {
        self.container.destroy_children();
        Ok(())
    }

    fn head_elements(&self) -> Vec<HeadElement> {
        vec![HeadElement::css_import("/trellis/table/table.css")]
    }

    fn render(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        let base = self.container.base();
        let name = base.require_name("Table")?;

        buffer
            .element_start("table")
            .append_attribute("id", base.html_id().unwrap_or(name))
            .append_attribute("class", base.attributes().get("class").unwrap_or("trellis-table"))
            .close_tag();
        self.render_header(buffer);

        buffer.append("<tbody>");
        let rows = self.displayed_rows();
        if rows.is_empty() {
            buffer
                .element_start("tr")
                .append_attribute("class", "empty")
                .close_tag()
                .element_start("td")
                .append_attribute("colspan", self.columns.len().max(1).to_string())
                .close_tag()
                .append("No data to display")
                .element_end_tag("td")
                .element_end_tag("tr");
        }
        let ctx = self.context();
        for (i, row) in rows.into_iter().enumerate() {
            buffer
                .element_start("tr")
                .append_attribute("class", if i % 2 == 0 { "odd" } else { "even" })
                .close_tag();
            for column in &self.columns {
                buffer.append("<td>");
                buffer.append(column.render_cell(row, &ctx)?);
                buffer.append("</td>");
            }
            buffer.element_end_tag("tr");
        }
        buffer.append("</tbody>");
        buffer.element_end_tag("table");

        if self.page_count() > 1 {
            self.render_pager(buffer);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_trellis_core::{ActionEventDispatcher, TrellisConfig};

    #[derive(Debug, Clone, serde::Serialize)]
    struct Customer {
        id: u32,
        name: &'static str,
        age: u32,
    }

    fn customers() -> Table<Customer> {
        let mut table = Table::new("customers").with_page_size(2);
        table.add_column(Column::new("name", |c: &Customer| c.name.to_string()));
        table.add_column(
            Column::new("age", |c: &Customer| c.age.to_string())
                .with_comparator(|a: &Customer, b: &Customer| a.age.cmp(&b.age)),
        );
        table.add_column(Column::new("id", |c: &Customer| c.id.to_string()).with_sortable(false));
        table.set_rows(vec![
            Customer { id: 1, name: "Cara", age: 41 },
            Customer { id: 2, name: "Ann", age: 9 },
            Customer { id: 3, name: "Bob", age: 30 },
            Customer { id: 4, name: "Dan", age: 30 },
            Customer { id: 5, name: "Eve", age: 52 },
        ]);
        table
    }

    fn names(table: &Table<Customer>) -> Vec<&'static str> {
        table.displayed_rows().iter().map(|c| c.name).collect()
    }

    fn process(table: &mut Table<Customer>, request: &Request) {
        let config = TrellisConfig::default();
        let mut dispatcher = ActionEventDispatcher::new();
        let mut ctx = ProcessContext::new(request, &config, &mut dispatcher);
        table.on_process(&mut ctx);
    }

    #[test]
    fn test_paging() {
        let mut table = customers();
        assert_eq!(table.page_count(), 3);
        assert_eq!(names(&table), ["Cara", "Ann"]);
        table.set_page_number(2);
        assert_eq!(names(&table), ["Eve"]);
        table.set_page_number(10);
        assert_eq!(table.effective_page(), 2);
    }

    #[test]
    fn test_stable_sort_both_directions() {
        let mut table = customers().with_page_size(0);
        table.set_sort_column(Some("age"), true);
        assert_eq!(names(&table), ["Ann", "Bob", "Dan", "Cara", "Eve"]);
        table.set_sort_column(Some("age"), false);
        assert_eq!(names(&table), ["Eve", "Cara", "Bob", "Dan", "Ann"]);
    }

    #[test]
    fn test_restore_state_from_request() {
        let mut table = customers();
        let request = Request::get("/list.htm")
            .with_param("table", "customers")
            .with_param("page", "1")
            .with_param("column", "name")
            .with_param("ascending", "false");
        process(&mut table, &request);
        assert_eq!(table.page_number(), 1);
        assert_eq!(table.sort_column(), Some("name"));
        assert!(!table.is_ascending());
        assert_eq!(names(&table), ["Cara", "Bob"]);
    }

    #[test]
    fn test_other_table_and_unsortable_column_ignored() {
        let mut table = customers();
        process(&mut table, &Request::get("/").with_param("table", "orders").with_param("page", "2"));
        assert_eq!(table.page_number(), 0);

        process(&mut table, &Request::get("/").with_param("table", "customers").with_param("column", "id"));
        assert_eq!(table.sort_column(), None);
    }

    #[test]
    fn test_render_header_and_pager() {
        let mut table = customers();
        table.set_sort_column(Some("name"), true);
        process(&mut table, &Request::get("/list.htm").with_context_path("/app"));
        let html = (&table as &dyn Control).to_html().unwrap();

        assert!(html.starts_with(r#"<table id="customers" class="trellis-table"><thead><tr>"#));
        assert!(html.contains(
            r#"<th class="sorted ascending"><a href="/app/list.htm?table=customers&amp;page=0&amp;column=name&amp;ascending=false">Name</a></th>"#
        ));
        assert!(html.contains(r#"<th>Id</th>"#));
        assert!(html.contains(r#"<tr class="odd"><td>Ann</td><td>9</td><td>2</td></tr>"#));
        assert!(html.contains(r#"<span class="page">Page 1 of 3</span>"#));
        assert!(html.contains(
            r#"<a href="/app/list.htm?table=customers&amp;page=1&amp;column=name&amp;ascending=true">Next</a>"#
        ));
        assert!(html.contains(r#"<span class="disabled">First</span>"#));
    }

    #[test]
    fn test_render_empty() {
        let mut table = customers();
        table.set_rows(Vec::new());
        let html = (&table as &dyn Control).to_html().unwrap();
        assert!(html.contains(r#"<tr class="empty"><td colspan="3">No data to display</td></tr>"#));
        assert!(!html.contains("pager"));
    }
}
