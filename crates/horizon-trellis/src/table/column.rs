//! Table columns.

use std::cmp::Ordering;
use std::sync::Arc;

use horizon_trellis_core::{TrellisResult, escape_html, label_from_name};
use serde::Serialize;

use super::decorator::{Decorator, DecoratorContext};
use super::property::PropertyPath;

/// Extracts the display value of a cell.
pub type ValueFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// Orders two rows for a column.
pub type CompareFn<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// A table column.
///
/// Cells show the escaped extracted value unless a [`Decorator`] is set.
/// Sorting uses the comparator, or compares extracted values as text when
/// none is given.
pub struct Column<T> {
    name: String,
    header: String,
    value: ValueFn<T>,
    comparator: Option<CompareFn<T>>,
    decorator: Option<Arc<dyn Decorator<T>>>,
    sortable: bool,
}

impl<T> Column<T> {
    /// Create a sortable column with a header derived from `name`.
    pub fn new<F>(name: impl Into<String>, value: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            header: label_from_name(&name),
            name,
            value: Arc::new(value),
            comparator: None,
            decorator: None,
            sortable: true,
        }
    }

    /// Set the header text (builder pattern).
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Set the sort comparator (builder pattern).
    pub fn with_comparator<F>(mut self, compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.comparator = Some(Arc::new(compare));
        self
    }

    /// Set the cell decorator (builder pattern).
    pub fn with_decorator<D>(mut self, decorator: D) -> Self
    where
        D: Decorator<T> + 'static,
    {
        self.decorator = Some(Arc::new(decorator));
        self
    }

    /// Enable or disable header sorting (builder pattern).
    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    /// Column name, used as the sort parameter.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Header text.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Returns true if the header offers sorting.
    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    /// The display value of `row`.
    pub fn value(&self, row: &T) -> String {
        (self.value)(row)
    }

    /// Order two rows.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        match &self.comparator {
            Some(compare) => compare(a, b),
            None => self.value(a).cmp(&self.value(b)),
        }
    }

    /// The HTML content of the cell for `row`.
    pub fn render_cell(&self, row: &T, ctx: &DecoratorContext<'_>) -> TrellisResult<String> {
        match &self.decorator {
            Some(decorator) => decorator.render(row, ctx),
            None => Ok(escape_html(&self.value(row))),
        }
    }
}

impl<T: Serialize + 'static> Column<T> {
    /// A column showing the row property at `path`, for example
    /// `address.city`.
    pub fn property(name: impl Into<String>, path: &str) -> TrellisResult<Self> {
        let path = PropertyPath::parse(path)?;
        Ok(Self::new(name, move |row: &T| {
            path.extract(row).ok().flatten().unwrap_or_default()
        }))
    }
}
