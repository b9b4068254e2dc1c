//! Cell decorators, including row action links.

use std::marker::PhantomData;

use horizon_trellis_core::{Control, HtmlStringBuffer, TrellisError, TrellisResult, params};
use serde::Serialize;

use super::property::PropertyPath;
use crate::link::as_parameter_link;

/// What a decorator can see while rendering a cell.
#[derive(Clone, Copy)]
pub struct DecoratorContext<'a> {
    pub(crate) table_name: &'a str,
    pub(crate) page_number: usize,
    pub(crate) sort_column: Option<&'a str>,
    pub(crate) ascending: bool,
    pub(crate) controls: &'a [Box<dyn Control>],
}

impl<'a> DecoratorContext<'a> {
    /// Name of the table being rendered.
    pub fn table_name(&self) -> &'a str {
        self.table_name
    }

    /// Zero-based page being rendered.
    pub fn page_number(&self) -> usize {
        self.page_number
    }

    /// Current sort column.
    pub fn sort_column(&self) -> Option<&'a str> {
        self.sort_column
    }

    /// Current sort direction.
    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    /// A control registered on the table.
    pub fn control(&self, name: &str) -> Option<&'a dyn Control> {
        self.controls
            .iter()
            .find(|c| c.name() == Some(name))
            .map(|c| c.as_ref())
    }

    /// Parameters that reproduce the table's paging and sorting state.
    pub fn state_parameters(&self) -> Vec<(String, String)> {
        let mut state = vec![
            (params::TABLE.to_string(), self.table_name.to_string()),
            (params::PAGE.to_string(), self.page_number.to_string()),
        ];
        if let Some(column) = self.sort_column {
            state.push((params::COLUMN.to_string(), column.to_string()));
            state.push((params::ASCENDING.to_string(), self.ascending.to_string()));
        }
        state
    }
}

/// Renders the content of a table cell.
pub trait Decorator<T>: Send + Sync {
    /// HTML for `row`. The output is inserted without escaping.
    fn render(&self, row: &T, ctx: &DecoratorContext<'_>) -> TrellisResult<String>;
}

/// Renders one or more registered links per row, each carrying the row's
/// identifier and the table state.
///
/// # Example
///
/// ```
/// use horizon_trellis::table::LinkDecorator;
///
/// #[derive(serde::Serialize)]
/// struct Customer { id: u32 }
///
/// let decorator = LinkDecorator::<Customer>::new(["edit", "delete"], "id").unwrap();
/// assert_eq!(decorator.id_property().as_str(), "id");
/// ```
pub struct LinkDecorator<T> {
    links: Vec<String>,
    id_property: PropertyPath,
    separator: String,
    _row: PhantomData<fn(&T)>,
}

impl<T: Serialize> LinkDecorator<T> {
    /// Decorate with the table controls named in `links`, identified by the
    /// row property at `id_property`.
    pub fn new<I, S>(links: I, id_property: &str) -> TrellisResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            links: links.into_iter().map(Into::into).collect(),
            id_property: PropertyPath::parse(id_property)?,
            separator: " | ".to_string(),
            _row: PhantomData,
        })
    }

    /// Text placed between links (builder pattern).
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// The identifier property path.
    pub fn id_property(&self) -> &PropertyPath {
        &self.id_property
    }
}

impl<T: Serialize> Decorator<T> for LinkDecorator<T> {
    fn render(&self, row: &T, ctx: &DecoratorContext<'_>) -> TrellisResult<String> {
        let id = self.id_property.extract(row)?.unwrap_or_default();
        let mut parameters = vec![(self.id_property.as_str().to_string(), id)];
        parameters.extend(ctx.state_parameters());

        let mut buffer = HtmlStringBuffer::new();
        for (i, name) in self.links.iter().enumerate() {
            let link = ctx
                .control(name)
                .and_then(as_parameter_link)
                .ok_or_else(|| {
                    TrellisError::invalid_argument(format!(
                        "table '{}' has no link control named '{name}'",
                        ctx.table_name()
                    ))
                })?;
            if i > 0 {
                buffer.append_escaped(&self.separator);
            }
            link.render_with(&mut buffer, &parameters)?;
        }
        Ok(buffer.into_string())
    }
}
