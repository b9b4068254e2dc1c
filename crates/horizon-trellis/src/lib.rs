//! Horizon Trellis - a server-side component web framework.
//!
//! This is the main crate. It re-exports the object model of
//! `horizon-trellis-core` and adds the concrete controls:
//!
//! - [`field`]: text, hidden, date, number, telephone, colour, pick list,
//!   hidden list and file fields with validation
//! - [`form`]: forms and submit buttons
//! - [`link`]: action and page links
//! - [`head`]: page-wide head resource aggregation
//! - [`menu`]: role-filtered navigation menus from XML documents
//! - [`table`]: sortable, pageable tables with row link decorators
//! - [`page`]: the page root and request lifecycle
//!
//! # Example
//!
//! ```
//! use horizon_trellis::field::{NumberField, TextField};
//! use horizon_trellis::form::{Form, Submit};
//! use horizon_trellis::page::Page;
//! use horizon_trellis::{Request, TrellisConfig};
//!
//! let mut form = Form::new("order");
//! form.add(TextField::new("customer").required()).unwrap();
//! form.add(NumberField::with_pattern("quantity", "#,##0")).unwrap();
//! form.add(Submit::new("place", "Place order")).unwrap();
//!
//! let mut page = Page::new("/order.htm").with_title("Order");
//! page.add(form).unwrap();
//!
//! let request = Request::post("/order.htm")
//!     .with_param("form_name", "order")
//!     .with_param("customer", "Ann")
//!     .with_param("quantity", "2.54");
//! let response = page.process(&request, &TrellisConfig::default()).unwrap();
//! assert!(response.body.contains(r#"value="3""#));
//! ```

pub use horizon_trellis_core::*;

pub mod field;
pub mod form;
pub mod head;
pub mod link;
pub mod menu;
pub mod page;
pub mod table;

pub use form::{Form, Submit};
pub use head::PageImports;
pub use link::{ActionLink, PageLink};
pub use menu::{MenuCache, MenuControl, MenuTree};
pub use page::{ErrorPage, Page};
pub use table::{Column, LinkDecorator, Table};
