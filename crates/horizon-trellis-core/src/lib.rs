//! Core systems for Horizon Trellis.
//!
//! This crate provides the foundational pieces of the Horizon Trellis
//! server-side component framework:
//!
//! - **Control Model**: Controls with ids, names, non-owning parent links and
//!   ordered attributes, driven through a multi-phase request lifecycle
//! - **Containers**: Ordered, name-indexed child composition
//! - **Fields**: Request binding and validation state
//! - **Head Resources**: Stylesheet and script declarations
//! - **Signal/Slot System**: Synchronous change notification
//! - **Ambient Services**: Configuration, HTML output, request/response
//!   values and the template collaborator
//!
//! # Example
//!
//! ```
//! use horizon_trellis_core::{Control, HtmlStringBuffer, Panel};
//!
//! let mut page = Panel::new("content");
//! page.add(Panel::new("sidebar")).unwrap();
//!
//! let mut buffer = HtmlStringBuffer::new();
//! page.render(&mut buffer).unwrap();
//! assert_eq!(
//!     buffer.as_str(),
//!     r#"<div id="content"><div id="sidebar"></div></div>"#
//! );
//! ```

pub mod config;
pub mod container;
pub mod control;
mod error;
pub mod field;
pub mod head;
pub mod html;
pub mod logging;
pub mod request;
pub mod signal;
pub mod template;

pub use config::{DeploymentMode, MenuConfig, TrellisConfig};
pub use container::{ChildrenChange, ContainerBase, Panel};
pub use control::{
    ActionContext, ActionEvent, ActionEventDispatcher, ActionListener, AttributeMap, Control,
    ControlBase, ControlId, ProcessContext, find_control, find_control_mut, listener,
};
pub use error::{TrellisError, TrellisResult};
pub use field::{ErrorKind, Field, FieldBase, FieldError, label_from_name, process_field};
pub use head::{HeadCategory, HeadElement, HeadKey, Placement, Uniqueness, parse_head_snippet};
pub use html::{HtmlStringBuffer, escape_html};
pub use logging::{ControlTreeDebug, PerfSpan, TreeFormatOptions, TreeStyle};
pub use request::{
    FileItem, MultipartParser, Principal, Request, Response, UploadError, UploadLimits, params,
};
pub use signal::{ConnectionId, Signal};
pub use template::{PlaceholderTemplateService, TemplateModel, TemplateService};
