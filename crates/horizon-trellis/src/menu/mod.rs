//! Role-filtered navigation menus.
//!
//! Menus are built from a declarative XML document ([`parse_menu_xml`],
//! [`load_menu_file`]) into a [`MenuTree`], optionally shared through a
//! [`MenuCache`], and placed on a page with a [`MenuControl`].
//!
//! Selection propagates upward: an entry is selected when the request path
//! matches it or any of its descendants. Role filtering happens at render
//! time; an entry the request may not see is skipped together with its
//! children.

mod access;
mod cache;
mod control;
mod source;
mod tree;

pub use access::{AccessController, RoleAccessController};
pub use cache::MenuCache;
pub use control::MenuControl;
pub use source::{load_menu_file, parse_menu_xml};
pub use tree::{MenuItem, MenuNodeId, MenuTree};
