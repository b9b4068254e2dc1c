//! Role checks for protected menu items.

use horizon_trellis_core::Request;

/// Decides whether a request may see a role-restricted menu entry.
pub trait AccessController: Send + Sync {
    /// Returns true if the request's user holds `role`.
    fn has_role_access(&self, request: &Request, role: &str) -> bool;
}

/// Checks roles against the request principal.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAccessController;

impl AccessController for RoleAccessController {
    fn has_role_access(&self, request: &Request, role: &str) -> bool {
        request.is_user_in_role(role)
    }
}
