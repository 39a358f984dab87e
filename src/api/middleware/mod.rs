//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Auth validator: access token → `AuthUser`
//! 2. Audit logger: logs after auth, has the user id
//! 3. Admin gate: only on `/api/auth/admin/*`

pub mod audit;
pub mod auth;
