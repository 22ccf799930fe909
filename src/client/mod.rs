//! Operator client subsystem.
//!
//! # Data Flow
//! ```text
//! Operator picks a roster profile
//!     → session.rs (AdminSession: who is claimed, what is allowed)
//!     → dashboard.rs (DashboardClient: one call per dashboard action)
//!     → gateway mounts (/api/admin, /api/admin/action, /api/ai)
//! ```

pub mod dashboard;
pub mod session;

pub use dashboard::{ClientError, DashboardClient};
pub use session::{find_profile, roster, AdminProfile, AdminRole, AdminSession};
