//! REST API over the schedule store.
//!
//! ```text
//! handlers ──► ScheduleStore (engine) ──► conflict check + WAL
//!    ▲
//!    └── require_lecturer ──► Authorizer
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
