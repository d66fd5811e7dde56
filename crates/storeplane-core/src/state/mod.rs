//! State management - store model, registry snapshot, and session flags.

mod registry;
mod session;
mod store;

pub use registry::StoreRegistry;
pub use session::{CreateGuard, DashboardState, RefreshTicket, Session};
pub use store::{ActionAck, Store, StoreList};
