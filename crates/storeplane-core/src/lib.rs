//! Storeplane Core - client side of the store provisioning dashboard
//!
//! This crate keeps a local view of the stores known to the provisioning
//! control plane, decides when that view is refreshed, gates the create and
//! delete actions, and turns store status into something to render.

pub mod backend;
pub mod config;
pub mod error;
pub mod observability;
pub mod presentation;
pub mod reconcile;
pub mod state;

pub use backend::{HttpBackend, StoreBackend};
pub use config::{DashboardConfig, PostCreatePolicy};
pub use error::{ConfigError, FetchError};
pub use observability::{Notice, NoticeKind, Notifier};
pub use presentation::{DashboardView, StatusClass, StoreCard, ViewBody};
pub use reconcile::{AssumeYes, Confirm, CreateOutcome, DeleteOutcome, Reconciler, RefreshOutcome};
pub use state::{DashboardState, Session, Store, StoreRegistry};
