//! Reconciler - decides when to refresh the store registry.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::gate::{delete_prompt, Confirm};
use crate::backend::{HttpBackend, StoreBackend};
use crate::config::{DashboardConfig, PostCreatePolicy};
use crate::error::FetchError;
use crate::observability::{notice_channel, Notice, NoticeKind, Notifier};
use crate::presentation::StatusClass;
use crate::state::{ActionAck, Session};

/// Result of one refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Registry replaced with `count` stores
    Applied { seq: u64, count: usize },
    /// Response arrived after a newer refresh had been applied
    Stale { seq: u64 },
    /// List request failed; registry unchanged
    Failed { seq: u64 },
}

impl RefreshOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Result of a create action.
#[derive(Debug)]
pub enum CreateOutcome {
    /// Another create was still in flight; nothing was sent
    Rejected,
    /// Backend acknowledged the request; `follow_up` is the scheduled refresh
    Requested {
        ack: ActionAck,
        follow_up: JoinHandle<()>,
    },
    /// Request failed. A follow-up refresh is still scheduled when the
    /// backend answered at all.
    Failed {
        error: FetchError,
        follow_up: Option<JoinHandle<()>>,
    },
}

impl CreateOutcome {
    /// The scheduled follow-up refresh, if any
    pub fn follow_up(self) -> Option<JoinHandle<()>> {
        match self {
            Self::Rejected => None,
            Self::Requested { follow_up, .. } => Some(follow_up),
            Self::Failed { follow_up, .. } => follow_up,
        }
    }
}

/// Result of a delete action.
#[derive(Debug)]
pub enum DeleteOutcome {
    /// Operator said no; nothing was sent
    Declined,
    Requested {
        ack: ActionAck,
        refresh: RefreshOutcome,
    },
    Failed {
        error: FetchError,
        refresh: Option<RefreshOutcome>,
    },
}

/// Keeps the session registry in line with the backend.
///
/// Refreshes happen on mount, on demand, after a create (delayed or
/// polled, see [`PostCreatePolicy`]) and right after a delete. There is no
/// background polling beyond that.
pub struct Reconciler<B: ?Sized> {
    backend: Arc<B>,
    session: Session,
    notifier: Notifier,
    post_create: PostCreatePolicy,
}

impl<B: ?Sized> Clone for Reconciler<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            session: self.session.clone(),
            notifier: self.notifier.clone(),
            post_create: self.post_create,
        }
    }
}

impl Reconciler<HttpBackend> {
    /// HTTP reconciler for `config`, with a fresh session and the
    /// receiving end of its notice channel.
    pub fn from_config(
        config: &DashboardConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Notice>), FetchError> {
        let backend = Arc::new(HttpBackend::new(config)?);
        let (notifier, notices) = notice_channel();
        let reconciler = Self::new(backend, Session::new(), notifier)
            .with_post_create(config.post_create.policy());
        Ok((reconciler, notices))
    }
}

impl<B> Reconciler<B>
where
    B: StoreBackend + ?Sized + 'static,
{
    pub fn new(backend: Arc<B>, session: Session, notifier: Notifier) -> Self {
        Self {
            backend,
            session,
            notifier,
            post_create: PostCreatePolicy::default(),
        }
    }

    pub fn with_post_create(mut self, policy: PostCreatePolicy) -> Self {
        self.post_create = policy;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Initial refresh when the dashboard comes up
    pub async fn mount(&self) -> RefreshOutcome {
        tracing::info!("Mounting dashboard");
        self.refresh().await
    }

    /// List stores and replace the registry.
    ///
    /// Never fails: a failed list leaves the registry as it was and still
    /// clears this refresh's share of `loading`.
    pub async fn refresh(&self) -> RefreshOutcome {
        let ticket = self.session.begin_refresh();
        let seq = ticket.seq();

        match self.backend.list_stores().await {
            Ok(stores) => {
                let count = stores.len();
                if ticket.apply(stores) {
                    tracing::debug!(seq, count, "Store registry replaced");
                    RefreshOutcome::Applied { seq, count }
                } else {
                    tracing::debug!(seq, "Discarding response from superseded refresh");
                    RefreshOutcome::Stale { seq }
                }
            }
            Err(e) => {
                ticket.release();
                self.notifier.emit(Notice::new(
                    NoticeKind::RefreshFailed,
                    format!("Failed to refresh stores: {}", e),
                ));
                RefreshOutcome::Failed { seq }
            }
        }
    }

    /// Request a new store.
    ///
    /// `creating` stays high only for the request round-trip. Once the
    /// backend answers, one follow-up refresh is scheduled; the registry is
    /// not touched optimistically.
    pub async fn create_store(&self) -> CreateOutcome {
        let Some(guard) = self.session.try_begin_create() else {
            self.notifier.emit(Notice::new(
                NoticeKind::CreateRejected,
                "A create request is already in flight",
            ));
            return CreateOutcome::Rejected;
        };

        let result = self.backend.create_store().await;
        drop(guard);

        match result {
            Ok(ack) => {
                let message = match &ack.store_id {
                    Some(id) => format!("Provisioning started for {}", id),
                    None => "Store creation requested".to_string(),
                };
                let mut notice = Notice::new(NoticeKind::CreateRequested, message);
                notice.store_id = ack.store_id.clone();
                self.notifier.emit(notice);

                let follow_up = self.schedule_post_create(ack.store_id.clone());
                CreateOutcome::Requested { ack, follow_up }
            }
            Err(error) => {
                self.notifier.emit(Notice::new(
                    NoticeKind::CreateFailed,
                    format!("Create request failed: {}", error),
                ));
                let follow_up = error
                    .is_acknowledged()
                    .then(|| self.schedule_post_create(None));
                CreateOutcome::Failed { error, follow_up }
            }
        }
    }

    /// Delete a store after the operator confirms, then refresh at once.
    pub async fn delete_store(&self, store_id: &str, confirm: &dyn Confirm) -> DeleteOutcome {
        if !confirm.confirm(&delete_prompt(store_id)) {
            tracing::debug!(store_id = %store_id, "Delete declined");
            return DeleteOutcome::Declined;
        }

        match self.backend.delete_store(store_id).await {
            Ok(ack) => {
                self.notifier.emit(
                    Notice::new(
                        NoticeKind::DeleteRequested,
                        format!("Deletion started for {}", store_id),
                    )
                    .for_store(store_id),
                );
                let refresh = self.refresh().await;
                DeleteOutcome::Requested { ack, refresh }
            }
            Err(error) => {
                self.notifier.emit(
                    Notice::new(
                        NoticeKind::DeleteFailed,
                        format!("Delete request for {} failed: {}", store_id, error),
                    )
                    .for_store(store_id),
                );
                let refresh = if error.is_acknowledged() {
                    Some(self.refresh().await)
                } else {
                    None
                };
                DeleteOutcome::Failed { error, refresh }
            }
        }
    }

    fn schedule_post_create(&self, store_id: Option<String>) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.run_post_create(store_id).await })
    }

    async fn run_post_create(&self, store_id: Option<String>) {
        match self.post_create {
            PostCreatePolicy::Delay(delay) => {
                tracing::debug!(delay = ?delay, "Post-create refresh scheduled");
                tokio::time::sleep(delay).await;
                self.refresh().await;
            }
            PostCreatePolicy::Poll {
                interval,
                max_attempts,
            } => {
                for attempt in 1..=max_attempts {
                    tokio::time::sleep(interval).await;
                    let outcome = self.refresh().await;
                    if !matches!(outcome, RefreshOutcome::Failed { .. })
                        && self.provisioning_settled(store_id.as_deref())
                    {
                        let mut notice = Notice::new(
                            NoticeKind::ProvisioningSettled,
                            format!("Provisioning settled after {} refresh(es)", attempt),
                        );
                        notice.store_id = store_id.clone();
                        self.notifier.emit(notice);
                        return;
                    }
                    tracing::debug!(attempt, max_attempts, "Store still provisioning");
                }

                let mut notice = Notice::new(
                    NoticeKind::PollExhausted,
                    format!(
                        "Still provisioning after {} refreshes; refresh manually to follow up",
                        max_attempts
                    ),
                );
                notice.store_id = store_id;
                self.notifier.emit(notice);
            }
        }
    }

    /// Whether the created store has left the provisioning class. Without an
    /// id, every store must have left it, and an empty list has not settled.
    fn provisioning_settled(&self, store_id: Option<&str>) -> bool {
        let settled = |status: &str| StatusClass::of(status) != StatusClass::Provisioning;
        self.session.read(|state| match store_id {
            Some(id) => state
                .registry()
                .get(id)
                .is_some_and(|store| settled(&store.status)),
            None => {
                !state.stores().is_empty()
                    && state.stores().iter().all(|store| settled(&store.status))
            }
        })
    }
}
