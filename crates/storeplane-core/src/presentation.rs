//! Presentation - status classes and the dashboard view model.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::state::{DashboardState, Store};

/// Presentation category of a store's raw status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Ready,
    Failed,
    Provisioning,
}

impl StatusClass {
    /// Classify a raw status. Exact, case-sensitive match; anything that is
    /// not `Ready` or `Failed` is still provisioning.
    pub fn of(status: &str) -> Self {
        match status {
            "Ready" => Self::Ready,
            "Failed" => Self::Failed,
            _ => Self::Provisioning,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Provisioning => "provisioning",
        }
    }

    /// Style class pair used by the web dashboard
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Ready => "status ready",
            Self::Failed => "status failed",
            Self::Provisioning => "status provisioning",
        }
    }
}

/// Outbound link on a store card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLink {
    pub label: &'static str,
    pub url: String,
    /// Rendered as clickable whenever a URL is present. Placeholder text
    /// from the backend is not filtered out.
    pub enabled: bool,
}

impl StoreLink {
    fn new(label: &'static str, url: &str) -> Self {
        Self {
            label,
            url: url.to_string(),
            enabled: !url.trim().is_empty(),
        }
    }
}

/// One store as the dashboard shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCard {
    pub store_id: String,
    pub namespace: String,
    pub status: String,
    pub class: StatusClass,
    pub created_at: Option<DateTime<Utc>>,
    pub nodeport: StoreLink,
    pub ingress: StoreLink,
}

impl StoreCard {
    pub fn from_store(store: &Store) -> Self {
        Self {
            store_id: store.store_id.clone(),
            namespace: store.namespace.clone(),
            status: store.status.clone(),
            class: StatusClass::of(&store.status),
            created_at: store.created_at(),
            nodeport: StoreLink::new("Open NodePort", &store.nodeport_url),
            ingress: StoreLink::new("Open Ingress", &store.ingress_url),
        }
    }

    pub fn links(&self) -> [&StoreLink; 2] {
        [&self.nodeport, &self.ingress]
    }
}

/// Main content area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewBody {
    Loading,
    Empty,
    Grid(Vec<StoreCard>),
}

/// Full dashboard frame: action bar plus content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub create_label: &'static str,
    pub create_enabled: bool,
    pub body: ViewBody,
}

impl DashboardView {
    pub fn from_state(state: &DashboardState) -> Self {
        let body = if state.is_loading() {
            ViewBody::Loading
        } else if state.registry().is_empty() {
            ViewBody::Empty
        } else {
            ViewBody::Grid(state.stores().iter().map(StoreCard::from_store).collect())
        };

        Self {
            create_label: if state.is_creating() {
                "Provisioning…"
            } else {
                "+ Create Store"
            },
            create_enabled: !state.is_creating(),
            body,
        }
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Store Provisioning Platform")?;
        writeln!(f, "===========================")?;
        let create = if self.create_enabled {
            format!("[{}]", self.create_label)
        } else {
            format!("({})", self.create_label)
        };
        writeln!(f, "[Refresh] {}", create)?;
        writeln!(f)?;

        match &self.body {
            ViewBody::Loading => writeln!(f, "Loading stores…"),
            ViewBody::Empty => writeln!(f, "No stores provisioned yet."),
            ViewBody::Grid(cards) => {
                for card in cards {
                    writeln!(f, "{}  [{}] {}", card.store_id, card.class.name(), card.status)?;
                    writeln!(f, "  Namespace: {}", card.namespace)?;
                    if let Some(created) = card.created_at {
                        writeln!(f, "  Created:   {}", created.format("%Y-%m-%d %H:%M:%S UTC"))?;
                    }
                    for link in card.links() {
                        if link.enabled {
                            writeln!(f, "  {} ↗ {}", link.label, link.url)?;
                        } else {
                            writeln!(f, "  {} (unavailable)", link.label)?;
                        }
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Session;

    fn ready_store() -> Store {
        Store {
            store_id: "s1".to_string(),
            namespace: "ns1".to_string(),
            status: "Ready".to_string(),
            nodeport_url: "http://a".to_string(),
            ingress_url: "http://b".to_string(),
            ..Store::default()
        }
    }

    #[test]
    fn only_exact_ready_and_failed_are_special() {
        assert_eq!(StatusClass::of("Ready"), StatusClass::Ready);
        assert_eq!(StatusClass::of("Failed"), StatusClass::Failed);
        for raw in ["ready", "READY", "failed", "Provisioning", "Deleting", "Deleted", "", " Ready"] {
            assert_eq!(StatusClass::of(raw), StatusClass::Provisioning, "{raw:?}");
        }
    }

    #[test]
    fn css_classes() {
        assert_eq!(StatusClass::Ready.css_class(), "status ready");
        assert_eq!(StatusClass::Failed.css_class(), "status failed");
        assert_eq!(StatusClass::Provisioning.css_class(), "status provisioning");
    }

    #[test]
    fn ready_store_renders_enabled_links() {
        let session = Session::new();
        session.begin_refresh().apply(vec![ready_store()]);

        let view = DashboardView::from_state(&session.snapshot());
        let ViewBody::Grid(cards) = &view.body else {
            panic!("expected grid, got {:?}", view.body);
        };
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].class, StatusClass::Ready);
        assert!(cards[0].nodeport.enabled);
        assert!(cards[0].ingress.enabled);
        assert_eq!(cards[0].ingress.url, "http://b");
    }

    #[test]
    fn empty_registry_renders_empty_state() {
        let session = Session::new();
        session.begin_refresh().apply(vec![]);

        let view = DashboardView::from_state(&session.snapshot());
        assert_eq!(view.body, ViewBody::Empty);
        assert!(view.to_string().contains("No stores provisioned yet."));
    }

    #[test]
    fn loading_hides_grid() {
        let session = Session::new();
        session.begin_refresh().apply(vec![ready_store()]);
        let _ticket = session.begin_refresh();

        let view = DashboardView::from_state(&session.snapshot());
        assert_eq!(view.body, ViewBody::Loading);
    }

    #[test]
    fn creating_disables_create_action() {
        let session = Session::new();
        let _guard = session.try_begin_create().unwrap();

        let view = DashboardView::from_state(&session.snapshot());
        assert!(!view.create_enabled);
        assert_eq!(view.create_label, "Provisioning…");
        assert!(view.to_string().contains("(Provisioning…)"));
    }

    #[test]
    fn missing_urls_render_disabled() {
        let card = StoreCard::from_store(&Store {
            store_id: "s2".to_string(),
            status: "Provisioning".to_string(),
            ..Store::default()
        });
        assert!(!card.nodeport.enabled);
        assert!(!card.ingress.enabled);
    }
}
