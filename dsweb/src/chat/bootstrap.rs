//! Session bootstrap: routing key, registration, login, listener.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use tokio::task::JoinHandle;

use super::inbound::attach_listener;
use crate::config::Config;
use crate::error::{BootstrapError, RestError};
use crate::models::{Credentials, LoginRequest, RegistrationRequest, Session};
use crate::pubsub::PubSubClient;
use crate::timeline::MessageRenderer;

/// Page name that never selects an intervention.
const RESERVED_PAGE: &str = "index";

/// Issues participant credentials.
#[async_trait]
pub trait Registrar: Send + Sync {
    async fn register(&self, request: &RegistrationRequest) -> Result<Credentials, RestError>;
}

/// Derive the routing key from a page location.
///
/// The last path segment up to its first `.` names the intervention
/// (`…/ds02.html` gives `DS02`). An empty segment or the reserved `index`
/// page keeps `default_key`.
pub fn derive_routing_key(location: &str, default_key: &str) -> String {
    let path = match Url::parse(location) {
        Ok(url) => url.path().to_string(),
        Err(_) => location
            .split(|c| c == '?' || c == '#')
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let segment = path.rsplit('/').next().unwrap_or_default();
    let stem = segment.split('.').next().unwrap_or_default();

    if stem.is_empty() || stem == RESERVED_PAGE {
        default_key.to_string()
    } else {
        stem.to_uppercase()
    }
}

/// Values the bootstrap sends along with registration and login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapSettings {
    pub role: String,
    pub intervention_password: String,
    pub default_routing_key: String,
}

impl From<&Config> for BootstrapSettings {
    fn from(config: &Config) -> Self {
        Self {
            role: config.role.clone(),
            intervention_password: config.intervention_password.clone(),
            default_routing_key: config.default_routing_key.clone(),
        }
    }
}

/// An established session together with its running listener.
pub struct ChatSession {
    pub session: Session,
    pub listener: JoinHandle<()>,
}

/// Brings a chat session up, one step at a time, stopping at the first failure.
pub struct SessionBootstrap {
    settings: BootstrapSettings,
    routing_key: String,
    registrar: Arc<dyn Registrar>,
    client: Arc<dyn PubSubClient>,
    renderer: MessageRenderer,
}

impl SessionBootstrap {
    /// Page load: pick the routing key from `location` and show it in the title.
    pub async fn load_page(
        location: &str,
        settings: BootstrapSettings,
        registrar: Arc<dyn Registrar>,
        client: Arc<dyn PubSubClient>,
        renderer: MessageRenderer,
    ) -> Self {
        let routing_key = derive_routing_key(location, &settings.default_routing_key);
        if routing_key != settings.default_routing_key {
            tracing::info!("Intervention pattern adjusted to {routing_key}");
        }

        {
            let mut surface = renderer.surface().lock().await;
            let title = format!("{} for intervention \"{routing_key}\"", surface.title());
            surface.set_title(&title);
        }

        Self {
            settings,
            routing_key,
            registrar,
            client,
            renderer,
        }
    }

    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    /// Register `display_name`, log in and attach the inbound listener.
    pub async fn start(&self, display_name: &str) -> Result<ChatSession, BootstrapError> {
        let surface = self.renderer.surface().clone();

        let name = display_name.trim();
        if name.is_empty() {
            let err = BootstrapError::EmptyDisplayName;
            surface.lock().await.alert(&err.to_string());
            return Err(err);
        }

        {
            let mut surface = surface.lock().await;
            let title = format!("{} for {name}", surface.title());
            surface.set_title(&title);
        }

        tracing::info!("Registering...");
        let request = RegistrationRequest {
            nickname: name.to_string(),
            role: self.settings.role.clone(),
            intervention_pattern: self.routing_key.clone(),
            intervention_password: self.settings.intervention_password.clone(),
        };
        let credentials = match self.registrar.register(&request).await {
            Ok(credentials) => credentials,
            Err(e) => {
                let err = BootstrapError::Registration(e);
                tracing::error!("{err}");
                surface.lock().await.set_status(&err.to_string());
                return Err(err);
            }
        };

        tracing::info!("Connecting...");
        let login = LoginRequest {
            user: credentials.user.clone(),
            secret: credentials.secret.clone(),
            role: self.settings.role.clone(),
            intervention_password: self.settings.intervention_password.clone(),
        };
        if let Err(e) = self.client.login(&login).await {
            let err = BootstrapError::Login(e);
            tracing::error!("{err}");
            surface.lock().await.set_status(&err.to_string());
            return Err(err);
        }
        tracing::info!("Connected.");

        surface.lock().await.show_messaging();

        let session = Session::new(
            name.to_string(),
            self.routing_key.clone(),
            credentials,
            self.client.clone(),
        );
        let listener = match attach_listener(&session, self.renderer.clone()).await {
            Ok(listener) => listener,
            Err(e) => {
                let err = BootstrapError::Login(e);
                tracing::error!("{err}");
                surface.lock().await.set_status(&err.to_string());
                return Err(err);
            }
        };

        Ok(ChatSession { session, listener })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubsub::LocalBroker;
    use crate::timeline::{share, MemorySurface};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    fn settings() -> BootstrapSettings {
        BootstrapSettings::from(&Config::default())
    }

    #[test]
    fn test_routing_key_from_page_name() {
        assert_eq!(derive_routing_key("http://host/web/ds02.html", "DS01"), "DS02");
        assert_eq!(derive_routing_key("http://host/web/Ab3.v2.html?x=1#top", "DS01"), "AB3");
        assert_eq!(derive_routing_key("web/pilot.html?nick=a", "DS01"), "PILOT");
    }

    #[test]
    fn test_routing_key_keeps_default() {
        assert_eq!(derive_routing_key("http://host/web/index.html", "DS01"), "DS01");
        assert_eq!(derive_routing_key("http://host/web/", "DS01"), "DS01");
        assert_eq!(derive_routing_key("", "DS01"), "DS01");
        assert_eq!(derive_routing_key("index", "XY"), "XY");
    }

    #[derive(Default)]
    struct CountingRegistrar {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Registrar for CountingRegistrar {
        async fn register(&self, _: &RegistrationRequest) -> Result<Credentials, RestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RestError::Status {
                command: "deepstream/register".to_string(),
                status: reqwest::StatusCode::FORBIDDEN,
                body: "Could not create participant/supervisor for deepstream access".to_string(),
            })
        }
    }

    struct StaticRegistrar(Credentials);

    #[async_trait]
    impl Registrar for StaticRegistrar {
        async fn register(&self, _: &RegistrationRequest) -> Result<Credentials, RestError> {
            Ok(self.0.clone())
        }
    }

    async fn bootstrap_with(
        location: &str,
        registrar: Arc<dyn Registrar>,
        client: Arc<dyn PubSubClient>,
    ) -> (Arc<Mutex<MemorySurface>>, SessionBootstrap) {
        let (memory, shared) = share(MemorySurface::with_title("Deepstream Web"));
        let bootstrap = SessionBootstrap::load_page(
            location,
            settings(),
            registrar,
            client,
            MessageRenderer::new(shared),
        )
        .await;
        (memory, bootstrap)
    }

    #[tokio::test]
    async fn test_page_load_sets_title() {
        let broker = LocalBroker::new();
        let (memory, bootstrap) = bootstrap_with(
            "http://host/ds07.html",
            Arc::new(broker.clone()),
            Arc::new(broker.connect()),
        )
        .await;
        assert_eq!(bootstrap.routing_key(), "DS07");
        assert_eq!(
            memory.lock().await.title,
            "Deepstream Web for intervention \"DS07\""
        );
    }

    #[tokio::test]
    async fn test_empty_name_never_registers() {
        let registrar = Arc::new(CountingRegistrar::default());
        let broker = LocalBroker::new();
        let (memory, bootstrap) =
            bootstrap_with("index.html", registrar.clone(), Arc::new(broker.connect())).await;

        let result = bootstrap.start("  ").await;
        assert!(matches!(result, Err(BootstrapError::EmptyDisplayName)));
        assert_eq!(registrar.calls.load(Ordering::SeqCst), 0);

        let surface = memory.lock().await;
        assert_eq!(surface.alerts, vec!["Choose a nickname, please!".to_string()]);
        assert!(!surface.messaging_visible);
    }

    #[tokio::test]
    async fn test_registration_failure_stops() {
        let registrar = Arc::new(CountingRegistrar::default());
        let broker = LocalBroker::new();
        let (memory, bootstrap) =
            bootstrap_with("index.html", registrar.clone(), Arc::new(broker.connect())).await;

        let result = bootstrap.start("alice").await;
        assert!(matches!(result, Err(BootstrapError::Registration(_))));
        assert_eq!(registrar.calls.load(Ordering::SeqCst), 1);

        let surface = memory.lock().await;
        assert_eq!(surface.status.len(), 1);
        assert!(surface.status[0].starts_with("Could not register"));
        assert!(!surface.messaging_visible);
    }

    #[tokio::test]
    async fn test_login_failure_stops() {
        // The broker never issued these credentials.
        let registrar = Arc::new(StaticRegistrar(Credentials {
            user: "ds:stranger".to_string(),
            secret: "x".to_string(),
        }));
        let broker = LocalBroker::new();
        let (memory, bootstrap) =
            bootstrap_with("index.html", registrar, Arc::new(broker.connect())).await;

        let result = bootstrap.start("alice").await;
        assert!(matches!(result, Err(BootstrapError::Login(_))));

        let surface = memory.lock().await;
        assert!(surface.status[0].starts_with("Could not connect"));
        assert!(!surface.messaging_visible);
    }

    #[tokio::test]
    async fn test_successful_start_attaches_listener() {
        let broker = LocalBroker::new();
        let (memory, bootstrap) = bootstrap_with(
            "http://host/ds03.html",
            Arc::new(broker.clone()),
            Arc::new(broker.connect()),
        )
        .await;

        let chat = bootstrap.start("alice").await.unwrap();
        assert_eq!(chat.session.display_name, "alice");
        assert_eq!(chat.session.routing_key, "DS03");
        assert!(chat.session.user().starts_with("ds:"));

        {
            let surface = memory.lock().await;
            assert!(surface.messaging_visible);
            assert_eq!(
                surface.title,
                "Deepstream Web for intervention \"DS03\" for alice"
            );
        }

        let reached = broker
            .emit(
                &chat.session.message_channel(),
                json!({"status": "SENT_BY_SYSTEM", "message": "welcome"}),
            )
            .await;
        assert_eq!(reached, 1);

        drop(chat.session);
        drop(bootstrap);
        drop(broker);
        chat.listener.await.unwrap();

        let surface = memory.lock().await;
        assert_eq!(surface.entries.len(), 1);
        assert_eq!(surface.entries[0].body, "welcome");
    }
}
