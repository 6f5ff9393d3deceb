//! Client factory -- the connectors available to this process, keyed by the
//! binding they speak, plus the resolver used to fetch agent cards.

use std::collections::HashMap;

use crate::negotiate::{self, Binding};
use crate::protocol::AgentCard;
use crate::session::SessionError;

use super::TransportError;
use super::trait_def::{CardResolver, Connector, Endpoint, Transport};

/// An open transport together with what was negotiated to get it.
pub struct Connection {
    pub card: AgentCard,
    pub binding: Binding,
    pub transport: Box<dyn Transport>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("agent", &self.card.name)
            .field("binding", &self.binding)
            .field("transport", &self.transport.name())
            .finish()
    }
}

/// A collection of registered [`Connector`] implementations.
///
/// # Example
///
/// ```ignore
/// let factory = ClientFactory::new()
///     .with_resolver(MyResolver::default())
///     .with_connector(MyJsonRpcConnector::default());
/// let conn = factory.connect(&Endpoint::new(url), None).await?;
/// ```
#[derive(Default)]
pub struct ClientFactory {
    resolver: Option<Box<dyn CardResolver>>,
    connectors: HashMap<Binding, Box<dyn Connector>>,
}

impl ClientFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(mut self, resolver: impl CardResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    pub fn with_connector(mut self, connector: impl Connector + 'static) -> Self {
        self.register(connector);
        self
    }

    /// Register a connector under the binding it reports.
    ///
    /// A connector already registered for that binding is replaced and
    /// returned.
    pub fn register(&mut self, connector: impl Connector + 'static) -> Option<Box<dyn Connector>> {
        self.connectors
            .insert(connector.binding(), Box::new(connector))
    }

    /// Look up the connector for a binding.
    pub fn get(&self, binding: Binding) -> Option<&dyn Connector> {
        self.connectors.get(&binding).map(|c| c.as_ref())
    }

    /// Bindings with a registered connector, in priority order.
    pub fn bindings(&self) -> Vec<Binding> {
        Binding::PRIORITY
            .into_iter()
            .filter(|b| self.connectors.contains_key(b))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    /// Fetch the agent card for an endpoint.
    pub async fn resolve_card(&self, endpoint: &Endpoint) -> Result<AgentCard, TransportError> {
        let resolver = self.resolver.as_ref().ok_or(TransportError::NoResolver)?;
        resolver.resolve(endpoint).await
    }

    /// Resolve, negotiate and connect.
    ///
    /// A forced binding is validated before the card is fetched, so a bad
    /// override never causes a network call.
    pub async fn connect(
        &self,
        endpoint: &Endpoint,
        forced: Option<&str>,
    ) -> Result<Connection, SessionError> {
        negotiate::parse_override(forced)?;

        let card = self.resolve_card(endpoint).await?;
        let binding = negotiate::negotiate(&card.advertised_bindings(), forced)?;

        let connector = self
            .get(binding)
            .ok_or(TransportError::NoConnector(binding))?;

        tracing::info!(
            agent = %card.name,
            %binding,
            url = %endpoint.service_url,
            "connecting"
        );
        let transport = connector.connect(&card, endpoint).await?;

        Ok(Connection {
            card,
            binding,
            transport,
        })
    }
}

impl std::fmt::Debug for ClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientFactory")
            .field("resolver", &self.resolver.is_some())
            .field("connectors", &self.bindings())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{SendMessageRequest, Task, TaskId};
    use crate::transport::trait_def::EventStream;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl Transport for Noop {
        fn name(&self) -> &str {
            "noop"
        }
        async fn send_message(&self, _r: &SendMessageRequest) -> Result<Task, TransportError> {
            Err(TransportError::Unsupported {
                operation: "send_message",
            })
        }
        fn send_streaming_message(&self, _r: &SendMessageRequest) -> EventStream {
            Box::pin(futures::stream::empty())
        }
        async fn get_task(&self, id: &TaskId) -> Result<Task, TransportError> {
            Err(TransportError::TaskNotFound(id.clone()))
        }
        fn subscribe_to_task(&self, _id: &TaskId) -> EventStream {
            Box::pin(futures::stream::empty())
        }
    }

    struct FakeConnector(Binding);

    #[async_trait]
    impl Connector for FakeConnector {
        fn binding(&self) -> Binding {
            self.0
        }
        async fn connect(
            &self,
            _card: &AgentCard,
            _endpoint: &Endpoint,
        ) -> Result<Box<dyn Transport>, TransportError> {
            Ok(Box::new(Noop))
        }
    }

    #[test]
    fn factory_starts_empty() {
        let factory = ClientFactory::new();
        assert!(factory.is_empty());
        assert_eq!(factory.len(), 0);
        assert!(factory.bindings().is_empty());
    }

    #[test]
    fn register_replaces_existing() {
        let mut factory = ClientFactory::new();
        assert!(factory.register(FakeConnector(Binding::Grpc)).is_none());
        let old = factory.register(FakeConnector(Binding::Grpc));
        assert_eq!(old.map(|c| c.binding()), Some(Binding::Grpc));
        assert_eq!(factory.len(), 1);
    }

    #[test]
    fn bindings_are_listed_in_priority_order() {
        let factory = ClientFactory::new()
            .with_connector(FakeConnector(Binding::HttpJson))
            .with_connector(FakeConnector(Binding::Grpc));
        assert_eq!(factory.bindings(), vec![Binding::Grpc, Binding::HttpJson]);
        assert!(factory.get(Binding::JsonRpc).is_none());
    }

    #[tokio::test]
    async fn connect_without_resolver_fails() {
        let factory = ClientFactory::new().with_connector(FakeConnector(Binding::JsonRpc));
        let err = factory
            .connect(&Endpoint::new("http://agent"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Transport(TransportError::NoResolver)));
    }

    #[test]
    fn debug_lists_bindings() {
        let factory = ClientFactory::new().with_connector(FakeConnector(Binding::Grpc));
        let debug = format!("{factory:?}");
        assert!(debug.contains("Grpc"), "unexpected debug output: {debug}");
    }
}
