use crate::{
    error::Error,
    map::NamedMap,
    types::{Binding, Message, Port, PortType, QName, Service},
};

/// Definitions read from a single WSDL document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub location: Option<String>,
    pub name: Option<String>,
    pub target_namespace: Option<String>,
    pub messages: NamedMap<Message>,
    pub port_types: NamedMap<PortType>,
    pub bindings: NamedMap<Binding>,
    pub services: NamedMap<Service>,
}

/// Every WSDL document reachable from the root, in import order.
#[derive(Debug, Clone, Default)]
pub struct DocumentCollection {
    documents: Vec<Document>,
}

impl DocumentCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, document: Document) {
        self.documents.push(document);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The `name` declared on the root document's `definitions` element.
    pub fn service_name(&self) -> Option<&str> {
        self.documents.first().and_then(|document| document.name.as_deref())
    }

    pub fn services(&self) -> impl Iterator<Item = (&str, &Service)> {
        self.documents
            .iter()
            .flat_map(|document| document.services.iter())
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.documents
            .iter()
            .find_map(|document| document.services.get(name))
    }

    pub fn service_port(&self, service_name: &str, port_name: &str) -> Option<&Port> {
        self.service(service_name)
            .and_then(|service| service.ports.get(port_name))
    }

    pub fn binding(&self, name: &QName) -> Option<&Binding> {
        self.documents
            .iter()
            .find_map(|document| document.bindings.get(&name.name))
    }

    pub fn port_type(&self, name: &QName) -> Option<&PortType> {
        self.documents
            .iter()
            .find_map(|document| document.port_types.get(&name.name))
    }

    pub fn message(&self, name: &QName) -> Option<&Message> {
        self.documents
            .iter()
            .find_map(|document| document.messages.get(&name.name))
    }
}

impl Port {
    pub fn fetch_binding<'a>(&self, documents: &'a DocumentCollection) -> Result<&'a Binding, Error> {
        documents
            .binding(&self.binding)
            .ok_or_else(|| Error::MissingDefinition {
                kind: "binding",
                name: self.binding.to_string(),
            })
    }
}

impl Binding {
    pub fn fetch_port_type<'a>(
        &self,
        documents: &'a DocumentCollection,
    ) -> Result<&'a PortType, Error> {
        documents
            .port_type(&self.port_type)
            .ok_or_else(|| Error::MissingDefinition {
                kind: "port type",
                name: self.port_type.to_string(),
            })
    }
}
