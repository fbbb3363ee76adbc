//! WSDL operation lookup.
//!
//! [`Wsdl`] reads a WSDL document (and everything it imports) and answers
//! questions about its services, ports and operations. Lookups by name fail
//! with an error listing the names that do exist.

use once_cell::sync::OnceCell;

mod importer;
mod map;
mod operation;
mod parser;

pub mod document;
pub mod error;
pub mod resolver;
pub mod schema;
pub mod types;

pub use document::{Document, DocumentCollection};
pub use error::Error;
pub use importer::Importer;
pub use map::NamedMap;
pub use operation::Operation;
pub use resolver::{Http, ReqwestHttp, Resolver};
pub use schema::SchemaCollection;

use types::Port;

/// Every service of a WSDL with its ports, in declaration order.
pub type Services = NamedMap<ServiceInfo>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    pub ports: NamedMap<PortInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// The binding the port refers to, as written.
    pub ty: String,
    pub location: String,
}

#[derive(Debug)]
pub struct Wsdl {
    documents: DocumentCollection,
    schemas: SchemaCollection,
    services: OnceCell<Services>,
}

impl Wsdl {
    /// Reads the WSDL at `location` (a URL, a path, or the document itself)
    /// and resolves its imports, fetching remote documents through `http`.
    pub fn new<H: Http>(location: &str, http: H) -> Result<Self, Error> {
        let mut documents = DocumentCollection::new();
        let mut schemas = SchemaCollection::new();

        let resolver = Resolver::new(http);
        Importer::new(resolver, &mut documents, &mut schemas).import(location)?;

        Ok(Self::from_collections(documents, schemas))
    }

    pub fn from_collections(documents: DocumentCollection, schemas: SchemaCollection) -> Self {
        Self {
            documents,
            schemas,
            services: OnceCell::new(),
        }
    }

    pub fn documents(&self) -> &DocumentCollection {
        &self.documents
    }

    pub fn schemas(&self) -> &SchemaCollection {
        &self.schemas
    }

    pub fn service_name(&self) -> Option<&str> {
        self.documents.service_name()
    }

    /// Services and their ports. Built on first use, then cached.
    pub fn services(&self) -> &Services {
        self.services.get_or_init(|| self.build_services())
    }

    /// Names of the operations available on a port, in binding order.
    pub fn operations(&self, service_name: &str, port_name: &str) -> Result<Vec<&str>, Error> {
        self.verify_service_exists(service_name)?;
        self.verify_port_exists(service_name, port_name)?;

        let port = self.port(service_name, port_name)?;
        let binding = port.fetch_binding(&self.documents)?;

        Ok(binding.operations.names().collect())
    }

    pub fn operation(
        &self,
        service_name: &str,
        port_name: &str,
        operation_name: &str,
    ) -> Result<Operation<'_>, Error> {
        self.verify_operation_exists(service_name, port_name, operation_name)?;

        let port = self.port(service_name, port_name)?;
        let endpoint = port.location.as_str();

        let binding = port.fetch_binding(&self.documents)?;
        let binding_operation =
            binding
                .operations
                .get(operation_name)
                .ok_or_else(|| Error::MissingDefinition {
                    kind: "binding operation",
                    name: operation_name.to_owned(),
                })?;

        let port_type = binding.fetch_port_type(&self.documents)?;
        let port_type_operation =
            port_type
                .operations
                .get(operation_name)
                .ok_or_else(|| Error::MissingDefinition {
                    kind: "port type operation",
                    name: operation_name.to_owned(),
                })?;

        Ok(Operation::new(
            binding_operation.name.as_str(),
            endpoint,
            binding,
            binding_operation,
            port_type_operation,
            self,
        ))
    }

    fn port(&self, service_name: &str, port_name: &str) -> Result<&Port, Error> {
        self.documents
            .service_port(service_name, port_name)
            .ok_or_else(|| Error::MissingDefinition {
                kind: "port",
                name: port_name.to_owned(),
            })
    }

    fn build_services(&self) -> Services {
        let mut services = Services::new();

        for (service_name, service) in self.documents.services() {
            // The first declaration wins, matching `DocumentCollection::service`.
            if services.contains(service_name) {
                continue;
            }

            let ports = service
                .ports
                .iter()
                .map(|(port_name, port)| {
                    let info = PortInfo {
                        ty: port.ty(),
                        location: port.location.clone(),
                    };

                    (port_name.to_owned(), info)
                })
                .collect();

            services.insert(service_name, ServiceInfo { ports });
        }

        services
    }

    fn verify_operation_exists(
        &self,
        service_name: &str,
        port_name: &str,
        operation_name: &str,
    ) -> Result<(), Error> {
        let operations = self.operations(service_name, port_name)?;

        if !operations.contains(&operation_name) {
            return Err(Error::UnknownOperation {
                service: service_name.to_owned(),
                port: port_name.to_owned(),
                name: operation_name.to_owned(),
                alternatives: operations.into_iter().map(ToOwned::to_owned).collect(),
            });
        }

        Ok(())
    }

    fn verify_port_exists(&self, service_name: &str, port_name: &str) -> Result<(), Error> {
        let ports = match self.services().get(service_name) {
            Some(service) => &service.ports,
            None => return self.verify_service_exists(service_name),
        };

        if !ports.contains(port_name) {
            return Err(Error::UnknownPort {
                service: service_name.to_owned(),
                name: port_name.to_owned(),
                alternatives: ports.names().map(ToOwned::to_owned).collect(),
            });
        }

        Ok(())
    }

    fn verify_service_exists(&self, service_name: &str) -> Result<(), Error> {
        let services = self.services();

        if !services.contains(service_name) {
            return Err(Error::UnknownService {
                name: service_name.to_owned(),
                alternatives: services.names().map(ToOwned::to_owned).collect(),
            });
        }

        Ok(())
    }
}
