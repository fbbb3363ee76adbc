use std::fmt;

use crate::map::NamedMap;

pub use lather_util::SoapVersion;

pub const WSDL_NS: &str = "http://schemas.xmlsoap.org/wsdl/";
pub const WSDL_SOAP_11_NS: &str = "http://schemas.xmlsoap.org/wsdl/soap/";
pub const WSDL_SOAP_12_NS: &str = "http://schemas.xmlsoap.org/wsdl/soap12/";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// A qualified reference such as `tns:StockQuoteBinding`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    pub prefix: Option<String>,
    pub namespace: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub element: Option<QName>,
    pub ty: Option<QName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub name: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortTypeOperation {
    pub name: String,
    pub documentation: Option<String>,
    pub input: Option<QName>,
    pub output: Option<QName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortType {
    pub name: String,
    pub operations: NamedMap<PortTypeOperation>,
}

/// The `soap:body` of a binding operation's input or output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingBody {
    pub use_: Option<String>,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingOperation {
    pub name: String,
    pub soap_action: Option<String>,
    pub style: Option<String>,
    pub input: Option<BindingBody>,
    pub output: Option<BindingBody>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub port_type: QName,
    pub style: Option<String>,
    pub transport: Option<String>,
    pub version: Option<SoapVersion>,
    pub operations: NamedMap<BindingOperation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub name: String,
    pub binding: QName,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub ports: NamedMap<Port>,
}

impl QName {
    pub fn new(prefix: Option<String>, namespace: Option<String>, name: impl Into<String>) -> Self {
        Self {
            prefix,
            namespace,
            name: name.into(),
        }
    }

    pub fn local(name: impl Into<String>) -> Self {
        Self::new(None, None, name)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// The SOAP version announced by a `soap:binding` or `soap12:binding` namespace.
pub fn binding_soap_version(namespace: &str) -> Option<SoapVersion> {
    match namespace {
        WSDL_SOAP_11_NS => Some(SoapVersion::Soap11),
        WSDL_SOAP_12_NS => Some(SoapVersion::Soap12),
        _ => None,
    }
}

impl BindingOperation {
    /// The operation's style, falling back to the binding default and then `document`.
    pub fn style_or<'a>(&'a self, binding: &'a Binding) -> &'a str {
        self.style
            .as_deref()
            .or(binding.style.as_deref())
            .unwrap_or("document")
    }
}

impl Port {
    /// The port's binding reference as written in the document.
    pub fn ty(&self) -> String {
        self.binding.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_names_print_as_written() {
        let name = QName::new(
            Some("tns".to_owned()),
            Some("http://example.com/stock".to_owned()),
            "StockQuoteBinding",
        );

        assert_eq!(name.to_string(), "tns:StockQuoteBinding");
        assert_eq!(QName::local("Plain").to_string(), "Plain");
    }

    #[test]
    fn soap_version_from_binding_namespace() {
        assert_eq!(
            binding_soap_version(WSDL_SOAP_11_NS),
            Some(SoapVersion::Soap11)
        );
        assert_eq!(
            binding_soap_version(WSDL_SOAP_12_NS),
            Some(SoapVersion::Soap12)
        );
        assert_eq!(binding_soap_version(WSDL_NS), None);
    }

    #[test]
    fn operation_style_falls_back_to_binding() {
        let mut binding = Binding {
            name: "B".to_owned(),
            port_type: QName::local("PT"),
            style: None,
            transport: None,
            version: None,
            operations: NamedMap::new(),
        };
        let mut operation = BindingOperation {
            name: "Op".to_owned(),
            soap_action: None,
            style: None,
            input: None,
            output: None,
        };

        assert_eq!(operation.style_or(&binding), "document");

        binding.style = Some("rpc".to_owned());
        assert_eq!(operation.style_or(&binding), "rpc");

        operation.style = Some("document".to_owned());
        assert_eq!(operation.style_or(&binding), "document");
    }
}
