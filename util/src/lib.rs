//! SOAP request building blocks: the [`xml::Value`] model, its serializer,
//! and the SOAP [`soap::Envelope`].

pub mod soap;
pub mod xml;

pub use soap::{Envelope, SoapVersion};
pub use xml::{to_soap_xml, DateConvertible, Key, Mapping, Scalar, ScalarKind, ToXml, Value};
