use super::xml::{
    events::{BytesStart, Event},
    write_to_vec, ToXml, Value, Writer,
};

use std::io::Write;

pub const SOAP_11_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP_12_ENVELOPE_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoapVersion {
    #[default]
    Soap11,
    Soap12,
}

/// A request body wrapped in `soapenv:Envelope` and `soapenv:Body`.
#[derive(Debug)]
pub struct Envelope<T> {
    version: SoapVersion,
    header: Option<Value>,
    body: T,
}

impl SoapVersion {
    pub fn namespace(self) -> &'static str {
        match self {
            Self::Soap11 => SOAP_11_ENVELOPE_NS,
            Self::Soap12 => SOAP_12_ENVELOPE_NS,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Soap11 => "text/xml;charset=UTF-8",
            Self::Soap12 => "application/soap+xml;charset=UTF-8",
        }
    }
}

impl<T> Envelope<T> {
    pub fn new(body: T) -> Self {
        Self {
            version: SoapVersion::default(),
            header: None,
            body,
        }
    }

    pub fn with_version(mut self, version: SoapVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_header(mut self, header: impl Into<Value>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn version(&self) -> SoapVersion {
        self.version
    }

    pub fn body(&self) -> &T {
        &self.body
    }

    pub fn into_body(self) -> T {
        self.body
    }
}

impl<T: ToXml> Envelope<T> {
    pub fn to_request(&self) -> Vec<u8> {
        write_to_vec(self)
    }
}

impl<T: ToXml> ToXml for Envelope<T> {
    fn to_xml<W: Write>(&self, writer: &mut Writer<W>) -> quick_xml::Result<()> {
        let envelope = BytesStart::owned_name("soapenv:Envelope")
            .with_attributes([("xmlns:soapenv", self.version.namespace())]);

        writer.write_event(Event::Start(envelope.to_borrowed()))?;

        if let Some(header) = &self.header {
            let start = BytesStart::owned_name("soapenv:Header");
            writer.write_event(Event::Start(start.to_borrowed()))?;
            header.to_xml(writer)?;
            writer.write_event(Event::End(start.to_end()))?;
        }

        let body = BytesStart::owned_name("soapenv:Body");
        writer.write_event(Event::Start(body.to_borrowed()))?;
        self.body.to_xml(writer)?;
        writer.write_event(Event::End(body.to_end()))?;

        writer.write_event(Event::End(envelope.to_end()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{Key, Mapping};

    fn body() -> Value {
        Mapping::new()
            .with(
                Key::literal("GetQuote"),
                Mapping::new().with(Key::symbol("ticker_symbol"), "ACME"),
            )
            .into()
    }

    #[test]
    fn soap_11_envelope() {
        let request = Envelope::new(body()).to_request();

        assert_eq!(
            String::from_utf8(request).unwrap(),
            "<soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\">\
             <soapenv:Body><GetQuote><tickerSymbol>ACME</tickerSymbol></GetQuote></soapenv:Body>\
             </soapenv:Envelope>"
        );
    }

    #[test]
    fn soap_12_envelope_with_header() {
        let header = Mapping::new().with(Key::symbol("session_id"), 42);
        let envelope = Envelope::new(body())
            .with_version(SoapVersion::Soap12)
            .with_header(header);

        let request = String::from_utf8(envelope.to_request()).unwrap();

        assert!(request.starts_with(
            "<soapenv:Envelope xmlns:soapenv=\"http://www.w3.org/2003/05/soap-envelope\">"
        ));
        assert!(request.contains("<soapenv:Header><sessionId>42</sessionId></soapenv:Header>"));
        assert!(request.contains("<soapenv:Body><GetQuote>"));
        assert_eq!(envelope.version().content_type(), "application/soap+xml;charset=UTF-8");
    }

    #[test]
    fn bodies_are_returned() {
        let envelope = Envelope::new(body());
        assert!(matches!(envelope.body(), Value::Mapping(mapping) if mapping.len() == 1));
        assert!(matches!(envelope.into_body(), Value::Mapping(_)));
    }
}
