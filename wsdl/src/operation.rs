use crate::{
    error::Error,
    schema::Element,
    types::{Binding, BindingBody, BindingOperation, Part, PortTypeOperation, QName, SoapVersion},
    Wsdl,
};

/// One resolved operation: where to send it and what it looks like.
///
/// Borrows the [`Wsdl`] it was built from.
#[derive(Debug, Clone, Copy)]
pub struct Operation<'a> {
    name: &'a str,
    endpoint: &'a str,
    binding: &'a Binding,
    binding_operation: &'a BindingOperation,
    port_type_operation: &'a PortTypeOperation,
    wsdl: &'a Wsdl,
}

impl<'a> Operation<'a> {
    pub(crate) fn new(
        name: &'a str,
        endpoint: &'a str,
        binding: &'a Binding,
        binding_operation: &'a BindingOperation,
        port_type_operation: &'a PortTypeOperation,
        wsdl: &'a Wsdl,
    ) -> Self {
        Self {
            name,
            endpoint,
            binding,
            binding_operation,
            port_type_operation,
            wsdl,
        }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn endpoint(&self) -> &'a str {
        self.endpoint
    }

    pub fn binding(&self) -> &'a Binding {
        self.binding
    }

    pub fn binding_operation(&self) -> &'a BindingOperation {
        self.binding_operation
    }

    pub fn port_type_operation(&self) -> &'a PortTypeOperation {
        self.port_type_operation
    }

    pub fn wsdl(&self) -> &'a Wsdl {
        self.wsdl
    }

    pub fn soap_action(&self) -> Option<&'a str> {
        self.binding_operation.soap_action.as_deref()
    }

    /// SOAP version of the binding; bindings without a SOAP extension are treated as 1.1.
    pub fn soap_version(&self) -> SoapVersion {
        self.binding.version.unwrap_or(SoapVersion::Soap11)
    }

    /// e.g. `document/literal` or `rpc/encoded`.
    pub fn input_style(&self) -> String {
        self.style(self.binding_operation.input.as_ref())
    }

    pub fn output_style(&self) -> String {
        self.style(self.binding_operation.output.as_ref())
    }

    pub fn input_parts(&self) -> Result<&'a [Part], Error> {
        self.parts(self.port_type_operation.input.as_ref())
    }

    pub fn output_parts(&self) -> Result<&'a [Part], Error> {
        self.parts(self.port_type_operation.output.as_ref())
    }

    /// Schema elements referenced by the input message's `element` parts.
    pub fn input_elements(&self) -> Result<Vec<&'a Element>, Error> {
        self.elements(self.input_parts()?)
    }

    pub fn output_elements(&self) -> Result<Vec<&'a Element>, Error> {
        self.elements(self.output_parts()?)
    }

    /// HTTP headers a transport should send with the request.
    pub fn request_headers(&self) -> Vec<(&'static str, String)> {
        let action = self.soap_action().unwrap_or_default();
        let version = self.soap_version();

        match version {
            SoapVersion::Soap11 => vec![
                ("SOAPAction", format!("\"{}\"", action)),
                ("Content-Type", version.content_type().to_owned()),
            ],
            SoapVersion::Soap12 => vec![(
                "Content-Type",
                format!("{};action=\"{}\"", version.content_type(), action),
            )],
        }
    }

    fn style(&self, body: Option<&BindingBody>) -> String {
        let body_use = body
            .and_then(|body| body.use_.as_deref())
            .unwrap_or("literal");

        format!(
            "{}/{}",
            self.binding_operation.style_or(self.binding),
            body_use
        )
    }

    fn parts(&self, message: Option<&QName>) -> Result<&'a [Part], Error> {
        let message = match message {
            Some(message) => message,
            None => return Ok(&[]),
        };

        self.wsdl
            .documents()
            .message(message)
            .map(|message| message.parts.as_slice())
            .ok_or_else(|| Error::MissingDefinition {
                kind: "message",
                name: message.to_string(),
            })
    }

    fn elements(&self, parts: &'a [Part]) -> Result<Vec<&'a Element>, Error> {
        parts
            .iter()
            .filter_map(|part| part.element.as_ref())
            .map(|element| {
                self.wsdl
                    .schemas()
                    .element(element)
                    .ok_or_else(|| Error::MissingDefinition {
                        kind: "element",
                        name: element.to_string(),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::{error::Error, types::SoapVersion, Wsdl};
    use bytes::Bytes;
    use url::Url;

    struct NoHttp;

    impl crate::Http for NoHttp {
        fn fetch(&self, url: &Url) -> Result<Bytes, Error> {
            Err(Error::FetchError {
                url: url.to_string(),
                message: "network disabled".to_owned(),
            })
        }
    }

    const WEATHER: &str = r#"<wsdl:definitions name="Weather"
        xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
        xmlns:soap12="http://schemas.xmlsoap.org/wsdl/soap12/"
        xmlns:xs="http://www.w3.org/2001/XMLSchema"
        xmlns:tns="urn:weather"
        targetNamespace="urn:weather">
      <wsdl:types>
        <xs:schema targetNamespace="urn:weather" elementFormDefault="qualified">
          <xs:element name="GetForecast">
            <xs:complexType>
              <xs:sequence>
                <xs:element name="city" type="xs:string"/>
                <xs:element name="days" type="xs:int" minOccurs="0"/>
              </xs:sequence>
            </xs:complexType>
          </xs:element>
        </xs:schema>
      </wsdl:types>
      <wsdl:message name="GetForecastIn">
        <wsdl:part name="parameters" element="tns:GetForecast"/>
      </wsdl:message>
      <wsdl:message name="GetForecastOut">
        <wsdl:part name="parameters" element="tns:GetForecastResponse"/>
      </wsdl:message>
      <wsdl:portType name="WeatherPortType">
        <wsdl:operation name="GetForecast">
          <wsdl:input message="tns:GetForecastIn"/>
          <wsdl:output message="tns:GetForecastOut"/>
        </wsdl:operation>
        <wsdl:operation name="Ping"/>
      </wsdl:portType>
      <wsdl:binding name="WeatherSoap12" type="tns:WeatherPortType">
        <soap12:binding style="rpc" transport="http://schemas.xmlsoap.org/soap/http"/>
        <wsdl:operation name="GetForecast">
          <soap12:operation soapAction="urn:weather/GetForecast" style="document"/>
          <wsdl:input><soap12:body use="literal"/></wsdl:input>
          <wsdl:output><soap12:body use="encoded"/></wsdl:output>
        </wsdl:operation>
        <wsdl:operation name="Ping"/>
      </wsdl:binding>
      <wsdl:service name="Weather">
        <wsdl:port name="WeatherSoap12" binding="tns:WeatherSoap12">
          <soap12:address location="http://example.com/weather"/>
        </wsdl:port>
      </wsdl:service>
    </wsdl:definitions>"#;

    fn wsdl() -> Wsdl {
        Wsdl::new(WEATHER, NoHttp).unwrap()
    }

    #[test]
    fn styles_and_version() {
        let wsdl = wsdl();
        let operation = wsdl.operation("Weather", "WeatherSoap12", "GetForecast").unwrap();

        assert_eq!(operation.soap_version(), SoapVersion::Soap12);
        assert_eq!(operation.input_style(), "document/literal");
        assert_eq!(operation.output_style(), "document/encoded");

        let ping = wsdl.operation("Weather", "WeatherSoap12", "Ping").unwrap();
        assert_eq!(ping.input_style(), "rpc/literal");
        assert_eq!(ping.soap_action(), None);
    }

    #[test]
    fn soap_12_headers() {
        let wsdl = wsdl();
        let operation = wsdl.operation("Weather", "WeatherSoap12", "GetForecast").unwrap();

        assert_eq!(
            operation.request_headers(),
            [(
                "Content-Type",
                "application/soap+xml;charset=UTF-8;action=\"urn:weather/GetForecast\"".to_owned()
            )]
        );
    }

    #[test]
    fn message_parts_and_elements() {
        let wsdl = wsdl();
        let operation = wsdl.operation("Weather", "WeatherSoap12", "GetForecast").unwrap();

        let parts = operation.input_parts().unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "parameters");

        let elements = operation.input_elements().unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].name, "GetForecast");
        assert_eq!(
            elements[0]
                .children
                .iter()
                .map(|child| child.name.as_str())
                .collect::<Vec<_>>(),
            ["city", "days"]
        );

        assert!(matches!(
            operation.output_elements(),
            Err(Error::MissingDefinition { kind: "element", .. })
        ));
    }

    #[test]
    fn operations_without_messages_have_no_parts() {
        let wsdl = wsdl();
        let ping = wsdl.operation("Weather", "WeatherSoap12", "Ping").unwrap();

        assert!(ping.input_parts().unwrap().is_empty());
        assert!(ping.output_elements().unwrap().is_empty());
    }
}
