use quick_xml::{
    events::{attributes::Attribute, BytesStart, BytesText, Event},
    Reader,
};
use std::io::BufRead;
use tracing::{trace, warn};

use crate::{
    document::Document,
    error::Error,
    map::NamedMap,
    schema::{ComplexType, Element, MaxOccurs, Schema},
    types::{
        self, Binding, BindingBody, BindingOperation, Message, Part, Port, PortType,
        PortTypeOperation, QName, Service,
    },
};

/// Everything read from one document: WSDL definitions (when the root is
/// `definitions`), inline or standalone schemas, and the locations it imports.
#[derive(Debug, Default)]
pub struct Parsed {
    pub document: Option<Document>,
    pub schemas: Vec<Schema>,
    pub imports: Vec<String>,
}

fn get_attributes<B: BufRead, const N: usize>(
    reader: &Reader<B>,
    start: &BytesStart<'_>,
    names: [&'static str; N],
) -> Result<[Option<String>; N], Error> {
    const INIT: Option<String> = None;
    let mut result = [INIT; N];

    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = reader.decode(attribute.key)?;

        for (index, name) in names.iter().enumerate() {
            if key == *name {
                result[index] = Some(attribute_value(reader, &attribute)?);
                break;
            }
        }
    }

    Ok(result)
}

fn attribute_value<B: BufRead>(reader: &Reader<B>, attribute: &Attribute<'_>) -> Result<String, Error> {
    let value = attribute.unescaped_value()?;
    Ok(reader.decode(&value)?.to_owned())
}

fn required(
    value: Option<String>,
    element: &'static str,
    attribute: &'static str,
) -> Result<String, Error> {
    value.ok_or(Error::MissingAttribute { element, attribute })
}

fn split_namespaced_name(prefixed_name: &str) -> (Option<&str>, &str) {
    match prefixed_name.split_once(':') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, prefixed_name),
    }
}

/// `xmlns` declarations in scope, one frame per open element.
#[derive(Debug, Default)]
struct Namespaces {
    scopes: Vec<Vec<(Option<String>, String)>>,
}

impl Namespaces {
    fn push_scope(&mut self, declarations: Vec<(Option<String>, String)>) {
        self.scopes.push(declarations);
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn uri(&self, prefix: Option<&str>) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(declared, _)| declared.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    fn resolve(&self, prefixed_name: &str) -> QName {
        let (prefix, name) = split_namespaced_name(prefixed_name);

        QName::new(
            prefix.map(ToOwned::to_owned),
            self.uri(prefix).map(ToOwned::to_owned),
            name,
        )
    }
}

#[derive(Debug)]
enum ParseState {
    Definitions,
    Types,

    Schema(Schema),
    SchemaElement(Element),
    ComplexType(ComplexType),
    /// `sequence`, `all`, `choice` and the content/extension wrappers.
    Group {
        base: Option<QName>,
        children: Vec<Element>,
    },

    Message(Message),
    PortType(PortType),
    PortTypeOperation(PortTypeOperation),
    Documentation(Option<String>),

    Binding(Binding),
    BindingOperation(BindingOperation),
    BindingBody {
        output: bool,
        body: BindingBody,
    },

    Service(Service),
    Port {
        name: String,
        binding: QName,
        location: Option<String>,
    },

    /// An element the parser does not interpret, along with everything inside it.
    Other,
}

struct Parser {
    source: String,
    document: Option<Document>,
    parsed: Parsed,
    namespaces: Namespaces,
}

impl Parser {
    fn new(source: String) -> Self {
        Self {
            source,
            document: None,
            parsed: Parsed::default(),
            namespaces: Namespaces::default(),
        }
    }

    fn parse_xml<B: BufRead>(mut self, mut reader: Reader<B>) -> Result<Parsed, Error> {
        reader.trim_text(true);

        let mut stack = Vec::new();
        let mut buffer = Vec::new();

        loop {
            match reader.read_event(&mut buffer)? {
                Event::Start(start) => self.handle_start(&mut stack, &reader, &start)?,
                Event::End(..) => self.handle_end(&mut stack)?,

                Event::Empty(start) => {
                    self.handle_start(&mut stack, &reader, &start)?;
                    self.handle_end(&mut stack)?;
                }

                Event::Text(text) => self.handle_text(&mut stack, &reader, &text)?,

                Event::Eof => break,

                _ => (),
            }

            buffer.clear();
        }

        self.parsed.document = self.document;
        Ok(self.parsed)
    }

    fn document(&mut self) -> &mut Document {
        self.document.get_or_insert_with(Document::default)
    }

    fn handle_start<B: BufRead>(
        &mut self,
        stack: &mut Vec<ParseState>,
        reader: &Reader<B>,
        start: &BytesStart<'_>,
    ) -> Result<(), Error> {
        let (prefix, local_name) = split_namespaced_name(reader.decode(start.name())?);

        let mut declarations = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = reader.decode(attribute.key)?;

            match split_namespaced_name(key) {
                (None, "xmlns") => declarations.push((None, attribute_value(reader, &attribute)?)),
                (Some("xmlns"), declared) => declarations.push((
                    Some(declared.to_owned()),
                    attribute_value(reader, &attribute)?,
                )),
                _ => (),
            }
        }

        self.namespaces.push_scope(declarations);
        let namespace = self.namespaces.uri(prefix).map(ToOwned::to_owned);

        let mut state = stack.pop();
        let mut new_state = Some(ParseState::Other);

        match state.as_mut() {
            None => match local_name {
                "definitions" => {
                    let [name, target_namespace] =
                        get_attributes(reader, start, ["name", "targetNamespace"])?;

                    let source = self.source.clone();
                    let document = self.document();
                    document.location = Some(source);
                    document.name = name;
                    document.target_namespace = target_namespace;

                    new_state = Some(ParseState::Definitions);
                }

                "schema" => new_state = Some(self.start_schema(reader, start)?),

                other => return Err(Error::UnexpectedRoot(other.to_owned())),
            },

            Some(ParseState::Definitions) => match local_name {
                "import" => {
                    let [location] = get_attributes(reader, start, ["location"])?;
                    self.parsed
                        .imports
                        .push(required(location, "import", "location")?);
                }

                "types" => new_state = Some(ParseState::Types),

                "message" => {
                    let [name] = get_attributes(reader, start, ["name"])?;

                    new_state = Some(ParseState::Message(Message {
                        name: required(name, "message", "name")?,
                        parts: Vec::new(),
                    }));
                }

                "portType" => {
                    let [name] = get_attributes(reader, start, ["name"])?;

                    new_state = Some(ParseState::PortType(PortType {
                        name: required(name, "portType", "name")?,
                        operations: NamedMap::new(),
                    }));
                }

                "binding" => {
                    let [name, ty] = get_attributes(reader, start, ["name", "type"])?;

                    new_state = Some(ParseState::Binding(Binding {
                        name: required(name, "binding", "name")?,
                        port_type: self.namespaces.resolve(&required(ty, "binding", "type")?),
                        style: None,
                        transport: None,
                        version: None,
                        operations: NamedMap::new(),
                    }));
                }

                "service" => {
                    let [name] = get_attributes(reader, start, ["name"])?;

                    new_state = Some(ParseState::Service(Service {
                        name: required(name, "service", "name")?,
                        ports: NamedMap::new(),
                    }));
                }

                _ => trace!(element = local_name, "skipping element inside definitions"),
            },

            Some(ParseState::Types) => match local_name {
                "schema" => new_state = Some(self.start_schema(reader, start)?),
                _ => trace!(element = local_name, "skipping element inside types"),
            },

            Some(ParseState::Schema(_)) => match local_name {
                "import" | "include" => {
                    let [location] = get_attributes(reader, start, ["schemaLocation"])?;

                    // Imports without a location refer to well-known namespaces.
                    if let Some(location) = location {
                        self.parsed.imports.push(location);
                    }
                }

                "element" => new_state = Some(self.start_element(reader, start)?),

                "complexType" => {
                    let [name] = get_attributes(reader, start, ["name"])?;

                    new_state = Some(ParseState::ComplexType(ComplexType {
                        name: required(name, "complexType", "name")?,
                        base: None,
                        children: Vec::new(),
                    }));
                }

                _ => trace!(element = local_name, "skipping element inside schema"),
            },

            Some(ParseState::SchemaElement(_)) => match local_name {
                "complexType" => {
                    new_state = Some(ParseState::ComplexType(ComplexType {
                        name: String::new(),
                        base: None,
                        children: Vec::new(),
                    }))
                }

                _ => trace!(element = local_name, "skipping element inside element"),
            },

            Some(ParseState::ComplexType(_) | ParseState::Group { .. }) => match local_name {
                "sequence" | "all" | "choice" | "complexContent" | "simpleContent" => {
                    new_state = Some(ParseState::Group {
                        base: None,
                        children: Vec::new(),
                    })
                }

                "extension" | "restriction" => {
                    let [base] = get_attributes(reader, start, ["base"])?;

                    new_state = Some(ParseState::Group {
                        base: base.map(|base| self.namespaces.resolve(&base)),
                        children: Vec::new(),
                    })
                }

                "element" => new_state = Some(self.start_element(reader, start)?),

                _ => trace!(element = local_name, "skipping element inside complex type"),
            },

            Some(ParseState::Message(message)) => match local_name {
                "part" => {
                    let [name, element, ty] =
                        get_attributes(reader, start, ["name", "element", "type"])?;

                    message.parts.push(Part {
                        name: required(name, "part", "name")?,
                        element: element.map(|element| self.namespaces.resolve(&element)),
                        ty: ty.map(|ty| self.namespaces.resolve(&ty)),
                    });
                }

                _ => trace!(element = local_name, "skipping element inside message"),
            },

            Some(ParseState::PortType(_)) => match local_name {
                "operation" => {
                    let [name] = get_attributes(reader, start, ["name"])?;

                    new_state = Some(ParseState::PortTypeOperation(PortTypeOperation {
                        name: required(name, "operation", "name")?,
                        documentation: None,
                        input: None,
                        output: None,
                    }))
                }

                _ => trace!(element = local_name, "skipping element inside port type"),
            },

            Some(ParseState::PortTypeOperation(operation)) => match local_name {
                "documentation" => new_state = Some(ParseState::Documentation(None)),

                "input" | "output" => {
                    let [message] = get_attributes(reader, start, ["message"])?;

                    if local_name == "input" {
                        let message = required(message, "input", "message")?;
                        operation.input = Some(self.namespaces.resolve(&message));
                    } else {
                        let message = required(message, "output", "message")?;
                        operation.output = Some(self.namespaces.resolve(&message));
                    }
                }

                _ => trace!(element = local_name, "skipping element inside operation"),
            },

            Some(ParseState::Binding(binding)) => match local_name {
                "binding" => {
                    let [style, transport] = get_attributes(reader, start, ["style", "transport"])?;

                    binding.version = namespace
                        .as_deref()
                        .and_then(types::binding_soap_version);
                    binding.style = style;
                    binding.transport = transport;
                }

                "operation" => {
                    let [name] = get_attributes(reader, start, ["name"])?;

                    new_state = Some(ParseState::BindingOperation(BindingOperation {
                        name: required(name, "operation", "name")?,
                        soap_action: None,
                        style: None,
                        input: None,
                        output: None,
                    }))
                }

                _ => trace!(element = local_name, "skipping element inside binding"),
            },

            Some(ParseState::BindingOperation(operation)) => match local_name {
                "operation" => {
                    let [action, style] = get_attributes(reader, start, ["soapAction", "style"])?;

                    operation.soap_action = action;
                    operation.style = style;
                }

                "input" | "output" => {
                    new_state = Some(ParseState::BindingBody {
                        output: local_name == "output",
                        body: BindingBody::default(),
                    })
                }

                _ => trace!(element = local_name, "skipping element inside binding operation"),
            },

            Some(ParseState::BindingBody { body, .. }) => match local_name {
                "body" => {
                    let [body_use, body_namespace] = get_attributes(reader, start, ["use", "namespace"])?;

                    body.use_ = body_use;
                    body.namespace = body_namespace;
                }

                _ => trace!(element = local_name, "skipping element inside binding body"),
            },

            Some(ParseState::Service(_)) => match local_name {
                "port" => {
                    let [name, binding] = get_attributes(reader, start, ["name", "binding"])?;

                    new_state = Some(ParseState::Port {
                        name: required(name, "port", "name")?,
                        binding: self.namespaces.resolve(&required(binding, "port", "binding")?),
                        location: None,
                    });
                }

                _ => trace!(element = local_name, "skipping element inside service"),
            },

            Some(ParseState::Port { location, .. }) => match local_name {
                "address" => {
                    let [address] = get_attributes(reader, start, ["location"])?;
                    *location = Some(required(address, "address", "location")?);
                }

                _ => trace!(element = local_name, "skipping element inside port"),
            },

            Some(ParseState::Documentation(_)) | Some(ParseState::Other) => (),
        }

        stack.extend(state);
        stack.extend(new_state);

        Ok(())
    }

    fn start_schema<B: BufRead>(
        &self,
        reader: &Reader<B>,
        start: &BytesStart<'_>,
    ) -> Result<ParseState, Error> {
        let [target_namespace, element_form_default] =
            get_attributes(reader, start, ["targetNamespace", "elementFormDefault"])?;

        Ok(ParseState::Schema(Schema {
            target_namespace,
            element_form_default,
            ..Schema::default()
        }))
    }

    fn start_element<B: BufRead>(
        &self,
        reader: &Reader<B>,
        start: &BytesStart<'_>,
    ) -> Result<ParseState, Error> {
        let [name, reference, ty, min_occurs, max_occurs] =
            get_attributes(reader, start, ["name", "ref", "type", "minOccurs", "maxOccurs"])?;

        let name = match (name, reference) {
            (Some(name), _) => name,
            (None, Some(reference)) => self.namespaces.resolve(&reference).name,
            (None, None) => return Err(Error::MissingAttribute {
                element: "element",
                attribute: "name",
            }),
        };

        let mut element = Element::new(name);
        element.ty = ty.map(|ty| self.namespaces.resolve(&ty));

        if let Some(min) = min_occurs.and_then(|min| min.parse().ok()) {
            element.min_occurs = min;
        }

        if let Some(max) = max_occurs.as_deref().and_then(MaxOccurs::parse) {
            element.max_occurs = max;
        }

        Ok(ParseState::SchemaElement(element))
    }

    fn handle_end(&mut self, stack: &mut Vec<ParseState>) -> Result<(), Error> {
        self.namespaces.pop_scope();

        let finished_state = stack.pop();
        let mut next_state = stack.pop();

        match finished_state {
            Some(ParseState::Schema(schema)) => self.parsed.schemas.push(schema),

            Some(ParseState::SchemaElement(element)) => match next_state.as_mut() {
                Some(ParseState::Schema(schema)) => {
                    let name = element.name.clone();
                    if schema.elements.insert(name.clone(), element).is_some() {
                        warn!(element = %name, "duplicate schema element");
                    }
                }

                Some(ParseState::Group { children, .. }) => children.push(element),

                Some(ParseState::ComplexType(complex_type)) => complex_type.children.push(element),

                _ => trace!(element = %element.name, "dropping element outside of a schema"),
            },

            Some(ParseState::ComplexType(complex_type)) => match next_state.as_mut() {
                Some(ParseState::SchemaElement(element)) => {
                    element.ty = element.ty.take().or(complex_type.base);
                    element.children = complex_type.children;
                }

                Some(ParseState::Schema(schema)) => {
                    let name = complex_type.name.clone();
                    if schema.complex_types.insert(name.clone(), complex_type).is_some() {
                        warn!(complex_type = %name, "duplicate complex type");
                    }
                }

                _ => trace!(complex_type = %complex_type.name, "dropping nested complex type"),
            },

            Some(ParseState::Group { base, children }) => match next_state.as_mut() {
                Some(ParseState::ComplexType(complex_type)) => {
                    complex_type.base = complex_type.base.take().or(base);
                    complex_type.children.extend(children);
                }

                Some(ParseState::Group {
                    base: parent_base,
                    children: parent_children,
                }) => {
                    *parent_base = parent_base.take().or(base);
                    parent_children.extend(children);
                }

                _ => (),
            },

            Some(ParseState::Message(message)) => {
                let name = message.name.clone();
                if self.document().messages.insert(name.clone(), message).is_some() {
                    warn!(message = %name, "duplicate message");
                }
            }

            Some(ParseState::PortType(port_type)) => {
                let name = port_type.name.clone();
                if self.document().port_types.insert(name.clone(), port_type).is_some() {
                    warn!(port_type = %name, "duplicate port type");
                }
            }

            Some(ParseState::PortTypeOperation(operation)) => match next_state.as_mut() {
                Some(ParseState::PortType(port_type)) => {
                    port_type.operations.insert(operation.name.clone(), operation);
                }

                _ => (),
            },

            Some(ParseState::Documentation(text)) => match next_state.as_mut() {
                Some(ParseState::PortTypeOperation(operation)) => operation.documentation = text,
                _ => (),
            },

            Some(ParseState::Binding(binding)) => {
                let name = binding.name.clone();
                if self.document().bindings.insert(name.clone(), binding).is_some() {
                    warn!(binding = %name, "duplicate binding");
                }
            }

            Some(ParseState::BindingOperation(operation)) => match next_state.as_mut() {
                Some(ParseState::Binding(binding)) => {
                    binding.operations.insert(operation.name.clone(), operation);
                }

                _ => (),
            },

            Some(ParseState::BindingBody { output, body }) => match next_state.as_mut() {
                Some(ParseState::BindingOperation(operation)) if output => {
                    operation.output = Some(body)
                }

                Some(ParseState::BindingOperation(operation)) => operation.input = Some(body),

                _ => (),
            },

            Some(ParseState::Service(service)) => {
                let name = service.name.clone();
                if self.document().services.insert(name.clone(), service).is_some() {
                    warn!(service = %name, "duplicate service");
                }
            }

            Some(ParseState::Port {
                name,
                binding,
                location,
            }) => match (next_state.as_mut(), location) {
                (Some(ParseState::Service(service)), Some(location)) => {
                    service.ports.insert(
                        name.clone(),
                        Port {
                            name,
                            binding,
                            location,
                        },
                    );
                }

                (_, None) => warn!(port = %name, "skipping port without an address"),

                _ => (),
            },

            Some(ParseState::Definitions | ParseState::Types | ParseState::Other) | None => (),
        }

        stack.extend(next_state);
        Ok(())
    }

    fn handle_text<B: BufRead>(
        &mut self,
        stack: &mut Vec<ParseState>,
        reader: &Reader<B>,
        text: &BytesText<'_>,
    ) -> Result<(), Error> {
        if let Some(ParseState::Documentation(docs)) = stack.last_mut() {
            let unescaped = text.unescaped()?;
            *docs = Some(reader.decode(&unescaped)?.to_owned());
        }

        Ok(())
    }
}

/// Parses one WSDL or XML schema document. `source` names it in the result.
pub fn parse(source: impl Into<String>, xml: &[u8]) -> Result<Parsed, Error> {
    Parser::new(source.into()).parse_xml(Reader::from_reader(xml))
}
