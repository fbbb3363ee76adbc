use crate::{map::NamedMap, types::QName};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub ty: Option<QName>,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    pub children: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexType {
    pub name: String,
    pub base: Option<QName>,
    pub children: Vec<Element>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub target_namespace: Option<String>,
    pub element_form_default: Option<String>,
    pub elements: NamedMap<Element>,
    pub complex_types: NamedMap<ComplexType>,
}

#[derive(Debug, Clone, Default)]
pub struct SchemaCollection {
    schemas: Vec<Schema>,
}

impl Default for MaxOccurs {
    fn default() -> Self {
        Self::Bounded(1)
    }
}

impl MaxOccurs {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unbounded" => Some(Self::Unbounded),
            other => other.parse().ok().map(Self::Bounded),
        }
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            min_occurs: 1,
            max_occurs: MaxOccurs::default(),
            children: Vec::new(),
        }
    }

    /// Whether the element may repeat, i.e. maps to a sequence of values.
    pub fn is_repeated(&self) -> bool {
        match self.max_occurs {
            MaxOccurs::Unbounded => true,
            MaxOccurs::Bounded(max) => max > 1,
        }
    }
}

impl SchemaCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, schema: Schema) {
        self.schemas.push(schema);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Finds a top-level element, preferring a schema whose target namespace matches.
    pub fn element(&self, name: &QName) -> Option<&Element> {
        self.find(name, |schema| schema.elements.get(&name.name))
    }

    pub fn complex_type(&self, name: &QName) -> Option<&ComplexType> {
        self.find(name, |schema| schema.complex_types.get(&name.name))
    }

    fn find<'a, T>(
        &'a self,
        name: &QName,
        lookup: impl Fn(&'a Schema) -> Option<&'a T>,
    ) -> Option<&'a T> {
        let matching = self
            .schemas
            .iter()
            .filter(|schema| name.namespace.is_some() && schema.target_namespace == name.namespace)
            .find_map(&lookup);

        matching.or_else(|| self.schemas.iter().find_map(&lookup))
    }
}
