//! Nested values and their SOAP request XML form.
//!
//! ```
//! use lather_util::xml::{to_soap_xml, Key, Mapping, Value};
//!
//! let body = Mapping::new()
//!     .with(Key::symbol("find_or_create"), "user")
//!     .with(Key::literal("raw_key"), vec!["a", "b"]);
//!
//! assert_eq!(
//!     to_soap_xml(&body.into()),
//!     "<findOrCreate>user</findOrCreate><raw_key>a</raw_key><raw_key>b</raw_key>"
//! );
//! ```

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use std::{
    borrow::Cow,
    fmt,
    io::{Cursor, Write},
    sync::Arc,
};

pub use quick_xml::{events, Writer};

use events::{BytesStart, BytesText, Event};

/// `xs:dateTime` with a numeric offset.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

pub trait ToXml {
    fn to_xml<W: Write>(&self, writer: &mut Writer<W>) -> quick_xml::Result<()>;
}

/// Values that render as `xs:dateTime`.
pub trait DateConvertible: fmt::Debug + Send + Sync {
    fn to_datetime(&self) -> DateTime<FixedOffset>;
}

/// A mapping key. Symbol keys are rewritten from `snake_case` to
/// `lowerCamelCase`; literal keys are used as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    name: String,
    transformable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    DateTime,
    Other,
}

#[derive(Debug, Clone)]
pub enum Scalar {
    String(String),
    Date(Arc<dyn DateConvertible>),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Renders as an empty element body.
    Null,
}

/// Ordered `(Key, Value)` pairs with unique keys.
#[derive(Debug, Clone, Default)]
pub struct Mapping(Vec<(Key, Value)>);

#[derive(Debug, Clone)]
pub enum Value {
    Mapping(Mapping),
    Sequence(Vec<Value>),
    Scalar(Scalar),
}

impl Key {
    pub fn symbol(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transformable: true,
        }
    }

    pub fn literal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transformable: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_transformable(&self) -> bool {
        self.transformable
    }

    /// The element name this key serializes to.
    pub fn tag(&self) -> Cow<'_, str> {
        if self.transformable {
            Cow::Owned(lower_camel_case(&self.name))
        } else {
            Cow::Borrowed(&self.name)
        }
    }
}

fn lower_camel_case(name: &str) -> String {
    let mut segments = name.split('_');
    let mut result = segments.next().unwrap_or_default().to_lowercase();

    for segment in segments {
        let mut chars = segment.chars();

        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.push_str(chars.as_str());
        }
    }

    result
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::String(_) => ScalarKind::String,
            Self::Date(_) => ScalarKind::DateTime,
            _ => ScalarKind::Other,
        }
    }

    /// Text content for the leaf. Strings are used as is, dates are
    /// formatted with [`DATETIME_FORMAT`], everything else uses its
    /// generic form.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Self::String(text) => Cow::Borrowed(text),
            Self::Date(date) => Cow::Owned(date.to_datetime().format(DATETIME_FORMAT).to_string()),
            Self::Integer(value) => Cow::Owned(value.to_string()),
            // xs:double spells infinity `INF`; NaN already prints as `NaN`.
            Self::Float(value) if value.is_infinite() => {
                Cow::Borrowed(if value.is_sign_positive() { "INF" } else { "-INF" })
            }
            Self::Float(value) => Cow::Owned(format!("{:?}", value)),
            Self::Boolean(value) => Cow::Borrowed(if *value { "true" } else { "false" }),
            Self::Null => Cow::Borrowed(""),
        }
    }
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a pair, replacing the value of an equal key in place.
    pub fn insert(&mut self, key: Key, value: impl Into<Value>) -> Option<Value> {
        let value = value.into();

        match self.0.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    pub fn with(mut self, key: Key, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.0
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.0.iter().map(|(key, value)| (key, value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Key, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
        let mut mapping = Self::new();

        for (key, value) in iter {
            mapping.insert(key, value);
        }

        mapping
    }
}

impl Value {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Scalar(Scalar::String(text.into()))
    }

    pub fn date(date: impl DateConvertible + 'static) -> Self {
        Self::Scalar(Scalar::Date(Arc::new(date)))
    }

    pub fn null() -> Self {
        Self::Scalar(Scalar::Null)
    }
}

impl ToXml for Value {
    fn to_xml<W: Write>(&self, writer: &mut Writer<W>) -> quick_xml::Result<()> {
        match self {
            Self::Mapping(mapping) => mapping.to_xml(writer),
            Self::Sequence(items) => items.iter().try_for_each(|item| item.to_xml(writer)),
            Self::Scalar(scalar) => {
                let text = scalar.to_text();

                if !text.is_empty() {
                    writer.write_event(Event::Text(BytesText::from_plain_str(&text)))?;
                }

                Ok(())
            }
        }
    }
}

impl ToXml for Mapping {
    fn to_xml<W: Write>(&self, writer: &mut Writer<W>) -> quick_xml::Result<()> {
        for (key, value) in &self.0 {
            write_element(writer, &key.tag(), value)?;
        }

        Ok(())
    }
}

/// Writes `value` inside `<tag>`. A sequence repeats the tag once per item.
fn write_element<W: Write>(writer: &mut Writer<W>, tag: &str, value: &Value) -> quick_xml::Result<()> {
    if let Value::Sequence(items) = value {
        return items
            .iter()
            .try_for_each(|item| write_element(writer, tag, item));
    }

    let start = BytesStart::borrowed_name(tag.as_bytes());

    writer.write_event(Event::Start(start.to_borrowed()))?;
    value.to_xml(writer)?;
    writer.write_event(Event::End(start.to_end()))?;

    Ok(())
}

pub(crate) fn write_to_vec<T: ToXml>(value: &T) -> Vec<u8> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    value
        .to_xml(&mut writer)
        .expect("writing XML to an in-memory buffer cannot fail");

    writer.into_inner().into_inner()
}

/// Serializes `value` as a SOAP request fragment, without any wrapper element.
///
/// Text content is XML-escaped.
pub fn to_soap_xml(value: &Value) -> String {
    String::from_utf8_lossy(&write_to_vec(value)).into_owned()
}

impl<Tz> DateConvertible for DateTime<Tz>
where
    Tz: TimeZone + Send + Sync,
    Tz::Offset: Send + Sync,
{
    fn to_datetime(&self) -> DateTime<FixedOffset> {
        self.with_timezone(&self.offset().fix())
    }
}

/// Naive date-times are taken to be UTC.
impl DateConvertible for NaiveDateTime {
    fn to_datetime(&self) -> DateTime<FixedOffset> {
        Utc.fix().from_utc_datetime(self)
    }
}

/// Dates become midnight UTC.
impl DateConvertible for NaiveDate {
    fn to_datetime(&self) -> DateTime<FixedOffset> {
        Utc.fix().from_utc_datetime(&self.and_time(NaiveTime::default()))
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Self::Scalar(scalar)
    }
}

impl From<Mapping> for Value {
    fn from(mapping: Mapping) -> Self {
        Self::Mapping(mapping)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Self::null, Into::into)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Scalar(Scalar::Boolean(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Scalar(Scalar::Float(value))
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Scalar(Scalar::Float(value.into()))
    }
}

macro_rules! integer_values {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Scalar(Scalar::Integer(value.into()))
                }
            }
        )*
    };
}

integer_values!(i8, i16, i32, i64, u8, u16, u32);

impl<Tz> From<DateTime<Tz>> for Value
where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Send + Sync,
{
    fn from(date: DateTime<Tz>) -> Self {
        Self::date(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols<const N: usize>(pairs: [(&str, Value); N]) -> Value {
        pairs
            .into_iter()
            .map(|(key, value)| (Key::symbol(key), value))
            .collect::<Mapping>()
            .into()
    }

    fn datetime() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2012, 3, 22, 16, 22, 33)
            .unwrap()
    }

    /// A string that can also be read as a date.
    #[derive(Debug)]
    struct DatedName(String);

    impl DateConvertible for DatedName {
        fn to_datetime(&self) -> DateTime<FixedOffset> {
            datetime()
        }
    }

    impl From<DatedName> for String {
        fn from(name: DatedName) -> Self {
            name.0
        }
    }

    #[test]
    fn simple_mapping() {
        assert_eq!(to_soap_xml(&symbols([("some", "user".into())])), "<some>user</some>");
    }

    #[test]
    fn nested_mapping() {
        let value = symbols([("some", symbols([("new", "user".into())]))]);
        assert_eq!(to_soap_xml(&value), "<some><new>user</new></some>");
    }

    #[test]
    fn multiple_keys_keep_insertion_order() {
        let value = symbols([("all", "users".into()), ("before", "whatever".into())]);
        let xml = to_soap_xml(&value);

        assert!(xml.contains("<all>users</all>"));
        assert!(xml.contains("<before>whatever</before>"));
        assert_eq!(xml, "<all>users</all><before>whatever</before>");
    }

    #[test]
    fn sequences_repeat_the_tag() {
        let value = symbols([("some", vec!["user", "gorilla"].into())]);
        assert_eq!(to_soap_xml(&value), "<some>user</some><some>gorilla</some>");
    }

    #[test]
    fn sequences_of_mappings() {
        let value = symbols([(
            "some",
            vec![
                symbols([("new", "user".into())]),
                symbols([("old", "gorilla".into())]),
            ]
            .into(),
        )]);

        assert_eq!(
            to_soap_xml(&value),
            "<some><new>user</new></some><some><old>gorilla</old></some>"
        );
    }

    #[test]
    fn nested_sequences_flatten_under_the_enclosing_tag() {
        let value = symbols([("id", vec![vec![1, 2], vec![3]].into())]);
        assert_eq!(to_soap_xml(&value), "<id>1</id><id>2</id><id>3</id>");
    }

    #[test]
    fn empty_sequences_produce_nothing() {
        let value = symbols([("id", Value::Sequence(Vec::new()))]);
        assert_eq!(to_soap_xml(&value), "");
    }

    #[test]
    fn symbol_keys_become_lower_camel_case() {
        assert_eq!(
            to_soap_xml(&symbols([("find_or_create", "user".into())])),
            "<findOrCreate>user</findOrCreate>"
        );
    }

    #[test]
    fn literal_keys_are_untouched() {
        let value: Value = Mapping::new()
            .with(Key::literal("find_or_create"), "user")
            .into();

        assert_eq!(to_soap_xml(&value), "<find_or_create>user</find_or_create>");
    }

    #[test]
    fn key_transformation() {
        assert_eq!(Key::symbol("find_or_create").tag(), "findOrCreate");
        assert_eq!(Key::symbol("Find_xml_Data").tag(), "findXmlData");
        assert_eq!(Key::symbol("trailing_").tag(), "trailing");
        assert_eq!(Key::symbol("double__under").tag(), "doubleUnder");
        assert_eq!(Key::symbol("plain").tag(), "plain");
        assert_eq!(Key::literal("Find_XML").tag(), "Find_XML");
    }

    #[test]
    fn symbol_and_literal_keys_are_distinct() {
        let mapping = Mapping::new()
            .with(Key::symbol("name"), "symbol")
            .with(Key::literal("name"), "literal")
            .with(Key::symbol("name"), "replaced");

        assert_eq!(mapping.len(), 2);
        assert_eq!(
            to_soap_xml(&mapping.into()),
            "<name>replaced</name><name>literal</name>"
        );
    }

    #[test]
    fn dates_become_xs_datetime() {
        let value = symbols([("before", datetime().into())]);
        assert_eq!(
            to_soap_xml(&value),
            "<before>2012-03-22T16:22:33+01:00</before>"
        );
    }

    #[test]
    fn date_convertible_values() {
        let value = symbols([("before", Value::date(DatedName("gorilla".to_owned())))]);
        assert_eq!(
            to_soap_xml(&value),
            "<before>2012-03-22T16:22:33+01:00</before>"
        );

        let naive = NaiveDate::from_ymd_opt(2012, 3, 22).unwrap();
        assert_eq!(
            to_soap_xml(&symbols([("on", Value::date(naive))])),
            "<on>2012-03-22T00:00:00+00:00</on>"
        );
    }

    #[test]
    fn strings_win_over_date_conversion() {
        let value = symbols([("name", Value::text(DatedName("gorilla".to_owned())))]);
        assert_eq!(to_soap_xml(&value), "<name>gorilla</name>");
    }

    #[test]
    fn other_values_use_their_generic_form() {
        let cases: [(Value, &str); 6] = [
            (666.into(), "<some>666</some>"),
            (true.into(), "<some>true</some>"),
            (false.into(), "<some>false</some>"),
            (Value::null(), "<some></some>"),
            (1.5.into(), "<some>1.5</some>"),
            (2.0.into(), "<some>2.0</some>"),
        ];

        for (value, expected) in cases {
            assert_eq!(to_soap_xml(&symbols([("some", value)])), expected);
        }
    }

    #[test]
    fn non_finite_floats_use_xs_double_spelling() {
        let cases = [
            (f64::INFINITY, "<some>INF</some>"),
            (f64::NEG_INFINITY, "<some>-INF</some>"),
            (f64::NAN, "<some>NaN</some>"),
        ];

        for (value, expected) in cases {
            assert_eq!(to_soap_xml(&symbols([("some", value.into())])), expected);
        }
    }

    #[test]
    fn options_map_to_null() {
        let value = symbols([("missing", Option::<&str>::None.into()), ("present", Some("x").into())]);
        assert_eq!(to_soap_xml(&value), "<missing></missing><present>x</present>");
    }

    #[test]
    fn text_is_escaped() {
        let value = symbols([("query", "a < b && c > d".into())]);
        assert_eq!(
            to_soap_xml(&value),
            "<query>a &lt; b &amp;&amp; c &gt; d</query>"
        );
    }

    #[test]
    fn scalar_kinds() {
        assert_eq!(Scalar::String("x".to_owned()).kind(), ScalarKind::String);
        assert_eq!(
            Scalar::Date(Arc::new(datetime())).kind(),
            ScalarKind::DateTime
        );
        assert_eq!(Scalar::Integer(1).kind(), ScalarKind::Other);
        assert_eq!(Scalar::Null.kind(), ScalarKind::Other);
    }

    #[test]
    fn top_level_scalars_and_sequences() {
        assert_eq!(to_soap_xml(&"bare".into()), "bare");
        assert_eq!(
            to_soap_xml(&vec![symbols([("a", 1.into())]), symbols([("b", 2.into())])].into()),
            "<a>1</a><b>2</b>"
        );
    }
}
