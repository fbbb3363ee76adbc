use std::{fmt, str::FromStr};

use lather_util::{Envelope, Key, Mapping, Value};
use lather_wsdl::Operation;

use crate::Error;

/// A `key=value` pair from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub key: String,
    pub value: String,
}

/// Everything a transport needs to send one operation.
#[derive(Debug)]
pub struct Request {
    pub endpoint: String,
    pub headers: Vec<(&'static str, String)>,
    pub envelope: Envelope<Value>,
}

impl FromStr for Param {
    type Err = Error;

    fn from_str(param: &str) -> Result<Self, Self::Err> {
        match param.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok(Self {
                key: key.to_owned(),
                value: value.to_owned(),
            }),
            _ => Err(Error::InvalidParam(param.to_owned())),
        }
    }
}

/// Builds the body mapping. Keys repeated on the command line become sequences.
pub fn body(params: &[(Key, String)]) -> Mapping {
    let mut grouped: Vec<(&Key, Vec<&str>)> = Vec::new();

    for (key, value) in params {
        match grouped.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, values)) => values.push(value.as_str()),
            None => grouped.push((key, vec![value.as_str()])),
        }
    }

    grouped
        .into_iter()
        .map(|(key, mut values)| {
            let value = if values.len() == 1 {
                Value::text(values.remove(0))
            } else {
                values.into()
            };

            (key.clone(), value)
        })
        .collect()
}

impl Request {
    /// Wraps `params` under the operation's element and describes the request.
    pub fn build(operation: &Operation<'_>, params: Mapping) -> Self {
        let body = Mapping::new().with(Key::literal(operation.name()), params);

        Self {
            endpoint: operation.endpoint().to_owned(),
            headers: operation.request_headers(),
            envelope: Envelope::new(body.into()).with_version(operation.soap_version()),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "POST {}", self.endpoint)?;

        for (name, value) in &self.headers {
            writeln!(f, "{}: {}", name, value)?;
        }

        writeln!(f)?;
        write!(f, "{}", String::from_utf8_lossy(&self.envelope.to_request()))
    }
}
