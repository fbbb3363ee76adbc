use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to parse provided URL")]
    UrlParseError(#[from] url::ParseError),

    #[error("Unable to convert provided path")]
    PathConversionError(Option<std::io::Error>),

    #[error("Unable to read file {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to get file from server")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Unable to fetch {url}: {message}")]
    FetchError { url: String, message: String },

    #[error("Unsupported URL scheme {0}")]
    UnsupportedScheme(String),

    #[error("Error parsing XML input")]
    XmlParseError(#[from] quick_xml::Error),

    #[error("Missing attribute {attribute:?} on <{element}>")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Expected a WSDL definitions or XML schema document, found <{0}>")]
    UnexpectedRoot(String),

    #[error("Unknown service {name:?}.\nYou may want to try one of {alternatives:?}.")]
    UnknownService {
        name: String,
        alternatives: Vec<String>,
    },

    #[error(
        "Unknown port {name:?} for service {service:?}.\nYou may want to try one of {alternatives:?}."
    )]
    UnknownPort {
        service: String,
        name: String,
        alternatives: Vec<String>,
    },

    #[error(
        "Unknown operation {name:?} for service {service:?} and port {port:?}.\nYou may want to try one of {alternatives:?}."
    )]
    UnknownOperation {
        service: String,
        port: String,
        name: String,
        alternatives: Vec<String>,
    },

    #[error("Unable to find {kind} {name:?} in the imported documents")]
    MissingDefinition { kind: &'static str, name: String },
}
