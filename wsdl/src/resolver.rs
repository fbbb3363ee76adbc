use bytes::Bytes;
use reqwest::blocking::Client as Reqwest;
use std::{path::Path, sync::Arc};
use tracing::debug;
use url::Url;

use crate::error::Error;

/// The one capability the crate needs from the outside world: fetching a URL.
pub trait Http {
    fn fetch(&self, url: &Url) -> Result<Bytes, Error>;
}

/// [`Http`] backed by a blocking reqwest client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttp {
    client: Reqwest,
}

/// A fetched document together with the URL it was read from, if any.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub url: Option<Url>,
    pub bytes: Bytes,
}

/// Turns WSDL and schema locations into document bytes.
#[derive(Debug, Clone)]
pub struct Resolver<H> {
    http: H,
}

impl ReqwestHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Reqwest) -> Self {
        Self { client }
    }
}

impl Http for ReqwestHttp {
    fn fetch(&self, url: &Url) -> Result<Bytes, Error> {
        let response = self.client.get(url.clone()).send()?.error_for_status()?;
        Ok(response.bytes()?)
    }
}

impl<H: Http + ?Sized> Http for &H {
    fn fetch(&self, url: &Url) -> Result<Bytes, Error> {
        (**self).fetch(url)
    }
}

impl<H: Http + ?Sized> Http for Box<H> {
    fn fetch(&self, url: &Url) -> Result<Bytes, Error> {
        (**self).fetch(url)
    }
}

impl<H: Http + ?Sized> Http for Arc<H> {
    fn fetch(&self, url: &Url) -> Result<Bytes, Error> {
        (**self).fetch(url)
    }
}

impl<H: Http> Resolver<H> {
    pub fn new(http: H) -> Self {
        Self { http }
    }

    /// Resolves `location` relative to `base`.
    ///
    /// A location that starts with `<` is treated as the document itself.
    pub fn resolve(&self, location: &str, base: Option<&Url>) -> Result<Resolved, Error> {
        if let Some(bytes) = inline(location) {
            return Ok(Resolved { url: None, bytes });
        }

        let url = to_url(location, base)?;
        let bytes = self.fetch(&url)?;

        Ok(Resolved {
            url: Some(url),
            bytes,
        })
    }

    pub fn fetch(&self, url: &Url) -> Result<Bytes, Error> {
        debug!(%url, "fetching document");

        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| Error::PathConversionError(None))?;

                std::fs::read(&path)
                    .map(Bytes::from)
                    .map_err(|source| Error::FileReadError {
                        path: path.display().to_string(),
                        source,
                    })
            }

            "http" | "https" => self.http.fetch(url),

            other => Err(Error::UnsupportedScheme(other.into())),
        }
    }
}

/// The document itself, when `location` is inline XML rather than a reference.
pub fn inline(location: &str) -> Option<Bytes> {
    location
        .trim_start()
        .starts_with('<')
        .then(|| Bytes::copy_from_slice(location.as_bytes()))
}

/// Parses `location` as a URL, joining it onto `base` or, failing that,
/// treating it as a filesystem path.
pub fn to_url(location: &str, base: Option<&Url>) -> Result<Url, Error> {
    if let Some(base) = base {
        return Ok(base.join(location)?);
    }

    match Url::parse(location) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::from_file_path(
            &Path::new(location)
                .canonicalize()
                .map_err(|err| Error::PathConversionError(Some(err)))?,
        )
        .map_err(|()| Error::PathConversionError(None)),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, collections::HashMap};

    #[derive(Default)]
    struct StaticHttp {
        documents: HashMap<String, &'static str>,
        requested: RefCell<Vec<String>>,
    }

    impl Http for StaticHttp {
        fn fetch(&self, url: &Url) -> Result<Bytes, Error> {
            self.requested.borrow_mut().push(url.to_string());

            self.documents
                .get(url.as_str())
                .map(|body| Bytes::from_static(body.as_bytes()))
                .ok_or_else(|| Error::FetchError {
                    url: url.to_string(),
                    message: "404 Not Found".to_owned(),
                })
        }
    }

    #[test]
    fn inline_documents_are_not_fetched() {
        let http = StaticHttp::default();
        let resolver = Resolver::new(&http);

        let resolved = resolver.resolve("  <definitions/>", None).unwrap();
        assert!(resolved.url.is_none());
        assert_eq!(resolved.bytes.as_ref(), b"  <definitions/>");
        assert!(http.requested.borrow().is_empty());
    }

    #[test]
    fn http_locations_go_through_the_capability() {
        let mut http = StaticHttp::default();
        http.documents
            .insert("http://example.com/service.wsdl".to_owned(), "<definitions/>");
        let resolver = Resolver::new(&http);

        let resolved = resolver
            .resolve("http://example.com/service.wsdl", None)
            .unwrap();
        assert_eq!(resolved.bytes.as_ref(), b"<definitions/>");

        let missing = resolver.resolve("http://example.com/missing.wsdl", None);
        assert!(matches!(missing, Err(Error::FetchError { .. })));
    }

    #[test]
    fn relative_locations_join_the_base() {
        let base = Url::parse("http://example.com/wsdl/service.wsdl").unwrap();

        assert_eq!(
            to_url("types.xsd", Some(&base)).unwrap().as_str(),
            "http://example.com/wsdl/types.xsd"
        );
        assert_eq!(
            to_url("http://other.com/a.xsd", Some(&base)).unwrap().as_str(),
            "http://other.com/a.xsd"
        );
    }

    #[test]
    fn unsupported_schemes_are_rejected() {
        let resolver = Resolver::new(StaticHttp::default());
        let url = Url::parse("ftp://example.com/service.wsdl").unwrap();

        assert!(matches!(
            resolver.fetch(&url),
            Err(Error::UnsupportedScheme(scheme)) if scheme == "ftp"
        ));
    }

    #[test]
    fn missing_paths_fail_conversion() {
        assert!(matches!(
            to_url("./definitely/not/here.wsdl", None),
            Err(Error::PathConversionError(Some(_)))
        ));
    }
}
