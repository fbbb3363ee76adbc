use std::collections::HashSet;
use tracing::debug;
use url::Url;

use crate::{
    document::DocumentCollection,
    error::Error,
    parser,
    resolver::{self, Http, Resolver},
    schema::SchemaCollection,
};

/// Reads a WSDL location and everything it imports into the two collections.
pub struct Importer<'a, H> {
    resolver: Resolver<H>,
    documents: &'a mut DocumentCollection,
    schemas: &'a mut SchemaCollection,
    imported: HashSet<Url>,
}

impl<'a, H: Http> Importer<'a, H> {
    pub fn new(
        resolver: Resolver<H>,
        documents: &'a mut DocumentCollection,
        schemas: &'a mut SchemaCollection,
    ) -> Self {
        Self {
            resolver,
            documents,
            schemas,
            imported: HashSet::new(),
        }
    }

    pub fn import(&mut self, location: &str) -> Result<(), Error> {
        self.import_from(location, None)
    }

    fn import_from(&mut self, location: &str, base: Option<&Url>) -> Result<(), Error> {
        let (url, bytes) = match resolver::inline(location) {
            Some(bytes) => (None, bytes),
            None => {
                let url = resolver::to_url(location, base)?;

                if !self.imported.insert(url.clone()) {
                    debug!(%url, "already imported");
                    return Ok(());
                }

                let bytes = self.resolver.fetch(&url)?;
                (Some(url), bytes)
            }
        };

        let source = url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "inline".to_owned());

        let parsed = parser::parse(source, &bytes)?;

        debug!(
            document = url.as_ref().map(Url::as_str).unwrap_or("inline"),
            schemas = parsed.schemas.len(),
            imports = parsed.imports.len(),
            "parsed document"
        );

        if let Some(document) = parsed.document {
            self.documents.push(document);
        }

        for schema in parsed.schemas {
            self.schemas.push(schema);
        }

        for import in &parsed.imports {
            self.import_from(import, url.as_ref())?;
        }

        Ok(())
    }
}
