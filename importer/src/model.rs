use crate::runner::common::Error;
use url::Url;

pub const DEFAULT_INDEX_URL: &str = "https://api.cbd.int/api/v2013/index/select";
pub const DEFAULT_DOCUMENT_URL: &str = "https://api.cbd.int/api/v2013/documents";
/// All ABS permits, of any government
pub const DEFAULT_QUERY: &str = "realm_ss:abs AND schema_s:absPermit AND government_s:*";
pub const DEFAULT_FIELDS: &str = "identifier_s,government_s";
pub const DEFAULT_ROWS: u32 = 10_000;

/// Where and what to import
#[derive(Clone, Debug, PartialEq, Eq, clap::Args)]
#[command(next_help_heading = "Source")]
pub struct IrccImporter {
    /// The index (search) endpoint
    #[arg(long, env = "IRCC_INDEX_URL", default_value = DEFAULT_INDEX_URL)]
    pub index_url: Url,

    /// The document endpoint, records are fetched from `<document-url>/<identifier>/info`
    #[arg(long, env = "IRCC_DOCUMENT_URL", default_value = DEFAULT_DOCUMENT_URL)]
    pub document_url: Url,

    /// The search filter expression
    #[arg(short, long, env = "IRCC_QUERY", default_value = DEFAULT_QUERY)]
    pub query: String,

    /// Comma separated list of index fields to return. An empty list returns all fields.
    #[arg(long, env = "IRCC_FIELDS", default_value = DEFAULT_FIELDS)]
    pub fields: String,

    /// Maximum number of index entries to request
    #[arg(long, env = "IRCC_ROWS", default_value_t = DEFAULT_ROWS)]
    pub rows: u32,

    /// Offset of the first index entry
    #[arg(long, env = "IRCC_START", default_value_t = 0)]
    pub start: u32,
}

impl IrccImporter {
    /// Create an importer for the provided endpoints, using the default query.
    pub fn new(index_url: Url, document_url: Url) -> Self {
        Self {
            index_url,
            document_url,
            query: DEFAULT_QUERY.into(),
            fields: DEFAULT_FIELDS.into(),
            rows: DEFAULT_ROWS,
            start: 0,
        }
    }

    /// The query parameters of the index request, in request order.
    pub fn index_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("q", self.query.clone())];
        if !self.fields.is_empty() {
            query.push(("fl", self.fields.clone()));
        }
        query.push(("rows", self.rows.to_string()));
        query.push(("start", self.start.to_string()));
        query
    }

    /// The URL of the detail record of a single document.
    pub fn document_url(&self, identifier: &str) -> Result<Url, Error> {
        let mut url = self.document_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::BaseUrl(self.document_url.to_string()))?
            .pop_if_empty()
            .push(identifier)
            .push("info");
        Ok(url)
    }
}

/// One reference returned by the index
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
pub struct IndexEntry {
    #[serde(rename = "identifier_s")]
    pub identifier: String,
    /// Not present if the field list doesn't request it
    #[serde(rename = "government_s")]
    pub government: Option<String>,
}

/// A detail record, as returned by the document endpoint
pub type DocumentRecord = serde_json::Value;

/// The records of one import run, in the order they were fetched
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct DocumentCollection(Vec<DocumentRecord>);

impl DocumentCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: DocumentRecord) {
        self.0.push(record);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn importer(documents: &str) -> IrccImporter {
        IrccImporter::new(
            Url::parse("http://localhost/index/select").unwrap(),
            Url::parse(documents).unwrap(),
        )
    }

    #[test]
    fn document_url() {
        let importer = importer("https://api.cbd.int/api/v2013/documents");
        assert_eq!(
            importer.document_url("ABC-123").unwrap().as_str(),
            "https://api.cbd.int/api/v2013/documents/ABC-123/info"
        );
    }

    #[test]
    fn document_url_trailing_slash() {
        let importer = importer("https://api.cbd.int/api/v2013/documents/");
        assert_eq!(
            importer.document_url("ABC-123").unwrap().as_str(),
            "https://api.cbd.int/api/v2013/documents/ABC-123/info"
        );
    }

    #[test]
    fn document_url_encodes_identifier() {
        let importer = importer("https://api.cbd.int/api/v2013/documents");
        assert_eq!(
            importer.document_url("a/b c").unwrap().as_str(),
            "https://api.cbd.int/api/v2013/documents/a%2Fb%20c/info"
        );
    }

    #[test]
    fn document_url_cannot_be_base() {
        let importer = importer("mailto:permits@example.com");
        assert!(matches!(
            importer.document_url("A"),
            Err(Error::BaseUrl(_))
        ));
    }

    #[test]
    fn index_query() {
        let importer = importer("http://localhost/documents");
        assert_eq!(
            importer.index_query(),
            vec![
                ("q", DEFAULT_QUERY.to_string()),
                ("fl", DEFAULT_FIELDS.to_string()),
                ("rows", "10000".to_string()),
                ("start", "0".to_string()),
            ]
        );
    }

    #[test]
    fn index_query_all_fields() {
        let mut importer = importer("http://localhost/documents");
        importer.fields = String::new();
        importer.rows = 5;
        let keys: Vec<_> = importer.index_query().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["q", "rows", "start"]);
    }

    #[test]
    fn index_entry_without_government() {
        let entry: IndexEntry = serde_json::from_value(json!({"identifier_s": "A"})).unwrap();
        assert_eq!(
            entry,
            IndexEntry {
                identifier: "A".into(),
                government: None,
            }
        );
    }

    #[test]
    fn collection_keeps_order() {
        let mut collection = DocumentCollection::new();
        collection.push(json!({"id": "B"}));
        collection.push(json!({"id": "A"}));
        collection.push(json!({"id": "B"}));

        assert_eq!(collection.len(), 3);
        assert_eq!(
            serde_json::to_value(&collection).unwrap(),
            json!([{"id": "B"}, {"id": "A"}, {"id": "B"}])
        );
    }
}
