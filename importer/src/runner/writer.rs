use crate::model::DocumentCollection;
use crate::runner::common::Error;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::path::Path;

const INDENT: &[u8] = b"    ";

/// Serialize a value as JSON, indented by four spaces.
fn to_pretty_json<T>(value: &T) -> Result<Vec<u8>, serde_json::Error>
where
    T: Serialize + ?Sized,
{
    let mut data = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut data, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut serializer)?;
    Ok(data)
}

/// Write a value as indented JSON, replacing any existing file.
pub async fn write_json<T>(path: &Path, value: &T) -> Result<(), Error>
where
    T: Serialize + ?Sized,
{
    let data = to_pretty_json(value)?;
    tokio::fs::write(path, data).await?;
    Ok(())
}

/// Write the collection, as a single JSON array.
pub async fn write_collection(path: &Path, documents: &DocumentCollection) -> Result<(), Error> {
    log::debug!("Writing {} documents to {}", documents.len(), path.display());
    write_json(path, documents).await
}
