use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, trace};

/// Reads a `.json` file from `path`.
///
/// ```ignore
/// let registry: Registry = vantage_util::read_json("registry.json").await?;
/// ```
pub async fn read_json<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let file = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed reading {}", path.display()))?;
    let data: T = serde_json::from_slice(&file)
        .with_context(|| format!("failed deserializing {}", path.display()))?;
    Ok(data)
}

/// Pretty-print `value` as JSON to `path`.
pub async fn write_json_atomic<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_atomic(path.as_ref(), &bytes).await
}

/// Write a header row followed by `rows` as CSV to `path`.
pub async fn write_csv_atomic(
    path: impl AsRef<Path>,
    headers: &[String],
    rows: &[Vec<String>],
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(headers)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    let bytes = wtr.into_inner().context("failed flushing csv buffer")?;
    write_atomic(path.as_ref(), &bytes).await
}

/// Serialize `records` as CSV, one row each, headers taken from the field names.
pub async fn write_records_atomic<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().context("failed flushing csv buffer")?;
    write_atomic(path.as_ref(), &bytes).await
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` to a sibling `*.tmp` file, then rename it over `path`.
///
/// Parent directories are created as necessary. The target is never left half-written.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }

    let tmp = tmp_path(path);
    trace!("writing {} bytes to {}", bytes.len(), tmp.display());

    let written = match tokio::fs::write(&tmp, bytes).await {
        Ok(()) => tokio::fs::rename(&tmp, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        error!("failed writing {}: {e}", path.display());
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e).with_context(|| format!("failed writing {}", path.display()));
    }

    debug!("saved {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        date: String,
        close: f64,
    }

    fn leftovers(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect()
    }

    #[tokio::test]
    async fn test_json_written_into_new_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CORE_STOCK").join("GLOBAL_QUOTE_NVDA.json");

        let value = serde_json::json!({"Global Quote": {"01. symbol": "NVDA"}});
        write_json_atomic(&path, &value).await.unwrap();

        let back: serde_json::Value = read_json(&path).await.unwrap();
        assert_eq!(back, value);
        assert!(leftovers(path.parent().unwrap()).is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("LISTING_STATUS.csv");

        let headers = vec!["symbol".to_string(), "name".to_string()];
        write_csv_atomic(&path, &headers, &[vec!["A".into(), "Agilent".into()]])
            .await
            .unwrap();
        write_csv_atomic(&path, &headers, &[vec!["AA".into(), "Alcoa, Corp".into()]])
            .await
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "symbol,name\nAA,\"Alcoa, Corp\"\n");
        assert!(leftovers(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_records_use_field_names_as_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily.csv");
        let rows = vec![
            Row { date: "2025-01-02".into(), close: 1.5 },
            Row { date: "2025-01-03".into(), close: 2.0 },
        ];
        write_records_atomic(&path, &rows).await.unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let back: Vec<Row> = rdr.deserialize::<Row>().map(|r| r.unwrap()).collect();
        assert_eq!(back, rows);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        // the target is an existing directory, so the final rename fails
        let path = dir.path().join("occupied");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        assert!(write_json_atomic(&path, &serde_json::json!([1, 2])).await.is_err());
        assert!(leftovers(dir.path()).is_empty());
        assert!(path.join("keep").exists());
    }

    #[tokio::test]
    async fn test_read_json_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_json::<serde_json::Value>(dir.path().join("nope.json"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nope.json"));
    }
}
