//! CSV manifest output: one `image,prompt` row per batch entry.

use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::pipeline::BatchResults;

/// Write the manifest to any writer.
///
/// Emits a header row then one row per entry in processing order, using the
/// csv crate's default minimal quoting. Failed entries are written as their
/// literal `ERROR: ...` marker text, not filtered out.
///
/// Returns the number of data rows written.
pub fn write_manifest_to<W: Write>(results: &BatchResults, writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["image", "prompt"])?;

    let mut rows = 0;
    for entry in results {
        csv_writer.write_record([entry.file_name.as_str(), entry.prompt_text().as_str()])?;
        rows += 1;
    }
    csv_writer.flush()?;
    Ok(rows)
}

/// Write the manifest to a file, creating parent directories as needed.
pub fn write_manifest(results: &BatchResults, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    let rows = write_manifest_to(results, std::io::BufWriter::new(file))?;
    tracing::info!("Wrote {rows} prompt(s) to {:?}", path);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::pipeline::BatchResults;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn results_of(entries: Vec<(&str, std::result::Result<&str, &str>)>) -> BatchResults {
        let mut results = BatchResults::default();
        for (name, outcome) in entries {
            results.push(crate::pipeline::BatchEntry {
                path: PathBuf::from(name),
                file_name: name.to_string(),
                outcome: outcome.map(String::from).map_err(|m| {
                    PipelineError::Caption {
                        path: PathBuf::from(name),
                        message: m.to_string(),
                    }
                }),
            });
        }
        results
    }

    #[test]
    fn test_empty_results_write_header_only() {
        let results = BatchResults::default();
        let mut buf = Vec::new();
        let rows = write_manifest_to(&results, &mut buf).unwrap();
        assert_eq!(rows, 0);
        assert_eq!(String::from_utf8(buf).unwrap(), "image,prompt\n");
    }

    #[test]
    fn test_two_entries_give_three_lines() {
        let results = results_of(vec![
            ("a.jpg", Ok("a photo of a cat, high quality, detailed, sharp focus, professional")),
            ("b.png", Ok("a dog, high quality, detailed, sharp focus, professional")),
        ]);
        let mut buf = Vec::new();
        write_manifest_to(&results, &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.trim_end().lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "image,prompt");
        assert!(lines[1].contains("high quality, detailed, sharp focus, professional"));
    }

    #[test]
    fn test_error_entries_written_as_markers() {
        let results = results_of(vec![("bad.jpg", Err("boom"))]);
        let mut buf = Vec::new();
        write_manifest_to(&results, &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("ERROR:"));
        assert!(text.contains("boom"));
    }

    #[test]
    fn test_round_trip() {
        let results = results_of(vec![("a.jpg", Ok("p1")), ("b.png", Ok("p2"))]);
        let mut buf = Vec::new();
        write_manifest_to(&results, &mut buf).unwrap();

        let mut reader = csv::Reader::from_reader(buf.as_slice());
        let mut mapping = BTreeMap::new();
        for record in reader.records() {
            let record = record.unwrap();
            mapping.insert(record[0].to_string(), record[1].to_string());
        }
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping["a.jpg"], "p1");
        assert_eq!(mapping["b.png"], "p2");
    }

    #[test]
    fn test_prompts_with_commas_are_quoted() {
        let results = results_of(vec![("a.jpg", Ok("one, two"))]);
        let mut buf = Vec::new();
        write_manifest_to(&results, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\"one, two\""));

        // And values without commas stay unquoted (minimal quoting).
        let results = results_of(vec![("a.jpg", Ok("plain"))]);
        let mut buf = Vec::new();
        write_manifest_to(&results, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("a.jpg,plain"));
    }

    #[test]
    fn test_write_manifest_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("desc.csv");
        let results = results_of(vec![("a.jpg", Ok("p1"))]);
        let rows = write_manifest(&results, &path).unwrap();
        assert_eq!(rows, 1);
        assert!(path.exists());
    }
}
