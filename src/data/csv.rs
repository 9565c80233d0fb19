//! CSV side-table loading for the host binary

use crate::data::{AuthorRecord, AuthorshipRecord, Dataset, PublicationRecord};
use anyhow::Result;
use polars::prelude::*;

/// Load the three ingestion side tables.
pub fn load_dataset(
    authors_path: &str,
    publications_path: &str,
    authorship_path: &str,
) -> Result<Dataset> {
    let authors = load_authors(authors_path)?;
    let publications = load_publications(publications_path)?;
    let authorship = load_authorship(authorship_path)?;

    Ok(Dataset {
        authors,
        publications,
        authorship,
    })
}

/// Scan a CSV file with every column read as text; numeric fields are
/// parsed row by row so one malformed row never fails the load.
fn scan_text_csv(path: &str) -> Result<DataFrame> {
    if !std::path::Path::new(path).exists() {
        return Err(anyhow::anyhow!("File not found: {}", path));
    }

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()?
        .collect()?;

    Ok(df)
}

fn load_authors(path: &str) -> Result<Vec<AuthorRecord>> {
    log::info!("Reading authors file: {}", path);
    let df = scan_text_csv(path)?;

    let ids = df.column("author_id")?.str()?;
    let names = df.column("author_name")?.str()?;

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let (Some(id), Some(name)) = (ids.get(row), names.get(row)) else {
            continue;
        };
        let Ok(id) = id.parse::<u32>() else { continue };
        if id == 0 || name.is_empty() {
            continue;
        }
        records.push(AuthorRecord {
            id,
            name: name.to_string(),
        });
    }

    log::info!("Loaded {} authors", records.len());
    Ok(records)
}

fn load_publications(path: &str) -> Result<Vec<PublicationRecord>> {
    log::info!("Reading publications file: {}", path);
    let df = scan_text_csv(path)?;

    let ids = df.column("pub_id")?.str()?;
    let titles = df.column("title")?.str()?;
    let years = df.column("year")?.str()?;
    let venues = df.column("venue")?.str()?;
    let kinds = df.column("type")?.str()?;

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let (Some(id), Some(year)) = (ids.get(row), years.get(row)) else {
            continue;
        };
        let Ok(id) = id.parse::<u32>() else { continue };
        let Ok(year) = year.parse::<i32>() else { continue };
        if id == 0 {
            continue;
        }
        records.push(PublicationRecord {
            id,
            title: titles.get(row).unwrap_or_default().to_string(),
            year,
            venue: venues.get(row).unwrap_or_default().to_string(),
            kind: kinds.get(row).unwrap_or_default().to_string(),
        });
    }

    log::info!("Loaded {} publications", records.len());
    Ok(records)
}

fn load_authorship(path: &str) -> Result<Vec<AuthorshipRecord>> {
    log::info!("Reading authorship file: {}", path);
    let df = scan_text_csv(path)?;

    let pub_ids = df.column("pub_id")?.str()?;
    let author_ids = df.column("author_id")?.str()?;

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let (Some(publication), Some(author)) = (pub_ids.get(row), author_ids.get(row)) else {
            continue;
        };
        let Ok(publication) = publication.parse::<u32>() else {
            continue;
        };
        let Ok(author) = author.parse::<u32>() else { continue };
        if publication == 0 || author == 0 {
            continue;
        }
        records.push(AuthorshipRecord {
            publication,
            author,
        });
    }

    log::info!("Loaded {} authorship links", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let path = path.to_string_lossy().into_owned();
        (dir, path)
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let (_dir, path) = write_temp(
            "authors.csv",
            "author_id,author_name\n1,Ada\nnot-a-number,Bob\n0,Zero\n3,Carol\n",
        );
        let records = load_authors(&path).unwrap();
        let ids: Vec<u32> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_authors("/nonexistent/authors.csv").is_err());
    }

    #[test]
    fn publications_parse_years() {
        let (_dir, path) = write_temp(
            "publications.csv",
            "pub_id,title,year,venue,type\n1,Paper,2020,ICSE,article\n2,Bad,unknown,ICSE,article\n",
        );
        let records = load_publications(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].year, 2020);
        assert_eq!(records[0].venue, "ICSE");
    }
}
