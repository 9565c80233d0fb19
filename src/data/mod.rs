//! Upstream ingestion records
//!
//! The ingestion stage hands the engine three side tables: authors,
//! publications, and authorship links. The engine assumes structural
//! validity; the host loader in [`csv`] is responsible for tolerating
//! malformed rows.

pub mod csv;

use serde::{Deserialize, Serialize};

/// One row of the author side table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorRecord {
    pub id: u32,
    pub name: String,
}

/// One row of the publication side table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationRecord {
    pub id: u32,
    pub title: String,
    pub year: i32,
    pub venue: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One authorship link between a publication and an author
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthorshipRecord {
    pub publication: u32,
    pub author: u32,
}

/// Fully ingested dataset handed to the engine by the host
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub authors: Vec<AuthorRecord>,
    pub publications: Vec<PublicationRecord>,
    pub authorship: Vec<AuthorshipRecord>,
}
