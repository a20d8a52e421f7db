//! Personal data export.
//!
//! Packs a user's profile, quiz history and flashcard progress into a zip of
//! JSON files so accounts are portable.

use rusqlite::Connection;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

use crate::db::results;
use crate::domain::UserProfile;

type ExportError = Box<dyn std::error::Error + Send + Sync>;

pub fn build_export(conn: &Connection, profile: &UserProfile) -> Result<Vec<u8>, ExportError> {
    let quiz_results = results::list_results_for_user(conn, profile.id)?;
    let progress = results::list_all_flashcard_progress(conn, profile.id)?;

    let mut buffer = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buffer));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("profile.json", options)?;
        zip.write_all(serde_json::to_string_pretty(profile)?.as_bytes())?;

        zip.start_file("quiz_results.json", options)?;
        zip.write_all(serde_json::to_string_pretty(&quiz_results)?.as_bytes())?;

        zip.start_file("flashcard_progress.json", options)?;
        zip.write_all(serde_json::to_string_pretty(&progress)?.as_bytes())?;

        zip.finish()?;
    }
    Ok(buffer)
}
