// Input-document enrichment pass
use crate::domain::error::BookmapError;
use crate::domain::model::Book;
use crate::infrastructure::network::metadata::{
    fetch_article_extract, lookup_volume, VolumeMetadata,
};
use crate::infrastructure::network::pacer::RequestPacer;
use crate::state::AppState;
use colored::Colorize;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

pub struct EnrichOptions {
    /// Also mine setting suggestions from encyclopedia article text.
    pub locations: bool,
    /// Write the changes back. Default is a preview that touches nothing.
    pub apply: bool,
    /// Restrict the pass to one book by exact title.
    pub book_title: Option<String>,
}

/// The metadata endpoints are not bound by the geocoder's one-per-second
/// rule; they still share one polite gate.
const METADATA_PACE: Duration = Duration::from_millis(200);

/// A book whose only locations are these country-sized names still gets the
/// setting-mining pass; they place a marker in the middle of nowhere.
const GENERIC_LOCATIONS: &[&str] = &[
    "United States",
    "USA",
    "United Kingdom",
    "UK",
    "England",
    "Germany",
    "France",
    "China",
    "Russia",
];

const GENERIC_PHRASES: &[&str] = &[
    "the united states",
    "the united kingdom",
    "the novel",
    "the book",
    "the story",
];

const MAX_SUGGESTIONS: usize = 5;

static SETTING_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bset (?:primarily |mainly |largely )?in ([^.]+?)(?:\.|,| and | in the)",
        r"(?i)\btakes? place (?:primarily |mainly )?in ([^.]+?)(?:\.|,| and | in the)",
        r"(?i)\blocated in ([^.]+?)(?:\.|,| and )",
        r"(?i)\bstory (?:is )?set in ([^.]+?)(?:\.|,| and )",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

// "set in Paris over ten days" keeps only the place.
static DURATION_TAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+(?:over|in|during|for)\s+\w+\s+(?:days|weeks|months|years)").unwrap()
});

// Leading time periods: "1920s Paris", "late 1800s London",
// "nineteenth-century St Petersburg".
static LEADING_PERIODS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\d{4}s?\s+",
        r"(?i)^(?:early|mid|late)[\s-]\d{4}s?\s+",
        r"(?i)^(?:fifteenth|sixteenth|seventeenth|eighteenth|nineteenth|twentieth|twenty-first)[\s-]century\s+",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

// "from Nebraska to New York City" names two places, not one.
static JOURNEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:from\s+)?([A-Z][A-Za-z ]+?)\s+to\s+([A-Z][A-Za-z ]+?)$").unwrap());

static AND_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r" and | & ").unwrap());

static BARE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}s?$").unwrap());

pub async fn run_enrich(state: &AppState, options: &EnrichOptions) -> Result<(), BookmapError> {
    let path = &state.config.input;
    let content = fs::read_to_string(path)
        .map_err(|e| BookmapError::Input(format!("cannot read {}: {}", path.display(), e)))?;
    let mut document: Value = serde_yaml::from_str(&content)
        .map_err(|e| BookmapError::Input(format!("cannot parse {}: {}", path.display(), e)))?;

    let books = readable_books(&document);
    if books.is_empty() {
        return Err(BookmapError::Input(format!(
            "no readable books in {}",
            path.display()
        )));
    }
    println!("Found {} books in {}", books.len(), path.display());
    if !options.apply {
        println!("Preview only: pass --yes to write changes back");
    }

    let pacer = RequestPacer::new(METADATA_PACE);
    let mut enriched = 0usize;
    let mut location_enriched = 0usize;
    let mut skipped = 0usize;

    for (index, book) in &books {
        if skip_by_title(options, book) {
            continue;
        }
        let missing = missing_fields(book);
        if missing.is_empty() {
            continue;
        }

        println!("\n[{}/{}] {}", index + 1, books.len(), book.title.bold());
        println!("  Missing: {}", missing.join(", "));

        let found = match lookup_volume(&state.http_client, &pacer, book).await {
            Ok(Some(found)) => found,
            Ok(None) => {
                println!("  No volume match");
                skipped += 1;
                continue;
            }
            Err(e) => {
                warn!("Volume lookup failed for {:?}: {}", book.title, e);
                println!("  Lookup failed: {}", e);
                skipped += 1;
                continue;
            }
        };

        let changes = changes_for(book, &found);
        if changes.is_empty() {
            println!("  Nothing new for the missing fields");
            skipped += 1;
            continue;
        }
        for change in &changes {
            println!("  {} {}: {}", "+".green(), change.field, change.shown);
        }

        if options.apply {
            if let Some(entry) = book_entry_mut(&mut document, *index) {
                for change in changes {
                    set_field(entry, change.field, change.value);
                }
            }
        }
        enriched += 1;
    }

    if options.locations {
        for (index, book) in &books {
            if skip_by_title(options, book) || !needs_locations(book) {
                continue;
            }

            println!(
                "\n[{}/{}] Settings for {}",
                index + 1,
                books.len(),
                book.title.bold()
            );

            let extract = match fetch_article_extract(&state.http_client, &pacer, &book.title).await
            {
                Ok(Some(extract)) => extract,
                Ok(None) => {
                    println!("  No article found");
                    continue;
                }
                Err(e) => {
                    warn!("Article lookup failed for {:?}: {}", book.title, e);
                    println!("  Lookup failed: {}", e);
                    continue;
                }
            };

            let existing: HashSet<String> = book
                .locations
                .iter()
                .map(|location| location.name.to_lowercase())
                .collect();
            let mut suggestions = extract_settings(&extract);
            suggestions.retain(|name| !existing.contains(&name.to_lowercase()));

            if suggestions.is_empty() {
                println!("  No new settings found");
                continue;
            }
            for name in &suggestions {
                println!("  {} location: {}", "+".green(), name);
            }

            if options.apply {
                if let Some(entry) = book_entry_mut(&mut document, *index) {
                    append_locations(entry, &suggestions);
                }
            }
            location_enriched += 1;
        }
    }

    println!();
    if options.apply && enriched + location_enriched > 0 {
        write_document(path, &document)?;
        println!("{} {}", "Updated".green().bold(), path.display());
    }
    println!("Enriched {} books with metadata", enriched);
    if options.locations {
        println!("Added locations to {} books", location_enriched);
    }
    if skipped > 0 {
        println!("Skipped {} books", skipped);
    }

    Ok(())
}

/// Scan article prose for setting mentions. Candidates are cleaned of
/// temporal lead-ins, journeys are split into both endpoints, and the rest
/// is filtered down to proper-noun-looking names, at most MAX_SUGGESTIONS.
fn extract_settings(text: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    for pattern in SETTING_PATTERNS.iter() {
        for captures in pattern.captures_iter(text) {
            let collapsed = captures[1].split_whitespace().collect::<Vec<_>>().join(" ");
            let mut candidate = DURATION_TAIL.replace_all(&collapsed, "").into_owned();
            for period in LEADING_PERIODS.iter() {
                candidate = period.replace(&candidate, "").into_owned();
            }
            let candidate = candidate.trim();

            if let Some(journey) = JOURNEY.captures(candidate) {
                candidates.push(journey[1].trim().to_string());
                candidates.push(journey[2].trim().to_string());
                continue;
            }
            for part in AND_SPLIT.split(candidate) {
                candidates.push(part.trim().trim_matches(',').trim().to_string());
            }
        }
    }

    let mut seen = HashSet::new();
    let mut settings = Vec::new();
    for candidate in candidates {
        if settings.len() == MAX_SUGGESTIONS {
            break;
        }
        if candidate.len() <= 3 || candidate.len() >= 100 {
            continue;
        }
        if BARE_YEAR.is_match(&candidate) {
            continue;
        }
        // Place names carry at least one capital; "a small town" does not.
        if !candidate.chars().any(char::is_uppercase) {
            continue;
        }
        let lowered = candidate.to_lowercase();
        if GENERIC_PHRASES.contains(&lowered.as_str()) {
            continue;
        }
        if !seen.insert(lowered) {
            continue;
        }
        settings.push(candidate);
    }
    settings
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn missing_fields(book: &Book) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if blank(&book.isbn) {
        missing.push("isbn");
    }
    if blank(&book.author) {
        missing.push("author");
    }
    if book.year.is_none() {
        missing.push("year");
    }
    if blank(&book.genre) {
        missing.push("genre");
    }
    if blank(&book.cover) {
        missing.push("cover");
    }
    missing
}

struct FieldChange {
    field: &'static str,
    value: Value,
    shown: String,
}

impl FieldChange {
    fn text(field: &'static str, text: &str) -> Self {
        Self {
            field,
            value: Value::String(text.to_string()),
            shown: text.to_string(),
        }
    }
}

/// Only missing fields are filled; existing values always win.
fn changes_for(book: &Book, found: &VolumeMetadata) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    if blank(&book.isbn) {
        if let Some(isbn) = &found.isbn {
            changes.push(FieldChange::text("isbn", isbn));
        }
    }
    if blank(&book.author) {
        if let Some(author) = &found.author {
            changes.push(FieldChange::text("author", author));
        }
    }
    if book.year.is_none() {
        if let Some(year) = found.year {
            changes.push(FieldChange {
                field: "year",
                value: Value::Number(year.into()),
                shown: year.to_string(),
            });
        }
    }
    if blank(&book.genre) {
        if let Some(genre) = &found.genre {
            changes.push(FieldChange::text("genre", genre));
        }
    }
    if blank(&book.cover) {
        if let Some(cover) = &found.cover {
            changes.push(FieldChange::text("cover", cover));
        }
    }
    changes
}

fn needs_locations(book: &Book) -> bool {
    book.locations.is_empty()
        || book
            .locations
            .iter()
            .any(|location| GENERIC_LOCATIONS.contains(&location.name.trim()))
}

fn skip_by_title(options: &EnrichOptions, book: &Book) -> bool {
    options
        .book_title
        .as_deref()
        .map_or(false, |only| only != book.title)
}

/// Typed snapshots of the entries that parse as books. The raw document keeps
/// everything else (unknown fields, unparseable entries) untouched.
fn readable_books(document: &Value) -> Vec<(usize, Book)> {
    let Some(Value::Sequence(entries)) = document.get("books") else {
        return Vec::new();
    };

    let mut books = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        match serde_yaml::from_value::<Book>(entry.clone()) {
            Ok(book) if !book.title.trim().is_empty() => books.push((index, book)),
            Ok(_) => warn!("Skipping book #{} with an empty title", index + 1),
            Err(e) => warn!("Skipping unreadable book #{}: {}", index + 1, e),
        }
    }
    books
}

fn book_entry_mut(document: &mut Value, index: usize) -> Option<&mut Value> {
    document.get_mut("books").and_then(|books| books.get_mut(index))
}

fn set_field(entry: &mut Value, field: &str, value: Value) {
    if let Value::Mapping(map) = entry {
        map.insert(Value::String(field.to_string()), value);
    }
}

fn append_locations(entry: &mut Value, names: &[String]) {
    let Value::Mapping(map) = entry else { return };

    let key = Value::from("locations");
    if !matches!(map.get(&key), Some(Value::Sequence(_))) {
        map.insert(key.clone(), Value::Sequence(Vec::new()));
    }
    if let Some(Value::Sequence(list)) = map.get_mut(&key) {
        for name in names {
            let mut location = Mapping::new();
            location.insert(Value::from("name"), Value::from(name.as_str()));
            list.push(Value::Mapping(location));
        }
    }
}

/// Same write-new-then-replace discipline as the cache flush: the input
/// document is never left half-written. The tree is re-serialized whole, so
/// YAML comments in the source document do not survive a rewrite.
fn write_document(path: &Path, document: &Value) -> Result<(), BookmapError> {
    let yaml = serde_yaml::to_string(document)?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| BookmapError::Input(format!("temp file in {}: {}", parent.display(), e)))?;
    tmp.write_all(yaml.as_bytes())
        .map_err(|e| BookmapError::Input(format!("write {}: {}", path.display(), e)))?;
    tmp.persist(path)
        .map_err(|e| BookmapError::Input(format!("replace {}: {}", path.display(), e)))?;
    Ok(())
}
