// Enrichment lookups: book-volume metadata and encyclopedia extracts
use crate::domain::error::BookmapError;
use crate::domain::model::Book;
use crate::infrastructure::network::pacer::RequestPacer;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

const VOLUMES_ENDPOINT: &str = "https://www.googleapis.com/books/v1/volumes";
const WIKIPEDIA_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";

static ZOOM_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"zoom=\d").unwrap());

#[derive(Deserialize, Debug)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Deserialize, Debug)]
struct Volume {
    #[serde(rename = "volumeInfo")]
    info: VolumeInfo,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    #[serde(default)]
    authors: Vec<String>,
    published_date: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    industry_identifiers: Vec<IndustryIdentifier>,
    image_links: Option<ImageLinks>,
}

#[derive(Deserialize, Debug)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    thumbnail: Option<String>,
    small_thumbnail: Option<String>,
}

/// Fields a volume lookup can contribute to a book record.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VolumeMetadata {
    pub isbn: Option<String>,
    pub author: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub cover: Option<String>,
}

/// Best-match volume lookup: by ISBN when the book has one, otherwise by
/// title (and author when present).
pub async fn lookup_volume(
    client: &Client,
    pacer: &RequestPacer,
    book: &Book,
) -> Result<Option<VolumeMetadata>, BookmapError> {
    let query = match &book.isbn {
        Some(isbn) => format!("isbn:{}", isbn.replace(['-', ' '], "")),
        None => {
            let mut q = format!("intitle:\"{}\"", book.title);
            if let Some(author) = &book.author {
                q.push_str(&format!(" inauthor:\"{}\"", author));
            }
            q
        }
    };
    debug!("Volume lookup for {:?}: {}", book.title, query);

    pacer.pace().await;
    let response: VolumesResponse = client
        .get(VOLUMES_ENDPOINT)
        .query(&[("q", query.as_str()), ("maxResults", "1")])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(response
        .items
        .into_iter()
        .next()
        .map(|volume| extract_metadata(volume.info)))
}

fn extract_metadata(info: VolumeInfo) -> VolumeMetadata {
    let isbn = info
        .industry_identifiers
        .iter()
        .find(|id| id.kind == "ISBN_13")
        .or_else(|| info.industry_identifiers.iter().find(|id| id.kind == "ISBN_10"))
        .map(|id| id.identifier.clone());

    let author = if info.authors.is_empty() {
        None
    } else {
        Some(info.authors.join(" and "))
    };

    let year = info
        .published_date
        .as_deref()
        .and_then(|date| date.get(..4))
        .and_then(|prefix| prefix.parse::<i32>().ok());

    let genre = info.categories.first().map(|c| simplify_genre(c));

    let cover = info
        .image_links
        .and_then(|links| links.thumbnail.or(links.small_thumbnail))
        .map(|url| {
            let url = url.replacen("http://", "https://", 1);
            ZOOM_PARAM.replace(&url, "zoom=0").into_owned()
        });

    VolumeMetadata {
        isbn,
        author,
        year,
        genre,
        cover,
    }
}

/// Collapse the volume API's slash-delimited category paths into the short
/// labels the map popups use.
fn simplify_genre(category: &str) -> String {
    let mut genre = if category.contains('/') {
        let parts: Vec<&str> = category.split('/').map(str::trim).collect();
        if parts[0] == "Fiction" && parts.len() > 1 {
            format!("{} Fiction", parts[1])
        } else {
            parts[0].to_string()
        }
    } else {
        category.trim().to_string()
    };

    if genre == "Fiction" {
        genre = "Novel".to_string();
    }
    if genre == "Juvenile Fiction" {
        genre = "Children's".to_string();
    }
    genre
}

#[derive(Deserialize, Debug)]
struct WikiResponse {
    query: Option<WikiQuery>,
}

#[derive(Deserialize, Debug)]
struct WikiQuery {
    #[serde(default)]
    pages: HashMap<String, WikiPage>,
}

#[derive(Deserialize, Debug)]
struct WikiPage {
    #[serde(default)]
    extract: String,
}

/// Fetch the plain-text article for a book, trying disambiguated titles
/// first. The endpoint requires a User-Agent (set on the shared client).
pub async fn fetch_article_extract(
    client: &Client,
    pacer: &RequestPacer,
    title: &str,
) -> Result<Option<String>, BookmapError> {
    let candidates = [
        format!("{} (novel)", title),
        format!("{} (book)", title),
        title.to_string(),
    ];

    for candidate in &candidates {
        pacer.pace().await;
        let response: WikiResponse = client
            .get(WIKIPEDIA_ENDPOINT)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("format", "json"),
                ("titles", candidate.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(query) = response.query {
            for page in query.pages.into_values() {
                if !page.extract.is_empty() {
                    debug!("Found article for {:?} as {:?}", title, candidate);
                    return Ok(Some(page.extract));
                }
            }
        }
    }

    Ok(None)
}
