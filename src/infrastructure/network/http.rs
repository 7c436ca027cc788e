// HTTP client construction
use crate::domain::error::BookmapError;
use reqwest::Client;

/// One pooled client for the whole process. The geocoding service requires a
/// descriptive User-Agent; a contact address is appended when configured.
pub fn create_client(contact_email: &str) -> Result<Client, BookmapError> {
    let user_agent = if contact_email.is_empty() {
        format!("bookmap/{}", env!("CARGO_PKG_VERSION"))
    } else {
        format!("bookmap/{} ({})", env!("CARGO_PKG_VERSION"), contact_email)
    };

    Ok(Client::builder()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(std::time::Duration::from_secs(30))
        .timeout(std::time::Duration::from_secs(30))
        .user_agent(user_agent)
        .build()?)
}
