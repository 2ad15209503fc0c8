//! Slug generation
//!
//! `company-title-city-country`, lowercased, spaces turned into hyphens.
//! Only the first two comma-separated location parts are used, so two
//! postings with the same title in the same city collide.

/// Build the URL slug for a job.
pub fn slug(company: &str, title: &str, location: &str) -> String {
    let mut parts: Vec<&str> = vec![company.trim(), title.trim()];
    parts.extend(
        location
            .split(',')
            .take(2)
            .map(str::trim)
            .filter(|part| !part.is_empty()),
    );

    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
        .replace(' ', "-")
}
