//! Detail page field extraction
//!
//! Pure DOM queries over an already parsed detail page. Every field is
//! optional: a missing element yields `None` (or an empty string for the
//! industry column), never an error.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::listing::JobStub;
use crate::record::JobRecord;
use crate::slug::slug;

const DESCRIPTION: &str = "div.job-detail__content-description";
const QUALIFICATIONS: &str = "div.job-detail__content-qualification";
const CONTACT_LINK: &str = "p.job-detail__content-contact a";
const DEADLINE_LABEL: &str = "Application Deadline:";
const JOB_CENTER_LABEL: &str = "Job-Center:";

/// Tried in order before falling back to link text.
const APPLY_LINKS: &[&str] = &[
    "a.job-detail__apply-now",
    "a.job-detail__apply-button",
    "a.btn--apply",
    "a[data-apply-url]",
];

/// Semantic role of a category span, decided by its icon class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CategoryIcon {
    /// department first, function second
    Tag,
    /// full location
    Maps,
    /// level
    Clock,
    /// nature of the contract
    Document,
}

impl CategoryIcon {
    fn from_class(class: &str) -> Option<Self> {
        class.split_whitespace().find_map(|token| {
            let name = token
                .strip_prefix("icon--")
                .or_else(|| token.strip_prefix("icon-"))
                .or_else(|| token.strip_prefix("icon_"))?;
            if name.starts_with("tag") {
                Some(CategoryIcon::Tag)
            } else if name.starts_with("maps") || name.starts_with("map-") {
                Some(CategoryIcon::Maps)
            } else if name.starts_with("clock") {
                Some(CategoryIcon::Clock)
            } else if name.starts_with("document") {
                Some(CategoryIcon::Document)
            } else {
                None
            }
        })
    }
}

/// Fields carried by the icon-tagged category spans.
#[derive(Debug, Default, PartialEq, Eq)]
struct Categories {
    department: Option<String>,
    function: Option<String>,
    location: Option<String>,
    level: Option<String>,
    job_type: Option<String>,
}

/// Build a record from a parsed detail page.
///
/// `page_url` is the absolute detail URL, used for the `Link` column and to
/// resolve a relative apply link.
pub fn extract_job(document: &Html, stub: &JobStub, company: &str, page_url: &Url) -> JobRecord {
    let categories = extract_categories(document);

    let name = if stub.title.trim().is_empty() {
        select_first(document, "h1")
            .map(|h1| element_text(&h1))
            .unwrap_or_default()
    } else {
        stub.title.trim().to_string()
    };

    // Detail page location wins over the listing one
    let location = categories
        .location
        .or_else(|| non_empty(stub.location.trim().to_string()));

    JobRecord {
        slug: slug(company, &name, location.as_deref().unwrap_or("")),
        name,
        company: company.to_string(),
        job_type: categories.job_type,
        description: extract_description(document),
        location,
        industry: extract_job_center(document),
        level: categories.level,
        deadline: extract_deadline(document),
        apply_url: extract_apply_url(document, page_url),
        department: categories.department,
        function: categories.function,
        qualifications: extract_qualifications(document),
        contact_email: extract_contact_email(document),
        job_id: stub.id.clone(),
        link: page_url.to_string(),
    }
}

/// Inner markup of the description container.
fn extract_description(document: &Html) -> Option<String> {
    let element = select_first(document, DESCRIPTION)?;
    non_empty(element.inner_html().trim().to_string())
}

/// Text nodes of the qualifications container, one per line.
fn extract_qualifications(document: &Html) -> Option<String> {
    let element = select_first(document, QUALIFICATIONS)?;
    non_empty(joined_text(&element, "\n"))
}

fn extract_contact_email(document: &Html) -> Option<String> {
    let href = select_first(document, CONTACT_LINK)?.value().attr("href")?;
    let href = href.trim();
    let address = href
        .strip_prefix("mailto:")
        .or_else(|| href.strip_prefix("MAILTO:"))
        .unwrap_or(href);
    let address = address.split('?').next().unwrap_or(address).trim();
    non_empty(address.to_string())
}

fn extract_deadline(document: &Html) -> Option<String> {
    let label = find_label(document, DEADLINE_LABEL)?;
    let value = labelled_value(label)?;
    non_empty(value.text().map(str::trim).collect::<String>())
}

/// Job-Center text with the embedded link appended in parentheses.
/// Empty string when the label is missing.
fn extract_job_center(document: &Html) -> String {
    let Some(value) = find_label(document, JOB_CENTER_LABEL).and_then(labelled_value) else {
        return String::new();
    };

    let mut text = joined_text(&value, " ");
    let href = Selector::parse("a")
        .ok()
        .and_then(|a| value.select(&a).next())
        .and_then(|link| link.value().attr("href"))
        .map(str::trim)
        .unwrap_or("");
    if !href.is_empty() {
        text.push_str(&format!(" ({})", href));
    }
    text
}

fn extract_apply_url(document: &Html, page_url: &Url) -> Option<String> {
    let from_class = APPLY_LINKS.iter().find_map(|sel| {
        let element = select_first(document, sel)?;
        element
            .value()
            .attr("href")
            .or_else(|| element.value().attr("data-apply-url"))
    });

    let href = match from_class {
        Some(href) => href,
        None => {
            let anchors = Selector::parse("a[href]").ok()?;
            document
                .select(&anchors)
                .find(|a| element_text(a).eq_ignore_ascii_case("apply now"))?
                .value()
                .attr("href")?
        }
    };

    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match page_url.join(href) {
        Ok(absolute) => Some(absolute.to_string()),
        Err(_) => Some(href.to_string()),
    }
}

fn extract_categories(document: &Html) -> Categories {
    let mut categories = Categories::default();
    let Ok(spans) = Selector::parse("span") else {
        return categories;
    };

    let mut tags_seen = 0;
    for span in document.select(&spans) {
        let Some(icon) = span
            .children()
            .filter_map(ElementRef::wrap)
            .find_map(|child| child.value().attr("class").and_then(CategoryIcon::from_class))
        else {
            continue;
        };

        let Some(text) = non_empty(element_text(&span)) else {
            continue;
        };

        match icon {
            CategoryIcon::Tag => {
                match tags_seen {
                    0 => categories.department = Some(text),
                    1 => categories.function = Some(text),
                    _ => {}
                }
                tags_seen += 1;
            }
            CategoryIcon::Maps => {
                categories.location.get_or_insert(text);
            }
            CategoryIcon::Clock => {
                categories.level.get_or_insert(text);
            }
            CategoryIcon::Document => {
                categories.job_type.get_or_insert(text);
            }
        }
    }

    categories
}

/// `<strong>` whose text is exactly `label`.
fn find_label<'a>(document: &'a Html, label: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse("strong").ok()?;
    document
        .select(&selector)
        .find(|strong| element_text(strong) == label)
}

/// The `<span>` carrying a label's value: the first one after the label in
/// document order, skipping any other elements in between.
fn labelled_value(label: ElementRef<'_>) -> Option<ElementRef<'_>> {
    find_next(label, "span")
}

/// First element named `tag` following `start` in document order.
fn find_next<'a>(start: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    let mut node = Some(*start);
    while let Some(current) = node {
        for sibling in current.next_siblings() {
            let found = sibling
                .descendants()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == tag);
            if found.is_some() {
                return found;
            }
        }
        node = current.parent();
    }
    None
}

fn select_first<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Trimmed, non-empty text nodes joined with `separator`.
fn joined_text(element: &ElementRef<'_>, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
