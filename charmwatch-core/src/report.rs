//! HTML report rendering
//!
//! Renders the four categories as titled grids of `juju-card` widgets. The
//! cards are filled in client side by the juju-cards script; the report only
//! carries each package id in a `data-id` attribute. Ids and the date go
//! through the template engine's HTML escaping.

use askama::Template;

use crate::catalog::PackageId;
use crate::classify::{Category, Classification};

/// Section heading for a category
pub fn heading(category: Category) -> &'static str {
    match category {
        Category::NewPromulgated => "New recommended charms",
        Category::NewCommunity => "New community charms",
        Category::UpdatedPromulgated => "New revisions of recommended charms",
        Category::UpdatedCommunity => "New revisions of community charms",
    }
}

/// Split `ids` into grid rows of `row_width` cells; the last row may be short.
///
/// A `row_width` of 0 is treated as 1.
pub fn grid_rows<T>(ids: &[T], row_width: usize) -> Vec<&[T]> {
    ids.chunks(row_width.max(1)).collect()
}

struct Section<'a> {
    heading: &'a str,
    rows: Vec<Vec<&'a str>>,
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate<'a> {
    date: &'a str,
    sections: Vec<Section<'a>>,
}

/// Render the report from the four category lists, in report order
pub fn render_sections(
    new_promulgated: &[PackageId],
    new_community: &[PackageId],
    updated_promulgated: &[PackageId],
    updated_community: &[PackageId],
    date: &str,
    row_width: usize,
) -> Result<String, askama::Error> {
    let lists = [
        (Category::NewPromulgated, new_promulgated),
        (Category::NewCommunity, new_community),
        (Category::UpdatedPromulgated, updated_promulgated),
        (Category::UpdatedCommunity, updated_community),
    ];

    let sections = lists
        .into_iter()
        .map(|(category, ids)| Section {
            heading: heading(category),
            rows: grid_rows(ids, row_width)
                .into_iter()
                .map(|row| row.iter().map(PackageId::as_str).collect())
                .collect(),
        })
        .collect();

    ReportTemplate { date, sections }.render()
}

/// Render a classification for `date` (ISO 8601)
pub fn render(
    classification: &Classification,
    date: &str,
    row_width: usize,
) -> Result<String, askama::Error> {
    render_sections(
        classification.ids(Category::NewPromulgated),
        classification.ids(Category::NewCommunity),
        classification.ids(Category::UpdatedPromulgated),
        classification.ids(Category::UpdatedCommunity),
        date,
        row_width,
    )
}
