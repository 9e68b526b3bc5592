//! Ranking of show search results
//!
//! Picks the show a local series folder most likely refers to among the hits
//! of a catalog name search.

use crate::metadata_retrieval::ShowSearchResult;
use crate::text::parse_date;
use chrono::Datelike;
use tracing::debug;

/// Year distance assumed for shows without a parsable premiere date
const UNKNOWN_YEAR_DISTANCE: u32 = 1;

/// Picks the best search result for a parsed series name and optional year
///
/// Without a year the catalog's own ranking decides and the first result
/// wins. With a year, results are ordered by the distance between their
/// premiere year and the hint, then by relevance score (highest first);
/// among full ties the catalog order is kept.
pub fn identify<'a>(
    results: &'a [ShowSearchResult],
    parsed_name: &str,
    year: Option<i32>,
) -> Option<&'a ShowSearchResult> {
    let Some(year) = year else {
        debug!(series = parsed_name, "Identifying series by catalog ranking");
        return results.first();
    };

    debug!(series = parsed_name, year, "Identifying series by premiere year");

    results.iter().min_by(|a, b| {
        year_distance(a, year)
            .cmp(&year_distance(b, year))
            .then_with(|| b.score.total_cmp(&a.score))
    })
}

fn year_distance(result: &ShowSearchResult, year: i32) -> u32 {
    result
        .show
        .premiered
        .as_deref()
        .and_then(parse_date)
        .map(|premiered| premiered.year().abs_diff(year))
        .unwrap_or(UNKNOWN_YEAR_DISTANCE)
}
