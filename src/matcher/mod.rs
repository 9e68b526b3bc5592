//! Episode matching module
//!
//! This module turns a show's full episode list and the weak signals known
//! about a local file (season and episode numbers, the filename) into at most
//! one catalog episode. Matching is a cascade of independent stages over a
//! shrinking candidate set; the first stage that singles out an episode wins.
//!
//! 1. Season and episode numbers
//! 2. An air date (`YYYY-MM-DD`) in the filename
//! 3. An id tag (`[tvmazeid-123]`) in the filename
//! 4. Episode names contained in the filename
//!
//! When more than one candidate survives, the outcome is ambiguous and no
//! guess is made.

mod series;
mod special;

pub use series::identify;
pub use special::{SeasonPosition, compute_position, special_ordinal};

use crate::metadata_retrieval::{EpisodeId, RemoteEpisode, ShowId};
use crate::text::normalize;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Prefix of the id tag users can put in filenames to pin an episode
pub const ID_TAG_PREFIX: &str = "tvmazeid-";

/// Number of candidates listed when reporting an ambiguous match
const MAX_REPORTED_CANDIDATES: usize = 10;

static FILENAME_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{4}-[0-9]{2}-[0-9]{2}").expect("static regex is valid"));

static FILENAME_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\[{ID_TAG_PREFIX}([0-9]+)\]")).expect("static regex is valid")
});

/// What is known about a local episode file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalEpisodeSignal {
    /// Catalog id of the parent show; nothing is resolved without it
    pub series_id: Option<ShowId>,
    /// Season number as known locally
    pub season_number: Option<u32>,
    /// Episode number as known locally
    pub episode_number: Option<u32>,
    /// Path of the video file, only used for filename heuristics
    pub path: PathBuf,
}

impl LocalEpisodeSignal {
    /// Creates a signal for a file of the given show without numbering
    pub fn new(series_id: ShowId, path: impl Into<PathBuf>) -> Self {
        Self {
            series_id: Some(series_id),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Sets the locally known season and episode numbers
    pub fn with_numbers(mut self, season: Option<u32>, episode: Option<u32>) -> Self {
        self.season_number = season;
        self.episode_number = episode;
        self
    }

    /// Filename without directory and extension
    fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Short description of a candidate episode for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSummary {
    pub id: EpisodeId,
    pub name: String,
}

impl fmt::Display for CandidateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(ID: {})", self.name, self.id)
    }
}

/// Diagnostics for a file that matches several episodes
///
/// Carries enough detail for a human to rename the file so that it matches
/// exactly one episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    /// Up to ten of the remaining candidates, in catalog order
    pub candidates: Vec<CandidateSummary>,
    /// Example filename pinning the first candidate with an id tag
    pub suggested_filename: String,
}

impl Ambiguity {
    fn new(candidates: &[&RemoteEpisode], extension: &str) -> Self {
        let suggested_filename = candidates
            .first()
            .map(|first| format!("{}[{}{}]{}", first.name, ID_TAG_PREFIX, first.id, extension))
            .unwrap_or_default();

        Self {
            candidates: candidates
                .iter()
                .take(MAX_REPORTED_CANDIDATES)
                .map(|episode| CandidateSummary {
                    id: episode.id,
                    name: episode.name.clone(),
                })
                .collect(),
            suggested_filename,
        }
    }
}

impl fmt::Display for Ambiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let candidates = self
            .candidates
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        write!(
            f,
            "Found multiple possible episodes: {}. Include the name or the ID of the correct \
             episode in the file name to make the match unique. IDs have to be in brackets and \
             prefixed with '{}' (e.g. '{}')",
            candidates, ID_TAG_PREFIX, self.suggested_filename
        )
    }
}

/// Result of matching a local file against a show's episodes
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Exactly one episode matches
    Unique(RemoteEpisode),
    /// No episode matches
    NoMatch,
    /// Several episodes match equally well
    Ambiguous(Ambiguity),
}

/// Result of a narrowing stage
enum Narrowing<'a> {
    /// The stage singled out one episode
    Unique(&'a RemoteEpisode),
    /// The stage left this candidate set for the next one
    Remaining(Vec<&'a RemoteEpisode>),
}

/// Matches a local file against the full, catalog-ordered episode list
///
/// Never mutates the episode list. The returned episode is a copy of the
/// catalog record; renumbering of specials is left to the caller.
pub fn match_episode(all: &[RemoteEpisode], signal: &LocalEpisodeSignal) -> MatchOutcome {
    if let Some(episode) = match_by_numbers(all, signal.season_number, signal.episode_number) {
        debug!(id = episode.id, "Matched episode by season and episode number");
        return MatchOutcome::Unique(episode.clone());
    }

    let stem = signal.file_stem();

    let candidates = match narrow_by_date(all, &stem) {
        Narrowing::Unique(episode) => {
            debug!(id = episode.id, "Matched episode by air date in filename");
            return MatchOutcome::Unique(episode.clone());
        }
        Narrowing::Remaining(candidates) => candidates,
    };

    if let Some(episode) = match_by_id_tag(&candidates, &stem) {
        debug!(id = episode.id, "Matched episode by id tag in filename");
        return MatchOutcome::Unique(episode.clone());
    }

    let candidates = narrow_by_name(candidates, &stem);

    match candidates.as_slice() {
        [] => MatchOutcome::NoMatch,
        [episode] => {
            debug!(id = episode.id, "Matched episode by name in filename");
            MatchOutcome::Unique((*episode).clone())
        }
        _ => {
            let extension = signal
                .path
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
                .unwrap_or_default();
            let ambiguity = Ambiguity::new(&candidates, &extension);
            warn!(path = %signal.path.display(), "{ambiguity}");
            MatchOutcome::Ambiguous(ambiguity)
        }
    }
}

/// Stage 1: exact season and episode number, only for non-zero seasons
fn match_by_numbers(
    all: &[RemoteEpisode],
    season: Option<u32>,
    episode: Option<u32>,
) -> Option<&RemoteEpisode> {
    let (season, episode) = (season?, episode?);
    if season == 0 {
        return None;
    }

    all.iter()
        .find(|e| e.season_number == Some(season) && e.episode_number == Some(episode))
}

/// Stage 2: air date in the filename
///
/// A date that matches nothing is ignored and the full list carries on.
/// Several episodes on the same date stay candidates for the later stages.
fn narrow_by_date<'a>(all: &'a [RemoteEpisode], stem: &str) -> Narrowing<'a> {
    let everything = || all.iter().collect::<Vec<_>>();

    let Some(date) = FILENAME_DATE.find(stem) else {
        return Narrowing::Remaining(everything());
    };

    let on_date: Vec<&RemoteEpisode> = all
        .iter()
        .filter(|e| e.air_date.as_deref() == Some(date.as_str()))
        .collect();

    match on_date.as_slice() {
        [] => Narrowing::Remaining(everything()),
        [episode] => Narrowing::Unique(*episode),
        _ => Narrowing::Remaining(on_date),
    }
}

/// Stage 3: `[tvmazeid-<digits>]` tag in the filename
fn match_by_id_tag<'a>(candidates: &[&'a RemoteEpisode], stem: &str) -> Option<&'a RemoteEpisode> {
    let captures = FILENAME_ID.captures(stem)?;
    let id = captures.get(1)?.as_str();

    candidates.iter().copied().find(|e| e.id.to_string() == id)
}

/// Stage 4: keep the candidates whose name appears in the filename
///
/// Comparison ignores separators and case. Unnamed episodes never match.
/// If no name appears, the candidate set is left as it was.
fn narrow_by_name<'a>(candidates: Vec<&'a RemoteEpisode>, stem: &str) -> Vec<&'a RemoteEpisode> {
    let filename = normalize(stem).to_lowercase();

    let named: Vec<&RemoteEpisode> = candidates
        .iter()
        .copied()
        .filter(|e| {
            let name = normalize(&e.name).to_lowercase();
            !name.is_empty() && filename.contains(&name)
        })
        .collect();

    if named.is_empty() { candidates } else { named }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata_retrieval::testing::{regular, special};
    use pretty_assertions::assert_eq;

    fn dated(mut episode: RemoteEpisode, date: &str) -> RemoteEpisode {
        episode.air_date = Some(date.to_string());
        episode
    }

    fn signal(path: &str) -> LocalEpisodeSignal {
        LocalEpisodeSignal::new(1, path)
    }

    fn unique_id(outcome: MatchOutcome) -> EpisodeId {
        match outcome {
            MatchOutcome::Unique(episode) => episode.id,
            other => panic!("expected unique match, got {other:?}"),
        }
    }

    #[test]
    fn test_numbers_win_regardless_of_filename() {
        let all = vec![
            dated(regular(1, 1, 1, "Pilot"), "2020-05-01"),
            regular(2, 1, 2, "Second"),
        ];
        let signal = signal("Show.Pilot.2020-05-01 [tvmazeid-1].mkv").with_numbers(Some(1), Some(2));

        assert_eq!(unique_id(match_episode(&all, &signal)), 2);
    }

    #[test]
    fn test_season_zero_skips_numeric_match() {
        let all = vec![regular(1, 0, 1, "Making Of"), regular(2, 1, 1, "Pilot")];
        let signal = signal("Pilot.mkv").with_numbers(Some(0), Some(1));

        assert_eq!(unique_id(match_episode(&all, &signal)), 2);
    }

    #[test]
    fn test_missing_season_skips_numeric_match() {
        let all = vec![regular(1, 1, 1, "Pilot"), regular(2, 1, 2, "Second")];
        let signal = signal("Second.mkv").with_numbers(None, Some(1));

        assert_eq!(unique_id(match_episode(&all, &signal)), 2);
    }

    #[test]
    fn test_date_match_when_numbers_mismatch() {
        let all = vec![
            dated(regular(1, 1, 1, "Pilot"), "2020-04-24"),
            dated(regular(2, 1, 2, "Second"), "2020-05-01"),
        ];
        let signal = signal("Show.S01E02.2020-05-01.mkv").with_numbers(Some(3), Some(9));

        assert_eq!(unique_id(match_episode(&all, &signal)), 2);
    }

    #[test]
    fn test_unknown_date_reverts_to_full_list() {
        let all = vec![
            dated(regular(1, 1, 1, "Pilot"), "2020-04-24"),
            dated(regular(2, 1, 2, "Second"), "2020-05-01"),
        ];

        assert_eq!(
            unique_id(match_episode(&all, &signal("1999-01-01 Second.mkv"))),
            2
        );
    }

    #[test]
    fn test_shared_date_falls_through_to_name() {
        let all = vec![
            dated(regular(1, 1, 1, "Part One"), "2020-05-01"),
            dated(regular(2, 1, 2, "Part Two"), "2020-05-01"),
            dated(regular(3, 1, 3, "Part Three"), "2020-05-08"),
        ];

        assert_eq!(
            unique_id(match_episode(&all, &signal("Show 2020-05-01 Part.Two.mkv"))),
            2
        );
    }

    #[test]
    fn test_shared_date_without_name_is_ambiguous_among_date_matches() {
        let all = vec![
            dated(regular(1, 1, 1, "Part One"), "2020-05-01"),
            dated(regular(2, 1, 2, "Part Two"), "2020-05-01"),
            dated(regular(3, 1, 3, "Part Three"), "2020-05-08"),
        ];

        match match_episode(&all, &signal("Show 2020-05-01.mkv")) {
            MatchOutcome::Ambiguous(ambiguity) => {
                let ids: Vec<_> = ambiguity.candidates.iter().map(|c| c.id).collect();
                assert_eq!(ids, vec![1, 2]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_id_tag_match_ignores_name() {
        let all = vec![regular(12345, 1, 1, "Pilot"), regular(12346, 1, 2, "Second")];

        assert_eq!(
            unique_id(match_episode(&all, &signal("Second [TVMazeID-12345].mkv"))),
            12345
        );
    }

    #[test]
    fn test_id_tag_is_searched_within_date_matches() {
        let all = vec![
            dated(regular(10, 1, 1, "Alpha"), "2020-05-01"),
            dated(regular(11, 1, 2, "Beta"), "2020-05-01"),
            dated(regular(12, 1, 3, "Gamma"), "2020-05-08"),
        ];

        // Tag points outside the date-narrowed set, so the name stage decides
        assert!(matches!(
            match_episode(&all, &signal("2020-05-01 [tvmazeid-12].mkv")),
            MatchOutcome::Ambiguous(_)
        ));
        assert_eq!(
            unique_id(match_episode(&all, &signal("2020-05-01 [tvmazeid-11].mkv"))),
            11
        );
    }

    #[test]
    fn test_name_match_ignores_separators_and_case() {
        let all = vec![
            regular(1, 1, 1, "The Big One"),
            regular(2, 1, 2, "Something Else"),
        ];

        assert_eq!(
            unique_id(match_episode(&all, &signal("/tv/Show/show.the.BIG.one.720p.mkv"))),
            1
        );
    }

    #[test]
    fn test_unnamed_episode_does_not_match_every_filename() {
        let all = vec![
            regular(1, 1, 1, "Pilot"),
            regular(2, 1, 2, ""),
            regular(3, 1, 3, "Other"),
        ];

        assert_eq!(unique_id(match_episode(&all, &signal("Pilot.mkv"))), 1);
        assert!(matches!(
            match_episode(&all, &signal("unknown.mkv")),
            MatchOutcome::Ambiguous(ambiguity) if ambiguity.candidates.len() == 3
        ));
    }

    #[test]
    fn test_two_names_in_filename_are_ambiguous() {
        let all = vec![
            regular(1, 1, 1, "Fire"),
            regular(2, 1, 2, "Fire and Ice"),
            regular(3, 1, 3, "Water"),
        ];

        match match_episode(&all, &signal("Fire.and.Ice.mkv")) {
            MatchOutcome::Ambiguous(ambiguity) => {
                assert_eq!(
                    ambiguity.candidates,
                    vec![
                        CandidateSummary { id: 1, name: "Fire".to_string() },
                        CandidateSummary { id: 2, name: "Fire and Ice".to_string() },
                    ]
                );
                assert_eq!(ambiguity.suggested_filename, "Fire[tvmazeid-1].mkv");
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_ambiguity_lists_at_most_ten_candidates() {
        let all: Vec<_> = (1..=15).map(|n| regular(n, 1, n, "Episode")).collect();

        match match_episode(&all, &signal("Some.Episode.mkv")) {
            MatchOutcome::Ambiguous(ambiguity) => {
                assert_eq!(ambiguity.candidates.len(), 10);
                assert_eq!(ambiguity.candidates[9].id, 10);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_unnamed_file_against_many_episodes_is_ambiguous() {
        let all = vec![regular(1, 1, 1, "Pilot"), regular(2, 1, 2, "Second")];

        assert!(matches!(
            match_episode(&all, &signal("unknown.mkv")),
            MatchOutcome::Ambiguous(_)
        ));
    }

    #[test]
    fn test_single_episode_show_matches_anything() {
        let all = vec![special(5, 1, "Movie")];

        assert_eq!(unique_id(match_episode(&all, &signal("whatever.mkv"))), 5);
    }

    #[test]
    fn test_empty_list_is_no_match() {
        assert_eq!(match_episode(&[], &signal("Pilot.mkv")), MatchOutcome::NoMatch);
    }

    #[test]
    fn test_ambiguity_message() {
        let ambiguity = Ambiguity {
            candidates: vec![
                CandidateSummary { id: 1, name: "A".to_string() },
                CandidateSummary { id: 2, name: "B".to_string() },
            ],
            suggested_filename: "A[tvmazeid-1].mkv".to_string(),
        };

        let message = ambiguity.to_string();
        assert!(message.starts_with("Found multiple possible episodes: A(ID: 1), B(ID: 2)."));
        assert!(message.contains("'A[tvmazeid-1].mkv'"));
    }
}
