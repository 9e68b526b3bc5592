//! Numbering and in-season placement of special episodes
//!
//! The catalog lists specials among the regular episodes of a season, in air
//! order, but without an episode number. Locally they live in season 0, so
//! they need a synthesized number and, for story-relevant specials, a hint
//! where they belong when watching a season in order.

use crate::metadata_retrieval::{EpisodeKind, RemoteEpisode};

/// Where a special sits relative to the regular episodes
///
/// At most one of "airs before" (season, optionally with episode) or
/// "airs after" (season) is ever set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeasonPosition {
    pub airs_before_season: Option<u32>,
    pub airs_before_episode: Option<u32>,
    pub airs_after_season: Option<u32>,
}

impl SeasonPosition {
    fn before_season(season: Option<u32>) -> Self {
        Self {
            airs_before_season: season,
            ..Self::default()
        }
    }

    fn after_season(season: Option<u32>) -> Self {
        Self {
            airs_after_season: season,
            ..Self::default()
        }
    }
}

/// Zero-based ordinal of a special among all specials of the show
///
/// Counts specials of either kind preceding `special` in catalog order.
/// The number is not stable: if the catalog later adds an older special,
/// every special after it shifts by one.
pub fn special_ordinal(all: &[RemoteEpisode], special: &RemoteEpisode) -> u32 {
    all.iter()
        .filter(|e| e.kind.is_special())
        .take_while(|e| e.id != special.id)
        .count() as u32
}

/// Computes the in-season placement of a significant special
///
/// - First record of the show, or first record of its season: airs before
///   its own season.
/// - Otherwise, if the next regular episode is in the same season: airs
///   before that episode.
/// - Otherwise (end of season, or end of the show): airs after its season.
///
/// A special that is not part of `all` gets no placement.
pub fn compute_position(all: &[RemoteEpisode], special: &RemoteEpisode) -> SeasonPosition {
    let Some(index) = all.iter().position(|e| e.id == special.id) else {
        return SeasonPosition::default();
    };

    if index == 0 || all[index - 1].season_number != special.season_number {
        return SeasonPosition::before_season(special.season_number);
    }

    let next_regular = all[index + 1..]
        .iter()
        .find(|e| e.kind == EpisodeKind::Regular);

    match next_regular {
        Some(next) if next.season_number == special.season_number => SeasonPosition {
            airs_before_season: special.season_number,
            airs_before_episode: next.episode_number,
            airs_after_season: None,
        },
        _ => SeasonPosition::after_season(special.season_number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata_retrieval::testing::{episode, regular, special};

    #[test]
    fn test_special_opening_a_season_airs_before_it() {
        let all = vec![
            regular(1, 1, 1, "S1E1"),
            regular(2, 1, 2, "S1E2"),
            special(3, 2, "Prequel"),
            regular(4, 2, 1, "S2E1"),
        ];

        assert_eq!(
            compute_position(&all, &all[2]),
            SeasonPosition {
                airs_before_season: Some(2),
                airs_before_episode: None,
                airs_after_season: None,
            }
        );
    }

    #[test]
    fn test_first_record_airs_before_its_season() {
        let all = vec![special(1, 1, "Preview"), regular(2, 1, 1, "Pilot")];

        assert_eq!(
            compute_position(&all, &all[0]),
            SeasonPosition::before_season(Some(1))
        );
    }

    #[test]
    fn test_mid_season_special_airs_before_next_regular() {
        let all = vec![
            regular(1, 1, 1, "S1E1"),
            special(2, 1, "Holiday"),
            episode(3, Some(1), None, "Recap", EpisodeKind::InsignificantSpecial),
            regular(4, 1, 2, "S1E2"),
        ];

        assert_eq!(
            compute_position(&all, &all[1]),
            SeasonPosition {
                airs_before_season: Some(1),
                airs_before_episode: Some(2),
                airs_after_season: None,
            }
        );
    }

    #[test]
    fn test_special_closing_a_season_airs_after_it() {
        let all = vec![
            regular(1, 1, 1, "S1E1"),
            special(2, 1, "Finale Special"),
            regular(3, 2, 1, "S2E1"),
        ];

        assert_eq!(
            compute_position(&all, &all[1]),
            SeasonPosition::after_season(Some(1))
        );
    }

    #[test]
    fn test_special_at_end_of_show_airs_after_its_season() {
        let all = vec![regular(1, 3, 1, "S3E1"), special(2, 3, "Reunion")];

        assert_eq!(
            compute_position(&all, &all[1]),
            SeasonPosition::after_season(Some(3))
        );
    }

    #[test]
    fn test_unknown_special_has_no_position() {
        let all = vec![regular(1, 1, 1, "S1E1")];

        assert_eq!(
            compute_position(&all, &special(99, 1, "Elsewhere")),
            SeasonPosition::default()
        );
    }

    #[test]
    fn test_special_ordinal_counts_preceding_specials() {
        let all = vec![
            special(1, 1, "First"),
            regular(2, 1, 1, "S1E1"),
            episode(3, Some(1), None, "Recap", EpisodeKind::InsignificantSpecial),
            regular(4, 1, 2, "S1E2"),
            special(5, 2, "Third"),
        ];

        assert_eq!(special_ordinal(&all, &all[0]), 0);
        assert_eq!(special_ordinal(&all, &all[2]), 1);
        assert_eq!(special_ordinal(&all, &all[4]), 2);
    }

    #[test]
    fn test_special_ordinal_shifts_when_older_special_is_added() {
        let mut all = vec![regular(1, 1, 1, "S1E1"), special(2, 1, "Holiday")];
        assert_eq!(special_ordinal(&all, &all[1]), 0);

        all.insert(0, special(3, 1, "Unaired Pilot"));
        assert_eq!(special_ordinal(&all, &all[2]), 1);
    }
}
