//! TVMaze API response types for deserialization.
//!
//! These structures mirror the JSON response format from the TVMaze API and
//! are converted into the crate's catalog records right after parsing.

use super::{
    CastMember, EpisodeKind, ExternalIds, ImageLinks, Network, RemoteEpisode, RemoteSeason,
    RemoteShow, ShowSearchResult,
};
use serde::Deserialize;

/// A show as returned by `/shows/{id}`, `/lookup/shows` and inside searches.
#[derive(Debug, Deserialize)]
pub(super) struct TvMazeShow {
    pub id: u32,
    /// The name of the TV show
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    pub status: Option<String>,
    pub runtime: Option<u32>,
    pub premiered: Option<String>,
    pub url: Option<String>,
    /// Show summary in HTML format (may be null)
    pub summary: Option<String>,
    pub rating: Option<TvMazeRating>,
    pub network: Option<TvMazeNetwork>,
    pub image: Option<TvMazeImage>,
    pub externals: Option<TvMazeExternals>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TvMazeRating {
    pub average: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TvMazeNetwork {
    pub name: String,
    pub country: Option<TvMazeCountry>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TvMazeCountry {
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TvMazeImage {
    pub medium: Option<String>,
    pub original: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TvMazeExternals {
    pub tvrage: Option<u32>,
    pub thetvdb: Option<u32>,
    pub imdb: Option<String>,
}

/// One hit of the `/search/shows` endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct TvMazeSearchResult {
    pub score: f64,
    pub show: TvMazeShow,
}

/// A single episode from the TVMaze API.
#[derive(Debug, Deserialize)]
pub(super) struct TvMazeEpisode {
    pub id: u32,
    /// Episode title (may be null for episodes without a title)
    pub name: Option<String>,
    pub season: Option<u32>,
    /// Episode number within the season (null for specials)
    pub number: Option<u32>,
    /// `regular`, `significant_special` or `insignificant_special`
    #[serde(rename = "type")]
    pub episode_type: Option<String>,
    pub airdate: Option<String>,
    pub runtime: Option<u32>,
    /// Episode summary in HTML format (may be null)
    pub summary: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TvMazeSeason {
    pub id: u32,
    pub number: Option<u32>,
    pub name: Option<String>,
    #[serde(rename = "premiereDate")]
    pub premiere_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TvMazeCastMember {
    pub person: TvMazePerson,
    pub character: TvMazeCharacter,
}

#[derive(Debug, Deserialize)]
pub(super) struct TvMazePerson {
    pub id: u32,
    pub name: String,
    pub image: Option<TvMazeImage>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TvMazeCharacter {
    pub name: String,
}

impl From<TvMazeImage> for ImageLinks {
    fn from(image: TvMazeImage) -> Self {
        ImageLinks {
            medium: image.medium,
            original: image.original,
        }
    }
}

impl From<TvMazeShow> for RemoteShow {
    fn from(show: TvMazeShow) -> Self {
        let externals = show
            .externals
            .map(|e| ExternalIds {
                imdb: e.imdb.filter(|id| !id.is_empty()),
                tvrage: e.tvrage,
                thetvdb: e.thetvdb,
            })
            .unwrap_or_default();

        RemoteShow {
            id: show.id,
            name: show.name,
            genres: show.genres,
            status: show.status,
            runtime: show.runtime,
            premiered: show.premiered,
            url: show.url,
            summary: show.summary,
            rating: show.rating.and_then(|r| r.average),
            network: show.network.map(|n| Network {
                name: n.name,
                country_code: n.country.and_then(|c| c.code),
            }),
            image: show.image.map(ImageLinks::from),
            externals,
        }
    }
}

impl From<TvMazeSearchResult> for ShowSearchResult {
    fn from(result: TvMazeSearchResult) -> Self {
        ShowSearchResult {
            score: result.score,
            show: result.show.into(),
        }
    }
}

impl From<TvMazeEpisode> for RemoteEpisode {
    fn from(episode: TvMazeEpisode) -> Self {
        RemoteEpisode {
            id: episode.id,
            season_number: episode.season,
            episode_number: episode.number,
            name: episode.name.unwrap_or_default(),
            air_date: episode.airdate.filter(|d| !d.is_empty()),
            runtime: episode.runtime,
            summary: episode.summary,
            kind: EpisodeKind::from_tag(episode.episode_type.as_deref()),
        }
    }
}

impl From<TvMazeSeason> for RemoteSeason {
    fn from(season: TvMazeSeason) -> Self {
        RemoteSeason {
            id: season.id,
            number: season.number,
            name: season.name.filter(|n| !n.is_empty()),
            premiere_date: season.premiere_date,
        }
    }
}

impl From<TvMazeCastMember> for CastMember {
    fn from(member: TvMazeCastMember) -> Self {
        CastMember {
            person_id: member.person.id,
            person_name: member.person.name,
            person_image: member.person.image.map(ImageLinks::from),
            character_name: member.character.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_episode_list_parsing() {
        let json = r#"[
            {"id": 1, "name": "Pilot", "season": 1, "number": 1, "type": "regular",
             "airdate": "2008-01-20", "runtime": 60, "summary": "<p>Walt.</p>"},
            {"id": 2, "name": "Minisode", "season": 2, "number": null,
             "type": "insignificant_special", "airdate": "", "runtime": null, "summary": null}
        ]"#;

        let episodes: Vec<TvMazeEpisode> = serde_json::from_str(json).unwrap();
        let episodes: Vec<RemoteEpisode> = episodes.into_iter().map(Into::into).collect();

        assert_eq!(
            episodes[0],
            RemoteEpisode {
                id: 1,
                season_number: Some(1),
                episode_number: Some(1),
                name: "Pilot".to_string(),
                air_date: Some("2008-01-20".to_string()),
                runtime: Some(60),
                summary: Some("<p>Walt.</p>".to_string()),
                kind: EpisodeKind::Regular,
            }
        );
        assert_eq!(episodes[1].episode_number, None);
        assert_eq!(episodes[1].air_date, None);
        assert_eq!(episodes[1].kind, EpisodeKind::InsignificantSpecial);
    }

    #[test]
    fn test_search_result_parsing() {
        let json = r#"[{"score": 0.9, "show": {
            "id": 169, "name": "Breaking Bad", "genres": ["Drama", "Crime"],
            "status": "Ended", "runtime": 60, "premiered": "2008-01-20",
            "url": "https://www.tvmaze.com/shows/169/breaking-bad",
            "summary": "<p>A teacher.</p>", "rating": {"average": 9.2},
            "network": {"id": 20, "name": "AMC", "country": {"name": "United States", "code": "US"}},
            "image": {"medium": "m.jpg", "original": "o.jpg"},
            "externals": {"tvrage": 18164, "thetvdb": 81189, "imdb": "tt0903747"}
        }}]"#;

        let results: Vec<TvMazeSearchResult> = serde_json::from_str(json).unwrap();
        let result: ShowSearchResult = results.into_iter().next().unwrap().into();

        assert_eq!(result.score, 0.9);
        assert_eq!(result.show.id, 169);
        assert_eq!(result.show.rating, Some(9.2));
        assert_eq!(
            result.show.network,
            Some(Network {
                name: "AMC".to_string(),
                country_code: Some("US".to_string()),
            })
        );
        assert_eq!(
            result.show.externals,
            ExternalIds {
                imdb: Some("tt0903747".to_string()),
                tvrage: Some(18164),
                thetvdb: Some(81189),
            }
        );
    }

    #[test]
    fn test_sparse_show_parsing() {
        let json = r#"{"id": 5, "name": "Obscure", "genres": [], "status": null,
            "runtime": null, "premiered": null, "summary": null, "rating": {"average": null},
            "network": null, "image": null, "externals": {"tvrage": null, "thetvdb": null, "imdb": null}}"#;

        let show: RemoteShow = serde_json::from_str::<TvMazeShow>(json).unwrap().into();

        assert_eq!(show.rating, None);
        assert_eq!(show.network, None);
        assert_eq!(show.externals, ExternalIds::default());
    }

    #[test]
    fn test_cast_parsing() {
        let json = r#"[{"person": {"id": 14245, "name": "Bryan Cranston",
            "image": {"medium": "m.jpg", "original": null}},
            "character": {"id": 1, "name": "Walter White"}}]"#;

        let cast: Vec<TvMazeCastMember> = serde_json::from_str(json).unwrap();
        let member: CastMember = cast.into_iter().next().unwrap().into();

        assert_eq!(member.person_id, 14245);
        assert_eq!(member.character_name, "Walter White");
        assert_eq!(
            member.person_image,
            Some(ImageLinks {
                medium: Some("m.jpg".to_string()),
                original: None,
            })
        );
    }
}
