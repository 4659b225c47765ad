//! Query-parameter surface of the upstream player tracking stats endpoint.
//!
//! The API expects every filter key to be present on every request, even when
//! its value is empty — omitting a key changes upstream behavior. That wire
//! contract is why [`StatsQuery::url`] encodes all fields unconditionally.

use reqwest::Url;

/// Fixed base endpoint for league-wide player tracking stats.
pub const STATS_ENDPOINT: &str = "https://stats.nba.com/stats/leaguedashptstats";

/// The full filter set recognized by the endpoint. String fields default to
/// empty and integer fields to zero unless noted on [`StatsQuery::default`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsQuery {
    pub college: String,
    pub conference: String,
    pub country: String,
    pub date_from: String,
    pub date_to: String,
    pub division: String,
    pub draft_pick: String,
    pub draft_year: String,
    pub game_scope: String,
    pub height: String,
    pub ist_round: String,
    pub last_n_games: i32,
    pub league_id: String,
    pub location: String,
    pub month: i32,
    pub opponent_team_id: i32,
    pub outcome: String,
    pub po_round: i32,
    pub per_mode: String,
    pub player_experience: String,
    pub player_or_team: String,
    pub player_position: String,
    pub pt_measure_type: String,
    pub season: String,
    pub season_segment: String,
    pub season_type: String,
    pub starter_bench: String,
    pub team_id: i32,
    pub vs_conference: String,
    pub vs_division: String,
    pub weight: String,
}

impl Default for StatsQuery {
    /// Documented defaults: `LeagueID="00"`, `PerMode="PerGame"`,
    /// `PlayerOrTeam="Player"`, `PtMeasureType="SpeedDistance"`,
    /// `Season="2023-24"`, `SeasonType="Regular Season"`.
    fn default() -> Self {
        StatsQuery {
            college: String::new(),
            conference: String::new(),
            country: String::new(),
            date_from: String::new(),
            date_to: String::new(),
            division: String::new(),
            draft_pick: String::new(),
            draft_year: String::new(),
            game_scope: String::new(),
            height: String::new(),
            ist_round: String::new(),
            last_n_games: 0,
            league_id: "00".to_string(),
            location: String::new(),
            month: 0,
            opponent_team_id: 0,
            outcome: String::new(),
            po_round: 0,
            per_mode: "PerGame".to_string(),
            player_experience: String::new(),
            player_or_team: "Player".to_string(),
            player_position: String::new(),
            pt_measure_type: "SpeedDistance".to_string(),
            season: "2023-24".to_string(),
            season_segment: String::new(),
            season_type: "Regular Season".to_string(),
            starter_bench: String::new(),
            team_id: 0,
            vs_conference: String::new(),
            vs_division: String::new(),
            weight: String::new(),
        }
    }
}

impl StatsQuery {
    /// Default query with the aggregation mode swapped in.
    pub fn with_per_mode(per_mode: &str) -> Self {
        StatsQuery {
            per_mode: per_mode.to_string(),
            ..StatsQuery::default()
        }
    }

    /// Every field as a `(key, value)` pair, in the endpoint's documented
    /// order. Empty values are included — see the module docs.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("College", self.college.clone()),
            ("Conference", self.conference.clone()),
            ("Country", self.country.clone()),
            ("DateFrom", self.date_from.clone()),
            ("DateTo", self.date_to.clone()),
            ("Division", self.division.clone()),
            ("DraftPick", self.draft_pick.clone()),
            ("DraftYear", self.draft_year.clone()),
            ("GameScope", self.game_scope.clone()),
            ("Height", self.height.clone()),
            ("ISTRound", self.ist_round.clone()),
            ("LastNGames", self.last_n_games.to_string()),
            ("LeagueID", self.league_id.clone()),
            ("Location", self.location.clone()),
            ("Month", self.month.to_string()),
            ("OpponentTeamID", self.opponent_team_id.to_string()),
            ("Outcome", self.outcome.clone()),
            ("PORound", self.po_round.to_string()),
            ("PerMode", self.per_mode.clone()),
            ("PlayerExperience", self.player_experience.clone()),
            ("PlayerOrTeam", self.player_or_team.clone()),
            ("PlayerPosition", self.player_position.clone()),
            ("PtMeasureType", self.pt_measure_type.clone()),
            ("Season", self.season.clone()),
            ("SeasonSegment", self.season_segment.clone()),
            ("SeasonType", self.season_type.clone()),
            ("StarterBench", self.starter_bench.clone()),
            ("TeamID", self.team_id.to_string()),
            ("VsConference", self.vs_conference.clone()),
            ("VsDivision", self.vs_division.clone()),
            ("Weight", self.weight.clone()),
        ]
    }

    /// Build the request URL against `base` with every field encoded.
    pub fn url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (key, value) in self.query_pairs() {
                pairs.append_pair(key, &value);
            }
        }
        url
    }
}
