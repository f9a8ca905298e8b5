//! Sports scores feed
//!
//! Games are cached per sport and day under `sports_<sport>_<YYYY-MM-DD>`
//! for 5 minutes. Games involving the favourite team are listed first.

use chrono::{Local, NaiveDate};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

use super::{fetch_json, FeedError, DEFAULT_API_BASE_URL, SPORTS_CACHE_TTL};
use crate::cache::{cache_key, Clock, ExpiringCache, SystemClock};
use crate::storage::Storage;

/// Leagues the sports widget follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SportType {
    Mlb,
    Nfl,
    Nhl,
    Nba,
}

impl SportType {
    pub const ALL: [SportType; 4] = [SportType::Mlb, SportType::Nfl, SportType::Nhl, SportType::Nba];

    pub fn as_str(&self) -> &'static str {
        match self {
            SportType::Mlb => "mlb",
            SportType::Nfl => "nfl",
            SportType::Nhl => "nhl",
            SportType::Nba => "nba",
        }
    }

    /// Team abbreviation pinned to the top of the list
    pub fn favorite_team(&self) -> &'static str {
        match self {
            SportType::Mlb => "SD",
            SportType::Nfl => "LAC",
            SportType::Nhl => "SJS",
            SportType::Nba => "LAL",
        }
    }
}

impl FromStr for SportType {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|sport| sport.as_str() == lower)
            .ok_or_else(|| FeedError::UnknownSport(s.to_string()))
    }
}

impl fmt::Display for SportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A score as reported: numeric once play starts, text otherwise ("-", "TBD")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Points(i64),
    Text(String),
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Points(points) => write!(f, "{}", points),
            Score::Text(text) => f.write_str(text),
        }
    }
}

/// One scheduled, live, or finished game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Game {
    #[serde(rename = "GameID")]
    pub game_id: i64,
    pub date_time: String,
    pub status: String,
    pub away_team: String,
    pub home_team: String,
    #[serde(default)]
    pub away_team_score: Option<Score>,
    #[serde(default)]
    pub home_team_score: Option<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stadium_details: Option<String>,
}

impl Game {
    /// Whether `team` plays in this game
    pub fn involves(&self, team: &str) -> bool {
        self.home_team.eq_ignore_ascii_case(team) || self.away_team.eq_ignore_ascii_case(team)
    }
}

/// Moves games involving `team` to the front, keeping relative order otherwise
pub fn sort_favorites_first(games: &mut [Game], team: &str) {
    games.sort_by_key(|game| !game.involves(team));
}

/// Cache key for one sport's games on `date`
pub fn games_cache_key(sport: SportType, date: NaiveDate) -> String {
    cache_key("sports", format!("{}_{}", sport, date.format("%Y-%m-%d")))
}

/// Client for game scores, backed by the expiring cache
#[derive(Debug)]
pub struct SportsClient<'a, S, C = SystemClock> {
    http_client: Client,
    base_url: String,
    cache: &'a ExpiringCache<S, C>,
    ttl: Duration,
}

impl<'a, S: Storage, C: Clock> SportsClient<'a, S, C> {
    /// Creates a client against the production proxy
    pub fn new(cache: &'a ExpiringCache<S, C>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            cache,
            ttl: SPORTS_CACHE_TTL,
        }
    }

    /// Points the client at a different proxy
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the freshness window
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns today's games for `sport`, favourite team first
    pub async fn games(&self, sport: SportType) -> Result<Vec<Game>, FeedError> {
        self.games_on(sport, Local::now().date_naive()).await
    }

    /// Returns the games cached for `date`, or the proxy's current list on a miss
    ///
    /// The proxy only serves the current list, so `date` must be today.
    async fn games_on(&self, sport: SportType, date: NaiveDate) -> Result<Vec<Game>, FeedError> {
        let key = games_cache_key(sport, date);

        if let Some(games) = self.cache.get::<Vec<Game>>(&key, self.ttl) {
            debug!(%sport, count = games.len(), "games served from cache");
            return Ok(games);
        }

        let url = format!("{}/api/sports/{}", self.base_url, sport);
        let mut games: Vec<Game> = fetch_json(&self.http_client, &url, &[]).await?;
        sort_favorites_first(&mut games, sport.favorite_team());

        if let Err(e) = self.cache.set(&key, &games) {
            warn!(%sport, error = %e, "failed to cache games");
        }
        Ok(games)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::storage::MemoryStorage;

    const UNREACHABLE: &str = "http://127.0.0.1:9";

    fn game(id: i64, away: &str, home: &str) -> Game {
        Game {
            game_id: id,
            date_time: "2026-10-16T19:10:00".to_string(),
            status: "Scheduled".to_string(),
            away_team: away.to_string(),
            home_team: home.to_string(),
            away_team_score: None,
            home_team_score: None,
            channel: None,
            stadium_details: None,
        }
    }

    #[test]
    fn test_sport_type_parse() {
        assert_eq!("nba".parse::<SportType>().unwrap(), SportType::Nba);
        assert_eq!("NHL".parse::<SportType>().unwrap(), SportType::Nhl);
        assert!(matches!(
            "cricket".parse::<SportType>(),
            Err(FeedError::UnknownSport(s)) if s == "cricket"
        ));
    }

    #[test]
    fn test_favorite_teams() {
        assert_eq!(SportType::Mlb.favorite_team(), "SD");
        assert_eq!(SportType::Nfl.favorite_team(), "LAC");
        assert_eq!(SportType::Nhl.favorite_team(), "SJS");
        assert_eq!(SportType::Nba.favorite_team(), "LAL");
    }

    #[test]
    fn test_sort_favorites_first_is_stable() {
        let mut games = vec![
            game(1, "BOS", "NYY"),
            game(2, "SD", "LAD"),
            game(3, "SF", "COL"),
            game(4, "ARI", "SD"),
        ];

        sort_favorites_first(&mut games, "SD");

        let ids: Vec<i64> = games.iter().map(|g| g.game_id).collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_game_deserializes_mixed_scores() {
        let json = r#"{
            "GameID": 77,
            "DateTime": "2026-10-16T19:00:00",
            "Status": "InProgress",
            "AwayTeam": "LAL",
            "HomeTeam": "BOS",
            "AwayTeamScore": 88,
            "HomeTeamScore": "-",
            "Channel": "ESPN"
        }"#;

        let game: Game = serde_json::from_str(json).unwrap();

        assert_eq!(game.game_id, 77);
        assert_eq!(game.away_team_score, Some(Score::Points(88)));
        assert_eq!(game.home_team_score, Some(Score::Text("-".to_string())));
        assert_eq!(game.channel.as_deref(), Some("ESPN"));
        assert!(game.stadium_details.is_none());
        assert!(game.involves("lal"));
    }

    #[test]
    fn test_games_cache_key() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(games_cache_key(SportType::Nba, date), "sports_nba_2026-10-16");
    }

    #[tokio::test]
    async fn test_fresh_cache_is_served_without_network() {
        let storage = MemoryStorage::new();
        let cache = ExpiringCache::with_clock(&storage, ManualClock::at(0));
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let cached = vec![game(9, "LAC", "KC")];
        cache.set(&games_cache_key(SportType::Nfl, date), &cached).unwrap();

        let client = SportsClient::new(&cache).with_base_url(UNREACHABLE);
        let games = client.games_on(SportType::Nfl, date).await.unwrap();

        assert_eq!(games, cached);
    }

    #[tokio::test]
    async fn test_stale_scores_are_refetched() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::at(0);
        let cache = ExpiringCache::with_clock(&storage, clock.clone());
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        cache
            .set(&games_cache_key(SportType::Nhl, date), &vec![game(1, "SJS", "VAN")])
            .unwrap();

        clock.advance(SPORTS_CACHE_TTL + Duration::from_secs(1));

        let client = SportsClient::new(&cache).with_base_url(UNREACHABLE);
        assert!(client.games_on(SportType::Nhl, date).await.is_err());
        assert!(cache.keys().unwrap().is_empty(), "stale entry should be evicted");
    }

    #[tokio::test]
    async fn test_games_reads_todays_entry() {
        let storage = MemoryStorage::new();
        let cache = ExpiringCache::new(&storage);
        let today = Local::now().date_naive();
        let cached = vec![game(3, "LAL", "BOS")];
        cache.set(&games_cache_key(SportType::Nba, today), &cached).unwrap();

        let client = SportsClient::new(&cache).with_base_url(UNREACHABLE);
        let games = client.games(SportType::Nba).await.unwrap();

        assert_eq!(games, cached);
    }
}
