use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Poll {
    pub id: String,
    pub question: String,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub allow_multiple: bool,
    pub is_closed: bool,
    /// RFC3339 마감 시각. None이면 수동으로 닫을 때까지 열려 있습니다.
    pub expires_at: Option<String>,
    pub total_votes: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Poll {
    /// 투표가 가능한 상태인지 확인합니다. 닫혔거나 마감 시각이 지났으면 false.
    ///
    /// `expires_at` 파싱에 실패하면 마감되지 않은 것으로 취급합니다.
    pub fn is_open_at(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        if self.is_closed {
            return false;
        }
        match self.expires_at.as_deref().map(chrono::DateTime::parse_from_rfc3339) {
            Some(Ok(expires)) => expires > now,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PollOption {
    pub id: String,
    pub poll_id: String,
    pub text: String,
    pub position: i64,
    pub votes_count: i64,
}

/// 결과 화면용 선택지: 득표율(percentage)을 포함합니다.
#[derive(Debug, Clone, Serialize)]
pub struct PollOptionResult {
    pub id: String,
    pub text: String,
    pub position: i64,
    pub votes_count: i64,
    pub percentage: f64,
}

/// 득표율(%)을 소수점 첫째 자리까지 반올림합니다. 전체 투표가 0이면 0입니다.
pub fn percentage(votes: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (votes as f64 * 1000.0 / total as f64).round() / 10.0
}

impl PollOptionResult {
    pub fn from_option(option: PollOption, total_votes: i64) -> Self {
        Self {
            percentage: percentage(option.votes_count, total_votes),
            id: option.id,
            text: option.text,
            position: option.position,
            votes_count: option.votes_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PollDetail {
    #[serde(flatten)]
    pub poll: Poll,
    pub is_open: bool,
    pub options: Vec<PollOptionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_votes: Option<Vec<String>>,
}

impl PollDetail {
    pub fn new(
        poll: Poll,
        options: Vec<PollOption>,
        my_votes: Option<Vec<String>>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        let total = poll.total_votes;
        Self {
            is_open: poll.is_open_at(now),
            options: options
                .into_iter()
                .map(|o| PollOptionResult::from_option(o, total))
                .collect(),
            poll,
            my_votes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePollRequest {
    pub question: String,
    pub description: Option<String>,
    pub options: Vec<String>,
    pub allow_multiple: Option<bool>,
    pub expires_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub option_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollStatusFilter {
    #[default]
    All,
    Open,
    Closed,
}

#[derive(Debug, Default, Deserialize)]
pub struct PollFilter {
    #[serde(default)]
    pub status: PollStatusFilter,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn poll(is_closed: bool, expires_at: Option<String>) -> Poll {
        Poll {
            id: "p1".into(),
            question: "Which hymn on Sunday?".into(),
            description: None,
            created_by: None,
            allow_multiple: false,
            is_closed,
            expires_at,
            total_votes: 0,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn percentage_rounds_to_one_decimal() {
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(5, 5), 100.0);
        assert_eq!(percentage(0, 0), 0.0);
    }

    #[test]
    fn open_poll_without_expiry() {
        assert!(poll(false, None).is_open_at(Utc::now()));
    }

    #[test]
    fn closed_poll_is_not_open() {
        assert!(!poll(true, None).is_open_at(Utc::now()));
    }

    #[test]
    fn expired_poll_is_not_open() {
        let past = (Utc::now() - Duration::hours(1)).to_rfc3339();
        let future = (Utc::now() + Duration::hours(1)).to_rfc3339();
        assert!(!poll(false, Some(past)).is_open_at(Utc::now()));
        assert!(poll(false, Some(future)).is_open_at(Utc::now()));
    }
}
