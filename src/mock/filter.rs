//! Query parsing for the simulated list endpoints

use crate::types::Post;
use chrono::{DateTime, Utc};

/// Post filters decoded from a `GET posts` query string.
///
/// Every set field must match; multi-valued fields match on membership.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    pub state: Option<String>,
    pub states: Vec<String>,
    pub account_ids: Vec<String>,
    pub query: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub post_type: Option<String>,
    pub member_id: Option<String>,
}

impl PostFilter {
    /// Decode the filter parameters; unknown keys are ignored
    pub fn from_query(params: &[(String, String)]) -> Result<Self, String> {
        let mut filter = Self::default();
        for (key, value) in params {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "state" => filter.state = Some(value.clone()),
                "state[]" => filter.states.push(value.clone()),
                "account_ids[]" => filter.account_ids.push(value.clone()),
                "query" => filter.query = Some(value.clone()),
                "from" => filter.from = Some(parse_time("from", value)?),
                "to" => filter.to = Some(parse_time("to", value)?),
                "postType" => filter.post_type = Some(value.clone()),
                "member_id" => filter.member_id = Some(value.clone()),
                _ => {}
            }
        }
        Ok(filter)
    }

    /// Check a post against every set criterion
    pub fn matches(&self, post: &Post) -> bool {
        if let Some(ref state) = self.state {
            if &post.state != state {
                return false;
            }
        }
        if !self.states.is_empty() && !self.states.contains(&post.state) {
            return false;
        }
        if !self.account_ids.is_empty() && !self.account_ids.contains(&post.account_id) {
            return false;
        }
        if let Some(ref query) = self.query {
            if !post.text.contains(query.as_str()) {
                return false;
            }
        }
        if self.from.is_some() || self.to.is_some() {
            // an unscheduled post is outside every range
            let Some(at) = post.scheduled_at else {
                return false;
            };
            if self.from.is_some_and(|from| at < from) || self.to.is_some_and(|to| at > to) {
                return false;
            }
        }
        if let Some(ref post_type) = self.post_type {
            if &post.post_type != post_type {
                return false;
            }
        }
        if let Some(ref member_id) = self.member_id {
            if &post.user.id != member_id {
                return false;
            }
        }
        true
    }
}

/// Requested page number; absent means 1
pub fn parse_page(params: &[(String, String)]) -> Result<u32, String> {
    match params.iter().rev().find(|(k, _)| k == "page") {
        None => Ok(1),
        Some((_, value)) => match value.parse::<u32>() {
            Ok(page) if page >= 1 => Ok(page),
            _ => Err(format!("Invalid page number: {value}")),
        },
    }
}

fn parse_time(key: &str, value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| format!("Invalid {key} date: {value}"))
}
