//! Notification feed types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_wire_label_conversions;

/// What triggered a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Interest,
    Favorite,
    Assignment,
    System,
}

impl_wire_label_conversions!(NotificationKind {
    Interest => "interest",
    Favorite => "favorite",
    Assignment => "assignment",
    System => "system",
});

/// Entity references attached to a notification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationData {
    pub project_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub notes: Option<String>,
}

/// A notification addressed to the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_ar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_en: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_ar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<NotificationData>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

/// Query filters for the notification listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationFilters {
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<NotificationKind>,
    pub is_read: Option<bool>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl NotificationFilters {
    /// Query pairs for the set filters; unset and blank values are skipped.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(user_id) = self.user_id.as_deref().filter(|s| !s.is_empty()) {
            query.push(("userId", user_id.to_string()));
        }
        if let Some(kind) = self.kind {
            query.push(("type", kind.to_string()));
        }
        if let Some(is_read) = self.is_read {
            query.push(("isRead", is_read.to_string()));
        }
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            query.push(("pageSize", page_size.to_string()));
        }
        query
    }

    /// Stable fragment used to build per-filter cache keys
    pub fn cache_fragment(&self) -> String {
        self.to_query().iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&")
    }
}

/// Body of `GET /Notification/unread-count`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    pub count: u64,
}

/// Body for bulk commands (`mark-read`, `bulk-delete`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdsRequest {
    pub ids: Vec<i64>,
}
