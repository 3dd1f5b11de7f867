//! Domain types shared with the REST API

pub mod api;
pub mod locale;
pub mod notification;

pub use api::{ApiResponse, PaginatedResponse};
pub use locale::Locale;
pub use notification::{
    IdsRequest, Notification, NotificationData, NotificationFilters, NotificationKind,
    UnreadCount,
};
