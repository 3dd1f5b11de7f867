//! Empty-result convention
//!
//! A successful call is reported with status `Empty` when its value carries
//! no data for the UI to render. What counts as empty is decided per type:
//!
//! | Type | Empty when |
//! |------|-----------|
//! | `Option<T>` | `None`, or the inner value is empty |
//! | `Vec<T>`, `[T]`, `String`, `str` | no elements |
//! | `()` | always (commands without a body) |
//! | integers | zero |
//! | `bool` | `false` |
//! | `Page`, `PageResult`, `PaginatedResponse` | no items |
//! | `serde_json::Value` | null, `false`, zero, `""`, `[]`, or an object whose `items`/`data` array is empty |

use balance_domain::{ApiResponse, Notification, PaginatedResponse, UnreadCount};
use serde_json::Value;

use super::pagination::{Page, PageResult};

/// Whether a successful value carries nothing to show
pub trait EmptyCheck {
    fn is_empty_result(&self) -> bool;
}

impl<T: EmptyCheck> EmptyCheck for Option<T> {
    fn is_empty_result(&self) -> bool {
        self.as_ref().map_or(true, EmptyCheck::is_empty_result)
    }
}

impl<T: EmptyCheck + ?Sized> EmptyCheck for Box<T> {
    fn is_empty_result(&self) -> bool {
        (**self).is_empty_result()
    }
}

impl<T> EmptyCheck for Vec<T> {
    fn is_empty_result(&self) -> bool {
        self.is_empty()
    }
}

impl<T> EmptyCheck for [T] {
    fn is_empty_result(&self) -> bool {
        self.is_empty()
    }
}

impl EmptyCheck for String {
    fn is_empty_result(&self) -> bool {
        self.is_empty()
    }
}

impl EmptyCheck for str {
    fn is_empty_result(&self) -> bool {
        self.is_empty()
    }
}

impl EmptyCheck for () {
    fn is_empty_result(&self) -> bool {
        true
    }
}

impl EmptyCheck for bool {
    fn is_empty_result(&self) -> bool {
        !*self
    }
}

macro_rules! impl_empty_check_for_integers {
    ($($ty:ty),+ $(,)?) => {
        $(impl EmptyCheck for $ty {
            fn is_empty_result(&self) -> bool {
                *self == 0
            }
        })+
    };
}

impl_empty_check_for_integers!(u8, u16, u32, u64, usize, i32, i64);

impl<T> EmptyCheck for Page<T> {
    fn is_empty_result(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> EmptyCheck for PageResult<T> {
    fn is_empty_result(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> EmptyCheck for PaginatedResponse<T> {
    fn is_empty_result(&self) -> bool {
        self.items.is_empty()
    }
}

/// Command envelopes are acknowledgements, never empty
impl<T> EmptyCheck for ApiResponse<T> {
    fn is_empty_result(&self) -> bool {
        false
    }
}

impl EmptyCheck for Notification {
    fn is_empty_result(&self) -> bool {
        false
    }
}

impl EmptyCheck for UnreadCount {
    fn is_empty_result(&self) -> bool {
        self.count == 0
    }
}

impl EmptyCheck for Value {
    fn is_empty_result(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.as_f64() == Some(0.0),
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => ["items", "data"]
                .iter()
                .find_map(|field| map.get(*field))
                .and_then(Value::as_array)
                .is_some_and(Vec::is_empty),
        }
    }
}
