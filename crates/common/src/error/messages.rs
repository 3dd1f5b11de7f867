//! Localized user-facing failure messages

use balance_domain::Locale;

use super::ErrorKind;

/// Message shown to the user for a failure of `kind`.
///
/// `unknown` failures have no fixed text; the caller's `fallback` is used.
pub fn user_message(kind: ErrorKind, locale: Locale, fallback: &str) -> String {
    fixed_message(kind, locale).map_or_else(|| fallback.to_string(), str::to_string)
}

fn fixed_message(kind: ErrorKind, locale: Locale) -> Option<&'static str> {
    let text = match (locale, kind) {
        (_, ErrorKind::Unknown) => return None,

        (Locale::Arabic, ErrorKind::Network) => {
            "فشل في الاتصال بالخادم. تحقق من اتصالك بالإنترنت."
        }
        (Locale::Arabic, ErrorKind::Timeout) => {
            "انتهت مهلة الاتصال. الخادم يستغرق وقتاً أطول من المعتاد."
        }
        (Locale::Arabic, ErrorKind::Cancelled) => "تم إلغاء الطلب.",
        (Locale::Arabic, ErrorKind::Unauthorized) => "غير مخول للوصول. يرجى تسجيل الدخول مرة أخرى.",
        (Locale::Arabic, ErrorKind::Forbidden) => "ليس لديك صلاحية للوصول إلى هذا المورد.",
        (Locale::Arabic, ErrorKind::NotFound) => "المورد المطلوب غير موجود.",
        (Locale::Arabic, ErrorKind::Validation) => "البيانات المرسلة غير صالحة.",
        (Locale::Arabic, ErrorKind::Server) => "خطأ في الخادم. يرجى المحاولة لاحقاً.",

        (Locale::English, ErrorKind::Network) => {
            "Could not reach the server. Check your internet connection."
        }
        (Locale::English, ErrorKind::Timeout) => {
            "The connection timed out. The server is taking longer than usual."
        }
        (Locale::English, ErrorKind::Cancelled) => "The request was cancelled.",
        (Locale::English, ErrorKind::Unauthorized) => "Not authorized. Please sign in again.",
        (Locale::English, ErrorKind::Forbidden) => {
            "You do not have permission to access this resource."
        }
        (Locale::English, ErrorKind::NotFound) => "The requested resource was not found.",
        (Locale::English, ErrorKind::Validation) => "The submitted data is invalid.",
        (Locale::English, ErrorKind::Server) => "Server error. Please try again later.",
    };
    Some(text)
}

/// Default message for a single call when the caller supplies none
pub fn default_error_message(locale: Locale) -> &'static str {
    match locale {
        Locale::Arabic => "حدث خطأ غير متوقع",
        Locale::English => "An unexpected error occurred",
    }
}

/// Default message for a batch member without its own message
pub fn default_batch_message(locale: Locale) -> &'static str {
    match locale {
        Locale::Arabic => "حدث خطأ في العملية",
        Locale::English => "The operation failed",
    }
}

/// Default message for a paginated load
pub fn default_pagination_message(locale: Locale) -> &'static str {
    match locale {
        Locale::Arabic => "فشل في تحميل البيانات",
        Locale::English => "Failed to load data",
    }
}

/// Advisory attached when a listing is large but within limits
pub fn pagination_advisory(locale: Locale) -> &'static str {
    match locale {
        Locale::Arabic => "يُنصح بالتصفح عبر الصفحات لتحسين الأداء",
        Locale::English => "Browsing page by page is recommended for better performance",
    }
}

/// Warning attached when a listing exceeds the configured total
pub fn pagination_over_limit(locale: Locale, total_items: u64) -> String {
    match locale {
        Locale::Arabic => {
            format!("تحذير: عدد العناصر كبير جداً ({total_items}). قد يؤثر على الأداء.")
        }
        Locale::English => {
            format!("Warning: the item count is very large ({total_items}). Performance may suffer.")
        }
    }
}
