//! User-facing message language

use serde::{Deserialize, Serialize};

use crate::impl_wire_label_conversions;

/// Language of user-facing failure messages. The dashboard ships in Arabic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "ar")]
    Arabic,
    #[serde(rename = "en")]
    English,
}

impl_wire_label_conversions!(Locale {
    Arabic => "ar",
    English => "en",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_matches_serde_name() {
        for locale in [Locale::Arabic, Locale::English] {
            let json = serde_json::to_string(&locale).unwrap();
            assert_eq!(json, format!("\"{locale}\""));
        }
    }

    #[test]
    fn parses_env_style_values() {
        assert_eq!("EN".parse::<Locale>().unwrap(), Locale::English);
        assert!("fr".parse::<Locale>().is_err());
    }
}
