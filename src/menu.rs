//! Daily menu record and its tooltip rendition

use chrono::{DateTime, Local, Weekday};
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::render::tooltip::TooltipContent;

pub const WEEKEND_MESSAGE: &str = "Restaurant closed on weekends";
pub const GENERIC_ERROR_MESSAGE: &str = "Error loading menu";

/// Czech day names as they appear in the restaurant's page headings
pub static CZECH_DAY_NAMES: Lazy<HashMap<Weekday, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (Weekday::Mon, "pondělí"),
        (Weekday::Tue, "úterý"),
        (Weekday::Wed, "středa"),
        (Weekday::Thu, "čtvrtek"),
        (Weekday::Fri, "pátek"),
    ])
});

/// One fetch result
#[derive(Debug, Clone, PartialEq)]
pub struct DailyMenu {
    pub day_name: String,
    pub soup: Option<String>,
    pub main_dish: String,
    pub fetched_at: DateTime<Local>,
    pub is_error: bool,
    pub error_message: Option<String>,
}

impl DailyMenu {
    pub fn new(day_name: impl Into<String>, soup: Option<String>, main_dish: impl Into<String>) -> Self {
        DailyMenu {
            day_name: day_name.into(),
            soup,
            main_dish: main_dish.into(),
            fetched_at: Local::now(),
            is_error: false,
            error_message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        DailyMenu {
            day_name: String::new(),
            soup: None,
            main_dish: String::new(),
            fetched_at: Local::now(),
            is_error: true,
            error_message: Some(message.into()),
        }
    }

    pub fn weekend() -> Self {
        Self::error(WEEKEND_MESSAGE)
    }

    /// Tooltip text for this record. Blank fields are dropped.
    pub fn tooltip_content(&self) -> TooltipContent {
        if self.is_error {
            let message = self
                .error_message
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or(GENERIC_ERROR_MESSAGE);
            return TooltipContent::new("", vec![message.to_string()]);
        }

        let lines = [self.soup.as_deref(), Some(self.main_dish.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        TooltipContent::new(capitalize(self.day_name.trim()), lines)
    }
}

impl From<&DailyMenu> for TooltipContent {
    fn from(menu: &DailyMenu) -> Self {
        menu.tooltip_content()
    }
}

/// Uppercase the first character ("pondělí" -> "Pondělí")
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_soup_is_omitted() {
        let menu = DailyMenu::new("Monday", Some(String::new()), "Goulash");
        let content = menu.tooltip_content();
        assert_eq!(content.title, "Monday");
        assert_eq!(content.lines, vec!["Goulash".to_string()]);
    }

    #[test]
    fn test_soup_and_main_in_order() {
        let menu = DailyMenu::new("středa", Some("Gulášová polévka".into()), "Svíčková");
        let content = TooltipContent::from(&menu);
        assert_eq!(content.title, "Středa");
        assert_eq!(content.lines, vec!["Gulášová polévka".to_string(), "Svíčková".to_string()]);
    }

    #[test]
    fn test_error_shows_message_without_title() {
        let content = DailyMenu::error("network unreachable").tooltip_content();
        assert_eq!(content.title, "");
        assert_eq!(content.lines, vec!["network unreachable".to_string()]);
        assert!(!content.is_empty());
    }

    #[test]
    fn test_error_without_message_uses_generic_text() {
        let mut menu = DailyMenu::error("");
        assert_eq!(menu.tooltip_content().lines, vec![GENERIC_ERROR_MESSAGE.to_string()]);
        menu.error_message = None;
        assert_eq!(menu.tooltip_content().lines, vec![GENERIC_ERROR_MESSAGE.to_string()]);
    }

    #[test]
    fn test_everything_blank_is_empty_content() {
        let menu = DailyMenu::new("", None, "  ");
        assert!(menu.tooltip_content().is_empty());
    }

    #[test]
    fn test_weekend() {
        let menu = DailyMenu::weekend();
        assert!(menu.is_error);
        assert_eq!(menu.tooltip_content().lines, vec![WEEKEND_MESSAGE.to_string()]);
    }

    #[test]
    fn test_day_names_cover_weekdays_only() {
        assert_eq!(CZECH_DAY_NAMES.len(), 5);
        assert_eq!(CZECH_DAY_NAMES[&Weekday::Thu], "čtvrtek");
        assert!(!CZECH_DAY_NAMES.contains_key(&Weekday::Sat));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("úterý"), "Úterý");
        assert_eq!(capitalize(""), "");
    }
}
