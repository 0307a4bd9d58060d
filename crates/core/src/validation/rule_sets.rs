//! Rule sets for the catalog entities.
//!
//! Create and update share the same rules.

use super::rules::{LiveTable, Rule, RuleSet};
use crate::rating::RATING_CODES;

pub const NAME_MAX_LEN: u64 = 255;

pub fn category_rules() -> RuleSet {
    RuleSet::new()
        .field("name", [Rule::Required, Rule::String, Rule::Max(NAME_MAX_LEN)])
        .field("description", [Rule::Nullable, Rule::String])
        .field("is_active", [Rule::Boolean])
}

pub fn genre_rules() -> RuleSet {
    RuleSet::new()
        .field("name", [Rule::Required, Rule::String, Rule::Max(NAME_MAX_LEN)])
        .field("is_active", [Rule::Boolean])
        .field(
            "categories_id",
            [Rule::Required, Rule::Array, Rule::Exists(LiveTable::Categories)],
        )
}

pub fn video_rules() -> RuleSet {
    RuleSet::new()
        .field("title", [Rule::Required, Rule::String, Rule::Max(NAME_MAX_LEN)])
        .field("description", [Rule::Required, Rule::String])
        .field("year_launched", [Rule::Required, Rule::YearFormat])
        .field("opened", [Rule::Boolean])
        .field("rating", [Rule::Required, Rule::In(RATING_CODES)])
        .field("duration", [Rule::Required, Rule::Integer])
        .field(
            "categories_id",
            [Rule::Required, Rule::Array, Rule::Exists(LiveTable::Categories)],
        )
        .field(
            "genres_id",
            [Rule::Required, Rule::Array, Rule::Exists(LiveTable::Genres)],
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_names(rules: &RuleSet) -> Vec<&'static str> {
        rules.fields().iter().map(|f| f.field).collect()
    }

    #[test]
    fn video_rules_cover_every_input_field() {
        assert_eq!(
            field_names(&video_rules()),
            [
                "title",
                "description",
                "year_launched",
                "opened",
                "rating",
                "duration",
                "categories_id",
                "genres_id"
            ]
        );
    }

    #[test]
    fn optional_flags_are_not_required() {
        assert!(!category_rules().get("is_active").unwrap().is_required());
        assert!(!genre_rules().get("is_active").unwrap().is_required());
        assert!(!video_rules().get("opened").unwrap().is_required());
    }

    #[test]
    fn text_fields_must_be_strings() {
        for (rules, field) in [
            (category_rules(), "name"),
            (category_rules(), "description"),
            (genre_rules(), "name"),
            (video_rules(), "title"),
            (video_rules(), "description"),
        ] {
            let field_rules = rules.get(field).unwrap();
            assert!(field_rules.rules.contains(&Rule::String), "{field}");
        }
    }

    #[test]
    fn relation_fields_check_live_rows() {
        let genre = genre_rules();
        let rules = &genre.get("categories_id").unwrap().rules;
        assert_eq!(rules.last(), Some(&Rule::Exists(LiveTable::Categories)));

        let video = video_rules();
        let rules = &video.get("genres_id").unwrap().rules;
        assert_eq!(rules.last(), Some(&Rule::Exists(LiveTable::Genres)));
    }
}
