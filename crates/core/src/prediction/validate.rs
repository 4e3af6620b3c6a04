use hashbrown::HashMap;

pub const TIMELINE_REQUIRED: &str = "Timeline is required";
pub const TIMELINE_NOT_NUMBER: &str = "Timeline must be a number";
pub const TIMELINE_NOT_POSITIVE: &str = "Timeline must be positive";
pub const BUDGET_REQUIRED: &str = "Budget is required";
pub const BUDGET_NOT_NUMBER: &str = "Budget must be a number";
pub const BUDGET_OUT_OF_RANGE: &str = "Budget must be between 0 and 100";
pub const IMAGE_REQUIRED: &str = "Please upload an image";
pub const IMAGE_WRONG_TYPE: &str = "Please upload an image file";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    TimelineDays,
    BudgetUtilizedPercent,
    Image,
}

impl Field {
    /// Multipart part name.
    pub fn wire_name(self) -> &'static str {
        match self {
            Field::TimelineDays => "timeline_days",
            Field::BudgetUtilizedPercent => "budget_utilized_percent",
            Field::Image => "image",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::TimelineDays => "Project Timeline (days)",
            Field::BudgetUtilizedPercent => "Budget Utilized (%)",
            Field::Image => "Construction Site Image",
        }
    }

    pub fn all() -> &'static [Field] {
        &[Field::TimelineDays, Field::BudgetUtilizedPercent, Field::Image]
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn validate_timeline(raw: &str) -> Option<&'static str> {
    if raw.is_empty() {
        return Some(TIMELINE_REQUIRED);
    }
    match parse_number(raw) {
        None => Some(TIMELINE_NOT_NUMBER),
        Some(v) if v <= 0.0 => Some(TIMELINE_NOT_POSITIVE),
        Some(_) => None,
    }
}

pub fn validate_budget(raw: &str) -> Option<&'static str> {
    if raw.is_empty() {
        return Some(BUDGET_REQUIRED);
    }
    match parse_number(raw) {
        None => Some(BUDGET_NOT_NUMBER),
        Some(v) if !(0.0..=100.0).contains(&v) => Some(BUDGET_OUT_OF_RANGE),
        Some(_) => None,
    }
}

/// Text-field dispatch. The image field has no text value and never errors here.
pub fn validate_text(field: Field, raw: &str) -> Option<&'static str> {
    match field {
        Field::TimelineDays => validate_timeline(raw),
        Field::BudgetUtilizedPercent => validate_budget(raw),
        Field::Image => None,
    }
}

pub fn validate_image_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type.trim().to_ascii_lowercase();
    if essence.starts_with("image/") {
        None
    } else {
        Some(IMAGE_WRONG_TYPE)
    }
}

pub fn validate_image_present(present: bool) -> Option<&'static str> {
    if present {
        None
    } else {
        Some(IMAGE_REQUIRED)
    }
}

/// Per-field error messages. A field without an entry is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    by_field: HashMap<Field, &'static str>,
}

impl FieldErrors {
    pub fn set(&mut self, field: Field, error: Option<&'static str>) {
        match error {
            Some(msg) => {
                self.by_field.insert(field, msg);
            }
            None => {
                self.by_field.remove(&field);
            }
        }
    }

    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.by_field.get(&field).copied()
    }

    pub fn has_any(&self) -> bool {
        !self.by_field.is_empty()
    }

    /// Errors in form order.
    pub fn messages(&self) -> Vec<(Field, &'static str)> {
        Field::all()
            .iter()
            .filter_map(|f| self.get(*f).map(|m| (*f, m)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_rules() {
        assert_eq!(validate_timeline(""), Some(TIMELINE_REQUIRED));
        assert_eq!(validate_timeline("abc"), Some(TIMELINE_NOT_NUMBER));
        assert_eq!(validate_timeline("   "), Some(TIMELINE_NOT_NUMBER));
        assert_eq!(validate_timeline("NaN"), Some(TIMELINE_NOT_NUMBER));
        assert_eq!(validate_timeline("-5"), Some("Timeline must be positive"));
        assert_eq!(validate_timeline("0"), Some(TIMELINE_NOT_POSITIVE));
        assert_eq!(validate_timeline("30"), None);
        assert_eq!(validate_timeline("0.5"), None);
    }

    #[test]
    fn budget_rules() {
        assert_eq!(validate_budget(""), Some(BUDGET_REQUIRED));
        assert_eq!(validate_budget("lots"), Some(BUDGET_NOT_NUMBER));
        assert_eq!(validate_budget("150"), Some("Budget must be between 0 and 100"));
        assert_eq!(validate_budget("-0.1"), Some(BUDGET_OUT_OF_RANGE));
        assert_eq!(validate_budget("0"), None);
        assert_eq!(validate_budget("100"), None);
        assert_eq!(validate_budget("42.5"), None);
    }

    #[test]
    fn validation_is_idempotent() {
        for raw in ["", "x", "-5", "30", "150", "55"] {
            assert_eq!(validate_timeline(raw), validate_timeline(raw));
            assert_eq!(validate_budget(raw), validate_budget(raw));
        }
    }

    #[test]
    fn image_type_must_be_image() {
        assert_eq!(validate_image_type("image/jpeg"), None);
        assert_eq!(validate_image_type("IMAGE/PNG"), None);
        assert_eq!(validate_image_type("application/pdf"), Some(IMAGE_WRONG_TYPE));
        assert_eq!(validate_image_type(""), Some(IMAGE_WRONG_TYPE));
        assert_eq!(validate_image_present(false), Some(IMAGE_REQUIRED));
    }

    #[test]
    fn field_errors_report_in_form_order() {
        let mut e = FieldErrors::default();
        e.set(Field::Image, Some(IMAGE_REQUIRED));
        e.set(Field::TimelineDays, Some(TIMELINE_REQUIRED));
        assert_eq!(
            e.messages(),
            vec![
                (Field::TimelineDays, TIMELINE_REQUIRED),
                (Field::Image, IMAGE_REQUIRED)
            ]
        );
        e.set(Field::Image, None);
        e.set(Field::TimelineDays, None);
        assert!(!e.has_any());
    }
}
