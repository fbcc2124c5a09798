//! Form binding and field validation for post and comment submissions.
//!
//! Forms arrive as `application/x-www-form-urlencoded`. Every field defaults
//! to empty so that a missing field is reported as a field error rather than
//! rejected by the extractor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationErrors};

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const INVALID_GROUP_MESSAGE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Field name -> error messages, in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = FormErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", error.code));
                form_errors.add(&field.to_string(), message);
            }
        }
        form_errors
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PostForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
    /// Group id as submitted; empty means "no group".
    pub group: Option<String>,
    #[validate(length(max = 255, message = "Ensure this value has at most 255 characters."))]
    pub image: Option<String>,
}

impl PostForm {
    /// Trim whitespace and fold empty optionals to `None`.
    pub fn normalized(mut self) -> Self {
        self.text = self.text.trim().to_string();
        self.group = non_blank(self.group);
        self.image = non_blank(self.image);
        self
    }

    /// Field-level checks that need no storage access. The group reference is
    /// checked separately against the repository.
    pub fn check(&self) -> FormErrors {
        let mut errors = match self.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => FormErrors::from(e),
        };
        if self.group.is_some() && self.group_id().is_none() {
            errors.add("group", INVALID_GROUP_MESSAGE);
        }
        errors
    }

    /// The submitted group as an id, if it is numeric.
    pub fn group_id(&self) -> Option<i64> {
        self.group.as_deref().and_then(|g| g.parse().ok())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CommentForm {
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Comment must be between 1 and 2000 characters."
    ))]
    pub text: String,
}

impl CommentForm {
    pub fn normalized(mut self) -> Self {
        self.text = self.text.trim().to_string();
        self
    }

    pub fn check(&self) -> FormErrors {
        match self.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => FormErrors::from(e),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_post_text_is_required() {
        let form = PostForm {
            text: "   \n ".to_string(),
            ..Default::default()
        }
        .normalized();

        let errors = form.check();
        assert_eq!(errors.field("text"), Some(&[REQUIRED_MESSAGE.to_string()][..]));
    }

    #[test]
    fn empty_group_means_no_group() {
        let form = PostForm {
            text: "hello".to_string(),
            group: Some("".to_string()),
            image: Some("  ".to_string()),
        }
        .normalized();

        assert!(form.check().is_empty());
        assert_eq!(form.group, None);
        assert_eq!(form.image, None);
    }

    #[test]
    fn non_numeric_group_is_invalid() {
        let form = PostForm {
            text: "hello".to_string(),
            group: Some("cats".to_string()),
            image: None,
        }
        .normalized();

        let errors = form.check();
        assert_eq!(
            errors.field("group"),
            Some(&[INVALID_GROUP_MESSAGE.to_string()][..])
        );
    }

    #[test]
    fn numeric_group_parses() {
        let form = PostForm {
            text: "hello".to_string(),
            group: Some(" 7 ".to_string()),
            image: None,
        }
        .normalized();

        assert_eq!(form.group_id(), Some(7));
    }

    #[test]
    fn long_image_key_is_rejected() {
        let form = PostForm {
            text: "hello".to_string(),
            group: None,
            image: Some("x".repeat(256)),
        };
        assert!(form.check().field("image").is_some());
    }

    #[test]
    fn comment_length_is_bounded() {
        let empty = CommentForm {
            text: " ".to_string(),
        }
        .normalized();
        assert!(empty.check().field("text").is_some());

        let long = CommentForm {
            text: "a".repeat(2001),
        };
        assert!(long.check().field("text").is_some());

        let ok = CommentForm {
            text: "nice post".to_string(),
        };
        assert!(ok.check().is_empty());
    }
}
