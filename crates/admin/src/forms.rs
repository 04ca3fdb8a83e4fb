//! Multipart form parsing for catalog uploads.
//!
//! The admin frontend posts categories and products as `multipart/form-data`
//! so images travel with the text fields. Array fields (`sizes`, `colors`,
//! `existing_images`) arrive as JSON-encoded strings.

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::Multipart;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::uploads::ImageUpload;

/// Text fields and files from one multipart body.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: Vec<(String, ImageUpload)>,
}

impl FormData {
    /// Drain a multipart body. Parts with a file name are files, the rest
    /// are text. Empty file parts (an untouched file input) are skipped.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Multipart` if the body is malformed.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                if bytes.is_empty() && file_name.is_empty() {
                    continue;
                }
                form.files.push((
                    name,
                    ImageUpload {
                        bytes: bytes.to_vec(),
                        content_type,
                        file_name: Some(file_name).filter(|f| !f.is_empty()),
                    },
                ));
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    #[cfg(test)]
    fn with_fields(pairs: &[(&str, &str)]) -> Self {
        Self {
            fields: pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            files: Vec::new(),
        }
    }

    /// Whether the form carried `name` at all, even empty.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Trimmed text of `name`, `None` when absent or blank.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Like [`Self::text`] but owned.
    #[must_use]
    pub fn text_owned(&self, name: &str) -> Option<String> {
        self.text(name).map(str::to_string)
    }

    /// Required non-blank text.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` naming the field.
    pub fn required(&self, name: &str) -> Result<String> {
        self.text_owned(name)
            .ok_or_else(|| AppError::BadRequest(format!("Field '{name}' is required")))
    }

    /// Parse `name` with `FromStr`, `None` when absent or blank.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the value does not parse.
    pub fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>> {
        self.text(name)
            .map(|v| {
                v.parse()
                    .map_err(|_| AppError::BadRequest(format!("Field '{name}' is invalid")))
            })
            .transpose()
    }

    /// Checkbox-style boolean: `true`/`false`, `1`/`0`, `on`/`off`, `yes`/`no`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for anything else.
    pub fn bool(&self, name: &str) -> Result<Option<bool>> {
        self.text(name)
            .map(|v| match v.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Ok(true),
                "false" | "0" | "off" | "no" => Ok(false),
                _ => Err(AppError::BadRequest(format!(
                    "Field '{name}' must be true or false"
                ))),
            })
            .transpose()
    }

    /// JSON-decode `name`, `None` when absent or blank.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the value is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.text(name)
            .map(|v| {
                serde_json::from_str(v).map_err(|e| {
                    AppError::BadRequest(format!("Field '{name}' is not valid JSON: {e}"))
                })
            })
            .transpose()
    }

    /// A list of strings sent as a JSON array, or as a comma-separated
    /// string by simpler clients. Entries are trimmed, blanks and
    /// duplicates dropped.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the value looks like JSON but is
    /// not an array of strings.
    pub fn string_list(&self, name: &str) -> Result<Option<Vec<String>>> {
        let Some(raw) = self.text(name) else {
            return Ok(self.has(name).then(Vec::new));
        };

        let items: Vec<String> = if raw.starts_with('[') {
            self.json(name)?.unwrap_or_default()
        } else {
            raw.split(',').map(str::to_string).collect()
        };

        let mut cleaned: Vec<String> = Vec::with_capacity(items.len());
        for item in items {
            let item = item.trim();
            if !item.is_empty() && !cleaned.iter().any(|c| c == item) {
                cleaned.push(item.to_string());
            }
        }
        Ok(Some(cleaned))
    }

    /// Remove and return every file sent under `name`, in order.
    pub fn take_files(&mut self, name: &str) -> Vec<ImageUpload> {
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(field, _)| field == name);
        self.files = kept;
        taken.into_iter().map(|(_, file)| file).collect()
    }

    /// Remove and return the first file sent under `name`.
    pub fn take_file(&mut self, name: &str) -> Option<ImageUpload> {
        let index = self.files.iter().position(|(field, _)| field == name)?;
        Some(self.files.remove(index).1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_text_and_required() {
        let form = FormData::with_fields(&[("name_en", "  Sarees "), ("name_bn", "   ")]);
        assert_eq!(form.text("name_en"), Some("Sarees"));
        assert_eq!(form.text("name_bn"), None);
        assert!(form.has("name_bn"));
        assert!(matches!(form.required("slug"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_parse_numbers() {
        let form = FormData::with_fields(&[("price", "1500.50"), ("stock", "ten")]);
        assert_eq!(
            form.parse::<Decimal>("price").unwrap(),
            Some(Decimal::new(150_050, 2))
        );
        assert!(form.parse::<i32>("stock").is_err());
        assert_eq!(form.parse::<i32>("missing").unwrap(), None);
    }

    #[test]
    fn test_bool() {
        let form = FormData::with_fields(&[("a", "on"), ("b", "FALSE"), ("c", "maybe")]);
        assert_eq!(form.bool("a").unwrap(), Some(true));
        assert_eq!(form.bool("b").unwrap(), Some(false));
        assert!(form.bool("c").is_err());
    }

    #[test]
    fn test_string_list_json_and_csv() {
        let form = FormData::with_fields(&[
            ("sizes", r#"["S", "M", " M ", ""]"#),
            ("colors", "Red, Blue ,,Red"),
            ("empty", ""),
        ]);
        assert_eq!(form.string_list("sizes").unwrap().unwrap(), vec!["S", "M"]);
        assert_eq!(form.string_list("colors").unwrap().unwrap(), vec!["Red", "Blue"]);
        assert_eq!(form.string_list("empty").unwrap(), Some(vec![]));
        assert_eq!(form.string_list("missing").unwrap(), None);
    }

    #[test]
    fn test_string_list_bad_json() {
        let form = FormData::with_fields(&[("sizes", r#"[1, 2"#)]);
        assert!(matches!(form.string_list("sizes"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_take_files() {
        let image = |n: &str| ImageUpload {
            bytes: vec![1],
            content_type: "image/png".to_string(),
            file_name: Some(n.to_string()),
        };
        let mut form = FormData {
            fields: HashMap::new(),
            files: vec![
                ("images".to_string(), image("a.png")),
                ("image".to_string(), image("b.png")),
                ("images".to_string(), image("c.png")),
            ],
        };
        let images = form.take_files("images");
        assert_eq!(images.len(), 2);
        assert_eq!(images[1].file_name.as_deref(), Some("c.png"));
        assert!(form.take_file("image").is_some());
        assert!(form.take_file("image").is_none());
    }
}
