use crate::config::{CSV_EXTENSION, CSV_MIME_TYPE, MAX_RECOMMENDATIONS, MIN_RECOMMENDATIONS};
use crate::error::ValidationError;
use crate::gateway::{DatasetFile, KaggleCredentials};
use once_cell::sync::Lazy;
use regex::Regex;

// `<owner>/<name>`, optionally followed by more path segments
static DATASET_PATH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^/]+)/([^/]+)(?:/.*)?$").unwrap());
static CONTENT_DISPOSITION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)filename\*?=(?:UTF-8'')?"?([^";]+)"?"#).unwrap());

/// A file is accepted when either its MIME type or its name says CSV.
pub fn is_csv_file(file: &DatasetFile) -> bool {
    file.mime.eq_ignore_ascii_case(CSV_MIME_TYPE)
        || file.name.to_ascii_lowercase().ends_with(CSV_EXTENSION)
}

pub fn validate_csv_file(file: &DatasetFile) -> Result<(), ValidationError> {
    if is_csv_file(file) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFileKind {
            file: file.name.clone(),
        })
    }
}

/// Trims both fields and rejects blanks.
pub fn validate_credentials(username: &str, key: &str) -> Result<KaggleCredentials, ValidationError> {
    let username = username.trim();
    let key = key.trim();
    if username.is_empty() || key.is_empty() {
        return Err(ValidationError::InvalidCredentials);
    }
    Ok(KaggleCredentials {
        username: username.to_string(),
        key: key.to_string(),
    })
}

/// Validates `<owner>/<name>[/...]` and returns the trimmed path and the
/// dataset name (the segment after the owner).
///
/// # Examples
/// ```
/// use dataset_recommender::utils::validate_dataset_path;
/// let (path, name) = validate_dataset_path(" grouplens/movielens ").unwrap();
/// assert_eq!(path, "grouplens/movielens");
/// assert_eq!(name, "movielens");
/// ```
pub fn validate_dataset_path(path: &str) -> Result<(String, String), ValidationError> {
    let trimmed = path.trim();
    match DATASET_PATH_REGEX.captures(trimmed) {
        Some(captures) => Ok((trimmed.to_string(), captures[2].to_string())),
        None => Err(ValidationError::InvalidDatasetPath(trimmed.to_string())),
    }
}

/// Extracts the file name from a `Content-Disposition` header value.
pub fn content_disposition_filename(header: &str) -> Option<String> {
    CONTENT_DISPOSITION_REGEX
        .captures(header)
        .map(|captures| captures[1].trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Generic numeric input validation
pub fn validate_numeric_input<T>(
    input: &str,
    min: Option<T>,
    max: Option<T>,
    field_name: &str,
) -> Result<T, String>
where
    T: std::str::FromStr + std::fmt::Display + PartialOrd,
{
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(format!("{} cannot be empty", field_name));
    }

    match trimmed.parse::<T>() {
        Ok(val) => {
            if let Some(min_val) = min {
                if val < min_val {
                    return Err(format!("{} must be at least {}", field_name, min_val));
                }
            }
            if let Some(max_val) = max {
                if val > max_val {
                    return Err(format!("{} cannot exceed {}", field_name, max_val));
                }
            }
            Ok(val)
        }
        Err(_) => Err(format!("{} must be a valid number", field_name)),
    }
}

/// Validate the "number of recommendations" input
pub fn validate_recommendation_count(input: &str) -> Result<usize, String> {
    validate_numeric_input(
        input,
        Some(MIN_RECOMMENDATIONS),
        Some(MAX_RECOMMENDATIONS),
        "Number of recommendations",
    )
}

/// Formats a similarity score for display, e.g. `0.8765` -> `87.65%`.
pub fn format_score(score: f64) -> String {
    format!("{:.2}%", score * 100.0)
}
