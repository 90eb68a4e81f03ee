use super::ApiError;

pub fn validate_id(kind: &str, id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {kind} ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

pub fn validate_tmdb_id(id: i64) -> Result<i64, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid TMDb ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

pub fn validate_limit(limit: usize) -> Result<usize, ApiError> {
    const MAX_LIMIT: usize = 1000;
    const MIN_LIMIT: usize = 1;

    if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {limit}. Limit must be between {MIN_LIMIT} and {MAX_LIMIT}"
        )));
    }
    Ok(limit)
}

pub fn validate_search_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Search query cannot be empty"));
    }
    if trimmed.chars().count() > 200 {
        return Err(ApiError::validation(
            "Search query must be 200 characters or less",
        ));
    }
    Ok(trimmed)
}

/// `None` and blank strings mean "both kinds".
pub fn parse_kind_filter(raw: Option<&str>) -> Result<Option<crate::domain::MediaKind>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|e: crate::domain::ParseEnumError| ApiError::validation(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MediaKind;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("list", 1).is_ok());
        assert!(validate_id("media", 12345).is_ok());
        assert!(validate_id("media", 0).is_err());
        assert!(validate_id("list", -1).is_err());
        assert!(validate_tmdb_id(0).is_err());
        assert!(validate_tmdb_id(603).is_ok());
    }

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(1).is_ok());
        assert!(validate_limit(1000).is_ok());
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(1001).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  Arrival  ").unwrap(), "Arrival");
        assert!(validate_search_query("").is_err());
        assert!(validate_search_query("   ").is_err());
        assert!(validate_search_query(&"q".repeat(201)).is_err());
    }

    #[test]
    fn test_parse_kind_filter() {
        assert_eq!(parse_kind_filter(None).unwrap(), None);
        assert_eq!(parse_kind_filter(Some(" ")).unwrap(), None);
        assert_eq!(parse_kind_filter(Some("tv")).unwrap(), Some(MediaKind::TvShow));
        assert!(parse_kind_filter(Some("anime")).is_err());
    }
}
