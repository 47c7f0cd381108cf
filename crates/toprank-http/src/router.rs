//! Toprank request router.
//!
//! Routes are path-based and read-only:
//!
//! ```text
//! GET /countries
//! GET /global/{page}
//! GET /{countryCode}/{page}
//! GET /health
//! ```
//!
//! A known path with any other method is `405`; anything else is `404`.

use toprank_model::{TopRankError, TopRankOperation};

/// Resolve a Toprank operation from the request method and path.
pub fn resolve_operation(
    method: &http::Method,
    path: &str,
) -> Result<TopRankOperation, TopRankError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let op = match segments.as_slice() {
        ["health"] => TopRankOperation::Health,
        ["countries"] => TopRankOperation::ListCountries,
        ["global", page] => TopRankOperation::GlobalSites {
            page: parse_page(page)?,
        },
        [country_code, page] => TopRankOperation::CountrySites {
            country_code: parse_country_code(country_code)?,
            page: parse_page(page)?,
        },
        _ => return Err(TopRankError::not_found(path)),
    };

    if method != http::Method::GET {
        return Err(TopRankError::method_not_allowed(method.as_str()));
    }
    Ok(op)
}

/// Parse a 1-based page number.
fn parse_page(raw: &str) -> Result<u32, TopRankError> {
    match raw.parse::<u32>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => Err(TopRankError::validation(format!(
            "invalid page '{raw}': expected an integer >= 1"
        ))),
    }
}

/// Validate a two-letter country code and lower-case it.
fn parse_country_code(raw: &str) -> Result<String, TopRankError> {
    if raw.len() == 2 && raw.bytes().all(|b| b.is_ascii_alphabetic()) {
        Ok(raw.to_ascii_lowercase())
    } else {
        Err(TopRankError::validation(format!(
            "invalid country code '{raw}': expected two ASCII letters"
        )))
    }
}

#[cfg(test)]
mod tests {
    use toprank_model::TopRankErrorCode;

    use super::*;

    fn get(path: &str) -> Result<TopRankOperation, TopRankError> {
        resolve_operation(&http::Method::GET, path)
    }

    #[test]
    fn test_should_resolve_countries_and_health() {
        assert_eq!(get("/countries").unwrap(), TopRankOperation::ListCountries);
        assert_eq!(get("/health").unwrap(), TopRankOperation::Health);
        assert_eq!(get("/countries/").unwrap(), TopRankOperation::ListCountries);
    }

    #[test]
    fn test_should_resolve_global_page() {
        assert_eq!(
            get("/global/3").unwrap(),
            TopRankOperation::GlobalSites { page: 3 }
        );
    }

    #[test]
    fn test_should_lower_case_country_code() {
        assert_eq!(
            get("/FR/1").unwrap(),
            TopRankOperation::CountrySites {
                country_code: "fr".to_owned(),
                page: 1,
            }
        );
    }

    #[test]
    fn test_should_reject_invalid_page() {
        for path in ["/global/0", "/global/abc", "/us/-1", "/us/1.5"] {
            let err = get(path).unwrap_err();
            assert_eq!(err.code, TopRankErrorCode::ValidationError, "{path}");
        }
    }

    #[test]
    fn test_should_reject_invalid_country_code() {
        let err = get("/usa/1").unwrap_err();
        assert_eq!(err.code, TopRankErrorCode::ValidationError);
    }

    #[test]
    fn test_should_return_not_found_for_unknown_paths() {
        for path in ["/", "/global", "/a/b/c", "/countries/1/2"] {
            let err = get(path).unwrap_err();
            assert_eq!(err.code, TopRankErrorCode::NotFound, "{path}");
        }
    }

    #[test]
    fn test_should_reject_non_get_methods_on_known_routes() {
        let err = resolve_operation(&http::Method::POST, "/countries").unwrap_err();
        assert_eq!(err.code, TopRankErrorCode::MethodNotAllowed);
        assert_eq!(err.status_code, http::StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_should_prefer_not_found_over_method_not_allowed() {
        let err = resolve_operation(&http::Method::DELETE, "/nope/nope/nope").unwrap_err();
        assert_eq!(err.code, TopRankErrorCode::NotFound);
    }
}
