//! Query-string parameters shared by list endpoints

use serde::Deserialize;

use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};

/// `?skip=&limit=`
///
/// Signed so that negative values reach validation instead of failing
/// deserialization.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn resolve(&self, config: &CatalogConfig) -> Result<(usize, usize)> {
        let skip = match self.skip {
            None => 0,
            Some(skip) => usize::try_from(skip).map_err(|_| {
                CatalogError::validation(format!("skip must be >= 0, got {}", skip))
            })?,
        };
        Ok((skip, resolve_limit(self.limit, config)?))
    }
}

/// `limit` defaults to `default_page_size` and must lie in 1..=`max_page_size`
pub fn resolve_limit(limit: Option<i64>, config: &CatalogConfig) -> Result<usize> {
    let Some(limit) = limit else {
        return Ok(config.default_page_size);
    };
    match usize::try_from(limit) {
        Ok(limit) if (1..=config.max_page_size).contains(&limit) => Ok(limit),
        _ => Err(CatalogError::validation(format!(
            "limit must be between 1 and {}, got {}",
            config.max_page_size, limit
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::default();
        assert_eq!(PageParams::default().resolve(&config).unwrap(), (0, 50));
    }

    #[test]
    fn test_bounds() {
        let config = CatalogConfig::default();
        let page = |skip, limit| PageParams { skip, limit }.resolve(&config);

        assert_eq!(page(Some(10), Some(200)).unwrap(), (10, 200));
        assert!(page(Some(-1), None).is_err());
        assert!(page(None, Some(0)).is_err());
        assert!(page(None, Some(201)).is_err());
        assert!(page(None, Some(-5)).is_err());
    }
}
