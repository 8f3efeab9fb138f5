//! Tag and category extraction from an item's `<category>` records.
//!
//! WordPress stores both taxonomies in the same element and tells them apart
//! by the `domain` attribute. Only `post_tag` and `category` are accepted;
//! anything else aborts the export instead of silently losing terms.

use crate::model::CategoryRecord;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum TaxonomyError {
    #[error("Unknown taxonomy domain: {domain}")]
    UnknownTaxonomyDomain { domain: String },
}

/// Term titles of an item, in document order. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Taxonomies {
    pub tags: Vec<String>,
    pub categories: Vec<String>,
}

pub fn resolve(records: &[CategoryRecord]) -> Result<Taxonomies, TaxonomyError> {
    let mut result = Taxonomies::default();
    for record in records {
        match record.domain.as_str() {
            "post_tag" => result.tags.push(record.title.clone()),
            "category" => result.categories.push(record.title.clone()),
            other => {
                return Err(TaxonomyError::UnknownTaxonomyDomain {
                    domain: other.to_string(),
                });
            }
        }
    }
    Ok(result)
}
