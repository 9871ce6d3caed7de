//! Translation of a [`GigFilter`] into MongoDB criteria and sort documents.

use mongodb::bson::{Bson, Document, doc};

use crate::error::ServiceError;
use crate::models::gigs::GigFilter;

/// Build the conjunctive criteria for a gig search.
///
/// Base clauses (title, category, budget, days to make) are added for each
/// field that is present; owner facets only when their list is non-empty.
pub fn build_criteria(filter: &GigFilter) -> Result<Document, ServiceError> {
    let mut criteria = Document::new();

    if let Some(title) = &filter.title {
        criteria.insert(
            "title",
            doc! { "$regex": regex::escape(title), "$options": "i" },
        );
    }
    if let Some(category) = &filter.category {
        criteria.insert("tags", doc! { "$regex": regex::escape(category) });
    }
    if let Some(budget) = filter.budget {
        criteria.insert("price", doc! { "$lt": budget });
    }
    if let Some(days) = filter.days_to_make {
        criteria.insert("daysToMake", doc! { "$lt": days });
    }

    if let Some(rates) = non_empty(&filter.owner.rate) {
        let rates = rates
            .iter()
            .map(|rate| {
                rate.trim().parse::<f64>().map(Bson::Double).map_err(|_| {
                    ServiceError::InvalidArgument(format!("Rate '{rate}' is not a number"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        criteria.insert("owner.rate", doc! { "$in": rates });
    }
    if let Some(locs) = non_empty(&filter.owner.loc) {
        criteria.insert("owner.loc", doc! { "$in": locs.to_vec() });
    }
    if let Some(languages) = non_empty(&filter.owner.language) {
        criteria.insert("owner.language", doc! { "$in": languages.to_vec() });
    }

    Ok(criteria)
}

/// Single-key sort on `sortField`, or an empty document when none is given.
pub fn build_sort(filter: &GigFilter) -> Document {
    let mut sort = Document::new();
    if let Some(field) = &filter.sort_field {
        let dir = filter.sort_dir.unwrap_or_default();
        sort.insert(field.as_str(), dir.as_i32());
    }
    sort
}

fn non_empty(values: &Option<Vec<String>>) -> Option<&[String]> {
    values.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gigs::{OwnerFacets, SortDir};

    fn base_filter() -> GigFilter {
        GigFilter {
            title: Some(String::new()),
            category: Some(String::new()),
            budget: Some(1000.0),
            days_to_make: Some(30.0),
            ..GigFilter::default()
        }
    }

    #[test]
    fn base_fields_produce_exactly_four_clauses() {
        let criteria = build_criteria(&base_filter()).unwrap();

        let keys: Vec<&str> = criteria.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["title", "tags", "price", "daysToMake"]);
        assert_eq!(
            criteria.get_document("title").unwrap(),
            &doc! { "$regex": "", "$options": "i" }
        );
        assert_eq!(criteria.get_document("price").unwrap(), &doc! { "$lt": 1000.0 });
    }

    #[test]
    fn empty_facet_lists_add_no_clauses() {
        let filter = GigFilter {
            owner: OwnerFacets {
                rate: Some(vec![]),
                loc: Some(vec![]),
                language: None,
            },
            ..base_filter()
        };

        let criteria = build_criteria(&filter).unwrap();
        assert_eq!(criteria.len(), 4);
    }

    #[test]
    fn absent_fields_add_no_constraint() {
        let criteria = build_criteria(&GigFilter::default()).unwrap();
        assert!(criteria.is_empty());
    }

    #[test]
    fn rates_are_coerced_to_numbers() {
        let filter = GigFilter {
            owner: OwnerFacets {
                rate: Some(vec!["5".into(), "3.5".into(), "4".into()]),
                ..OwnerFacets::default()
            },
            ..base_filter()
        };

        let criteria = build_criteria(&filter).unwrap();
        let clause = criteria.get_document("owner.rate").unwrap();
        let mut rates: Vec<f64> = clause
            .get_array("$in")
            .unwrap()
            .iter()
            .filter_map(Bson::as_f64)
            .collect();
        rates.sort_by(f64::total_cmp);
        assert_eq!(rates, vec![3.5, 4.0, 5.0]);
    }

    #[test]
    fn non_numeric_rate_is_rejected() {
        let filter = GigFilter {
            owner: OwnerFacets {
                rate: Some(vec!["five".into()]),
                ..OwnerFacets::default()
            },
            ..GigFilter::default()
        };

        let err = build_criteria(&filter).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }

    #[test]
    fn location_and_language_facets_use_in() {
        let filter = GigFilter {
            owner: OwnerFacets {
                loc: Some(vec!["US".into(), "DE".into()]),
                language: Some(vec!["English".into()]),
                ..OwnerFacets::default()
            },
            ..GigFilter::default()
        };

        let criteria = build_criteria(&filter).unwrap();
        assert_eq!(
            criteria.get_document("owner.loc").unwrap(),
            &doc! { "$in": ["US", "DE"] }
        );
        assert_eq!(
            criteria.get_document("owner.language").unwrap(),
            &doc! { "$in": ["English"] }
        );
    }

    #[test]
    fn user_input_is_matched_literally() {
        let filter = GigFilter {
            title: Some("c++ (pro)".into()),
            ..GigFilter::default()
        };

        let criteria = build_criteria(&filter).unwrap();
        assert_eq!(
            criteria.get_document("title").unwrap().get_str("$regex").unwrap(),
            r"c\+\+ \(pro\)"
        );
    }

    #[test]
    fn sort_is_empty_without_field() {
        assert!(build_sort(&GigFilter::default()).is_empty());
    }

    #[test]
    fn sort_uses_single_key_and_direction() {
        let filter = GigFilter {
            sort_field: Some("price".into()),
            sort_dir: Some(SortDir::Desc),
            ..GigFilter::default()
        };
        assert_eq!(build_sort(&filter), doc! { "price": -1 });

        let filter = GigFilter {
            sort_field: Some("title".into()),
            ..GigFilter::default()
        };
        assert_eq!(build_sort(&filter), doc! { "title": 1 });
    }
}
