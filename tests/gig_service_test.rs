//! Gig service behaviour against the in-memory document store.
//!
//! Run with: `cargo test --test gig_service_test`
use serde_json::json;
use std::sync::Arc;

use gig_market_backend::ServiceError;
use gig_market_backend::auth::context::{LoggedInUser, RequestContext};
use gig_market_backend::db::MemoryStore;
use gig_market_backend::models::gigs::{Gig, GigFilter, GigOwner, OwnerFacets, SortDir, UpdateGig};
use gig_market_backend::models::messages::Msg;
use gig_market_backend::models::users::MiniUser;
use gig_market_backend::services::GigService;
use gig_market_backend::services::gigs::PAGE_SIZE;

fn service() -> GigService {
    GigService::new(Arc::new(MemoryStore::new()))
}

fn owner(id: &str, rate: f64, loc: &str, language: &str) -> GigOwner {
    GigOwner {
        id: id.to_string(),
        fullname: Some(format!("{id} fullname")),
        img_url: None,
        rate: Some(rate),
        loc: Some(loc.to_string()),
        language: Some(language.to_string()),
    }
}

fn gig(title: &str, price: f64, days: i32, tags: &[&str], owner: GigOwner) -> Gig {
    Gig {
        id: None,
        title: title.to_string(),
        price,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        days_to_make: days,
        owner,
        msgs: vec![],
        description: None,
        img_urls: vec![],
        created_at: None,
    }
}

async fn seed(service: &GigService) -> Vec<Gig> {
    let gigs = vec![
        gig("Logo Design", 40.0, 3, &["logo-design"], owner("u1", 4.0, "Israel", "Hebrew")),
        gig("Logo Animation", 90.0, 5, &["logo-design"], owner("u2", 5.0, "Israel", "English")),
        gig("Website Build", 400.0, 14, &["web"], owner("u1", 4.0, "Israel", "Hebrew")),
        gig("Cheap Logo", 15.0, 2, &["logo-design"], owner("u3", 3.0, "Germany", "German")),
    ];

    let mut added = Vec::new();
    for gig in gigs {
        added.push(service.add(gig).await.unwrap());
    }
    added
}

fn titles(gigs: &[Gig]) -> Vec<&str> {
    gigs.iter().map(|g| g.title.as_str()).collect()
}

#[tokio::test]
async fn add_assigns_id_and_created_at_is_derived_on_read() {
    let service = service();
    let added = service
        .add(gig("Logo Design", 40.0, 3, &[], owner("u1", 4.0, "Israel", "Hebrew")))
        .await
        .unwrap();

    let id = added.id.clone().expect("id assigned on insert");
    let fetched = service.get_by_id(&id).await.unwrap();

    assert_eq!(fetched.id.as_deref(), Some(id.as_str()));
    assert_eq!(fetched.title, "Logo Design");
    assert!(fetched.created_at.is_some());
}

#[tokio::test]
async fn empty_filter_returns_every_gig() {
    let service = service();
    seed(&service).await;

    let found = service.query(&GigFilter::default()).await.unwrap();
    assert_eq!(found.len(), 4);
}

#[tokio::test]
async fn combined_filter_applies_every_clause() {
    let service = service();
    seed(&service).await;

    let filter = GigFilter {
        title: Some("logo".into()),
        category: Some("logo-design".into()),
        budget: Some(100.0),
        days_to_make: Some(7.0),
        owner: OwnerFacets {
            rate: Some(vec!["4".into(), "5".into()]),
            loc: Some(vec!["Israel".into()]),
            language: None,
        },
        ..GigFilter::default()
    };

    let mut found = titles(&service.query(&filter).await.unwrap())
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    found.sort();
    assert_eq!(found, vec!["Logo Animation", "Logo Design"]);
}

#[tokio::test]
async fn title_is_matched_literally() {
    let service = service();
    seed(&service).await;

    let filter = GigFilter {
        title: Some("Logo.*".into()),
        ..GigFilter::default()
    };
    assert!(service.query(&filter).await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_facet_lists_add_no_constraint() {
    let service = service();
    seed(&service).await;

    let filter = GigFilter {
        owner: OwnerFacets {
            rate: Some(vec![]),
            loc: Some(vec![]),
            language: Some(vec![]),
        },
        ..GigFilter::default()
    };
    assert_eq!(service.query(&filter).await.unwrap().len(), 4);
}

#[tokio::test]
async fn non_numeric_rate_is_invalid_argument() {
    let service = service();
    let filter = GigFilter {
        owner: OwnerFacets {
            rate: Some(vec!["high".into()]),
            ..OwnerFacets::default()
        },
        ..GigFilter::default()
    };

    let err = service.query(&filter).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(_)));
}

#[tokio::test]
async fn sort_and_pages_of_three() {
    let service = service();
    seed(&service).await;

    let filter = GigFilter {
        sort_field: Some("price".into()),
        sort_dir: Some(SortDir::Desc),
        page_idx: Some(0),
        ..GigFilter::default()
    };
    let first = service.query(&filter).await.unwrap();
    assert_eq!(first.len() as u64, PAGE_SIZE);
    assert_eq!(titles(&first), vec!["Website Build", "Logo Animation", "Logo Design"]);

    let second = service
        .query(&GigFilter {
            page_idx: Some(1),
            ..filter.clone()
        })
        .await
        .unwrap();
    assert_eq!(titles(&second), vec!["Cheap Logo"]);

    let past_end = service
        .query(&GigFilter {
            page_idx: Some(5),
            ..filter
        })
        .await
        .unwrap();
    assert!(past_end.is_empty());
}

#[tokio::test]
async fn get_by_id_distinguishes_missing_from_malformed() {
    let service = service();

    let missing = service.get_by_id("507f1f77bcf86cd799439011").await.unwrap_err();
    assert!(matches!(missing, ServiceError::NotFound { .. }));

    let malformed = service.get_by_id("not-an-id").await.unwrap_err();
    assert!(matches!(malformed, ServiceError::InvalidArgument(_)));
}

#[tokio::test]
async fn update_persists_only_title_and_price() {
    let service = service();
    let added = seed(&service).await.remove(0);
    let id = added.id.clone().unwrap();

    let edited: UpdateGig = serde_json::from_value(json!({
        "_id": id.clone(),
        "title": "Premium Logo Design",
        "price": 55,
        "daysToMake": 1,
        "owner": { "id": "intruder" }
    }))
    .unwrap();

    let returned = service.update(edited.clone()).await.unwrap();
    assert_eq!(returned, edited);

    let stored = service.get_by_id(&id).await.unwrap();
    assert_eq!(stored.title, "Premium Logo Design");
    assert_eq!(stored.price, 55.0);
    assert_eq!(stored.days_to_make, added.days_to_make);
    assert_eq!(stored.owner, added.owner);
}

#[tokio::test]
async fn update_of_missing_gig_is_not_found() {
    let service = service();
    let ghost = UpdateGig {
        id: Some("507f1f77bcf86cd799439011".into()),
        title: "Ghost".into(),
        price: 1.0,
        other: serde_json::Map::new(),
    };

    let err = service.update(ghost).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

#[tokio::test]
async fn huge_page_index_is_invalid_argument() {
    let service = service();
    seed(&service).await;

    let filter = GigFilter {
        page_idx: Some(6_148_914_691_236_517_206),
        ..GigFilter::default()
    };
    let err = service.query(&filter).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(_)));
}

#[tokio::test]
async fn non_owner_cannot_remove_gig() {
    let service = service();
    let added = seed(&service).await.remove(0);
    let id = added.id.unwrap();

    let stranger = LoggedInUser::new("u2");
    let err = RequestContext::scope(Some(stranger), service.remove(&id))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
    assert_eq!(service.query(&GigFilter::default()).await.unwrap().len(), 4);
}

#[tokio::test]
async fn owner_and_admin_can_remove_gigs() {
    let service = service();
    let seeded = seed(&service).await;
    let own_id = seeded[0].id.clone().unwrap();
    let other_id = seeded[1].id.clone().unwrap();

    let removed = RequestContext::scope(Some(LoggedInUser::new("u1")), service.remove(&own_id))
        .await
        .unwrap();
    assert_eq!(removed, own_id);

    let removed = RequestContext::scope(Some(LoggedInUser::admin("boss")), service.remove(&other_id))
        .await
        .unwrap();
    assert_eq!(removed, other_id);

    assert_eq!(service.query(&GigFilter::default()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn remove_without_user_is_unauthenticated() {
    let service = service();
    let id = seed(&service).await.remove(0).id.unwrap();

    let err = service.remove(&id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Unauthenticated));
}

#[tokio::test]
async fn msgs_are_added_with_ids_and_removed_idempotently() {
    let service = service();
    let id = seed(&service).await.remove(0).id.unwrap();

    let saved = service
        .add_gig_msg(&id, Msg::new("Is a vector file included?", Some(MiniUser::new("u2"))))
        .await
        .unwrap();
    let msg_id = saved.id.clone().expect("msg id assigned");

    let stored = service.get_by_id(&id).await.unwrap();
    assert_eq!(stored.msgs, vec![saved]);

    assert_eq!(service.remove_gig_msg(&id, &msg_id).await.unwrap(), msg_id);
    assert!(service.get_by_id(&id).await.unwrap().msgs.is_empty());

    // Removing it again still succeeds.
    assert_eq!(service.remove_gig_msg(&id, &msg_id).await.unwrap(), msg_id);
}

#[tokio::test]
async fn msg_on_missing_gig_is_not_found() {
    let service = service();
    let err = service
        .add_gig_msg("507f1f77bcf86cd799439011", Msg::new("hello", None))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}
