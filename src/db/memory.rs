//! Process-local document store.
//!
//! Evaluates the subset of MongoDB query and update syntax the services
//! emit: equality, `$regex`/`$options`, `$lt`/`$lte`/`$gt`/`$gte`, `$in`,
//! `$ne`, `$or`/`$and`, and the `$set`/`$push`/`$pull` update operators.
//! Dotted paths and array fields match the way MongoDB does.

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use regex::RegexBuilder;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

use super::{Collection, DbError, DocumentStore, FindOptions, UpdateOutcome};

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Arc<MemoryCollection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn collection(&self, name: &str) -> Arc<dyn Collection> {
        let mut collections = self
            .collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        collections
            .entry(name.to_string())
            .or_default()
            .clone()
    }
}

#[derive(Default)]
pub struct MemoryCollection {
    docs: RwLock<Vec<Document>>,
}

#[async_trait]
impl Collection for MemoryCollection {
    async fn find(&self, filter: Document, options: FindOptions) -> Result<Vec<Document>, DbError> {
        let docs = self.docs.read().await;
        let mut found = Vec::new();
        for doc in docs.iter() {
            if matches(doc, &filter)? {
                found.push(doc.clone());
            }
        }

        if let Some(sort) = &options.sort {
            found.sort_by(|a, b| compare_by_sort(a, b, sort));
        }

        let skip = options.skip.unwrap_or(0) as usize;
        let found = found.into_iter().skip(skip);
        Ok(match options.limit {
            Some(limit) if limit > 0 => found.take(limit as usize).collect(),
            _ => found.collect(),
        })
    }

    async fn find_one(&self, filter: Document) -> Result<Option<Document>, DbError> {
        let docs = self.docs.read().await;
        for doc in docs.iter() {
            if matches(doc, &filter)? {
                return Ok(Some(doc.clone()));
            }
        }
        Ok(None)
    }

    async fn insert_one(&self, mut doc: Document) -> Result<Bson, DbError> {
        let mut docs = self.docs.write().await;
        let id = match doc.get("_id") {
            Some(id) => {
                if docs.iter().any(|existing| existing.get("_id") == Some(id)) {
                    return Err(DbError::DuplicateKey(id.to_string()));
                }
                id.clone()
            }
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                doc.insert("_id", id.clone());
                id
            }
        };
        docs.push(doc);
        Ok(id)
    }

    async fn update_one(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<UpdateOutcome, DbError> {
        let mut docs = self.docs.write().await;
        for doc in docs.iter_mut() {
            if matches(doc, &filter)? {
                let before = doc.clone();
                apply_update(doc, &update)?;
                return Ok(UpdateOutcome {
                    matched: 1,
                    modified: u64::from(*doc != before),
                });
            }
        }
        Ok(UpdateOutcome {
            matched: 0,
            modified: 0,
        })
    }

    async fn delete_one(&self, filter: Document) -> Result<u64, DbError> {
        let mut docs = self.docs.write().await;
        let mut position = None;
        for (idx, doc) in docs.iter().enumerate() {
            if matches(doc, &filter)? {
                position = Some(idx);
                break;
            }
        }
        Ok(match position {
            Some(idx) => {
                docs.remove(idx);
                1
            }
            None => 0,
        })
    }
}

// ── Query evaluation ──

pub(crate) fn matches(doc: &Document, filter: &Document) -> Result<bool, DbError> {
    for (key, condition) in filter {
        let satisfied = match key.as_str() {
            "$or" => any_branch(doc, condition, key)?,
            "$and" => all_branches(doc, condition, key)?,
            op if op.starts_with('$') => {
                return Err(DbError::UnsupportedOperator(op.to_string()));
            }
            path => {
                let mut candidates = Vec::new();
                lookup(doc, &path.split('.').collect::<Vec<_>>(), &mut candidates);
                field_matches(&candidates, condition)?
            }
        };
        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

fn branches<'a>(condition: &'a Bson, op: &str) -> Result<Vec<&'a Document>, DbError> {
    match condition {
        Bson::Array(items) => items
            .iter()
            .map(|item| match item {
                Bson::Document(branch) => Ok(branch),
                _ => Err(DbError::InvalidQuery(format!("{op} expects documents"))),
            })
            .collect(),
        _ => Err(DbError::InvalidQuery(format!("{op} expects an array"))),
    }
}

fn any_branch(doc: &Document, condition: &Bson, op: &str) -> Result<bool, DbError> {
    for branch in branches(condition, op)? {
        if matches(doc, branch)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn all_branches(doc: &Document, condition: &Bson, op: &str) -> Result<bool, DbError> {
    for branch in branches(condition, op)? {
        if !matches(doc, branch)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Collect every value reachable through `path`, descending into arrays.
/// An array at the end of the path contributes both itself and its elements.
fn lookup<'a>(doc: &'a Document, path: &[&str], out: &mut Vec<&'a Bson>) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };
    if let Some(value) = doc.get(*head) {
        descend(value, rest, out);
    }
}

fn descend<'a>(value: &'a Bson, rest: &[&str], out: &mut Vec<&'a Bson>) {
    if rest.is_empty() {
        if let Bson::Array(items) = value {
            out.extend(items.iter());
        }
        out.push(value);
        return;
    }
    match value {
        Bson::Document(inner) => lookup(inner, rest, out),
        Bson::Array(items) => {
            for item in items {
                if let Bson::Document(inner) = item {
                    lookup(inner, rest, out);
                }
            }
        }
        _ => {}
    }
}

fn is_operator_doc(condition: &Bson) -> bool {
    match condition {
        Bson::Document(inner) => inner.keys().next().is_some_and(|k| k.starts_with('$')),
        _ => false,
    }
}

fn field_matches(candidates: &[&Bson], condition: &Bson) -> Result<bool, DbError> {
    let Bson::Document(ops) = condition else {
        return Ok(equals_any(candidates, condition));
    };
    if !is_operator_doc(condition) {
        return Ok(equals_any(candidates, condition));
    }

    for (op, operand) in ops {
        let satisfied = match op.as_str() {
            "$eq" => equals_any(candidates, operand),
            "$ne" => !equals_any(candidates, operand),
            "$in" => match operand {
                Bson::Array(set) => set.iter().any(|value| equals_any(candidates, value)),
                _ => return Err(DbError::InvalidQuery("$in expects an array".to_string())),
            },
            "$lt" => compares(candidates, operand, |o| o == Ordering::Less),
            "$lte" => compares(candidates, operand, |o| o != Ordering::Greater),
            "$gt" => compares(candidates, operand, |o| o == Ordering::Greater),
            "$gte" => compares(candidates, operand, |o| o != Ordering::Less),
            "$regex" => regex_matches(candidates, operand, ops.get_str("$options").ok())?,
            "$options" => true,
            other => return Err(DbError::UnsupportedOperator(other.to_string())),
        };
        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

fn equals_any(candidates: &[&Bson], expected: &Bson) -> bool {
    if candidates.is_empty() {
        return matches!(expected, Bson::Null);
    }
    candidates.iter().any(|value| values_equal(value, expected))
}

fn compares(candidates: &[&Bson], operand: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    candidates
        .iter()
        .any(|value| compare_values(value, operand).is_some_and(&accept))
}

fn regex_matches(
    candidates: &[&Bson],
    pattern: &Bson,
    options: Option<&str>,
) -> Result<bool, DbError> {
    let (pattern, options) = match pattern {
        Bson::String(p) => (p.as_str(), options.unwrap_or("")),
        Bson::RegularExpression(re) => (re.pattern.as_str(), re.options.as_str()),
        _ => return Err(DbError::InvalidQuery("$regex expects a string".to_string())),
    };
    let regex = RegexBuilder::new(pattern)
        .case_insensitive(options.contains('i'))
        .multi_line(options.contains('m'))
        .dot_matches_new_line(options.contains('s'))
        .build()
        .map_err(|e| DbError::InvalidQuery(e.to_string()))?;

    Ok(candidates.iter().any(|value| match value {
        Bson::String(s) => regex.is_match(s),
        _ => false,
    }))
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare_values(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.bytes().cmp(&y.bytes())),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn compare_by_sort(a: &Document, b: &Document, sort: &Document) -> Ordering {
    for (path, direction) in sort {
        let path: Vec<&str> = path.split('.').collect();
        let (mut left, mut right) = (Vec::new(), Vec::new());
        lookup(a, &path, &mut left);
        lookup(b, &path, &mut right);

        // Missing values sort first, as in MongoDB.
        let ordering = match (left.last(), right.last()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
        };
        let ordering = if as_number(direction).is_some_and(|d| d < 0.0) {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

// ── Update evaluation ──

fn apply_update(doc: &mut Document, update: &Document) -> Result<(), DbError> {
    for (op, fields) in update {
        let Bson::Document(fields) = fields else {
            return Err(DbError::InvalidQuery(format!("{op} expects a document")));
        };
        for (path, value) in fields {
            match op.as_str() {
                "$set" => set_path(doc, path, value.clone()),
                "$push" => push_path(doc, path, value.clone())?,
                "$pull" => pull_path(doc, path, value)?,
                other => return Err(DbError::UnsupportedOperator(other.to_string())),
            }
        }
    }
    Ok(())
}

fn set_path(doc: &mut Document, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            doc.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(doc.get(head), Some(Bson::Document(_))) {
                doc.insert(head, Document::new());
            }
            if let Some(Bson::Document(inner)) = doc.get_mut(head) {
                set_path(inner, rest, value);
            }
        }
    }
}

fn push_path(doc: &mut Document, field: &str, value: Bson) -> Result<(), DbError> {
    match doc.get_mut(field) {
        Some(Bson::Array(items)) => items.push(value),
        Some(_) => {
            return Err(DbError::InvalidQuery(format!(
                "$push target '{field}' is not an array"
            )));
        }
        None => {
            doc.insert(field, vec![value]);
        }
    }
    Ok(())
}

fn pull_path(doc: &mut Document, field: &str, condition: &Bson) -> Result<(), DbError> {
    let Some(Bson::Array(items)) = doc.get_mut(field) else {
        return Ok(());
    };

    let mut kept = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        let remove = match (condition, &item) {
            (Bson::Document(criteria), Bson::Document(element))
                if !is_operator_doc(condition) =>
            {
                matches(element, criteria)?
            }
            _ => field_matches(&[&item], condition)?,
        };
        if !remove {
            kept.push(item);
        }
    }
    *items = kept;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    fn gig(title: &str, price: i32, tags: &[&str]) -> Document {
        doc! {
            "title": title,
            "price": price,
            "tags": tags.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
            "owner": { "_id": "u1", "rate": 4.0, "loc": "US" },
        }
    }

    #[test]
    fn regex_honours_case_insensitive_option() {
        let doc = gig("Logo Design", 10, &["design"]);
        assert!(matches(&doc, &doc! { "title": { "$regex": "logo", "$options": "i" } }).unwrap());
        assert!(!matches(&doc, &doc! { "title": { "$regex": "logo" } }).unwrap());
    }

    #[test]
    fn regex_on_array_matches_any_element() {
        let doc = gig("x", 10, &["web-design", "logo"]);
        assert!(matches(&doc, &doc! { "tags": { "$regex": "design" } }).unwrap());
        assert!(!matches(&doc, &doc! { "tags": { "$regex": "video" } }).unwrap());
    }

    #[test]
    fn comparisons_mix_numeric_types() {
        let doc = gig("x", 10, &[]);
        assert!(matches(&doc, &doc! { "price": { "$lt": 10.5 } }).unwrap());
        assert!(!matches(&doc, &doc! { "price": { "$lt": 10_i64 } }).unwrap());
        assert!(matches(&doc, &doc! { "owner.rate": { "$in": [3, 4] } }).unwrap());
    }

    #[test]
    fn missing_field_fails_operator_clauses() {
        let doc = doc! { "title": "x" };
        assert!(!matches(&doc, &doc! { "price": { "$lt": 100 } }).unwrap());
        assert!(matches(&doc, &doc! { "price": { "$ne": 5 } }).unwrap());
    }

    #[test]
    fn or_matches_any_branch() {
        let doc = doc! { "buyer": { "_id": "a" }, "seller": { "_id": "b" } };
        let filter = doc! { "$or": [ { "buyer._id": "z" }, { "seller._id": "b" } ] };
        assert!(matches(&doc, &filter).unwrap());
    }

    #[test]
    fn unknown_operator_is_an_error() {
        let doc = gig("x", 1, &[]);
        let err = matches(&doc, &doc! { "price": { "$where": "1" } }).unwrap_err();
        assert!(matches!(err, DbError::UnsupportedOperator(_)));
    }

    #[test]
    fn push_then_pull_restores_the_array() {
        let mut doc = doc! { "msgs": [ { "id": "a", "txt": "hi" } ] };
        let original = doc.clone();

        apply_update(&mut doc, &doc! { "$push": { "msgs": { "id": "b", "txt": "yo" } } }).unwrap();
        assert_eq!(doc.get_array("msgs").unwrap().len(), 2);

        apply_update(&mut doc, &doc! { "$pull": { "msgs": { "id": "b" } } }).unwrap();
        assert_eq!(doc, original);
    }

    #[test]
    fn set_creates_nested_documents() {
        let mut doc = doc! { "title": "old" };
        apply_update(&mut doc, &doc! { "$set": { "title": "new", "owner.rate": 5 } }).unwrap();
        assert_eq!(doc, doc! { "title": "new", "owner": { "rate": 5 } });
    }

    #[tokio::test]
    async fn find_sorts_and_pages() {
        let store = MemoryStore::new();
        let gigs = store.collection("gig");
        for price in [30, 10, 20, 40] {
            gigs.insert_one(gig("g", price, &[])).await.unwrap();
        }

        let options = FindOptions::sorted(doc! { "price": -1 }).page(1, 3).unwrap();
        let found = gigs.find(doc! {}, options).await.unwrap();
        let prices: Vec<i32> = found.iter().map(|d| d.get_i32("price").unwrap()).collect();
        assert_eq!(prices, vec![10]);

        let found = gigs
            .find(doc! {}, FindOptions::sorted(doc! { "price": 1 }))
            .await
            .unwrap();
        let prices: Vec<i32> = found.iter().map(|d| d.get_i32("price").unwrap()).collect();
        assert_eq!(prices, vec![10, 20, 30, 40]);
    }

    #[tokio::test]
    async fn collections_are_shared_by_name() {
        let store = MemoryStore::new();
        store.collection("order").insert_one(doc! { "n": 1 }).await.unwrap();

        let found = store.collection("order").find_one(doc! { "n": 1 }).await.unwrap();
        assert!(found.is_some());
        assert!(store.collection("gig").find_one(doc! {}).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_rejects_an_existing_id() {
        let store = MemoryStore::new();
        let gigs = store.collection("gig");
        let id = gigs.insert_one(doc! { "title": "first" }).await.unwrap();

        let err = gigs
            .insert_one(doc! { "_id": id.clone(), "title": "second" })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateKey(_)));

        let found = gigs.find(doc! {}, FindOptions::default()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get_str("title").unwrap(), "first");
    }

    #[tokio::test]
    async fn delete_one_reports_count() {
        let store = MemoryStore::new();
        let orders = store.collection("order");
        orders.insert_one(doc! { "n": 1 }).await.unwrap();

        assert_eq!(orders.delete_one(doc! { "n": 2 }).await.unwrap(), 0);
        assert_eq!(orders.delete_one(doc! { "n": 1 }).await.unwrap(), 1);
    }
}
