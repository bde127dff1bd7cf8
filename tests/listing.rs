use livethreads::api::listing::{comment_listing_from_thread_payload, things_from_morechildren, CommentForest, Thing};
use livethreads::api::{ApiError, Comment};
use serde_json::{json, Value};

fn t1(id: &str, parent: &str, depth: i64, replies: Value) -> Value {
    json!({
        "kind": "t1",
        "data": {
            "id": id, "author": format!("user_{id}"), "body": format!("body {id}"),
            "edited": false, "created_utc": 1645671600.0, "link_id": "t3_th",
            "parent_id": parent, "distinguished": null, "depth": depth,
            "ups": 3, "downs": 0, "score": 3, "total_awards_received": 0,
            "gilded": 0, "gildings": {}, "replies": replies
        }
    })
}

fn listing(children: Vec<Value>) -> Value {
    json!({ "kind": "Listing", "data": { "after": null, "children": children } })
}

fn more(parent: &str, children: &[&str]) -> Value {
    json!({ "kind": "more", "data": { "id": "m", "parent_id": parent, "count": children.len(), "children": children } })
}

fn thread_payload(comments: Vec<Value>) -> Value {
    json!([
        listing(vec![json!({ "kind": "t3", "data": { "id": "th", "name": "t3_th", "title": "live", "created_utc": 1.0 } })]),
        listing(comments)
    ])
}

fn ids_depths(list: &[Comment], out: &mut Vec<(String, i64)>) {
    for c in list {
        out.push((c.id.clone(), c.depth));
    }
    for c in list {
        ids_depths(&c.replies, out);
    }
}

#[test]
fn parses_nested_thread_payload() {
    let payload = thread_payload(vec![
        t1("a", "t3_th", 0, listing(vec![t1("a1", "t1_a", 1, json!(""))])),
        t1("b", "t3_th", 0, json!("")),
    ]);
    let forest = CommentForest::from_listing(comment_listing_from_thread_payload(payload).unwrap()).unwrap();
    assert_eq!(forest.len(), 3);
    assert_eq!(forest.pending(), 0);

    let roots = forest.into_comments();
    assert_eq!(roots.len(), 2);
    assert_eq!(roots[0].id, "a");
    assert_eq!(roots[0].replies[0].id, "a1");
    assert_eq!(roots[0].edited, None);
    assert_eq!(roots[1].replies.len(), 0);
}

#[test]
fn deleted_author_and_edit_time() {
    let mut c = t1("d", "t3_th", 0, json!(""));
    c["data"]["author"] = json!("[deleted]");
    c["data"]["edited"] = json!(1645671999.0);
    let forest = CommentForest::from_listing(comment_listing_from_thread_payload(thread_payload(vec![c])).unwrap()).unwrap();
    let roots = forest.into_comments();
    assert_eq!(roots[0].author, None);
    assert_eq!(roots[0].edited, Some(1645671999.0));
}

/// "Load more" and "continue this thread" placeholders are resolved until none
/// remain, and the results are hung under the right parents.
#[test]
fn expands_every_placeholder() {
    let payload = thread_payload(vec![
        t1("a", "t3_th", 0, listing(vec![t1("a1", "t1_a", 1, listing(vec![more("t1_a1", &[])]))])),
        more("t3_th", &["b", "c"]),
    ]);
    let mut forest = CommentForest::from_listing(comment_listing_from_thread_payload(payload).unwrap()).unwrap();
    assert_eq!(forest.pending(), 2);

    let mut calls = Vec::new();
    forest
        .expand(|req| {
            calls.push(req.clone());
            let things: Value = if req.is_continue_thread() {
                assert_eq!(req.parent_id, "t1_a1");
                // Focused payloads restart depth at zero.
                json!([t1("deep", "t1_a1", 0, json!(""))])
            } else {
                json!([t1("b", "t3_th", 0, json!("")), t1("c", "t3_th", 0, json!("")), more("t1_c", &["c1"])])
            };
            Ok(serde_json::from_value::<Vec<Thing>>(things)?)
        })
        .unwrap_or_else(|e| panic!("{e}"));

    // more(children=[c1]) is the third request
    assert_eq!(calls.len(), 2 + 1);
    assert_eq!(forest.pending(), 0);
}

#[test]
fn depth_comes_from_tree_position() {
    let payload = thread_payload(vec![t1("a", "t3_th", 0, listing(vec![more("t1_a", &[])]))]);
    let mut forest = CommentForest::from_listing(comment_listing_from_thread_payload(payload).unwrap()).unwrap();
    forest
        .expand(|_| {
            let things = json!([t1("x", "t1_a", 0, listing(vec![t1("y", "t1_x", 1, json!(""))]))]);
            Ok(serde_json::from_value::<Vec<Thing>>(things)?)
        })
        .unwrap();

    let mut seen = Vec::new();
    ids_depths(&forest.into_comments(), &mut seen);
    assert_eq!(seen, vec![("a".to_string(), 0), ("x".to_string(), 1), ("y".to_string(), 2)]);
}

/// A comment delivered twice (initial payload and an expansion) is stored once.
#[test]
fn duplicate_comments_are_merged() {
    let payload = thread_payload(vec![t1("a", "t3_th", 0, json!("")), more("t3_th", &["a", "b"])]);
    let mut forest = CommentForest::from_listing(comment_listing_from_thread_payload(payload).unwrap()).unwrap();
    forest
        .expand(|_| Ok(serde_json::from_value::<Vec<Thing>>(json!([t1("a", "t3_th", 0, json!("")), t1("b", "t3_th", 0, json!(""))]))?))
        .unwrap();
    assert_eq!(forest.len(), 2);
}

#[test]
fn expansion_error_propagates() {
    let payload = thread_payload(vec![more("t3_th", &["z"])]);
    let mut forest = CommentForest::from_listing(comment_listing_from_thread_payload(payload).unwrap()).unwrap();
    assert!(forest.is_empty());
    let err = forest.expand(|_| Err(ApiError::NotFound("/api/morechildren".into()))).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn morechildren_envelope() {
    let ok = json!({ "json": { "errors": [], "data": { "things": [t1("q", "t1_p", 3, json!(""))] } } });
    assert_eq!(things_from_morechildren(ok).unwrap().len(), 1);

    let failed = json!({ "json": { "errors": [["RATELIMIT", "slow down", null]] } });
    assert!(things_from_morechildren(failed).is_err());
}
