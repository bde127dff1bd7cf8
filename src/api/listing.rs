//! Wire shapes of Reddit's JSON listings and the tree builder that folds
//! "load more" results back into a thread's comment tree.

use ahash::{AHashMap, AHashSet};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};

use super::{ApiError, Comment, Submission};

/// Reddit's `{"kind": ..., "data": ...}` envelope.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum Thing {
    #[serde(rename = "t1")]
    Comment(Box<CommentData>),
    #[serde(rename = "t3")]
    Link(Box<LinkData>),
    #[serde(rename = "more")]
    More(MoreData),
    Listing(Listing),
}

#[derive(Debug, Default, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
pub struct LinkData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub author: Option<String>,
    pub title: String,
    pub created_utc: f64,
    #[serde(default)]
    pub num_comments: i64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub upvote_ratio: f64,
    #[serde(default)]
    pub permalink: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentData {
    pub id: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: String,
    /// `false`, or the epoch of the last edit.
    #[serde(default)]
    pub edited: Value,
    pub created_utc: f64,
    #[serde(default)]
    pub link_id: String,
    #[serde(default)]
    pub parent_id: String,
    #[serde(default)]
    pub distinguished: Option<String>,
    #[serde(default)]
    pub depth: i64,
    #[serde(default)]
    pub ups: i64,
    #[serde(default)]
    pub downs: i64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub total_awards_received: i64,
    #[serde(default)]
    pub gilded: i64,
    #[serde(default)]
    pub gildings: BTreeMap<String, i64>,
    /// `""` for a leaf, otherwise a nested `Listing` thing.
    #[serde(default)]
    pub replies: Value,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MoreData {
    #[serde(default)]
    pub id: String,
    pub parent_id: String,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub children: Vec<String>,
}

/// Maps the placeholder author of removed accounts to `None`.
fn live_author(author: Option<String>) -> Option<String> {
    author.filter(|a| !a.is_empty() && a != "[deleted]")
}

impl LinkData {
    pub fn into_submission(self) -> Submission {
        Submission {
            id: self.id,
            name: self.name,
            author: live_author(self.author),
            title: self.title,
            created_utc: self.created_utc,
            num_comments: self.num_comments,
            score: self.score,
            upvote_ratio: self.upvote_ratio,
            permalink: self.permalink,
        }
    }
}

impl CommentData {
    /// Detaches the nested replies listing, if any.
    pub fn take_replies(&mut self) -> Result<Option<Listing>, ApiError> {
        match std::mem::take(&mut self.replies) {
            v @ Value::Object(_) => match serde_json::from_value::<Thing>(v)? {
                Thing::Listing(l) => Ok(Some(l)),
                _ => Err(ApiError::Other(format!("replies of {} are not a listing", self.id))),
            },
            _ => Ok(None),
        }
    }

    fn into_comment(self) -> Comment {
        let edited = match self.edited {
            Value::Number(n) => n.as_f64(),
            _ => None,
        };
        Comment {
            id: self.id,
            author: live_author(self.author),
            body: self.body,
            edited,
            created_utc: self.created_utc,
            link_id: self.link_id,
            parent_id: self.parent_id,
            distinguished: self.distinguished,
            depth: self.depth,
            ups: self.ups,
            downs: self.downs,
            score: self.score,
            total_awards_received: self.total_awards_received,
            gilded: self.gilded,
            gildings: self.gildings,
            replies: Vec::new(),
        }
    }
}

/// A pending "load more" placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoreRequest {
    /// Fullname of the node the hidden comments hang from (`t1_..` or `t3_..`).
    pub parent_id: String,
    /// Ids to resolve through `morechildren`; empty for "continue this thread".
    pub children: Vec<String>,
}

impl MoreRequest {
    pub fn is_continue_thread(&self) -> bool {
        self.children.is_empty()
    }

    fn key(&self) -> String {
        if self.is_continue_thread() {
            format!("continue:{}", self.parent_id)
        } else {
            format!("more:{}", self.children.join(","))
        }
    }
}

/// Accumulates comments from the initial thread payload and every expansion round,
/// then rebuilds the nested tree.
///
/// Parent links are resolved only in [`CommentForest::into_comments`], so the order in
/// which expansion results arrive does not matter. Depth is recomputed from the final
/// tree because focused "continue this thread" payloads report depths relative to the
/// focused comment.
#[derive(Debug, Default)]
pub struct CommentForest {
    nodes: Vec<Comment>,
    by_name: AHashMap<String, usize>,
    pending: VecDeque<MoreRequest>,
    seen_requests: AHashSet<String>,
}

impl CommentForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_listing(listing: Listing) -> Result<Self, ApiError> {
        let mut forest = Self::new();
        forest.insert_all(listing.children)?;
        Ok(forest)
    }

    pub fn len(&self) -> usize { self.nodes.len() }
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }
    pub fn pending(&self) -> usize { self.pending.len() }

    pub fn insert_all(&mut self, things: Vec<Thing>) -> Result<(), ApiError> {
        for thing in things {
            self.insert(thing)?;
        }
        Ok(())
    }

    fn insert(&mut self, thing: Thing) -> Result<(), ApiError> {
        match thing {
            Thing::Comment(mut data) => {
                let replies = data.take_replies()?;
                let name = format!("t1_{}", data.id);
                if !self.by_name.contains_key(&name) {
                    self.by_name.insert(name, self.nodes.len());
                    self.nodes.push(data.into_comment());
                }
                if let Some(listing) = replies {
                    self.insert_all(listing.children)?;
                }
            }
            Thing::More(more) => {
                // A childless placeholder under the thread itself has nothing behind it.
                if more.children.is_empty() && !more.parent_id.starts_with("t1_") {
                    return Ok(());
                }
                let req = MoreRequest { parent_id: more.parent_id, children: more.children };
                if self.seen_requests.insert(req.key()) {
                    self.pending.push_back(req);
                }
            }
            Thing::Listing(listing) => self.insert_all(listing.children)?,
            Thing::Link(_) => {}
        }
        Ok(())
    }

    /// Resolves placeholders until none remain. `fetch` returns the things hidden
    /// behind one placeholder; those may contain further placeholders.
    pub fn expand<F>(&mut self, mut fetch: F) -> Result<(), ApiError>
    where
        F: FnMut(&MoreRequest) -> Result<Vec<Thing>, ApiError>,
    {
        while let Some(req) = self.pending.pop_front() {
            let things = fetch(&req)?;
            self.insert_all(things)?;
        }
        Ok(())
    }

    /// The top-level comments, in arrival order, each carrying its replies.
    pub fn into_comments(self) -> Vec<Comment> {
        let n = self.nodes.len();
        let mut kids: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut roots = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            match self.by_name.get(&node.parent_id) {
                Some(&p) if p != i => kids[p].push(i),
                _ => roots.push(i),
            }
        }

        let mut slots: Vec<Option<Comment>> = self.nodes.into_iter().map(Some).collect();
        roots
            .into_iter()
            .filter_map(|r| build_subtree(r, 0, &mut slots, &kids))
            .collect()
    }
}

fn build_subtree(idx: usize, depth: i64, slots: &mut [Option<Comment>], kids: &[Vec<usize>]) -> Option<Comment> {
    let mut comment = slots[idx].take()?;
    comment.depth = depth;
    comment.replies = kids[idx]
        .iter()
        .filter_map(|&k| build_subtree(k, depth + 1, slots, kids))
        .collect();
    Some(comment)
}

/// Splits a `/comments/<id>` payload (`[link listing, comment listing]`) and returns
/// the comment listing.
pub fn comment_listing_from_thread_payload(payload: Value) -> Result<Listing, ApiError> {
    let things: Vec<Thing> = serde_json::from_value(payload)?;
    match things.into_iter().nth(1) {
        Some(Thing::Listing(listing)) => Ok(listing),
        _ => Err(ApiError::Other("thread payload has no comment listing".into())),
    }
}

#[derive(Debug, Deserialize)]
struct MoreChildrenEnvelope {
    json: MoreChildrenBody,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenBody {
    #[serde(default)]
    errors: Vec<Value>,
    #[serde(default)]
    data: Option<MoreChildrenData>,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenData {
    #[serde(default)]
    things: Vec<Thing>,
}

/// Things from an `/api/morechildren?api_type=json` response.
pub fn things_from_morechildren(payload: Value) -> Result<Vec<Thing>, ApiError> {
    let env: MoreChildrenEnvelope = serde_json::from_value(payload)?;
    if !env.json.errors.is_empty() {
        return Err(ApiError::Other(format!("morechildren errors: {:?}", env.json.errors)));
    }
    Ok(env.json.data.map(|d| d.things).unwrap_or_default())
}
