use std::collections::VecDeque;

use crate::api::Comment;
use crate::records::CommentRecord;

/// Breadth-first flattening of a comment forest: the top-level list first, then
/// each node's replies appended to the queue as it is visited.
pub fn flatten_comments(forest: Vec<Comment>, submission_id: &str) -> Vec<CommentRecord> {
    let mut out = Vec::new();
    let mut queue: VecDeque<Comment> = forest.into();
    while let Some(mut comment) = queue.pop_front() {
        let replies = std::mem::take(&mut comment.replies);
        out.push(CommentRecord::from_comment(&comment, submission_id));
        queue.extend(replies);
    }
    out
}
