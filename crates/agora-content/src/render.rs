use std::fmt::Write;

use agora_types::Post;

const DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S UTC";

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Human-readable display form of a post.
///
/// With `hide_author` the `Author:` line is left out, which is how posts are
/// shown inside an anonymized feed.
pub fn render_post(post: &Post, hide_author: bool) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "[Post #{}]", post.id);
    let _ = writeln!(out, "Title: {}", post.title);
    let _ = writeln!(out, "Content: {}", post.body);
    if !hide_author {
        let _ = writeln!(out, "Author: {}", post.author);
    }
    let _ = writeln!(
        out,
        "Votes: {}, {}",
        plural(post.upvotes(), "upvote", "upvotes"),
        plural(post.downvotes(), "downvote", "downvotes"),
    );
    let _ = writeln!(out, "Date: {}", post.created_at.format(DATE_FORMAT));
    let _ = writeln!(out, "- Comments ({}):", post.comments.len());
    for comment in &post.comments {
        let _ = writeln!(out, "- {}: {}", comment.author, comment.text);
    }
    out
}
