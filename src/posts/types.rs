use super::error::PostsError;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Timestamp layout used for posts and comments, e.g. `05 Mar 2024 - 14:30:00`.
pub const TIMESTAMP_FORMAT: &str = "%d %b %Y - %H:%M:%S";

pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Route prefix under which single posts are served.
pub const POST_URL_PREFIX: &str = "/post";

/// Current local time rendered in [`TIMESTAMP_FORMAT`].
pub fn current_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(timestamp: &str) -> Result<NaiveDateTime, PostsError> {
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).map_err(|e| {
        PostsError::DateParseError(format!("Unable to parse timestamp {:?}: {}", timestamp, e))
    })
}

/// A post record as persisted in the store.
///
/// Every field carries a serde default so that a record with missing keys
/// still loads; `likes` and `comments` in particular are routinely absent in
/// older stores. Fields holding `null` or a value of the wrong type also fall
/// back instead of failing the record, so one odd field cannot take the rest
/// of the store down with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub author: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub likes: u64,
    #[serde(default, deserialize_with = "lenient_comments")]
    pub comments: Vec<Comment>,
}

impl Post {
    pub fn new(new_post: NewPost) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: new_post.title,
            content: new_post.content,
            timestamp: current_timestamp(),
            author: new_post.author,
            likes: 0,
            comments: Vec::new(),
        }
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    pub fn parsed_timestamp(&self) -> Result<NaiveDateTime, PostsError> {
        parse_timestamp(&self.timestamp)
    }

    pub fn add_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
    }

    pub fn like(&mut self) {
        self.likes = self.likes.saturating_add(1);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default = "default_author", deserialize_with = "lenient_author")]
    pub author: String,
    #[serde(default, alias = "content", deserialize_with = "lenient_string")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: String,
}

fn default_author() -> String {
    ANONYMOUS_AUTHOR.to_string()
}

/// Strings pass through, numbers and booleans are rendered as text, `null`
/// becomes empty. Arrays and objects keep their compact JSON form.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

fn lenient_author<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(default_author()),
        other => lenient_string(other).map_err(serde::de::Error::custom),
    }
}

/// Non-negative integers, or strings holding one, are kept. Anything else
/// (negative, fractional, `null`) counts as zero.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// A non-array value reads as no comments. Inside the array, a bare string is
/// taken as the text of an anonymous comment and other non-object entries are
/// skipped.
fn lenient_comments<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<Comment>, D::Error> {
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(Comment {
                author: default_author(),
                text,
                timestamp: String::new(),
            }),
            Value::Object(_) => serde_json::from_value(item).ok(),
            _ => None,
        })
        .collect())
}

impl Comment {
    /// Builds a comment stamped with the current time.
    ///
    /// A missing author becomes [`ANONYMOUS_AUTHOR`], and so does an empty or
    /// whitespace-only one. The comment form always submits its `author`
    /// field, so a blank value there means the visitor left it out. Stored
    /// comments are not affected: an explicit `""` already on disk stays
    /// `""`.
    pub fn new(text: String, author: Option<String>) -> Self {
        let author = author
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(default_author);

        Self {
            author,
            text,
            timestamp: current_timestamp(),
        }
    }
}

/// Fields submitted through the creation form.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author: String,
}

/// Raw payload of the single-post form. Which field is present decides the
/// action; see [`PostAction`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostActionForm {
    pub comment: Option<String>,
    pub author: Option<String>,
    pub like: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostAction {
    Comment { text: String, author: Option<String> },
    Like,
    NoChange,
}

impl From<PostActionForm> for PostAction {
    fn from(form: PostActionForm) -> Self {
        if let Some(text) = form.comment {
            PostAction::Comment {
                text,
                author: form.author,
            }
        } else if form.like.is_some() {
            PostAction::Like
        } else {
            PostAction::NoChange
        }
    }
}

/// A post together with its derived comment count, as shown in the listing.
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub timestamp: String,
    pub likes: u64,
    pub comment_count: usize,
    pub url: String,
}

impl PostSummary {
    pub fn from_post(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            content: post.content.clone(),
            author: post.author.clone(),
            timestamp: post.timestamp.clone(),
            likes: post.likes,
            comment_count: post.comment_count(),
            url: post_url(&post.id),
        }
    }
}

pub fn post_url(id: &str) -> String {
    format!("{}/{}", POST_URL_PREFIX, urlencoding::encode(id))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostsConfig {
    pub store_path: PathBuf,
    pub index_template: String,
    pub create_template: String,
    pub post_template: String,
    pub not_found_template: String,
}

impl Default for PostsConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("data/posts.json"),
            index_template: String::from("pages/home.html.liquid"),
            create_template: String::from("pages/create_post.html.liquid"),
            post_template: String::from("pages/view_post.html.liquid"),
            not_found_template: String::from("pages/post_not_found.html.liquid"),
        }
    }
}
