//! WordPress REST API (v2) wrapper: posts, comments, and posting replies.
use crate::wordpress::types::{Comment, NewComment, Post};
use anyhow::{bail, Context, Result};
use instabot_http::{Auth, HttpClient, HttpError, RequestOpts};
use std::borrow::Cow;

const DEFAULT_PER_PAGE: u32 = 10;

#[derive(Clone)]
pub struct WordPressClient {
    http: HttpClient,
    token: String,
    per_page: u32,
}

impl WordPressClient {
    /// `base_url` is the site root, e.g. `https://blog.example.com`.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        let api = format!("{}/wp-json/wp/v2/", base_url.trim().trim_end_matches('/'));
        let http = HttpClient::new(&api).with_context(|| format!("invalid WordPress base url {base_url:?}"))?;
        Ok(Self {
            http,
            token: token.into(),
            per_page: DEFAULT_PER_PAGE,
        })
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, 100);
        self
    }

    fn auth(&self) -> Option<Auth<'_>> {
        if self.token.trim().is_empty() {
            None
        } else {
            Some(Auth::Bearer(&self.token))
        }
    }

    /// One page of posts, newest first. Paging past the end yields an empty list.
    pub async fn get_posts(&self, page: u32) -> Result<Vec<Post>> {
        let page = page.max(1);
        let opts = RequestOpts {
            auth: self.auth(),
            query: Some(vec![
                ("page", Cow::Owned(page.to_string())),
                ("per_page", Cow::Owned(self.per_page.to_string())),
            ]),
            ..Default::default()
        };
        match self.http.get_json::<Vec<Post>>("posts", opts).await {
            Ok(posts) => {
                tracing::debug!(target: "wordpress", page, count = posts.len(), "fetched posts");
                Ok(posts)
            }
            Err(e) if e.code() == Some("rest_post_invalid_page_number") => {
                tracing::debug!(target: "wordpress", page, "past the last page of posts");
                Ok(Vec::new())
            }
            Err(e) => Err(anyhow::Error::new(log_failure("get_posts", e)).context("fetching posts")),
        }
    }

    /// Comments across the site, or for one post.
    pub async fn get_comments(&self, post: Option<u64>) -> Result<Vec<Comment>> {
        let mut query = vec![("per_page", Cow::Owned(self.per_page.to_string()))];
        if let Some(id) = post {
            query.push(("post", Cow::Owned(id.to_string())));
        }
        let opts = RequestOpts {
            auth: self.auth(),
            query: Some(query),
            ..Default::default()
        };
        let comments: Vec<Comment> = self
            .http
            .get_json("comments", opts)
            .await
            .map_err(|e| log_failure("get_comments", e))
            .context("fetching comments")?;
        tracing::debug!(target: "wordpress", post = ?post, count = comments.len(), "fetched comments");
        Ok(comments)
    }

    /// Publish an approved comment on `post_id`.
    pub async fn create_comment(&self, post_id: u64, content: &str) -> Result<Comment> {
        let content = content.trim();
        if content.is_empty() {
            bail!("refusing to post an empty comment");
        }
        let body = NewComment {
            post: post_id,
            content,
        };
        let opts = RequestOpts {
            auth: self.auth(),
            // a retried POST could publish the comment twice
            retries: Some(0),
            ..Default::default()
        };
        let created: Comment = self
            .http
            .post_json_opts("comments", &body, opts)
            .await
            .map_err(|e| log_failure("create_comment", e))
            .with_context(|| format!("creating comment on post {post_id}"))?;
        tracing::info!(target: "wordpress", post = post_id, comment = created.id, status = %created.status, "comment created");
        Ok(created)
    }
}

fn log_failure(op: &'static str, e: HttpError) -> HttpError {
    match &e {
        HttpError::Api { status, message, .. } => {
            tracing::error!(target: "wordpress", op, %status, message = %message, "WordPress API error")
        }
        other => tracing::error!(target: "wordpress", op, error = %other, "WordPress request failed"),
    }
    e
}
