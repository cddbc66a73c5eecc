//! Subcommand implementations. Output goes to stdout, diagnostics to the log.
use crate::wiring;
use anyhow::{Context, Result};
use instabot_config::InstabotConfig;
use instabot_llm::comments::CommentGenerator;
use instabot_social::wordpress::{Post, WordPressClient};
use instabot_web::{ArticleExtractor, ErrorKind};
use tracing::{info, warn};

pub async fn extract(cfg: &InstabotConfig, url: &str, json: bool) -> Result<()> {
    let extractor = wiring::build_extractor(cfg);
    if json {
        let article = extractor.extract(url).await?;
        println!("{}", serde_json::to_string_pretty(&article)?);
    } else {
        println!("{}", extractor.extract_article(url).await?);
    }
    Ok(())
}

pub async fn posts(cfg: &InstabotConfig, page: u32) -> Result<()> {
    let wp = wiring::build_wordpress(cfg)?;
    let posts = wp.get_posts(page).await?;
    if posts.is_empty() {
        println!("no posts on page {page}");
    }
    for post in posts {
        println!("{:>6}  {}  {}", post.id, post.title.text(), post.link);
    }
    Ok(())
}

pub async fn comments(cfg: &InstabotConfig, post: Option<u64>) -> Result<()> {
    let wp = wiring::build_wordpress(cfg)?;
    for comment in wp.get_comments(post).await? {
        println!(
            "{:>6}  post {:<6} {:<20} {}",
            comment.id,
            comment.post,
            comment.author_name,
            comment.content.text()
        );
    }
    Ok(())
}

pub async fn suggest(cfg: &InstabotConfig, url: &str, tone: Option<&str>) -> Result<()> {
    let generator = wiring::build_comment_generator(cfg).await?;
    let extractor = wiring::build_extractor(cfg);
    let text = extractor.extract_article(url).await?;
    let comments = generator.generate_comments(&text, tone).await?;
    print_suggestions(&comments);
    Ok(())
}

pub async fn reply(cfg: &InstabotConfig, post_id: u64, content: &str) -> Result<()> {
    let wp = wiring::build_wordpress(cfg)?;
    let created = wp.create_comment(post_id, content).await?;
    println!("posted comment {} on post {} ({})", created.id, created.post, created.status);
    Ok(())
}

pub async fn feed(cfg: &InstabotConfig, pages: u32, tone: Option<&str>) -> Result<()> {
    let wp = wiring::build_wordpress(cfg)?;
    let extractor = wiring::build_extractor(cfg);
    let generator = match &cfg.llm {
        Some(_) => Some(
            wiring::build_comment_generator(cfg)
                .await
                .context("preparing comment suggestions")?,
        ),
        None => {
            warn!(target: "app.feed", "no `llm` section configured; showing extracted articles only");
            None
        }
    };

    let entries = run_feed(&wp, &extractor, generator.as_ref(), pages, tone).await;
    for entry in &entries {
        print_entry(entry);
    }
    Ok(())
}

/// What the feed shows for one post.
#[derive(Debug)]
pub struct FeedEntry {
    pub post_id: u64,
    pub title: String,
    pub link: String,
    pub outcome: FeedOutcome,
}

#[derive(Debug)]
pub enum FeedOutcome {
    Suggested(Vec<String>),
    Extracted { chars: usize },
    ExtractionFailed(ErrorKind),
    SuggestionFailed(String),
}

/// Page through posts, extract each linked article and suggest replies.
///
/// Per-post failures are logged and recorded; they never stop the feed.
pub async fn run_feed(
    wp: &WordPressClient,
    extractor: &ArticleExtractor,
    generator: Option<&CommentGenerator>,
    pages: u32,
    tone: Option<&str>,
) -> Vec<FeedEntry> {
    let mut entries = Vec::new();
    for page in 1..=pages.max(1) {
        let posts = match wp.get_posts(page).await {
            Ok(posts) => posts,
            Err(e) => {
                let error = format!("{e:#}");
                warn!(target: "app.feed", page, %error, "failed to load posts");
                break;
            }
        };
        if posts.is_empty() {
            break;
        }
        for post in posts {
            let outcome = feed_post(&post, extractor, generator, tone).await;
            entries.push(FeedEntry {
                post_id: post.id,
                title: post.title.text(),
                link: post.link,
                outcome,
            });
        }
    }
    info!(target: "app.feed", posts = entries.len(), "feed complete");
    entries
}

async fn feed_post(
    post: &Post,
    extractor: &ArticleExtractor,
    generator: Option<&CommentGenerator>,
    tone: Option<&str>,
) -> FeedOutcome {
    let text = match extractor.extract_article(&post.link).await {
        Ok(text) => text,
        Err(e) => {
            warn!(
                target: "app.feed",
                post = post.id,
                link = %post.link,
                kind = %e.kind(),
                error = %e,
                "article extraction failed"
            );
            return FeedOutcome::ExtractionFailed(e.kind());
        }
    };
    let Some(generator) = generator else {
        return FeedOutcome::Extracted {
            chars: text.chars().count(),
        };
    };
    match generator.generate_comments(&text, tone).await {
        Ok(comments) => FeedOutcome::Suggested(comments),
        Err(e) => {
            warn!(target: "app.feed", post = post.id, error = %e, "comment generation failed");
            FeedOutcome::SuggestionFailed(e.to_string())
        }
    }
}

fn print_entry(entry: &FeedEntry) {
    println!("#{} {}\n   {}", entry.post_id, entry.title, entry.link);
    match &entry.outcome {
        FeedOutcome::Suggested(comments) => print_suggestions(comments),
        FeedOutcome::Extracted { chars } => println!("   extracted {chars} characters"),
        FeedOutcome::ExtractionFailed(kind) => println!("   could not extract article ({kind})"),
        FeedOutcome::SuggestionFailed(reason) => println!("   no suggestions: {reason}"),
    }
    println!();
}

fn print_suggestions(comments: &[String]) {
    if comments.is_empty() {
        println!("   (no suggestions)");
    }
    for (i, comment) in comments.iter().enumerate() {
        println!("   {}. {comment}", i + 1);
    }
}
