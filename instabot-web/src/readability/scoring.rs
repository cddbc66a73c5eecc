//! Candidate scoring.
//!
//! Paragraph-like nodes hand a score to their ancestors; each ancestor starts
//! from a tag/class based prior. The best ancestor after the link-density
//! penalty is the main content, optionally joined by qualifying siblings.
use super::dom::{collapsed_len, Dom, NodeKind};
use regex::Regex;
use std::sync::LazyLock;

/// Shorter paragraphs do not vote.
const MIN_PARAGRAPH_LEN: usize = 25;
const MAX_SCORED_ANCESTORS: usize = 5;
const CLASS_WEIGHT: f64 = 25.0;

static UNLIKELY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)-ad-|ai2html|banner|breadcrumbs|combx|comment|community|cover-wrap|disqus|extra|footer|gdpr|header|legends|menu|related|remark|replies|rss|shoutbox|sidebar|skyscraper|social|sponsor|supplemental|ad-break|agegate|pagination|pager|popup|yom-remote|share|newsletter|cookie",
    )
    .expect("unlikely-candidate pattern")
});

static MAYBE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)and|article|body|column|content|main|shadow").expect("maybe-candidate pattern")
});

static POSITIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)article|body|content|entry|hentry|h-entry|main|page|pagination|post|text|blog|story")
        .expect("positive pattern")
});

static NEGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)-ad-|hidden|^hid$| hid$| hid |^hid |banner|combx|comment|com-|contact|footer|gdpr|masthead|media|meta|outbrain|promo|related|scroll|share|shoutbox|sidebar|skyscraper|sponsor|shopping|tags|widget",
    )
    .expect("negative pattern")
});

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.( |$)").expect("sentence pattern"));

/// Subtrees that never hold article text.
const SKIP_TAGS: &[&str] = &[
    "aside", "button", "canvas", "dialog", "embed", "footer", "form", "head", "iframe", "input",
    "nav", "noscript", "object", "script", "select", "style", "svg", "template", "textarea",
];

const SKIP_ROLES: &[&str] = &[
    "alert",
    "alertdialog",
    "complementary",
    "dialog",
    "menu",
    "menubar",
    "navigation",
];

/// Children that stop a `div` from being read as a paragraph.
const DIV_TO_P_BLOCKERS: &[&str] = &[
    "article", "blockquote", "div", "dl", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "img",
    "main", "ol", "p", "pre", "section", "table", "ul",
];

/// Outcome of scoring: the nodes making up the main content, in document order.
#[derive(Debug)]
pub(crate) struct Selection {
    pub roots: Vec<usize>,
    pub skip: Vec<bool>,
}

pub(crate) struct Scorer<'a> {
    dom: &'a Dom,
    skip: Vec<bool>,
    text_len: Vec<usize>,
    link_len: Vec<usize>,
    commas: Vec<usize>,
    scores: Vec<Option<f64>>,
}

impl<'a> Scorer<'a> {
    pub fn new(dom: &'a Dom) -> Self {
        let n = dom.len();
        let mut scorer = Self {
            dom,
            skip: vec![false; n],
            text_len: vec![0; n],
            link_len: vec![0; n],
            commas: vec![0; n],
            scores: vec![None; n],
        };
        scorer.mark_skipped();
        scorer.measure();
        scorer
    }

    /// Run the scoring passes and pick the main content, if any.
    pub fn select(mut self) -> Option<Selection> {
        self.score_paragraphs();

        let mut best: Option<(usize, f64)> = None;
        for idx in 0..self.dom.len() {
            let Some(score) = self.final_score(idx) else {
                continue;
            };
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((idx, score));
            }
        }
        let (top, top_score) = best?;

        let roots = match self.dom.nodes[top].parent {
            Some(parent) => {
                let threshold = (top_score * 0.2).max(10.0);
                self.dom.nodes[parent]
                    .children
                    .iter()
                    .copied()
                    .filter(|&c| c == top || self.sibling_qualifies(c, top, top_score, threshold))
                    .collect()
            }
            None => vec![top],
        };

        tracing::trace!(
            target: "extract.readability",
            top,
            top_score,
            siblings = roots.len() - 1,
            "selected main content"
        );

        Some(Selection {
            roots,
            skip: self.skip,
        })
    }

    fn mark_skipped(&mut self) {
        let mut in_article = vec![false; self.dom.len()];
        for idx in 0..self.dom.len() {
            let parent = self.dom.nodes[idx].parent;
            let parent_skipped = parent.is_some_and(|p| self.skip[p]);
            let parent_in_article = parent.is_some_and(|p| in_article[p]);
            let Some(tag) = self.dom.tag(idx) else {
                self.skip[idx] = parent_skipped;
                continue;
            };
            in_article[idx] = parent_in_article || tag == "article";
            self.skip[idx] = parent_skipped || self.skips_itself(idx, tag, parent_in_article);
        }
    }

    fn skips_itself(&self, idx: usize, tag: &str, in_article: bool) -> bool {
        if SKIP_TAGS.contains(&tag) || (tag == "header" && !in_article) {
            return true;
        }
        if let Some(role) = self.dom.attr(idx, "role") {
            if SKIP_ROLES.contains(&role.trim().to_ascii_lowercase().as_str()) {
                return true;
            }
        }
        if self.is_hidden(idx) {
            return true;
        }
        if matches!(tag, "html" | "body" | "article" | "main" | "a") {
            return false;
        }
        let signature = self.class_and_id(idx);
        UNLIKELY.is_match(&signature) && !MAYBE.is_match(&signature)
    }

    fn is_hidden(&self, idx: usize) -> bool {
        if self.dom.attr(idx, "hidden").is_some() {
            return true;
        }
        if self.dom.attr(idx, "aria-hidden") == Some("true") {
            return true;
        }
        self.dom.attr(idx, "style").is_some_and(|style| {
            let compact: String = style
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase();
            compact.contains("display:none") || compact.contains("visibility:hidden")
        })
    }

    fn class_and_id(&self, idx: usize) -> String {
        format!(
            "{} {}",
            self.dom.attr(idx, "class").unwrap_or_default(),
            self.dom.attr(idx, "id").unwrap_or_default()
        )
    }

    /// Bottom-up text, link-text and comma counts, ignoring skipped subtrees.
    fn measure(&mut self) {
        for idx in (0..self.dom.len()).rev() {
            if self.skip[idx] {
                continue;
            }
            let node = &self.dom.nodes[idx];
            match &node.kind {
                NodeKind::Text(text) => {
                    self.text_len[idx] = collapsed_len(text);
                    self.commas[idx] = text.matches(',').count();
                }
                NodeKind::Element { tag, .. } => {
                    let mut text = 0;
                    let mut links = 0;
                    let mut commas = 0;
                    for &child in &node.children {
                        if self.skip[child] {
                            continue;
                        }
                        text += self.text_len[child];
                        links += self.link_len[child];
                        commas += self.commas[child];
                    }
                    self.text_len[idx] = text;
                    self.link_len[idx] = if tag == "a" { text } else { links };
                    self.commas[idx] = commas;
                }
            }
        }
    }

    fn is_scorable(&self, idx: usize) -> bool {
        match self.dom.tag(idx) {
            Some("p" | "td" | "pre") => true,
            Some("div") => !self.dom.nodes[idx]
                .children
                .iter()
                .any(|&c| self.dom.tag(c).is_some_and(|t| DIV_TO_P_BLOCKERS.contains(&t))),
            _ => false,
        }
    }

    fn score_paragraphs(&mut self) {
        for idx in 0..self.dom.len() {
            if self.skip[idx] || !self.is_scorable(idx) {
                continue;
            }
            let len = self.text_len[idx];
            if len < MIN_PARAGRAPH_LEN {
                continue;
            }
            let score = 1.0 + self.commas[idx] as f64 + (len / 100).min(3) as f64;

            let mut ancestor = self.dom.nodes[idx].parent;
            let mut level = 0usize;
            while let Some(a) = ancestor {
                // the root <html> element never competes
                if level >= MAX_SCORED_ANCESTORS || self.dom.nodes[a].parent.is_none() {
                    break;
                }
                let divider = match level {
                    0 => 1.0,
                    1 => 2.0,
                    l => l as f64 * 3.0,
                };
                let base = match self.scores[a] {
                    Some(s) => s,
                    None => self.prior(a),
                };
                self.scores[a] = Some(base + score / divider);
                ancestor = self.dom.nodes[a].parent;
                level += 1;
            }
        }
    }

    /// Starting score of a candidate container.
    fn prior(&self, idx: usize) -> f64 {
        let tag_weight = match self.dom.tag(idx) {
            Some("article") => 10.0,
            Some("div" | "main") => 5.0,
            Some("pre" | "td" | "blockquote") => 3.0,
            Some("address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" | "form") => -3.0,
            Some("h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th") => -5.0,
            _ => 0.0,
        };
        tag_weight + self.class_weight(idx)
    }

    fn class_weight(&self, idx: usize) -> f64 {
        let mut weight = 0.0;
        for name in ["class", "id"] {
            let Some(value) = self.dom.attr(idx, name).filter(|v| !v.is_empty()) else {
                continue;
            };
            if NEGATIVE.is_match(value) {
                weight -= CLASS_WEIGHT;
            }
            if POSITIVE.is_match(value) {
                weight += CLASS_WEIGHT;
            }
        }
        weight
    }

    fn link_density(&self, idx: usize) -> f64 {
        match self.text_len[idx] {
            0 => 0.0,
            len => self.link_len[idx] as f64 / len as f64,
        }
    }

    fn final_score(&self, idx: usize) -> Option<f64> {
        self.scores[idx].map(|s| s * (1.0 - self.link_density(idx)))
    }

    fn sibling_qualifies(&self, idx: usize, top: usize, top_score: f64, threshold: f64) -> bool {
        if self.skip[idx] || self.dom.tag(idx).is_none() {
            return false;
        }
        let same_class = match (self.dom.attr(idx, "class"), self.dom.attr(top, "class")) {
            (Some(a), Some(b)) => !a.is_empty() && a == b,
            _ => false,
        };
        let bonus = if same_class { top_score * 0.2 } else { 0.0 };
        if self.final_score(idx).is_some_and(|s| s + bonus >= threshold) {
            return true;
        }
        if self.dom.tag(idx) != Some("p") {
            return false;
        }
        let len = self.text_len[idx];
        let density = self.link_density(idx);
        if len > 80 {
            density < 0.25
        } else {
            len > 0 && density == 0.0 && SENTENCE_END.is_match(&self.dom.render_text(&[idx], &self.skip))
        }
    }
}
