use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ARTICLES_DIR: &str = "content/articles";
pub const DEFAULT_AUTHOR: &str = "Point Labs";
pub const WORDS_PER_MINUTE: usize = 200;
const EXTENSIONS: [&str; 2] = ["mdx", "md"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body_text: String,
    pub date: NaiveDate,
    pub tags: Vec<String>,
    pub author: String,
    pub reading_time_minutes: usize,
}

impl Article {
    /// Copy without the body, for listings.
    pub fn summary(&self) -> Self {
        Self {
            body_text: String::new(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Deserialize)]
struct FrontMatter {
    title: String,
    #[serde(default)]
    excerpt: String,
    date: NaiveDate,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    author: Option<String>,
}

/// Read side of the article collection.
pub trait ContentProvider {
    /// Every article, newest first.
    fn list_articles(&self) -> Result<Vec<Article>>;

    /// `None` when no article has this slug.
    fn article_by_slug(&self, slug: &str) -> Result<Option<Article>>;

    fn list_tags(&self) -> Result<Vec<String>> {
        let tags = self
            .list_articles()?
            .into_iter()
            .flat_map(|article| article.tags)
            .collect::<BTreeSet<_>>();
        Ok(tags.into_iter().collect())
    }

    fn articles_by_tag(&self, tag: &str) -> Result<Vec<Article>> {
        let mut articles = self.list_articles()?;
        articles.retain(|article| article.tags.iter().any(|candidate| candidate == tag));
        Ok(articles)
    }

    fn article_slugs(&self) -> Result<Vec<String>> {
        Ok(self
            .list_articles()?
            .into_iter()
            .map(|article| article.slug)
            .collect())
    }
}

/// Articles stored as markdown files with YAML front matter.
#[derive(Debug, Clone)]
pub struct ArticleStore {
    root: PathBuf,
}

impl ArticleStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file backing `slug`. With several extensions present, `.mdx` wins over `.md`.
    fn article_path(&self, slug: &str) -> Option<PathBuf> {
        if !is_valid_slug(slug) {
            return None;
        }
        EXTENSIONS
            .iter()
            .map(|extension| self.root.join(format!("{slug}.{extension}")))
            .find(|path| path.is_file())
    }

    fn article_files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.root).with_context(|| {
            format!("failed to read articles directory {}", self.root.display())
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("failed to list {}", self.root.display()))?
                .path();
            let has_extension = path
                .extension()
                .and_then(OsStr::to_str)
                .is_some_and(|extension| EXTENSIONS.contains(&extension));
            if has_extension && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl ContentProvider for ArticleStore {
    fn list_articles(&self) -> Result<Vec<Article>> {
        let slugs = self
            .article_files()?
            .iter()
            .filter_map(|path| path.file_stem().and_then(OsStr::to_str))
            .filter(|slug| is_valid_slug(slug))
            .map(str::to_owned)
            .collect::<BTreeSet<_>>();

        let mut articles = Vec::with_capacity(slugs.len());
        for slug in &slugs {
            let Some(path) = self.article_path(slug) else {
                continue;
            };
            match load_article(&path, slug) {
                Ok(article) => articles.push(article.summary()),
                Err(error) => {
                    tracing::warn!(path = %path.display(), "skipping article: {error:#}");
                }
            }
        }

        articles.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
        Ok(articles)
    }

    fn article_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        match self.article_path(slug) {
            Some(path) => load_article(&path, slug).map(Some),
            None => Ok(None),
        }
    }
}

/// Slugs are file stems: no path separators and not made only of dots.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.contains(|ch: char| ch == '/' || ch == '\\')
        && !slug.chars().all(|ch| ch == '.')
        && slug.trim() == slug
}

pub fn reading_time_minutes(body: &str) -> usize {
    body.split_whitespace().count().div_ceil(WORDS_PER_MINUTE)
}

fn load_article(path: &Path, slug: &str) -> Result<Article> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read article {}", path.display()))?;
    let (front, body) = split_front_matter(&contents)
        .with_context(|| format!("invalid article {}", path.display()))?;
    let meta: FrontMatter = serde_yaml::from_str(front).map_err(|error| {
        let location = error
            .location()
            .map(|location| format!("line {}, column {}", location.line(), location.column()))
            .unwrap_or_else(|| "unknown location".to_owned());
        anyhow!(
            "failed to parse front matter in {} at {}: {}",
            path.display(),
            location,
            error
        )
    })?;

    Ok(Article {
        slug: slug.to_owned(),
        title: meta.title,
        excerpt: meta.excerpt,
        reading_time_minutes: reading_time_minutes(body),
        body_text: body.trim().to_owned(),
        date: meta.date,
        tags: meta.tags,
        author: meta
            .author
            .filter(|author| !author.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_owned()),
    })
}

/// Splits `---`-delimited front matter from the markdown body.
fn split_front_matter(contents: &str) -> Result<(&str, &str)> {
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);
    let Some(rest) = contents
        .strip_prefix("---\n")
        .or_else(|| contents.strip_prefix("---\r\n"))
    else {
        bail!("missing front matter: file must start with '---'");
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let front = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((front, body));
        }
        offset += line.len();
    }
    bail!("unterminated front matter: missing closing '---'")
}
