//! Public read services: feed, tag and archive listings, search, and the
//! single-post view.

use std::sync::Arc;

use thiserror::Error;

use crate::application::pagination::PageWindow;
use crate::application::preview::PreviewRenderer;
use crate::application::repos::{ListWindow, PostFilter, PostsRepo, RepoError};
use crate::config::ContentSettings;
use crate::domain::entities::PostRecord;
use crate::presentation::views::{
    ArchivesContext, BlogContext, FeedContext, PostCard, PostDetailContext, SearchContext,
    TagContext, YearGroup,
};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    preview: Arc<dyn PreviewRenderer>,
    feed_excerpt_chars: usize,
    listing_excerpt_chars: usize,
    page_size: u32,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        preview: Arc<dyn PreviewRenderer>,
        content: &ContentSettings,
    ) -> Self {
        Self {
            posts,
            preview,
            feed_excerpt_chars: content.feed_excerpt_chars,
            listing_excerpt_chars: content.listing_excerpt_chars,
            page_size: content.page_size.get(),
        }
    }

    /// Every post, newest first, with full-length excerpts.
    pub async fn home(&self) -> Result<FeedContext, FeedError> {
        let records = self.posts.list_posts(&PostFilter::default(), None).await?;
        let posts = self.cards(records, self.feed_excerpt_chars);
        Ok(FeedContext { posts })
    }

    /// One page of the chronological feed. Out-of-range pages render empty
    /// rather than redirecting; only the dashboard clamps.
    pub async fn blog_page(&self, page: u32) -> Result<BlogContext, FeedError> {
        let filter = PostFilter::default();
        let total = self.posts.count_posts(&filter).await?;
        let window = PageWindow::compute(page, self.page_size, total);
        let records = self
            .posts
            .list_posts(
                &filter,
                Some(ListWindow {
                    limit: window.limit,
                    offset: window.offset,
                }),
            )
            .await?;

        Ok(BlogContext {
            posts: self.cards(records, self.feed_excerpt_chars),
            page,
            total_pages: window.total_pages,
        })
    }

    /// Posts whose tags contain the given substring, grouped by calendar
    /// year within the requested page.
    pub async fn tag_page(&self, tag: &str, page: u32) -> Result<TagContext, FeedError> {
        let filter = PostFilter::tagged(tag);
        let total = self.posts.count_posts(&filter).await?;
        let window = PageWindow::compute(page, self.page_size, total);
        let records = self
            .posts
            .list_posts(
                &filter,
                Some(ListWindow {
                    limit: window.limit,
                    offset: window.offset,
                }),
            )
            .await?;

        Ok(TagContext {
            tag: tag.to_string(),
            years: self.year_groups(records, self.listing_excerpt_chars),
            page,
            total_pages: window.total_pages,
        })
    }

    /// All posts, paginated and grouped by year for the archive sidebar.
    pub async fn archives_page(&self, page: u32) -> Result<ArchivesContext, FeedError> {
        let filter = PostFilter::default();
        let total = self.posts.count_posts(&filter).await?;
        let window = PageWindow::compute(page, self.page_size, total);
        let records = self
            .posts
            .list_posts(
                &filter,
                Some(ListWindow {
                    limit: window.limit,
                    offset: window.offset,
                }),
            )
            .await?;

        Ok(ArchivesContext {
            years: self.year_groups(records, self.listing_excerpt_chars),
            page,
            total_pages: window.total_pages,
        })
    }

    /// Substring search over published posts' titles and tags. A blank
    /// query short-circuits to an empty result page.
    pub async fn search(&self, query: &str) -> Result<SearchContext, FeedError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchContext {
                query: String::new(),
                posts: Vec::new(),
            });
        }

        let records = self.posts.search_posts(query).await?;
        tracing::debug!(
            target: "foglio::feed::search",
            query,
            results = records.len(),
            "search executed"
        );

        Ok(SearchContext {
            query: query.to_string(),
            posts: self.cards(records, self.listing_excerpt_chars),
        })
    }

    /// Single post by slug. Stored HTML is sanitized before display.
    pub async fn post_detail(&self, slug: &str) -> Result<Option<PostDetailContext>, FeedError> {
        let Some(record) = self.posts.find_by_slug(slug).await? else {
            return Ok(None);
        };

        let tags = record.tag_list();
        Ok(Some(PostDetailContext {
            content_html: ammonia::clean(&record.content),
            slug: record.slug,
            title: record.title,
            tags,
            created_at: record.created_at,
        }))
    }

    fn cards(&self, records: Vec<PostRecord>, excerpt_chars: usize) -> Vec<PostCard> {
        records
            .into_iter()
            .map(|record| self.card(record, excerpt_chars))
            .collect()
    }

    fn card(&self, record: PostRecord, excerpt_chars: usize) -> PostCard {
        let stripped = self.preview.strip_html(&record.content);
        let truncated = stripped.chars().count() > excerpt_chars;
        let excerpt = stripped.chars().take(excerpt_chars).collect();

        PostCard {
            first_image: self.preview.first_image(&record.content),
            tags: record.tag_list(),
            slug: record.slug,
            title: record.title,
            excerpt,
            created_at: record.created_at,
            truncated,
        }
    }

    /// Group an already-ordered page of posts by calendar year, preserving
    /// the newest-first ordering of both groups and entries.
    fn year_groups(&self, records: Vec<PostRecord>, excerpt_chars: usize) -> Vec<YearGroup> {
        let mut groups: Vec<YearGroup> = Vec::new();

        for record in records {
            let year = record.year().to_string();
            let card = self.card(record, excerpt_chars);
            match groups.last_mut() {
                Some(group) if group.year == year => group.posts.push(card),
                _ => groups.push(YearGroup {
                    year,
                    posts: vec![card],
                }),
            }
        }

        groups
    }
}
