//! Public articles (blog posts, success stories), paged by the backend.

use crate::api::{self, ApiClient};
use crate::errors::{ClientError, Result};
use crate::models::{Article, Listing, Pagination};
use crate::store::{Snapshot, Store, Subscription};
use crate::stores::auth::SessionReader;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleState {
    pub articles: Vec<Article>,
    pub current_article: Option<Article>,
    pub pagination: Pagination,
}

#[derive(Clone)]
pub struct ArticleStore {
    api: ApiClient,
    session: SessionReader,
    state: Store<ArticleState>,
}

impl ArticleStore {
    pub fn new(api: ApiClient, session: SessionReader) -> Self {
        Self {
            api,
            session,
            state: Store::new("articles"),
        }
    }

    pub fn snapshot(&self) -> Snapshot<ArticleState> {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> Subscription<ArticleState> {
        self.state.subscribe()
    }

    /// `GET /articles/articles?page={page}`
    ///
    /// When the backend omits paging metadata the requested page is
    /// recorded and `total_pages` is left as it was.
    pub async fn fetch_articles(&self, page: u32) -> Result<Vec<Article>> {
        let page = page.max(1);
        let token = self.session.token();
        let (articles, _) = self
            .state
            .run(
                "fetch_articles",
                async {
                    let listing: Listing<Article> = self
                        .api
                        .get_with_query("/articles/articles", &[("page", page)], token.as_deref())
                        .await?;
                    Ok(listing.into_parts())
                },
                |s, (articles, pagination): &(Vec<Article>, Option<Pagination>)| {
                    s.articles = articles.clone();
                    s.pagination = pagination.unwrap_or(Pagination {
                        current_page: page,
                        total_pages: s.pagination.total_pages.max(page),
                    });
                },
            )
            .await?;
        Ok(articles)
    }

    /// `GET /articles/articles/{id}`
    pub async fn fetch_article_by_id(&self, id: &str) -> Result<Article> {
        if id.trim().is_empty() {
            return self.state.reject(
                "fetch_article_by_id",
                ClientError::precondition("Article ID not found"),
            );
        }
        let token = self.session.token();
        let path = self.state.check(
            "fetch_article_by_id",
            api::path(&["articles", "articles", id]),
        )?;
        self.state
            .run(
                "fetch_article_by_id",
                self.api.get::<Article>(&path, token.as_deref()),
                |s, article: &Article| s.current_article = Some(article.clone()),
            )
            .await
    }
}
