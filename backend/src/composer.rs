//! Homepage composition.
//!
//! For each active section, in sort order, resolve the assigned published
//! articles (featured first, then position, then newest; bounded by the
//! section's `max_articles`) and shape them for the section's layout style.
//! Sections that resolve to nothing are dropped rather than rendered empty.
//! No caching: every call re-runs the queries.

use anyhow::Result;
use echhapa_shared::{
    article_store::{ArticleRecord, ArticleStore},
    layout_store::{LayoutStore, LayoutType},
    settings_store::SettingsStore,
    taxonomy_store::{CategoryRecord, TaxonomyStore},
};
use serde::Serialize;

const EXCERPT_LENGTH: usize = 150;
const TRENDING_COUNT: i64 = 5;

/// A homepage-ready article: the record trimmed to what the templates show.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleCard {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub featured_image: Option<String>,
    pub author_name: Option<String>,
    pub category_name: Option<String>,
    pub published_at: Option<String>,
    pub views: i64,
}

impl From<&ArticleRecord> for ArticleCard {
    fn from(article: &ArticleRecord) -> Self {
        let excerpt = article
            .excerpt
            .clone()
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| truncate_text(&article.content, EXCERPT_LENGTH));
        Self {
            id: article.id,
            title: article.title.clone(),
            slug: article.slug.clone(),
            excerpt,
            featured_image: article.featured_image.clone(),
            author_name: article.author_name.clone(),
            category_name: article.category_name.clone(),
            published_at: article.published_at.clone(),
            views: article.views,
        }
    }
}

/// Layout-shaped article list for one section. `featured` splits the first
/// article off as the lead; the other styles share one flat shape, with
/// `carousel` distinguished only by its tag.
#[derive(Debug, Serialize)]
#[serde(tag = "layout", rename_all = "lowercase")]
pub enum SectionContent {
    Featured {
        lead: ArticleCard,
        side: Vec<ArticleCard>,
    },
    Grid {
        articles: Vec<ArticleCard>,
    },
    List {
        articles: Vec<ArticleCard>,
    },
    Carousel {
        articles: Vec<ArticleCard>,
    },
}

#[derive(Debug, Serialize)]
pub struct SectionBlock {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub content: SectionContent,
}

#[derive(Debug, Serialize)]
pub struct SiteMeta {
    pub name: String,
    pub description: String,
    pub keywords: String,
    pub contact_email: String,
}

#[derive(Debug, Serialize)]
pub struct Homepage {
    pub site: SiteMeta,
    pub hero: Option<ArticleCard>,
    pub sections: Vec<SectionBlock>,
    pub trending: Vec<ArticleCard>,
    pub categories: Vec<CategoryRecord>,
}

/// Assemble the whole homepage. The settings store is passed in as the
/// provider for display defaults instead of being consulted ad hoc.
pub fn compose(
    layout: &LayoutStore,
    articles: &ArticleStore,
    taxonomy: &TaxonomyStore,
    settings: &SettingsStore,
) -> Result<Homepage> {
    let mut sections = Vec::new();
    for section in layout.active_sections()? {
        let assigned = layout.section_articles(section.id, Some(section.max_articles))?;
        if assigned.is_empty() {
            continue;
        }
        let cards: Vec<ArticleCard> =
            assigned.iter().map(|row| ArticleCard::from(&row.article)).collect();
        sections.push(SectionBlock {
            id: section.id,
            name: section.name,
            slug: section.slug,
            content: shape_content(section.layout_type, cards),
        });
    }

    let recent = articles.list_published(TRENDING_COUNT, 0, None)?;
    let hero = recent.first().map(ArticleCard::from);
    let trending = recent.iter().map(ArticleCard::from).collect();

    Ok(Homepage {
        site: site_meta(settings),
        hero,
        sections,
        trending,
        categories: taxonomy.list_categories()?,
    })
}

fn site_meta(settings: &SettingsStore) -> SiteMeta {
    SiteMeta {
        name: settings.get("site_name", "Echhapa News"),
        description: settings.get(
            "site_description",
            "Your trusted source for news and information",
        ),
        keywords: settings.get("site_keywords", ""),
        contact_email: settings.get("contact_email", ""),
    }
}

/// Pure dispatch over the layout style. The resolved list is already ordered
/// and bounded; this only decides its shape.
fn shape_content(layout_type: LayoutType, mut cards: Vec<ArticleCard>) -> SectionContent {
    match layout_type {
        LayoutType::Featured => {
            let lead = cards.remove(0);
            SectionContent::Featured { lead, side: cards }
        }
        LayoutType::Grid => SectionContent::Grid { articles: cards },
        LayoutType::List => SectionContent::List { articles: cards },
        LayoutType::Carousel => SectionContent::Carousel { articles: cards },
    }
}

/// Character-boundary-safe prefix with an ellipsis, for derived excerpts.
pub fn truncate_text(text: &str, length: usize) -> String {
    if text.chars().count() <= length {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(length).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use echhapa_shared::{
        article_store::{ArticleStatus, NewArticleInput},
        layout_store::NewSectionInput,
        schema,
        settings_store::SettingType,
        Database,
    };

    struct Fixture {
        layout: LayoutStore,
        articles: ArticleStore,
        taxonomy: TaxonomyStore,
        settings: SettingsStore,
        author_id: i64,
    }

    impl Fixture {
        fn new() -> Self {
            let db = Database::open_in_memory().expect("open");
            schema::create_tables(&db).expect("schema");
            let author_id = {
                let conn = db.conn();
                conn.execute(
                    "INSERT INTO users (username, email, password_hash) VALUES ('desk', 'desk@example.com', 'x')",
                    [],
                )
                .expect("author");
                conn.last_insert_rowid()
            };
            Self {
                layout: LayoutStore::new(db.clone()),
                articles: ArticleStore::new(db.clone()),
                taxonomy: TaxonomyStore::new(db.clone()),
                settings: SettingsStore::new(db),
                author_id,
            }
        }

        fn section(&self, name: &str, layout_type: LayoutType, max: i64) -> i64 {
            self.layout
                .create_section(NewSectionInput {
                    name: name.to_string(),
                    slug: None,
                    layout_type,
                    max_articles: max,
                })
                .expect("section")
                .id
        }

        fn published(&self, title: &str) -> i64 {
            self.articles
                .create(NewArticleInput {
                    title: title.to_string(),
                    slug: None,
                    excerpt: None,
                    content: "body text".to_string(),
                    featured_image: None,
                    author_id: self.author_id,
                    category_id: None,
                    status: ArticleStatus::Published,
                    scheduled_at: None,
                    tags: Vec::new(),
                })
                .expect("article")
        }

        fn compose(&self) -> Homepage {
            compose(&self.layout, &self.articles, &self.taxonomy, &self.settings)
                .expect("compose")
        }
    }

    #[test]
    fn empty_sections_are_skipped() {
        let fx = Fixture::new();
        fx.section("Empty", LayoutType::Grid, 6);
        let filled = fx.section("Filled", LayoutType::Grid, 6);
        let article = fx.published("Only Story");
        fx.layout.assign(article, filled).expect("assign");

        let homepage = fx.compose();
        assert_eq!(homepage.sections.len(), 1);
        assert_eq!(homepage.sections[0].id, filled);
    }

    #[test]
    fn featured_layout_splits_lead_from_side_items() {
        let fx = Fixture::new();
        let section = fx.section("Front", LayoutType::Featured, 5);
        let ids: Vec<i64> = (0..3).map(|i| fx.published(&format!("Story {i}"))).collect();
        for id in &ids {
            fx.layout.assign(*id, section).expect("assign");
        }
        fx.layout.reorder_articles(section, &ids).expect("reorder");

        let homepage = fx.compose();
        match &homepage.sections[0].content {
            SectionContent::Featured { lead, side } => {
                assert_eq!(lead.id, ids[0]);
                assert_eq!(side.len(), 2);
            }
            other => panic!("expected featured content, got {other:?}"),
        }
    }

    #[test]
    fn sections_are_bounded_and_ordered_featured_first() {
        let fx = Fixture::new();
        let first = fx.section("First", LayoutType::Grid, 3);
        let second = fx.section("Second", LayoutType::List, 3);

        for section in [first, second] {
            let ids: Vec<i64> = (0..5)
                .map(|i| fx.published(&format!("S{section} article {i}")))
                .collect();
            for id in &ids {
                fx.layout.assign(*id, section).expect("assign");
            }
            fx.layout.reorder_articles(section, &ids).expect("reorder");
            // Highest positions get the flag; they must still surface first.
            fx.layout.toggle_featured(ids[4], section, true).expect("feature");
        }

        let homepage = fx.compose();
        assert_eq!(homepage.sections.len(), 2);
        for block in &homepage.sections {
            let articles = match &block.content {
                SectionContent::Grid { articles } | SectionContent::List { articles } => articles,
                other => panic!("unexpected shape {other:?}"),
            };
            assert_eq!(articles.len(), 3);
            assert!(articles[0].title.ends_with("article 4"));
        }
    }

    #[test]
    fn carousel_shares_the_flat_shape() {
        let fx = Fixture::new();
        let section = fx.section("Strip", LayoutType::Carousel, 6);
        let id = fx.published("Rolling");
        fx.layout.assign(id, section).expect("assign");

        let homepage = fx.compose();
        match &homepage.sections[0].content {
            SectionContent::Carousel { articles } => assert_eq!(articles.len(), 1),
            other => panic!("expected carousel, got {other:?}"),
        }
    }

    #[test]
    fn hero_and_trending_come_from_recent_published() {
        let fx = Fixture::new();
        for i in 0..7 {
            fx.published(&format!("Wire {i}"));
        }
        let homepage = fx.compose();
        assert!(homepage.hero.is_some());
        assert_eq!(homepage.trending.len(), 5);
    }

    #[test]
    fn site_meta_uses_settings_with_defaults() {
        let fx = Fixture::new();
        fx.settings
            .set("site_name", "Morning Post", SettingType::Text)
            .expect("set");
        let homepage = fx.compose();
        assert_eq!(homepage.site.name, "Morning Post");
        assert!(!homepage.site.description.is_empty());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_text("short", 150), "short");
        let long = "x".repeat(200);
        let cut = truncate_text(&long, 150);
        assert_eq!(cut.chars().count(), 153);
        assert!(cut.ends_with("..."));
        // Multibyte input must not split a char.
        let heavy = "日本語のテキスト".repeat(40);
        let _ = truncate_text(&heavy, 150);
    }
}
