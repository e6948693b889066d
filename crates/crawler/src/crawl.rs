//! Breadth-first same-site crawl

use crate::error::{CrawlerError, Result};
use crate::fetch::PageSource;
use crate::settings::CrawlSettings;
use crate::urls::{has_skip_prefix, is_crawlable, normalize, site_of, title_of};
use futures::future::join_all;
use linkrank_engine::Graph;
use scraper::{Html, Selector};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

const LINK_SELECTOR: &str = "a[href]";

/// Everything gathered by one crawl
#[derive(Debug)]
pub struct CrawlOutcome {
    pub graph: Graph,
    pub titles: BTreeMap<String, String>,
    pub elapsed: Duration,
}

/// Distinct crawlable links of a page, in discovery order
pub fn extract_links(html: &str, base: &Url, site: &str, selector: &Selector) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(selector) {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty() || has_skip_prefix(href) {
            continue;
        }

        let Ok(absolute) = base.join(href) else {
            continue;
        };
        let link = normalize(&absolute);
        if is_crawlable(&link, site) && seen.insert(link.clone()) {
            links.push(link);
        }
    }

    links
}

/// Crawl from the seed, reporting one progress line per page
pub async fn crawl<S, F>(source: &S, settings: &CrawlSettings, mut progress: F) -> Result<CrawlOutcome>
where
    S: PageSource,
    F: FnMut(String),
{
    let started = Instant::now();
    let selector = Selector::parse(LINK_SELECTOR).map_err(|e| CrawlerError::Selector {
        selector: LINK_SELECTOR.to_string(),
        message: e.to_string(),
    })?;

    let seed = Url::parse(&settings.start_url).map_err(|e| CrawlerError::InvalidSetting {
        name: "START_URL",
        reason: e.to_string(),
    })?;
    let site = site_of(seed.host_str().unwrap_or_default());
    let keyword = settings.keyword();
    let max_pages = settings.max_pages;

    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(String, usize)> = VecDeque::from([(normalize(&seed), 0)]);
    let mut graph = Graph::new();
    let mut titles = BTreeMap::new();

    while !queue.is_empty() && visited.len() < max_pages {
        let mut batch: Vec<(String, usize)> = Vec::new();
        while batch.len() < settings.concurrency && visited.len() + batch.len() < max_pages {
            let Some((url, depth)) = queue.pop_front() else {
                break;
            };
            if depth > settings.max_depth
                || visited.contains(&url)
                || batch.iter().any(|(queued, _)| *queued == url)
            {
                continue;
            }
            batch.push((url, depth));
        }

        if batch.is_empty() {
            continue;
        }

        let bodies = join_all(batch.iter().map(|(url, _)| source.fetch(url))).await;

        for ((url, depth), body) in batch.into_iter().zip(bodies) {
            visited.insert(url.clone());
            let title = title_of(&url);
            titles.insert(url.clone(), title.clone());
            graph.insert(url.clone(), Vec::new());

            let Some(html) = body else {
                debug!(url = %url, "No usable HTML");
                continue;
            };

            if let Some(keyword) = &keyword {
                if !html.to_lowercase().contains(keyword.as_str())
                    && !url.to_lowercase().contains(keyword.as_str())
                {
                    progress(format!("[{}/{}] SKIP (no keyword): {}", visited.len(), max_pages, title));
                    continue;
                }
            }

            progress(format!("[{}/{}] {}", visited.len(), max_pages, title));

            // Page url was normalized from a parsed Url, so it parses again
            let Ok(base) = Url::parse(&url) else {
                continue;
            };
            let links = extract_links(&html, &base, &site, &selector);
            for link in &links {
                titles.insert(link.clone(), title_of(link));
                if !visited.contains(link) {
                    queue.push_back((link.clone(), depth + 1));
                }
            }
            graph.insert(url, links);
        }

        if !settings.delay().is_zero() {
            tokio::time::sleep(settings.delay()).await;
        }
    }

    Ok(CrawlOutcome {
        graph,
        titles,
        elapsed: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory site keyed by normalized URL
    struct FakeSite {
        pages: HashMap<String, String>,
        fetched: RefCell<Vec<String>>,
    }

    impl FakeSite {
        fn new(pages: Vec<(&str, String)>) -> Self {
            Self {
                pages: pages
                    .into_iter()
                    .map(|(url, html)| (url.to_string(), html))
                    .collect(),
                fetched: RefCell::new(Vec::new()),
            }
        }
    }

    impl PageSource for FakeSite {
        async fn fetch(&self, url: &str) -> Option<String> {
            self.fetched.borrow_mut().push(url.to_string());
            self.pages.get(url).cloned()
        }
    }

    fn settings(pairs: &[(&str, &str)]) -> CrawlSettings {
        let mut vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        vars.entry("CRAWL_DELAY".to_string()).or_insert_with(|| "0".to_string());
        vars.entry("START_URL".to_string())
            .or_insert_with(|| "https://site.example/".to_string());
        CrawlSettings::from_vars(vars).unwrap()
    }

    fn page(links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|href| format!(r#"<a href="{}">link</a>"#, href))
            .collect();
        format!("<html><body>{}</body></html>", anchors)
    }

    #[test]
    fn test_extract_links() {
        let selector = Selector::parse(LINK_SELECTOR).unwrap();
        let base = Url::parse("https://www.site.example/docs/").unwrap();
        let html = page(&[
            "intro",
            "/about/",
            "https://site.example/about?ref=nav",
            "#top",
            "mailto:a@site.example",
            "https://elsewhere.example/",
            "/files/report.pdf",
            "",
        ]);

        let links = extract_links(&html, &base, "site.example", &selector);
        assert_eq!(
            links,
            vec![
                "https://www.site.example/docs/intro",
                "https://www.site.example/about",
                "https://site.example/about",
            ]
        );
    }

    #[tokio::test]
    async fn test_crawl_builds_graph() {
        let site = FakeSite::new(vec![
            ("https://site.example/", page(&["/a", "/b"])),
            ("https://site.example/a", page(&["/b", "/"])),
            ("https://site.example/b", page(&[])),
        ]);
        let mut lines = Vec::new();

        let outcome = crawl(&site, &settings(&[]), |line| lines.push(line)).await.unwrap();

        let keys: Vec<&str> = outcome.graph.keys().collect();
        assert_eq!(
            keys,
            vec!["https://site.example/", "https://site.example/a", "https://site.example/b"]
        );
        assert_eq!(
            outcome.graph.neighbors("https://site.example/a").unwrap(),
            &["https://site.example/b".to_string(), "https://site.example/".to_string()]
        );
        assert_eq!(lines[0], "[1/50] site.example");
        assert_eq!(lines.len(), 3);
        assert_eq!(outcome.titles["https://site.example/b"], "B");
    }

    #[tokio::test]
    async fn test_page_budget_is_respected() {
        let site = FakeSite::new(vec![(
            "https://site.example/",
            page(&["/1", "/2", "/3", "/4", "/5", "/6"]),
        )]);

        let outcome = crawl(&site, &settings(&[("MAX_PAGES", "3")]), |_| {}).await.unwrap();

        assert_eq!(outcome.graph.key_count(), 3);
        assert_eq!(site.fetched.borrow().len(), 3);
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let site = FakeSite::new(vec![
            ("https://site.example/", page(&["/one"])),
            ("https://site.example/one", page(&["/two"])),
            ("https://site.example/two", page(&["/three"])),
        ]);

        let outcome = crawl(&site, &settings(&[("MAX_DEPTH", "1")]), |_| {}).await.unwrap();

        assert!(outcome.graph.contains_key("https://site.example/one"));
        assert!(!outcome.graph.contains_key("https://site.example/two"));
        // Depth-2 link is still recorded as a neighbor
        assert_eq!(
            outcome.graph.neighbors("https://site.example/one").unwrap(),
            &["https://site.example/two".to_string()]
        );
    }

    #[tokio::test]
    async fn test_keyword_filter_drops_links() {
        let site = FakeSite::new(vec![
            ("https://site.example/", format!("research {}", page(&["/lab", "/shop"]))),
            ("https://site.example/lab", page(&["/"])),
            ("https://site.example/shop", page(&["/lab"])),
        ]);
        let mut lines = Vec::new();

        let outcome = crawl(
            &site,
            &settings(&[("KEYWORD_FILTER", "Research")]),
            |line| lines.push(line),
        )
        .await
        .unwrap();

        assert_eq!(outcome.graph.neighbors("https://site.example/").unwrap().len(), 2);
        assert!(outcome.graph.neighbors("https://site.example/lab").unwrap().is_empty());
        assert!(lines.iter().any(|l| l.ends_with("SKIP (no keyword): Lab")));
    }

    #[tokio::test]
    async fn test_unfetchable_page_is_a_leaf() {
        let site = FakeSite::new(vec![("https://site.example/", page(&["/missing"]))]);

        let outcome = crawl(&site, &settings(&[]), |_| {}).await.unwrap();

        assert_eq!(outcome.graph.key_count(), 2);
        assert!(outcome
            .graph
            .neighbors("https://site.example/missing")
            .unwrap()
            .is_empty());
    }
}
