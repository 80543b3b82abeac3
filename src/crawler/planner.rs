//! Page planning: splits the identifier space into the wiki's list pages

use serde::Serialize;

/// One list page on the wiki, covering `[start, end]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourcePage {
    /// First identifier listed on the page
    pub start: u32,

    /// Last identifier the page may list; can exceed the run's max id
    pub end: u32,

    /// Fully built URL of the page
    pub url: String,
}

/// Which list pages carry the servant tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Listing {
    /// `Servant_List_by_ID` and its windowed `Sub:` pages
    #[default]
    ById,
    /// The single `Servant_List` page holding every servant
    ServantList,
}

/// Offsets `1, 1+window, 1+2*window, ...` up to and including `max_id`
pub fn window_offsets(max_id: u32, window: u32) -> Vec<u32> {
    if window == 0 {
        return Vec::new();
    }
    (1..=max_id).step_by(window as usize).collect()
}

/// Computes the ordered pages of a run
#[derive(Debug, Clone)]
pub struct PagePlanner {
    base_url: String,
    window: u32,
}

impl PagePlanner {
    pub fn new(base_url: impl Into<String>, window: u32) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, window }
    }

    /// URL of the page starting at `start`
    ///
    /// The first window lives on the main list page, later ones on
    /// `Sub:` pages named after their range.
    pub fn page_url(&self, start: u32) -> String {
        if start <= 1 {
            format!("{}/Servant_List_by_ID", self.base_url)
        } else {
            format!(
                "{}/Sub:Servant_List_by_ID/{}-{}",
                self.base_url,
                start,
                self.window_end(start)
            )
        }
    }

    /// Pages to visit for identifiers `1..=max_id`, in order
    pub fn plan(&self, max_id: u32) -> Vec<SourcePage> {
        window_offsets(max_id, self.window)
            .into_iter()
            .map(|start| SourcePage {
                start,
                end: self.window_end(start),
                url: self.page_url(start),
            })
            .collect()
    }

    /// Pages to visit for identifiers `1..=max_id` under `listing`
    ///
    /// `Servant_List` is one page whatever the window size.
    pub fn plan_listing(&self, listing: Listing, max_id: u32) -> Vec<SourcePage> {
        match listing {
            Listing::ById => self.plan(max_id),
            Listing::ServantList if max_id == 0 => Vec::new(),
            Listing::ServantList => vec![SourcePage {
                start: 1,
                end: max_id,
                url: format!("{}/Servant_List", self.base_url),
            }],
        }
    }

    fn window_end(&self, start: u32) -> u32 {
        start.saturating_add(self.window.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_for_428() {
        assert_eq!(window_offsets(428, 100), vec![1, 101, 201, 301, 401]);
    }

    #[test]
    fn test_offsets_edge_cases() {
        assert!(window_offsets(0, 100).is_empty());
        assert!(window_offsets(50, 0).is_empty());
        assert_eq!(window_offsets(100, 100), vec![1]);
        assert_eq!(window_offsets(101, 100), vec![1, 101]);
    }

    #[test]
    fn test_plan_urls() {
        let planner = PagePlanner::new("https://fategrandorder.fandom.com/wiki/", 100);
        let pages = planner.plan(428);

        assert_eq!(pages.len(), 5);
        assert_eq!(
            pages[0].url,
            "https://fategrandorder.fandom.com/wiki/Servant_List_by_ID"
        );
        assert_eq!(
            pages[1].url,
            "https://fategrandorder.fandom.com/wiki/Sub:Servant_List_by_ID/101-200"
        );
        // last window runs past max_id; the extractor trims it
        assert_eq!(pages[4].start, 401);
        assert_eq!(pages[4].end, 500);
        assert!(pages[4].url.ends_with("/401-500"));
    }

    #[test]
    fn test_servant_list_is_one_page() {
        let planner = PagePlanner::new("https://fategrandorder.fandom.com/wiki", 100);
        let pages = planner.plan_listing(Listing::ServantList, 428);

        assert_eq!(
            pages,
            vec![SourcePage {
                start: 1,
                end: 428,
                url: "https://fategrandorder.fandom.com/wiki/Servant_List".to_string(),
            }]
        );
        assert!(planner.plan_listing(Listing::ServantList, 0).is_empty());
        assert_eq!(planner.plan_listing(Listing::ById, 428), planner.plan(428));
    }
}
