//! Robots.txt parser
//!
//! Only the `Crawl-delay` directive is interpreted. Allow/Disallow rules are
//! read past without effect.

/// Parsed robots.txt data
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means no directives)
    content: String,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Creates an empty ParsedRobots with no directives
    ///
    /// Used when robots.txt cannot be fetched.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Gets the crawl delay for a specific user agent
    ///
    /// A group naming the agent (case-insensitive substring match on the
    /// product token) takes precedence over the `*` group.
    ///
    /// # Arguments
    ///
    /// * `user_agent` - The user agent product token, e.g. `site-insights`
    ///
    /// # Returns
    ///
    /// * `Some(f64)` - The crawl delay in seconds
    /// * `None` - If no applicable crawl delay is specified
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.content.is_empty() {
            return None;
        }

        let normalized_agent = user_agent.to_lowercase();

        let mut group_agents: Vec<String> = Vec::new();
        // A User-agent line after any other directive starts a new group
        let mut group_has_rules = false;
        let mut crawl_delay_for_wildcard: Option<f64> = None;
        let mut crawl_delay_for_agent: Option<f64> = None;

        for line in self.content.lines() {
            // Strip trailing comments
            let trimmed = line.split('#').next().unwrap_or("").trim();

            if trimmed.is_empty() {
                continue;
            }

            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if group_has_rules {
                        group_agents.clear();
                        group_has_rules = false;
                    }
                    group_agents.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    group_has_rules = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if !delay.is_finite() || delay < 0.0 {
                        continue;
                    }

                    let names_agent = group_agents
                        .iter()
                        .any(|ua| ua != "*" && !ua.is_empty() && normalized_agent.contains(ua.as_str()));
                    if names_agent {
                        crawl_delay_for_agent = Some(delay);
                    } else if group_agents.iter().any(|ua| ua == "*") {
                        crawl_delay_for_wildcard = Some(delay);
                    }
                }
                _ => {
                    group_has_rules = true;
                }
            }
        }

        // Prefer specific user-agent delay over wildcard delay
        crawl_delay_for_agent.or(crawl_delay_for_wildcard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_has_no_delay() {
        assert_eq!(ParsedRobots::empty().crawl_delay("site-insights"), None);
    }

    #[test]
    fn test_crawl_delay() {
        let content = "User-agent: *\nCrawl-delay: 2";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("site-insights"), Some(2.0));
    }

    #[test]
    fn test_crawl_delay_fractional() {
        let content = "User-agent: *\nCrawl-delay: 0.5\nDisallow: /admin";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("site-insights"), Some(0.5));
    }

    #[test]
    fn test_no_crawl_delay() {
        let content = "User-agent: *\nDisallow: /admin";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("site-insights"), None);
    }

    #[test]
    fn test_specific_agent_preferred_over_wildcard() {
        let content = "User-agent: *\nCrawl-delay: 10\n\nUser-agent: site-insights\nCrawl-delay: 1";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("site-insights"), Some(1.0));
        assert_eq!(robots.crawl_delay("other-bot"), Some(10.0));
    }

    #[test]
    fn test_other_agent_group_ignored() {
        let content = "User-agent: BadBot\nCrawl-delay: 30";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("site-insights"), None);
    }

    #[test]
    fn test_group_with_multiple_agents() {
        let content = "User-agent: foo\nUser-agent: site-insights\nDisallow: /x\nCrawl-delay: 4";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("site-insights"), Some(4.0));
    }

    #[test]
    fn test_new_group_after_rules() {
        let content = "User-agent: site-insights\nDisallow: /x\nUser-agent: *\nCrawl-delay: 3";
        let robots = ParsedRobots::from_content(content);
        // The delay belongs to the wildcard group only
        assert_eq!(robots.crawl_delay("site-insights"), Some(3.0));
        assert_eq!(robots.crawl_delay("another"), Some(3.0));
    }

    #[test]
    fn test_invalid_delay_ignored() {
        let content = "User-agent: *\nCrawl-delay: soon\n# comment\nCrawl-delay: -1";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("site-insights"), None);
    }

    #[test]
    fn test_case_insensitive_directives() {
        let content = "USER-AGENT: *\ncrawl-DELAY: 1.5 # be nice";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("site-insights"), Some(1.5));
    }
}
