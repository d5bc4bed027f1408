//! Best-of-source selection and slot assignment.

use crate::engagement::score;
use crate::models::{Source, Story, TopStory};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Keep the highest-scoring story of every source.
///
/// A later story only replaces the current best on a strictly greater score,
/// so among equal scores the first one encountered wins. Output follows the
/// order in which each source first appears.
#[instrument(level = "debug", skip_all, fields(count = stories.len()))]
pub fn select_top_per_source(stories: &[Story]) -> Vec<Story> {
    let (_, best) = stories.iter().fold(
        (HashMap::<Source, usize>::new(), Vec::<(&Story, f64)>::new()),
        |(mut slots, mut best), story| {
            let candidate = score(&story.engagement);
            match slots.get(&story.source) {
                Some(&i) => {
                    if candidate > best[i].1 {
                        best[i] = (story, candidate);
                    }
                }
                None => {
                    slots.insert(story.source, best.len());
                    best.push((story, candidate));
                }
            }
            (slots, best)
        },
    );

    for (story, s) in &best {
        debug!(source = %story.source, score = s, title = %story.title, "Selected top story");
    }
    best.into_iter().map(|(story, _)| story.clone()).collect()
}

/// Attach one shared publication slot to every selected story.
pub fn schedule_top_stories(stories: Vec<Story>, slot: &str) -> Vec<TopStory> {
    stories
        .into_iter()
        .map(|story| TopStory::new(story, slot))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Engagement;

    fn story(source: Source, title: &str, likes: u32, shares: u32, comments: u32) -> Story {
        Story {
            source,
            title: title.to_string(),
            subhead: None,
            url: format!("https://example.com/{}", title),
            engagement: Engagement::new(likes, shares, comments),
        }
    }

    #[test]
    fn test_higher_score_wins() {
        let stories = vec![
            story(Source::Cnbc, "first", 10, 0, 0),
            story(Source::Cnbc, "second", 5, 10, 10),
        ];
        let top = select_top_per_source(&stories);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].title, "second");
    }

    #[test]
    fn test_first_wins_on_tie() {
        let stories = vec![
            story(Source::Bloomberg, "low", 1, 0, 0),
            story(Source::Bloomberg, "first-max", 0, 0, 10),
            story(Source::Bloomberg, "second-max", 20, 0, 0),
            story(Source::Bloomberg, "third-max", 5, 10, 0),
        ];
        let top = select_top_per_source(&stories);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].title, "first-max");
    }

    #[test]
    fn test_one_per_source_in_first_seen_order() {
        let stories = vec![
            story(Source::YahooNews, "y1", 100, 0, 0),
            story(Source::Cnbc, "c1", 1, 0, 0),
            story(Source::YahooNews, "y2", 200, 0, 0),
            story(Source::Cnbc, "c2", 300, 0, 0),
            story(Source::FinancialTimes, "f1", 0, 0, 0),
        ];
        let top = select_top_per_source(&stories);
        let picked: Vec<_> = top.iter().map(|s| (s.source, s.title.as_str())).collect();
        assert_eq!(
            picked,
            vec![
                (Source::YahooNews, "y2"),
                (Source::Cnbc, "c2"),
                (Source::FinancialTimes, "f1"),
            ]
        );

        for chosen in &top {
            let best = score(&chosen.engagement);
            assert!(
                stories
                    .iter()
                    .filter(|s| s.source == chosen.source)
                    .all(|s| score(&s.engagement) <= best)
            );
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(select_top_per_source(&[]).is_empty());
    }

    #[test]
    fn test_schedule_shares_one_slot() {
        let stories = vec![
            story(Source::Cnbc, "a", 1, 1, 1),
            story(Source::Bloomberg, "b", 2, 2, 2),
        ];
        let top = schedule_top_stories(stories.clone(), "2025-05-06 08:30");
        assert_eq!(top.len(), 2);
        assert!(
            top.iter()
                .all(|t| t.scheduled_time.as_deref() == Some("2025-05-06 08:30"))
        );
        assert_eq!(top[1].story, stories[1]);
    }
}
