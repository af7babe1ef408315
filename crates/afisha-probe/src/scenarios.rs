//! Scenario catalogue of the city landing page.
//!
//! Every scenario starts on the baseline page at the configured viewport.

use crate::carousel::Direction;
use crate::harness::{Scenario, ScenarioContext, ScenarioFuture};
use crate::main_page::{random_titles, FeedSection};
use std::time::Duration;

/// Header navigation labels in display order
pub const HEADER_NAVIGATION_ITEMS: [&str; 9] = [
    "Сертификаты",
    "Концерты",
    "Театр",
    "Детям",
    "Спорт",
    "Стендап",
    "Катки",
    "Выставки",
    "ЕщёКиноПушкинская картаСкидкиЭкскурсииШоуКвестыМюзиклы",
];

/// Cards the top block shows
pub const TOP_BLOCK_CARDS: usize = 10;
/// Cards per feed row
pub const FEED_COLUMNS: u32 = 3;
/// Leading cards checked in every feed
pub const CARDS_CHECKED_PER_FEED: usize = 3;
/// Feeds sampled for the "recently viewed" check
pub const VIEWED_FEEDS: usize = 5;

const LONG_SCENARIO: Duration = Duration::from_secs(60);

fn header_navigation_items(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        for (index, label) in HEADER_NAVIGATION_ITEMS.iter().enumerate() {
            ctx.page.assert_header_navigation(label, index).await?;
        }
        Ok(())
    })
}

fn header_navigation_hover(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        for label in HEADER_NAVIGATION_ITEMS {
            ctx.page.assert_navigation_hover_effect(label).await?;
        }
        Ok(())
    })
}

fn calendar_scrolls_right(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let page = &ctx.page;
        let before = page.visible_calendar_days().await?;
        page.scroll_calendar(Direction::Right).await?;
        let after = page.visible_calendar_days().await?;
        page.assert_calendar_days_changed(&before, &after)
    })
}

fn calendar_scrolls_left(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let page = &ctx.page;
        page.scroll_calendar(Direction::Right).await?;
        let before = page.visible_calendar_days().await?;
        page.scroll_calendar(Direction::Left).await?;
        let after = page.visible_calendar_days().await?;
        page.assert_calendar_days_changed(&before, &after)
    })
}

async fn banner_scrolls(ctx: &ScenarioContext, direction: Direction) -> crate::ProbeResult<()> {
    let page = &ctx.page;
    let before = page.banner_position().await?;
    page.scroll_banner(direction).await?;
    let after = page.banner_position().await?;
    page.assert_banner_position_changed(&before, &after)
}

fn banner_scrolls_right(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(banner_scrolls(ctx, Direction::Right))
}

fn banner_scrolls_left(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(banner_scrolls(ctx, Direction::Left))
}

fn upcoming_title_hover(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let section = FeedSection::Upcoming;
        ctx.page.scroll_to_feed(&section).await?;
        ctx.page.assert_feed_title_hover_color(&section).await
    })
}

fn upcoming_cards_layout(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let section = FeedSection::Upcoming;
        ctx.page.scroll_to_feed(&section).await?;
        ctx.page.assert_feed_cards_layout(&section, FEED_COLUMNS).await
    })
}

fn upcoming_cards_elements(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let section = FeedSection::Upcoming;
        ctx.page.scroll_to_feed(&section).await?;
        for index in 0..CARDS_CHECKED_PER_FEED {
            ctx.page.assert_event_card_elements(&section, index).await?;
        }
        Ok(())
    })
}

fn top_block_card_count(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        ctx.page.scroll_to_top_block().await?;
        ctx.page.assert_top_block_cards_count(TOP_BLOCK_CARDS).await
    })
}

fn top_block_scrolls_right(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let page = &ctx.page;
        page.scroll_to_top_block().await?;
        let before = page.top_card_positions().await?;
        page.scroll_top_block(Direction::Right).await?;
        let after = page.top_card_positions().await?;
        page.compare_top_card_positions(&before, &after, Direction::Right)
    })
}

fn top_block_scrolls_left(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let page = &ctx.page;
        page.scroll_to_top_block().await?;
        page.scroll_top_block(Direction::Right).await?;
        let before = page.top_card_positions().await?;
        page.scroll_top_block(Direction::Left).await?;
        let after = page.top_card_positions().await?;
        page.compare_top_card_positions(&before, &after, Direction::Left)
    })
}

fn top_block_cards_elements(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        ctx.page.scroll_to_top_block().await?;
        ctx.page.assert_all_top_cards_have_elements().await
    })
}

fn main_feed_cards_layout(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        for title in ctx.page.feed_titles().await? {
            let section = FeedSection::Titled(title);
            ctx.page.scroll_to_feed(&section).await?;
            ctx.page.assert_feed_cards_layout(&section, FEED_COLUMNS).await?;
        }
        Ok(())
    })
}

fn main_feed_cards_elements(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        for title in ctx.page.feed_titles().await? {
            let section = FeedSection::Titled(title);
            ctx.page.scroll_to_feed(&section).await?;
            for index in 0..CARDS_CHECKED_PER_FEED {
                ctx.page.assert_event_card_elements(&section, index).await?;
            }
        }
        Ok(())
    })
}

fn main_feed_navigation(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let titles = ctx.page.feed_titles().await?;
        ctx.page.check_all_feed_navigations(&titles).await.map(|_| ())
    })
}

fn viewed_block_matches_visits(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let ScenarioContext { page, rng } = ctx;
        let titles = page.feed_titles().await?;
        let picked = random_titles(&titles, VIEWED_FEEDS, rng);
        let visited = page.sample_and_revisit(&picked, rng).await?;
        page.open_baseline().await?;
        page.assert_viewed_events_match(&visited).await
    })
}

/// Every scenario of the landing page suite, in catalogue order
#[must_use]
pub fn main_page_suite() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "header_navigation_items",
            "Наличие всех основных элементов навигации",
            header_navigation_items,
        ),
        Scenario::new(
            "header_navigation_hover",
            "Элементы навигации окрашиваются в серый цвет при наведении",
            header_navigation_hover,
        ),
        Scenario::new(
            "calendar_scrolls_right",
            "Календарь скроллится вправо",
            calendar_scrolls_right,
        ),
        Scenario::new(
            "calendar_scrolls_left",
            "Календарь скроллится влево",
            calendar_scrolls_left,
        ),
        Scenario::new(
            "banner_scrolls_right",
            "Баннер скроллится вправо",
            banner_scrolls_right,
        ),
        Scenario::new(
            "banner_scrolls_left",
            "Баннер скроллится влево",
            banner_scrolls_left,
        ),
        Scenario::new(
            "upcoming_title_hover",
            "Заголовок \"События в ближайшие дни\" окрашивается в красный при наведении",
            upcoming_title_hover,
        ),
        Scenario::new(
            "upcoming_cards_layout",
            "Карточки в \"События в ближайшие дни\" расположены 3 в ряд",
            upcoming_cards_layout,
        ),
        Scenario::new(
            "upcoming_cards_elements",
            "Карточки из \"События в ближайшие дни\" содержат все элементы",
            upcoming_cards_elements,
        ),
        Scenario::new(
            "top_block_card_count",
            "Блок \"Топ\" содержит 10 карточек",
            top_block_card_count,
        ),
        Scenario::new(
            "top_block_scrolls_right",
            "Подборка \"Топ\" скроллится вправо",
            top_block_scrolls_right,
        ),
        Scenario::new(
            "top_block_scrolls_left",
            "Подборка \"Топ\" скроллится влево",
            top_block_scrolls_left,
        ),
        Scenario::new(
            "top_block_cards_elements",
            "Карточки Блока \"Топ\" содержат элементы",
            top_block_cards_elements,
        ),
        Scenario::new(
            "main_feed_cards_layout",
            "Карточки в основном фиде расположены 3 в ряд",
            main_feed_cards_layout,
        ),
        Scenario::new(
            "main_feed_cards_elements",
            "Карточки из основного фида содержат все элементы",
            main_feed_cards_elements,
        )
        .with_timeout(LONG_SCENARIO),
        Scenario::new(
            "main_feed_navigation",
            "Контент в табах основного фида соответствуют названию заголовка",
            main_feed_navigation,
        )
        .with_timeout(LONG_SCENARIO),
        Scenario::new(
            "viewed_block_matches_visits",
            "Блок \"Вы смотрели\" соответствуют просмотренным карточкам",
            viewed_block_matches_visits,
        )
        .with_timeout(LONG_SCENARIO),
    ]
}

/// Scenarios whose name contains `filter`, all of them without one
#[must_use]
pub fn select(suite: &[Scenario], filter: Option<&str>) -> Vec<Scenario> {
    suite
        .iter()
        .filter(|s| filter.map_or(true, |f| s.name.contains(f)))
        .copied()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    mod catalogue_tests {
        use super::*;

        #[test]
        fn test_catalogue_shape() {
            let suite = main_page_suite();
            assert_eq!(suite.len(), 17);
            let names: HashSet<_> = suite.iter().map(|s| s.name).collect();
            assert_eq!(names.len(), 17);
            assert!(suite
                .iter()
                .all(|s| s.name.chars().all(|c| c.is_ascii_lowercase() || c == '_')));
        }

        #[test]
        fn test_long_scenarios() {
            let long: Vec<_> = main_page_suite()
                .into_iter()
                .filter(|s| s.timeout == Some(LONG_SCENARIO))
                .map(|s| s.name)
                .collect();
            assert_eq!(
                long,
                vec![
                    "main_feed_cards_elements",
                    "main_feed_navigation",
                    "viewed_block_matches_visits"
                ]
            );
        }

        #[test]
        fn test_select() {
            let suite = main_page_suite();
            assert_eq!(select(&suite, None).len(), 17);
            let top: Vec<_> = select(&suite, Some("top_block")).iter().map(|s| s.name).collect();
            assert_eq!(top.len(), 4);
            assert!(select(&suite, Some("nothing")).is_empty());
        }
    }
}
