//! Facade operations against the in-memory Afisha site.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use afisha_probe::mock::MockSession;
use afisha_probe::{
    ControlStrategy, Direction, FeedSection, MainPage, PageObject, ProbeError, ScenarioState,
    Seed, SeededRng, Viewport,
};
use common::{card_title, fast_config, landing_url, FakeAfisha, CARDS_PER_FEED, MAIN_FEEDS};
use std::sync::Arc;

async fn open_page(site: FakeAfisha) -> MainPage {
    let session = MockSession::new(site.build());
    let page = MainPage::new(Box::new(session), Arc::new(fast_config()));
    page.session().set_viewport(Viewport::default()).await.unwrap();
    page.open_baseline().await.unwrap();
    page
}

#[tokio::test]
async fn test_open_lands_on_city_page() {
    let page = open_page(FakeAfisha::new()).await;
    let url = page.session().current_url().await.unwrap();
    assert_eq!(url, landing_url());
    assert!(page.is_current(&url));
    assert_eq!(page.state(), ScenarioState::PageLoaded);
}

#[tokio::test]
async fn test_operations_rejected_before_open() {
    let session = MockSession::new(FakeAfisha::new().build());
    let page = MainPage::new(Box::new(session), Arc::new(fast_config()));
    let err = page.feed_titles().await.unwrap_err();
    assert!(matches!(err, ProbeError::InvalidState { .. }));
}

#[tokio::test]
async fn test_feed_titles_are_normalized() {
    let page = open_page(FakeAfisha::new()).await;
    let titles = page.feed_titles().await.unwrap();
    let expected: Vec<String> = MAIN_FEEDS
        .iter()
        .map(|(title, _)| title.replace('\u{a0}', " "))
        .collect();
    assert_eq!(titles, expected);
}

#[tokio::test]
async fn test_feed_titles_empty_without_feeds() {
    let page = open_page(FakeAfisha::new().without_main_feeds()).await;
    assert!(page.feed_titles().await.unwrap().is_empty());
    assert_eq!(page.state(), ScenarioState::StateCaptured);
}

#[tokio::test]
async fn test_every_feed_navigation_checked() {
    let page = open_page(FakeAfisha::new()).await;
    let titles = page.feed_titles().await.unwrap();
    let checked = page.check_all_feed_navigations(&titles).await.unwrap();
    assert_eq!(checked, MAIN_FEEDS.len());
    assert_eq!(page.session().current_url().await.unwrap(), landing_url());
    assert_eq!(page.state(), ScenarioState::Asserted);
}

#[tokio::test]
async fn test_top_block_strategy_follows_controls() {
    let page = open_page(FakeAfisha::new()).await;
    page.scroll_to_top_block().await.unwrap();
    let strategy = page.scroll_top_block(Direction::Right).await.unwrap();
    assert_eq!(strategy, ControlStrategy::DirectControl);

    let page = open_page(FakeAfisha::new().without_top_controls()).await;
    page.scroll_to_top_block().await.unwrap();
    let before = page.top_card_positions().await.unwrap();
    let strategy = page.scroll_top_block(Direction::Right).await.unwrap();
    let after = page.top_card_positions().await.unwrap();
    assert_eq!(strategy, ControlStrategy::KeyboardFallback);
    page.compare_top_card_positions(&before, &after, Direction::Right)
        .unwrap();
}

#[tokio::test]
async fn test_random_card_visit_returns_feed_title() {
    let page = open_page(FakeAfisha::new()).await;
    let mut rng = SeededRng::new(Seed(7));
    let title = page
        .click_random_card_in_feed(&FeedSection::from("Театр"), &mut rng)
        .await
        .unwrap();
    let candidates: Vec<String> = (1..=3).map(|n| card_title("Театр", n)).collect();
    assert!(candidates.contains(&title), "{title}");
    assert!(page
        .session()
        .current_url()
        .await
        .unwrap()
        .contains("/moscow/theatre/theatre-event-"));
}

#[tokio::test]
async fn test_sample_and_revisit_is_seeded() {
    let titles: Vec<String> = MAIN_FEEDS
        .iter()
        .take(3)
        .map(|(title, _)| (*title).to_string())
        .collect();

    let mut visits = Vec::new();
    for _ in 0..2 {
        let page = open_page(FakeAfisha::new()).await;
        let mut rng = SeededRng::new(Seed(42));
        visits.push(page.sample_and_revisit(&titles, &mut rng).await.unwrap());
    }
    assert_eq!(visits[0], visits[1]);
    assert_eq!(visits[0].len(), 3);
}

#[tokio::test]
async fn test_viewed_block_lists_visits() {
    let page = open_page(FakeAfisha::new()).await;
    let titles = vec!["Концерты".to_string(), "Выставки".to_string()];
    let mut rng = SeededRng::new(Seed(3));
    let visited = page.sample_and_revisit(&titles, &mut rng).await.unwrap();
    page.open_baseline().await.unwrap();

    let viewed = page.viewed_event_titles().await.unwrap();
    assert_eq!(viewed.len(), 2);
    page.assert_viewed_events_match(&visited).await.unwrap();

    let missing = vec![card_title("Спорт", CARDS_PER_FEED)];
    let err = page.assert_viewed_events_match(&missing).await.unwrap_err();
    assert!(matches!(err, ProbeError::AssertionFailure { .. }));
}

#[tokio::test]
async fn test_calendar_and_banner_move() {
    let page = open_page(FakeAfisha::new()).await;
    let before = page.visible_calendar_days().await.unwrap();
    page.scroll_calendar(Direction::Right).await.unwrap();
    let after = page.visible_calendar_days().await.unwrap();
    assert_ne!(before.leading(), after.leading());
    page.assert_calendar_days_changed(&before, &after).unwrap();

    let before = page.banner_position().await.unwrap();
    assert_eq!(before, "none");
    page.scroll_banner(Direction::Right).await.unwrap();
    let after = page.banner_position().await.unwrap();
    page.assert_banner_position_changed(&before, &after).unwrap();
}
