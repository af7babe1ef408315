//! Fake Afisha site shared by the integration tests.
//!
//! The landing page mirrors the structure the registry targets: header
//! navigation, calendar, banner slider, the upcoming feed, the top block,
//! the main feed and the "recently viewed" block, which is rendered from
//! the detail pages visited earlier in the session.

#![allow(dead_code)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use afisha_probe::mock::{MockAction, MockDocument, MockElement, MockSessionFactory, MockSite};
use afisha_probe::scenarios::HEADER_NAVIGATION_ITEMS;
use afisha_probe::{
    BoundingBox, ElementId, Key, ProbeConfig, ScenarioRunner, SettleMode, CALENDAR_DAY_ATTRIBUTE,
    CALENDAR_MONTH_ATTRIBUTE, VIEWED_BLOCK_HEADING,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const BASE: &str = "https://afisha.test";
pub const CITY: &str = "moscow";
pub const UPCOMING_TITLE: &str = "События в ближайшие дни";

/// Main feed titles with their rubric slug. One title carries a
/// non-breaking space, as the live page does.
pub const MAIN_FEEDS: [(&str, &str); 6] = [
    ("Концерты", "concert"),
    ("Театр", "theatre"),
    ("Детям", "kids"),
    ("Стендап\u{a0}и юмор", "standup"),
    ("Выставки", "art"),
    ("Спорт", "sport"),
];

pub const CARDS_PER_FEED: usize = 4;
pub const TOP_CARDS: usize = 10;

const CALENDAR_DAYS: u32 = 40;
const DAY_STEP: f64 = 70.0;
const DAYS_PER_CLICK: f64 = 6.0;
const TOP_CARD_STEP: f64 = 300.0;
const BANNER_STEP: f64 = 1920.0;
const GREY: &str = "rgb(242, 242, 242)";
const TRANSPARENT: &str = "rgba(0, 0, 0, 0)";

/// Landing page variations
#[derive(Debug, Clone)]
pub struct FakeAfisha {
    navigation: Vec<String>,
    feeds: Vec<(String, String)>,
    top_controls: bool,
    banner_controls: bool,
    viewed_block: bool,
    columns: u32,
    hover_highlight: bool,
}

impl Default for FakeAfisha {
    fn default() -> Self {
        Self {
            navigation: HEADER_NAVIGATION_ITEMS.iter().map(|s| (*s).to_string()).collect(),
            feeds: MAIN_FEEDS
                .iter()
                .map(|(title, rubric)| ((*title).to_string(), (*rubric).to_string()))
                .collect(),
            top_controls: true,
            banner_controls: true,
            viewed_block: true,
            columns: 3,
            hover_highlight: true,
        }
    }
}

impl FakeAfisha {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top block reacts to arrow keys only
    pub fn without_top_controls(mut self) -> Self {
        self.top_controls = false;
        self
    }

    pub fn without_banner_controls(mut self) -> Self {
        self.banner_controls = false;
        self
    }

    pub fn without_viewed_block(mut self) -> Self {
        self.viewed_block = false;
        self
    }

    pub fn without_main_feeds(mut self) -> Self {
        self.feeds.clear();
        self
    }

    pub fn with_navigation(mut self, labels: &[&str]) -> Self {
        self.navigation = labels.iter().map(|s| (*s).to_string()).collect();
        self
    }

    pub fn with_columns(mut self, columns: u32) -> Self {
        self.columns = columns;
        self
    }

    /// Navigation items keep their background on hover
    pub fn without_hover_highlight(mut self) -> Self {
        self.hover_highlight = false;
        self
    }

    /// Every page of the site, shared between sessions
    pub fn build(self) -> Arc<MockSite> {
        let mut site = MockSite::new();
        let mut details = BTreeMap::new();

        let mut sections = vec![(UPCOMING_TITLE.to_string(), "soon".to_string())];
        sections.extend(self.feeds.iter().cloned());
        for (title, rubric) in &sections {
            site = site.with_static_page(
                url(&selection_path(rubric)),
                MockElement::new("body").child(
                    MockElement::new("h1")
                        .test_id("selectionPage.selectionPageHeader.title")
                        .text(format!("{}: подборка", title.replace('\u{a0}', " "))),
                ),
            );
            for n in 1..=CARDS_PER_FEED {
                let detail = url(&detail_path(rubric, n));
                let event = card_title(title, n);
                site = site.with_static_page(
                    detail.clone(),
                    MockElement::new("body")
                        .child(MockElement::new("h1").test_id("eventHeader.title").text(event.clone())),
                );
                details.insert(detail, event);
            }
        }

        let landing = Arc::new(self);
        site.with_page(url(&format!("/{CITY}")), move |history| {
            let viewed: Vec<&String> = history.iter().filter_map(|u| details.get(u)).collect();
            landing.render(&viewed)
        })
        .into_shared()
    }

    fn render(&self, viewed: &[&String]) -> MockDocument {
        let mut body = MockElement::new("body")
            .bbox(BoundingBox::new(0.0, 0.0, 1920.0, 6000.0))
            .child(self.header())
            .child(calendar())
            .child(self.banner())
            .child(feed_section(UPCOMING_TITLE, "soon", self.columns))
            .child(self.top_block())
            .child(
                MockElement::new("div")
                    .class("vM97Px")
                    .class("tj15kA")
                    .children(
                        self.feeds
                            .iter()
                            .map(|(title, rubric)| feed_section(title, rubric, self.columns)),
                    ),
            );
        if self.viewed_block && !viewed.is_empty() {
            body = body.child(viewed_block(viewed));
        }

        let mut document = MockDocument::new(body);
        if !self.top_controls {
            document = document
                .with_key_binding(Key::ArrowRight, shift_top_cards(-TOP_CARD_STEP))
                .with_key_binding(Key::ArrowLeft, shift_top_cards(TOP_CARD_STEP));
        }
        document
    }

    fn header(&self) -> MockElement {
        MockElement::new("nav")
            .test_id("pageHeaderNavigationDesktop.navigationWrapper")
            .bbox(BoundingBox::new(0.0, 0.0, 1920.0, 64.0))
            .children(self.navigation.iter().enumerate().map(|(i, label)| {
                let mut color = MockElement::new("span")
                    .test_id("pageHeaderNavigation.colorElement")
                    .style("background-color", TRANSPARENT);
                if self.hover_highlight {
                    color = color.hover_style("background-color", GREY);
                }
                MockElement::new("a")
                    .test_id("pageHeaderNavigation.item")
                    .attr("href", format!("/{CITY}/rubric/{i}"))
                    .text(format!(" {label} "))
                    .bbox(BoundingBox::new(120.0 * i as f64, 10.0, 110.0, 44.0))
                    .child(color)
            }))
    }

    fn banner(&self) -> MockElement {
        let track = ElementId::FeaturedSlickTrack.selector();
        let mut slider = MockElement::new("div")
            .test_id("featured.sliderContainer")
            .bbox(BoundingBox::new(0.0, 300.0, 1920.0, 400.0))
            .child(
                MockElement::new("div")
                    .class("slick-track")
                    .bbox(BoundingBox::new(0.0, 300.0, 5760.0, 400.0)),
            );
        if self.banner_controls {
            slider = slider
                .child(
                    MockElement::new("button")
                        .test_id("featured.sliderPrevButton")
                        .bbox(BoundingBox::new(10.0, 480.0, 40.0, 40.0))
                        .on_click(MockAction::TranslateX {
                            target: track.clone(),
                            dx: BANNER_STEP,
                        }),
                )
                .child(
                    MockElement::new("button")
                        .test_id("featured.sliderNextButton")
                        .bbox(BoundingBox::new(1870.0, 480.0, 40.0, 40.0))
                        .on_click(MockAction::TranslateX {
                            target: track,
                            dx: -BANNER_STEP,
                        }),
                );
        }
        slider
    }

    fn top_block(&self) -> MockElement {
        let mut container = MockElement::new("div")
            .test_id("topEvents.eventContainer")
            .bbox(BoundingBox::new(0.0, 1400.0, 1920.0, 420.0))
            .children((0..TOP_CARDS).map(top_card));
        if self.top_controls {
            container = container
                .child(
                    MockElement::new("button")
                        .class("BDd2ZV")
                        .hidden()
                        .on_click(shift_top_cards(TOP_CARD_STEP)),
                )
                .child(
                    MockElement::new("button")
                        .class("qb30XR")
                        .hidden()
                        .on_click(shift_top_cards(-TOP_CARD_STEP)),
                );
        }
        MockElement::new("section")
            .test_id("topEvents.wrapper")
            .child(MockElement::new("h2").text("Топ-10 событий недели"))
            .child(container)
    }
}

pub fn url(path: &str) -> String {
    format!("{BASE}{path}")
}

pub fn landing_url() -> String {
    url(&format!("/{CITY}"))
}

pub fn selection_path(rubric: &str) -> String {
    format!("/{CITY}/selections/{rubric}")
}

pub fn detail_path(rubric: &str, n: usize) -> String {
    format!("/{CITY}/{rubric}/{rubric}-event-{n}")
}

pub fn card_title(feed: &str, n: usize) -> String {
    format!("{}: событие {n}", feed.replace('\u{a0}', " "))
}

fn shift_top_cards(dx: f64) -> MockAction {
    MockAction::TranslateX {
        target: ElementId::TopEventCard.selector(),
        dx,
    }
}

fn calendar() -> MockElement {
    let day = ElementId::CalendarDays.selector();
    MockElement::new("div")
        .test_id("horizontalCalendar")
        .bbox(BoundingBox::new(0.0, 180.0, 1920.0, 100.0))
        .children((0..CALENDAR_DAYS).map(|i| {
            MockElement::new("a")
                .test_id("horizontalCalendar.day")
                .attr(CALENDAR_DAY_ATTRIBUTE, ((i % 30) + 1).to_string())
                .attr(CALENDAR_MONTH_ATTRIBUTE, if i < 30 { "10" } else { "11" })
                .text(((i % 30) + 1).to_string())
                .bbox(BoundingBox::new(10.0 + DAY_STEP * f64::from(i), 200.0, 60.0, 60.0))
        }))
        .child(
            MockElement::new("button")
                .test_id("repertoryActors.controlLeft")
                .bbox(BoundingBox::new(0.0, 215.0, 30.0, 30.0))
                .on_click(MockAction::TranslateX {
                    target: day.clone(),
                    dx: DAYS_PER_CLICK * DAY_STEP,
                }),
        )
        .child(
            MockElement::new("button")
                .test_id("repertoryActors.controlRight")
                .bbox(BoundingBox::new(1890.0, 215.0, 30.0, 30.0))
                .on_click(MockAction::TranslateX {
                    target: day,
                    dx: -DAYS_PER_CLICK * DAY_STEP,
                }),
        )
}

fn feed_section(title: &str, rubric: &str, columns: u32) -> MockElement {
    let selection = selection_path(rubric);
    MockElement::new("div")
        .class("iHSQLP")
        .child(
            MockElement::new("a")
                .attr("href", selection.clone())
                .on_click(MockAction::Navigate(url(&selection)))
                .child(MockElement::new("h2").test_id("eventsFeed.title").text(title))
                .child(
                    MockElement::new("svg")
                        .test_id("eventsFeed.arrow")
                        .style("stroke", "rgb(0, 0, 0)")
                        .hover_style("stroke", "rgb(255, 0, 0)"),
                ),
        )
        .child(
            MockElement::new("div")
                .test_id("eventsFeed.eventsFeedList")
                .attr("style", format!("--events-count: {columns}; --gap: 16px"))
                .children((1..=CARDS_PER_FEED).map(|n| event_card(title, rubric, n))),
        )
}

fn event_card(feed: &str, rubric: &str, n: usize) -> MockElement {
    let column = (n - 1) % 3;
    let mut card = MockElement::new("div")
        .test_id("eventCard.root")
        .bbox(BoundingBox::new(40.0 + 620.0 * column as f64, 0.0, 600.0, 480.0))
        .child(MockElement::new("img").class("jYbobS"))
        .child(MockElement::new("button").test_id("event-card-favourite-button"))
        .child(
            MockElement::new("a")
                .test_id("eventCard.link")
                .attr("href", detail_path(rubric, n))
                .child(
                    MockElement::new("h2")
                        .test_id("eventCard.eventInfoTitle")
                        .text(format!(" {} ", card_title(feed, n))),
                ),
        )
        .child(
            MockElement::new("div")
                .test_id("eventCard.eventInfoDetails")
                .text("25 октября, 19:00"),
        );
    if n % 2 == 1 {
        card = card.child(
            MockElement::new("span")
                .test_id("eventCard.price")
                .text("от 1500 ₽"),
        );
    } else {
        card = card.child(MockElement::new("a").test_id("eventCover.scheduleLink"));
    }
    if n == 1 {
        card = card
            .child(MockElement::new("div").test_id("plusCashbackBadge.item").text("10%"))
            .child(MockElement::new("div").test_id("eventCard.rating").text("8.9"));
    }
    card
}

fn top_card(index: usize) -> MockElement {
    let x = 20.0 + TOP_CARD_STEP * index as f64;
    MockElement::new("div")
        .class(format!("Card_p8csoW_{index}"))
        .bbox(BoundingBox::new(x, 1400.0, 280.0, 400.0))
        .child(MockElement::new("img").test_id("topCard.numberImage"))
        .child(MockElement::new("img").test_id("topCard.eventImage"))
        .child(MockElement::new("div").test_id("plusCashbackBadge.item").text("5%"))
        .child(
            MockElement::new("h3")
                .test_id("topCard.title")
                .text(format!("Топ-событие {}", index + 1)),
        )
        .child(MockElement::new("span").test_id("topCard.rubricTag").text("Концерт"))
        .child(MockElement::new("span").test_id("topCard.date").text("26 октября"))
}

fn viewed_block(titles: &[&String]) -> MockElement {
    MockElement::new("section")
        .class("IMCiK8")
        .child(MockElement::new("h2").text(VIEWED_BLOCK_HEADING))
        .children(titles.iter().rev().map(|title| {
            MockElement::new("div")
                .class("z2H_NI")
                .child(MockElement::new("h3").class("zLWwiG").text((*title).clone()))
        }))
}

/// Probe configuration tuned for the in-memory site
pub fn fast_config() -> ProbeConfig {
    let mut config = ProbeConfig::default();
    config.base_url = BASE.to_string();
    config.city = CITY.to_string();
    config.seed = Some(20_241_025);
    config.retries = Some(0);
    config.screenshot_on_failure = true;
    config.settle.mode = SettleMode::Fixed;
    config.settle.hover_ms = 1;
    config.settle.calendar_ms = 1;
    config.settle.banner_ms = 1;
    config.settle.top_block_ms = 1;
    config.settle.scroll_ms = 1;
    config.timeouts.scenario_ms = 5_000;
    config.timeouts.action_ms = 100;
    config.timeouts.expect_ms = 100;
    config.timeouts.navigation_ms = 100;
    config.timeouts.control_probe_ms = 30;
    config.timeouts.poll_interval_ms = 5;
    config
}

pub fn factory(site: Arc<MockSite>) -> Arc<MockSessionFactory> {
    Arc::new(MockSessionFactory::new(site))
}

pub fn runner(site: Arc<MockSite>, config: ProbeConfig) -> ScenarioRunner {
    ScenarioRunner::new(factory(site), config)
}

