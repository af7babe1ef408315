//! City landing page facade.
//!
//! Every operation resolves its targets through the registry, waits for the
//! DOM state it needs, interacts, and settles timing-sensitive effects
//! before sampling again. Operations record their phase in the scenario
//! [`Lifecycle`]; anything but [`MainPage::open`] is rejected until the
//! page has loaded.

use crate::assertion::{
    either_contains_ignore_case, normalize_whitespace, Assertion, AssertionResult,
};
use crate::carousel::{Carousel, ControlStrategy, Direction};
use crate::config::{ProbeConfig, SettleEffect};
use crate::driver::BrowserSession;
use crate::harness::{Lifecycle, ScenarioState};
use crate::locator::Locator;
use crate::page_object::{PageObject, UrlMatcher};
use crate::registry::{
    ElementId, CALENDAR_DAY_ATTRIBUTE, CALENDAR_MONTH_ATTRIBUTE, EVENTS_COUNT_PROPERTY,
    VIEWED_BLOCK_HEADING,
};
use crate::result::{ProbeError, ProbeResult};
use crate::rng::SeededRng;
use crate::viewport::{CalendarDay, ViewportSnapshot};
use crate::wait::{self, wait_for_state, ElementState, LoadState, SettleProbe, WaitOptions};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Background of a navigation item that is not highlighted
pub const TRANSPARENT: &str = "rgba(0, 0, 0, 0)";

/// Cards per feed sampled by detail-page visits
pub const SAMPLED_CARDS_PER_FEED: usize = 3;

/// Feed section identified by its rendered title.
///
/// The title text is the only handle the page offers for a feed. It is
/// matched case-insensitively as a substring of the normalized title, the
/// same rule the page's own "has text" filtering uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeedSection {
    /// "События в ближайшие дни"
    Upcoming,
    /// A feed discovered at runtime
    Titled(String),
}

impl FeedSection {
    /// Title text used to find the section
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Upcoming => "События в ближайшие дни",
            Self::Titled(title) => title,
        }
    }

    /// Title element of the section
    #[must_use]
    pub fn title_locator(&self) -> Locator {
        ElementId::EventsFeedTitle.locator().has_text(self.title())
    }

    /// Event cards of the section
    #[must_use]
    pub fn cards(&self) -> Locator {
        self.title_locator()
            .ancestor(ElementId::EventsFeedContainer.selector())
            .locator(ElementId::EventsFeedList.selector())
            .locator(ElementId::EventCardRoot.selector())
    }
}

impl fmt::Display for FeedSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl From<&str> for FeedSection {
    fn from(title: &str) -> Self {
        if title == Self::Upcoming.title() {
            Self::Upcoming
        } else {
            Self::Titled(title.to_string())
        }
    }
}

/// Read `--events-count` from an inline `style` attribute
#[must_use]
pub fn events_count(style: &str) -> Option<u32> {
    style.split(';').find_map(|declaration| {
        let (name, value) = declaration.split_once(':')?;
        (name.trim() == EVENTS_COUNT_PROPERTY)
            .then(|| value.trim().parse().ok())
            .flatten()
    })
}

/// Pick `count` titles in a seeded random order
#[must_use]
pub fn random_titles(titles: &[String], count: usize, rng: &mut SeededRng) -> Vec<String> {
    rng.sample(titles, count)
}

/// Facade over the city landing page of one browser session
pub struct MainPage {
    session: Box<dyn BrowserSession>,
    config: Arc<ProbeConfig>,
    matcher: UrlMatcher,
    lifecycle: Mutex<Lifecycle>,
}

impl fmt::Debug for MainPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MainPage")
            .field("base_url", &self.config.base_url)
            .field("matcher", &self.matcher)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

impl PageObject for MainPage {
    fn url_pattern(&self) -> &str {
        self.matcher.pattern()
    }

    fn page_name(&self) -> &str {
        "main page"
    }
}

impl MainPage {
    /// Wrap a fresh session
    #[must_use]
    pub fn new(session: Box<dyn BrowserSession>, config: Arc<ProbeConfig>) -> Self {
        Self {
            session,
            matcher: UrlMatcher::new(&config.landing_pattern()),
            config,
            lifecycle: Mutex::new(Lifecycle::new()),
        }
    }

    /// Underlying browser session
    #[must_use]
    pub fn session(&self) -> &dyn BrowserSession {
        self.session.as_ref()
    }

    /// Run configuration
    #[must_use]
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Current scenario state
    #[must_use]
    pub fn state(&self) -> ScenarioState {
        self.lifecycle().map_or(ScenarioState::Failed, |l| l.state())
    }

    /// Close the scenario with the outcome of its body
    pub fn finish(&self, outcome: ProbeResult<()>) -> ProbeResult<()> {
        self.lifecycle()?.finish(outcome)
    }

    /// Release the browser session
    pub async fn close(self) -> ProbeResult<()> {
        self.session.close().await
    }

    fn lifecycle(&self) -> ProbeResult<MutexGuard<'_, Lifecycle>> {
        self.lifecycle.lock().map_err(|_| ProbeError::InvalidState {
            message: "scenario lifecycle lock poisoned".to_string(),
        })
    }

    fn guard(&self) -> ProbeResult<()> {
        self.lifecycle()?.ensure_loaded()
    }

    fn mark(&self, state: ScenarioState) -> ProbeResult<()> {
        self.lifecycle()?.transition(state)
    }

    fn assert(&self, result: AssertionResult) -> ProbeResult<()> {
        result.into_result()?;
        self.mark(ScenarioState::Asserted)
    }

    async fn wait(&self, locator: &Locator, state: ElementState, options: WaitOptions) -> ProbeResult<()> {
        wait_for_state(self.session(), locator, state, options).await
    }

    async fn wait_visible(&self, locator: &Locator) -> ProbeResult<()> {
        self.wait(locator, ElementState::Visible, self.config.timeouts.action())
            .await
    }

    async fn expect_visible(&self, locator: &Locator) -> ProbeResult<()> {
        self.wait(locator, ElementState::Visible, self.config.timeouts.expect())
            .await
    }

    async fn settle(&self, effect: SettleEffect, probe: SettleProbe) -> ProbeResult<()> {
        wait::settle(self.session(), self.config.settle.for_effect(effect), &probe).await
    }

    async fn trimmed_text(&self, locator: &Locator) -> ProbeResult<Option<String>> {
        Ok(self
            .session
            .text_content(locator)
            .await?
            .map(|text| text.trim().to_string()))
    }

    // -- navigation ---------------------------------------------------------

    /// Open the landing page of `city` and wait for `load`
    pub async fn open(&self, city: &str) -> ProbeResult<()> {
        let url = self.config.city_url(city);
        info!(%url, "opening landing page");
        self.session.navigate(&url, LoadState::Load).await?;
        let landed = self.session.current_url().await?;
        let params = self.matcher.extract_params(&landed);
        if !self.matcher.matches(&landed) || params.get("city").map(String::as_str) != Some(city) {
            return Err(ProbeError::navigation(
                url,
                format!("landed on {landed}, not the {city} landing page"),
            ));
        }
        self.mark(ScenarioState::PageLoaded)
    }

    /// Open the configured baseline city
    pub async fn open_baseline(&self) -> ProbeResult<()> {
        self.open(&self.config.city).await
    }

    /// Bring a feed section into view
    pub async fn scroll_to_feed(&self, section: &FeedSection) -> ProbeResult<()> {
        self.guard()?;
        let title = section.title_locator();
        self.wait(&title, ElementState::Attached, self.config.timeouts.action())
            .await?;
        self.session.scroll_into_view(&title).await?;
        self.settle(SettleEffect::Scroll, SettleProbe::Boxes(title))
            .await?;
        self.mark(ScenarioState::ActionPerformed)
    }

    /// Bring the top events block into view
    pub async fn scroll_to_top_block(&self) -> ProbeResult<()> {
        self.guard()?;
        let wrapper = ElementId::TopEventsWrapper.locator();
        self.wait(&wrapper, ElementState::Attached, self.config.timeouts.action())
            .await?;
        self.session.scroll_into_view(&wrapper).await?;
        self.settle(SettleEffect::Scroll, SettleProbe::Boxes(wrapper))
            .await?;
        self.mark(ScenarioState::ActionPerformed)
    }

    // -- header -------------------------------------------------------------

    /// The `index`-th navigation item reads `label` (trimmed, case-insensitive)
    pub async fn assert_header_navigation(&self, label: &str, index: usize) -> ProbeResult<()> {
        self.guard()?;
        let navigation = ElementId::HeaderNavigation.locator();
        self.wait_visible(&navigation).await?;
        let item = navigation
            .locator(ElementId::NavigationTabs.selector())
            .nth(index);
        let actual = self.trimmed_text(&item).await?.unwrap_or_default();
        self.assert(Assertion::equals(&label.to_lowercase(), &actual.to_lowercase()))
    }

    /// Hovering the navigation item `label` changes its highlight color
    pub async fn assert_navigation_hover_effect(&self, label: &str) -> ProbeResult<()> {
        self.guard()?;
        let item = ElementId::HeaderNavigation
            .locator()
            .locator(ElementId::NavigationTabs.selector())
            .has_text(label)
            .first();
        self.wait_visible(&item).await?;
        let color = item.locator(ElementId::ColorElement.selector());
        let before = self.session.computed_style(&color, "background-color").await?;
        self.session.hover(&color).await?;
        self.mark(ScenarioState::ActionPerformed)?;
        self.settle(
            SettleEffect::Hover,
            SettleProbe::style(color.clone(), "background-color"),
        )
        .await?;
        let after = self.session.computed_style(&color, "background-color").await?;
        debug!(label, %before, %after, "navigation hover");
        self.assert(Assertion::differs(
            &before,
            &after,
            &format!("background of '{label}'"),
        ))?;
        self.assert(Assertion::is_true(
            after != TRANSPARENT,
            &format!("hover background of '{label}' is transparent"),
        ))
    }

    // -- calendar -----------------------------------------------------------

    /// Calendar days whose box lies fully inside the viewport.
    ///
    /// Re-queries every day element on each call. Days missing either
    /// attribute are skipped.
    pub async fn visible_calendar_days(&self) -> ProbeResult<ViewportSnapshot<CalendarDay>> {
        self.guard()?;
        let viewport = self.session.viewport().await?;
        let days = ElementId::CalendarDays.locator();
        let count = self.session.count(&days).await?;
        let mut visible = Vec::new();
        for i in 0..count {
            let day = days.clone().nth(i);
            let Some(bbox) = self.session.bounding_box(&day).await? else {
                continue;
            };
            if !viewport.fully_contains(&bbox) {
                continue;
            }
            let day_attr = self.session.attribute(&day, CALENDAR_DAY_ATTRIBUTE).await?;
            let month_attr = self.session.attribute(&day, CALENDAR_MONTH_ATTRIBUTE).await?;
            if let Some(day) = CalendarDay::from_attributes(day_attr.as_deref(), month_attr.as_deref()) {
                visible.push(day);
            }
        }
        debug!(count, visible = visible.len(), "calendar days sampled");
        self.mark(ScenarioState::StateCaptured)?;
        Ok(ViewportSnapshot::new(visible))
    }

    /// Click the calendar control for `direction`
    pub async fn scroll_calendar(&self, direction: Direction) -> ProbeResult<()> {
        self.guard()?;
        let control = Carousel::Calendar.control(direction).locator();
        self.wait_visible(&control).await?;
        self.session.click(&control).await?;
        self.mark(ScenarioState::ActionPerformed)?;
        self.settle(
            SettleEffect::Calendar,
            SettleProbe::Boxes(ElementId::CalendarDays.locator().first()),
        )
        .await
    }

    /// The leading visible day changed
    pub fn assert_calendar_days_changed(
        &self,
        before: &ViewportSnapshot<CalendarDay>,
        after: &ViewportSnapshot<CalendarDay>,
    ) -> ProbeResult<()> {
        self.guard()?;
        self.assert(Assertion::is_true(
            before.leading_changed(after),
            &format!(
                "leading calendar day did not change: {:?} -> {:?}",
                before.leading(),
                after.leading()
            ),
        ))
    }

    // -- banner -------------------------------------------------------------

    /// Computed `transform` of the banner track
    pub async fn banner_position(&self) -> ProbeResult<String> {
        self.guard()?;
        let track = ElementId::FeaturedSlickTrack.locator();
        self.wait_visible(&track).await?;
        let transform = self.session.computed_style(&track, "transform").await?;
        self.mark(ScenarioState::StateCaptured)?;
        Ok(transform)
    }

    /// Click the banner control for `direction`
    pub async fn scroll_banner(&self, direction: Direction) -> ProbeResult<()> {
        self.guard()?;
        let control = Carousel::Banner.control(direction).locator();
        self.wait_visible(&control).await?;
        self.session.click(&control).await?;
        self.mark(ScenarioState::ActionPerformed)?;
        self.settle(
            SettleEffect::Banner,
            SettleProbe::style(ElementId::FeaturedSlickTrack.locator(), "transform"),
        )
        .await
    }

    /// The banner transform changed and is a real transform
    pub fn assert_banner_position_changed(&self, before: &str, after: &str) -> ProbeResult<()> {
        self.guard()?;
        self.assert(Assertion::differs(&before, &after, "banner transform"))?;
        self.assert(Assertion::is_true(
            after != "none",
            "banner track has no transform after scrolling",
        ))
    }

    // -- feeds --------------------------------------------------------------

    /// `stroke`, or `color` for arrows drawn without a stroke
    async fn arrow_color_property(&self, arrow: &Locator) -> ProbeResult<&'static str> {
        let stroke = self.session.computed_style(arrow, "stroke").await?;
        Ok(if stroke.is_empty() { "color" } else { "stroke" })
    }

    /// Hovering the section title link recolors its arrow
    pub async fn assert_feed_title_hover_color(&self, section: &FeedSection) -> ProbeResult<()> {
        self.guard()?;
        let title = section.title_locator();
        self.wait_visible(&title).await?;
        let link = title.parent();
        let arrow = link.clone().locator(ElementId::EventsFeedArrow.selector());
        let property = self.arrow_color_property(&arrow).await?;
        let before = self.session.computed_style(&arrow, property).await?;
        self.session.hover(&link).await?;
        self.mark(ScenarioState::ActionPerformed)?;
        self.settle(SettleEffect::Hover, SettleProbe::style(arrow.clone(), property))
            .await?;
        let after = self.session.computed_style(&arrow, property).await?;
        self.assert(Assertion::differs(
            &before,
            &after,
            &format!("arrow color of '{section}'"),
        ))
    }

    /// The list following the section title declares exactly `columns` cards per row
    pub async fn assert_feed_cards_layout(
        &self,
        section: &FeedSection,
        columns: u32,
    ) -> ProbeResult<()> {
        self.guard()?;
        let title = section.title_locator();
        self.wait_visible(&title).await?;
        let list = title
            .following(ElementId::EventsFeedList.selector())
            .first();
        self.wait_visible(&list).await?;
        let style = self.session.attribute(&list, "style").await?.unwrap_or_default();
        let declared = events_count(&style);
        self.assert(Assertion::is_true(
            declared == Some(columns),
            &format!(
                "'{section}' declares {EVENTS_COUNT_PROPERTY} {declared:?}, expected {columns} (style: {style:?})"
            ),
        ))
    }

    /// Card `index` of the section shows its mandatory parts, and its optional parts when present
    pub async fn assert_event_card_elements(
        &self,
        section: &FeedSection,
        index: usize,
    ) -> ProbeResult<()> {
        self.guard()?;
        self.expect_visible(&section.title_locator()).await?;
        let card = section.cards().nth(index);
        self.expect_visible(&card).await?;
        for part in [
            ElementId::EventCardPoster,
            ElementId::EventCardTitle,
            ElementId::EventCardFavorite,
            ElementId::EventCardDetails,
        ] {
            self.expect_visible(&card.clone().locator(part.selector()))
                .await?;
        }
        for part in [
            ElementId::EventCardPrice,
            ElementId::PlusCashbackBadge,
            ElementId::EventCardRating,
        ] {
            let optional = card.clone().locator(part.selector());
            if self.session.count(&optional).await? > 0 {
                self.expect_visible(&optional.first()).await?;
            }
        }
        self.mark(ScenarioState::Asserted)
    }

    /// Titles of every feed in the main feed, whitespace-normalized.
    ///
    /// Empty when the main feed renders no titles.
    pub async fn feed_titles(&self) -> ProbeResult<Vec<String>> {
        self.guard()?;
        let main = ElementId::MainFeed.locator().first();
        self.expect_visible(&main).await?;
        let titles = main.locator(ElementId::EventsFeedTitle.selector());
        match self.wait_visible(&titles.clone().first()).await {
            Ok(()) => {}
            Err(ProbeError::ElementNotFound { .. } | ProbeError::StateTimeout { .. }) => {
                self.mark(ScenarioState::StateCaptured)?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        }
        self.settle(SettleEffect::Scroll, SettleProbe::Boxes(titles.clone()))
            .await?;
        let count = self.session.count(&titles).await?;
        let mut collected = Vec::with_capacity(count);
        for i in 0..count {
            if let Some(text) = self.session.text_content(&titles.clone().nth(i)).await? {
                let title = normalize_whitespace(&text);
                if !title.is_empty() {
                    collected.push(title);
                }
            }
        }
        info!(count = collected.len(), "feed titles collected");
        self.mark(ScenarioState::StateCaptured)?;
        Ok(collected)
    }

    /// Click the link wrapping the section title and wait for `DOMContentLoaded`
    pub async fn click_feed_title(&self, section: &FeedSection) -> ProbeResult<()> {
        self.guard()?;
        let title = section.title_locator();
        self.wait_visible(&title).await?;
        let link = title.ancestor(ElementId::FeedLink.selector());
        let initial = self.session.current_url().await?;
        self.session.click(&link).await?;
        self.mark(ScenarioState::ActionPerformed)?;
        wait::wait_for_url_change(self.session(), &initial, self.config.timeouts.navigation())
            .await?;
        self.session
            .wait_for_load_state(
                LoadState::DomContentLoaded,
                self.config.timeouts.navigation().timeout(),
            )
            .await
    }

    /// The current URL differs from `initial`
    pub async fn assert_url_changed(&self, initial: &str) -> ProbeResult<()> {
        self.guard()?;
        let current = self.session.current_url().await?;
        if current == initial {
            return Err(ProbeError::navigation(initial, "URL did not change"));
        }
        self.mark(ScenarioState::Asserted)
    }

    /// The selection page heading and `feed_title` contain one another
    pub async fn assert_selection_page_title(&self, feed_title: &str) -> ProbeResult<()> {
        self.guard()?;
        let heading = ElementId::SelectionPageTitle.locator();
        self.wait_visible(&heading).await?;
        let actual = self
            .trimmed_text(&heading)
            .await?
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ProbeError::assertion("selection page heading has no text"))?;
        self.assert(Assertion::related(&actual, feed_title))
    }

    /// Follow a feed title to its selection page and come back.
    ///
    /// Checks that the URL changed, that the destination heading matches
    /// the title, and that reopening the baseline restores the original URL.
    pub async fn navigate_via_title(&self, title: &str) -> ProbeResult<()> {
        self.guard()?;
        self.session
            .wait_for_load_state(
                LoadState::DomContentLoaded,
                self.config.timeouts.navigation().timeout(),
            )
            .await?;
        let initial = self.session.current_url().await?;
        self.click_feed_title(&FeedSection::from(title)).await?;
        self.assert_url_changed(&initial).await?;
        self.assert_selection_page_title(title).await?;
        self.open_baseline().await?;
        let restored = self.session.current_url().await?;
        self.assert(Assertion::equals(&initial, &restored))
    }

    /// [`Self::navigate_via_title`] for every title, returning how many were checked
    pub async fn check_all_feed_navigations(&self, titles: &[String]) -> ProbeResult<usize> {
        self.guard()?;
        let mut checked = 0;
        for title in titles {
            self.navigate_via_title(title).await?;
            checked += 1;
        }
        self.assert(Assertion::is_true(checked > 0, "no feed navigation was checked"))?;
        Ok(checked)
    }

    // -- detail pages and recently viewed -------------------------------------

    /// Open the detail page of a random card among the first three of the section.
    ///
    /// Returns the card title as shown in the feed.
    pub async fn click_random_card_in_feed(
        &self,
        section: &FeedSection,
        rng: &mut SeededRng,
    ) -> ProbeResult<String> {
        self.scroll_to_feed(section).await?;
        let cards = section.cards();
        self.wait(
            &cards.clone().first(),
            ElementState::Attached,
            self.config.timeouts.expect(),
        )
        .await?;
        let count = self.session.count(&cards).await?;
        let index = rng.below(count.min(SAMPLED_CARDS_PER_FEED));
        let card = cards.nth(index);
        self.session.scroll_into_view(&card).await?;

        let title = card.clone().locator(ElementId::EventCardTitle.selector());
        self.wait(&title, ElementState::Attached, self.config.timeouts.action())
            .await?;
        let event_title = self.trimmed_text(&title).await?.unwrap_or_default();

        let link = card.locator(ElementId::EventCardLink.selector());
        let href = self
            .session
            .attribute(&link, "href")
            .await?
            .ok_or_else(|| {
                ProbeError::navigation(section.title(), format!("card {index} has no link"))
            })?;
        let url = self.config.absolute_url(&href)?;
        debug!(%section, index, %url, %event_title, "visiting card");
        self.session.navigate(&url, LoadState::DomContentLoaded).await?;
        self.mark(ScenarioState::ActionPerformed)?;
        Ok(event_title)
    }

    /// For each title, reload the baseline and visit one sampled card of that feed
    pub async fn sample_and_revisit(
        &self,
        titles: &[String],
        rng: &mut SeededRng,
    ) -> ProbeResult<Vec<String>> {
        let mut visited = Vec::with_capacity(titles.len());
        for title in titles {
            self.open_baseline().await?;
            let event_title = self
                .click_random_card_in_feed(&FeedSection::from(title.as_str()), rng)
                .await?;
            visited.push(event_title);
        }
        Ok(visited)
    }

    /// Card titles of the "recently viewed" block
    pub async fn viewed_event_titles(&self) -> ProbeResult<Vec<String>> {
        self.guard()?;
        let block = ElementId::ViewedBlock.locator().has_text(VIEWED_BLOCK_HEADING);
        self.wait(&block, ElementState::Attached, self.config.timeouts.action())
            .await?;
        self.session.scroll_into_view(&block).await?;
        let cards = block.locator(ElementId::ViewedCard.selector());
        let count = self.session.count(&cards).await?;
        let mut titles = Vec::with_capacity(count);
        for i in 0..count {
            let title = cards
                .clone()
                .nth(i)
                .locator(ElementId::ViewedCardTitle.selector());
            if self.session.count(&title).await? == 0 {
                continue;
            }
            if let Some(text) = self.trimmed_text(&title).await? {
                titles.push(text);
            }
        }
        self.mark(ScenarioState::StateCaptured)?;
        Ok(titles)
    }

    /// Every expected title appears in the "recently viewed" block
    pub async fn assert_viewed_events_match(&self, expected: &[String]) -> ProbeResult<()> {
        self.guard()?;
        Assertion::not_empty(expected, "visited card titles").into_result()?;
        let actual = self.viewed_event_titles().await?;
        let missing: Vec<&String> = expected
            .iter()
            .filter(|title| !actual.iter().any(|a| either_contains_ignore_case(a, title)))
            .collect();
        self.assert(Assertion::is_true(
            missing.is_empty(),
            &format!("not in recently viewed {actual:?}: {missing:?}"),
        ))
    }

    // -- top block ------------------------------------------------------------

    fn top_cards() -> Locator {
        ElementId::TopEventsContainer
            .locator()
            .locator(ElementId::TopEventCard.selector())
    }

    /// The top block holds exactly `expected` cards
    pub async fn assert_top_block_cards_count(&self, expected: usize) -> ProbeResult<()> {
        self.guard()?;
        self.wait_visible(&ElementId::TopEventsContainer.locator())
            .await?;
        let actual = self.session.count(&Self::top_cards()).await?;
        self.assert(Assertion::equals(&expected, &actual))
    }

    /// Hover the block and advance it once, by control or keyboard
    pub async fn scroll_top_block(&self, direction: Direction) -> ProbeResult<ControlStrategy> {
        self.guard()?;
        let container = ElementId::TopEventsContainer.locator();
        self.wait_visible(&container).await?;
        self.session.hover(&container).await?;
        let control = Carousel::TopEvents.control(direction).locator();
        let strategy =
            ControlStrategy::probe(self.session(), &control, self.config.timeouts.control_probe())
                .await?;
        strategy.advance(self.session(), &control, direction).await?;
        self.mark(ScenarioState::ActionPerformed)?;
        self.settle(
            SettleEffect::TopBlock,
            SettleProbe::Boxes(Self::top_cards().first()),
        )
        .await?;
        Ok(strategy)
    }

    /// Left edges of the top cards that have a box
    pub async fn top_card_positions(&self) -> ProbeResult<ViewportSnapshot<f64>> {
        self.guard()?;
        let cards = Self::top_cards();
        let count = self.session.count(&cards).await?;
        let mut positions = Vec::with_capacity(count);
        for i in 0..count {
            if let Some(bbox) = self.session.bounding_box(&cards.clone().nth(i)).await? {
                positions.push(bbox.x);
            }
        }
        self.mark(ScenarioState::StateCaptured)?;
        Ok(ViewportSnapshot::new(positions))
    }

    /// Some card moved the way content travels when scrolling `direction`
    pub fn compare_top_card_positions(
        &self,
        before: &ViewportSnapshot<f64>,
        after: &ViewportSnapshot<f64>,
        direction: Direction,
    ) -> ProbeResult<()> {
        self.guard()?;
        Assertion::not_empty(before.items(), "card positions before scrolling").into_result()?;
        Assertion::not_empty(after.items(), "card positions after scrolling").into_result()?;
        self.assert(Assertion::is_true(
            before.shifted(after, direction),
            &format!(
                "no top card moved after scrolling {direction}: {:?} -> {:?}",
                before.items(),
                after.items()
            ),
        ))
    }

    /// Top card `index` shows every part
    pub async fn assert_top_card_elements(&self, index: usize) -> ProbeResult<()> {
        self.guard()?;
        let card = Self::top_cards().nth(index);
        self.wait_visible(&card).await?;
        for part in [
            ElementId::TopCardNumberImage,
            ElementId::TopCardPoster,
            ElementId::PlusCashbackBadge,
            ElementId::TopCardTitle,
            ElementId::TopCardRubricTag,
            ElementId::TopCardDate,
        ] {
            self.expect_visible(&card.clone().locator(part.selector()))
                .await?;
        }
        self.mark(ScenarioState::Asserted)
    }

    /// Every top card shows every part; the block must not be empty
    pub async fn assert_all_top_cards_have_elements(&self) -> ProbeResult<()> {
        self.guard()?;
        let count = self.session.count(&Self::top_cards()).await?;
        Assertion::is_true(count > 0, "top block has no cards").into_result()?;
        for i in 0..count {
            self.assert_top_card_elements(i).await?;
        }
        Ok(())
    }
}
