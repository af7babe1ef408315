//! Locator registry for the landing page.
//!
//! Every element the facade touches is named by an [`ElementId`]. The
//! mapping to selectors is a total, side-effect free function, so an
//! unregistered name cannot be referenced at all.

use crate::locator::{Locator, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Attribute holding the calendar day number
pub const CALENDAR_DAY_ATTRIBUTE: &str = "data-test-day";
/// Attribute holding the calendar month number
pub const CALENDAR_MONTH_ATTRIBUTE: &str = "data-test-month";
/// CSS custom property declaring the card column count of a feed list
pub const EVENTS_COUNT_PROPERTY: &str = "--events-count";
/// Heading text of the "recently viewed" block
pub const VIEWED_BLOCK_HEADING: &str = "Вы смотрели";

/// Semantic element identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementId {
    /// Desktop header navigation wrapper
    HeaderNavigation,
    /// Header navigation item
    NavigationTabs,
    /// Colored background element inside a navigation item
    ColorElement,
    /// Horizontal calendar day
    CalendarDays,
    /// Calendar scroll-right control
    CalendarControlRight,
    /// Calendar scroll-left control
    CalendarControlLeft,
    /// Featured banner slider track
    FeaturedSlickTrack,
    /// Banner previous button
    BannerControlLeft,
    /// Banner next button
    BannerControlRight,
    /// Feed section title
    EventsFeedTitle,
    /// Arrow icon next to a feed title
    EventsFeedArrow,
    /// Card list of a feed section
    EventsFeedList,
    /// Wrapper around one feed section
    EventsFeedContainer,
    /// Main feed holding every section
    MainFeed,
    /// Link wrapping a feed title
    FeedLink,
    /// Event card root
    EventCardRoot,
    /// Event card title
    EventCardTitle,
    /// Event card details line
    EventCardDetails,
    /// Event card favourite button
    EventCardFavorite,
    /// Event card poster image
    EventCardPoster,
    /// Event card price or schedule link
    EventCardPrice,
    /// Plus cashback badge
    PlusCashbackBadge,
    /// Event card rating
    EventCardRating,
    /// Event card detail link
    EventCardLink,
    /// Top events block wrapper
    TopEventsWrapper,
    /// Top events card container
    TopEventsContainer,
    /// Top events card
    TopEventCard,
    /// Top card rank number
    TopCardNumberImage,
    /// Top card poster
    TopCardPoster,
    /// Top card title
    TopCardTitle,
    /// Top card rubric tag
    TopCardRubricTag,
    /// Top card date
    TopCardDate,
    /// Top block scroll-right button
    TopControlRight,
    /// Top block scroll-left button
    TopControlLeft,
    /// "Recently viewed" block
    ViewedBlock,
    /// "Recently viewed" card
    ViewedCard,
    /// "Recently viewed" card title
    ViewedCardTitle,
    /// Heading of a selection page
    SelectionPageTitle,
}

impl ElementId {
    /// Every registered element
    pub const ALL: [Self; 38] = [
        Self::HeaderNavigation,
        Self::NavigationTabs,
        Self::ColorElement,
        Self::CalendarDays,
        Self::CalendarControlRight,
        Self::CalendarControlLeft,
        Self::FeaturedSlickTrack,
        Self::BannerControlLeft,
        Self::BannerControlRight,
        Self::EventsFeedTitle,
        Self::EventsFeedArrow,
        Self::EventsFeedList,
        Self::EventsFeedContainer,
        Self::MainFeed,
        Self::FeedLink,
        Self::EventCardRoot,
        Self::EventCardTitle,
        Self::EventCardDetails,
        Self::EventCardFavorite,
        Self::EventCardPoster,
        Self::EventCardPrice,
        Self::PlusCashbackBadge,
        Self::EventCardRating,
        Self::EventCardLink,
        Self::TopEventsWrapper,
        Self::TopEventsContainer,
        Self::TopEventCard,
        Self::TopCardNumberImage,
        Self::TopCardPoster,
        Self::TopCardTitle,
        Self::TopCardRubricTag,
        Self::TopCardDate,
        Self::TopControlRight,
        Self::TopControlLeft,
        Self::ViewedBlock,
        Self::ViewedCard,
        Self::ViewedCardTitle,
        Self::SelectionPageTitle,
    ];

    /// Registry name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HeaderNavigation => "headerNavigation",
            Self::NavigationTabs => "navigationTabs",
            Self::ColorElement => "colorElement",
            Self::CalendarDays => "calendarDays",
            Self::CalendarControlRight => "calendarControlRight",
            Self::CalendarControlLeft => "calendarControlLeft",
            Self::FeaturedSlickTrack => "featuredSlickTrack",
            Self::BannerControlLeft => "bannerControlLeft",
            Self::BannerControlRight => "bannerControlRight",
            Self::EventsFeedTitle => "eventsFeedTitle",
            Self::EventsFeedArrow => "eventsFeedArrow",
            Self::EventsFeedList => "eventsFeedList",
            Self::EventsFeedContainer => "eventsFeedContainer",
            Self::MainFeed => "mainFeed",
            Self::FeedLink => "feedLink",
            Self::EventCardRoot => "eventCardRoot",
            Self::EventCardTitle => "eventCardTitle",
            Self::EventCardDetails => "eventCardDetails",
            Self::EventCardFavorite => "eventCardFavorite",
            Self::EventCardPoster => "eventCardPoster",
            Self::EventCardPrice => "eventCardPrice",
            Self::PlusCashbackBadge => "plusCashbackBadge",
            Self::EventCardRating => "eventCardRating",
            Self::EventCardLink => "eventCardLink",
            Self::TopEventsWrapper => "topEventsWrapper",
            Self::TopEventsContainer => "topEventsContainer",
            Self::TopEventCard => "topEventCard",
            Self::TopCardNumberImage => "topCardNumberImage",
            Self::TopCardPoster => "topCardPoster",
            Self::TopCardTitle => "topCardTitle",
            Self::TopCardRubricTag => "topCardRubricTag",
            Self::TopCardDate => "topCardDate",
            Self::TopControlRight => "topControlRight",
            Self::TopControlLeft => "topControlLeft",
            Self::ViewedBlock => "viewedBlock",
            Self::ViewedCard => "viewedCard",
            Self::ViewedCardTitle => "viewedCardTitle",
            Self::SelectionPageTitle => "selectionPageTitle",
        }
    }

    /// Selector for this element
    #[must_use]
    pub fn selector(self) -> Selector {
        match self {
            Self::HeaderNavigation => {
                Selector::test_id("pageHeaderNavigationDesktop.navigationWrapper")
            }
            Self::NavigationTabs => Selector::test_id("pageHeaderNavigation.item"),
            Self::ColorElement => Selector::test_id("pageHeaderNavigation.colorElement"),
            Self::CalendarDays => Selector::test_id("horizontalCalendar.day"),
            Self::CalendarControlRight => Selector::test_id("repertoryActors.controlRight"),
            Self::CalendarControlLeft => Selector::test_id("repertoryActors.controlLeft"),
            Self::FeaturedSlickTrack => Selector::test_id("featured.sliderContainer")
                .descendant(Selector::class("slick-track")),
            Self::BannerControlLeft => Selector::test_id("featured.sliderPrevButton"),
            Self::BannerControlRight => Selector::test_id("featured.sliderNextButton"),
            Self::EventsFeedTitle => Selector::test_id("eventsFeed.title"),
            Self::EventsFeedArrow => Selector::test_id("eventsFeed.arrow"),
            Self::EventsFeedList => Selector::test_id("eventsFeed.eventsFeedList"),
            Self::EventsFeedContainer => Selector::tag_class("div", "iHSQLP"),
            Self::MainFeed => Selector::classes(["vM97Px", "tj15kA"]),
            Self::FeedLink => Selector::tag("a"),
            Self::EventCardRoot => Selector::test_id("eventCard.root"),
            Self::EventCardTitle => Selector::test_id("eventCard.eventInfoTitle"),
            Self::EventCardDetails => Selector::test_id("eventCard.eventInfoDetails"),
            Self::EventCardFavorite => Selector::test_id("event-card-favourite-button"),
            Self::EventCardPoster => Selector::tag_class("img", "jYbobS"),
            Self::EventCardPrice => Selector::AnyOf(vec![
                Selector::test_id("eventCard.price"),
                Selector::test_id("eventCover.scheduleLink"),
            ]),
            Self::PlusCashbackBadge => Selector::test_id("plusCashbackBadge.item"),
            Self::EventCardRating => Selector::test_id_contains("rating"),
            Self::EventCardLink => Selector::test_id("eventCard.link"),
            Self::TopEventsWrapper => Selector::test_id("topEvents.wrapper"),
            Self::TopEventsContainer => Selector::test_id("topEvents.eventContainer"),
            Self::TopEventCard => Selector::class_contains("p8csoW"),
            Self::TopCardNumberImage => Selector::test_id("topCard.numberImage"),
            Self::TopCardPoster => Selector::test_id("topCard.eventImage"),
            Self::TopCardTitle => Selector::test_id("topCard.title"),
            Self::TopCardRubricTag => Selector::test_id("topCard.rubricTag"),
            Self::TopCardDate => Selector::test_id("topCard.date"),
            Self::TopControlRight => Selector::tag_class("button", "qb30XR"),
            Self::TopControlLeft => Selector::tag_class("button", "BDd2ZV"),
            Self::ViewedBlock => Selector::class("IMCiK8"),
            Self::ViewedCard => Selector::class("z2H_NI"),
            Self::ViewedCardTitle => Selector::tag_class("h3", "zLWwiG"),
            Self::SelectionPageTitle => {
                Selector::test_id("selectionPage.selectionPageHeader.title")
            }
        }
    }

    /// Document-wide locator for this element
    #[must_use]
    pub fn locator(self) -> Locator {
        Locator::new(self.selector())
    }

    /// Name and rendered selector
    #[must_use]
    pub fn descriptor(self) -> ElementDescriptor {
        ElementDescriptor {
            name: self.name(),
            selector: self.selector().to_css(),
        }
    }

    /// Look up an element by registry name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown element name: {s}"))
    }
}

/// Resolve an element to its selector
#[must_use]
pub fn resolve(id: ElementId) -> Selector {
    id.selector()
}

/// Registered element with its rendered selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementDescriptor {
    /// Registry name
    pub name: &'static str,
    /// CSS selector
    pub selector: String,
}

/// Descriptors for the whole registry, in declaration order
#[must_use]
pub fn descriptors() -> Vec<ElementDescriptor> {
    ElementId::ALL.into_iter().map(ElementId::descriptor).collect()
}
