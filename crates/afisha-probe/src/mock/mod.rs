//! In-memory browser for exercising the facade without Chromium.
//!
//! A [`MockSite`] maps absolute URLs to page builders. Each [`MockSession`]
//! keeps its own visit history and live DOM, so pages can render state
//! such as a "recently viewed" block from earlier navigations. Clicks and
//! key presses trigger [`MockAction`]s declared on the page.

mod dom;
mod session;

pub use dom::{MockAction, MockDocument, MockElement};
pub use session::{MockSession, MockSessionFactory, MockSite, PageBuilder};
