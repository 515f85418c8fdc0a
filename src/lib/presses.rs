//! Component presses on a view, collected by a single long-lived collector.
//!
//! A view keeps one stream for its whole life, so presses arriving while an
//! earlier one is still being answered are queued instead of lost.

use std::time::Duration;

use futures::Stream;
use futures::StreamExt;
use serenity::ComponentInteraction;
use serenity::ComponentInteractionCollector;

use crate::serenity;
use crate::Context;

/// Every press on a component whose custom id starts with `prefix`.
pub fn stream(ctx: Context<'_>, prefix: &str) -> impl Stream<Item = ComponentInteraction> {
    let prefix = prefix.to_string();
    ComponentInteractionCollector::new(ctx)
        .filter(move |press| press.data.custom_id.starts_with(&prefix))
        .stream()
}

/// The next press, or `None` if `wait` passes without one.
pub async fn next_within<S>(presses: &mut S, wait: Duration) -> Option<S::Item>
where
    S: Stream + Unpin,
{
    tokio::time::timeout(wait, presses.next())
        .await
        .ok()
        .flatten()
}
