//! Scrolls through a [Paginator] with four buttons bound to a single owner.
//!
//! The view state ([ScrollerView]) is independent of Discord, the output type
//! of the [ContentConstructor] is left open. [run] drives a view rendering
//! into a [CreateEmbed] as a poise reply.

use std::fmt::Display;
use std::pin::pin;
use std::time::Duration;

use itertools::Itertools;
use poise::CreateReply;
use serenity::ButtonStyle;
use serenity::CreateActionRow;
use serenity::CreateButton;
use serenity::CreateEmbed;
use serenity::CreateEmbedFooter;
use serenity::CreateInteractionResponse;
use serenity::CreateInteractionResponseMessage;
use serenity::EditMessage;
use serenity::UserId;
use thiserror::Error;
use tracing::instrument;

use super::embeds;
use super::paginator::Paginator;
use super::presses;
use crate::serenity;
use crate::BotError;
use crate::Context;

/// The page handed to a [ContentConstructor].
#[derive(Debug, Clone, Copy)]
pub struct Page<'a, T> {
    /// Items on this page, empty if the cursor is out of range.
    pub items: &'a [T],
    /// The 1-indexed page number.
    pub number: usize,
    /// Total number of pages.
    pub total: usize,
}

/// Builds the displayed output of a page from the previously displayed output.
pub trait ContentConstructor<T, O> {
    /// Render `page` on top of `previous`.
    fn render(&self, page: Page<'_, T>, previous: O) -> O;
}

impl<T, O, F> ContentConstructor<T, O> for F
where
    F: Fn(Page<'_, T>, O) -> O,
{
    fn render(&self, page: Page<'_, T>, previous: O) -> O {
        self(page, previous)
    }
}

/// Lists the page items in the embed description with a `Page X/Y` footer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConstructor;

impl<T: Display> ContentConstructor<T, CreateEmbed> for DefaultConstructor {
    fn render(&self, page: Page<'_, T>, previous: CreateEmbed) -> CreateEmbed {
        previous
            .description(page.items.iter().join("\n"))
            .footer(CreateEmbedFooter::new(format!(
                "Page {}/{}",
                page.number, page.total
            )))
    }
}

/// The four navigation buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavControl {
    First,
    Previous,
    Next,
    Last,
}

impl NavControl {
    /// All controls in display order.
    pub const ALL: [NavControl; 4] = [Self::First, Self::Previous, Self::Next, Self::Last];

    /// Button label.
    pub fn label(self) -> &'static str {
        match self {
            Self::First => "<<",
            Self::Previous => "<",
            Self::Next => ">",
            Self::Last => ">>",
        }
    }

    /// Suffix appended to the view's custom id prefix.
    fn suffix(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Previous => "prev",
            Self::Next => "next",
            Self::Last => "last",
        }
    }

    /// Full custom id of this control for a view with `prefix`.
    pub fn custom_id(self, prefix: &str) -> String {
        format!("{prefix}{}", self.suffix())
    }

    /// Inverse of [NavControl::custom_id].
    pub fn from_custom_id(prefix: &str, custom_id: &str) -> Option<Self> {
        let suffix = custom_id.strip_prefix(prefix)?;
        Self::ALL.into_iter().find(|c| c.suffix() == suffix)
    }
}

/// Rejected button presses.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScrollError {
    #[error("Only the user who ran the command can use these buttons.")]
    NotOwner,
}

/// A [Paginator] bound to its owner and the output currently displayed.
pub struct ScrollerView<T, O, C> {
    /// The list being scrolled.
    paginator: Paginator<T>,
    /// The only user allowed to press the buttons.
    owner: UserId,
    /// Renders a page into `O`.
    constructor: C,
    /// What is currently displayed.
    rendered: O,
}

impl<T, O, C> ScrollerView<T, O, C>
where
    O: Clone,
    C: ContentConstructor<T, O>,
{
    /// Bind `paginator` to `owner` and render its current page on top of `base`.
    pub fn new(paginator: Paginator<T>, owner: UserId, constructor: C, base: O) -> Self {
        let rendered = constructor.render(current(&paginator), base);
        Self {
            paginator,
            owner,
            constructor,
            rendered,
        }
    }

    /// What is currently displayed.
    pub fn rendered(&self) -> &O {
        &self.rendered
    }

    /// The underlying paginator.
    pub fn paginator(&self) -> &Paginator<T> {
        &self.paginator
    }

    /// Computed from the cursor on every call.
    pub fn is_disabled(&self, control: NavControl) -> bool {
        let page = self.paginator.current_page();
        match control {
            NavControl::First | NavControl::Previous => page == 1,
            NavControl::Next | NavControl::Last => page == self.paginator.total_page_count(),
        }
    }

    /// Handle `actor` pressing `control`.
    ///
    /// Presses by anyone but the owner are rejected without touching the cursor.
    pub fn press(&mut self, actor: UserId, control: NavControl) -> Result<(), ScrollError> {
        if actor != self.owner {
            return Err(ScrollError::NotOwner);
        }

        match control {
            NavControl::First => self.paginator.first_page(),
            NavControl::Previous => self.paginator.previous_page(),
            NavControl::Next => self.paginator.next_page(),
            NavControl::Last => self.paginator.last_page(),
        };

        let previous = self.rendered.clone();
        self.rendered = self.constructor.render(current(&self.paginator), previous);
        Ok(())
    }

    /// One row of buttons reflecting the current cursor.
    pub fn components(&self, prefix: &str) -> Vec<CreateActionRow> {
        self.build_components(prefix, |control| self.is_disabled(control))
    }

    /// The same row with every button disabled, for when the view expires.
    pub fn disabled_components(&self, prefix: &str) -> Vec<CreateActionRow> {
        self.build_components(prefix, |_| true)
    }

    fn build_components(
        &self,
        prefix: &str,
        disabled: impl Fn(NavControl) -> bool,
    ) -> Vec<CreateActionRow> {
        let buttons = NavControl::ALL
            .into_iter()
            .map(|control| {
                CreateButton::new(control.custom_id(prefix))
                    .label(control.label())
                    .style(ButtonStyle::Secondary)
                    .disabled(disabled(control))
            })
            .collect();
        vec![CreateActionRow::Buttons(buttons)]
    }
}

/// The current page of `paginator` as a [Page].
fn current<T>(paginator: &Paginator<T>) -> Page<'_, T> {
    Page {
        items: paginator.get_current_page().unwrap_or_default(),
        number: paginator.current_page(),
        total: paginator.total_page_count(),
    }
}

/// Send `view` as a reply and handle button presses until the view times out.
#[instrument(skip_all, fields(owner = %ctx.author()))]
pub async fn run<T, C>(
    ctx: Context<'_>,
    mut view: ScrollerView<T, CreateEmbed, C>,
) -> Result<(), BotError>
where
    T: Send + Sync,
    C: ContentConstructor<T, CreateEmbed> + Send + Sync,
{
    // Unique per invocation, so parallel scrollers don't steal each other's presses.
    let prefix = ctx.id().to_string();
    let timeout = Duration::from_secs(ctx.data().settings.scroller_timeout_secs);

    let reply = CreateReply::default()
        .embed(view.rendered().clone())
        .components(view.components(&prefix));
    let handle = ctx.send(reply).await?;
    // The command's token expires long before a busy scroller might, the final
    // edit goes through the bot token instead.
    let mut message = handle.message().await?.into_owned();

    tracing::debug!(
        pages = view.paginator().total_page_count(),
        "Scroller started."
    );

    let stream = presses::stream(ctx, &prefix);
    let mut stream = pin!(stream);

    while let Some(press) = presses::next_within(&mut stream, timeout).await {
        let Some(control) = NavControl::from_custom_id(&prefix, &press.data.custom_id) else {
            continue;
        };

        match view.press(press.user.id, control) {
            Err(rejection) => {
                tracing::debug!("{} pressed someone else's scroller.", press.user.name);
                embeds::respond_ephemeral(ctx, &press, embeds::error_warning(rejection)).await?;
            }
            Ok(()) => {
                let update = CreateInteractionResponseMessage::new()
                    .embed(view.rendered().clone())
                    .components(view.components(&prefix));
                press
                    .create_response(ctx, CreateInteractionResponse::UpdateMessage(update))
                    .await?;
            }
        }
    }

    tracing::debug!("Scroller timed out.");
    let expired = EditMessage::new()
        .embed(view.rendered().clone())
        .components(view.disabled_components(&prefix));
    message.edit(ctx, expired).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: UserId = UserId::new(1);
    const STRANGER: UserId = UserId::new(2);

    fn render_text(page: Page<'_, u32>, _previous: String) -> String {
        let items = page.items.iter().join(",");
        format!("{items} ({}/{})", page.number, page.total)
    }

    fn view(len: u32) -> ScrollerView<u32, String, fn(Page<'_, u32>, String) -> String> {
        let paginator = Paginator::new((1..=len).collect());
        let constructor: fn(Page<'_, u32>, String) -> String = render_text;
        ScrollerView::new(paginator, OWNER, constructor, String::new())
    }

    #[test]
    fn renders_first_page_on_creation() {
        let view = view(12);
        assert_eq!(view.rendered(), "1,2,3,4,5,6,7,8,9,10 (1/2)");
    }

    #[test]
    fn owner_navigates_and_output_is_rebuilt() {
        let mut view = view(23);
        view.press(OWNER, NavControl::Next).unwrap();
        assert_eq!(view.rendered(), "11,12,13,14,15,16,17,18,19,20 (2/3)");

        view.press(OWNER, NavControl::Last).unwrap();
        assert_eq!(view.rendered(), "21,22,23 (3/3)");

        view.press(OWNER, NavControl::First).unwrap();
        assert_eq!(view.paginator().current_page(), 1);
    }

    #[test]
    fn stranger_cannot_navigate() {
        let mut view = view(23);
        let before = view.rendered().clone();

        assert_eq!(
            view.press(STRANGER, NavControl::Next),
            Err(ScrollError::NotOwner)
        );
        assert_eq!(view.paginator().current_page(), 1);
        assert_eq!(view.rendered(), &before);
    }

    #[test]
    fn disabled_flags_follow_the_cursor() {
        let mut view = view(30);
        assert!(view.is_disabled(NavControl::First));
        assert!(view.is_disabled(NavControl::Previous));
        assert!(!view.is_disabled(NavControl::Next));
        assert!(!view.is_disabled(NavControl::Last));

        view.press(OWNER, NavControl::Next).unwrap();
        assert!(NavControl::ALL.iter().all(|c| !view.is_disabled(*c)));

        view.press(OWNER, NavControl::Last).unwrap();
        assert!(!view.is_disabled(NavControl::First));
        assert!(view.is_disabled(NavControl::Next));
        assert!(view.is_disabled(NavControl::Last));
    }

    #[test]
    fn single_page_disables_everything() {
        let view = view(4);
        assert!(NavControl::ALL.iter().all(|c| view.is_disabled(*c)));
    }

    #[test]
    fn expired_view_disables_every_button() {
        let view = view(30);
        let flags = |rows: Vec<CreateActionRow>| -> Vec<bool> {
            let rows = serde_json::to_value(rows).unwrap();
            rows[0]["components"]
                .as_array()
                .unwrap()
                .iter()
                .map(|button| button["disabled"].as_bool().unwrap_or(false))
                .collect()
        };

        assert_eq!(flags(view.components("9")), [true, true, false, false]);
        assert_eq!(flags(view.disabled_components("9")), [true; 4]);
    }

    #[test]
    fn custom_ids_round_trip_with_prefix() {
        for control in NavControl::ALL {
            let id = control.custom_id("42");
            assert_eq!(NavControl::from_custom_id("42", &id), Some(control));
            assert_eq!(NavControl::from_custom_id("43", &id), None);
        }
        assert_eq!(NavControl::from_custom_id("42", "42bogus"), None);
    }

    #[test]
    fn closures_are_constructors() {
        let paginator = Paginator::new(vec!['a', 'b']);
        let view = ScrollerView::new(
            paginator,
            OWNER,
            |page: Page<'_, char>, previous: String| format!("{previous}{}", page.items.len()),
            "items: ".to_string(),
        );
        assert_eq!(view.rendered(), "items: 2");
    }
}
