//! Implements the `/members` commands.
//!
//! Both list every member of the guild in a [ScrollerView], oldest first.

use futures::TryStreamExt;
use serenity::CreateEmbed;
use serenity::Member;
use serenity::Timestamp;
use tracing::instrument;

use crate::error::UserError;
use crate::lib::paginator::Paginator;
use crate::lib::scroller;
use crate::lib::scroller::DefaultConstructor;
use crate::lib::scroller::ScrollerView;
use crate::serenity;
use crate::BotError;
use crate::Context;

/// Member lists
#[poise::command(
    slash_command,
    guild_only,
    subcommands("created", "joined"),
    subcommand_required
)]
pub async fn members(_ctx: Context<'_>) -> Result<(), BotError> {
    Ok(())
}

/// Members by account creation date
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only, guild_cooldown = 5)]
pub async fn created(ctx: Context<'_>) -> Result<(), BotError> {
    let members = fetch_members(ctx).await?;
    let entries = members
        .iter()
        .map(|m| (m.display_name().to_string(), Some(m.user.created_at())))
        .collect();

    scroll(ctx, "Members by account age", entries).await
}

/// Members by the date they joined this server
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only, guild_cooldown = 5)]
pub async fn joined(ctx: Context<'_>) -> Result<(), BotError> {
    let members = fetch_members(ctx).await?;
    let entries = members
        .iter()
        .map(|m| (m.display_name().to_string(), m.joined_at))
        .collect();

    scroll(ctx, "Members by join date", entries).await
}

/// Every member of the guild the command was used in.
async fn fetch_members(ctx: Context<'_>) -> Result<Vec<Member>, BotError> {
    let guild = ctx.guild_id().ok_or(UserError::GuildOnly)?;
    let members: Vec<Member> = guild
        .members_iter(ctx.serenity_context())
        .try_collect()
        .await?;

    tracing::debug!("Fetched {} members of {guild}.", members.len());
    Ok(members)
}

/// Show `entries` sorted by date in a scroller titled `title`.
async fn scroll(
    ctx: Context<'_>,
    title: &str,
    entries: Vec<(String, Option<Timestamp>)>,
) -> Result<(), BotError> {
    let paginator = Paginator::new(member_lines(entries));
    if paginator.is_empty() {
        let nothing = UserError::NothingFound {
            what: "this server has no members to list".to_string(),
        };
        return Err(nothing.into());
    }

    let view = ScrollerView::new(
        paginator,
        ctx.author().id,
        DefaultConstructor,
        CreateEmbed::new().title(title),
    );
    scroller::run(ctx, view).await
}

/// `**#N** name - <date>` per entry, oldest first.
///
/// Entries without a date are put last, in the order they came.
fn member_lines(mut entries: Vec<(String, Option<Timestamp>)>) -> Vec<String> {
    entries.sort_by_key(|(_, date)| date.map_or(i64::MAX, |d| d.unix_timestamp()));

    entries
        .into_iter()
        .enumerate()
        .map(|(i, (name, date))| {
            let date = date.map_or("unknown".to_string(), |d| {
                format!("<t:{}:D>", d.unix_timestamp())
            });
            format!("**#{}** {name} - {date}", i + 1)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> Option<Timestamp> {
        Some(Timestamp::from_unix_timestamp(secs).unwrap())
    }

    #[test]
    fn lines_are_numbered_oldest_first() {
        let entries = vec![
            ("carol".to_string(), at(300)),
            ("alice".to_string(), at(100)),
            ("nobody".to_string(), None),
            ("bob".to_string(), at(200)),
        ];

        assert_eq!(
            member_lines(entries),
            [
                "**#1** alice - <t:100:D>",
                "**#2** bob - <t:200:D>",
                "**#3** carol - <t:300:D>",
                "**#4** nobody - unknown",
            ]
        );
    }

    #[test]
    fn no_members_make_an_empty_paginator() {
        assert!(Paginator::new(member_lines(Vec::new())).is_empty());
        assert!(!Paginator::new(member_lines(vec![("a".to_string(), at(1))])).is_empty());
    }
}
