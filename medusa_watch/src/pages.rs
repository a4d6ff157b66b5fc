//! Page route table
//!
//! Every page that follows manual searches is listed here under its `controller/action` route.
//! [bootstrap] resolves a route and runs its initializer against a shared [PageContext].
use crate::{
    poller::Poller,
    view::{SharedBoard, spawn_row_sweeper},
};
use anyhow::{Result, bail};
use medusa_api::models::ShowScope;
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::info;

/// How often the board is checked for due removals and stale rows
const ROW_SWEEP_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// Show list, follows searches for every show
    HomeIndex,
    /// Single show, follows that show's searches
    DisplayShow,
    /// Backlog overview, drops rows once their episode is snatched
    BacklogOverview,
}

pub const ROUTES: &[(&str, &str, Page)] = &[
    ("home", "index", Page::HomeIndex),
    ("home", "displayShow", Page::DisplayShow),
    ("manage", "backlogOverview", Page::BacklogOverview),
];

impl Page {
    /// Resolve a `controller/action` route; a bare controller means its `index` action
    pub fn resolve(route: &str) -> Result<Self> {
        let route = route.trim_matches('/');
        let (controller, action) = route.split_once('/').unwrap_or((route, "index"));
        match ROUTES
            .iter()
            .find(|(c, a, _)| *c == controller && *a == action)
        {
            Some((_, _, page)) => Ok(*page),
            None => {
                let available = ROUTES
                    .iter()
                    .map(|(c, a, _)| format!("{c}/{a}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                bail!("Unknown page '{route}'. Available pages: [{available}]")
            }
        }
    }
}

/// Everything a page initializer may use
pub struct PageContext {
    pub poller: Arc<Poller>,
    pub board: SharedBoard,
    pub row_removal_delay: Duration,
    pub row_retention: Duration,
    pub shutdown: watch::Receiver<bool>,
}

async fn init_home_index(ctx: &PageContext, scope: Option<ShowScope>) -> Result<()> {
    ctx.board.lock().await.set_auto_bind(true);
    ctx.poller.start(scope).await;
    Ok(())
}

async fn init_display_show(ctx: &PageContext, scope: Option<ShowScope>) -> Result<()> {
    let Some(scope) = scope else {
        bail!("The displayShow page needs a show, e.g. --show tvdb:81189");
    };
    ctx.board.lock().await.set_auto_bind(true);
    ctx.poller.start(Some(scope)).await;
    Ok(())
}

async fn init_backlog_overview(ctx: &PageContext, scope: Option<ShowScope>) -> Result<()> {
    {
        let mut board = ctx.board.lock().await;
        board.set_auto_bind(true);
        board.set_snatched_row_removal(Some(ctx.row_removal_delay));
    }
    ctx.poller.start(scope).await;
    Ok(())
}

/// Resolve `route` and run its initializer
pub async fn bootstrap(
    ctx: &PageContext,
    route: &str,
    scope: Option<ShowScope>,
) -> Result<Page> {
    let page = Page::resolve(route)?;
    info!(?page, scope = ?scope, "Opening page");

    match page {
        Page::HomeIndex => init_home_index(ctx, scope).await?,
        Page::DisplayShow => init_display_show(ctx, scope).await?,
        Page::BacklogOverview => init_backlog_overview(ctx, scope).await?,
    }
    spawn_row_sweeper(
        Arc::clone(&ctx.board),
        ROW_SWEEP_PERIOD,
        ctx.row_retention,
        ctx.shutdown.clone(),
    );
    Ok(page)
}
