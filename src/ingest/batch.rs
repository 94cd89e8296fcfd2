use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, IntoActiveModel, sea_query::OnConflict,
};

use crate::error::AppResult;

const STAGE_TEMPLATE: &str = "{spinner} {msg}: {human_pos} rows ({per_sec}) [{elapsed}]";

/// Conflicting rows are skipped when `on_conflict` is given. Returns the
/// number of rows the database reports as written.
pub async fn insert_chunked<C, A>(
    db: &C,
    models: Vec<A>,
    chunk_size: usize,
    on_conflict: Option<OnConflict>,
) -> AppResult<u64>
where
    C: ConnectionTrait,
    A: ActiveModelTrait + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    let mut written = 0;
    let mut models = models.into_iter();
    loop {
        let chunk: Vec<A> = models.by_ref().take(chunk_size.max(1)).collect();
        if chunk.is_empty() {
            break;
        }
        let mut insert = <A::Entity as EntityTrait>::insert_many(chunk);
        if let Some(on_conflict) = on_conflict.clone() {
            insert = insert.on_conflict(on_conflict);
        }
        written += insert.exec_without_returning(db).await?;
    }
    Ok(written)
}

#[derive(Clone, Copy, Debug)]
pub struct Progress {
    enabled: bool,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn stage(&self, label: &'static str) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new_spinner().with_message(label);
        let style = ProgressStyle::with_template(STAGE_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    }
}
