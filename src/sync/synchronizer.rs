//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 缓存到数据表的持久化：逐条upsert，再删除缓存中已不存在的行。
//!
//! 删除阶段先读出表中现有的 `id`，与缓存中的 `id` 比对后分批删除，
//! 单条语句的参数个数不随缓存大小增长。

use super::coercion::{coerce, coerce_fields};
use crate::backend::Store;
use crate::database::{
    value::SqlValue, Connection, Dialect, Statement, TableName, DELETE_BATCH_SIZE, ID_COLUMN,
};
use crate::error::{Result, StoreError};
use crate::metrics::{Counter, Phase, GLOBAL_METRICS};
use crate::record::{FieldValue, Record};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// 缓存中没有可保留的 `id` 时的删除策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptySurvivorPolicy {
    /// 不执行删除
    #[default]
    Skip,
    /// 清空整表
    Truncate,
}

/// 一次持久化的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PersistReport {
    pub upserted: usize,
    pub deleted: u64,
    /// 缓存为空，未发出任何语句
    pub skipped: bool,
}

impl PersistReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// 预编译失败：清空缓存后返回错误
fn prepare_or_clear<R, C, S>(
    conn: &C,
    table: &TableName,
    store: &mut S,
    sql: &str,
) -> Result<Box<dyn Statement>>
where
    C: Connection + ?Sized,
    S: Store<R>,
{
    debug!("Preparing: {}", sql);
    conn.prepare(sql)
        .map_err(|e| discard_cache::<R, _>(table, store, e))
}

fn discard_cache<R, S: Store<R>>(table: &TableName, store: &mut S, e: StoreError) -> StoreError {
    error!(
        "Prepare failed for table {}, discarding {} cached records: {}",
        table,
        store.count(),
        e
    );
    store.clear();
    GLOBAL_METRICS.increment(table.as_str(), Counter::PrepareFailures, 1);
    e
}

/// 删除表中 `id` 不在保留列表里的行，返回删除行数
///
/// 表中 `id` 为 NULL 的行不会被删除。`id` 按缓存键的文本形式比对
fn delete_stale<R, C, S>(
    conn: &C,
    dialect: Dialect,
    table: &TableName,
    store: &mut S,
    survivors: &[SqlValue],
) -> Result<u64>
where
    C: Connection + ?Sized,
    S: Store<R>,
{
    let keep: AHashSet<String> = survivors.iter().map(SqlValue::to_key_string).collect();
    let stale: Vec<SqlValue> = conn
        .query(&dialect.select_ids(table))?
        .into_iter()
        .filter_map(|row| row.value(ID_COLUMN).cloned())
        .filter(|id| !id.is_null() && !keep.contains(&id.to_key_string()))
        .collect();
    debug!("{} stale rows in {}", stale.len(), table);

    let mut deleted = 0;
    let mut batch: Option<(usize, Box<dyn Statement>)> = None;
    for chunk in stale.chunks(DELETE_BATCH_SIZE) {
        if batch.as_ref().map(|(len, _)| *len) != Some(chunk.len()) {
            let sql = dialect.delete_in(table, chunk.len());
            batch = Some((chunk.len(), prepare_or_clear::<R, _, _>(conn, table, store, &sql)?));
        }
        if let Some((_, delete)) = batch.as_mut() {
            deleted += delete.execute(chunk)?;
        }
    }
    Ok(deleted)
}

/// 将缓存写回数据表
///
/// 缓存为空时直接返回；执行失败原样向上抛出，不回滚已执行的语句
#[instrument(skip(conn, store), fields(table = %table))]
pub fn persist<R, C, S>(
    conn: &C,
    table: &TableName,
    store: &mut S,
    empty_survivors: EmptySurvivorPolicy,
) -> Result<PersistReport>
where
    R: Record,
    C: Connection + ?Sized,
    S: Store<R>,
{
    let records: Vec<Vec<(String, FieldValue)>> =
        store.find_all().into_iter().map(|record| record.fields()).collect();

    if store.count() < 1 {
        debug!("Cache for {} is empty, nothing to persist", table);
        GLOBAL_METRICS.increment(table.as_str(), Counter::PersistSkipped, 1);
        return Ok(PersistReport::skipped());
    }

    let start = Instant::now();
    let dialect = conn.dialect();
    let columns: Vec<String> = records[0].iter().map(|(name, _)| name.clone()).collect();

    let upsert_sql = match dialect.upsert(table, &columns) {
        Ok(sql) => sql,
        Err(e) => {
            let e = StoreError::prepare(format!("INSERT INTO {}", table), e);
            return Err(discard_cache::<R, _>(table, store, e));
        }
    };
    let mut upsert = prepare_or_clear::<R, _, _>(conn, table, store, &upsert_sql)?;

    let mut report = PersistReport::default();
    for fields in &records {
        upsert.execute(&coerce_fields(fields, &columns))?;
        report.upserted += 1;
    }
    info!("Upserted {} records into {}", report.upserted, table);

    let survivors: Vec<SqlValue> = records
        .iter()
        .filter_map(|fields| {
            fields
                .iter()
                .find(|(name, _)| name == ID_COLUMN)
                .map(|(_, value)| coerce(value))
        })
        .filter(|id| !id.is_null())
        .collect();

    if survivors.is_empty() {
        match empty_survivors {
            EmptySurvivorPolicy::Skip => {
                warn!("No ids to keep in {}, skipping delete phase", table);
            }
            EmptySurvivorPolicy::Truncate => {
                let sql = dialect.truncate(table);
                let mut truncate = prepare_or_clear::<R, _, _>(conn, table, store, &sql)?;
                report.deleted = truncate.execute(&[])?;
                info!("Truncated {}", table);
            }
        }
    } else {
        report.deleted = delete_stale::<R, _, _>(conn, dialect, table, store, &survivors)?;
        info!("Deleted {} stale rows from {}", report.deleted, table);
    }

    GLOBAL_METRICS.increment(
        table.as_str(),
        Counter::RecordsUpserted,
        report.upserted as u64,
    );
    GLOBAL_METRICS.increment(table.as_str(), Counter::RowsDeleted, report.deleted);
    GLOBAL_METRICS.record_duration(table.as_str(), Phase::Persist, start.elapsed());
    Ok(report)
}
