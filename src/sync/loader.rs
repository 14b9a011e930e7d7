//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 整表加载。

use super::key::resolve_key;
use crate::backend::Store;
use crate::database::{Connection, TableName};
use crate::error::Result;
use crate::metrics::{Counter, Phase, GLOBAL_METRICS};
use crate::record::Record;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// 读取整表并写入缓存
///
/// 不清空已有缓存；同键记录被覆盖。返回加载的记录数
#[instrument(skip(conn, store), fields(table = %table))]
pub fn load<R, C, S>(conn: &C, table: &TableName, store: &mut S) -> Result<usize>
where
    R: Record,
    C: Connection + ?Sized,
    S: Store<R>,
{
    let start = Instant::now();
    let sql = conn.dialect().select_all(table);
    debug!("Loading with: {}", sql);

    let rows = conn.query(&sql)?;
    let mut loaded = 0usize;
    for row in &rows {
        let record = R::from_row(row)?;
        let key = resolve_key(&record);
        if key.is_empty() {
            warn!("Record in table {} resolved to an empty key", table);
        }
        store.save(key, record);
        loaded += 1;
    }

    GLOBAL_METRICS.increment(table.as_str(), Counter::RowsLoaded, loaded as u64);
    GLOBAL_METRICS.record_duration(table.as_str(), Phase::Load, start.elapsed());
    info!("Loaded {} records from {}", loaded, table);
    Ok(loaded)
}
