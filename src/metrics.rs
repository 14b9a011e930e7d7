//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了同步过程的指标收集功能。

use dashmap::DashMap;
use lazy_static::lazy_static;
use std::time::Duration;

/// 计数器种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Counter {
    RowsLoaded,
    RecordsUpserted,
    RowsDeleted,
    PersistSkipped,
    PrepareFailures,
}

impl Counter {
    fn metric_name(&self) -> &'static str {
        match self {
            Counter::RowsLoaded => "store_rows_loaded_total",
            Counter::RecordsUpserted => "store_records_upserted_total",
            Counter::RowsDeleted => "store_rows_deleted_total",
            Counter::PersistSkipped => "store_persist_skipped_total",
            Counter::PrepareFailures => "store_prepare_failures_total",
        }
    }
}

/// 计时的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Load,
    Persist,
}

impl Phase {
    fn label(&self) -> &'static str {
        match self {
            Phase::Load => "load",
            Phase::Persist => "persist",
        }
    }
}

/// 指标收集器
///
/// 所有指标按表名区分
#[derive(Debug, Default)]
pub struct Metrics {
    counters: DashMap<(String, Counter), u64>,
    /// (累计秒数, 次数)
    durations: DashMap<(String, Phase), (f64, u64)>,
}

lazy_static! {
    /// 全局指标实例
    pub static ref GLOBAL_METRICS: Metrics = Metrics::default();
}

impl Metrics {
    pub fn increment(&self, table: &str, counter: Counter, by: u64) {
        *self
            .counters
            .entry((table.to_string(), counter))
            .or_insert(0) += by;
    }

    pub fn record_duration(&self, table: &str, phase: Phase, duration: Duration) {
        let mut entry = self
            .durations
            .entry((table.to_string(), phase))
            .or_insert((0.0, 0));
        entry.0 += duration.as_secs_f64();
        entry.1 += 1;
    }

    pub fn counter(&self, table: &str, counter: Counter) -> u64 {
        self.counters
            .get(&(table.to_string(), counter))
            .map(|v| *v)
            .unwrap_or(0)
    }

    /// 某阶段的调用次数
    pub fn duration_count(&self, table: &str, phase: Phase) -> u64 {
        self.durations
            .get(&(table.to_string(), phase))
            .map(|v| v.1)
            .unwrap_or(0)
    }

    pub fn reset(&self) {
        self.counters.clear();
        self.durations.clear();
    }

    /// 将所有指标格式化为文本，按表名排序
    pub fn render(&self) -> String {
        let mut counters: Vec<_> = self
            .counters
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        counters.sort();

        let mut durations: Vec<_> = self
            .durations
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        durations.sort_by(|a, b| a.0.cmp(&b.0));

        let mut output = String::new();
        for ((table, counter), value) in counters {
            output.push_str(&format!(
                "{}{{table=\"{}\"}} {}\n",
                counter.metric_name(),
                table,
                value
            ));
        }
        for ((table, phase), (total, count)) in durations {
            output.push_str(&format!(
                "store_duration_seconds_sum{{table=\"{}\", phase=\"{}\"}} {}\n",
                table,
                phase.label(),
                total
            ));
            output.push_str(&format!(
                "store_duration_seconds_count{{table=\"{}\", phase=\"{}\"}} {}\n",
                table,
                phase.label(),
                count
            ));
        }
        output
    }
}

/// 全局指标的文本形式
pub fn render() -> String {
    GLOBAL_METRICS.render()
}
