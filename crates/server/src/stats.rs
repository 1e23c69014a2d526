//! In-memory query statistics.
//!
//! Lives for the process lifetime only. The server keeps one [`QueryStats`]
//! behind a single `Mutex`, so every update is serialised and the counters
//! stay exact under concurrent requests.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use uuid::Uuid;

/// One `/ask` request that reached retrieval.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub question: String,
    pub retrieval_time_ms: f64,
    pub generation_time_ms: f64,
    pub total_time_ms: f64,
    pub documents_retrieved: usize,
    /// `false` when the completion call failed.
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Performance {
    pub avg_total_time_ms: f64,
    pub min_total_time_ms: f64,
    pub max_total_time_ms: f64,
    pub avg_retrieval_time_ms: f64,
    pub avg_generation_time_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSummary {
    pub total_queries: u64,
    pub successful_queries: u64,
    pub failed_generations: u64,
    pub performance: Performance,
}

/// Counters plus a bounded tail of per-query records.
#[derive(Debug)]
pub struct QueryStats {
    total: u64,
    successful: u64,
    failed_generations: u64,
    sum_total_ms: f64,
    sum_retrieval_ms: f64,
    sum_generation_ms: f64,
    min_total_ms: f64,
    max_total_ms: f64,
    recent: VecDeque<QueryRecord>,
    capacity: usize,
}

impl QueryStats {
    pub fn new(capacity: usize) -> Self {
        Self {
            total: 0,
            successful: 0,
            failed_generations: 0,
            sum_total_ms: 0.0,
            sum_retrieval_ms: 0.0,
            sum_generation_ms: 0.0,
            min_total_ms: f64::INFINITY,
            max_total_ms: 0.0,
            recent: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn record(&mut self, record: QueryRecord) {
        self.total += 1;
        if record.success {
            self.successful += 1;
        } else {
            self.failed_generations += 1;
        }
        self.sum_total_ms += record.total_time_ms;
        self.sum_retrieval_ms += record.retrieval_time_ms;
        self.sum_generation_ms += record.generation_time_ms;
        self.min_total_ms = self.min_total_ms.min(record.total_time_ms);
        self.max_total_ms = self.max_total_ms.max(record.total_time_ms);

        if self.capacity == 0 {
            return;
        }
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(record);
    }

    pub fn total_queries(&self) -> u64 {
        self.total
    }

    pub fn summary(&self) -> StatsSummary {
        if self.total == 0 {
            return StatsSummary::default();
        }
        let n = self.total as f64;
        StatsSummary {
            total_queries: self.total,
            successful_queries: self.successful,
            failed_generations: self.failed_generations,
            performance: Performance {
                avg_total_time_ms: round2(self.sum_total_ms / n),
                min_total_time_ms: round2(self.min_total_ms),
                max_total_time_ms: round2(self.max_total_ms),
                avg_retrieval_time_ms: round2(self.sum_retrieval_ms / n),
                avg_generation_time_ms: round2(self.sum_generation_ms / n),
            },
        }
    }

    /// Oldest first.
    pub fn records(&self) -> Vec<QueryRecord> {
        self.recent.iter().cloned().collect()
    }
}

/// Milliseconds with two decimals, as reported in every response.
pub fn round2(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(total: f64, success: bool) -> QueryRecord {
        QueryRecord {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            question: "Quando devo calibrar?".into(),
            retrieval_time_ms: total / 4.0,
            generation_time_ms: total * 3.0 / 4.0,
            total_time_ms: total,
            documents_retrieved: 5,
            success,
            error: (!success).then(|| "boom".to_string()),
        }
    }

    #[test]
    fn empty_stats_are_zero() {
        let stats = QueryStats::new(10);
        assert_eq!(stats.summary(), StatsSummary::default());
        assert!(stats.records().is_empty());
    }

    #[test]
    fn aggregates_and_outcomes() {
        let mut stats = QueryStats::new(10);
        stats.record(rec(100.0, true));
        stats.record(rec(300.0, true));
        stats.record(rec(200.0, false));

        let summary = stats.summary();
        assert_eq!(summary.total_queries, 3);
        assert_eq!(summary.successful_queries, 2);
        assert_eq!(summary.failed_generations, 1);
        assert_eq!(summary.performance.avg_total_time_ms, 200.0);
        assert_eq!(summary.performance.min_total_time_ms, 100.0);
        assert_eq!(summary.performance.max_total_time_ms, 300.0);
        assert_eq!(summary.performance.avg_retrieval_time_ms, 50.0);
        assert_eq!(summary.performance.avg_generation_time_ms, 150.0);
    }

    #[test]
    fn records_are_bounded_but_counters_are_not() {
        let mut stats = QueryStats::new(2);
        for i in 0..5 {
            stats.record(rec(i as f64, true));
        }
        assert_eq!(stats.total_queries(), 5);
        let records = stats.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].total_time_ms, 3.0);
        assert_eq!(records[1].total_time_ms, 4.0);
    }

    #[test]
    fn rounding() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(2.499), 2.5);
    }
}
