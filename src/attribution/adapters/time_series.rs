//! Serverless services weighted by a summed usage metric.

use crate::attribution::allocator::{allocate, sort_by_cost_desc};
use crate::attribution::types::{AdapterOutcome, AllocationMethod, LineItem};
use crate::cloud::{MetricQuery, MetricsSource, TimeWindow};
use crate::error::CollaboratorError;
use std::collections::BTreeMap;

/// A metric and the resource label it is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SeriesMetric {
    metric_type: &'static str,
    resource_type: &'static str,
    group_by: &'static str,
    method: AllocationMethod,
}

const BILLABLE_INSTANCE_TIME: SeriesMetric = SeriesMetric {
    metric_type: "run.googleapis.com/container/billable_instance_time",
    resource_type: "cloud_run_revision",
    group_by: "service_name",
    method: AllocationMethod::BillableInstanceTime,
};

const EXECUTION_TIMES: SeriesMetric = SeriesMetric {
    metric_type: "cloudfunctions.googleapis.com/function/execution_times",
    resource_type: "cloud_function",
    group_by: "function_name",
    method: AllocationMethod::FunctionExecutionTimes,
};

const EXECUTION_COUNT: SeriesMetric = SeriesMetric {
    metric_type: "cloudfunctions.googleapis.com/function/execution_count",
    resource_type: "cloud_function",
    group_by: "function_name",
    method: AllocationMethod::FunctionExecutionCount,
};

/// Which serverless family a line item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesSource {
    /// Cloud Run services
    ContainerService,
    /// Cloud Run Functions
    FunctionService,
}

impl SeriesSource {
    /// Metrics to try in order; the first one with data wins.
    fn metrics(&self) -> &'static [SeriesMetric] {
        match self {
            Self::ContainerService => &[BILLABLE_INSTANCE_TIME],
            Self::FunctionService => &[EXECUTION_TIMES, EXECUTION_COUNT],
        }
    }

    /// The method reported when no metric has data.
    pub fn primary_method(&self) -> AllocationMethod {
        self.metrics()[0].method
    }

    /// Allocate `item` by the summed metric of each service or function.
    ///
    /// Returns the method of the metric that was used alongside the outcome.
    pub async fn allocate<M: MetricsSource>(
        &self,
        metrics: &M,
        item: &LineItem,
        lookback_days: u32,
    ) -> Result<(AllocationMethod, AdapterOutcome), CollaboratorError> {
        let window = TimeWindow::lookback(lookback_days);

        for metric in self.metrics() {
            let query = MetricQuery {
                metric_type: metric.metric_type,
                resource_type: metric.resource_type,
                group_by: metric.group_by,
                window,
            };
            let totals = metrics.sum_by_label(&query).await?;
            if totals.is_empty() {
                log::debug!("No data for {}", metric.metric_type);
                continue;
            }
            return Ok((metric.method, split(item, &totals)));
        }

        Ok((self.primary_method(), AdapterOutcome::NoData))
    }
}

fn split(item: &LineItem, totals: &BTreeMap<String, f64>) -> AdapterOutcome {
    let weighted: Vec<(String, f64)> = totals
        .iter()
        .map(|(name, total)| (name.clone(), *total))
        .collect();
    let mut resources = allocate(item.total_cost, item.total_usage, &weighted);
    sort_by_cost_desc(&mut resources);
    AdapterOutcome::from_allocation(resources)
}
