/// Per-contractor weekly history
///
/// The last N ISO weeks, newest first, each with summed hours and the
/// week's invoice if one exists. Weeks without hours are listed with zeros.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use super::weekly::{ContractorRef, InvoiceRef};
use crate::error::{ServiceError, ServiceResult};
use crate::models::contractor::Contractor;
use crate::models::docket_entry::{DocketEntry, HoursTotals, WeekHours};
use crate::models::worker_invoice::WorkerInvoice;
use crate::weekly::{last_n_weeks, WeekRange};

/// Weeks shown when the caller does not ask for a number
pub const DEFAULT_WEEKS: u32 = 12;

/// Longest history a caller may request
pub const MAX_WEEKS: u32 = 52;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryWeek {
    pub week: WeekRange,
    pub tonnage_hours: f64,
    pub day_labour_hours: f64,
    pub invoice: Option<InvoiceRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractorHistory {
    pub contractor: ContractorRef,
    pub weeks: Vec<HistoryWeek>,
    pub totals: HoursTotals,
    pub invoiced_cents: i64,
}

/// Clamps a requested week count to 1..=MAX_WEEKS
pub fn week_count(requested: Option<u32>) -> u32 {
    requested.unwrap_or(DEFAULT_WEEKS).clamp(1, MAX_WEEKS)
}

/// Lines up hours and invoices with the requested weeks
pub fn assemble(
    weeks: &[WeekRange],
    hours: Vec<WeekHours>,
    invoices: &[WorkerInvoice],
) -> Vec<HistoryWeek> {
    let hours: HashMap<NaiveDate, WeekHours> =
        hours.into_iter().map(|h| (h.week_start, h)).collect();
    let invoices: HashMap<NaiveDate, &WorkerInvoice> =
        invoices.iter().map(|i| (i.week_start, i)).collect();

    weeks
        .iter()
        .map(|week| {
            let worked = hours.get(&week.start);
            HistoryWeek {
                week: *week,
                tonnage_hours: worked.map_or(0.0, |h| h.tonnage_hours),
                day_labour_hours: worked.map_or(0.0, |h| h.day_labour_hours),
                invoice: invoices.get(&week.start).map(|i| InvoiceRef::from(*i)),
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct HistoryService {
    pool: PgPool,
}

impl HistoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn contractor_history(
        &self,
        tenant_id: Uuid,
        contractor_id: Uuid,
        weeks: Option<u32>,
    ) -> ServiceResult<ContractorHistory> {
        let contractor = Contractor::find(&self.pool, tenant_id, contractor_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Contractor"))?;

        let ranges = last_n_weeks(Utc::now().date_naive(), week_count(weeks) as usize);
        let (Some(newest), Some(oldest)) = (ranges.first(), ranges.last()) else {
            return Err(ServiceError::validation("weeks", "must be at least 1"));
        };

        let hours =
            DocketEntry::weekly_totals(&self.pool, tenant_id, contractor_id, oldest.start, newest.end)
                .await?;
        let invoices = WorkerInvoice::for_contractor(
            &self.pool,
            tenant_id,
            contractor_id,
            oldest.start,
            newest.start,
        )
        .await?;

        let weeks = assemble(&ranges, hours, &invoices);

        let mut totals = HoursTotals::default();
        for week in &weeks {
            totals.add(week.tonnage_hours, week.day_labour_hours);
        }
        let invoiced_cents = weeks
            .iter()
            .filter_map(|w| w.invoice.as_ref())
            .map(|i| i.total_cents)
            .sum();

        Ok(ContractorHistory {
            contractor: ContractorRef::from(&contractor),
            weeks,
            totals,
            invoiced_cents,
        })
    }
}
