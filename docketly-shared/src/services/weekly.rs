/// Weekly timesheet views
///
/// A contractor's week is laid out Monday to Sunday with every docket line
/// under its day; the overview lists every contractor who worked that week.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::models::contractor::Contractor;
use crate::models::docket_entry::{DocketEntry, HoursTotals, WeekLine};
use crate::models::worker_invoice::{InvoiceStatus, WorkerInvoice};
use crate::weekly::WeekRange;

/// Identifies the contractor a view belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractorRef {
    pub id: Uuid,
    pub nickname: String,
    pub full_name: String,
}

impl From<&Contractor> for ContractorRef {
    fn from(c: &Contractor) -> Self {
        Self {
            id: c.id,
            nickname: c.nickname.clone(),
            full_name: c.full_name.clone(),
        }
    }
}

/// Invoice state shown next to a week
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRef {
    pub id: Uuid,
    pub invoice_number: String,
    pub status: InvoiceStatus,
    pub total_cents: i64,
}

impl From<&WorkerInvoice> for InvoiceRef {
    fn from(i: &WorkerInvoice) -> Self {
        Self {
            id: i.id,
            invoice_number: i.invoice_number.clone(),
            status: i.status,
            total_cents: i.total_cents,
        }
    }
}

/// One day of a contractor's week
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// `Mon` .. `Sun`
    pub weekday: String,
    pub tonnage_hours: f64,
    pub day_labour_hours: f64,
    pub lines: Vec<WeekLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractorWeek {
    pub contractor: ContractorRef,
    pub week: WeekRange,
    pub days: Vec<DaySummary>,
    pub totals: HoursTotals,
    pub invoice: Option<InvoiceRef>,
}

/// One contractor's line in the week overview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractorWeekRow {
    pub contractor_id: Uuid,
    pub nickname: String,
    pub full_name: String,
    pub docket_count: i64,
    pub tonnage_hours: f64,
    pub day_labour_hours: f64,
    pub invoice_status: Option<InvoiceStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekOverview {
    pub week: WeekRange,
    pub contractors: Vec<ContractorWeekRow>,
    pub totals: HoursTotals,
}

/// Spreads a week's lines over its seven days
///
/// Lines outside the week are ignored.
pub fn build_days(week: &WeekRange, lines: Vec<WeekLine>) -> (Vec<DaySummary>, HoursTotals) {
    let mut days: Vec<DaySummary> = week
        .days()
        .iter()
        .map(|date| DaySummary {
            date: *date,
            weekday: date.weekday().to_string(),
            tonnage_hours: 0.0,
            day_labour_hours: 0.0,
            lines: Vec::new(),
        })
        .collect();
    let mut totals = HoursTotals::default();

    for line in lines {
        if !week.contains(line.work_date) {
            continue;
        }
        let index = line.work_date.weekday().num_days_from_monday() as usize;
        let day = &mut days[index];
        day.tonnage_hours += line.tonnage_hours;
        day.day_labour_hours += line.day_labour_hours;
        totals.add(line.tonnage_hours, line.day_labour_hours);
        day.lines.push(line);
    }

    (days, totals)
}

#[derive(Clone)]
pub struct WeeklyService {
    pool: PgPool,
}

impl WeeklyService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Seven days of one contractor's hours with the week's invoice state
    pub async fn contractor_week(
        &self,
        tenant_id: Uuid,
        contractor_id: Uuid,
        week: WeekRange,
    ) -> ServiceResult<ContractorWeek> {
        let contractor = Contractor::find(&self.pool, tenant_id, contractor_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Contractor"))?;

        let lines =
            DocketEntry::week_lines(&self.pool, tenant_id, contractor_id, week.start, week.end)
                .await?;
        let invoice = WorkerInvoice::find_for_week(&self.pool, contractor_id, week.start).await?;

        let (days, totals) = build_days(&week, lines);

        Ok(ContractorWeek {
            contractor: ContractorRef::from(&contractor),
            week,
            days,
            totals,
            invoice: invoice.as_ref().map(InvoiceRef::from),
        })
    }

    /// Per-contractor totals for a week, sorted by nickname
    pub async fn week_overview(&self, tenant_id: Uuid, week: WeekRange) -> ServiceResult<WeekOverview> {
        let hours =
            DocketEntry::totals_by_contractor(&self.pool, tenant_id, week.start, week.end).await?;
        let statuses: HashMap<Uuid, InvoiceStatus> =
            WorkerInvoice::for_week(&self.pool, tenant_id, week.start)
                .await?
                .into_iter()
                .map(|i| (i.contractor_id, i.status))
                .collect();

        let mut totals = HoursTotals::default();
        let contractors = hours
            .into_iter()
            .map(|h| {
                totals.add(h.tonnage_hours, h.day_labour_hours);
                ContractorWeekRow {
                    invoice_status: statuses.get(&h.contractor_id).copied(),
                    contractor_id: h.contractor_id,
                    nickname: h.nickname,
                    full_name: h.full_name,
                    docket_count: h.docket_count,
                    tonnage_hours: h.tonnage_hours,
                    day_labour_hours: h.day_labour_hours,
                }
            })
            .collect();

        Ok(WeekOverview {
            week,
            contractors,
            totals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(date: NaiveDate, tonnage: f64, day_labour: f64) -> WeekLine {
        WeekLine {
            work_date: date,
            docket_id: Uuid::new_v4(),
            builder_name: "Acme Homes".to_string(),
            company_code: "ACME".to_string(),
            location_name: "Lot 12".to_string(),
            tonnage_hours: tonnage,
            day_labour_hours: day_labour,
            notes: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_build_days_places_lines_by_weekday() {
        let week = WeekRange::parse("2026-W42").unwrap();
        let lines = vec![
            line(date(2026, 10, 12), 6.0, 0.0),
            line(date(2026, 10, 12), 0.0, 2.5),
            line(date(2026, 10, 17), 4.0, 4.0),
        ];

        let (days, totals) = build_days(&week, lines);

        assert_eq!(days.len(), 7);
        assert_eq!(days[0].weekday, "Mon");
        assert_eq!(days[6].weekday, "Sun");
        assert_eq!(days[0].lines.len(), 2);
        assert_eq!(days[0].tonnage_hours, 6.0);
        assert_eq!(days[0].day_labour_hours, 2.5);
        assert_eq!(days[5].date, date(2026, 10, 17));
        assert_eq!(days[5].tonnage_hours, 4.0);
        assert!(days[1].lines.is_empty());

        assert_eq!(totals.tonnage_hours, 10.0);
        assert_eq!(totals.day_labour_hours, 6.5);
    }

    #[test]
    fn test_build_days_ignores_lines_outside_week() {
        let week = WeekRange::parse("2026-W42").unwrap();
        let (days, totals) = build_days(&week, vec![line(date(2026, 10, 19), 8.0, 0.0)]);

        assert!(days.iter().all(|d| d.lines.is_empty()));
        assert!(totals.is_zero());
    }
}
