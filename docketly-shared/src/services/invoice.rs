/// Weekly worker invoices
///
/// A worker prepares the DRAFT for a week (recomputed from dockets every
/// time), submits it, and an admin marks it paid. Each transition that
/// someone must hear about queues a notification in the same transaction.
///
/// # Amounts
///
/// ```text
/// subtotal = round(tonnage_hours × tonnage_rate) + round(day_labour_hours × day_labour_rate)
/// gst      = round(subtotal / 10)    when the contractor is GST registered
/// total    = subtotal + gst
/// ```
///
/// Rates are cents per hour; every amount is whole cents.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::weekly::ContractorRef;
use crate::auth::authorization::require_contractor_access;
use crate::auth::middleware::AuthContext;
use crate::crypto::{mask, FieldCipher};
use crate::error::{ServiceError, ServiceResult};
use crate::export::csv::{to_csv, CsvRow};
use crate::export::pdf::{Align, Column, PdfDocument};
use crate::export::{format_cents, format_hours};
use crate::models::contractor::Contractor;
use crate::models::docket_entry::{DocketEntry, HoursTotals};
use crate::models::notification::{NewNotification, Notification, NotificationKind};
use crate::models::tenant::Tenant;
use crate::models::user::User;
use crate::models::worker_invoice::{
    InvoiceDraft, InvoiceFilter, InvoiceStatus, InvoiceSummary, PaymentRow, WorkerInvoice,
};
use crate::pagination::{Page, PageParams};
use crate::weekly::WeekRange;

/// Computed money columns of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceAmounts {
    pub subtotal_cents: i64,
    pub gst_cents: i64,
    pub total_cents: i64,
}

impl InvoiceAmounts {
    pub fn compute(
        hours: &HoursTotals,
        tonnage_rate_cents: i64,
        day_labour_rate_cents: i64,
        gst_registered: bool,
    ) -> Self {
        let subtotal_cents = line_amount(hours.tonnage_hours, tonnage_rate_cents)
            + line_amount(hours.day_labour_hours, day_labour_rate_cents);
        let gst_cents = if gst_registered { gst_on(subtotal_cents) } else { 0 };

        Self {
            subtotal_cents,
            gst_cents,
            total_cents: subtotal_cents + gst_cents,
        }
    }
}

/// Hours at a cents-per-hour rate, rounded half away from zero
pub fn line_amount(hours: f64, rate_cents: i64) -> i64 {
    (hours * rate_cents as f64).round() as i64
}

/// One tenth of `subtotal_cents`, rounded half up
pub fn gst_on(subtotal_cents: i64) -> i64 {
    (subtotal_cents + 5).div_euclid(10)
}

/// `{NICKNAME}-{ISO_YEAR}W{WW}`, whitespace in the nickname becoming `-`
pub fn invoice_number(nickname: &str, week: &WeekRange) -> String {
    let code: String = nickname
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_uppercase();
    format!("{}-{}", code, week.compact_label())
}

/// Invoice with the contractor it belongs to
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: WorkerInvoice,
    pub contractor: ContractorRef,
}

/// List filters for `/v1/invoices`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceQuery {
    pub status: Option<InvoiceStatus>,
    pub contractor_id: Option<Uuid>,
    /// `YYYY-Www` or any date in the week
    pub week: Option<String>,
}

impl InvoiceQuery {
    pub fn into_filter(self) -> ServiceResult<InvoiceFilter> {
        let week_start = self
            .week
            .as_deref()
            .map(WeekRange::parse)
            .transpose()?
            .map(|w| w.start);

        Ok(InvoiceFilter {
            status: self.status,
            contractor_id: self.contractor_id,
            week_start,
        })
    }
}

/// Payment run line with bank details in clear
#[derive(Debug, Clone)]
pub struct PaymentLine {
    pub invoice_number: String,
    pub week_start: NaiveDate,
    pub contractor_full_name: String,
    pub contractor_nickname: String,
    pub abn: Option<String>,
    pub bank_account_name: Option<String>,
    pub bank_bsb: Option<String>,
    pub bank_account_number: Option<String>,
    pub total_cents: i64,
}

impl CsvRow for PaymentLine {
    fn headers() -> &'static [&'static str] {
        &[
            "invoice_number",
            "week_start",
            "contractor",
            "nickname",
            "abn",
            "account_name",
            "bsb",
            "account_number",
            "amount",
        ]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.invoice_number.clone(),
            self.week_start.to_string(),
            self.contractor_full_name.clone(),
            self.contractor_nickname.clone(),
            self.abn.clone().unwrap_or_default(),
            self.bank_account_name.clone().unwrap_or_default(),
            self.bank_bsb.clone().unwrap_or_default(),
            self.bank_account_number.clone().unwrap_or_default(),
            format_cents(self.total_cents),
        ]
    }
}

/// Everything printed on an invoice PDF
#[derive(Debug, Clone)]
pub struct InvoiceDocument {
    pub business_name: String,
    pub invoice: WorkerInvoice,
    pub contractor_full_name: String,
    pub contractor_email: Option<String>,
    pub abn: Option<String>,
    pub gst_registered: bool,
    pub bank_account_name: Option<String>,
    pub bank_bsb_masked: Option<String>,
    pub bank_account_masked: Option<String>,
    /// Hours per day of the week, Monday first
    pub days: Vec<(NaiveDate, HoursTotals)>,
}

impl InvoiceDocument {
    pub fn render(&self) -> Vec<u8> {
        let invoice = &self.invoice;
        let heading = if self.gst_registered { "Tax Invoice" } else { "Invoice" };

        let mut doc = PdfDocument::new(format!("{} {}", heading, invoice.invoice_number));
        doc.heading(heading);
        doc.key_value("Invoice number", &invoice.invoice_number);
        doc.key_value(
            "Week",
            &format!("{} to {}", invoice.week_start, invoice.week_end),
        );
        doc.key_value("Status", invoice.status.as_str());
        doc.key_value("Bill to", &self.business_name);
        doc.spacer(8.0);

        doc.bold_line("From");
        doc.key_value("Contractor", &self.contractor_full_name);
        if let Some(abn) = &self.abn {
            doc.key_value("ABN", abn);
        }
        if let Some(email) = &self.contractor_email {
            doc.key_value("Email", email);
        }
        doc.spacer(8.0);

        let columns = [
            Column::new("Date", 2.0),
            Column::new("Tonnage hrs", 1.2).align(Align::Right),
            Column::new("Day labour hrs", 1.2).align(Align::Right),
            Column::new("Amount", 1.2).align(Align::Right),
        ];
        let rows: Vec<Vec<String>> = self
            .days
            .iter()
            .filter(|(_, hours)| !hours.is_zero())
            .map(|(date, hours)| {
                let amount = line_amount(hours.tonnage_hours, invoice.tonnage_rate_cents)
                    + line_amount(hours.day_labour_hours, invoice.day_labour_rate_cents);
                vec![
                    date.format("%a %d %b %Y").to_string(),
                    format_hours(hours.tonnage_hours),
                    format_hours(hours.day_labour_hours),
                    format_cents(amount),
                ]
            })
            .collect();
        doc.table(&columns, &rows);
        doc.spacer(6.0);

        doc.line(&format!(
            "Tonnage: {} hrs @ ${}/hr    Day labour: {} hrs @ ${}/hr",
            format_hours(invoice.tonnage_hours),
            format_cents(invoice.tonnage_rate_cents),
            format_hours(invoice.day_labour_hours),
            format_cents(invoice.day_labour_rate_cents),
        ));
        doc.rule();
        doc.total_line("Subtotal", &format!("${}", format_cents(invoice.subtotal_cents)), false);
        doc.total_line("GST", &format!("${}", format_cents(invoice.gst_cents)), false);
        doc.total_line("Total", &format!("${}", format_cents(invoice.total_cents)), true);
        doc.spacer(12.0);

        doc.bold_line("Payment details");
        doc.key_value(
            "Account name",
            self.bank_account_name.as_deref().unwrap_or("-"),
        );
        doc.key_value("BSB", self.bank_bsb_masked.as_deref().unwrap_or("-"));
        doc.key_value(
            "Account number",
            self.bank_account_masked.as_deref().unwrap_or("-"),
        );

        doc.finish()
    }
}

#[derive(Clone)]
pub struct InvoiceService {
    pool: PgPool,
    cipher: FieldCipher,
}

impl InvoiceService {
    pub fn new(pool: PgPool, cipher: FieldCipher) -> Self {
        Self { pool, cipher }
    }

    /// Creates or refreshes the week's DRAFT from docket entries
    pub async fn prepare(
        &self,
        tenant_id: Uuid,
        contractor_id: Uuid,
        week: WeekRange,
    ) -> ServiceResult<WorkerInvoice> {
        let mut tx = self.pool.begin().await?;
        let invoice = refresh_draft(&mut tx, tenant_id, contractor_id, &week).await?;
        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant_id,
            invoice_id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            total_cents = invoice.total_cents,
            "Invoice draft prepared"
        );
        Ok(invoice)
    }

    /// DRAFT → SUBMITTED, notifying every active admin
    ///
    /// Amounts are recomputed first so the submitted figures match the
    /// dockets at the moment of submission. The invoice and contractor rows
    /// are locked beforehand, so docket writes for the contractor either
    /// commit first or see the week as locked.
    pub async fn submit(&self, tenant_id: Uuid, invoice_id: Uuid) -> ServiceResult<WorkerInvoice> {
        let mut tx = self.pool.begin().await?;

        let current = WorkerInvoice::find_for_update(&mut *tx, tenant_id, invoice_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Invoice"))?;
        check_transition(current.status, InvoiceStatus::Submitted)?;

        // Waits for in-flight docket writes touching this contractor
        if !Contractor::lock_for_update(&mut *tx, tenant_id, current.contractor_id).await? {
            return Err(ServiceError::not_found("Contractor"));
        }

        let week = WeekRange::containing(current.week_start);
        refresh_draft(&mut tx, tenant_id, current.contractor_id, &week).await?;

        let invoice = WorkerInvoice::submit(&mut *tx, tenant_id, invoice_id)
            .await?
            .ok_or_else(|| ServiceError::invalid_state("Invoice is no longer a draft"))?;

        let contractor = Contractor::find(&mut *tx, tenant_id, invoice.contractor_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Contractor"))?;
        let admins = User::active_admins(&mut *tx, tenant_id).await?;

        for admin in &admins {
            Notification::enqueue(
                &mut *tx,
                &NewNotification {
                    tenant_id,
                    kind: NotificationKind::InvoiceSubmitted,
                    recipient: admin.email.clone(),
                    subject: format!(
                        "Invoice {} submitted by {}",
                        invoice.invoice_number, contractor.full_name
                    ),
                    body: format!(
                        "Hi {},\n\n{} has submitted invoice {} for the week {} to {}.\n\
                         Total: ${}\n\nThe invoice PDF is attached.",
                        admin.name,
                        contractor.full_name,
                        invoice.invoice_number,
                        invoice.week_start,
                        invoice.week_end,
                        format_cents(invoice.total_cents),
                    ),
                    invoice_id: Some(invoice.id),
                },
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant_id,
            invoice_id = %invoice.id,
            notified = admins.len(),
            "Invoice submitted"
        );
        Ok(invoice)
    }

    /// SUBMITTED → PAID, notifying the contractor
    pub async fn mark_paid(&self, tenant_id: Uuid, invoice_id: Uuid) -> ServiceResult<WorkerInvoice> {
        let mut tx = self.pool.begin().await?;

        let current = WorkerInvoice::find(&mut *tx, tenant_id, invoice_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Invoice"))?;
        check_transition(current.status, InvoiceStatus::Paid)?;

        let invoice = WorkerInvoice::mark_paid(&mut *tx, tenant_id, invoice_id)
            .await?
            .ok_or_else(|| ServiceError::invalid_state("Invoice is no longer submitted"))?;

        let contractor = Contractor::find(&mut *tx, tenant_id, invoice.contractor_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Contractor"))?;

        match &contractor.email {
            Some(email) => {
                Notification::enqueue(
                    &mut *tx,
                    &NewNotification {
                        tenant_id,
                        kind: NotificationKind::InvoicePaid,
                        recipient: email.clone(),
                        subject: format!("Invoice {} has been paid", invoice.invoice_number),
                        body: format!(
                            "Hi {},\n\nYour invoice {} for the week {} to {} has been paid.\n\
                             Amount: ${}",
                            contractor.full_name,
                            invoice.invoice_number,
                            invoice.week_start,
                            invoice.week_end,
                            format_cents(invoice.total_cents),
                        ),
                        invoice_id: Some(invoice.id),
                    },
                )
                .await?;
            }
            None => tracing::warn!(
                contractor_id = %contractor.id,
                "Contractor has no email; paid notification skipped"
            ),
        }

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant_id, invoice_id = %invoice.id, "Invoice marked paid");
        Ok(invoice)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &InvoiceFilter,
        page: &PageParams,
    ) -> ServiceResult<Page<InvoiceSummary>> {
        let (invoices, total) = WorkerInvoice::list(&self.pool, tenant_id, filter, page).await?;
        Ok(Page::new(invoices, total, page))
    }

    pub async fn get(&self, tenant_id: Uuid, invoice_id: Uuid) -> ServiceResult<InvoiceDetail> {
        let invoice = self.find(tenant_id, invoice_id).await?;
        let contractor = Contractor::find(&self.pool, tenant_id, invoice.contractor_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Contractor"))?;

        Ok(InvoiceDetail {
            contractor: ContractorRef::from(&contractor),
            invoice,
        })
    }

    /// Admins see any invoice; workers only those of their own contractor
    pub async fn authorize(&self, auth: &AuthContext, invoice_id: Uuid) -> ServiceResult<()> {
        let invoice = self.find(auth.tenant_id, invoice_id).await?;
        if auth.is_admin() {
            return Ok(());
        }

        let contractor = Contractor::find(&self.pool, auth.tenant_id, invoice.contractor_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Contractor"))?;
        require_contractor_access(auth, contractor.user_id)?;
        Ok(())
    }

    /// Renders the invoice as a PDF with masked bank details
    pub async fn render_pdf(&self, tenant_id: Uuid, invoice_id: Uuid) -> ServiceResult<Vec<u8>> {
        let invoice = self.find(tenant_id, invoice_id).await?;
        let contractor = Contractor::find(&self.pool, tenant_id, invoice.contractor_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Contractor"))?;
        let tenant = Tenant::find_by_id(&self.pool, tenant_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tenant"))?;

        let week = WeekRange::containing(invoice.week_start);
        let lines = DocketEntry::week_lines(
            &self.pool,
            tenant_id,
            contractor.id,
            week.start,
            week.end,
        )
        .await?;

        let days = week
            .days()
            .iter()
            .map(|date| {
                let mut hours = HoursTotals::default();
                for line in lines.iter().filter(|l| l.work_date == *date) {
                    hours.add(line.tonnage_hours, line.day_labour_hours);
                }
                (*date, hours)
            })
            .collect();

        let masked = |v: Option<String>| v.map(|v| mask(&v));
        let document = InvoiceDocument {
            business_name: tenant.name,
            bank_bsb_masked: masked(self.cipher.decrypt_opt(contractor.bank_bsb.as_deref())?),
            bank_account_masked: masked(
                self.cipher.decrypt_opt(contractor.bank_account_number.as_deref())?,
            ),
            contractor_full_name: contractor.full_name,
            contractor_email: contractor.email,
            abn: contractor.abn,
            gst_registered: contractor.gst_registered,
            bank_account_name: contractor.bank_account_name,
            invoice,
            days,
        };

        Ok(document.render())
    }

    /// SUBMITTED invoices with decrypted bank details, for bank upload
    pub async fn payment_run_csv(&self, tenant_id: Uuid) -> ServiceResult<Vec<u8>> {
        let rows = WorkerInvoice::awaiting_payment(&self.pool, tenant_id).await?;
        let lines = rows
            .into_iter()
            .map(|row| self.payment_line(row))
            .collect::<ServiceResult<Vec<_>>>()?;

        tracing::info!(tenant_id = %tenant_id, invoices = lines.len(), "Payment run exported");
        Ok(to_csv(&lines)?)
    }

    pub(crate) async fn find(&self, tenant_id: Uuid, invoice_id: Uuid) -> ServiceResult<WorkerInvoice> {
        WorkerInvoice::find(&self.pool, tenant_id, invoice_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Invoice"))
    }

    fn payment_line(&self, row: PaymentRow) -> ServiceResult<PaymentLine> {
        Ok(PaymentLine {
            bank_bsb: self.cipher.decrypt_opt(row.bank_bsb.as_deref())?,
            bank_account_number: self.cipher.decrypt_opt(row.bank_account_number.as_deref())?,
            invoice_number: row.invoice_number,
            week_start: row.week_start,
            contractor_full_name: row.contractor_full_name,
            contractor_nickname: row.contractor_nickname,
            abn: row.abn,
            bank_account_name: row.bank_account_name,
            total_cents: row.total_cents,
        })
    }
}

/// Maps a refused transition to `InvalidState`
fn check_transition(current: InvoiceStatus, next: InvoiceStatus) -> ServiceResult<()> {
    if current.can_transition_to(next) {
        return Ok(());
    }
    Err(ServiceError::invalid_state(format!(
        "Invoice is {}; it cannot become {}",
        current, next
    )))
}

/// Recomputes hours and amounts and upserts the DRAFT inside `tx`
async fn refresh_draft(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: Uuid,
    contractor_id: Uuid,
    week: &WeekRange,
) -> ServiceResult<WorkerInvoice> {
    let contractor = Contractor::find(&mut **tx, tenant_id, contractor_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Contractor"))?;

    if let Some(existing) = WorkerInvoice::find_for_week(&mut **tx, contractor_id, week.start).await? {
        if existing.status != InvoiceStatus::Draft {
            return Err(ServiceError::invalid_state(format!(
                "Invoice {} is already {}",
                existing.invoice_number, existing.status
            )));
        }
    }

    let hours =
        DocketEntry::totals_for_contractor(&mut **tx, tenant_id, contractor_id, week.start, week.end)
            .await?;
    if hours.is_zero() {
        return Err(ServiceError::validation(
            "week",
            format!("No hours recorded for {} in {}", contractor.nickname, week.label()),
        ));
    }

    let amounts = InvoiceAmounts::compute(
        &hours,
        contractor.tonnage_rate_cents,
        contractor.day_labour_rate_cents,
        contractor.gst_registered,
    );
    let draft = InvoiceDraft {
        contractor_id,
        invoice_number: invoice_number(&contractor.nickname, week),
        week_start: week.start,
        week_end: week.end,
        tonnage_hours: hours.tonnage_hours,
        day_labour_hours: hours.day_labour_hours,
        tonnage_rate_cents: contractor.tonnage_rate_cents,
        day_labour_rate_cents: contractor.day_labour_rate_cents,
        subtotal_cents: amounts.subtotal_cents,
        gst_cents: amounts.gst_cents,
        total_cents: amounts.total_cents,
    };

    WorkerInvoice::upsert_draft(&mut **tx, tenant_id, &draft)
        .await?
        .ok_or_else(|| ServiceError::invalid_state("Invoice for this week has already been submitted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn hours(tonnage: f64, day_labour: f64) -> HoursTotals {
        HoursTotals {
            tonnage_hours: tonnage,
            day_labour_hours: day_labour,
        }
    }

    #[test]
    fn test_amounts_without_gst() {
        let amounts = InvoiceAmounts::compute(&hours(38.0, 4.5), 5250, 4500, false);
        // 38 × 52.50 = 1995.00, 4.5 × 45.00 = 202.50
        assert_eq!(amounts.subtotal_cents, 219_750);
        assert_eq!(amounts.gst_cents, 0);
        assert_eq!(amounts.total_cents, 219_750);
    }

    #[test]
    fn test_amounts_with_gst() {
        let amounts = InvoiceAmounts::compute(&hours(10.0, 0.0), 4999, 0, true);
        assert_eq!(amounts.subtotal_cents, 49_990);
        assert_eq!(amounts.gst_cents, 4_999);
        assert_eq!(amounts.total_cents, 54_989);
    }

    #[test]
    fn test_line_rounding() {
        // 7.25 × 33.33 = 241.6425 -> 241.64
        assert_eq!(line_amount(7.25, 3333), 24_164);
        // 0.5 × 0.01 = 0.005 -> 0.01
        assert_eq!(line_amount(0.5, 1), 1);
        assert_eq!(line_amount(0.0, 9999), 0);
    }

    #[test]
    fn test_gst_rounds_half_up() {
        assert_eq!(gst_on(1005), 101);
        assert_eq!(gst_on(1004), 100);
        assert_eq!(gst_on(0), 0);
    }

    #[test]
    fn test_invoice_number() {
        let week = WeekRange::parse("2026-W42").unwrap();
        assert_eq!(invoice_number("baz", &week), "BAZ-2026W42");
        assert_eq!(invoice_number(" big mick ", &week), "BIG-MICK-2026W42");

        let week = WeekRange::parse("2026-W01").unwrap();
        assert_eq!(invoice_number("Tess", &week), "TESS-2026W01");
    }

    #[test]
    fn test_transition_errors_are_invalid_state() {
        assert!(check_transition(InvoiceStatus::Draft, InvoiceStatus::Submitted).is_ok());
        assert!(matches!(
            check_transition(InvoiceStatus::Paid, InvoiceStatus::Submitted),
            Err(ServiceError::InvalidState(_))
        ));
        assert!(matches!(
            check_transition(InvoiceStatus::Draft, InvoiceStatus::Paid),
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[test]
    fn test_query_parses_week() {
        let filter = InvoiceQuery {
            week: Some("2026-10-14".to_string()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.week_start, NaiveDate::from_ymd_opt(2026, 10, 12));

        let bad = InvoiceQuery {
            week: Some("next week".to_string()),
            ..Default::default()
        };
        assert!(bad.into_filter().is_err());
    }

    #[test]
    fn test_payment_line_record() {
        let line = PaymentLine {
            invoice_number: "BAZ-2026W42".to_string(),
            week_start: NaiveDate::from_ymd_opt(2026, 10, 12).unwrap(),
            contractor_full_name: "Barry Ziggurat".to_string(),
            contractor_nickname: "BAZ".to_string(),
            abn: None,
            bank_account_name: Some("B Ziggurat".to_string()),
            bank_bsb: Some("062-000".to_string()),
            bank_account_number: Some("12345678".to_string()),
            total_cents: 219_750,
        };
        let record = line.record();
        assert_eq!(record[6], "062-000");
        assert_eq!(record[7], "12345678");
        assert_eq!(record[8], "2197.50");
    }

    #[test]
    fn test_invoice_document_renders() {
        let week = WeekRange::parse("2026-W42").unwrap();
        let amounts = InvoiceAmounts::compute(&hours(8.0, 0.0), 5000, 0, true);
        let invoice = WorkerInvoice {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            contractor_id: Uuid::new_v4(),
            invoice_number: "BAZ-2026W42".to_string(),
            week_start: week.start,
            week_end: week.end,
            tonnage_hours: 8.0,
            day_labour_hours: 0.0,
            tonnage_rate_cents: 5000,
            day_labour_rate_cents: 0,
            subtotal_cents: amounts.subtotal_cents,
            gst_cents: amounts.gst_cents,
            total_cents: amounts.total_cents,
            status: InvoiceStatus::Submitted,
            submitted_at: Some(Utc::now()),
            paid_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let mut days: Vec<(NaiveDate, HoursTotals)> =
            week.days().iter().map(|d| (*d, HoursTotals::default())).collect();
        days[0].1 = hours(8.0, 0.0);

        let document = InvoiceDocument {
            business_name: "Ridgeline Labour".to_string(),
            invoice,
            contractor_full_name: "Barry Ziggurat".to_string(),
            contractor_email: Some("baz@example.com".to_string()),
            abn: Some("12 345 678 901".to_string()),
            gst_registered: true,
            bank_account_name: Some("B Ziggurat".to_string()),
            bank_bsb_masked: Some(mask("062-000")),
            bank_account_masked: Some(mask("12345678")),
            days,
        };

        let bytes = document.render();
        let text = String::from_utf8_lossy(&bytes);
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("BAZ-2026W42"));
        assert!(text.contains("***678"));
        assert!(!text.contains("12345678"));
    }
}
